//! Staff account store backing `POST /api/v1/accounts/token` (spec.md §6).
//! Lives on the control-plane pool alongside [`crate::tenant::TenantRegistry`]
//! since a login must resolve which tenant a username belongs to before any
//! tenant-scoped pool can be reached.
//!
//! Account registration is explicitly out of scope (spec.md §1 Non-goals:
//! "Account Service user registration beyond JWT issuance") — `upsert` below
//! exists for operator/seed provisioning, not as an HTTP surface.

use sqlx::{PgPool, Row};

use crate::error::CoreError;
use crate::tenant::{Etag, TenantId};

use super::api_key::{hash_api_key, verify_api_key};

#[derive(Debug, Clone)]
pub struct StaffAccount {
    pub tenant_id: TenantId,
    pub username: String,
    pub password_hash: String,
    pub is_superuser: bool,
    pub is_active: bool,
    pub etag: Etag,
}

pub struct StaffAccountRepository;

impl StaffAccountRepository {
    pub async fn ensure_schema(pool: &PgPool) -> Result<(), CoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS staff_accounts (
                tenant_id TEXT NOT NULL,
                username TEXT NOT NULL,
                password_hash TEXT NOT NULL,
                is_superuser BOOLEAN NOT NULL DEFAULT false,
                is_active BOOLEAN NOT NULL DEFAULT true,
                etag TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                PRIMARY KEY (tenant_id, username)
            )
            "#,
        )
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn find(pool: &PgPool, tenant_id: &TenantId, username: &str) -> Result<Option<StaffAccount>, CoreError> {
        let row = sqlx::query("SELECT tenant_id, username, password_hash, is_superuser, is_active, etag FROM staff_accounts WHERE tenant_id = $1 AND username = $2")
            .bind(tenant_id.as_str())
            .bind(username)
            .fetch_optional(pool)
            .await?;
        let Some(row) = row else { return Ok(None) };
        let tenant_id_raw: String = row.try_get("tenant_id")?;
        Ok(Some(StaffAccount {
            tenant_id: TenantId::parse(&tenant_id_raw).map_err(CoreError::Internal)?,
            username: row.try_get("username")?,
            password_hash: row.try_get("password_hash")?,
            is_superuser: row.try_get("is_superuser")?,
            is_active: row.try_get("is_active")?,
            etag: row.try_get::<String, _>("etag")?.into(),
        }))
    }

    /// Provisioning helper, not exposed over HTTP.
    pub async fn upsert(pool: &PgPool, tenant_id: &TenantId, username: &str, plaintext_password: &str, is_superuser: bool) -> Result<(), CoreError> {
        let password_hash = hash_api_key(plaintext_password)?;
        sqlx::query(
            r#"
            INSERT INTO staff_accounts (tenant_id, username, password_hash, is_superuser, is_active, etag)
            VALUES ($1,$2,$3,$4,true,$5)
            ON CONFLICT (tenant_id, username) DO UPDATE SET
                password_hash = EXCLUDED.password_hash, is_superuser = EXCLUDED.is_superuser, etag = EXCLUDED.etag, updated_at = now()
            "#,
        )
        .bind(tenant_id.as_str())
        .bind(username)
        .bind(password_hash)
        .bind(is_superuser)
        .bind(Etag::new().as_str())
        .execute(pool)
        .await?;
        Ok(())
    }
}

/// Constant-time password check; reuses the same argon2 primitive the
/// terminal API key uses (`hash_api_key`/`verify_api_key` are password-hash
/// agnostic despite the name).
pub fn verify_password(plaintext: &str, stored_hash: &str) -> bool {
    verify_api_key(plaintext, stored_hash)
}
