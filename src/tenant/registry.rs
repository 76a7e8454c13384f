//! Control-plane tenant registry, grounded on `account/db.rs`'s `Database`
//! pool wrapper.
//!
//! Every other repository in this crate is scoped to a single tenant's own
//! pool via [`super::pool_cache::TenantPoolCache`]. This is the one place
//! that is not: listing which tenants exist, and the cross-tenant metadata
//! that has no natural tenant to live inside (the snapshot schedule catalog,
//! C8's distributed leases), necessarily lives in a shared control-plane
//! database reached through a plain `PgPool`.

use sqlx::{PgPool, Row};

use super::etag::Etag;
use super::models::{Tenant, TenantId};
use crate::error::CoreError;

#[derive(Clone)]
pub struct TenantRegistry {
    pool: PgPool,
}

impl TenantRegistry {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn ensure_schema(&self) -> Result<(), CoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS tenants (
                tenant_id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                tags TEXT[] NOT NULL DEFAULT '{}',
                etag TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn list_ids(&self) -> Result<Vec<TenantId>, CoreError> {
        let rows = sqlx::query("SELECT tenant_id FROM tenants ORDER BY tenant_id")
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|r| {
                let raw: String = r.try_get("tenant_id")?;
                TenantId::parse(&raw).map_err(CoreError::Internal)
            })
            .collect()
    }

    pub async fn upsert(&self, tenant_id: &TenantId, name: &str, tags: &[String]) -> Result<Tenant, CoreError> {
        let etag = Etag::new();
        sqlx::query(
            r#"
            INSERT INTO tenants (tenant_id, name, tags, etag)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (tenant_id) DO UPDATE SET
                name = EXCLUDED.name, tags = EXCLUDED.tags, etag = EXCLUDED.etag, updated_at = now()
            "#,
        )
        .bind(tenant_id.as_str())
        .bind(name)
        .bind(tags)
        .bind(etag.as_str())
        .execute(&self.pool)
        .await?;
        self.find(tenant_id)
            .await?
            .ok_or_else(|| CoreError::Internal("tenant row vanished immediately after upsert".to_string()))
    }

    pub async fn find(&self, tenant_id: &TenantId) -> Result<Option<Tenant>, CoreError> {
        let row = sqlx::query("SELECT tenant_id, name, tags, etag, created_at, updated_at FROM tenants WHERE tenant_id = $1")
            .bind(tenant_id.as_str())
            .fetch_optional(&self.pool)
            .await?;
        row.map(Self::from_row).transpose()
    }

    fn from_row(row: sqlx::postgres::PgRow) -> Result<Tenant, CoreError> {
        let tenant_id_raw: String = row.try_get("tenant_id")?;
        Ok(Tenant {
            tenant_id: TenantId::parse(&tenant_id_raw).map_err(CoreError::Internal)?,
            name: row.try_get("name")?,
            tags: row.try_get("tags")?,
            etag: row.try_get::<String, _>("etag")?.into(),
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}
