//! Snapshot schedule + distributed lease persistence, on the control-plane
//! pool (see [`crate::tenant::TenantRegistry`]). Grounded on
//! `terminal/repository.rs`'s CAS shape for the lease acquire, generalized
//! from an etag compare to an expiry compare (spec.md §4.4 step 1: "TTL ≈ 2x
//! expected duration").

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};

use crate::error::CoreError;
use crate::tenant::{Etag, TenantId};

use super::models::{Interval, SnapshotSchedule};

pub struct SnapshotScheduleRepository;

impl SnapshotScheduleRepository {
    pub async fn ensure_schema(pool: &PgPool) -> Result<(), CoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS snapshot_schedules (
                tenant_id TEXT PRIMARY KEY,
                interval TEXT NOT NULL,
                hour INT NOT NULL,
                minute INT NOT NULL,
                day_of_week INT,
                day_of_month INT,
                retention_days INT NOT NULL,
                target_stores TEXT[] NOT NULL,
                enabled BOOLEAN NOT NULL DEFAULT true,
                last_executed_at TIMESTAMPTZ,
                etag TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            "#,
        )
        .execute(pool)
        .await?;
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS leases (
                tenant_id TEXT NOT NULL,
                job_id TEXT NOT NULL,
                holder TEXT NOT NULL,
                expires_at TIMESTAMPTZ NOT NULL,
                PRIMARY KEY (tenant_id, job_id)
            )
            "#,
        )
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn find(pool: &PgPool, tenant_id: &TenantId) -> Result<Option<SnapshotSchedule>, CoreError> {
        let row = sqlx::query(
            r#"
            SELECT tenant_id, interval, hour, minute, day_of_week, day_of_month, retention_days,
                   target_stores, enabled, last_executed_at, etag, created_at, updated_at
            FROM snapshot_schedules WHERE tenant_id = $1
            "#,
        )
        .bind(tenant_id.as_str())
        .fetch_optional(pool)
        .await?;
        row.map(Self::from_row).transpose()
    }

    pub async fn list_enabled(pool: &PgPool) -> Result<Vec<SnapshotSchedule>, CoreError> {
        let rows = sqlx::query(
            r#"
            SELECT tenant_id, interval, hour, minute, day_of_week, day_of_month, retention_days,
                   target_stores, enabled, last_executed_at, etag, created_at, updated_at
            FROM snapshot_schedules WHERE enabled = true
            "#,
        )
        .fetch_all(pool)
        .await?;
        rows.into_iter().map(Self::from_row).collect()
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn upsert(
        pool: &PgPool,
        tenant_id: &TenantId,
        interval: Interval,
        hour: i32,
        minute: i32,
        day_of_week: Option<i32>,
        day_of_month: Option<i32>,
        retention_days: i32,
        target_stores: &[String],
        enabled: bool,
    ) -> Result<SnapshotSchedule, CoreError> {
        let etag = Etag::new();
        sqlx::query(
            r#"
            INSERT INTO snapshot_schedules (
                tenant_id, interval, hour, minute, day_of_week, day_of_month,
                retention_days, target_stores, enabled, etag
            ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10)
            ON CONFLICT (tenant_id) DO UPDATE SET
                interval = EXCLUDED.interval, hour = EXCLUDED.hour, minute = EXCLUDED.minute,
                day_of_week = EXCLUDED.day_of_week, day_of_month = EXCLUDED.day_of_month,
                retention_days = EXCLUDED.retention_days, target_stores = EXCLUDED.target_stores,
                enabled = EXCLUDED.enabled, etag = EXCLUDED.etag, updated_at = now()
            "#,
        )
        .bind(tenant_id.as_str())
        .bind(interval)
        .bind(hour)
        .bind(minute)
        .bind(day_of_week)
        .bind(day_of_month)
        .bind(retention_days)
        .bind(target_stores)
        .bind(enabled)
        .bind(etag.as_str())
        .execute(pool)
        .await?;
        Self::find(pool, tenant_id)
            .await?
            .ok_or_else(|| CoreError::Internal("snapshot schedule vanished immediately after upsert".to_string()))
    }

    pub async fn mark_executed(pool: &PgPool, tenant_id: &TenantId, when: DateTime<Utc>) -> Result<(), CoreError> {
        sqlx::query("UPDATE snapshot_schedules SET last_executed_at = $1, updated_at = now() WHERE tenant_id = $2")
            .bind(when)
            .bind(tenant_id.as_str())
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Acquires (or renews) the distributed lease for `(tenantId, jobId)`.
    /// Succeeds if no lease exists, the existing one expired, or this
    /// `holder` already owns it. Returns `false` if another live holder has
    /// it (spec.md §4.4 step 1: "if unavailable, skip").
    pub async fn try_acquire_lease(pool: &PgPool, tenant_id: &TenantId, job_id: &str, holder: &str, ttl: chrono::Duration) -> Result<bool, CoreError> {
        let now = Utc::now();
        let expires_at = now + ttl;
        let result = sqlx::query(
            r#"
            INSERT INTO leases (tenant_id, job_id, holder, expires_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (tenant_id, job_id) DO UPDATE SET holder = EXCLUDED.holder, expires_at = EXCLUDED.expires_at
            WHERE leases.expires_at <= $5 OR leases.holder = $3
            "#,
        )
        .bind(tenant_id.as_str())
        .bind(job_id)
        .bind(holder)
        .bind(expires_at)
        .bind(now)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn release_lease(pool: &PgPool, tenant_id: &TenantId, job_id: &str, holder: &str) -> Result<(), CoreError> {
        sqlx::query("DELETE FROM leases WHERE tenant_id = $1 AND job_id = $2 AND holder = $3")
            .bind(tenant_id.as_str())
            .bind(job_id)
            .bind(holder)
            .execute(pool)
            .await?;
        Ok(())
    }

    fn from_row(row: sqlx::postgres::PgRow) -> Result<SnapshotSchedule, CoreError> {
        let tenant_id_raw: String = row.try_get("tenant_id")?;
        Ok(SnapshotSchedule {
            tenant_id: TenantId::parse(&tenant_id_raw).map_err(CoreError::Internal)?,
            interval: row.try_get("interval")?,
            hour: row.try_get("hour")?,
            minute: row.try_get("minute")?,
            day_of_week: row.try_get("day_of_week")?,
            day_of_month: row.try_get("day_of_month")?,
            retention_days: row.try_get("retention_days")?,
            target_stores: row.try_get("target_stores")?,
            enabled: row.try_get("enabled")?,
            last_executed_at: row.try_get("last_executed_at")?,
            etag: row.try_get::<String, _>("etag")?.into(),
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}
