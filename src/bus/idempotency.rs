//! Idempotency-record state store for C7 (spec.md §4.5 step 1-3, §3
//! `IdempotencyRecord`).
//!
//! Keyed by `(consumerName, eventId)`. Writes use CAS: the `Processing`
//! guard is inserted with `ON CONFLICT DO NOTHING`, so two workers racing
//! on the same key never both believe they hold the lease.

use serde_json::Value;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdempotencyStatus {
    Processing,
    Completed,
    Failed,
}

impl IdempotencyStatus {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Processing => "Processing",
            Self::Completed => "Completed",
            Self::Failed => "Failed",
        }
    }

    fn from_str(s: &str) -> Option<Self> {
        match s {
            "Processing" => Some(Self::Processing),
            "Completed" => Some(Self::Completed),
            "Failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// Outcome of attempting to begin processing an event.
pub enum BeginOutcome {
    /// No prior record, or a prior `Processing` guard expired: go ahead.
    Proceed,
    /// Already `Completed`: ack immediately without running the handler.
    AlreadyDone,
    /// Another worker holds a live `Processing` guard: nack with backoff.
    Contended,
}

pub struct IdempotencyStore;

impl IdempotencyStore {
    pub async fn ensure_schema(pool: &PgPool) -> Result<(), CoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS idempotency_records (
                consumer_name TEXT NOT NULL,
                event_id UUID NOT NULL,
                status TEXT NOT NULL,
                result JSONB,
                error TEXT,
                expires_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                PRIMARY KEY (consumer_name, event_id)
            )
            "#,
        )
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Step 1-2 of the C7 contract: look up the record and, if clear to
    /// proceed, stake a `Processing` guard with a short TTL.
    pub async fn begin(pool: &PgPool, consumer_name: &str, event_id: Uuid, processing_ttl_secs: i64) -> Result<BeginOutcome, CoreError> {
        let existing = sqlx::query(
            "SELECT status, expires_at FROM idempotency_records WHERE consumer_name = $1 AND event_id = $2",
        )
        .bind(consumer_name)
        .bind(event_id)
        .fetch_optional(pool)
        .await?;

        if let Some(row) = existing {
            let status_str: String = row.try_get("status")?;
            let expires_at: chrono::DateTime<chrono::Utc> = row.try_get("expires_at")?;
            let status = IdempotencyStatus::from_str(&status_str).unwrap_or(IdempotencyStatus::Failed);
            match status {
                IdempotencyStatus::Completed => return Ok(BeginOutcome::AlreadyDone),
                IdempotencyStatus::Processing if expires_at > chrono::Utc::now() => {
                    return Ok(BeginOutcome::Contended);
                }
                _ => {}
            }
        }

        let expires_at = chrono::Utc::now() + chrono::Duration::seconds(processing_ttl_secs);
        let claimed = sqlx::query(
            r#"
            INSERT INTO idempotency_records (consumer_name, event_id, status, expires_at, updated_at)
            VALUES ($1, $2, 'Processing', $3, now())
            ON CONFLICT (consumer_name, event_id)
            DO UPDATE SET status = 'Processing', expires_at = $3, updated_at = now()
            WHERE idempotency_records.status != 'Completed'
              AND (idempotency_records.status != 'Processing' OR idempotency_records.expires_at <= now())
            "#,
        )
        .bind(consumer_name)
        .bind(event_id)
        .bind(expires_at)
        .execute(pool)
        .await?;

        if claimed.rows_affected() == 0 {
            return Ok(BeginOutcome::Contended);
        }
        Ok(BeginOutcome::Proceed)
    }

    /// A completed record's TTL (spec.md §3 `IdempotencyRecord`: "TTL 1
    /// hour") is independent of the short `Processing` guard TTL passed to
    /// [`Self::begin`]; it must outlive that guard so a dedup check against
    /// an already-handled event doesn't race a sweep that evicts on
    /// `expires_at`.
    const COMPLETED_TTL_SECS: i64 = 3600;

    pub async fn complete(pool: &PgPool, consumer_name: &str, event_id: Uuid, result: Option<Value>) -> Result<(), CoreError> {
        let expires_at = chrono::Utc::now() + chrono::Duration::seconds(Self::COMPLETED_TTL_SECS);
        sqlx::query(
            "UPDATE idempotency_records SET status = 'Completed', result = $3, error = NULL, expires_at = $4, updated_at = now()
             WHERE consumer_name = $1 AND event_id = $2",
        )
        .bind(consumer_name)
        .bind(event_id)
        .bind(result)
        .bind(expires_at)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn fail(pool: &PgPool, consumer_name: &str, event_id: Uuid, error: &str) -> Result<(), CoreError> {
        sqlx::query(
            "UPDATE idempotency_records SET status = 'Failed', error = $3, updated_at = now()
             WHERE consumer_name = $1 AND event_id = $2",
        )
        .bind(consumer_name)
        .bind(event_id)
        .bind(error)
        .execute(pool)
        .await?;
        Ok(())
    }
}
