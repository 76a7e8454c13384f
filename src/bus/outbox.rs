//! Durable outbox: the write side of "mutation and event publication commit
//! together" (spec.md §4.1, §4.2 completion atomicity).
//!
//! A row is inserted in the same `sqlx::Transaction` as the business
//! mutation. A background dispatcher (see [`super::bus::InProcessEventBus::run_dispatcher`])
//! polls undelivered rows and republishes until acked, so a crash between
//! commit and publish just means the next poll redelivers — never a lost
//! event, never a rolled-back mutation.

use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

use crate::bus::event::Event;
use crate::error::CoreError;
use crate::tenant::TenantId;

#[derive(Debug, Clone)]
pub struct OutboxRow {
    pub id: i64,
    pub event: Event,
    pub attempts: i32,
}

pub struct OutboxRepository;

impl OutboxRepository {
    pub async fn ensure_schema(pool: &PgPool) -> Result<(), CoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS outbox (
                id BIGSERIAL PRIMARY KEY,
                event_id UUID NOT NULL UNIQUE,
                tenant_id TEXT NOT NULL,
                topic TEXT NOT NULL,
                occurred_at TIMESTAMPTZ NOT NULL,
                payload JSONB NOT NULL,
                attempts INT NOT NULL DEFAULT 0,
                next_attempt_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                delivered_at TIMESTAMPTZ,
                dead_lettered_at TIMESTAMPTZ
            )
            "#,
        )
        .execute(pool)
        .await?;
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS outbox_dead_letter (
                id BIGSERIAL PRIMARY KEY,
                event_id UUID NOT NULL,
                tenant_id TEXT NOT NULL,
                topic TEXT NOT NULL,
                occurred_at TIMESTAMPTZ NOT NULL,
                payload JSONB NOT NULL,
                last_error TEXT,
                dead_lettered_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            "#,
        )
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Enqueue an event as part of an in-flight transaction. Caller commits.
    pub async fn enqueue(
        tx: &mut Transaction<'_, Postgres>,
        event: &Event,
    ) -> Result<(), CoreError> {
        sqlx::query(
            r#"
            INSERT INTO outbox (event_id, tenant_id, topic, occurred_at, payload)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(event.event_id)
        .bind(event.tenant_id.as_str())
        .bind(&event.topic)
        .bind(event.occurred_at)
        .bind(&event.payload)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    pub async fn fetch_undelivered(pool: &PgPool, limit: i64) -> Result<Vec<OutboxRow>, CoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, event_id, tenant_id, topic, occurred_at, payload, attempts
            FROM outbox
            WHERE delivered_at IS NULL AND dead_lettered_at IS NULL AND next_attempt_at <= now()
            ORDER BY id
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let tenant_raw: String = row.try_get("tenant_id")?;
            let tenant_id = TenantId::parse(&tenant_raw).map_err(CoreError::Internal)?;
            let event = Event::with_id(
                row.try_get::<Uuid, _>("event_id")?,
                tenant_id,
                row.try_get::<String, _>("topic")?,
                row.try_get("occurred_at")?,
                row.try_get("payload")?,
            );
            out.push(OutboxRow {
                id: row.try_get("id")?,
                event,
                attempts: row.try_get("attempts")?,
            });
        }
        Ok(out)
    }

    pub async fn mark_delivered(pool: &PgPool, id: i64) -> Result<(), CoreError> {
        sqlx::query("UPDATE outbox SET delivered_at = now() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    pub async fn record_attempt(pool: &PgPool, id: i64, next_attempt_at: chrono::DateTime<chrono::Utc>) -> Result<(), CoreError> {
        sqlx::query("UPDATE outbox SET attempts = attempts + 1, next_attempt_at = $2 WHERE id = $1")
            .bind(id)
            .bind(next_attempt_at)
            .execute(pool)
            .await?;
        Ok(())
    }

    pub async fn dead_letter(pool: &PgPool, row: &OutboxRow, last_error: &str) -> Result<(), CoreError> {
        let mut tx = pool.begin().await?;
        sqlx::query(
            r#"
            INSERT INTO outbox_dead_letter (event_id, tenant_id, topic, occurred_at, payload, last_error)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(row.event.event_id)
        .bind(row.event.tenant_id.as_str())
        .bind(&row.event.topic)
        .bind(row.event.occurred_at)
        .bind(&row.event.payload)
        .bind(last_error)
        .execute(&mut *tx)
        .await?;
        sqlx::query("UPDATE outbox SET dead_lettered_at = now() WHERE id = $1")
            .bind(row.id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }
}
