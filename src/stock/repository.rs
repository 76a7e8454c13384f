//! Stock persistence (spec.md §4.3), grounded on `terminal/repository.rs`'s
//! CAS shape, generalized to a row keyed by `(tenantId, storeCode, itemCode)`
//! instead of a single id column.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Row};

use crate::error::CoreError;
use crate::tenant::{Etag, TenantId};

use super::models::{AlertCooldown, Stock, StockSnapshot, StockUpdate};
use super::state::{AlertType, UpdateType};

pub struct StockRepository;

impl StockRepository {
    pub async fn ensure_schema(pool: &PgPool) -> Result<(), CoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS stocks (
                tenant_id TEXT NOT NULL,
                store_code TEXT NOT NULL,
                item_code TEXT NOT NULL,
                current_quantity NUMERIC(18,3) NOT NULL DEFAULT 0,
                minimum_quantity NUMERIC(18,3) NOT NULL DEFAULT 0,
                reorder_point NUMERIC(18,3) NOT NULL DEFAULT 0,
                reorder_quantity NUMERIC(18,3) NOT NULL DEFAULT 0,
                last_transaction_id TEXT,
                etag TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                PRIMARY KEY (tenant_id, store_code, item_code)
            )
            "#,
        )
        .execute(pool)
        .await?;
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS stock_updates (
                id BIGSERIAL PRIMARY KEY,
                tenant_id TEXT NOT NULL,
                store_code TEXT NOT NULL,
                item_code TEXT NOT NULL,
                update_type TEXT NOT NULL,
                quantity_change NUMERIC(18,3) NOT NULL,
                before_qty NUMERIC(18,3) NOT NULL,
                after_qty NUMERIC(18,3) NOT NULL,
                reference_id TEXT,
                operator_id TEXT,
                note TEXT,
                timestamp TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            "#,
        )
        .execute(pool)
        .await?;
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS alert_cooldowns (
                tenant_id TEXT NOT NULL,
                store_code TEXT NOT NULL,
                item_code TEXT NOT NULL,
                alert_type TEXT NOT NULL,
                last_alert_time TIMESTAMPTZ NOT NULL,
                cooldown_until TIMESTAMPTZ NOT NULL,
                PRIMARY KEY (tenant_id, store_code, item_code, alert_type)
            )
            "#,
        )
        .execute(pool)
        .await?;
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS stock_snapshots (
                snapshot_id UUID PRIMARY KEY,
                tenant_id TEXT NOT NULL,
                store_code TEXT NOT NULL,
                total_items BIGINT NOT NULL,
                total_quantity NUMERIC(18,3) NOT NULL,
                stocks JSONB NOT NULL,
                created_by TEXT NOT NULL,
                generate_date_time TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            "#,
        )
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn find(pool: &PgPool, tenant_id: &TenantId, store_code: &str, item_code: &str) -> Result<Option<Stock>, CoreError> {
        let row = sqlx::query(
            r#"
            SELECT tenant_id, store_code, item_code, current_quantity, minimum_quantity,
                   reorder_point, reorder_quantity, last_transaction_id, etag, created_at, updated_at
            FROM stocks WHERE tenant_id = $1 AND store_code = $2 AND item_code = $3
            "#,
        )
        .bind(tenant_id.as_str())
        .bind(store_code)
        .bind(item_code)
        .fetch_optional(pool)
        .await?;
        row.map(Self::from_row).transpose()
    }

    pub async fn list_by_store(pool: &PgPool, tenant_id: &TenantId, store_code: &str) -> Result<Vec<Stock>, CoreError> {
        let rows = sqlx::query(
            r#"
            SELECT tenant_id, store_code, item_code, current_quantity, minimum_quantity,
                   reorder_point, reorder_quantity, last_transaction_id, etag, created_at, updated_at
            FROM stocks WHERE tenant_id = $1 AND store_code = $2
            ORDER BY item_code
            "#,
        )
        .bind(tenant_id.as_str())
        .bind(store_code)
        .fetch_all(pool)
        .await?;
        rows.into_iter().map(Self::from_row).collect()
    }

    pub async fn list_low(pool: &PgPool, tenant_id: &TenantId, store_code: &str) -> Result<Vec<Stock>, CoreError> {
        let rows = sqlx::query(
            r#"
            SELECT tenant_id, store_code, item_code, current_quantity, minimum_quantity,
                   reorder_point, reorder_quantity, last_transaction_id, etag, created_at, updated_at
            FROM stocks
            WHERE tenant_id = $1 AND store_code = $2
              AND minimum_quantity > 0 AND current_quantity < minimum_quantity
            ORDER BY item_code
            "#,
        )
        .bind(tenant_id.as_str())
        .bind(store_code)
        .fetch_all(pool)
        .await?;
        rows.into_iter().map(Self::from_row).collect()
    }

    pub async fn list_reorder_alerts(pool: &PgPool, tenant_id: &TenantId, store_code: &str) -> Result<Vec<Stock>, CoreError> {
        let rows = sqlx::query(
            r#"
            SELECT tenant_id, store_code, item_code, current_quantity, minimum_quantity,
                   reorder_point, reorder_quantity, last_transaction_id, etag, created_at, updated_at
            FROM stocks
            WHERE tenant_id = $1 AND store_code = $2
              AND reorder_point > 0 AND current_quantity <= reorder_point
            ORDER BY item_code
            "#,
        )
        .bind(tenant_id.as_str())
        .bind(store_code)
        .fetch_all(pool)
        .await?;
        rows.into_iter().map(Self::from_row).collect()
    }

    /// Every store code with at least one stock row for this tenant, used
    /// to expand a `targetStores: ["all"]` schedule (spec.md §4.4 step 2).
    pub async fn list_store_codes(pool: &PgPool, tenant_id: &TenantId) -> Result<Vec<String>, CoreError> {
        let rows = sqlx::query("SELECT DISTINCT store_code FROM stocks WHERE tenant_id = $1 ORDER BY store_code")
            .bind(tenant_id.as_str())
            .fetch_all(pool)
            .await?;
        rows.iter().map(|r| r.try_get("store_code").map_err(CoreError::from)).collect()
    }

    /// Keyset-paginated listing for the snapshot scheduler (spec.md §4.4
    /// step 3): `after_item_code` is the last `item_code` seen in the
    /// previous page, `None` for the first page.
    pub async fn list_by_store_page(
        pool: &PgPool,
        tenant_id: &TenantId,
        store_code: &str,
        after_item_code: Option<&str>,
        limit: i64,
    ) -> Result<Vec<Stock>, CoreError> {
        let rows = sqlx::query(
            r#"
            SELECT tenant_id, store_code, item_code, current_quantity, minimum_quantity,
                   reorder_point, reorder_quantity, last_transaction_id, etag, created_at, updated_at
            FROM stocks
            WHERE tenant_id = $1 AND store_code = $2 AND item_code > COALESCE($3, '')
            ORDER BY item_code
            LIMIT $4
            "#,
        )
        .bind(tenant_id.as_str())
        .bind(store_code)
        .bind(after_item_code)
        .bind(limit)
        .fetch_all(pool)
        .await?;
        rows.into_iter().map(Self::from_row).collect()
    }

    /// Atomic read-modify-write: upserts the row (creating it with
    /// `before = 0` if absent) and returns `(before, after)`. A single
    /// statement closes the race window a separate read + CAS would leave
    /// open (spec.md §4.3 step 1).
    pub async fn apply_update(
        pool: &PgPool,
        tenant_id: &TenantId,
        store_code: &str,
        item_code: &str,
        quantity_change: Decimal,
        reference_id: Option<&str>,
    ) -> Result<(Decimal, Decimal), CoreError> {
        let new_etag = Etag::new();
        let row = sqlx::query(
            r#"
            INSERT INTO stocks (tenant_id, store_code, item_code, current_quantity, last_transaction_id, etag)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (tenant_id, store_code, item_code) DO UPDATE SET
                current_quantity = stocks.current_quantity + EXCLUDED.current_quantity,
                last_transaction_id = EXCLUDED.last_transaction_id,
                etag = EXCLUDED.etag,
                updated_at = now()
            RETURNING current_quantity - $4 AS before_qty, current_quantity AS after_qty
            "#,
        )
        .bind(tenant_id.as_str())
        .bind(store_code)
        .bind(item_code)
        .bind(quantity_change)
        .bind(reference_id)
        .bind(new_etag.as_str())
        .fetch_one(pool)
        .await?;
        Ok((row.try_get("before_qty")?, row.try_get("after_qty")?))
    }

    pub async fn record_update(
        pool: &PgPool,
        tenant_id: &TenantId,
        store_code: &str,
        item_code: &str,
        update_type: UpdateType,
        quantity_change: Decimal,
        before_qty: Decimal,
        after_qty: Decimal,
        reference_id: Option<&str>,
        operator_id: Option<&str>,
        note: Option<&str>,
    ) -> Result<(), CoreError> {
        sqlx::query(
            r#"
            INSERT INTO stock_updates (
                tenant_id, store_code, item_code, update_type, quantity_change,
                before_qty, after_qty, reference_id, operator_id, note
            ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10)
            "#,
        )
        .bind(tenant_id.as_str())
        .bind(store_code)
        .bind(item_code)
        .bind(update_type)
        .bind(quantity_change)
        .bind(before_qty)
        .bind(after_qty)
        .bind(reference_id)
        .bind(operator_id)
        .bind(note)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn history(pool: &PgPool, tenant_id: &TenantId, store_code: &str, item_code: &str, limit: i64) -> Result<Vec<StockUpdate>, CoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, tenant_id, store_code, item_code, update_type, quantity_change,
                   before_qty, after_qty, reference_id, operator_id, note, timestamp
            FROM stock_updates
            WHERE tenant_id = $1 AND store_code = $2 AND item_code = $3
            ORDER BY id DESC LIMIT $4
            "#,
        )
        .bind(tenant_id.as_str())
        .bind(store_code)
        .bind(item_code)
        .bind(limit)
        .fetch_all(pool)
        .await?;
        rows.into_iter()
            .map(|row| {
                let tenant_id_raw: String = row.try_get("tenant_id")?;
                Ok(StockUpdate {
                    id: row.try_get("id")?,
                    tenant_id: TenantId::parse(&tenant_id_raw).map_err(CoreError::Internal)?,
                    store_code: row.try_get("store_code")?,
                    item_code: row.try_get("item_code")?,
                    update_type: row.try_get("update_type")?,
                    quantity_change: row.try_get("quantity_change")?,
                    before_qty: row.try_get("before_qty")?,
                    after_qty: row.try_get("after_qty")?,
                    reference_id: row.try_get("reference_id")?,
                    operator_id: row.try_get("operator_id")?,
                    note: row.try_get("note")?,
                    timestamp: row.try_get("timestamp")?,
                })
            })
            .collect()
    }

    pub async fn update_minimum(pool: &PgPool, tenant_id: &TenantId, store_code: &str, item_code: &str, minimum_quantity: Decimal) -> Result<(), CoreError> {
        sqlx::query(
            r#"
            INSERT INTO stocks (tenant_id, store_code, item_code, minimum_quantity, etag)
            VALUES ($1,$2,$3,$4,$5)
            ON CONFLICT (tenant_id, store_code, item_code) DO UPDATE SET
                minimum_quantity = EXCLUDED.minimum_quantity, etag = EXCLUDED.etag, updated_at = now()
            "#,
        )
        .bind(tenant_id.as_str())
        .bind(store_code)
        .bind(item_code)
        .bind(minimum_quantity)
        .bind(Etag::new().as_str())
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn update_reorder(pool: &PgPool, tenant_id: &TenantId, store_code: &str, item_code: &str, reorder_point: Decimal, reorder_quantity: Decimal) -> Result<(), CoreError> {
        sqlx::query(
            r#"
            INSERT INTO stocks (tenant_id, store_code, item_code, reorder_point, reorder_quantity, etag)
            VALUES ($1,$2,$3,$4,$5,$6)
            ON CONFLICT (tenant_id, store_code, item_code) DO UPDATE SET
                reorder_point = EXCLUDED.reorder_point, reorder_quantity = EXCLUDED.reorder_quantity,
                etag = EXCLUDED.etag, updated_at = now()
            "#,
        )
        .bind(tenant_id.as_str())
        .bind(store_code)
        .bind(item_code)
        .bind(reorder_point)
        .bind(reorder_quantity)
        .bind(Etag::new().as_str())
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Returns `true` and writes a fresh cooldown row if the alert may fire;
    /// returns `false` (no write) if an unexpired cooldown already exists.
    /// `cooldown_secs = 0` disables suppression.
    pub async fn try_start_cooldown(
        pool: &PgPool,
        tenant_id: &TenantId,
        store_code: &str,
        item_code: &str,
        alert_type: AlertType,
        cooldown_secs: i64,
    ) -> Result<bool, CoreError> {
        if cooldown_secs == 0 {
            return Ok(true);
        }
        let now = Utc::now();
        let until = now + chrono::Duration::seconds(cooldown_secs);
        let result = sqlx::query(
            r#"
            INSERT INTO alert_cooldowns (tenant_id, store_code, item_code, alert_type, last_alert_time, cooldown_until)
            VALUES ($1,$2,$3,$4,$5,$6)
            ON CONFLICT (tenant_id, store_code, item_code, alert_type) DO UPDATE SET
                last_alert_time = EXCLUDED.last_alert_time, cooldown_until = EXCLUDED.cooldown_until
            WHERE alert_cooldowns.cooldown_until <= $5
            "#,
        )
        .bind(tenant_id.as_str())
        .bind(store_code)
        .bind(item_code)
        .bind(alert_type)
        .bind(now)
        .bind(until)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn find_cooldown(pool: &PgPool, tenant_id: &TenantId, store_code: &str, item_code: &str, alert_type: AlertType) -> Result<Option<AlertCooldown>, CoreError> {
        let row = sqlx::query(
            "SELECT last_alert_time, cooldown_until FROM alert_cooldowns WHERE tenant_id = $1 AND store_code = $2 AND item_code = $3 AND alert_type = $4",
        )
        .bind(tenant_id.as_str())
        .bind(store_code)
        .bind(item_code)
        .bind(alert_type)
        .fetch_optional(pool)
        .await?;
        let Some(row) = row else { return Ok(None) };
        Ok(Some(AlertCooldown {
            last_alert_time: row.try_get("last_alert_time")?,
            cooldown_until: row.try_get("cooldown_until")?,
        }))
    }

    pub async fn insert_snapshot(pool: &PgPool, snapshot: &StockSnapshot) -> Result<(), CoreError> {
        sqlx::query(
            r#"
            INSERT INTO stock_snapshots (snapshot_id, tenant_id, store_code, total_items, total_quantity, stocks, created_by, generate_date_time)
            VALUES ($1,$2,$3,$4,$5,$6,$7,$8)
            "#,
        )
        .bind(snapshot.snapshot_id)
        .bind(snapshot.tenant_id.as_str())
        .bind(&snapshot.store_code)
        .bind(snapshot.total_items)
        .bind(snapshot.total_quantity)
        .bind(serde_json::to_value(&snapshot.stocks).map_err(|e| CoreError::Internal(e.to_string()))?)
        .bind(&snapshot.created_by)
        .bind(snapshot.generate_date_time)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn find_snapshot(pool: &PgPool, snapshot_id: uuid::Uuid) -> Result<Option<StockSnapshot>, CoreError> {
        let row = sqlx::query(
            "SELECT snapshot_id, tenant_id, store_code, total_items, total_quantity, stocks, created_by, generate_date_time FROM stock_snapshots WHERE snapshot_id = $1",
        )
        .bind(snapshot_id)
        .fetch_optional(pool)
        .await?;
        let Some(row) = row else { return Ok(None) };
        Ok(Some(Self::snapshot_from_row(row)?))
    }

    pub async fn list_snapshots(pool: &PgPool, tenant_id: &TenantId) -> Result<Vec<StockSnapshot>, CoreError> {
        let rows = sqlx::query(
            "SELECT snapshot_id, tenant_id, store_code, total_items, total_quantity, stocks, created_by, generate_date_time FROM stock_snapshots WHERE tenant_id = $1 ORDER BY generate_date_time DESC",
        )
        .bind(tenant_id.as_str())
        .fetch_all(pool)
        .await?;
        rows.into_iter().map(Self::snapshot_from_row).collect()
    }

    pub async fn delete_snapshots_older_than(pool: &PgPool, tenant_id: &TenantId, cutoff: DateTime<Utc>) -> Result<u64, CoreError> {
        let result = sqlx::query("DELETE FROM stock_snapshots WHERE tenant_id = $1 AND generate_date_time < $2")
            .bind(tenant_id.as_str())
            .bind(cutoff)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    fn snapshot_from_row(row: sqlx::postgres::PgRow) -> Result<StockSnapshot, CoreError> {
        let tenant_id_raw: String = row.try_get("tenant_id")?;
        let stocks_raw: serde_json::Value = row.try_get("stocks")?;
        Ok(StockSnapshot {
            snapshot_id: row.try_get("snapshot_id")?,
            tenant_id: TenantId::parse(&tenant_id_raw).map_err(CoreError::Internal)?,
            store_code: row.try_get("store_code")?,
            total_items: row.try_get("total_items")?,
            total_quantity: row.try_get("total_quantity")?,
            stocks: serde_json::from_value(stocks_raw).map_err(|e| CoreError::Internal(e.to_string()))?,
            created_by: row.try_get("created_by")?,
            generate_date_time: row.try_get("generate_date_time")?,
        })
    }

    fn from_row(row: sqlx::postgres::PgRow) -> Result<Stock, CoreError> {
        let tenant_id_raw: String = row.try_get("tenant_id")?;
        Ok(Stock {
            tenant_id: TenantId::parse(&tenant_id_raw).map_err(CoreError::Internal)?,
            store_code: row.try_get("store_code")?,
            item_code: row.try_get("item_code")?,
            current_quantity: row.try_get("current_quantity")?,
            minimum_quantity: row.try_get("minimum_quantity")?,
            reorder_point: row.try_get("reorder_point")?,
            reorder_quantity: row.try_get("reorder_quantity")?,
            last_transaction_id: row.try_get("last_transaction_id")?,
            etag: row.try_get::<String, _>("etag")?.into(),
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}
