//! Cart persistence (spec.md §4.2), grounded on
//! `terminal/repository.rs`'s CAS query shape.
//!
//! Line items and payments are stored as JSONB columns rather than child
//! tables: a cart is always read and written whole (there is no query that
//! needs to filter by individual line item), so the aggregate-as-document
//! shape avoids a join for every cart read.

use sqlx::{PgPool, Postgres, Row, Transaction};

use crate::core_ids::TerminalId;
use crate::error::CoreError;
use crate::tenant::{Etag, TenantId};

use super::models::{Cart, CartId, LineItem, Payment};
use super::state::CartStatus;

pub struct CartRepository;

impl CartRepository {
    pub async fn ensure_schema(pool: &PgPool) -> Result<(), CoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS carts (
                cart_id UUID PRIMARY KEY,
                tenant_id TEXT NOT NULL,
                terminal_id TEXT NOT NULL,
                status TEXT NOT NULL,
                line_items JSONB NOT NULL DEFAULT '[]',
                payments JSONB NOT NULL DEFAULT '[]',
                sub_total NUMERIC(18,2) NOT NULL DEFAULT 0,
                tax_amount NUMERIC(18,2) NOT NULL DEFAULT 0,
                total NUMERIC(18,2) NOT NULL DEFAULT 0,
                order_discounts NUMERIC(18,2) NOT NULL DEFAULT 0,
                receipt_no BIGINT,
                etag TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            "#,
        )
        .execute(pool)
        .await?;
        sqlx::query(
            "CREATE SEQUENCE IF NOT EXISTS cart_receipt_no_seq",
        )
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn insert(pool: &PgPool, cart: &Cart) -> Result<(), CoreError> {
        sqlx::query(
            r#"
            INSERT INTO carts (
                cart_id, tenant_id, terminal_id, status, line_items, payments,
                sub_total, tax_amount, total, order_discounts, receipt_no, etag,
                created_at, updated_at
            ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14)
            "#,
        )
        .bind(cart.cart_id.inner())
        .bind(cart.tenant_id.as_str())
        .bind(cart.terminal_id.as_str())
        .bind(cart.status)
        .bind(serde_json::to_value(&cart.line_items).map_err(|e| CoreError::Internal(e.to_string()))?)
        .bind(serde_json::to_value(&cart.payments).map_err(|e| CoreError::Internal(e.to_string()))?)
        .bind(cart.sub_total)
        .bind(cart.tax_amount)
        .bind(cart.total)
        .bind(cart.order_discounts)
        .bind(cart.receipt_no)
        .bind(cart.etag.as_str())
        .bind(cart.created_at)
        .bind(cart.updated_at)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn find_by_id(pool: &PgPool, cart_id: &CartId) -> Result<Option<Cart>, CoreError> {
        let row = sqlx::query(
            r#"
            SELECT cart_id, tenant_id, terminal_id, status, line_items, payments,
                   sub_total, tax_amount, total, order_discounts, receipt_no, etag,
                   created_at, updated_at
            FROM carts WHERE cart_id = $1
            "#,
        )
        .bind(cart_id.inner())
        .fetch_optional(pool)
        .await?;
        row.map(Self::from_row).transpose()
    }

    /// Writes the full cart document back with a CAS check, used at the end
    /// of every mutating engine operation except `complete` (which commits
    /// through [`Self::complete_tx`] alongside the outbox row instead).
    pub async fn save(pool: &PgPool, cart: &Cart, old_etag: &Etag) -> Result<Etag, CoreError> {
        let new_etag = Etag::new();
        let result = sqlx::query(
            r#"
            UPDATE carts SET
                etag = $1, updated_at = now(), status = $2, line_items = $3, payments = $4,
                sub_total = $5, tax_amount = $6, total = $7, order_discounts = $8
            WHERE cart_id = $9 AND etag = $10
            "#,
        )
        .bind(new_etag.as_str())
        .bind(cart.status)
        .bind(serde_json::to_value(&cart.line_items).map_err(|e| CoreError::Internal(e.to_string()))?)
        .bind(serde_json::to_value(&cart.payments).map_err(|e| CoreError::Internal(e.to_string()))?)
        .bind(cart.sub_total)
        .bind(cart.tax_amount)
        .bind(cart.total)
        .bind(cart.order_discounts)
        .bind(cart.cart_id.inner())
        .bind(old_etag.as_str())
        .execute(pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(CoreError::Conflict("cart etag mismatch".to_string()));
        }
        Ok(new_etag)
    }

    /// Assigns the next receipt number and marks the cart `Completed` within
    /// the caller's transaction, so the receipt allocation, status flip and
    /// outbox `tranlog` row are atomic (spec.md §4.2 "Completion atomicity").
    pub async fn complete_tx(
        tx: &mut Transaction<'_, Postgres>,
        cart: &Cart,
        old_etag: &Etag,
    ) -> Result<(Etag, i64), CoreError> {
        let receipt_no: i64 = sqlx::query_scalar("SELECT nextval('cart_receipt_no_seq')")
            .fetch_one(&mut **tx)
            .await?;
        let new_etag = Etag::new();
        let result = sqlx::query(
            r#"
            UPDATE carts SET
                etag = $1, updated_at = now(), status = $2, line_items = $3, payments = $4,
                sub_total = $5, tax_amount = $6, total = $7, order_discounts = $8, receipt_no = $9
            WHERE cart_id = $10 AND etag = $11
            "#,
        )
        .bind(new_etag.as_str())
        .bind(CartStatus::Completed)
        .bind(serde_json::to_value(&cart.line_items).map_err(|e| CoreError::Internal(e.to_string()))?)
        .bind(serde_json::to_value(&cart.payments).map_err(|e| CoreError::Internal(e.to_string()))?)
        .bind(cart.sub_total)
        .bind(cart.tax_amount)
        .bind(cart.total)
        .bind(cart.order_discounts)
        .bind(receipt_no)
        .bind(cart.cart_id.inner())
        .bind(old_etag.as_str())
        .execute(&mut **tx)
        .await?;
        if result.rows_affected() == 0 {
            return Err(CoreError::Conflict("cart etag mismatch".to_string()));
        }
        Ok((new_etag, receipt_no))
    }

    /// Used by `TerminalEngine::delete` (spec.md §4.1 "Terminal delete while
    /// cart active"): a terminal cannot be removed while one of its carts is
    /// still mid-transaction.
    pub async fn exists_active_for_terminal(pool: &PgPool, terminal_id: &TerminalId) -> Result<bool, CoreError> {
        let row = sqlx::query(
            "SELECT EXISTS(SELECT 1 FROM carts WHERE terminal_id = $1 AND status NOT IN ('Completed', 'Cancelled')) AS active",
        )
        .bind(terminal_id.as_str())
        .fetch_one(pool)
        .await?;
        Ok(row.try_get("active")?)
    }

    pub async fn cancel(pool: &PgPool, cart_id: &CartId, old_etag: &Etag) -> Result<Etag, CoreError> {
        let new_etag = Etag::new();
        let result = sqlx::query(
            "UPDATE carts SET etag = $1, updated_at = now(), status = $2 WHERE cart_id = $3 AND etag = $4",
        )
        .bind(new_etag.as_str())
        .bind(CartStatus::Cancelled)
        .bind(cart_id.inner())
        .bind(old_etag.as_str())
        .execute(pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(CoreError::Conflict("cart etag mismatch".to_string()));
        }
        Ok(new_etag)
    }

    fn from_row(row: sqlx::postgres::PgRow) -> Result<Cart, CoreError> {
        let cart_id: uuid::Uuid = row.try_get("cart_id")?;
        let tenant_id_raw: String = row.try_get("tenant_id")?;
        let terminal_id_raw: String = row.try_get("terminal_id")?;
        let line_items_raw: serde_json::Value = row.try_get("line_items")?;
        let payments_raw: serde_json::Value = row.try_get("payments")?;
        Ok(Cart {
            cart_id: CartId::from_uuid(cart_id),
            tenant_id: TenantId::parse(&tenant_id_raw).map_err(CoreError::Internal)?,
            terminal_id: TerminalId::parse(&terminal_id_raw).map_err(CoreError::Internal)?,
            status: row.try_get("status")?,
            line_items: serde_json::from_value::<Vec<LineItem>>(line_items_raw)
                .map_err(|e| CoreError::Internal(e.to_string()))?,
            payments: serde_json::from_value::<Vec<Payment>>(payments_raw)
                .map_err(|e| CoreError::Internal(e.to_string()))?,
            sub_total: row.try_get("sub_total")?,
            tax_amount: row.try_get("tax_amount")?,
            total: row.try_get("total")?,
            order_discounts: row.try_get("order_discounts")?,
            receipt_no: row.try_get("receipt_no")?,
            etag: row.try_get::<String, _>("etag")?.into(),
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}
