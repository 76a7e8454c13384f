//! Read-only lookups against the Master-Data catalog tables. Seeded by an
//! external Master-Data service (out of scope); this crate never writes
//! these tables outside of tests.

use rust_decimal::Decimal;
use sqlx::{PgPool, Row};

use crate::error::CoreError;

use super::models::{Item, PaymentMethod, TaxRule};

pub struct MasterDataRepository;

impl MasterDataRepository {
    pub async fn ensure_schema(pool: &PgPool) -> Result<(), CoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS items (
                tenant_id TEXT NOT NULL,
                item_code TEXT NOT NULL,
                description TEXT NOT NULL,
                unit_price NUMERIC(18,2) NOT NULL,
                tax_code TEXT NOT NULL,
                category_code TEXT,
                PRIMARY KEY (tenant_id, item_code)
            )
            "#,
        )
        .execute(pool)
        .await?;
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS item_store_prices (
                tenant_id TEXT NOT NULL,
                store_code TEXT NOT NULL,
                item_code TEXT NOT NULL,
                unit_price NUMERIC(18,2) NOT NULL,
                PRIMARY KEY (tenant_id, store_code, item_code)
            )
            "#,
        )
        .execute(pool)
        .await?;
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS tax_rules (
                tenant_id TEXT NOT NULL,
                tax_code TEXT NOT NULL,
                rate NUMERIC(9,6) NOT NULL,
                round_digit INT NOT NULL,
                round_method TEXT NOT NULL,
                tax_type TEXT NOT NULL,
                PRIMARY KEY (tenant_id, tax_code)
            )
            "#,
        )
        .execute(pool)
        .await?;
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS payment_methods (
                tenant_id TEXT NOT NULL,
                code TEXT NOT NULL,
                name TEXT NOT NULL,
                can_deposit_over BOOLEAN NOT NULL DEFAULT false,
                can_change BOOLEAN NOT NULL DEFAULT false,
                PRIMARY KEY (tenant_id, code)
            )
            "#,
        )
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn find_item(pool: &PgPool, tenant_id: &str, item_code: &str) -> Result<Option<Item>, CoreError> {
        let row = sqlx::query(
            "SELECT item_code, description, unit_price, tax_code, category_code FROM items WHERE tenant_id = $1 AND item_code = $2",
        )
        .bind(tenant_id)
        .bind(item_code)
        .fetch_optional(pool)
        .await?;
        let Some(row) = row else { return Ok(None) };
        Ok(Some(Item {
            item_code: row.try_get("item_code")?,
            description: row.try_get("description")?,
            unit_price: row.try_get("unit_price")?,
            tax_code: row.try_get("tax_code")?,
            category_code: row.try_get("category_code")?,
        }))
    }

    /// Pricing resolution order (spec.md §4.2): store override first, then
    /// the item's common price.
    pub async fn resolve_unit_price(pool: &PgPool, tenant_id: &str, store_code: &str, item_code: &str) -> Result<Option<Decimal>, CoreError> {
        let override_row = sqlx::query("SELECT unit_price FROM item_store_prices WHERE tenant_id = $1 AND store_code = $2 AND item_code = $3")
            .bind(tenant_id)
            .bind(store_code)
            .bind(item_code)
            .fetch_optional(pool)
            .await?;
        if let Some(row) = override_row {
            return Ok(Some(row.try_get("unit_price")?));
        }
        Ok(Self::find_item(pool, tenant_id, item_code).await?.map(|i| i.unit_price))
    }

    pub async fn find_tax_rule(pool: &PgPool, tenant_id: &str, tax_code: &str) -> Result<Option<TaxRule>, CoreError> {
        let row = sqlx::query(
            "SELECT tax_code, rate, round_digit, round_method, tax_type FROM tax_rules WHERE tenant_id = $1 AND tax_code = $2",
        )
        .bind(tenant_id)
        .bind(tax_code)
        .fetch_optional(pool)
        .await?;
        let Some(row) = row else { return Ok(None) };
        Ok(Some(TaxRule {
            tax_code: row.try_get("tax_code")?,
            rate: row.try_get("rate")?,
            round_digit: row.try_get::<i32, _>("round_digit")? as u32,
            round_method: row.try_get("round_method")?,
            tax_type: row.try_get("tax_type")?,
        }))
    }

    pub async fn find_payment_method(pool: &PgPool, tenant_id: &str, code: &str) -> Result<Option<PaymentMethod>, CoreError> {
        let row = sqlx::query("SELECT code, name, can_deposit_over, can_change FROM payment_methods WHERE tenant_id = $1 AND code = $2")
            .bind(tenant_id)
            .bind(code)
            .fetch_optional(pool)
            .await?;
        let Some(row) = row else { return Ok(None) };
        Ok(Some(PaymentMethod {
            code: row.try_get("code")?,
            name: row.try_get("name")?,
            can_deposit_over: row.try_get("can_deposit_over")?,
            can_change: row.try_get("can_change")?,
        }))
    }
}
