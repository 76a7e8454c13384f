//! Stock, StockUpdate, StockSnapshot and AlertCooldown entities (spec.md §3).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::tenant::{Etag, TenantId};

use super::state::UpdateType;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stock {
    pub tenant_id: TenantId,
    pub store_code: String,
    pub item_code: String,
    pub current_quantity: Decimal,
    pub minimum_quantity: Decimal,
    pub reorder_point: Decimal,
    pub reorder_quantity: Decimal,
    pub last_transaction_id: Option<String>,
    pub etag: Etag,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Stock {
    /// The row a first update creates lazily (spec.md §4.3 step 1).
    pub fn new_zero(tenant_id: TenantId, store_code: String, item_code: String) -> Self {
        let now = Utc::now();
        Self {
            tenant_id,
            store_code,
            item_code,
            current_quantity: Decimal::ZERO,
            minimum_quantity: Decimal::ZERO,
            reorder_point: Decimal::ZERO,
            reorder_quantity: Decimal::ZERO,
            last_transaction_id: None,
            etag: Etag::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Immutable, append-only audit row for a single stock mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockUpdate {
    pub id: i64,
    pub tenant_id: TenantId,
    pub store_code: String,
    pub item_code: String,
    pub update_type: UpdateType,
    pub quantity_change: Decimal,
    pub before_qty: Decimal,
    pub after_qty: Decimal,
    pub reference_id: Option<String>,
    pub operator_id: Option<String>,
    pub note: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockSnapshotLine {
    pub item_code: String,
    pub current_quantity: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockSnapshot {
    pub snapshot_id: uuid::Uuid,
    pub tenant_id: TenantId,
    pub store_code: String,
    pub total_items: i64,
    pub total_quantity: Decimal,
    pub stocks: Vec<StockSnapshotLine>,
    pub created_by: String,
    pub generate_date_time: DateTime<Utc>,
}

/// TTL-guarded suppression record; an unexpired row for
/// `(tenantId, storeCode, itemCode, alertType)` silences further alerts of
/// that type until `cooldownUntil`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertCooldown {
    pub last_alert_time: DateTime<Utc>,
    pub cooldown_until: DateTime<Utc>,
}
