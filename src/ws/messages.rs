//! Wire shapes for the alert WebSocket (spec.md §6).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsOutboundMessage {
    Connection {
        status: &'static str,
        tenant_id: String,
        store_code: String,
        timestamp: DateTime<Utc>,
    },
    StockAlert {
        alert_type: &'static str,
        tenant_id: String,
        store_code: String,
        item_code: String,
        current_quantity: Decimal,
        threshold: Decimal,
        timestamp: DateTime<Utc>,
    },
}
