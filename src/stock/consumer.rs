//! Tranlog consumer (spec.md §4.3 last paragraph): on each completed sale,
//! issues one stock update per non-cancelled line item. Runs through C7, so
//! a replayed `tranlog` event is a no-op after the first successful pass.

use serde::Deserialize;
use serde_json::Value;

use crate::bus::{Consumer, ConsumerError, Event};
use crate::core_ids::TerminalId;
use crate::tenant::TenantId;

use super::engine::StockEngine;
use super::state::UpdateType;

/// The slice of a `tranlog` payload the Stock Engine actually needs; the
/// full `Cart` carries more fields (payments, totals) this consumer never
/// touches.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranlogLine {
    item_code: String,
    quantity: rust_decimal::Decimal,
    cancelled: bool,
}

#[derive(Debug, Deserialize)]
struct TranlogPayload {
    cart_id: String,
    tenant_id: TenantId,
    terminal_id: TerminalId,
    line_items: Vec<TranlogLine>,
}

pub struct StockTranlogConsumer {
    engine: std::sync::Arc<StockEngine>,
}

impl StockTranlogConsumer {
    pub fn new(engine: std::sync::Arc<StockEngine>) -> Self {
        Self { engine }
    }
}

#[async_trait::async_trait]
impl Consumer for StockTranlogConsumer {
    fn name(&self) -> &str {
        "stock"
    }

    fn topic(&self) -> &str {
        crate::bus::topics::TRANLOG
    }

    async fn handle(&self, event: &Event) -> Result<Option<Value>, ConsumerError> {
        let payload: TranlogPayload = serde_json::from_value(event.payload.clone())
            .map_err(|e| ConsumerError::Handler(format!("malformed tranlog payload: {e}")))?;
        let store_code = payload.terminal_id.store_code();

        for line in payload.line_items.iter().filter(|l| !l.cancelled) {
            self.engine
                .update(
                    &payload.tenant_id,
                    store_code,
                    &line.item_code,
                    UpdateType::Sale,
                    -line.quantity,
                    Some(&payload.cart_id),
                    None,
                    None,
                )
                .await
                .map_err(|e| ConsumerError::Handler(e.to_string()))?;
        }
        Ok(None)
    }
}
