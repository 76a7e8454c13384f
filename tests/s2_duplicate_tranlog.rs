//! S2 — duplicate tranlog delivery: replaying the same event id through the
//! Stock consumer five times must append exactly one audit row and apply the
//! quantity change exactly once.

mod common;

use std::str::FromStr;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde_json::json;

use kugel_pos_core::bus::{Event, EventBus, topics};
use kugel_pos_core::core_ids::TerminalId;
use kugel_pos_core::stock::StockEngine;
use kugel_pos_core::stock::consumer::StockTranlogConsumer;
use kugel_pos_core::tenant::TenantId;
use kugel_pos_core::ws::WsHub;

#[tokio::test]
#[ignore = "requires PostgreSQL database"]
async fn replayed_event_id_updates_stock_exactly_once() {
    let pool = common::create_test_pool().await;
    common::ensure_schema(&pool).await;

    let tenant_id = TenantId::parse("S0002").unwrap();
    let tenants = common::test_tenant_store();
    let bus = EventBus::new(30, 5);
    let ws_hub = Arc::new(WsHub::new());
    let stock_engine = Arc::new(StockEngine::new(tenants, ws_hub));
    bus.register(Arc::new(StockTranlogConsumer::new(stock_engine.clone())));

    let terminal_id = TerminalId::new(&tenant_id, "store001", 1);
    let payload = json!({
        "cart_id": "cart-s2",
        "tenant_id": tenant_id.to_string(),
        "terminal_id": terminal_id.to_string(),
        "line_items": [
            { "itemCode": "ITEM010", "quantity": "3", "cancelled": false },
        ],
    });
    let event = Event::new(tenant_id.clone(), topics::TRANLOG, payload);

    for _ in 0..5 {
        bus.handle_inbound(&pool, event.clone()).await.unwrap();
    }

    let stock = stock_engine.get(&tenant_id, "store001", "ITEM010").await.unwrap();
    assert_eq!(stock.current_quantity, Decimal::from_str("-3").unwrap(), "quantity changes only once despite five deliveries");

    let history = stock_engine.history(&tenant_id, "store001", "ITEM010", 100).await.unwrap();
    assert_eq!(history.len(), 1, "only one audit row is appended across all replays");
}
