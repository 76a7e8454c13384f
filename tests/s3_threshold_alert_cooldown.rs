//! S3 — minimum-stock threshold alert with cooldown suppression.

mod common;

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;

use kugel_pos_core::stock::StockEngine;
use kugel_pos_core::stock::state::UpdateType;
use kugel_pos_core::tenant::TenantId;
use kugel_pos_core::ws::{GroupKey, WsHub};

const ALERT_COOLDOWN_SECS: i64 = 1;

#[tokio::test]
#[ignore = "requires PostgreSQL database"]
async fn crossing_minimum_fires_once_then_waits_out_cooldown() {
    let pool = common::create_test_pool().await;
    common::ensure_schema(&pool).await;

    let tenant_id = TenantId::parse("S0003").unwrap();
    let tenants = common::test_tenant_store();
    let ws_hub = Arc::new(WsHub::new());
    let engine = StockEngine::new(tenants, ws_hub.clone()).with_alert_cooldown_secs(ALERT_COOLDOWN_SECS);

    let (tx, mut rx) = WsHub::new_channel();
    let group = GroupKey { tenant_id: tenant_id.to_string(), store_code: "store001".to_string() };
    ws_hub.register(group, tx);

    engine.update_minimum(&tenant_id, "store001", "ITEM002", Decimal::from(20)).await.unwrap();
    engine
        .update(&tenant_id, "store001", "ITEM002", UpdateType::Initial, Decimal::from(21), None, None, None)
        .await
        .unwrap();
    assert!(rx.try_recv().is_err(), "seeding to 21 does not cross the minimum of 20");

    let stock = engine
        .update(&tenant_id, "store001", "ITEM002", UpdateType::Sale, Decimal::from_str("-2").unwrap(), None, None, None)
        .await
        .unwrap();
    assert_eq!(stock.current_quantity, Decimal::from(19));
    assert!(rx.try_recv().is_ok(), "crossing below the minimum fires exactly one alert");
    assert!(rx.try_recv().is_err(), "only one alert is sent for this crossing");

    let stock = engine
        .update(&tenant_id, "store001", "ITEM002", UpdateType::Sale, Decimal::from_str("-1").unwrap(), None, None, None)
        .await
        .unwrap();
    assert_eq!(stock.current_quantity, Decimal::from(18));
    assert!(rx.try_recv().is_err(), "still within cooldown, no alert fires");

    tokio::time::sleep(Duration::from_secs((ALERT_COOLDOWN_SECS + 1) as u64)).await;

    let stock = engine
        .update(&tenant_id, "store001", "ITEM002", UpdateType::Sale, Decimal::from_str("-1").unwrap(), None, None, None)
        .await
        .unwrap();
    assert_eq!(stock.current_quantity, Decimal::from(17));
    assert!(rx.try_recv().is_ok(), "cooldown has elapsed, the alert fires again");
}
