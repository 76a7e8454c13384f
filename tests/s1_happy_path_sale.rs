//! S1 — happy path sale: open terminal, ring up a sale, pay, complete, and
//! confirm the stock side effect and exactly-once tranlog publication.

mod common;

use std::str::FromStr;
use std::sync::Arc;

use rust_decimal::Decimal;

use kugel_pos_core::bus::EventBus;
use kugel_pos_core::bus::outbox::OutboxRepository;
use kugel_pos_core::cart::CartEngine;
use kugel_pos_core::core_ids::TerminalId;
use kugel_pos_core::master_data::{RoundMethod, TaxType};
use kugel_pos_core::stock::StockEngine;
use kugel_pos_core::stock::consumer::StockTranlogConsumer;
use kugel_pos_core::tenant::{Etag, TenantId};
use kugel_pos_core::terminal::TerminalEngine;
use kugel_pos_core::ws::WsHub;

#[tokio::test]
#[ignore = "requires PostgreSQL database"]
async fn happy_path_sale_completes_and_decrements_stock() {
    let pool = common::create_test_pool().await;
    common::ensure_schema(&pool).await;

    let tenant_id = TenantId::parse("S0001").unwrap();
    common::seed_item(&pool, &tenant_id, "ITEM001", "widget", "300.00", "TAX_10").await;
    common::seed_tax_rule(&pool, &tenant_id, "TAX_10", "0.10", 0, RoundMethod::Round, TaxType::Exclusive).await;
    common::seed_payment_method(&pool, &tenant_id, "CASH", "Cash", true, true).await;

    let tenants = common::test_tenant_store();
    let bus = common::bare_bus();
    let ws_hub = Arc::new(WsHub::new());

    let terminal_engine = TerminalEngine::new(tenants.clone(), bus.clone());
    let cart_engine = CartEngine::new(tenants.clone(), bus.clone());
    let stock_engine = Arc::new(StockEngine::new(tenants.clone(), ws_hub));
    bus.register(Arc::new(StockTranlogConsumer::new(stock_engine.clone())));

    let terminal = terminal_engine.create(&tenant_id, "store001", 1, "hash".to_string()).await.unwrap();
    terminal_engine
        .open(&tenant_id, &terminal.terminal_id, chrono::Utc::now().date_naive(), Decimal::from_str("500.00").unwrap(), Some("staff1"), &terminal.etag)
        .await
        .unwrap();

    let cart = cart_engine.open(&tenant_id, &terminal.terminal_id).await.unwrap();
    let cart = cart_engine
        .add_item(&tenant_id, &terminal.terminal_id, &cart.cart_id, "ITEM001", Decimal::from(2), Decimal::ZERO, &cart.etag)
        .await
        .unwrap();
    let cart = cart_engine.subtotal(&tenant_id, &terminal.terminal_id, &cart.cart_id, &cart.etag).await.unwrap();
    assert_eq!(cart.sub_total, Decimal::from_str("600.00").unwrap());
    assert_eq!(cart.tax_amount, Decimal::from_str("60").unwrap());
    assert_eq!(cart.total, Decimal::from_str("660").unwrap());

    let cart = cart_engine
        .add_payment(&tenant_id, &terminal.terminal_id, &cart.cart_id, "CASH", Decimal::from(1000), &cart.etag)
        .await
        .unwrap();
    let cart = cart_engine.complete(&tenant_id, &terminal.terminal_id, &cart.cart_id, &cart.etag).await.unwrap();

    let first_receipt = cart.receipt_no.expect("completed cart carries a receipt number");

    let cart2 = cart_engine.open(&tenant_id, &terminal.terminal_id).await.unwrap();
    let cart2 = cart_engine
        .add_item(&tenant_id, &terminal.terminal_id, &cart2.cart_id, "ITEM001", Decimal::ONE, Decimal::ZERO, &cart2.etag)
        .await
        .unwrap();
    let cart2 = cart_engine.subtotal(&tenant_id, &terminal.terminal_id, &cart2.cart_id, &cart2.etag).await.unwrap();
    let cart2 = cart_engine
        .add_payment(&tenant_id, &terminal.terminal_id, &cart2.cart_id, "CASH", cart2.total, &cart2.etag)
        .await
        .unwrap();
    let cart2 = cart_engine.complete(&tenant_id, &terminal.terminal_id, &cart2.cart_id, &cart2.etag).await.unwrap();
    let second_receipt = cart2.receipt_no.expect("completed cart carries a receipt number");
    assert!(second_receipt > first_receipt, "receipt numbers are monotonic");

    let undelivered = OutboxRepository::fetch_undelivered(&pool, 100).await.unwrap();
    let tranlog_rows: Vec<_> = undelivered.iter().filter(|r| r.event.topic == kugel_pos_core::bus::topics::TRANLOG).collect();
    assert_eq!(tranlog_rows.len(), 2, "one tranlog row per completed sale");

    for row in &tranlog_rows {
        let outcome = bus.handle_inbound(&pool, row.event.clone()).await.unwrap();
        assert_eq!(outcome, kugel_pos_core::bus::DispatchOutcome::Acked);
    }

    let stock = stock_engine.get(&tenant_id, "store001", "ITEM001").await.unwrap();
    assert_eq!(stock.current_quantity, Decimal::from(-3), "two sales of 2 and 1 units each decrement from a zero-initialized row");
}
