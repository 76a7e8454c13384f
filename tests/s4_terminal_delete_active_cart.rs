//! S4 — a terminal cannot be deleted while it owns an active cart; once the
//! cart is cancelled and the terminal is closed, deletion succeeds.

mod common;

use std::str::FromStr;

use rust_decimal::Decimal;

use kugel_pos_core::cart::CartEngine;
use kugel_pos_core::error::CoreError;
use kugel_pos_core::tenant::TenantId;
use kugel_pos_core::terminal::TerminalEngine;

#[tokio::test]
#[ignore = "requires PostgreSQL database"]
async fn delete_is_blocked_by_an_active_cart_then_succeeds_once_clear() {
    let pool = common::create_test_pool().await;
    common::ensure_schema(&pool).await;

    let tenant_id = TenantId::parse("S0004").unwrap();
    let tenants = common::test_tenant_store();
    let bus = common::bare_bus();
    let terminal_engine = TerminalEngine::new(tenants.clone(), bus.clone());
    let cart_engine = CartEngine::new(tenants.clone(), bus.clone());

    let terminal = terminal_engine.create(&tenant_id, "store001", 4, "hash".to_string()).await.unwrap();
    let etag = terminal_engine
        .open(&tenant_id, &terminal.terminal_id, chrono::Utc::now().date_naive(), Decimal::from_str("500.00").unwrap(), Some("staff1"), &terminal.etag)
        .await
        .unwrap();

    let cart = cart_engine.open(&tenant_id, &terminal.terminal_id).await.unwrap();

    let err = terminal_engine.delete(&tenant_id, &terminal.terminal_id).await.unwrap_err();
    assert!(matches!(err, CoreError::InvalidState(_)), "delete must fail while a cart is active");

    cart_engine.cancel(&tenant_id, &terminal.terminal_id, &cart.cart_id, &cart.etag).await.unwrap();
    terminal_engine.close(&tenant_id, &terminal.terminal_id, Some(Decimal::from_str("500.00").unwrap()), &etag).await.unwrap();

    terminal_engine.delete(&tenant_id, &terminal.terminal_id).await.unwrap();
    let missing = terminal_engine.get(&tenant_id, &terminal.terminal_id).await;
    assert!(matches!(missing, Err(CoreError::NotFound(_))));
}
