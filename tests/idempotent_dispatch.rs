//! Unit coverage for the C7 idempotency CAS contract (spec.md §4.5):
//! `IdempotencyStore::begin`'s three outcomes, and `SinkAdapter::dispatch`
//! wiring a failing handler through to dead-lettering.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde_json::Value;
use uuid::Uuid;

use kugel_pos_core::bus::consumer::{Consumer, ConsumerError};
use kugel_pos_core::bus::event::{Event, topics};
use kugel_pos_core::bus::idempotency::{BeginOutcome, IdempotencyStore};
use kugel_pos_core::bus::sink::{DispatchOutcome, SinkAdapter};
use kugel_pos_core::tenant::TenantId;

struct AlwaysFails {
    calls: AtomicUsize,
}

#[async_trait::async_trait]
impl Consumer for AlwaysFails {
    fn name(&self) -> &str {
        "always-fails"
    }

    fn topic(&self) -> &str {
        topics::TRANLOG
    }

    async fn handle(&self, _event: &Event) -> Result<Option<Value>, ConsumerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(ConsumerError::Handler("boom".to_string()))
    }
}

#[tokio::test]
#[ignore = "requires PostgreSQL database"]
async fn begin_is_contended_while_a_lease_is_live_then_proceeds_once_it_expires() {
    let pool = common::create_test_pool().await;
    common::ensure_schema(&pool).await;

    let event_id = Uuid::new_v4();
    let outcome = IdempotencyStore::begin(&pool, "test-consumer", event_id, 30).await.unwrap();
    assert!(matches!(outcome, BeginOutcome::Proceed));

    let contended = IdempotencyStore::begin(&pool, "test-consumer", event_id, 30).await.unwrap();
    assert!(matches!(contended, BeginOutcome::Contended), "a live Processing lease blocks a second claim");

    // A TTL of 0 expires immediately, so the next begin() finds no live lease.
    let event_id_short_lease = Uuid::new_v4();
    IdempotencyStore::begin(&pool, "test-consumer", event_id_short_lease, 0).await.unwrap();
    let reclaimed = IdempotencyStore::begin(&pool, "test-consumer", event_id_short_lease, 30).await.unwrap();
    assert!(matches!(reclaimed, BeginOutcome::Proceed), "an expired Processing lease can be reclaimed");
}

#[tokio::test]
#[ignore = "requires PostgreSQL database"]
async fn completed_event_is_acked_without_rerunning_the_handler() {
    let pool = common::create_test_pool().await;
    common::ensure_schema(&pool).await;

    let event_id = Uuid::new_v4();
    IdempotencyStore::begin(&pool, "test-consumer", event_id, 30).await.unwrap();
    IdempotencyStore::complete(&pool, "test-consumer", event_id, None).await.unwrap();

    let outcome = IdempotencyStore::begin(&pool, "test-consumer", event_id, 30).await.unwrap();
    assert!(matches!(outcome, BeginOutcome::AlreadyDone));
}

#[tokio::test]
#[ignore = "requires PostgreSQL database"]
async fn dispatch_dead_letters_once_max_attempts_is_reached() {
    let pool = common::create_test_pool().await;
    common::ensure_schema(&pool).await;

    let tenant_id = TenantId::parse("S0007").unwrap();
    let consumer = Arc::new(AlwaysFails { calls: AtomicUsize::new(0) });
    let event = Event::new(tenant_id, topics::TRANLOG, serde_json::json!({}));

    let first = SinkAdapter::dispatch(&pool, consumer.as_ref(), &event, 0, 30, 3).await.unwrap();
    assert!(matches!(first, DispatchOutcome::Nacked));

    let second = SinkAdapter::dispatch(&pool, consumer.as_ref(), &event, 1, 30, 3).await.unwrap();
    assert!(matches!(second, DispatchOutcome::Nacked));

    let third = SinkAdapter::dispatch(&pool, consumer.as_ref(), &event, 2, 30, 3).await.unwrap();
    assert!(matches!(third, DispatchOutcome::DeadLettered));

    assert_eq!(consumer.calls.load(Ordering::SeqCst), 3, "every attempt re-runs the handler");
}
