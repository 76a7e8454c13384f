//! `SinkAdapter` (C7): the idempotent-delivery wrapper every consumer runs
//! behind. Implements spec.md §4.5's three-step contract exactly.
//!
//! Grounded on `internal_transfer/types.rs`'s `OpResult { Success, Failed,
//! Pending }` tri-state — `DispatchOutcome` plays the same role for an
//! event handler's result instead of a transfer step's result.

use sqlx::PgPool;
use tracing::{info, warn};

use crate::bus::consumer::Consumer;
use crate::bus::event::Event;
use crate::bus::idempotency::{BeginOutcome, IdempotencyStore};
use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Handler ran and succeeded, or the event was already `Completed`.
    Acked,
    /// Handler failed, or another worker holds the lease; bus should retry
    /// with backoff.
    Nacked,
    /// Handler failed and `attempts_so_far` has reached the configured max.
    DeadLettered,
}

pub struct SinkAdapter;

impl SinkAdapter {
    pub async fn dispatch(
        pool: &PgPool,
        consumer: &dyn Consumer,
        event: &Event,
        attempts_so_far: i32,
        processing_ttl_secs: i64,
        max_attempts: i32,
    ) -> Result<DispatchOutcome, CoreError> {
        let event_id = event.event_id;
        let consumer_name = consumer.name();

        match IdempotencyStore::begin(pool, consumer_name, event_id, processing_ttl_secs).await? {
            BeginOutcome::AlreadyDone => {
                info!(consumer = consumer_name, %event_id, "event already completed, acking without re-running handler");
                return Ok(DispatchOutcome::Acked);
            }
            BeginOutcome::Contended => {
                return Ok(DispatchOutcome::Nacked);
            }
            BeginOutcome::Proceed => {}
        }

        match consumer.handle(event).await {
            Ok(result) => {
                IdempotencyStore::complete(pool, consumer_name, event_id, result).await?;
                Ok(DispatchOutcome::Acked)
            }
            Err(err) => {
                let message = err.to_string();
                IdempotencyStore::fail(pool, consumer_name, event_id, &message).await?;
                warn!(consumer = consumer_name, %event_id, attempts = attempts_so_far + 1, error = %message, "consumer handler failed");
                if attempts_so_far + 1 >= max_attempts {
                    Ok(DispatchOutcome::DeadLettered)
                } else {
                    Ok(DispatchOutcome::Nacked)
                }
            }
        }
    }

}
