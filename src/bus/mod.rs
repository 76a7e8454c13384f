//! Event Bus (C3) and Idempotent Sink Adapter (C7).
//!
//! Grounded on `internal_transfer`'s FSM/`OpResult` pattern and the
//! teacher's `crossbeam_queue`-backed internal queues, generalized to a
//! multi-topic, at-least-once, outbox-backed contract (spec.md §4.5).

pub mod bus;
pub mod consumer;
pub mod event;
pub mod idempotency;
pub mod outbox;
pub mod retry;
pub mod sink;

pub use bus::EventBus;
pub use consumer::{Consumer, ConsumerError};
pub use event::{Event, topics};
pub use sink::{DispatchOutcome, SinkAdapter};
