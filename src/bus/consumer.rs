//! The handler contract C4-C6 implement against (spec.md §4.5: "a handler
//! is a function of `(event) -> Result`").

use serde_json::Value;
use thiserror::Error;

use crate::bus::event::Event;
use crate::error::CoreError;

#[derive(Debug, Error)]
pub enum ConsumerError {
    #[error("handler failed: {0}")]
    Handler(String),
    #[error(transparent)]
    Core(#[from] CoreError),
}

#[async_trait::async_trait]
pub trait Consumer: Send + Sync {
    /// Stable name; part of the `(consumerName, eventId)` idempotency key.
    fn name(&self) -> &str;

    /// Topic this consumer subscribes to.
    fn topic(&self) -> &str;

    async fn handle(&self, event: &Event) -> Result<Option<Value>, ConsumerError>;
}
