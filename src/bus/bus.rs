//! `EventBus` (C3): topic-based at-least-once pub/sub over the outbox,
//! generalizing the teacher's `crossbeam_queue::ArrayQueue`-based
//! `order_queue`/`push_event_queue` into a multi-topic, durable contract.
//!
//! Consumers register once at startup (`register`); [`EventBus::run_dispatcher`]
//! is spawned per tenant pool and polls undelivered outbox rows, running
//! every registered consumer for the row's topic through [`SinkAdapter`]
//! until all ack, then marks the row delivered.

use std::sync::Arc;

use dashmap::DashMap;
use sqlx::PgPool;
use tokio::sync::broadcast;
use tokio::time::{Duration, sleep};
use tracing::{error, info, warn};

use crate::bus::consumer::Consumer;
use crate::bus::event::Event;
use crate::bus::outbox::{OutboxRepository, OutboxRow};
use crate::bus::retry::backoff_delay;
use crate::bus::sink::{DispatchOutcome, SinkAdapter};
use crate::error::CoreError;

const OUTBOX_POLL_BATCH: i64 = 200;

/// Live, in-process fan-out in addition to the durable outbox — used by
/// components (e.g. the WebSocket hub) that want a cheap "tell me the
/// moment this happens" signal without paying for an idempotency lookup.
/// The outbox dispatcher remains the source of truth for at-least-once
/// delivery; this channel is best-effort only.
pub struct EventBus {
    channels: DashMap<String, broadcast::Sender<Event>>,
    consumers: DashMap<String, Vec<Arc<dyn Consumer>>>,
    idempotency_processing_ttl_secs: i64,
    max_delivery_attempts: i32,
}

impl EventBus {
    pub fn new(idempotency_processing_ttl_secs: i64, max_delivery_attempts: i32) -> Arc<Self> {
        Arc::new(Self {
            channels: DashMap::new(),
            consumers: DashMap::new(),
            idempotency_processing_ttl_secs,
            max_delivery_attempts,
        })
    }

    pub fn register(&self, consumer: Arc<dyn Consumer>) {
        self.consumers.entry(consumer.topic().to_string()).or_default().push(consumer);
    }

    /// Best-effort live subscription to a topic (not at-least-once; see
    /// module docs). Creates the channel lazily on first subscriber.
    pub fn subscribe(&self, topic: &str) -> broadcast::Receiver<Event> {
        self.channels
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(256).0)
            .subscribe()
    }

    fn notify_live_subscribers(&self, event: &Event) {
        if let Some(sender) = self.channels.get(&event.topic) {
            // No subscribers is not an error; broadcast::send fails only then.
            let _ = sender.send(event.clone());
        }
    }

    /// Poll one tenant's outbox once, dispatching due rows to every
    /// registered consumer for their topic. Callers loop this on an
    /// interval per known tenant pool.
    pub async fn poll_once(&self, pool: &PgPool) -> Result<usize, CoreError> {
        let rows = OutboxRepository::fetch_undelivered(pool, OUTBOX_POLL_BATCH).await?;
        let delivered = rows.len();
        for row in rows {
            self.dispatch_row(pool, row).await?;
        }
        Ok(delivered)
    }

    async fn dispatch_row(&self, pool: &PgPool, row: OutboxRow) -> Result<(), CoreError> {
        self.notify_live_subscribers(&row.event);

        let consumers = self
            .consumers
            .get(&row.event.topic)
            .map(|c| c.value().clone())
            .unwrap_or_default();

        if consumers.is_empty() {
            // Nothing subscribes to this topic; still mark delivered so it
            // doesn't sit forever — spec.md names the subscriber set per
            // topic explicitly, so an empty set means misconfiguration, not
            // a transient condition worth retrying.
            warn!(topic = %row.event.topic, event_id = %row.event.event_id, "no consumers registered for topic");
            OutboxRepository::mark_delivered(pool, row.id).await?;
            return Ok(());
        }

        let mut all_acked = true;
        let mut last_error = String::new();
        for consumer in &consumers {
            match SinkAdapter::dispatch(
                pool,
                consumer.as_ref(),
                &row.event,
                row.attempts,
                self.idempotency_processing_ttl_secs,
                self.max_delivery_attempts,
            )
            .await?
            {
                DispatchOutcome::Acked => {}
                DispatchOutcome::Nacked => {
                    all_acked = false;
                }
                DispatchOutcome::DeadLettered => {
                    last_error = format!("consumer {} exhausted retries", consumer.name());
                    OutboxRepository::dead_letter(pool, &row, &last_error).await?;
                    return Ok(());
                }
            }
        }

        if all_acked {
            OutboxRepository::mark_delivered(pool, row.id).await?;
        } else {
            let next_attempt_at = chrono::Utc::now() + backoff_delay((row.attempts + 1) as u32);
            OutboxRepository::record_attempt(pool, row.id, next_attempt_at).await?;
        }
        Ok(())
    }

    /// Push-delivery path for the Dapr-style event-ingress endpoints
    /// (spec.md §6: `POST /api/v1/{tranlog,cashlog,opencloselog}`): dispatch
    /// one already-received event straight through C7 without waiting for
    /// the outbox poll loop. Still idempotent by `eventId` since it goes
    /// through the same `SinkAdapter`; callers ack the HTTP request on
    /// `Acked`, and retry (the sidecar's job, not ours) on anything else.
    pub async fn handle_inbound(&self, pool: &PgPool, event: Event) -> Result<DispatchOutcome, CoreError> {
        self.notify_live_subscribers(&event);

        let consumers = self
            .consumers
            .get(&event.topic)
            .map(|c| c.value().clone())
            .unwrap_or_default();

        if consumers.is_empty() {
            warn!(topic = %event.topic, event_id = %event.event_id, "no consumers registered for topic");
            return Ok(DispatchOutcome::Acked);
        }

        let mut outcome = DispatchOutcome::Acked;
        for consumer in &consumers {
            match SinkAdapter::dispatch(pool, consumer.as_ref(), &event, 0, self.idempotency_processing_ttl_secs, self.max_delivery_attempts).await? {
                DispatchOutcome::Acked => {}
                other => outcome = other,
            }
        }
        Ok(outcome)
    }

    /// Background loop for one tenant's pool; never returns, never panics
    /// on a single failed poll — logs and retries on the next tick.
    pub async fn run_dispatcher(self: Arc<Self>, pool: PgPool, poll_interval: Duration) {
        let mut interval = tokio::time::interval(poll_interval);
        loop {
            interval.tick().await;
            match self.poll_once(&pool).await {
                Ok(0) => {}
                Ok(n) => info!(delivered_or_retried = n, "outbox dispatcher tick"),
                Err(e) => {
                    error!(error = %e, "outbox dispatcher tick failed, will retry next interval");
                    sleep(Duration::from_millis(100)).await;
                }
            }
        }
    }
}
