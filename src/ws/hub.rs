//! WebSocket Hub (C9): connections grouped by `(tenantId, storeCode)`,
//! exactly per spec.md §4.6.
//!
//! Grounded on `websocket/connection.rs`'s `ConnectionManager` (DashMap
//! registry keyed by subject, per-connection `mpsc` sender, atomic id
//! counter), generalized from a per-user registry to a per-store group and
//! from an unbounded channel to a bounded one: spec.md §5 requires slow
//! consumers to be dropped rather than allowed to back-pressure a
//! broadcaster indefinitely.

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;

use super::messages::WsOutboundMessage;

pub type ConnectionId = u64;
pub type WsSender = mpsc::Sender<WsOutboundMessage>;

/// Bounded per-connection outbox; a socket that can't keep up within this
/// many queued messages is dropped rather than allowed to stall broadcast.
const CONNECTION_QUEUE_DEPTH: usize = 64;

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct GroupKey {
    pub tenant_id: String,
    pub store_code: String,
}

pub struct WsHub {
    groups: DashMap<GroupKey, Vec<(ConnectionId, WsSender)>>,
    next_conn_id: AtomicU64,
}

impl WsHub {
    pub fn new() -> Self {
        Self { groups: DashMap::new(), next_conn_id: AtomicU64::new(1) }
    }

    pub fn new_channel() -> (WsSender, mpsc::Receiver<WsOutboundMessage>) {
        mpsc::channel(CONNECTION_QUEUE_DEPTH)
    }

    pub fn register(&self, key: GroupKey, tx: WsSender) -> ConnectionId {
        let conn_id = self.next_conn_id.fetch_add(1, Ordering::Relaxed);
        self.groups.entry(key).or_default().push((conn_id, tx));
        conn_id
    }

    pub fn deregister(&self, key: &GroupKey, conn_id: ConnectionId) {
        if let Some(mut conns) = self.groups.get_mut(key) {
            conns.retain(|(id, _)| *id != conn_id);
            if conns.is_empty() {
                drop(conns);
                self.groups.remove(key);
            }
        }
    }

    /// Copies the subscriber list out before sending, per spec.md §5's
    /// "broadcasts copy out the subscriber list to avoid holding the lock
    /// during I/O". Failed/full sends are simply dropped; the receiving
    /// task's own read loop notices the closed channel and deregisters.
    pub fn broadcast(&self, key: &GroupKey, message: WsOutboundMessage) {
        let Some(conns) = self.groups.get(key).map(|c| c.value().clone()) else { return };
        for (_, tx) in conns {
            let _ = tx.try_send(message.clone());
        }
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }
}

impl Default for WsHub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> GroupKey {
        GroupKey { tenant_id: "A1234".to_string(), store_code: "store001".to_string() }
    }

    #[tokio::test]
    async fn register_and_deregister_empties_group() {
        let hub = WsHub::new();
        let (tx, _rx) = WsHub::new_channel();
        let conn_id = hub.register(key(), tx);
        assert_eq!(hub.group_count(), 1);
        hub.deregister(&key(), conn_id);
        assert_eq!(hub.group_count(), 0);
    }

    #[tokio::test]
    async fn broadcast_reaches_every_connection_in_group() {
        let hub = WsHub::new();
        let (tx1, mut rx1) = WsHub::new_channel();
        let (tx2, mut rx2) = WsHub::new_channel();
        hub.register(key(), tx1);
        hub.register(key(), tx2);

        hub.broadcast(
            &key(),
            WsOutboundMessage::Connection {
                status: "connected",
                tenant_id: "A1234".to_string(),
                store_code: "store001".to_string(),
                timestamp: chrono::Utc::now(),
            },
        );

        assert!(rx1.try_recv().is_ok());
        assert!(rx2.try_recv().is_ok());
    }
}
