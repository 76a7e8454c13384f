//! WebSocket Hub (C9): per-`(tenantId, storeCode)` alert fan-out, spec.md §4.6.

pub mod handler;
pub mod hub;
pub mod messages;
pub mod routes;

pub use hub::{GroupKey, WsHub};
pub use messages::WsOutboundMessage;
