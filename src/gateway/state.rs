//! Shared application state for the POS HTTP/WebSocket surface.
//!
//! Grounded on the teacher's own `AppState` (the collection of
//! process-lifetime services every handler reaches through `State<Arc<..>>`),
//! generalized from a single matching engine's dependencies to this crate's
//! engines (C4-C9) plus the control-plane and auth services they sit on.

use std::sync::Arc;

use crate::bus::EventBus;
use crate::cart::CartEngine;
use crate::identity::JwtIssuer;
use crate::snapshot::SnapshotScheduler;
use crate::stock::StockEngine;
use crate::tenant::{TenantRegistry, TenantStore};
use crate::terminal::repository::TerminalRepository;
use crate::terminal::TerminalEngine;
use crate::ws::WsHub;

/// Every field here lives for the process lifetime; handlers never
/// construct these themselves, only reach through `State<Arc<AppState>>`.
pub struct AppState {
    pub jwt_issuer: JwtIssuer,
    pub tenant_store: TenantStore,
    pub tenant_registry: Arc<TenantRegistry>,
    pub event_bus: Arc<EventBus>,
    pub ws_hub: Arc<WsHub>,
    /// Unit-struct repository (stateless, all-`fn` API); kept as a field so
    /// middleware reaches it the same way handlers reach the stateful
    /// engines below.
    pub terminal_repo: TerminalRepository,
    pub terminal_engine: Arc<TerminalEngine>,
    pub cart_engine: Arc<CartEngine>,
    pub stock_engine: Arc<StockEngine>,
    pub snapshot_scheduler: Arc<SnapshotScheduler>,
}
