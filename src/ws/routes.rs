//! Route mount for the alert WebSocket (spec.md §4.6): unauthenticated at
//! the HTTP layer since the JWT travels in the query string and is
//! verified inside the upgrade handler itself.

use axum::Router;
use axum::routing::get;
use std::sync::Arc;

use crate::gateway::state::AppState;

use super::handler::stock_alert_ws;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/ws/{tenantId}/{storeCode}", get(stock_alert_ws))
}
