//! Route mount for the Stock Engine (spec.md §6): store/terminal-originated
//! like Cart, so it sits behind the same API-key middleware.

use axum::middleware::from_fn_with_state;
use axum::routing::{get, post, put};
use axum::Router;
use std::sync::Arc;

use crate::gateway::state::AppState;
use crate::identity::middleware::terminal_api_key_middleware;

use super::handlers::{
    create_snapshot, get_snapshot, get_stock, history, list_low, list_reorder_alerts, list_snapshots,
    list_stock, update_minimum, update_reorder, update_stock,
};

pub fn router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/stock", get(list_stock))
        .route("/stock/low", get(list_low))
        .route("/stock/reorder-alerts", get(list_reorder_alerts))
        .route("/stock/snapshot", post(create_snapshot))
        .route("/stock/snapshots", get(list_snapshots))
        .route("/stock/snapshot/{snapshotId}", get(get_snapshot))
        .route("/stock/{itemCode}", get(get_stock))
        .route("/stock/{itemCode}/update", post(update_stock))
        .route("/stock/{itemCode}/history", get(history))
        .route("/stock/{itemCode}/minimum", put(update_minimum))
        .route("/stock/{itemCode}/reorder", put(update_reorder))
        .route_layer(from_fn_with_state(state, terminal_api_key_middleware))
}
