//! Route table for the Cart Engine (spec.md §6). Every operation here is
//! terminal-originated, so the route group is guarded by the API-key
//! middleware rather than the staff JWT one.

use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::post;
use std::sync::Arc;

use crate::gateway::state::AppState;
use crate::identity::middleware::terminal_api_key_middleware;

use super::handlers;

pub fn router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/carts", post(handlers::open_cart))
        .route("/carts/{cartId}", axum::routing::get(handlers::get_cart))
        .route("/carts/{cartId}/items", post(handlers::add_item))
        .route("/carts/{cartId}/items/cancel", post(handlers::cancel_item))
        .route("/carts/{cartId}/subtotal", post(handlers::subtotal))
        .route("/carts/{cartId}/back", post(handlers::back))
        .route("/carts/{cartId}/payments", post(handlers::add_payment))
        .route("/carts/{cartId}/complete", post(handlers::complete))
        .route("/carts/{cartId}/cancel", post(handlers::cancel))
        .route_layer(from_fn_with_state(state, terminal_api_key_middleware))
}
