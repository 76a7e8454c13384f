//! Route table for the Terminal Engine (spec.md §6).

use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post, put};
use std::sync::Arc;

use crate::gateway::state::AppState;
use crate::identity::middleware::jwt_auth_middleware;

use super::handlers;

pub fn router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/terminals", post(handlers::create_terminal).get(handlers::list_terminals))
        .route("/terminals/{terminalId}", get(handlers::get_terminal).delete(handlers::delete_terminal))
        .route("/terminals/{terminalId}/sign-in", post(handlers::sign_in))
        .route("/terminals/{terminalId}/sign-out", post(handlers::sign_out))
        .route("/terminals/{terminalId}/open", post(handlers::open_terminal))
        .route("/terminals/{terminalId}/close", post(handlers::close_terminal))
        .route("/terminals/{terminalId}/cash-in", post(handlers::cash_in))
        .route("/terminals/{terminalId}/cash-out", post(handlers::cash_out))
        .route("/terminals/{terminalId}/function_mode", put(handlers::update_function_mode))
        .route("/terminals/{terminalId}/description", put(handlers::update_description))
        .route_layer(from_fn_with_state(state, jwt_auth_middleware))
}
