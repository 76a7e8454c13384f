//! Route mount for `/stock/snapshot-schedule` (spec.md §6). Schedule
//! configuration is a staff/back-office action, so it sits behind the JWT
//! middleware rather than the terminal API-key one Cart/Stock use.

use axum::middleware::from_fn_with_state;
use axum::routing::{get, put};
use axum::Router;
use std::sync::Arc;

use crate::gateway::state::AppState;
use crate::identity::middleware::jwt_auth_middleware;

use super::handlers::{get_schedule, put_schedule};

pub fn router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/stock/snapshot-schedule", get(get_schedule).put(put_schedule))
        .route_layer(from_fn_with_state(state, jwt_auth_middleware))
}
