//! Route mount for the Account/Auth token endpoint. Unauthenticated by
//! definition — this is where a caller obtains the JWT every other route
//! requires.

use axum::routing::post;
use axum::Router;
use std::sync::Arc;

use crate::gateway::state::AppState;

use super::handlers::issue_token;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/accounts/token", post(issue_token))
}
