//! `POST /api/v1/accounts/token` — the only Account Service surface this
//! crate exposes (spec.md §1 Non-goals: registration beyond JWT issuance is
//! out of scope).

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::gateway::envelope::{error_codes, ok, ApiError, ApiResult};
use crate::gateway::state::AppState;
use crate::tenant::TenantId;

use super::staff::{verify_password, StaffAccountRepository};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRequest {
    pub tenant_id: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
}

pub async fn issue_token(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TokenRequest>,
) -> ApiResult<TokenResponse> {
    let tenant_id = TenantId::parse(&req.tenant_id)
        .map_err(|e| ApiError::new(axum::http::StatusCode::BAD_REQUEST, error_codes::INVALID_PARAMETER, e, "accounts.token"))?;

    let account = StaffAccountRepository::find(state.tenant_registry.pool(), &tenant_id, &req.username)
        .await
        .map_err(|e| ApiError::from_core(e, "accounts.token", error_codes::INTERNAL_ERROR))?
        .ok_or_else(|| ApiError::new(axum::http::StatusCode::UNAUTHORIZED, error_codes::AUTH_FAILED, "invalid credentials", "accounts.token"))?;

    if !account.is_active || !verify_password(&req.password, &account.password_hash) {
        return Err(ApiError::new(
            axum::http::StatusCode::UNAUTHORIZED,
            error_codes::AUTH_FAILED,
            "invalid credentials",
            "accounts.token",
        ));
    }

    let token = state
        .jwt_issuer
        .issue(&account.username, &account.tenant_id, account.is_superuser, account.is_active)
        .map_err(|e| ApiError::from_core(e, "accounts.token", error_codes::INTERNAL_ERROR))?;

    ok("accounts.token", TokenResponse { access_token: token, token_type: "Bearer" })
}
