//! Axum middleware producing a [`CallerContext`] for every request.
//!
//! Two entry points, grounded on `user_auth/middleware.rs` (JWT) and
//! `gateway/mod.rs`'s `gateway_auth_middleware` (header + query extraction
//! flow for API-key auth):
//! - `jwt_auth_middleware`: staff/back-office Bearer JWT.
//! - `terminal_api_key_middleware`: `X-API-Key` header + `terminal_id` query
//!   param, for terminal-originated calls (spec.md §6).

use axum::{
    body::Body,
    extract::{Query, State},
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::core_ids::TerminalId;
use crate::gateway::envelope::{ApiError, error_codes};
use crate::gateway::state::AppState;
use crate::identity::api_key::verify_api_key;
use crate::identity::context::CallerContext;

pub async fn jwt_auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| {
            ApiError::new(
                axum::http::StatusCode::UNAUTHORIZED,
                error_codes::MISSING_AUTH,
                "missing Authorization header",
                "auth.jwt",
            )
        })?;

    let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        ApiError::new(
            axum::http::StatusCode::UNAUTHORIZED,
            error_codes::AUTH_FAILED,
            "Authorization header must use the Bearer scheme",
            "auth.jwt",
        )
    })?;

    let claims = state
        .jwt_issuer
        .verify(token)
        .map_err(|e| ApiError::new(axum::http::StatusCode::UNAUTHORIZED, error_codes::AUTH_FAILED, e.to_string(), "auth.jwt"))?;

    let tenant_id = claims
        .tenant_id()
        .map_err(|e| ApiError::new(axum::http::StatusCode::UNAUTHORIZED, error_codes::AUTH_FAILED, e.to_string(), "auth.jwt"))?;

    let context = CallerContext {
        tenant_id,
        store_code: None,
        terminal_id: None,
        staff_id: Some(claims.sub),
        is_superuser: claims.is_superuser,
        roles: Vec::new(),
    };
    request.extensions_mut().insert(context);
    Ok(next.run(request).await)
}

#[derive(Debug, Deserialize)]
pub struct ApiKeyQuery {
    pub terminal_id: String,
}

pub async fn terminal_api_key_middleware(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ApiKeyQuery>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let api_key = request
        .headers()
        .get("X-API-Key")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| {
            ApiError::new(
                axum::http::StatusCode::UNAUTHORIZED,
                error_codes::MISSING_AUTH,
                "missing X-API-Key header",
                "auth.api_key",
            )
        })?
        .to_string();

    let terminal_id = TerminalId::parse(&query.terminal_id).map_err(|e| {
        ApiError::new(
            axum::http::StatusCode::BAD_REQUEST,
            error_codes::INVALID_PARAMETER,
            e,
            "auth.api_key",
        )
    })?;

    let tenant_id = terminal_id.tenant_id();
    let pool = state
        .tenant_store
        .pool(&tenant_id)
        .await
        .map_err(|e| ApiError::from_core(e, "auth.api_key", error_codes::SERVICE_UNAVAILABLE))?;

    let record = state
        .terminal_repo
        .find_auth_record(&pool, &terminal_id)
        .await
        .map_err(|e| ApiError::from_core(e, "auth.api_key", error_codes::INTERNAL_ERROR))?
        .ok_or_else(|| {
            ApiError::new(
                axum::http::StatusCode::UNAUTHORIZED,
                error_codes::AUTH_FAILED,
                "unknown terminal or api key",
                "auth.api_key",
            )
        })?;

    if !verify_api_key(&api_key, &record.api_key_hash) {
        return Err(ApiError::new(
            axum::http::StatusCode::UNAUTHORIZED,
            error_codes::AUTH_FAILED,
            "invalid api key",
            "auth.api_key",
        ));
    }

    let context = CallerContext {
        tenant_id,
        store_code: Some(terminal_id.store_code().to_string()),
        terminal_id: Some(terminal_id),
        staff_id: record.signed_in_staff,
        is_superuser: false,
        roles: Vec::new(),
    };
    request.extensions_mut().insert(context);
    Ok(next.run(request).await)
}
