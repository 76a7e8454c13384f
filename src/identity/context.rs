//! The caller context every handler receives once authenticated.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use std::sync::Arc;

use crate::core_ids::TerminalId;
use crate::gateway::envelope::{ApiError, error_codes};
use crate::gateway::state::AppState;
use crate::tenant::TenantId;

/// Resolved identity for the current request: which tenant, optionally
/// which store/terminal/staff, and what the caller is allowed to do.
/// Handlers derive tenant scoping from this, never from the URL path alone
/// (spec.md §8 property 6: cross-tenant access must 404, never leak
/// existence).
#[derive(Debug, Clone)]
pub struct CallerContext {
    pub tenant_id: TenantId,
    pub store_code: Option<String>,
    pub terminal_id: Option<TerminalId>,
    pub staff_id: Option<String>,
    pub is_superuser: bool,
    pub roles: Vec<String>,
}

impl CallerContext {
    /// 404s (never 403) when the path's tenant doesn't match the caller's
    /// token tenant, per spec.md S6 — existence of tenant B must not leak.
    pub fn require_tenant(&self, path_tenant: &TenantId) -> Result<(), ApiError> {
        if &self.tenant_id != path_tenant {
            return Err(ApiError::new(
                axum::http::StatusCode::NOT_FOUND,
                error_codes::ACCOUNT_NOT_FOUND,
                "not found",
                "auth.tenant_scope",
            ));
        }
        Ok(())
    }
}

/// Extracts a `CallerContext` previously inserted into request extensions by
/// [`super::middleware::jwt_auth_middleware`] or
/// [`super::middleware::terminal_api_key_middleware`].
impl FromRequestParts<Arc<AppState>> for CallerContext {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<CallerContext>().cloned().ok_or_else(|| {
            ApiError::new(
                axum::http::StatusCode::UNAUTHORIZED,
                error_codes::MISSING_AUTH,
                "missing authentication context",
                "auth.extract",
            )
        })
    }
}
