//! Unified HTTP response envelope and error-code taxonomy (spec.md §6, §7).
//!
//! Every non-WebSocket endpoint answers with
//! `{ success, code, message, data, operation, metadata? }`. Field names on
//! the wire are camelCase; internal storage/business types stay snake_case.
//! This module is the single place that bridges the two.

use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use serde_json::Value;

use crate::error::CoreError;

/// The common response envelope (spec.md §6).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEnvelope<T> {
    pub success: bool,
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    pub operation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl<T> ApiEnvelope<T> {
    pub fn success(operation: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            code: 0,
            message: "ok".to_string(),
            data: Some(data),
            operation: operation.into(),
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

impl ApiEnvelope<()> {
    pub fn error(operation: impl Into<String>, code: i32, message: impl Into<String>) -> Self {
        Self {
            success: false,
            code,
            message: message.into(),
            data: None,
            operation: operation.into(),
            metadata: None,
        }
    }
}

/// Error-code ranges (spec.md §6): Account 10xxx, Terminal 20xxx,
/// Master-Data 30xxx/405xx, Stock 60xxx/41xxx, plus a shared Gateway-level
/// range for cross-cutting concerns (auth, validation, conflict, internal).
pub mod error_codes {
    // Shared / gateway-level (0xxx - 9xxx)
    pub const INVALID_PARAMETER: i32 = 1001;
    pub const MISSING_AUTH: i32 = 2001;
    pub const AUTH_FAILED: i32 = 2002;
    pub const FORBIDDEN: i32 = 2003;
    pub const CONFLICT: i32 = 4091;
    pub const INTERNAL_ERROR: i32 = 5000;
    pub const SERVICE_UNAVAILABLE: i32 = 5001;

    // Account (10xxx)
    pub const ACCOUNT_NOT_FOUND: i32 = 10001;

    // Terminal (20xxx)
    pub const TERMINAL_NOT_FOUND: i32 = 20001;
    pub const TERMINAL_INVALID_STATE: i32 = 20002;
    pub const TERMINAL_ALREADY_SIGNED_IN: i32 = 20003;

    // Cart (25xxx — not reserved explicitly by spec.md; kept adjacent to Terminal)
    pub const CART_NOT_FOUND: i32 = 25001;
    pub const CART_INVALID_STATE: i32 = 25002;
    pub const CART_ITEM_NOT_FOUND: i32 = 25003;
    pub const CART_ITEM_PRICE_MISSING: i32 = 25004;
    pub const CART_PAYMENT_METHOD_NOT_ALLOWED: i32 = 25005;
    pub const CART_AMOUNT_LIMIT_EXCEEDED: i32 = 25006;
    pub const CART_OWNERSHIP_VIOLATION: i32 = 25007;

    // Master-Data (30xxx / 405xx)
    pub const MASTER_DATA_NOT_FOUND: i32 = 30001;

    // Stock (60xxx / 41xxx)
    pub const STOCK_NOT_FOUND: i32 = 60001;
    pub const STOCK_INVALID_UPDATE: i32 = 60002;
}

/// Error type implementing `IntoResponse`, converting a [`CoreError`] into
/// the envelope above with the right HTTP status and numeric code.
pub struct ApiError {
    pub status: StatusCode,
    pub code: i32,
    pub message: String,
    pub operation: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: i32, message: impl Into<String>, operation: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            operation: operation.into(),
        }
    }

    pub fn from_core(err: CoreError, operation: impl Into<String>, code: i32) -> Self {
        Self::new(err.http_status(), code, err.to_string(), operation)
    }
}

/// Runs `validator`-derived field checks on a deserialized request body
/// before it reaches the engine, surfacing the first failure as a 400.
pub fn validate_request<T: validator::Validate>(req: &T, operation: &str) -> Result<(), ApiError> {
    req.validate().map_err(|e| ApiError::new(StatusCode::BAD_REQUEST, error_codes::INVALID_PARAMETER, e.to_string(), operation))
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let body = ApiEnvelope::<()>::error(self.operation, self.code, self.message);
        (self.status, Json(body)).into_response()
    }
}

/// Handler return type shorthand.
pub type ApiResult<T> = Result<(StatusCode, Json<ApiEnvelope<T>>), ApiError>;

#[inline]
pub fn ok<T>(operation: impl Into<String>, data: T) -> ApiResult<T> {
    Ok((StatusCode::OK, Json(ApiEnvelope::success(operation, data))))
}

#[inline]
pub fn created<T>(operation: impl Into<String>, data: T) -> ApiResult<T> {
    Ok((StatusCode::CREATED, Json(ApiEnvelope::success(operation, data))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_envelope_omits_metadata_when_absent() {
        let env = ApiEnvelope::success("terminal.open", 42);
        let json = serde_json::to_value(&env).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["code"], 0);
        assert!(json.get("metadata").is_none());
    }

    #[test]
    fn error_envelope_has_null_data() {
        let env = ApiEnvelope::<()>::error("terminal.open", error_codes::TERMINAL_INVALID_STATE, "bad state");
        let json = serde_json::to_value(&env).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["code"], error_codes::TERMINAL_INVALID_STATE);
        assert!(json.get("data").is_none());
    }
}
