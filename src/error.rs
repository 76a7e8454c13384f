//! Crate-wide error taxonomy (spec.md §7).
//!
//! `CoreError` is the single error type every engine (C4/C5/C6/C8) returns.
//! It carries a stable string code and maps to one of the HTTP status
//! classes spec.md fixes. The axum boundary converts it into the response
//! envelope defined in [`crate::gateway::envelope`].

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("not authorized: {0}")]
    Authorization(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invalid state transition: {0}")]
    InvalidState(String),

    #[error("dependency unavailable: {0}")]
    Dependency(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Stable machine-readable identifier for the error kind, independent of
    /// the human-readable message (spec.md §7's "stable error code").
    pub fn kind(&self) -> &'static str {
        match self {
            CoreError::Authentication(_) => "authentication",
            CoreError::Authorization(_) => "authorization",
            CoreError::Validation(_) => "validation",
            CoreError::NotFound(_) => "not_found",
            CoreError::Conflict(_) => "conflict",
            CoreError::InvalidState(_) => "invalid_state",
            CoreError::Dependency(_) => "dependency",
            CoreError::Internal(_) => "internal",
        }
    }

    pub fn http_status(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            CoreError::Authentication(_) => StatusCode::UNAUTHORIZED,
            CoreError::Authorization(_) => StatusCode::FORBIDDEN,
            CoreError::Validation(_) => StatusCode::BAD_REQUEST,
            CoreError::NotFound(_) => StatusCode::NOT_FOUND,
            CoreError::Conflict(_) => StatusCode::CONFLICT,
            CoreError::InvalidState(_) => StatusCode::CONFLICT,
            CoreError::Dependency(_) => StatusCode::SERVICE_UNAVAILABLE,
            CoreError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// sqlx errors surface as `Dependency` unless they are a row-not-found,
/// which is a caller-visible `NotFound`.
impl From<sqlx::Error> for CoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => CoreError::NotFound("row not found".to_string()),
            other => CoreError::Dependency(other.to_string()),
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
