//! Auth Broker (C2).
//!
//! Issues and validates staff JWTs (HS256) and validates terminal API keys,
//! producing a [`CallerContext`] that downstream handlers use instead of
//! re-deriving tenant/store/terminal identity from the request path.
//!
//! Grounded on `user_auth/service.rs` (JWT issue/verify),
//! `api_auth/middleware.rs` (header extraction + constant-time verify flow)
//! and `user_auth/middleware.rs` (axum middleware shape).

pub mod api_key;
pub mod context;
pub mod handlers;
pub mod jwt;
pub mod middleware;
pub mod routes;
pub mod staff;

pub use context::CallerContext;
pub use jwt::{Claims, JwtIssuer};
