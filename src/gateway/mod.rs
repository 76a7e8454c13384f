//! HTTP/WebSocket gateway: shared envelope, error codes and application
//! state. Route assembly lives in `main.rs`, mounting each domain module's
//! own `routes::router`.

pub mod envelope;
pub mod ingress;
pub mod openapi;
pub mod state;
