//! Cart Engine (C5): the item-entry/payment/completion state machine of
//! spec.md §4.2.

pub mod cache;
pub mod engine;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod routes;
pub mod state;

pub use engine::CartEngine;
pub use models::Cart;
