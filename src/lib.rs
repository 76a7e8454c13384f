//! Multi-tenant POS backend core.
//!
//! # Modules
//!
//! - [`tenant`] - Per-tenant store, optimistic concurrency, control-plane registry (C1)
//! - [`identity`] - Auth Broker: JWT issuance, API-key verification, caller context (C2)
//! - [`bus`] - Event Bus and idempotent sink adapter (C3, C7)
//! - [`terminal`] - Terminal lifecycle and cash-drawer state machine (C4)
//! - [`cart`] - Cart/transaction engine (C5)
//! - [`stock`] - Stock engine: atomic updates, thresholds, alerts (C6)
//! - [`snapshot`] - Snapshot scheduler (C8)
//! - [`ws`] - WebSocket alert hub (C9)
//! - [`master_data`] - Read-through item/tax/payment-method catalog
//! - [`gateway`] - Shared HTTP envelope, error codes, application state

// Core types
pub mod core_ids;

// Ambient stack
pub mod config;
pub mod error;
pub mod logging;

// POS domain
pub mod bus;
pub mod cart;
pub mod identity;
pub mod master_data;
pub mod snapshot;
pub mod stock;
pub mod tenant;
pub mod terminal;
pub mod ws;

// Gateway (HTTP/WebSocket surface)
pub mod gateway;
