//! Tenant-scoped store (C1).
//!
//! Every persistent record carries a `tenant_id` and an opaque [`Etag`] used
//! for optimistic-concurrency compare-and-set writes. Spec.md §6 describes
//! "one logical database per tenant"; here that is realized as one
//! `sqlx::PgPool` per tenant, cached behind a bounded, least-recently-used
//! map (spec.md §9) rather than literally one OS process per tenant —
//! see DESIGN.md for the recorded redesign decision.

pub mod etag;
pub mod models;
pub mod pool_cache;
pub mod registry;
pub mod store;

pub use etag::Etag;
pub use models::{Store, StoreStatus, Tenant, TenantId};
pub use registry::TenantRegistry;
pub use store::TenantStore;
