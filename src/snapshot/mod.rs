//! Snapshot Scheduler (C8): cron-like per-tenant schedule evaluator driving
//! Stock Engine snapshots with TTL retention (spec.md §4.4).

pub mod handlers;
pub mod models;
pub mod repository;
pub mod routes;
pub mod scheduler;

pub use models::{Interval, SnapshotSchedule};
pub use scheduler::{build_snapshot, SnapshotScheduler};
