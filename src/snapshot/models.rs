//! Snapshot schedule entity (spec.md §3 `SnapshotSchedule`, §4.4).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::tenant::{Etag, TenantId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum Interval {
    Daily,
    Weekly,
    Monthly,
}

/// One schedule per tenant (spec.md §3: "at most one per tenant").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotSchedule {
    pub tenant_id: TenantId,
    pub interval: Interval,
    pub hour: i32,
    pub minute: i32,
    /// `weekly` only. 0 = Monday, per spec.md §4.4.
    pub day_of_week: Option<i32>,
    /// `monthly` only. Clamped to the last day of the month when the month
    /// is shorter (spec.md §4.4: day 31 in February fires on day 28/29).
    pub day_of_month: Option<i32>,
    pub retention_days: i32,
    /// `["all"]` or an explicit list of store codes.
    pub target_stores: Vec<String>,
    pub enabled: bool,
    pub last_executed_at: Option<DateTime<Utc>>,
    pub etag: Etag,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SnapshotSchedule {
    pub fn targets_all_stores(&self) -> bool {
        self.target_stores.iter().any(|s| s == "all")
    }
}
