//! Wire shape of events flowing through the bus (spec.md §4.5).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::tenant::TenantId;

/// Topic names exactly as spec.md §6 fixes them.
pub mod topics {
    pub const TRANLOG: &str = "tranlog";
    pub const CASHLOG: &str = "cashlog";
    pub const OPENCLOSELOG: &str = "opencloselog";
}

/// `{eventId, tenantId, occurredAt, payload}` — publishers guarantee
/// `event_id` is stable across retries so redelivery is detectable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub event_id: Uuid,
    pub tenant_id: TenantId,
    pub topic: String,
    pub occurred_at: DateTime<Utc>,
    pub payload: Value,
}

impl Event {
    pub fn new(tenant_id: TenantId, topic: impl Into<String>, payload: Value) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            tenant_id,
            topic: topic.into(),
            occurred_at: Utc::now(),
            payload,
        }
    }

    /// Reconstruct an event around a caller-supplied id — used when the
    /// outbox already assigned one at insert time, so the dispatched event
    /// and the stored row share the same identity.
    pub fn with_id(event_id: Uuid, tenant_id: TenantId, topic: impl Into<String>, occurred_at: DateTime<Utc>, payload: Value) -> Self {
        Self {
            event_id,
            tenant_id,
            topic: topic.into(),
            occurred_at,
            payload,
        }
    }
}
