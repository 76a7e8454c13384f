//! HTTP handlers for `/stock/snapshot-schedule` (spec.md §6).

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::gateway::envelope::{error_codes, ok, ApiResult};
use crate::gateway::state::AppState;
use crate::identity::CallerContext;

use super::models::{Interval, SnapshotSchedule};
use super::repository::SnapshotScheduleRepository;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleResponse {
    pub interval: Interval,
    pub hour: i32,
    pub minute: i32,
    pub day_of_week: Option<i32>,
    pub day_of_month: Option<i32>,
    pub retention_days: i32,
    pub target_stores: Vec<String>,
    pub enabled: bool,
    pub last_executed_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl From<SnapshotSchedule> for ScheduleResponse {
    fn from(s: SnapshotSchedule) -> Self {
        Self {
            interval: s.interval,
            hour: s.hour,
            minute: s.minute,
            day_of_week: s.day_of_week,
            day_of_month: s.day_of_month,
            retention_days: s.retention_days,
            target_stores: s.target_stores,
            enabled: s.enabled,
            last_executed_at: s.last_executed_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PutScheduleRequest {
    pub interval: Interval,
    pub hour: i32,
    pub minute: i32,
    pub day_of_week: Option<i32>,
    pub day_of_month: Option<i32>,
    pub retention_days: i32,
    pub target_stores: Vec<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

#[utoipa::path(get, path = "/api/v1/stock/snapshot-schedule", responses((status = 200, description = "Configured schedule, if any", body = Option<ScheduleResponse>)), tag = "snapshot")]
pub async fn get_schedule(State(state): State<Arc<AppState>>, caller: CallerContext) -> ApiResult<Option<ScheduleResponse>> {
    let schedule = SnapshotScheduleRepository::find(state.tenant_registry.pool(), &caller.tenant_id)
        .await
        .map_err(|e| crate::gateway::envelope::ApiError::from_core(e, "snapshot.schedule.get", error_codes::INTERNAL_ERROR))?;
    ok("snapshot.schedule.get", schedule.map(ScheduleResponse::from))
}

#[utoipa::path(put, path = "/api/v1/stock/snapshot-schedule", request_body = PutScheduleRequest, responses((status = 200, description = "Schedule saved", body = ScheduleResponse)), tag = "snapshot")]
pub async fn put_schedule(
    State(state): State<Arc<AppState>>,
    caller: CallerContext,
    Json(req): Json<PutScheduleRequest>,
) -> ApiResult<ScheduleResponse> {
    let schedule = SnapshotScheduleRepository::upsert(
        state.tenant_registry.pool(),
        &caller.tenant_id,
        req.interval,
        req.hour,
        req.minute,
        req.day_of_week,
        req.day_of_month,
        req.retention_days,
        &req.target_stores,
        req.enabled,
    )
    .await
    .map_err(|e| crate::gateway::envelope::ApiError::from_core(e, "snapshot.schedule.put", error_codes::INVALID_PARAMETER))?;
    ok("snapshot.schedule.put", ScheduleResponse::from(schedule))
}
