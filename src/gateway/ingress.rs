//! Event ingress (spec.md §6): `POST /api/v1/{tranlog,cashlog,opencloselog}`.
//!
//! These are the Dapr-style pub/sub delivery endpoints the Event Bus's
//! subscribers expose (Stock via the in-process [`crate::stock::consumer::StockTranlogConsumer`];
//! Report/Journal are out of scope, spec.md §1). A 200 response acks the
//! message to whatever sidecar or broker is pushing it; anything else
//! means "retry me".

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::bus::{DispatchOutcome, Event};
use crate::gateway::envelope::{error_codes, ok, ApiError, ApiResult};
use crate::gateway::state::AppState;
use crate::tenant::TenantId;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InboundEvent {
    pub event_id: uuid::Uuid,
    pub tenant_id: String,
    pub occurred_at: chrono::DateTime<chrono::Utc>,
    pub payload: serde_json::Value,
}

async fn ingest(state: Arc<AppState>, topic: &'static str, body: InboundEvent) -> ApiResult<&'static str> {
    let tenant_id = TenantId::parse(&body.tenant_id)
        .map_err(|e| ApiError::new(axum::http::StatusCode::BAD_REQUEST, error_codes::INVALID_PARAMETER, e, "ingress"))?;
    let pool = state
        .tenant_store
        .pool(&tenant_id)
        .await
        .map_err(|e| ApiError::from_core(e, "ingress", error_codes::SERVICE_UNAVAILABLE))?;
    let event = Event::with_id(body.event_id, tenant_id, topic, body.occurred_at, body.payload);

    match state
        .event_bus
        .handle_inbound(&pool, event)
        .await
        .map_err(|e| ApiError::from_core(e, "ingress", error_codes::INTERNAL_ERROR))?
    {
        DispatchOutcome::Acked => ok("ingress", "accepted"),
        DispatchOutcome::Nacked | DispatchOutcome::DeadLettered => Err(ApiError::new(
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            error_codes::SERVICE_UNAVAILABLE,
            "consumer could not process event, retry",
            "ingress",
        )),
    }
}

#[utoipa::path(post, path = "/api/v1/tranlog", request_body = InboundEvent, responses((status = 200, description = "Tranlog event accepted", body = String)), tag = "ingress")]
pub async fn tranlog(State(state): State<Arc<AppState>>, Json(body): Json<InboundEvent>) -> ApiResult<&'static str> {
    ingest(state, crate::bus::topics::TRANLOG, body).await
}

#[utoipa::path(post, path = "/api/v1/cashlog", request_body = InboundEvent, responses((status = 200, description = "Cashlog event accepted", body = String)), tag = "ingress")]
pub async fn cashlog(State(state): State<Arc<AppState>>, Json(body): Json<InboundEvent>) -> ApiResult<&'static str> {
    ingest(state, crate::bus::topics::CASHLOG, body).await
}

#[utoipa::path(post, path = "/api/v1/opencloselog", request_body = InboundEvent, responses((status = 200, description = "Open/close log event accepted", body = String)), tag = "ingress")]
pub async fn opencloselog(State(state): State<Arc<AppState>>, Json(body): Json<InboundEvent>) -> ApiResult<&'static str> {
    ingest(state, crate::bus::topics::OPENCLOSELOG, body).await
}

pub fn router() -> axum::Router<Arc<AppState>> {
    axum::Router::new()
        .route("/tranlog", axum::routing::post(tranlog))
        .route("/cashlog", axum::routing::post(cashlog))
        .route("/opencloselog", axum::routing::post(opencloselog))
}
