//! HTTP handlers for the Stock Engine (spec.md §6 endpoint surface).

use axum::extract::{Path, Query, State};
use axum::Json;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::gateway::envelope::{ApiError, ApiResult, created, error_codes, ok};
use crate::gateway::state::AppState;
use crate::identity::CallerContext;

use super::models::{Stock, StockSnapshot, StockUpdate};
use super::state::UpdateType;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockResponse {
    pub store_code: String,
    pub item_code: String,
    pub current_quantity: Decimal,
    pub minimum_quantity: Decimal,
    pub reorder_point: Decimal,
    pub reorder_quantity: Decimal,
    pub last_transaction_id: Option<String>,
    pub etag: String,
}

impl From<Stock> for StockResponse {
    fn from(s: Stock) -> Self {
        Self {
            store_code: s.store_code,
            item_code: s.item_code,
            current_quantity: s.current_quantity,
            minimum_quantity: s.minimum_quantity,
            reorder_point: s.reorder_point,
            reorder_quantity: s.reorder_quantity,
            last_transaction_id: s.last_transaction_id,
            etag: s.etag.as_str().to_string(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockUpdateResponse {
    pub id: i64,
    pub item_code: String,
    pub update_type: UpdateType,
    pub quantity_change: Decimal,
    pub before_qty: Decimal,
    pub after_qty: Decimal,
    pub reference_id: Option<String>,
    pub operator_id: Option<String>,
    pub note: Option<String>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl From<StockUpdate> for StockUpdateResponse {
    fn from(u: StockUpdate) -> Self {
        Self {
            id: u.id,
            item_code: u.item_code,
            update_type: u.update_type,
            quantity_change: u.quantity_change,
            before_qty: u.before_qty,
            after_qty: u.after_qty,
            reference_id: u.reference_id,
            operator_id: u.operator_id,
            note: u.note,
            timestamp: u.timestamp,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockSnapshotResponse {
    pub snapshot_id: String,
    pub store_code: String,
    pub total_items: i64,
    pub total_quantity: Decimal,
    pub created_by: String,
    pub generate_date_time: chrono::DateTime<chrono::Utc>,
}

impl From<StockSnapshot> for StockSnapshotResponse {
    fn from(s: StockSnapshot) -> Self {
        Self {
            snapshot_id: s.snapshot_id.to_string(),
            store_code: s.store_code,
            total_items: s.total_items,
            total_quantity: s.total_quantity,
            created_by: s.created_by,
            generate_date_time: s.generate_date_time,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStockRequest {
    pub quantity_change: Decimal,
    pub update_type: UpdateType,
    pub reference_id: Option<String>,
    pub operator_id: Option<String>,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MinimumRequest {
    pub minimum_quantity: Decimal,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReorderRequest {
    pub reorder_point: Decimal,
    pub reorder_quantity: Decimal,
}

fn store_code_param(params: &HashMap<String, String>) -> Result<String, ApiError> {
    params.get("storeCode").cloned().ok_or_else(|| {
        ApiError::new(axum::http::StatusCode::BAD_REQUEST, error_codes::INVALID_PARAMETER, "storeCode query parameter is required", "stock.store_code")
    })
}

#[utoipa::path(get, path = "/api/v1/stock/{itemCode}", params(("itemCode" = String, Path), ("storeCode" = String, Query)), responses((status = 200, description = "Stock level for the item", body = StockResponse)), tag = "stock")]
pub async fn get_stock(
    State(state): State<Arc<AppState>>,
    caller: CallerContext,
    Path(item_code): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<StockResponse> {
    let store_code = store_code_param(&params)?;
    let stock = state
        .stock_engine
        .get(&caller.tenant_id, &store_code, &item_code)
        .await
        .map_err(|e| ApiError::from_core(e, "stock.get", error_codes::STOCK_NOT_FOUND))?;
    ok("stock.get", StockResponse::from(stock))
}

#[utoipa::path(get, path = "/api/v1/stock", params(("storeCode" = String, Query)), responses((status = 200, description = "All stock rows for the store", body = [StockResponse])), tag = "stock")]
pub async fn list_stock(
    State(state): State<Arc<AppState>>,
    caller: CallerContext,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Vec<StockResponse>> {
    let store_code = store_code_param(&params)?;
    let stocks = state
        .stock_engine
        .list(&caller.tenant_id, &store_code)
        .await
        .map_err(|e| ApiError::from_core(e, "stock.list", error_codes::INTERNAL_ERROR))?;
    ok("stock.list", stocks.into_iter().map(StockResponse::from).collect::<Vec<_>>())
}

#[utoipa::path(get, path = "/api/v1/stock/low", params(("storeCode" = String, Query)), responses((status = 200, description = "Items at or below their minimum", body = [StockResponse])), tag = "stock")]
pub async fn list_low(
    State(state): State<Arc<AppState>>,
    caller: CallerContext,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Vec<StockResponse>> {
    let store_code = store_code_param(&params)?;
    let stocks = state
        .stock_engine
        .list_low(&caller.tenant_id, &store_code)
        .await
        .map_err(|e| ApiError::from_core(e, "stock.low", error_codes::INTERNAL_ERROR))?;
    ok("stock.low", stocks.into_iter().map(StockResponse::from).collect::<Vec<_>>())
}

#[utoipa::path(get, path = "/api/v1/stock/reorder-alerts", params(("storeCode" = String, Query)), responses((status = 200, description = "Items at or below their reorder point", body = [StockResponse])), tag = "stock")]
pub async fn list_reorder_alerts(
    State(state): State<Arc<AppState>>,
    caller: CallerContext,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Vec<StockResponse>> {
    let store_code = store_code_param(&params)?;
    let stocks = state
        .stock_engine
        .list_reorder_alerts(&caller.tenant_id, &store_code)
        .await
        .map_err(|e| ApiError::from_core(e, "stock.reorder_alerts", error_codes::INTERNAL_ERROR))?;
    ok("stock.reorder_alerts", stocks.into_iter().map(StockResponse::from).collect::<Vec<_>>())
}

#[utoipa::path(post, path = "/api/v1/stock/{itemCode}/update", params(("itemCode" = String, Path), ("storeCode" = String, Query)), request_body = UpdateStockRequest, responses((status = 200, description = "Stock updated", body = StockResponse)), tag = "stock")]
pub async fn update_stock(
    State(state): State<Arc<AppState>>,
    caller: CallerContext,
    Path(item_code): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    Json(req): Json<UpdateStockRequest>,
) -> ApiResult<StockResponse> {
    let store_code = store_code_param(&params)?;
    let stock = state
        .stock_engine
        .update(
            &caller.tenant_id,
            &store_code,
            &item_code,
            req.update_type,
            req.quantity_change,
            req.reference_id.as_deref(),
            req.operator_id.as_deref().or(caller.staff_id.as_deref()),
            req.note.as_deref(),
        )
        .await
        .map_err(|e| ApiError::from_core(e, "stock.update", error_codes::STOCK_INVALID_UPDATE))?;
    ok("stock.update", StockResponse::from(stock))
}

#[utoipa::path(get, path = "/api/v1/stock/{itemCode}/history", params(("itemCode" = String, Path), ("storeCode" = String, Query), ("limit" = Option<i64>, Query)), responses((status = 200, description = "Audit trail for the item", body = [StockUpdateResponse])), tag = "stock")]
pub async fn history(
    State(state): State<Arc<AppState>>,
    caller: CallerContext,
    Path(item_code): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Vec<StockUpdateResponse>> {
    let store_code = store_code_param(&params)?;
    let limit = params.get("limit").and_then(|v| v.parse::<i64>().ok()).unwrap_or(100);
    let updates = state
        .stock_engine
        .history(&caller.tenant_id, &store_code, &item_code, limit)
        .await
        .map_err(|e| ApiError::from_core(e, "stock.history", error_codes::STOCK_NOT_FOUND))?;
    ok("stock.history", updates.into_iter().map(StockUpdateResponse::from).collect::<Vec<_>>())
}

#[utoipa::path(put, path = "/api/v1/stock/{itemCode}/minimum", params(("itemCode" = String, Path), ("storeCode" = String, Query)), request_body = MinimumRequest, responses((status = 200, description = "Minimum threshold updated")), tag = "stock")]
pub async fn update_minimum(
    State(state): State<Arc<AppState>>,
    caller: CallerContext,
    Path(item_code): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    Json(req): Json<MinimumRequest>,
) -> ApiResult<()> {
    let store_code = store_code_param(&params)?;
    state
        .stock_engine
        .update_minimum(&caller.tenant_id, &store_code, &item_code, req.minimum_quantity)
        .await
        .map_err(|e| ApiError::from_core(e, "stock.minimum", error_codes::STOCK_INVALID_UPDATE))?;
    ok("stock.minimum", ())
}

#[utoipa::path(put, path = "/api/v1/stock/{itemCode}/reorder", params(("itemCode" = String, Path), ("storeCode" = String, Query)), request_body = ReorderRequest, responses((status = 200, description = "Reorder point updated")), tag = "stock")]
pub async fn update_reorder(
    State(state): State<Arc<AppState>>,
    caller: CallerContext,
    Path(item_code): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    Json(req): Json<ReorderRequest>,
) -> ApiResult<()> {
    let store_code = store_code_param(&params)?;
    state
        .stock_engine
        .update_reorder(&caller.tenant_id, &store_code, &item_code, req.reorder_point, req.reorder_quantity)
        .await
        .map_err(|e| ApiError::from_core(e, "stock.reorder", error_codes::STOCK_INVALID_UPDATE))?;
    ok("stock.reorder", ())
}

#[utoipa::path(get, path = "/api/v1/stock/snapshot/{snapshotId}", params(("snapshotId" = String, Path)), responses((status = 200, description = "Snapshot found", body = StockSnapshotResponse)), tag = "stock")]
pub async fn get_snapshot(
    State(state): State<Arc<AppState>>,
    caller: CallerContext,
    Path(snapshot_id): Path<String>,
) -> ApiResult<StockSnapshotResponse> {
    let id = uuid::Uuid::parse_str(&snapshot_id)
        .map_err(|e| ApiError::new(axum::http::StatusCode::BAD_REQUEST, error_codes::INVALID_PARAMETER, e.to_string(), "stock.snapshot.get"))?;
    let pool = state
        .tenant_store
        .pool(&caller.tenant_id)
        .await
        .map_err(|e| ApiError::from_core(e, "stock.snapshot.get", error_codes::SERVICE_UNAVAILABLE))?;
    let snapshot = super::repository::StockRepository::find_snapshot(&pool, id)
        .await
        .map_err(|e| ApiError::from_core(e, "stock.snapshot.get", error_codes::STOCK_NOT_FOUND))?
        .ok_or_else(|| ApiError::new(axum::http::StatusCode::NOT_FOUND, error_codes::STOCK_NOT_FOUND, "snapshot not found", "stock.snapshot.get"))?;
    ok("stock.snapshot.get", StockSnapshotResponse::from(snapshot))
}

#[utoipa::path(get, path = "/api/v1/stock/snapshots", responses((status = 200, description = "All snapshots for the tenant", body = [StockSnapshotResponse])), tag = "stock")]
pub async fn list_snapshots(State(state): State<Arc<AppState>>, caller: CallerContext) -> ApiResult<Vec<StockSnapshotResponse>> {
    let pool = state
        .tenant_store
        .pool(&caller.tenant_id)
        .await
        .map_err(|e| ApiError::from_core(e, "stock.snapshot.list", error_codes::SERVICE_UNAVAILABLE))?;
    let snapshots = super::repository::StockRepository::list_snapshots(&pool, &caller.tenant_id)
        .await
        .map_err(|e| ApiError::from_core(e, "stock.snapshot.list", error_codes::INTERNAL_ERROR))?;
    ok("stock.snapshot.list", snapshots.into_iter().map(StockSnapshotResponse::from).collect::<Vec<_>>())
}

/// Ad-hoc, on-demand snapshot (distinct from the scheduled C8 job): builds
/// one snapshot for the caller's tenant/store right now, reusing the same
/// page-wise builder the scheduler uses.
#[utoipa::path(post, path = "/api/v1/stock/snapshot", params(("storeCode" = String, Query)), responses((status = 201, description = "On-demand snapshot created", body = StockSnapshotResponse)), tag = "stock")]
pub async fn create_snapshot(
    State(state): State<Arc<AppState>>,
    caller: CallerContext,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<StockSnapshotResponse> {
    let store_code = store_code_param(&params)?;
    let pool = state
        .tenant_store
        .pool(&caller.tenant_id)
        .await
        .map_err(|e| ApiError::from_core(e, "stock.snapshot.create", error_codes::SERVICE_UNAVAILABLE))?;
    let created_by = caller.staff_id.as_deref().unwrap_or("system");
    let snapshot = crate::snapshot::build_snapshot(&pool, &caller.tenant_id, &store_code, created_by)
        .await
        .map_err(|e| ApiError::from_core(e, "stock.snapshot.create", error_codes::INTERNAL_ERROR))?;
    created("stock.snapshot.create", StockSnapshotResponse::from(snapshot))
}
