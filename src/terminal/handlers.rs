//! HTTP handlers for the Terminal Engine (spec.md §6 endpoint surface).

use axum::extract::{Path, State};
use axum::Json;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use validator::Validate;

use crate::gateway::envelope::{ApiResult, created, error_codes, ok, validate_request};
use crate::gateway::state::AppState;
use crate::identity::CallerContext;
use crate::tenant::Etag;

use super::models::Terminal;
use super::state::{FunctionMode, TerminalStatus};

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TerminalResponse {
    pub terminal_id: String,
    pub store_code: String,
    pub terminal_no: i32,
    pub description: String,
    pub status: TerminalStatus,
    pub function_mode: FunctionMode,
    pub open_counter: i32,
    pub business_counter: i32,
    pub business_date: Option<NaiveDate>,
    pub initial_amount: Option<Decimal>,
    pub physical_amount: Option<Decimal>,
    pub staff_id: Option<String>,
    pub etag: String,
}

impl From<Terminal> for TerminalResponse {
    fn from(t: Terminal) -> Self {
        Self {
            terminal_id: t.terminal_id.to_string(),
            store_code: t.store_code,
            terminal_no: t.terminal_no,
            description: t.description,
            status: t.status,
            function_mode: t.function_mode,
            open_counter: t.open_counter,
            business_counter: t.business_counter,
            business_date: t.business_date,
            initial_amount: t.initial_amount,
            physical_amount: t.physical_amount,
            staff_id: t.staff_id,
            etag: t.etag.as_str().to_string(),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTerminalRequest {
    #[validate(length(min = 1, message = "storeCode must not be empty"))]
    pub store_code: String,
    #[validate(range(min = 1, message = "terminalNo must be positive"))]
    pub terminal_no: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CasRequest {
    pub etag: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignInRequest {
    pub staff_id: String,
    pub etag: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OpenRequest {
    pub business_date: NaiveDate,
    pub initial_amount: Decimal,
    pub etag: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CloseRequest {
    pub physical_amount: Option<Decimal>,
    pub etag: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CashRequest {
    pub amount: Decimal,
    pub reason: String,
    pub note: Option<String>,
    pub etag: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FunctionModeRequest {
    pub function_mode: String,
    pub etag: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DescriptionRequest {
    pub description: String,
    pub etag: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EtagResponse {
    pub etag: String,
}

fn parse_terminal_id(raw: &str) -> Result<crate::core_ids::TerminalId, crate::gateway::envelope::ApiError> {
    crate::core_ids::TerminalId::parse(raw).map_err(|e| {
        crate::gateway::envelope::ApiError::new(
            axum::http::StatusCode::BAD_REQUEST,
            error_codes::INVALID_PARAMETER,
            e,
            "terminal.parse_id",
        )
    })
}

#[utoipa::path(post, path = "/api/v1/terminals", request_body = CreateTerminalRequest, responses((status = 201, description = "Terminal created")), tag = "terminal")]
pub async fn create_terminal(
    State(state): State<Arc<AppState>>,
    caller: CallerContext,
    Json(req): Json<CreateTerminalRequest>,
) -> ApiResult<serde_json::Value> {
    validate_request(&req, "terminal.create")?;
    let api_key = crate::identity::api_key::generate_api_key();
    let hash = crate::identity::api_key::hash_api_key(&api_key)
        .map_err(|e| crate::gateway::envelope::ApiError::from_core(e, "terminal.create", error_codes::INTERNAL_ERROR))?;
    let terminal = state
        .terminal_engine
        .create(&caller.tenant_id, &req.store_code, req.terminal_no, hash)
        .await
        .map_err(|e| crate::gateway::envelope::ApiError::from_core(e, "terminal.create", error_codes::TERMINAL_INVALID_STATE))?;
    let response = TerminalResponse::from(terminal);
    // The plaintext api key is shown exactly once, at provisioning time.
    created("terminal.create", serde_json::json!({ "terminal": response, "apiKey": api_key }))
}

#[utoipa::path(get, path = "/api/v1/terminals/{terminalId}", params(("terminalId" = String, Path)), responses((status = 200, description = "Terminal found", body = TerminalResponse)), tag = "terminal")]
pub async fn get_terminal(
    State(state): State<Arc<AppState>>,
    caller: CallerContext,
    Path(terminal_id): Path<String>,
) -> ApiResult<TerminalResponse> {
    let terminal_id = parse_terminal_id(&terminal_id)?;
    caller.require_tenant(&terminal_id.tenant_id())?;
    let terminal = state
        .terminal_engine
        .get(&caller.tenant_id, &terminal_id)
        .await
        .map_err(|e| crate::gateway::envelope::ApiError::from_core(e, "terminal.get", error_codes::TERMINAL_NOT_FOUND))?;
    ok("terminal.get", TerminalResponse::from(terminal))
}

#[utoipa::path(get, path = "/api/v1/terminals", params(("storeCode" = Option<String>, Query)), responses((status = 200, description = "Terminals for the store", body = [TerminalResponse])), tag = "terminal")]
pub async fn list_terminals(
    State(state): State<Arc<AppState>>,
    caller: CallerContext,
    axum::extract::Query(params): axum::extract::Query<std::collections::HashMap<String, String>>,
) -> ApiResult<Vec<TerminalResponse>> {
    let store_code = params.get("storeCode").cloned().unwrap_or_default();
    let terminals = state
        .terminal_engine
        .list(&caller.tenant_id, &store_code)
        .await
        .map_err(|e| crate::gateway::envelope::ApiError::from_core(e, "terminal.list", error_codes::INTERNAL_ERROR))?;
    ok(
        "terminal.list",
        terminals.into_iter().map(TerminalResponse::from).collect::<Vec<_>>(),
    )
}

#[utoipa::path(delete, path = "/api/v1/terminals/{terminalId}", params(("terminalId" = String, Path)), responses((status = 200, description = "Terminal deleted")), tag = "terminal")]
pub async fn delete_terminal(
    State(state): State<Arc<AppState>>,
    caller: CallerContext,
    Path(terminal_id): Path<String>,
) -> ApiResult<()> {
    let terminal_id = parse_terminal_id(&terminal_id)?;
    caller.require_tenant(&terminal_id.tenant_id())?;
    state
        .terminal_engine
        .delete(&caller.tenant_id, &terminal_id)
        .await
        .map_err(|e| crate::gateway::envelope::ApiError::from_core(e, "terminal.delete", error_codes::TERMINAL_INVALID_STATE))?;
    ok("terminal.delete", ())
}

#[utoipa::path(post, path = "/api/v1/terminals/{terminalId}/sign-in", params(("terminalId" = String, Path)), request_body = SignInRequest, responses((status = 200, description = "Staff signed in", body = EtagResponse)), tag = "terminal")]
pub async fn sign_in(
    State(state): State<Arc<AppState>>,
    caller: CallerContext,
    Path(terminal_id): Path<String>,
    Json(req): Json<SignInRequest>,
) -> ApiResult<EtagResponse> {
    let terminal_id = parse_terminal_id(&terminal_id)?;
    caller.require_tenant(&terminal_id.tenant_id())?;
    let etag: Etag = req.etag.into();
    let new_etag = state
        .terminal_engine
        .sign_in(&caller.tenant_id, &terminal_id, &req.staff_id, &etag)
        .await
        .map_err(|e| crate::gateway::envelope::ApiError::from_core(e, "terminal.sign_in", error_codes::TERMINAL_ALREADY_SIGNED_IN))?;
    ok("terminal.sign_in", EtagResponse { etag: new_etag.as_str().to_string() })
}

#[utoipa::path(post, path = "/api/v1/terminals/{terminalId}/sign-out", params(("terminalId" = String, Path)), request_body = CasRequest, responses((status = 200, description = "Staff signed out", body = EtagResponse)), tag = "terminal")]
pub async fn sign_out(
    State(state): State<Arc<AppState>>,
    caller: CallerContext,
    Path(terminal_id): Path<String>,
    Json(req): Json<CasRequest>,
) -> ApiResult<EtagResponse> {
    let terminal_id = parse_terminal_id(&terminal_id)?;
    caller.require_tenant(&terminal_id.tenant_id())?;
    let etag: Etag = req.etag.into();
    let new_etag = state
        .terminal_engine
        .sign_out(&caller.tenant_id, &terminal_id, &etag)
        .await
        .map_err(|e| crate::gateway::envelope::ApiError::from_core(e, "terminal.sign_out", error_codes::TERMINAL_INVALID_STATE))?;
    ok("terminal.sign_out", EtagResponse { etag: new_etag.as_str().to_string() })
}

#[utoipa::path(post, path = "/api/v1/terminals/{terminalId}/open", params(("terminalId" = String, Path)), request_body = OpenRequest, responses((status = 200, description = "Terminal opened", body = EtagResponse)), tag = "terminal")]
pub async fn open_terminal(
    State(state): State<Arc<AppState>>,
    caller: CallerContext,
    Path(terminal_id): Path<String>,
    Json(req): Json<OpenRequest>,
) -> ApiResult<EtagResponse> {
    let terminal_id = parse_terminal_id(&terminal_id)?;
    caller.require_tenant(&terminal_id.tenant_id())?;
    let etag: Etag = req.etag.into();
    let new_etag = state
        .terminal_engine
        .open(
            &caller.tenant_id,
            &terminal_id,
            req.business_date,
            req.initial_amount,
            caller.staff_id.as_deref(),
            &etag,
        )
        .await
        .map_err(|e| crate::gateway::envelope::ApiError::from_core(e, "terminal.open", error_codes::TERMINAL_INVALID_STATE))?;
    ok("terminal.open", EtagResponse { etag: new_etag.as_str().to_string() })
}

#[utoipa::path(post, path = "/api/v1/terminals/{terminalId}/close", params(("terminalId" = String, Path)), request_body = CloseRequest, responses((status = 200, description = "Terminal closed", body = EtagResponse)), tag = "terminal")]
pub async fn close_terminal(
    State(state): State<Arc<AppState>>,
    caller: CallerContext,
    Path(terminal_id): Path<String>,
    Json(req): Json<CloseRequest>,
) -> ApiResult<EtagResponse> {
    let terminal_id = parse_terminal_id(&terminal_id)?;
    caller.require_tenant(&terminal_id.tenant_id())?;
    let etag: Etag = req.etag.into();
    let new_etag = state
        .terminal_engine
        .close(&caller.tenant_id, &terminal_id, req.physical_amount, &etag)
        .await
        .map_err(|e| crate::gateway::envelope::ApiError::from_core(e, "terminal.close", error_codes::TERMINAL_INVALID_STATE))?;
    ok("terminal.close", EtagResponse { etag: new_etag.as_str().to_string() })
}

#[utoipa::path(post, path = "/api/v1/terminals/{terminalId}/cash-in", params(("terminalId" = String, Path)), request_body = CashRequest, responses((status = 200, description = "Cash added to the drawer", body = EtagResponse)), tag = "terminal")]
pub async fn cash_in(
    State(state): State<Arc<AppState>>,
    caller: CallerContext,
    Path(terminal_id): Path<String>,
    Json(req): Json<CashRequest>,
) -> ApiResult<EtagResponse> {
    let terminal_id = parse_terminal_id(&terminal_id)?;
    caller.require_tenant(&terminal_id.tenant_id())?;
    let etag: Etag = req.etag.into();
    let new_etag = state
        .terminal_engine
        .cash_in(
            &caller.tenant_id,
            &terminal_id,
            req.amount,
            &req.reason,
            req.note.as_deref(),
            caller.staff_id.as_deref(),
            &etag,
        )
        .await
        .map_err(|e| crate::gateway::envelope::ApiError::from_core(e, "terminal.cash_in", error_codes::TERMINAL_INVALID_STATE))?;
    ok("terminal.cash_in", EtagResponse { etag: new_etag.as_str().to_string() })
}

#[utoipa::path(post, path = "/api/v1/terminals/{terminalId}/cash-out", params(("terminalId" = String, Path)), request_body = CashRequest, responses((status = 200, description = "Cash removed from the drawer", body = EtagResponse)), tag = "terminal")]
pub async fn cash_out(
    State(state): State<Arc<AppState>>,
    caller: CallerContext,
    Path(terminal_id): Path<String>,
    Json(req): Json<CashRequest>,
) -> ApiResult<EtagResponse> {
    let terminal_id = parse_terminal_id(&terminal_id)?;
    caller.require_tenant(&terminal_id.tenant_id())?;
    let etag: Etag = req.etag.into();
    let new_etag = state
        .terminal_engine
        .cash_out(
            &caller.tenant_id,
            &terminal_id,
            req.amount,
            &req.reason,
            req.note.as_deref(),
            caller.staff_id.as_deref(),
            &etag,
        )
        .await
        .map_err(|e| crate::gateway::envelope::ApiError::from_core(e, "terminal.cash_out", error_codes::TERMINAL_INVALID_STATE))?;
    ok("terminal.cash_out", EtagResponse { etag: new_etag.as_str().to_string() })
}

#[utoipa::path(put, path = "/api/v1/terminals/{terminalId}/function_mode", params(("terminalId" = String, Path)), request_body = FunctionModeRequest, responses((status = 200, description = "Function mode updated", body = EtagResponse)), tag = "terminal")]
pub async fn update_function_mode(
    State(state): State<Arc<AppState>>,
    caller: CallerContext,
    Path(terminal_id): Path<String>,
    Json(req): Json<FunctionModeRequest>,
) -> ApiResult<EtagResponse> {
    let terminal_id = parse_terminal_id(&terminal_id)?;
    caller.require_tenant(&terminal_id.tenant_id())?;
    let etag: Etag = req.etag.into();
    let new_etag = state
        .terminal_engine
        .update_function_mode(&caller.tenant_id, &terminal_id, &req.function_mode, &etag)
        .await
        .map_err(|e| crate::gateway::envelope::ApiError::from_core(e, "terminal.function_mode", error_codes::TERMINAL_INVALID_STATE))?;
    ok("terminal.function_mode", EtagResponse { etag: new_etag.as_str().to_string() })
}

#[utoipa::path(put, path = "/api/v1/terminals/{terminalId}/description", params(("terminalId" = String, Path)), request_body = DescriptionRequest, responses((status = 200, description = "Description updated", body = EtagResponse)), tag = "terminal")]
pub async fn update_description(
    State(state): State<Arc<AppState>>,
    caller: CallerContext,
    Path(terminal_id): Path<String>,
    Json(req): Json<DescriptionRequest>,
) -> ApiResult<EtagResponse> {
    let terminal_id = parse_terminal_id(&terminal_id)?;
    caller.require_tenant(&terminal_id.tenant_id())?;
    let etag: Etag = req.etag.into();
    let new_etag = state
        .terminal_engine
        .update_description(&caller.tenant_id, &terminal_id, &req.description, &etag)
        .await
        .map_err(|e| crate::gateway::envelope::ApiError::from_core(e, "terminal.description", error_codes::TERMINAL_INVALID_STATE))?;
    ok("terminal.description", EtagResponse { etag: new_etag.as_str().to_string() })
}
