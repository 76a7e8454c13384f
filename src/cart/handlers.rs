//! HTTP handlers for the Cart Engine (spec.md §6 endpoint surface).

use axum::extract::{Path, State};
use axum::Json;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use validator::Validate;

use crate::core_ids::TerminalId;
use crate::gateway::envelope::{ApiError, ApiResult, created, error_codes, ok, validate_request};
use crate::gateway::state::AppState;
use crate::identity::CallerContext;
use crate::tenant::Etag;

use super::models::{Cart, CartId};
use super::state::CartStatus;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    pub cart_id: String,
    pub terminal_id: String,
    pub status: CartStatus,
    pub line_items: Vec<super::models::LineItem>,
    pub payments: Vec<super::models::Payment>,
    pub sub_total: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
    pub balance: Decimal,
    pub order_discounts: Decimal,
    pub receipt_no: Option<i64>,
    pub etag: String,
}

impl From<Cart> for CartResponse {
    fn from(c: Cart) -> Self {
        let balance = c.balance();
        Self {
            cart_id: c.cart_id.to_string(),
            terminal_id: c.terminal_id.to_string(),
            status: c.status,
            line_items: c.line_items,
            payments: c.payments,
            sub_total: c.sub_total,
            tax_amount: c.tax_amount,
            total: c.total,
            balance,
            order_discounts: c.order_discounts,
            receipt_no: c.receipt_no,
            etag: c.etag.as_str().to_string(),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct OpenCartRequest {
    #[validate(length(min = 1, message = "terminalId must not be empty"))]
    pub terminal_id: String,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    #[validate(length(min = 1, message = "itemCode must not be empty"))]
    pub item_code: String,
    pub quantity: Decimal,
    #[serde(default)]
    pub discounts: Decimal,
    pub etag: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CancelItemRequest {
    pub position: i32,
    pub etag: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CasRequest {
    pub etag: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddPaymentRequest {
    pub method_code: String,
    pub amount: Decimal,
    pub etag: String,
}

fn parse_cart_id(raw: &str) -> Result<CartId, ApiError> {
    CartId::parse(raw).map_err(|e| ApiError::new(axum::http::StatusCode::BAD_REQUEST, error_codes::INVALID_PARAMETER, e, "cart.parse_id"))
}

fn parse_terminal_id(raw: &str) -> Result<TerminalId, ApiError> {
    TerminalId::parse(raw).map_err(|e| ApiError::new(axum::http::StatusCode::BAD_REQUEST, error_codes::INVALID_PARAMETER, e, "cart.parse_terminal_id"))
}

/// A caller must present the terminal it claims to act as; this guards
/// against a signed-in staff token being reused to drive another
/// terminal's cart.
fn require_caller_terminal(caller: &CallerContext) -> Result<&TerminalId, ApiError> {
    caller.terminal_id.as_ref().ok_or_else(|| {
        ApiError::new(
            axum::http::StatusCode::FORBIDDEN,
            error_codes::FORBIDDEN,
            "caller is not scoped to a terminal",
            "cart.require_terminal",
        )
    })
}

#[utoipa::path(post, path = "/api/v1/carts", request_body = OpenCartRequest, responses((status = 201, description = "Cart opened", body = CartResponse)), tag = "cart")]
pub async fn open_cart(
    State(state): State<Arc<AppState>>,
    caller: CallerContext,
    Json(req): Json<OpenCartRequest>,
) -> ApiResult<CartResponse> {
    validate_request(&req, "cart.open")?;
    let terminal_id = parse_terminal_id(&req.terminal_id)?;
    caller.require_tenant(&terminal_id.tenant_id())?;
    let cart = state
        .cart_engine
        .open(&caller.tenant_id, &terminal_id)
        .await
        .map_err(|e| ApiError::from_core(e, "cart.open", error_codes::CART_INVALID_STATE))?;
    created("cart.open", CartResponse::from(cart))
}

#[utoipa::path(get, path = "/api/v1/carts/{cartId}", params(("cartId" = String, Path)), responses((status = 200, description = "Cart found", body = CartResponse)), tag = "cart")]
pub async fn get_cart(
    State(state): State<Arc<AppState>>,
    caller: CallerContext,
    Path(cart_id): Path<String>,
) -> ApiResult<CartResponse> {
    let cart_id = parse_cart_id(&cart_id)?;
    let terminal_id = require_caller_terminal(&caller)?;
    let cart = state
        .cart_engine
        .get(&caller.tenant_id, terminal_id, &cart_id)
        .await
        .map_err(|e| ApiError::from_core(e, "cart.get", error_codes::CART_NOT_FOUND))?;
    ok("cart.get", CartResponse::from(cart))
}

#[utoipa::path(post, path = "/api/v1/carts/{cartId}/items", params(("cartId" = String, Path)), request_body = AddItemRequest, responses((status = 200, description = "Line item added", body = CartResponse)), tag = "cart")]
pub async fn add_item(
    State(state): State<Arc<AppState>>,
    caller: CallerContext,
    Path(cart_id): Path<String>,
    Json(req): Json<AddItemRequest>,
) -> ApiResult<CartResponse> {
    validate_request(&req, "cart.add_item")?;
    let cart_id = parse_cart_id(&cart_id)?;
    let terminal_id = require_caller_terminal(&caller)?.clone();
    let etag: Etag = req.etag.into();
    let cart = state
        .cart_engine
        .add_item(&caller.tenant_id, &terminal_id, &cart_id, &req.item_code, req.quantity, req.discounts, &etag)
        .await
        .map_err(|e| ApiError::from_core(e, "cart.add_item", error_codes::CART_INVALID_STATE))?;
    ok("cart.add_item", CartResponse::from(cart))
}

#[utoipa::path(post, path = "/api/v1/carts/{cartId}/items/cancel", params(("cartId" = String, Path)), request_body = CancelItemRequest, responses((status = 200, description = "Line item cancelled", body = CartResponse)), tag = "cart")]
pub async fn cancel_item(
    State(state): State<Arc<AppState>>,
    caller: CallerContext,
    Path(cart_id): Path<String>,
    Json(req): Json<CancelItemRequest>,
) -> ApiResult<CartResponse> {
    let cart_id = parse_cart_id(&cart_id)?;
    let terminal_id = require_caller_terminal(&caller)?.clone();
    let etag: Etag = req.etag.into();
    let cart = state
        .cart_engine
        .cancel_item(&caller.tenant_id, &terminal_id, &cart_id, req.position, &etag)
        .await
        .map_err(|e| ApiError::from_core(e, "cart.cancel_item", error_codes::CART_ITEM_NOT_FOUND))?;
    ok("cart.cancel_item", CartResponse::from(cart))
}

#[utoipa::path(post, path = "/api/v1/carts/{cartId}/subtotal", params(("cartId" = String, Path)), request_body = CasRequest, responses((status = 200, description = "Tax recomputed", body = CartResponse)), tag = "cart")]
pub async fn subtotal(
    State(state): State<Arc<AppState>>,
    caller: CallerContext,
    Path(cart_id): Path<String>,
    Json(req): Json<CasRequest>,
) -> ApiResult<CartResponse> {
    let cart_id = parse_cart_id(&cart_id)?;
    let terminal_id = require_caller_terminal(&caller)?.clone();
    let etag: Etag = req.etag.into();
    let cart = state
        .cart_engine
        .subtotal(&caller.tenant_id, &terminal_id, &cart_id, &etag)
        .await
        .map_err(|e| ApiError::from_core(e, "cart.subtotal", error_codes::CART_INVALID_STATE))?;
    ok("cart.subtotal", CartResponse::from(cart))
}

#[utoipa::path(post, path = "/api/v1/carts/{cartId}/back", params(("cartId" = String, Path)), request_body = CasRequest, responses((status = 200, description = "Returned to item entry", body = CartResponse)), tag = "cart")]
pub async fn back(
    State(state): State<Arc<AppState>>,
    caller: CallerContext,
    Path(cart_id): Path<String>,
    Json(req): Json<CasRequest>,
) -> ApiResult<CartResponse> {
    let cart_id = parse_cart_id(&cart_id)?;
    let terminal_id = require_caller_terminal(&caller)?.clone();
    let etag: Etag = req.etag.into();
    let cart = state
        .cart_engine
        .back(&caller.tenant_id, &terminal_id, &cart_id, &etag)
        .await
        .map_err(|e| ApiError::from_core(e, "cart.back", error_codes::CART_INVALID_STATE))?;
    ok("cart.back", CartResponse::from(cart))
}

#[utoipa::path(post, path = "/api/v1/carts/{cartId}/payments", params(("cartId" = String, Path)), request_body = AddPaymentRequest, responses((status = 200, description = "Payment recorded", body = CartResponse)), tag = "cart")]
pub async fn add_payment(
    State(state): State<Arc<AppState>>,
    caller: CallerContext,
    Path(cart_id): Path<String>,
    Json(req): Json<AddPaymentRequest>,
) -> ApiResult<CartResponse> {
    let cart_id = parse_cart_id(&cart_id)?;
    let terminal_id = require_caller_terminal(&caller)?.clone();
    let etag: Etag = req.etag.into();
    let cart = state
        .cart_engine
        .add_payment(&caller.tenant_id, &terminal_id, &cart_id, &req.method_code, req.amount, &etag)
        .await
        .map_err(|e| ApiError::from_core(e, "cart.add_payment", error_codes::CART_PAYMENT_METHOD_NOT_ALLOWED))?;
    ok("cart.add_payment", CartResponse::from(cart))
}

#[utoipa::path(post, path = "/api/v1/carts/{cartId}/complete", params(("cartId" = String, Path)), request_body = CasRequest, responses((status = 200, description = "Sale completed", body = CartResponse)), tag = "cart")]
pub async fn complete(
    State(state): State<Arc<AppState>>,
    caller: CallerContext,
    Path(cart_id): Path<String>,
    Json(req): Json<CasRequest>,
) -> ApiResult<CartResponse> {
    let cart_id = parse_cart_id(&cart_id)?;
    let terminal_id = require_caller_terminal(&caller)?.clone();
    let etag: Etag = req.etag.into();
    let cart = state
        .cart_engine
        .complete(&caller.tenant_id, &terminal_id, &cart_id, &etag)
        .await
        .map_err(|e| ApiError::from_core(e, "cart.complete", error_codes::CART_INVALID_STATE))?;
    ok("cart.complete", CartResponse::from(cart))
}

#[utoipa::path(post, path = "/api/v1/carts/{cartId}/cancel", params(("cartId" = String, Path)), request_body = CasRequest, responses((status = 200, description = "Cart cancelled", body = CartResponse)), tag = "cart")]
pub async fn cancel(
    State(state): State<Arc<AppState>>,
    caller: CallerContext,
    Path(cart_id): Path<String>,
    Json(req): Json<CasRequest>,
) -> ApiResult<CartResponse> {
    let cart_id = parse_cart_id(&cart_id)?;
    let terminal_id = require_caller_terminal(&caller)?.clone();
    let etag: Etag = req.etag.into();
    let cart = state
        .cart_engine
        .cancel(&caller.tenant_id, &terminal_id, &cart_id, &etag)
        .await
        .map_err(|e| ApiError::from_core(e, "cart.cancel", error_codes::CART_INVALID_STATE))?;
    ok("cart.cancel", CartResponse::from(cart))
}
