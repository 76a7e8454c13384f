//! Cart Engine (C5): item entry, subtotal, payment and completion, exactly
//! per spec.md §4.2.
//!
//! Grounded on `terminal/engine.rs`'s shape (validate against the loaded
//! aggregate, delegate the actual write to the repository, enqueue the
//! outbox event in the same transaction as the terminal write) and
//! `internal_transfer/coordinator.rs`'s orchestration style.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

use crate::bus::{Event, EventBus, topics};
use crate::core_ids::TerminalId;
use crate::error::{CoreError, CoreResult};
use crate::master_data::{MasterDataRepository, rounding};
use crate::tenant::{Etag, TenantId, TenantStore};

use super::cache::CartCache;
use super::models::{Cart, CartId, LineItem, Payment};
use super::state::CartStatus;

/// The immutable Tranlog snapshot published at completion (spec.md §3:
/// "immutable snapshot of the cart at completion; businessCounter,
/// businessDate, staff"), carrying the cart's own fields flattened
/// alongside the terminal-scoped context a cart itself doesn't track.
#[derive(Debug, Serialize)]
struct TranlogRecord<'a> {
    #[serde(flatten)]
    cart: &'a Cart,
    transaction_no: i64,
    business_counter: i32,
    business_date: Option<NaiveDate>,
    staff: Option<String>,
}

pub struct CartEngine {
    tenants: TenantStore,
    cache: CartCache,
    bus: Arc<EventBus>,
}

impl CartEngine {
    pub fn new(tenants: TenantStore, bus: Arc<EventBus>) -> Self {
        Self { tenants, cache: CartCache::new(), bus }
    }

    pub async fn open(&self, tenant_id: &TenantId, terminal_id: &TerminalId) -> CoreResult<Cart> {
        let pool = self.tenants.pool(tenant_id).await?;
        let cart = Cart::new(tenant_id.clone(), terminal_id.clone());
        super::repository::CartRepository::insert(&pool, &cart).await?;
        self.cache.put(cart.clone());
        Ok(cart)
    }

    pub async fn get(&self, tenant_id: &TenantId, caller_terminal: &TerminalId, cart_id: &CartId) -> CoreResult<Cart> {
        let cart = self.load(tenant_id, cart_id).await?;
        CartCache::check_ownership(&cart, caller_terminal)?;
        Ok(cart)
    }

    async fn load(&self, tenant_id: &TenantId, cart_id: &CartId) -> CoreResult<Cart> {
        if let Some(cart) = self.cache.get(cart_id) {
            return Ok(cart);
        }
        let pool = self.tenants.pool(tenant_id).await?;
        let cart = super::repository::CartRepository::find_by_id(&pool, cart_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("cart {cart_id} not found")))?;
        self.cache.put(cart.clone());
        Ok(cart)
    }

    pub async fn add_item(
        &self,
        tenant_id: &TenantId,
        caller_terminal: &TerminalId,
        cart_id: &CartId,
        item_code: &str,
        quantity: Decimal,
        discounts: Decimal,
        etag: &Etag,
    ) -> CoreResult<Cart> {
        if quantity <= Decimal::ZERO {
            return Err(CoreError::Validation("quantity must be greater than 0".to_string()));
        }
        let mut cart = self.load(tenant_id, cart_id).await?;
        CartCache::check_ownership(&cart, caller_terminal)?;
        cart.status.require(cart.status.can_add_item(), "addItem")?;

        let pool = self.tenants.pool(tenant_id).await?;
        let item = MasterDataRepository::find_item(&pool, tenant_id.as_str(), item_code)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("item {item_code} not found")))?;
        let unit_price = MasterDataRepository::resolve_unit_price(&pool, tenant_id.as_str(), caller_terminal.store_code(), item_code)
            .await?
            .unwrap_or(item.unit_price);

        let position = cart.line_items.len() as i32 + 1;
        cart.line_items.push(LineItem {
            position,
            item_code: item.item_code,
            description: item.description,
            quantity,
            unit_price,
            tax_code: item.tax_code,
            category_code: item.category_code,
            discounts,
            cancelled: false,
        });
        cart.status = CartStatus::EnteringItem;

        self.recompute(&pool, tenant_id, &mut cart).await?;
        self.persist(&pool, &mut cart, etag).await?;
        Ok(cart)
    }

    pub async fn cancel_item(
        &self,
        tenant_id: &TenantId,
        caller_terminal: &TerminalId,
        cart_id: &CartId,
        position: i32,
        etag: &Etag,
    ) -> CoreResult<Cart> {
        let mut cart = self.load(tenant_id, cart_id).await?;
        CartCache::check_ownership(&cart, caller_terminal)?;
        cart.status.require(cart.status.can_add_item(), "cancelItem")?;

        let line = cart
            .line_items
            .iter_mut()
            .find(|l| l.position == position)
            .ok_or_else(|| CoreError::NotFound(format!("line item {position} not found")))?;
        line.cancelled = true;

        let pool = self.tenants.pool(tenant_id).await?;
        self.recompute(&pool, tenant_id, &mut cart).await?;
        self.persist(&pool, &mut cart, etag).await?;
        Ok(cart)
    }

    /// `EnteringItem -> PreTax`: freezes the line items and computes the
    /// tax total; no further item entry is possible without going `back`.
    pub async fn subtotal(&self, tenant_id: &TenantId, caller_terminal: &TerminalId, cart_id: &CartId, etag: &Etag) -> CoreResult<Cart> {
        let mut cart = self.load(tenant_id, cart_id).await?;
        CartCache::check_ownership(&cart, caller_terminal)?;
        cart.status.require(cart.status.can_subtotal(), "subtotal")?;

        let pool = self.tenants.pool(tenant_id).await?;
        self.recompute(&pool, tenant_id, &mut cart).await?;
        cart.status = CartStatus::PreTax;
        self.persist(&pool, &mut cart, etag).await?;
        Ok(cart)
    }

    /// `PreTax -> EnteringItem`: returns to item entry before any payment
    /// has been recorded.
    pub async fn back(&self, tenant_id: &TenantId, caller_terminal: &TerminalId, cart_id: &CartId, etag: &Etag) -> CoreResult<Cart> {
        let mut cart = self.load(tenant_id, cart_id).await?;
        CartCache::check_ownership(&cart, caller_terminal)?;
        cart.status.require(cart.status.can_go_back(), "back")?;
        cart.status = CartStatus::EnteringItem;

        let pool = self.tenants.pool(tenant_id).await?;
        self.persist(&pool, &mut cart, etag).await?;
        Ok(cart)
    }

    pub async fn add_payment(
        &self,
        tenant_id: &TenantId,
        caller_terminal: &TerminalId,
        cart_id: &CartId,
        method_code: &str,
        amount: Decimal,
        etag: &Etag,
    ) -> CoreResult<Cart> {
        if amount <= Decimal::ZERO {
            return Err(CoreError::Validation("payment amount must be greater than 0".to_string()));
        }
        let mut cart = self.load(tenant_id, cart_id).await?;
        CartCache::check_ownership(&cart, caller_terminal)?;
        cart.status.require(cart.status.can_add_payment(), "addPayment")?;

        let pool = self.tenants.pool(tenant_id).await?;
        let method = MasterDataRepository::find_payment_method(&pool, tenant_id.as_str(), method_code)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("payment method {method_code} not found")))?;
        if !method.can_deposit_over && amount > cart.balance() {
            return Err(CoreError::Validation(format!("payment method {method_code} cannot deposit over the remaining balance")));
        }

        cart.payments.push(Payment { method_code: method.code, amount, received_at: chrono::Utc::now() });
        cart.status = CartStatus::PayingItem;

        self.persist(&pool, &mut cart, etag).await?;
        Ok(cart)
    }

    /// Completes the sale once `balance <= 0` (spec.md §4.2), assigning the
    /// receipt number and emitting the `tranlog` event atomically with the
    /// status flip.
    pub async fn complete(&self, tenant_id: &TenantId, caller_terminal: &TerminalId, cart_id: &CartId, etag: &Etag) -> CoreResult<Cart> {
        let mut cart = self.load(tenant_id, cart_id).await?;
        CartCache::check_ownership(&cart, caller_terminal)?;
        cart.status.require(cart.status == CartStatus::PayingItem, "complete")?;
        if cart.balance() > Decimal::ZERO {
            return Err(CoreError::Validation("cart balance must be fully paid before completion".to_string()));
        }

        let pool = self.tenants.pool(tenant_id).await?;
        let mut tx = pool.begin().await?;
        let (new_etag, receipt_no) = super::repository::CartRepository::complete_tx(&mut tx, &cart, etag).await?;
        let (transaction_no, business_counter, business_date, staff) =
            crate::terminal::repository::TerminalRepository::claim_transaction_no_tx(&mut tx, caller_terminal).await?;
        cart.status = CartStatus::Completed;
        cart.receipt_no = Some(receipt_no);
        cart.etag = new_etag.clone();

        let tranlog = TranlogRecord {
            cart: &cart,
            transaction_no,
            business_counter,
            business_date,
            staff,
        };
        let event = Event::new(tenant_id.clone(), topics::TRANLOG, json!(tranlog));
        crate::bus::outbox::OutboxRepository::enqueue(&mut tx, &event).await?;
        tx.commit().await?;

        self.cache.put(cart.clone());
        Ok(cart)
    }

    pub async fn cancel(&self, tenant_id: &TenantId, caller_terminal: &TerminalId, cart_id: &CartId, etag: &Etag) -> CoreResult<Cart> {
        let mut cart = self.load(tenant_id, cart_id).await?;
        CartCache::check_ownership(&cart, caller_terminal)?;
        cart.status.require(cart.status.can_cancel(), "cancel")?;

        let pool = self.tenants.pool(tenant_id).await?;
        let new_etag = super::repository::CartRepository::cancel(&pool, cart_id, etag).await?;
        cart.status = CartStatus::Cancelled;
        cart.etag = new_etag;
        self.cache.put(cart.clone());
        Ok(cart)
    }

    /// Recomputes `subTotal`, `taxAmount` and `total` from the current line
    /// items (spec.md §4.2 money identities): tax is grouped by `taxCode`,
    /// each group rounded per its own rule, then summed without a second
    /// rounding pass.
    async fn recompute(&self, pool: &sqlx::PgPool, tenant_id: &TenantId, cart: &mut Cart) -> CoreResult<()> {
        let mut taxable_by_code: HashMap<String, Decimal> = HashMap::new();
        for line in cart.line_items.iter().filter(|l| !l.cancelled) {
            *taxable_by_code.entry(line.tax_code.clone()).or_insert(Decimal::ZERO) += line.line_total();
        }

        use crate::master_data::TaxType;
        let mut sub_total = Decimal::ZERO;
        let mut tax_amount = Decimal::ZERO;
        for (tax_code, taxable) in taxable_by_code {
            let rule = MasterDataRepository::find_tax_rule(pool, tenant_id.as_str(), &tax_code)
                .await?
                .ok_or_else(|| CoreError::NotFound(format!("tax rule {tax_code} not found")))?;
            let (net, group_tax) = match rule.tax_type {
                TaxType::Exempt => (taxable, Decimal::ZERO),
                TaxType::Exclusive => {
                    let tax = rounding::apply(taxable * rule.rate, rule.round_digit, rule.round_method);
                    (taxable, tax)
                }
                TaxType::Inclusive => {
                    let tax = rounding::apply(taxable - taxable / (Decimal::ONE + rule.rate), rule.round_digit, rule.round_method);
                    (taxable - tax, tax)
                }
            };
            sub_total += net;
            tax_amount += group_tax;
        }

        cart.sub_total = sub_total;
        cart.tax_amount = tax_amount;
        cart.total = sub_total + tax_amount - cart.order_discounts;
        Ok(())
    }

    async fn persist(&self, pool: &sqlx::PgPool, cart: &mut Cart, etag: &Etag) -> CoreResult<()> {
        let new_etag = super::repository::CartRepository::save(pool, cart, etag).await?;
        cart.etag = new_etag;
        self.cache.put(cart.clone());
        Ok(())
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }
}
