//! Cart, LineItem and Payment entities (spec.md §3).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::core_ids::TerminalId;
use crate::tenant::{Etag, TenantId};

use super::state::CartStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(transparent)]
pub struct CartId(Uuid);

impl CartId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(raw: &str) -> Result<Self, String> {
        Uuid::parse_str(raw).map(Self).map_err(|e| e.to_string())
    }

    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    pub fn inner(&self) -> Uuid {
        self.0
    }
}

impl Default for CartId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub position: i32,
    pub item_code: String,
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub tax_code: String,
    pub category_code: Option<String>,
    pub discounts: Decimal,
    pub cancelled: bool,
}

impl LineItem {
    /// `quantity * effectiveUnitPrice - discounts` (spec.md §4.2 money
    /// identity); cancelled lines contribute zero.
    pub fn line_total(&self) -> Decimal {
        if self.cancelled {
            return Decimal::ZERO;
        }
        self.quantity * self.unit_price - self.discounts
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub method_code: String,
    pub amount: Decimal,
    pub received_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    pub cart_id: CartId,
    pub tenant_id: TenantId,
    pub terminal_id: TerminalId,
    pub status: CartStatus,
    pub line_items: Vec<LineItem>,
    pub payments: Vec<Payment>,
    pub sub_total: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
    pub order_discounts: Decimal,
    pub receipt_no: Option<i64>,
    pub etag: Etag,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    pub fn new(tenant_id: TenantId, terminal_id: TerminalId) -> Self {
        let now = Utc::now();
        Self {
            cart_id: CartId::new(),
            tenant_id,
            terminal_id,
            status: CartStatus::Idle,
            line_items: Vec::new(),
            payments: Vec::new(),
            sub_total: Decimal::ZERO,
            tax_amount: Decimal::ZERO,
            total: Decimal::ZERO,
            order_discounts: Decimal::ZERO,
            receipt_no: None,
            etag: Etag::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// `balance = total - sum(payment.amount)`; completion requires
    /// `balance <= 0`.
    pub fn balance(&self) -> Decimal {
        self.total - self.payments.iter().map(|p| p.amount).sum::<Decimal>()
    }

    pub fn paid_total(&self) -> Decimal {
        self.payments.iter().map(|p| p.amount).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn line(position: i32, qty: &str, price: &str, discounts: &str, cancelled: bool) -> LineItem {
        LineItem {
            position,
            item_code: "SKU1".to_string(),
            description: "widget".to_string(),
            quantity: Decimal::from_str(qty).unwrap(),
            unit_price: Decimal::from_str(price).unwrap(),
            tax_code: "STD".to_string(),
            category_code: None,
            discounts: Decimal::from_str(discounts).unwrap(),
            cancelled,
        }
    }

    #[test]
    fn line_total_is_quantity_times_price_minus_discounts() {
        let l = line(1, "3", "2.50", "0.50", false);
        assert_eq!(l.line_total(), Decimal::from_str("7.00").unwrap());
    }

    #[test]
    fn cancelled_line_contributes_nothing() {
        let l = line(1, "3", "2.50", "0.50", true);
        assert_eq!(l.line_total(), Decimal::ZERO);
    }

    #[test]
    fn balance_is_total_minus_payments() {
        let tenant = TenantId::parse("A1234").unwrap();
        let terminal = TerminalId::new(&tenant, "store001", 1);
        let mut cart = Cart::new(tenant, terminal);
        cart.total = Decimal::from_str("10.00").unwrap();
        cart.payments.push(Payment {
            method_code: "CASH".to_string(),
            amount: Decimal::from_str("6.00").unwrap(),
            received_at: Utc::now(),
        });
        assert_eq!(cart.balance(), Decimal::from_str("4.00").unwrap());
        assert_eq!(cart.paid_total(), Decimal::from_str("6.00").unwrap());
    }
}
