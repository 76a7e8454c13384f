//! Read-through catalog entities the Cart Engine resolves against (Master
//! Data CRUD itself is out of scope — spec.md §1 "referenced as a
//! read-through catalog"). Rows are written by an external Master-Data
//! service; this crate only reads them.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub item_code: String,
    pub description: String,
    pub unit_price: Decimal,
    pub tax_code: String,
    pub category_code: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "UPPERCASE")]
pub enum RoundMethod {
    Round,
    Floor,
    Ceil,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum TaxType {
    Exclusive,
    Inclusive,
    Exempt,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxRule {
    pub tax_code: String,
    pub rate: Decimal,
    pub round_digit: u32,
    pub round_method: RoundMethod,
    pub tax_type: TaxType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentMethod {
    pub code: String,
    pub name: String,
    pub can_deposit_over: bool,
    pub can_change: bool,
}
