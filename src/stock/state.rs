//! Stock update-type vocabulary and alert classification (spec.md §4.3).

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Sign conventions are advisory: the engine always applies the caller's
/// signed `quantityChange` verbatim. The labels document intent for
/// callers/audit readers, not an enforced constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UpdateType {
    Sale,
    Return,
    Void,
    VoidReturn,
    Purchase,
    Adjustment,
    Initial,
    Damage,
    TransferIn,
    TransferOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
pub enum AlertType {
    MinimumStock,
    ReorderPoint,
}

impl AlertType {
    pub fn wire_name(&self) -> &'static str {
        match self {
            AlertType::MinimumStock => "minimum_stock",
            AlertType::ReorderPoint => "reorder_point",
        }
    }
}
