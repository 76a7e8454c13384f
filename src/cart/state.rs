//! Cart state machine (spec.md §4.2).
//!
//! Grounded on `internal_transfer/state.rs` / `transfer/state.rs`'s enum +
//! explicit transition match style.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "PascalCase")]
pub enum CartStatus {
    Initial,
    Idle,
    EnteringItem,
    PreTax,
    PayingItem,
    Completed,
    Cancelled,
    Paused,
}

impl CartStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, CartStatus::Completed | CartStatus::Cancelled)
    }

    /// `Idle -> EnteringItem` on first `addItem`; `EnteringItem ->
    /// EnteringItem` on subsequent ones.
    pub fn can_add_item(&self) -> bool {
        matches!(self, CartStatus::Idle | CartStatus::EnteringItem)
    }

    pub fn can_subtotal(&self) -> bool {
        matches!(self, CartStatus::EnteringItem)
    }

    pub fn can_go_back(&self) -> bool {
        matches!(self, CartStatus::PreTax)
    }

    pub fn can_add_payment(&self) -> bool {
        matches!(self, CartStatus::PreTax | CartStatus::PayingItem)
    }

    pub fn can_cancel(&self) -> bool {
        !self.is_terminal()
    }

    pub fn require(&self, predicate: bool, operation: &str) -> Result<(), CoreError> {
        if predicate {
            Ok(())
        } else {
            Err(CoreError::InvalidState(format!("{operation} is not valid from cart state {self:?}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states_reject_further_mutation() {
        assert!(CartStatus::Completed.is_terminal());
        assert!(CartStatus::Cancelled.is_terminal());
        assert!(!CartStatus::PreTax.is_terminal());
    }

    #[test]
    fn only_entering_item_can_subtotal() {
        assert!(CartStatus::EnteringItem.can_subtotal());
        assert!(!CartStatus::PreTax.can_subtotal());
    }
}
