//! Terminal lifecycle state machine (spec.md §4.1).
//!
//! Grounded on `internal_transfer/state.rs` / `transfer/state.rs`'s shape:
//! a plain enum, an `is_terminal`-style predicate, and explicit transition
//! match arms rather than a generic graph.

use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "PascalCase")]
pub enum TerminalStatus {
    Idle,
    Opened,
    Closed,
}

impl TerminalStatus {
    /// `Idle` and `Closed` are both "no business day in progress" states
    /// (spec.md §9 open question: `Closed` persists as an observable state
    /// rather than reverting to `Idle` on its own — see DESIGN.md); only
    /// `Opened` means a drawer is live and must stay unremovable.
    pub fn can_delete(&self) -> bool {
        matches!(self, TerminalStatus::Idle | TerminalStatus::Closed)
    }
}

impl fmt::Display for TerminalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TerminalStatus::Idle => "Idle",
            TerminalStatus::Opened => "Opened",
            TerminalStatus::Closed => "Closed",
        };
        write!(f, "{s}")
    }
}

/// Function mode advertised to the client (spec.md §4.1): the Engine only
/// validates membership, the UI owns what each mode does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "PascalCase")]
pub enum FunctionMode {
    MainMenu,
    Sales,
    Returns,
    Void,
    Reports,
    OpenTerminal,
    CloseTerminal,
    Journal,
    Maintenance,
    CashInOut,
}

impl FunctionMode {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "MainMenu" => Some(Self::MainMenu),
            "Sales" => Some(Self::Sales),
            "Returns" => Some(Self::Returns),
            "Void" => Some(Self::Void),
            "Reports" => Some(Self::Reports),
            "OpenTerminal" => Some(Self::OpenTerminal),
            "CloseTerminal" => Some(Self::CloseTerminal),
            "Journal" => Some(Self::Journal),
            "Maintenance" => Some(Self::Maintenance),
            "CashInOut" => Some(Self::CashInOut),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CashDirection {
    In,
    Out,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_idle_and_closed_terminals_can_be_deleted() {
        assert!(TerminalStatus::Idle.can_delete());
        assert!(!TerminalStatus::Opened.can_delete());
        assert!(TerminalStatus::Closed.can_delete());
    }

    #[test]
    fn function_mode_rejects_unknown_labels() {
        assert!(FunctionMode::parse("MainMenu").is_some());
        assert!(FunctionMode::parse("Bogus").is_none());
    }
}
