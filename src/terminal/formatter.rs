//! Deterministic receipt/journal text rendering for cash operations
//! (spec.md §4.1: "both are strings and deterministic for a given input").

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::core_ids::TerminalId;

use super::state::CashDirection;

pub fn format_receipt(
    terminal_id: &TerminalId,
    direction: CashDirection,
    amount: Decimal,
    reason: &str,
    timestamp: DateTime<Utc>,
) -> String {
    let label = match direction {
        CashDirection::In => "CASH IN",
        CashDirection::Out => "CASH OUT",
    };
    format!(
        "{label}\nTerminal: {terminal_id}\nAmount: {amount:.2}\nReason: {reason}\nAt: {}\n",
        timestamp.to_rfc3339()
    )
}

pub fn format_journal(
    terminal_id: &TerminalId,
    direction: CashDirection,
    amount: Decimal,
    operator_id: Option<&str>,
    timestamp: DateTime<Utc>,
) -> String {
    let op = operator_id.unwrap_or("-");
    let sign = match direction {
        CashDirection::In => "+",
        CashDirection::Out => "-",
    };
    format!("{} {terminal_id} {sign}{amount:.2} op={op}", timestamp.to_rfc3339())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tenant::TenantId;
    use chrono::TimeZone;
    use std::str::FromStr;

    fn terminal() -> TerminalId {
        TerminalId::new(&TenantId::parse("A1234").unwrap(), "store001", 1)
    }

    #[test]
    fn receipt_rendering_is_deterministic() {
        let ts = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let a = format_receipt(&terminal(), CashDirection::In, Decimal::from_str("100.00").unwrap(), "float", ts);
        let b = format_receipt(&terminal(), CashDirection::In, Decimal::from_str("100.00").unwrap(), "float", ts);
        assert_eq!(a, b);
        assert!(a.contains("CASH IN"));
    }

    #[test]
    fn journal_reflects_direction_sign() {
        let ts = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let out = format_journal(&terminal(), CashDirection::Out, Decimal::from_str("50.00").unwrap(), Some("op-1"), ts);
        assert!(out.contains("-50.00"));
        assert!(out.contains("op=op-1"));
    }
}
