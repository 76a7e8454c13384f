//! Per-tax-group rounding (spec.md §4.2: "rounded per that group's rule;
//! grand total taxes are a sum of group taxes, no second-stage rounding").
//!
//! Grounded on `money.rs` / `gateway/types/money.rs`'s `Decimal`-handling
//! discipline, generalized from the teacher's fixed-point scaled-integer
//! money into direct `Decimal` rounding (POS amounts need two fractional
//! digits, not exchange-grade integer scaling — see DESIGN.md).

use rust_decimal::{Decimal, RoundingStrategy};

use super::models::RoundMethod;

pub fn apply(amount: Decimal, digit: u32, method: RoundMethod) -> Decimal {
    match method {
        RoundMethod::Round => amount.round_dp_with_strategy(digit, RoundingStrategy::MidpointAwayFromZero),
        RoundMethod::Floor => amount.round_dp_with_strategy(digit, RoundingStrategy::ToNegativeInfinity),
        RoundMethod::Ceil => amount.round_dp_with_strategy(digit, RoundingStrategy::ToPositiveInfinity),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn round_half_up_rounds_away_from_zero() {
        let v = Decimal::from_str("1.005").unwrap();
        assert_eq!(apply(v, 2, RoundMethod::Round), Decimal::from_str("1.01").unwrap());
    }

    #[test]
    fn floor_truncates_down() {
        let v = Decimal::from_str("1.999").unwrap();
        assert_eq!(apply(v, 2, RoundMethod::Floor), Decimal::from_str("1.99").unwrap());
    }

    #[test]
    fn ceil_truncates_up() {
        let v = Decimal::from_str("1.001").unwrap();
        assert_eq!(apply(v, 2, RoundMethod::Ceil), Decimal::from_str("1.01").unwrap());
    }
}
