//! Decimal price arithmetic.
//!
//! Monetary amounts are `rust_decimal::Decimal` throughout, never floats.
//! The backend sends amounts as JSON numbers with no currency field; the
//! currency is fixed per deployment and rendered by the UI shell.

use rust_decimal::Decimal;

/// Amount after a percentage discount, rounded to two decimal places.
///
/// A zero percentage is the identity (modulo rounding to cents).
#[must_use]
pub fn apply_discount_percent(amount: Decimal, percent: Decimal) -> Decimal {
    let factor = (Decimal::ONE_HUNDRED - percent) / Decimal::ONE_HUNDRED;
    (amount * factor).round_dp(2)
}
