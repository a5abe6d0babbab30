//! Rounding policy for quantities and money.
//!
//! `truncate` and `normalize` are deliberately separate: commissions are
//! floored so they never exceed the exact fee, every stored quantity is
//! rounded to the cent.

use crate::domain::Decimal;
use rust_decimal::{Decimal as RustDecimal, RoundingStrategy};

/// Decimal places kept by [`normalize`] and used for commission extraction.
pub const QUANTITY_DP: u32 = 2;

/// Floor `value` at `decimals` places (toward negative infinity).
///
/// Only used to derive a commission quantity from a gross quantity.
pub fn truncate(value: Decimal, decimals: u32) -> Decimal {
    Decimal::new(
        value
            .inner()
            .round_dp_with_strategy(decimals, RoundingStrategy::ToNegativeInfinity),
    )
}

/// Round to two places (midpoint away from zero) and erase negative zero.
pub fn normalize(value: Decimal) -> Decimal {
    let rounded = value
        .inner()
        .round_dp_with_strategy(QUANTITY_DP, RoundingStrategy::MidpointAwayFromZero);
    if rounded.is_zero() {
        Decimal::new(RustDecimal::ZERO)
    } else {
        Decimal::new(rounded)
    }
}

/// `normalize(a - b)`, floored at zero.
///
/// Over-consumption never produces a negative balance; the excess is dropped.
pub fn subtract_clamped(a: Decimal, b: Decimal) -> Decimal {
    let diff = normalize(a - b);
    if diff.is_negative() {
        Decimal::zero()
    } else {
        diff
    }
}
