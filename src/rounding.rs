//! Rounding and division helpers for monetary values.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Number of decimal places of every monetary value and percentage in a result.
pub const MONEY_DP: u32 = 2;

/// Round a value to [MONEY_DP] decimal places, with ties rounded away from zero, and convert it
/// to a float for serialisation.
pub fn round_money(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(MONEY_DP, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

/// Divide two values, returning 0 when the denominator is 0 or the quotient does not fit.
pub fn ratio(numerator: Decimal, denominator: Decimal) -> Decimal {
    numerator.checked_div(denominator).unwrap_or_default()
}

/// Mean of a total over a number of items; 0 for no items.
pub fn average(total: Decimal, count: u64) -> Decimal {
    ratio(total, Decimal::from(count))
}

/// `part` as a percentage of `whole`; 0 when `whole` is 0.
pub fn percentage(part: Decimal, whole: Decimal) -> Decimal {
    ratio(part, whole)
        .checked_mul(Decimal::ONE_HUNDRED)
        .unwrap_or_default()
}
