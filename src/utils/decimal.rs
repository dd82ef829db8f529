//! Decimal arithmetic utilities for funding rate statistics.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Hourly funding periods in a (non-leap) year.
const HOURS_PER_YEAR: Decimal = dec!(8760);

/// Round a decimal to a specific number of decimal places.
pub fn round_to_precision(value: Decimal, decimals: u32) -> Decimal {
    value.round_dp(decimals)
}

/// Safe division that returns zero if divisor is zero.
pub fn safe_div(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator == Decimal::ZERO {
        Decimal::ZERO
    } else {
        numerator / denominator
    }
}

/// Annualize an hourly funding rate (simple, not compounded).
pub fn annualize_hourly(rate: Decimal) -> Decimal {
    rate * HOURS_PER_YEAR
}
