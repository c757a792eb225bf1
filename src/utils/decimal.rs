// src/utils/decimal.rs
use rust_decimal::Decimal;

/// Percentage change from `from` to `to`: (to - from) / from * 100.
/// Returns None when `from` is zero or the result overflows.
pub fn pct_change(from: Decimal, to: Decimal) -> Option<Decimal> {
    to.checked_sub(from)?
        .checked_div(from)?
        .checked_mul(Decimal::ONE_HUNDRED)
}

/// Fractional distance of `other` from `base`: |base - other| / base.
/// Returns None when `base` is zero or the difference overflows.
pub fn relative_distance(base: Decimal, other: Decimal) -> Option<Decimal> {
    base.checked_sub(other)?.abs().checked_div(base)
}

/// Arithmetic mean. None for an empty slice or an overflowing sum.
pub fn mean(values: &[Decimal]) -> Option<Decimal> {
    if values.is_empty() {
        return None;
    }
    let sum = values
        .iter()
        .try_fold(Decimal::ZERO, |acc, &value| acc.checked_add(value))?;
    sum.checked_div(Decimal::from(values.len()))
}
