//! Decimal guards shared by every stock, price and quantity input.

use rust_decimal::Decimal;

use crate::error::{DomainError, DomainResult};

/// Reject negative values (stock, par level, price).
pub fn ensure_non_negative(field: &str, value: Decimal) -> DomainResult<Decimal> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(DomainError::validation(format!(
            "{field} cannot be negative (got {value})"
        )));
    }
    Ok(value)
}

/// Reject zero and negative values (order and waste quantities).
pub fn ensure_positive(field: &str, value: Decimal) -> DomainResult<Decimal> {
    if value <= Decimal::ZERO {
        return Err(DomainError::validation(format!(
            "{field} must be positive (got {value})"
        )));
    }
    Ok(value)
}

/// Trim and reject empty unit symbols.
pub fn ensure_unit(unit: &str) -> DomainResult<String> {
    let unit = unit.trim();
    if unit.is_empty() {
        return Err(DomainError::validation("unit cannot be empty"));
    }
    Ok(unit.to_string())
}

/// `a + b`, rejecting results outside the decimal range.
pub fn checked_add(field: &str, a: Decimal, b: Decimal) -> DomainResult<Decimal> {
    a.checked_add(b).ok_or_else(|| out_of_range(field))
}

/// `a * b`, rejecting results outside the decimal range.
pub fn checked_mul(field: &str, a: Decimal, b: Decimal) -> DomainResult<Decimal> {
    a.checked_mul(b).ok_or_else(|| out_of_range(field))
}

/// Sum of `values`, rejecting an overflowing total.
pub fn checked_sum(field: &str, values: impl IntoIterator<Item = Decimal>) -> DomainResult<Decimal> {
    values
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, v| checked_add(field, acc, v))
}

fn out_of_range(field: &str) -> DomainError {
    DomainError::validation(format!("{field} is out of range"))
}
