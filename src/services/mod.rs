//! Business logic for the inventory core.
//!
//! Services own their database handle and event sender and return
//! [`ServiceError`] so handlers can surface failures unchanged.

pub mod ledger;
pub mod locations;
pub mod products;
pub mod stock;
pub mod transfers;
pub mod variants;

use crate::errors::ServiceError;
use rust_decimal::Decimal;

/// Trims `value` and rejects it when nothing is left.
pub(crate) fn required_text(field: &str, value: &str) -> Result<String, ServiceError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::ValidationError(format!(
            "{} must not be empty",
            field
        )));
    }
    Ok(trimmed.to_string())
}

/// Trims optional text, collapsing blank strings to `None`.
pub(crate) fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Largest amount a `decimal(10, 2)` column holds.
pub(crate) const MAX_MONEY: Decimal = Decimal::from_parts(1_410_065_407, 2, 0, false, 2);

/// Monetary amounts are non-negative, at most [`MAX_MONEY`], with at most two fractional digits.
pub(crate) fn validate_money(field: &str, amount: Decimal) -> Result<(), ServiceError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(ServiceError::ValidationError(format!(
            "{} must not be negative",
            field
        )));
    }
    if amount > MAX_MONEY {
        return Err(ServiceError::ValidationError(format!(
            "{} must not exceed {}",
            field, MAX_MONEY
        )));
    }
    if amount.normalize().scale() > 2 {
        return Err(ServiceError::ValidationError(format!(
            "{} must have at most 2 decimal places",
            field
        )));
    }
    Ok(())
}
