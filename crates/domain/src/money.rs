//! Decimal amounts as stored: two fractional digits, below 100 000 000.

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::ValidationError;

/// Largest magnitude a NUMERIC(10,2) column holds.
pub fn max_amount() -> Decimal {
    Decimal::new(9_999_999_999, 2)
}

/// Rounds half away from zero to exactly two fractional digits.
pub fn round2(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

fn in_range(field: &str, value: Decimal) -> Result<Decimal, ValidationError> {
    if value.abs() > max_amount() {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
        });
    }
    Ok(value)
}

/// Validates a non-negative input amount and rounds it for storage.
pub fn amount(field: &str, value: Decimal) -> Result<Decimal, ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    in_range(field, round2(value))
}

/// Parses a submitted decimal.
///
/// Accepts `.` or a single `,` as the decimal separator; thousands
/// separators are rejected.
pub fn parse_amount(field: &str, raw: &str) -> Result<Decimal, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ValidationError::required(field));
    }

    let invalid = || ValidationError::InvalidDecimal {
        field: field.to_string(),
        value: raw.to_string(),
    };

    let normalized = match raw.matches(',').count() {
        0 => raw.to_string(),
        1 if !raw.contains('.') => raw.replace(',', "."),
        _ => return Err(invalid()),
    };
    let value = Decimal::from_str(&normalized).map_err(|_| invalid())?;

    amount(field, value)
}

/// `quantity × unit_price`, rounded for storage.
pub fn line_total(quantity: Decimal, unit_price: Decimal) -> Result<Decimal, ValidationError> {
    let product = quantity
        .checked_mul(unit_price)
        .ok_or_else(|| ValidationError::OutOfRange {
            field: "total".to_string(),
        })?;
    in_range("total", round2(product))
}

/// Sum of the line totals minus the discount, rounded once.
///
/// The result is negative when the discount exceeds the subtotal.
pub fn quote_total<I>(line_totals: I, discount: Decimal) -> Result<Decimal, ValidationError>
where
    I: IntoIterator<Item = Decimal>,
{
    let subtotal: Decimal = line_totals.into_iter().sum();
    in_range("total", round2(subtotal - discount))
}
