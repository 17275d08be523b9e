//! Domain error types.

use store::StoreError;
use thiserror::Error;

use crate::order::OrderError;
use crate::quote::QuoteError;

/// Malformed or missing input. The unit of work is rolled back.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    #[error("{field} is not a valid decimal: {value}")]
    InvalidDecimal { field: String, value: String },

    #[error("{field} must not be negative")]
    Negative { field: String },

    #[error("{field} is out of range")]
    OutOfRange { field: String },

    #[error("{field} is not a valid date: {value}")]
    InvalidDate { field: String, value: String },

    #[error("{field} is not a valid integer: {value}")]
    InvalidInteger { field: String, value: String },

    #[error("Invalid brand color: {0} (expected #rrggbb)")]
    InvalidColor(String),

    #[error("Unknown unit: {0}")]
    UnknownUnit(String),

    #[error("Unknown status: {0}")]
    UnknownStatus(String),

    #[error("Item sequence {0} is already in use")]
    DuplicateItemSequence(i32),

    #[error("Item {index} is incomplete: {field} is missing")]
    IncompleteItem { index: String, field: String },

    #[error("A client with tax id {0} already exists")]
    DuplicateTaxId(String),

    #[error("A unit with code {0} already exists")]
    DuplicateUnitCode(String),
}

impl ValidationError {
    pub fn required(field: impl Into<String>) -> Self {
        Self::Required {
            field: field.into(),
        }
    }
}

/// Returns the trimmed value, or `Required` when it is blank.
pub(crate) fn require(field: &str, value: &str) -> Result<String, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::required(field));
    }
    Ok(value.to_string())
}

/// Rejects values longer than `max` characters.
pub(crate) fn max_len(field: &str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }
    Ok(())
}

/// Trims an optional value, mapping blank input to `None`.
pub(crate) fn optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An error occurred in the store.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// An error occurred in the quote aggregate.
    #[error("Quote error: {0}")]
    Quote(QuoteError),

    /// An error occurred in the order aggregate.
    #[error("Order error: {0}")]
    Order(OrderError),

    /// Input failed validation.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Record not found.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: i64 },

    /// Delete refused while other records reference the target.
    #[error("{entity} {id} is still referenced and cannot be deleted")]
    Protected { entity: &'static str, id: i64 },
}

impl DomainError {
    pub(crate) fn not_found(entity: &'static str, id: impl Into<i64>) -> Self {
        DomainError::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Returns true if the error is a refused mutation of a locked quote.
    pub fn is_policy_violation(&self) -> bool {
        matches!(self, DomainError::Quote(e) if e.is_policy_violation())
    }
}
