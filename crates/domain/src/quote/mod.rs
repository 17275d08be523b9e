//! Quote aggregate and related types.

mod aggregate;
mod commands;
mod numbering;
mod service;
mod sheet;

pub use aggregate::{ConversionOutcome, Quote};
pub use commands::{
    CreateQuote, DEFAULT_DELIVERY_TERMS, DEFAULT_VALIDITY_DAYS, LineItemInput, QuoteFields,
    UpdateQuote,
};
pub use numbering::{NUMBER_PREFIX, format_number, next_sequence, parse_sequence};
pub use service::{DEFAULT_NUMBER_ATTEMPTS, QuoteService};
pub use sheet::{QuoteSheet, SheetItem};

use common::QuoteStatus;
use thiserror::Error;

/// Errors that can occur during quote operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuoteError {
    /// The quote was converted into an order and can no longer change.
    #[error("Quote {number} is locked and cannot be changed")]
    Locked { number: String },

    /// Quote is not in the expected state.
    #[error("Invalid state transition: cannot {action} from {current_state} state")]
    InvalidStateTransition {
        current_state: QuoteStatus,
        action: &'static str,
    },

    /// Item not found in quote.
    #[error("Item not found: {sequence}")]
    ItemNotFound { sequence: i32 },

    /// Quotes can only be created for active companies.
    #[error("Company {company_id} is inactive")]
    CompanyInactive { company_id: i64 },

    /// No free number could be claimed within the configured attempts.
    #[error("Could not assign a quote number after {attempts} attempts")]
    NumberExhausted { attempts: u32 },
}

impl QuoteError {
    /// Returns true for refusals caused by the lock flag.
    pub fn is_policy_violation(&self) -> bool {
        matches!(self, QuoteError::Locked { .. })
    }
}
