//! Shared types for the quoting back office.
//!
//! Typed row identifiers and the status vocabularies of quotes and purchase
//! orders. Every other crate in the workspace speaks these types.

pub mod status;
pub mod types;

pub use status::{OrderStatus, QuoteStatus, UnknownStatus};
pub use types::{ClientId, CompanyId, OrderId, OrderItemId, QuoteId, QuoteItemId, UnitId};
