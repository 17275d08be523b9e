//! Domain layer for the quoting back office.
//!
//! This crate provides:
//! - Quote aggregate with numbering, total recomputation and the one-way lock
//! - Purchase order aggregate with derived totals
//! - Catalog of companies, units of measure and clients
//! - Services running each operation inside one store unit of work

pub mod catalog;
pub mod error;
pub mod money;
pub mod order;
pub mod quote;

pub use catalog::{CatalogService, ClientInput, CompanyInput, UnitInput, UnitPatch};
pub use error::{DomainError, ValidationError};
pub use order::{CreateOrder, Order, OrderError, OrderItemInput, OrderService};
pub use quote::{
    ConversionOutcome, CreateQuote, LineItemInput, Quote, QuoteError, QuoteFields, QuoteService,
    QuoteSheet, SheetItem, UpdateQuote,
};
