//! Persistence for the quoting back office.
//!
//! Services talk to a [`Store`] through short-lived [`UnitOfWork`]s. Two
//! implementations are provided: [`InMemoryStore`] for tests and local runs,
//! and [`PostgresStore`] for production.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod records;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::{InMemoryStore, InMemoryTransaction};
pub use postgres::{PgUnitOfWork, PostgresStore};
pub use records::{
    Client, Company, DEFAULT_BRAND_COLOR, NewClient, NewCompany, NewOrder, NewOrderItem, NewQuote,
    NewQuoteItem, NewUnit, OrderItemRow, OrderRow, QuoteFilter, QuoteItemRow, QuoteRow, Unit,
};
pub use store::{Store, UnitOfWork, constraints};
