//! Persisted record types.
//!
//! Records mirror table rows one to one. Derived values (`total` columns) are
//! computed by the domain layer before a record reaches the store; the store
//! never recomputes them.

use chrono::{DateTime, NaiveDate, Utc};
use common::{
    ClientId, CompanyId, OrderId, OrderItemId, OrderStatus, QuoteId, QuoteItemId, QuoteStatus,
    UnitId,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Default brand color of a company.
pub const DEFAULT_BRAND_COLOR: &str = "#2563eb";

/// A company (tenant) issuing quotes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
    pub tax_id: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    /// Path of the logo relative to the logo asset store root.
    pub logo_path: Option<String>,
    pub brand_color: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCompany {
    pub name: String,
    pub tax_id: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub logo_path: Option<String>,
    pub brand_color: String,
    pub active: bool,
}

/// A unit of measure referenced by quote line items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    pub code: String,
    pub description: String,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUnit {
    pub code: String,
    pub description: String,
    pub active: bool,
}

/// A client, shared across quotes and identified by tax id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub name: String,
    pub tax_id: String,
    pub address: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewClient {
    pub name: String,
    pub tax_id: String,
    pub address: String,
    pub phone: Option<String>,
    pub email: Option<String>,
}

/// A stored quote header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteRow {
    pub id: QuoteId,
    pub company_id: CompanyId,
    pub client_id: ClientId,
    pub number: String,
    pub issue_date: NaiveDate,
    pub expiry_date: Option<NaiveDate>,
    pub validity_days: i32,
    pub delivery_terms: String,
    pub status: QuoteStatus,
    pub notes: String,
    pub discount: Decimal,
    pub total: Decimal,
    pub locked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A quote header to insert. New quotes are always unlocked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewQuote {
    pub company_id: CompanyId,
    pub client_id: ClientId,
    pub number: String,
    pub issue_date: NaiveDate,
    pub expiry_date: Option<NaiveDate>,
    pub validity_days: i32,
    pub delivery_terms: String,
    pub status: QuoteStatus,
    pub notes: String,
    pub discount: Decimal,
    pub total: Decimal,
}

/// A stored quote line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteItemRow {
    pub id: QuoteItemId,
    pub quote_id: QuoteId,
    pub sequence: i32,
    pub unit_id: UnitId,
    pub quantity: Decimal,
    pub description: String,
    pub brand: Option<String>,
    pub unit_price: Decimal,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewQuoteItem {
    pub quote_id: QuoteId,
    pub sequence: i32,
    pub unit_id: UnitId,
    pub quantity: Decimal,
    pub description: String,
    pub brand: Option<String>,
    pub unit_price: Decimal,
    pub total: Decimal,
}

/// Filter for listing quotes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuoteFilter {
    pub company_id: Option<CompanyId>,
    pub status: Option<QuoteStatus>,
}

impl QuoteFilter {
    pub fn matches(&self, row: &QuoteRow) -> bool {
        self.company_id.is_none_or(|id| row.company_id == id)
            && self.status.is_none_or(|status| row.status == status)
    }
}

/// A stored purchase order header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRow {
    pub id: OrderId,
    pub buyer: String,
    pub tender_number: String,
    pub commitment_number: Option<String>,
    pub order_date: NaiveDate,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    pub buyer: String,
    pub tender_number: String,
    pub commitment_number: Option<String>,
    pub order_date: NaiveDate,
    pub status: OrderStatus,
}

/// A stored purchase order line item. `unit` is a free-text code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItemRow {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub sequence: i32,
    pub description: String,
    pub unit: String,
    pub quantity: Decimal,
    pub brand: Option<String>,
    pub unit_price: Decimal,
    pub total: Decimal,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrderItem {
    pub order_id: OrderId,
    pub sequence: i32,
    pub description: String,
    pub unit: String,
    pub quantity: Decimal,
    pub brand: Option<String>,
    pub unit_price: Decimal,
    pub total: Decimal,
    pub notes: Option<String>,
}
