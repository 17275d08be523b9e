use common::QuoteStatus;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use store::{Client, Company, QuoteRow};

/// A quote item with its unit code resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetItem {
    pub sequence: i32,
    pub unit_code: String,
    pub quantity: Decimal,
    pub description: String,
    pub brand: Option<String>,
    pub unit_price: Decimal,
    pub total: Decimal,
}

/// Everything needed to print a quote, loaded in one unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteSheet {
    pub quote: QuoteRow,
    pub company: Company,
    pub client: Client,
    pub items: Vec<SheetItem>,
}

impl QuoteSheet {
    /// True once the quote has been converted into an order.
    pub fn is_order(&self) -> bool {
        self.quote.status == QuoteStatus::OrderGenerated
    }
}
