//! Quote commands.

use chrono::NaiveDate;
use common::{CompanyId, QuoteId, UnitId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::ClientInput;
use crate::error::{ValidationError, max_len, optional, require};
use crate::money;

/// Validity of a new quote, in days.
pub const DEFAULT_VALIDITY_DAYS: i32 = 15;

/// Delivery terms of a new quote ("to be agreed").
pub const DEFAULT_DELIVERY_TERMS: &str = "A Combinar";

/// Editable header fields of a quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteFields {
    pub validity_days: i32,
    pub delivery_terms: String,
    pub notes: String,
    pub discount: Decimal,
    pub expiry_date: Option<NaiveDate>,
}

impl Default for QuoteFields {
    fn default() -> Self {
        Self {
            validity_days: DEFAULT_VALIDITY_DAYS,
            delivery_terms: DEFAULT_DELIVERY_TERMS.to_string(),
            notes: String::new(),
            discount: Decimal::ZERO,
            expiry_date: None,
        }
    }
}

impl QuoteFields {
    /// Returns a trimmed copy with the discount rounded for storage.
    ///
    /// Blank delivery terms fall back to the default.
    pub fn normalized(&self) -> Result<Self, ValidationError> {
        if self.validity_days < 0 {
            return Err(ValidationError::Negative {
                field: "validity_days".to_string(),
            });
        }

        let delivery_terms = optional(Some(&self.delivery_terms))
            .unwrap_or_else(|| DEFAULT_DELIVERY_TERMS.to_string());
        max_len("delivery_terms", &delivery_terms, 100)?;

        Ok(Self {
            validity_days: self.validity_days,
            delivery_terms,
            notes: self.notes.trim().to_string(),
            discount: money::amount("discount", self.discount)?,
            expiry_date: self.expiry_date,
        })
    }
}

/// One line item as submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemInput {
    /// Explicit sequence number. Assigned automatically when absent.
    #[serde(default)]
    pub sequence: Option<i32>,
    pub unit_id: UnitId,
    pub quantity: Decimal,
    pub description: String,
    #[serde(default)]
    pub brand: Option<String>,
    pub unit_price: Decimal,
}

impl LineItemInput {
    pub fn new(
        unit_id: UnitId,
        quantity: Decimal,
        description: impl Into<String>,
        unit_price: Decimal,
    ) -> Self {
        Self {
            sequence: None,
            unit_id,
            quantity,
            description: description.into(),
            brand: None,
            unit_price,
        }
    }

    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    /// Returns a trimmed copy with amounts rounded for storage.
    pub fn normalized(&self) -> Result<Self, ValidationError> {
        if let Some(sequence) = self.sequence
            && sequence < 1
        {
            return Err(ValidationError::OutOfRange {
                field: "sequence".to_string(),
            });
        }

        let brand = optional(self.brand.as_deref());
        if let Some(brand) = &brand {
            max_len("brand", brand, 100)?;
        }

        Ok(Self {
            sequence: self.sequence,
            unit_id: self.unit_id,
            quantity: money::amount("quantity", self.quantity)?,
            description: require("description", &self.description)?,
            brand,
            unit_price: money::amount("unit_price", self.unit_price)?,
        })
    }
}

/// Command to create a quote with its client and items.
#[derive(Debug, Clone)]
pub struct CreateQuote {
    /// The company issuing the quote.
    pub company_id: CompanyId,

    /// The client, looked up or created by tax id.
    pub client: ClientInput,

    pub fields: QuoteFields,

    /// Items, saved in order.
    pub items: Vec<LineItemInput>,
}

impl CreateQuote {
    pub fn new(company_id: CompanyId, client: ClientInput) -> Self {
        Self {
            company_id,
            client,
            fields: QuoteFields::default(),
            items: Vec::new(),
        }
    }

    pub fn with_fields(mut self, fields: QuoteFields) -> Self {
        self.fields = fields;
        self
    }

    pub fn with_item(mut self, item: LineItemInput) -> Self {
        self.items.push(item);
        self
    }
}

/// Command to edit a quote: updates the linked client, replaces every item.
#[derive(Debug, Clone)]
pub struct UpdateQuote {
    pub quote_id: QuoteId,
    pub client: ClientInput,
    pub fields: QuoteFields,
    pub items: Vec<LineItemInput>,
}

impl UpdateQuote {
    pub fn new(quote_id: QuoteId, client: ClientInput) -> Self {
        Self {
            quote_id,
            client,
            fields: QuoteFields::default(),
            items: Vec::new(),
        }
    }

    pub fn with_fields(mut self, fields: QuoteFields) -> Self {
        self.fields = fields;
        self
    }

    pub fn with_item(mut self, item: LineItemInput) -> Self {
        self.items.push(item);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_fields() {
        let fields = QuoteFields::default();
        assert_eq!(fields.validity_days, 15);
        assert_eq!(fields.delivery_terms, "A Combinar");
        assert_eq!(fields.discount, Decimal::ZERO);
    }

    #[test]
    fn test_blank_delivery_terms_fall_back() {
        let fields = QuoteFields {
            delivery_terms: "   ".to_string(),
            ..QuoteFields::default()
        };
        assert_eq!(fields.normalized().unwrap().delivery_terms, "A Combinar");
    }

    #[test]
    fn test_negative_discount_is_rejected() {
        let fields = QuoteFields {
            discount: dec!(-1),
            ..QuoteFields::default()
        };
        assert!(matches!(
            fields.normalized(),
            Err(ValidationError::Negative { .. })
        ));
    }

    #[test]
    fn test_item_requires_description() {
        let item = LineItemInput::new(UnitId::new(1), dec!(1), "  ", dec!(1));
        assert_eq!(
            item.normalized().unwrap_err(),
            ValidationError::required("description")
        );
    }

    #[test]
    fn test_item_blank_brand_is_none() {
        let item = LineItemInput::new(UnitId::new(1), dec!(1.005), " Caneta ", dec!(2))
            .with_brand(" ");
        let normalized = item.normalized().unwrap();
        assert_eq!(normalized.brand, None);
        assert_eq!(normalized.description, "Caneta");
        assert_eq!(normalized.quantity, dec!(1.01));
    }

    #[test]
    fn test_item_sequence_must_be_positive() {
        let mut item = LineItemInput::new(UnitId::new(1), dec!(1), "Caneta", dec!(2));
        item.sequence = Some(0);
        assert!(item.normalized().is_err());
    }
}
