//! Purchase order commands.

use chrono::NaiveDate;
use common::OrderStatus;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use store::NewOrder;

use crate::error::{ValidationError, max_len, optional, require};
use crate::money;

/// Command to register a purchase order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOrder {
    /// The buying organization.
    pub buyer: String,

    pub tender_number: String,

    /// Commitment ("empenho") number, when already issued.
    #[serde(default)]
    pub commitment_number: Option<String>,

    pub order_date: NaiveDate,

    /// Initial status. Defaults to open.
    #[serde(default)]
    pub status: Option<OrderStatus>,
}

impl CreateOrder {
    pub fn new(
        buyer: impl Into<String>,
        tender_number: impl Into<String>,
        order_date: NaiveDate,
    ) -> Self {
        Self {
            buyer: buyer.into(),
            tender_number: tender_number.into(),
            commitment_number: None,
            order_date,
            status: None,
        }
    }

    pub fn validate(&self) -> Result<NewOrder, ValidationError> {
        let buyer = require("buyer", &self.buyer)?;
        max_len("buyer", &buyer, 255)?;
        let tender_number = require("tender_number", &self.tender_number)?;
        max_len("tender_number", &tender_number, 50)?;
        let commitment_number = optional(self.commitment_number.as_deref());
        if let Some(number) = &commitment_number {
            max_len("commitment_number", number, 50)?;
        }

        Ok(NewOrder {
            buyer,
            tender_number,
            commitment_number,
            order_date: self.order_date,
            status: self.status.unwrap_or_default(),
        })
    }
}

/// One purchase order item as submitted. `unit` is a free-text code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItemInput {
    #[serde(default)]
    pub sequence: Option<i32>,
    pub description: String,
    pub unit: String,
    pub quantity: Decimal,
    #[serde(default)]
    pub brand: Option<String>,
    pub unit_price: Decimal,
    #[serde(default)]
    pub notes: Option<String>,
}

impl OrderItemInput {
    pub fn new(
        description: impl Into<String>,
        unit: impl Into<String>,
        quantity: Decimal,
        unit_price: Decimal,
    ) -> Self {
        Self {
            sequence: None,
            description: description.into(),
            unit: unit.into(),
            quantity,
            brand: None,
            unit_price,
            notes: None,
        }
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

        let unit = require("unit", &self.unit)?;
        max_len("unit", &unit, 10)?;
        let brand = optional(self.brand.as_deref());
        if let Some(brand) = &brand {
            max_len("brand", brand, 100)?;
        }

        Ok(Self {
            sequence: self.sequence,
            description: require("description", &self.description)?,
            unit,
            quantity: money::amount("quantity", self.quantity)?,
            brand,
            unit_price: money::amount("unit_price", self.unit_price)?,
            notes: optional(self.notes.as_deref()),
        })
    }
}
