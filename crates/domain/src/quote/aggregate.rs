//! Quote aggregate implementation.

use common::{ClientId, CompanyId, QuoteId, QuoteStatus};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use store::{NewQuoteItem, QuoteItemRow, QuoteRow};

use crate::error::{DomainError, ValidationError};
use crate::money;

use super::{LineItemInput, QuoteError, QuoteFields};

/// Result of asking for a quote to be converted into an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionOutcome {
    /// The quote was locked by this call.
    Converted,
    /// The quote was already locked; nothing changed.
    AlreadyConverted,
}

/// Quote aggregate root: the header row plus its items ordered by sequence.
///
/// Every mutation goes through [`Quote::ensure_editable`], so a locked quote
/// cannot change through any path other than order generation, which is the
/// operation that locks it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    #[serde(flatten)]
    row: QuoteRow,
    items: Vec<QuoteItemRow>,
}

// Query methods
impl Quote {
    /// Assembles a quote from stored rows.
    pub fn from_parts(row: QuoteRow, mut items: Vec<QuoteItemRow>) -> Self {
        items.sort_by_key(|item| item.sequence);
        Self { row, items }
    }

    pub fn into_parts(self) -> (QuoteRow, Vec<QuoteItemRow>) {
        (self.row, self.items)
    }

    pub fn row(&self) -> &QuoteRow {
        &self.row
    }

    pub fn id(&self) -> QuoteId {
        self.row.id
    }

    pub fn company_id(&self) -> CompanyId {
        self.row.company_id
    }

    pub fn client_id(&self) -> ClientId {
        self.row.client_id
    }

    pub fn number(&self) -> &str {
        &self.row.number
    }

    pub fn status(&self) -> QuoteStatus {
        self.row.status
    }

    pub fn is_locked(&self) -> bool {
        self.row.locked
    }

    pub fn discount(&self) -> Decimal {
        self.row.discount
    }

    /// Returns the stored total.
    pub fn total(&self) -> Decimal {
        self.row.total
    }

    /// Returns the items ordered by sequence.
    pub fn items(&self) -> &[QuoteItemRow] {
        &self.items
    }

    pub fn item(&self, sequence: i32) -> Option<&QuoteItemRow> {
        self.items.iter().find(|item| item.sequence == sequence)
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Returns one past the highest item sequence, or 1 for an empty quote.
    ///
    /// Fails once the highest sequence is `i32::MAX`.
    pub fn next_item_sequence(&self) -> Result<i32, ValidationError> {
        match self.items.iter().map(|item| item.sequence).max() {
            None => Ok(1),
            Some(max) => max.checked_add(1).ok_or_else(|| ValidationError::OutOfRange {
                field: "sequence".to_string(),
            }),
        }
    }

    /// Computes `sum(item totals) - discount` from the current items.
    pub fn computed_total(&self) -> Result<Decimal, ValidationError> {
        money::quote_total(self.items.iter().map(|item| item.total), self.row.discount)
    }
}

// Command methods
impl Quote {
    /// The lock check shared by every mutation path.
    pub fn ensure_editable(&self) -> Result<(), QuoteError> {
        if self.row.locked {
            return Err(QuoteError::Locked {
                number: self.row.number.clone(),
            });
        }
        Ok(())
    }

    /// Builds the row for a new item: assigns the sequence when absent and
    /// computes the line total, ignoring any caller-provided total.
    pub fn prepare_item(&self, input: &LineItemInput) -> Result<NewQuoteItem, DomainError> {
        self.ensure_editable().map_err(DomainError::Quote)?;
        let input = input.normalized()?;

        let sequence = match input.sequence {
            Some(sequence) if self.item(sequence).is_some() => {
                return Err(ValidationError::DuplicateItemSequence(sequence).into());
            }
            Some(sequence) => sequence,
            None => self.next_item_sequence()?,
        };

        Ok(NewQuoteItem {
            quote_id: self.row.id,
            sequence,
            unit_id: input.unit_id,
            total: money::line_total(input.quantity, input.unit_price)?,
            quantity: input.quantity,
            description: input.description,
            brand: input.brand,
            unit_price: input.unit_price,
        })
    }

    /// Records a stored item.
    pub(crate) fn push_item(&mut self, item: QuoteItemRow) {
        let at = self
            .items
            .partition_point(|existing| existing.sequence < item.sequence);
        self.items.insert(at, item);
    }

    /// Removes one item by sequence.
    pub fn remove_item(&mut self, sequence: i32) -> Result<QuoteItemRow, QuoteError> {
        self.ensure_editable()?;
        let at = self
            .items
            .iter()
            .position(|item| item.sequence == sequence)
            .ok_or(QuoteError::ItemNotFound { sequence })?;
        Ok(self.items.remove(at))
    }

    /// Drops every item, ahead of a full replacement.
    pub fn clear_items(&mut self) -> Result<(), QuoteError> {
        self.ensure_editable()?;
        self.items.clear();
        Ok(())
    }

    /// Applies edited header fields and the (possibly different) client.
    pub fn apply_fields(&mut self, client_id: ClientId, fields: &QuoteFields) -> Result<(), DomainError> {
        self.ensure_editable().map_err(DomainError::Quote)?;
        let fields = fields.normalized()?;

        self.row.client_id = client_id;
        self.row.validity_days = fields.validity_days;
        self.row.delivery_terms = fields.delivery_terms;
        self.row.notes = fields.notes;
        self.row.discount = fields.discount;
        self.row.expiry_date = fields.expiry_date;
        Ok(())
    }

    /// Changes the discount. The total is recomputed separately.
    pub fn set_discount(&mut self, discount: Decimal) -> Result<(), DomainError> {
        self.ensure_editable().map_err(DomainError::Quote)?;
        self.row.discount = money::amount("discount", discount)?;
        Ok(())
    }

    /// Recomputes and assigns the total from the current items and discount.
    pub fn recompute_total(&mut self) -> Result<Decimal, DomainError> {
        self.ensure_editable().map_err(DomainError::Quote)?;
        self.row.total = self.computed_total()?;
        Ok(self.row.total)
    }

    /// Applies a manual status change.
    pub fn change_status(&mut self, target: QuoteStatus) -> Result<(), QuoteError> {
        self.ensure_editable()?;
        if !self.row.status.can_transition_to(target) {
            return Err(QuoteError::InvalidStateTransition {
                current_state: self.row.status,
                action: match target {
                    QuoteStatus::Draft => "reopen",
                    QuoteStatus::Sent => "send",
                    QuoteStatus::Approved => "approve",
                    QuoteStatus::Rejected => "reject",
                    QuoteStatus::OrderGenerated => "mark as order",
                    QuoteStatus::Cancelled => "cancel",
                },
            });
        }
        self.row.status = target;
        Ok(())
    }

    /// Converts the quote into an order: freezes the total, sets the status
    /// to `pedido` and locks it for good.
    ///
    /// Converting a locked quote is not an error and leaves it untouched.
    pub fn generate_order(&mut self) -> Result<ConversionOutcome, DomainError> {
        if self.row.locked {
            return Ok(ConversionOutcome::AlreadyConverted);
        }
        if !self.row.status.can_generate_order() {
            return Err(DomainError::Quote(QuoteError::InvalidStateTransition {
                current_state: self.row.status,
                action: "generate order",
            }));
        }

        self.row.total = self.computed_total()?;
        self.row.status = QuoteStatus::OrderGenerated;
        self.row.locked = true;
        Ok(ConversionOutcome::Converted)
    }
}
