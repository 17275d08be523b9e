//! Purchase order aggregate implementation.

use common::{OrderId, OrderStatus};
use rust_decimal::Decimal;
use serde::Serialize;
use store::{NewOrderItem, OrderItemRow, OrderRow};

use crate::error::{DomainError, ValidationError};
use crate::money;

use super::{OrderError, OrderItemInput};

/// Purchase order aggregate root.
///
/// The total is never stored; it is the sum of the line totals and is kept
/// in step with the items held here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Order {
    #[serde(flatten)]
    row: OrderRow,
    items: Vec<OrderItemRow>,
    total: Decimal,
}

fn sum_totals(items: &[OrderItemRow]) -> Decimal {
    items.iter().map(|item| item.total).sum()
}

// Query methods
impl Order {
    /// Assembles an order from stored rows.
    pub fn from_parts(row: OrderRow, mut items: Vec<OrderItemRow>) -> Self {
        items.sort_by_key(|item| item.sequence);
        let total = sum_totals(&items);
        Self { row, items, total }
    }

    pub fn row(&self) -> &OrderRow {
        &self.row
    }

    pub fn id(&self) -> OrderId {
        self.row.id
    }

    pub fn status(&self) -> OrderStatus {
        self.row.status
    }

    /// Returns the items ordered by sequence.
    pub fn items(&self) -> &[OrderItemRow] {
        &self.items
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Returns the sum of the line totals.
    pub fn total(&self) -> Decimal {
        self.total
    }

    /// Returns one past the highest item sequence, or 1 for an empty order.
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
}

// Command methods
impl Order {
    /// Builds the row for a new item: assigns the sequence when absent and
    /// computes the line total.
    pub fn prepare_item(&self, input: &OrderItemInput) -> Result<NewOrderItem, DomainError> {
        if self.row.status != OrderStatus::Open {
            return Err(DomainError::Order(OrderError::Closed {
                current_state: self.row.status,
            }));
        }
        let input = input.normalized()?;

        let sequence = match input.sequence {
            Some(sequence) if self.items.iter().any(|item| item.sequence == sequence) => {
                return Err(ValidationError::DuplicateItemSequence(sequence).into());
            }
            Some(sequence) => sequence,
            None => self.next_item_sequence()?,
        };

        Ok(NewOrderItem {
            order_id: self.row.id,
            sequence,
            total: money::line_total(input.quantity, input.unit_price)?,
            description: input.description,
            unit: input.unit,
            quantity: input.quantity,
            brand: input.brand,
            unit_price: input.unit_price,
            notes: input.notes,
        })
    }

    /// Records a stored item.
    pub(crate) fn push_item(&mut self, item: OrderItemRow) {
        let at = self
            .items
            .partition_point(|existing| existing.sequence < item.sequence);
        self.items.insert(at, item);
        self.total = sum_totals(&self.items);
    }

    /// Moves the order to a new status.
    pub fn change_status(&mut self, target: OrderStatus) -> Result<(), OrderError> {
        if !self.row.status.can_transition_to(target) {
            return Err(OrderError::InvalidStateTransition {
                current_state: self.row.status,
                target,
            });
        }
        self.row.status = target;
        Ok(())
    }
}
