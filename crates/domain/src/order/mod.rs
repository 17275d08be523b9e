//! Purchase order aggregate and related types.

mod aggregate;
mod commands;
mod service;

pub use aggregate::Order;
pub use commands::{CreateOrder, OrderItemInput};
pub use service::OrderService;

use common::OrderStatus;
use thiserror::Error;

/// Errors that can occur during purchase order operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    /// Order is not in the expected state.
    #[error("Invalid state transition: cannot move from {current_state} to {target}")]
    InvalidStateTransition {
        current_state: OrderStatus,
        target: OrderStatus,
    },

    /// Items can only be added while the order is open.
    #[error("Order is {current_state} and no longer accepts items")]
    Closed { current_state: OrderStatus },
}
