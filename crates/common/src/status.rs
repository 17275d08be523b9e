//! Quote and purchase order status vocabularies.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A status token that does not belong to the vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown {kind} status: {token}")]
pub struct UnknownStatus {
    pub kind: &'static str,
    pub token: String,
}

/// The status of a quote in its lifecycle.
///
/// Manual transitions:
/// ```text
/// Draft ──► Sent ──┬──► Approved ──► Cancelled
///   │              ├──► Rejected
///   │              └──► Cancelled
///   └──► Cancelled
/// ```
/// `OrderGenerated` is reached only through order generation, from any
/// non-terminal status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum QuoteStatus {
    /// Being prepared.
    #[default]
    #[serde(rename = "rascunho")]
    Draft,

    /// Sent to the client.
    #[serde(rename = "enviado")]
    Sent,

    /// Accepted by the client.
    #[serde(rename = "aprovado")]
    Approved,

    /// Refused by the client (terminal state).
    #[serde(rename = "rejeitado")]
    Rejected,

    /// Converted into an order; the quote is locked (terminal state).
    #[serde(rename = "pedido")]
    OrderGenerated,

    /// Withdrawn (terminal state).
    #[serde(rename = "cancelado")]
    Cancelled,
}

impl QuoteStatus {
    pub const ALL: [QuoteStatus; 6] = [
        QuoteStatus::Draft,
        QuoteStatus::Sent,
        QuoteStatus::Approved,
        QuoteStatus::Rejected,
        QuoteStatus::OrderGenerated,
        QuoteStatus::Cancelled,
    ];

    /// Returns the stored token.
    pub fn as_str(&self) -> &'static str {
        match self {
            QuoteStatus::Draft => "rascunho",
            QuoteStatus::Sent => "enviado",
            QuoteStatus::Approved => "aprovado",
            QuoteStatus::Rejected => "rejeitado",
            QuoteStatus::OrderGenerated => "pedido",
            QuoteStatus::Cancelled => "cancelado",
        }
    }

    /// Returns the human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            QuoteStatus::Draft => "Rascunho",
            QuoteStatus::Sent => "Enviado",
            QuoteStatus::Approved => "Aprovado",
            QuoteStatus::Rejected => "Rejeitado",
            QuoteStatus::OrderGenerated => "Pedido Gerado",
            QuoteStatus::Cancelled => "Cancelado",
        }
    }

    /// Returns true if this is a terminal state (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            QuoteStatus::Rejected | QuoteStatus::OrderGenerated | QuoteStatus::Cancelled
        )
    }

    /// Returns true if a manual status change from `self` to `target` is allowed.
    ///
    /// Never true for `OrderGenerated`, which only order generation may set.
    pub fn can_transition_to(&self, target: QuoteStatus) -> bool {
        matches!(
            (self, target),
            (QuoteStatus::Draft, QuoteStatus::Sent)
                | (QuoteStatus::Draft, QuoteStatus::Cancelled)
                | (QuoteStatus::Sent, QuoteStatus::Approved)
                | (QuoteStatus::Sent, QuoteStatus::Rejected)
                | (QuoteStatus::Sent, QuoteStatus::Cancelled)
                | (QuoteStatus::Approved, QuoteStatus::Cancelled)
        )
    }

    /// Returns true if order generation may start from this state.
    pub fn can_generate_order(&self) -> bool {
        !self.is_terminal()
    }
}

impl std::fmt::Display for QuoteStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for QuoteStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        QuoteStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus {
                kind: "quote",
                token: s.to_string(),
            })
    }
}

/// The status of a purchase order.
///
/// ```text
/// Open ──┬──► Fulfilled
///        └──► Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    #[default]
    #[serde(rename = "aberto")]
    Open,

    #[serde(rename = "atendido")]
    Fulfilled,

    #[serde(rename = "cancelado")]
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 3] = [
        OrderStatus::Open,
        OrderStatus::Fulfilled,
        OrderStatus::Cancelled,
    ];

    /// Returns the stored token.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Open => "aberto",
            OrderStatus::Fulfilled => "atendido",
            OrderStatus::Cancelled => "cancelado",
        }
    }

    /// Returns the human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            OrderStatus::Open => "Aberto",
            OrderStatus::Fulfilled => "Atendido",
            OrderStatus::Cancelled => "Cancelado",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Fulfilled | OrderStatus::Cancelled)
    }

    pub fn can_transition_to(&self, target: OrderStatus) -> bool {
        matches!(
            (self, target),
            (OrderStatus::Open, OrderStatus::Fulfilled) | (OrderStatus::Open, OrderStatus::Cancelled)
        )
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus {
                kind: "order",
                token: s.to_string(),
            })
    }
}
