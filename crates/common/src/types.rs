use serde::{Deserialize, Serialize};

/// Declares a row identifier newtype.
///
/// Identifiers are assigned by the store in creation order, so comparing two
/// ids of the same kind tells which row was inserted first.
macro_rules! row_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wraps a raw store identifier.
            pub fn new(value: i64) -> Self {
                Self(value)
            }

            /// Returns the raw identifier.
            pub fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

row_id!(
    /// Identifier of a company (tenant).
    CompanyId
);
row_id!(
    /// Identifier of a client.
    ClientId
);
row_id!(
    /// Identifier of a unit of measure.
    UnitId
);
row_id!(
    /// Identifier of a quote.
    QuoteId
);
row_id!(
    /// Identifier of a quote line item.
    QuoteItemId
);
row_id!(
    /// Identifier of a purchase order.
    OrderId
);
row_id!(
    /// Identifier of a purchase order line item.
    OrderItemId
);
