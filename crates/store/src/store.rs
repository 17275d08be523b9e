use async_trait::async_trait;
use common::{ClientId, CompanyId, OrderId, QuoteId, UnitId};

use crate::Result;
use crate::records::{
    Client, Company, NewClient, NewCompany, NewOrder, NewOrderItem, NewQuote, NewQuoteItem,
    NewUnit, OrderItemRow, OrderRow, QuoteFilter, QuoteItemRow, QuoteRow, Unit,
};

/// Names of the constraints every store implementation enforces.
///
/// The PostgreSQL schema declares constraints under exactly these names and
/// the in-memory store reports violations with them, so callers can react to
/// a specific collision regardless of the backend.
pub mod constraints {
    pub const UNIT_CODE: &str = "units_code_key";
    pub const CLIENT_TAX_ID: &str = "clients_tax_id_key";
    pub const QUOTE_NUMBER: &str = "quotes_number_key";
    pub const QUOTE_COMPANY: &str = "quotes_company_id_fkey";
    pub const QUOTE_CLIENT: &str = "quotes_client_id_fkey";
    pub const QUOTE_ITEM_SEQUENCE: &str = "quote_items_quote_sequence_key";
    pub const QUOTE_ITEM_QUOTE: &str = "quote_items_quote_id_fkey";
    pub const QUOTE_ITEM_UNIT: &str = "quote_items_unit_id_fkey";
    pub const ORDER_ITEM_SEQUENCE: &str = "order_items_order_sequence_key";
    pub const ORDER_ITEM_ORDER: &str = "order_items_order_id_fkey";
}

/// Entry point of a store implementation.
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait Store: Send + Sync {
    /// The unit of work type handed out by [`Store::begin`].
    type Tx: UnitOfWork;

    /// Starts a unit of work.
    ///
    /// Writes made through the unit of work become visible only after
    /// [`UnitOfWork::commit`]. Dropping it uncommitted discards every write.
    async fn begin(&self) -> Result<Self::Tx>;
}

/// A transactional view of the store.
///
/// Rows are inserted with store-assigned ids in creation order. Listing
/// methods return rows in the order documented on each method.
#[async_trait]
pub trait UnitOfWork: Send {
    // -- Companies --

    async fn insert_company(&mut self, company: NewCompany) -> Result<Company>;

    async fn get_company(&mut self, id: CompanyId) -> Result<Option<Company>>;

    /// Lists companies ordered by name.
    async fn list_companies(&mut self, active_only: bool) -> Result<Vec<Company>>;

    async fn update_company(&mut self, company: &Company) -> Result<()>;

    /// Deletes a company. Refused while quotes reference it.
    async fn delete_company(&mut self, id: CompanyId) -> Result<()>;

    // -- Units of measure --

    async fn insert_unit(&mut self, unit: NewUnit) -> Result<Unit>;

    async fn get_unit(&mut self, id: UnitId) -> Result<Option<Unit>>;

    /// Lists units ordered by code.
    async fn list_units(&mut self, active_only: bool) -> Result<Vec<Unit>>;

    async fn update_unit(&mut self, unit: &Unit) -> Result<()>;

    /// Deletes a unit. Refused while quote items reference it.
    async fn delete_unit(&mut self, id: UnitId) -> Result<()>;

    // -- Clients --

    async fn insert_client(&mut self, client: NewClient) -> Result<Client>;

    async fn get_client(&mut self, id: ClientId) -> Result<Option<Client>>;

    async fn find_client_by_tax_id(&mut self, tax_id: &str) -> Result<Option<Client>>;

    /// Lists clients ordered by name.
    async fn list_clients(&mut self) -> Result<Vec<Client>>;

    /// Updates a client and refreshes its `updated_at`.
    async fn update_client(&mut self, client: &Client) -> Result<Client>;

    /// Deletes a client. Refused while quotes reference it.
    async fn delete_client(&mut self, id: ClientId) -> Result<()>;

    // -- Quotes --

    async fn insert_quote(&mut self, quote: NewQuote) -> Result<QuoteRow>;

    async fn get_quote(&mut self, id: QuoteId) -> Result<Option<QuoteRow>>;

    /// Lists quotes matching the filter, newest first.
    async fn list_quotes(&mut self, filter: QuoteFilter) -> Result<Vec<QuoteRow>>;

    /// Returns every quote number issued for a company.
    async fn quote_numbers_for_company(&mut self, company_id: CompanyId) -> Result<Vec<String>>;

    /// Updates a quote header and refreshes its `updated_at`.
    ///
    /// `number`, `company_id`, `issue_date` and `created_at` are never rewritten.
    async fn update_quote(&mut self, quote: &QuoteRow) -> Result<QuoteRow>;

    /// Deletes a quote together with its items.
    async fn delete_quote(&mut self, id: QuoteId) -> Result<()>;

    // -- Quote items --

    /// Lists a quote's items ordered by sequence.
    async fn list_quote_items(&mut self, quote_id: QuoteId) -> Result<Vec<QuoteItemRow>>;

    async fn insert_quote_item(&mut self, item: NewQuoteItem) -> Result<QuoteItemRow>;

    /// Deletes one item by sequence. Returns false if no such item exists.
    async fn delete_quote_item(&mut self, quote_id: QuoteId, sequence: i32) -> Result<bool>;

    /// Deletes every item of a quote, returning how many were removed.
    async fn delete_quote_items(&mut self, quote_id: QuoteId) -> Result<u64>;

    // -- Purchase orders --

    async fn insert_order(&mut self, order: NewOrder) -> Result<OrderRow>;

    async fn get_order(&mut self, id: OrderId) -> Result<Option<OrderRow>>;

    /// Lists orders ordered by order date, then creation.
    async fn list_orders(&mut self) -> Result<Vec<OrderRow>>;

    async fn update_order(&mut self, order: &OrderRow) -> Result<()>;

    /// Lists an order's items ordered by sequence.
    async fn list_order_items(&mut self, order_id: OrderId) -> Result<Vec<OrderItemRow>>;

    async fn insert_order_item(&mut self, item: NewOrderItem) -> Result<OrderItemRow>;

    // -- Boundary --

    /// Makes every write of this unit of work durable and visible.
    async fn commit(self) -> Result<()>;

    /// Discards every write of this unit of work.
    async fn rollback(self) -> Result<()>;
}
