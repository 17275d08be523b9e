use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::{ClientId, CompanyId, OrderId, OrderItemId, QuoteId, QuoteItemId, UnitId};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::records::{
    Client, Company, NewClient, NewCompany, NewOrder, NewOrderItem, NewQuote, NewQuoteItem,
    NewUnit, OrderItemRow, OrderRow, QuoteFilter, QuoteItemRow, QuoteRow, Unit,
};
use crate::store::{Store, UnitOfWork, constraints};
use crate::{Result, StoreError};

/// Every table of the store, keyed by id.
#[derive(Debug, Clone, Default)]
struct Tables {
    last_id: i64,
    companies: BTreeMap<i64, Company>,
    units: BTreeMap<i64, Unit>,
    clients: BTreeMap<i64, Client>,
    quotes: BTreeMap<i64, QuoteRow>,
    quote_items: BTreeMap<i64, QuoteItemRow>,
    orders: BTreeMap<i64, OrderRow>,
    order_items: BTreeMap<i64, OrderItemRow>,
}

impl Tables {
    /// Ids are drawn from one counter shared by all tables; gaps within a
    /// table are expected, only creation order matters.
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }
}

fn unique(constraint: &str) -> StoreError {
    StoreError::UniqueViolation {
        constraint: constraint.to_string(),
    }
}

fn foreign_key(constraint: &str) -> StoreError {
    StoreError::ForeignKeyViolation {
        constraint: constraint.to_string(),
    }
}

/// In-memory store implementation.
///
/// Units of work are serialized: [`Store::begin`] waits until the previous
/// unit of work is committed or dropped, then works on a private copy of the
/// tables that replaces the shared state on commit.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored quotes.
    pub async fn quote_count(&self) -> usize {
        self.tables.lock().await.quotes.len()
    }

    /// Clears every table.
    pub async fn clear(&self) {
        *self.tables.lock().await = Tables::default();
    }
}

#[async_trait]
impl Store for InMemoryStore {
    type Tx = InMemoryTransaction;

    async fn begin(&self) -> Result<Self::Tx> {
        let guard = self.tables.clone().lock_owned().await;
        let work = guard.clone();
        Ok(InMemoryTransaction { guard, work })
    }
}

/// Unit of work over an [`InMemoryStore`].
pub struct InMemoryTransaction {
    guard: OwnedMutexGuard<Tables>,
    work: Tables,
}

#[async_trait]
impl UnitOfWork for InMemoryTransaction {
    async fn insert_company(&mut self, company: NewCompany) -> Result<Company> {
        let id = self.work.next_id();
        let row = Company {
            id: CompanyId::new(id),
            name: company.name,
            tax_id: company.tax_id,
            address: company.address,
            phone: company.phone,
            email: company.email,
            logo_path: company.logo_path,
            brand_color: company.brand_color,
            active: company.active,
            created_at: Utc::now(),
        };
        self.work.companies.insert(id, row.clone());
        Ok(row)
    }

    async fn get_company(&mut self, id: CompanyId) -> Result<Option<Company>> {
        Ok(self.work.companies.get(&id.as_i64()).cloned())
    }

    async fn list_companies(&mut self, active_only: bool) -> Result<Vec<Company>> {
        let mut companies: Vec<_> = self
            .work
            .companies
            .values()
            .filter(|c| !active_only || c.active)
            .cloned()
            .collect();
        companies.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(companies)
    }

    async fn update_company(&mut self, company: &Company) -> Result<()> {
        let stored = self
            .work
            .companies
            .get_mut(&company.id.as_i64())
            .ok_or(StoreError::NotFound {
                entity: "Company",
                id: company.id.as_i64(),
            })?;
        *stored = Company {
            created_at: stored.created_at,
            ..company.clone()
        };
        Ok(())
    }

    async fn delete_company(&mut self, id: CompanyId) -> Result<()> {
        if !self.work.companies.contains_key(&id.as_i64()) {
            return Err(StoreError::NotFound {
                entity: "Company",
                id: id.as_i64(),
            });
        }
        if self.work.quotes.values().any(|q| q.company_id == id) {
            return Err(foreign_key(constraints::QUOTE_COMPANY));
        }
        self.work.companies.remove(&id.as_i64());
        Ok(())
    }

    async fn insert_unit(&mut self, unit: NewUnit) -> Result<Unit> {
        if self.work.units.values().any(|u| u.code == unit.code) {
            return Err(unique(constraints::UNIT_CODE));
        }
        let id = self.work.next_id();
        let row = Unit {
            id: UnitId::new(id),
            code: unit.code,
            description: unit.description,
            active: unit.active,
        };
        self.work.units.insert(id, row.clone());
        Ok(row)
    }

    async fn get_unit(&mut self, id: UnitId) -> Result<Option<Unit>> {
        Ok(self.work.units.get(&id.as_i64()).cloned())
    }

    async fn list_units(&mut self, active_only: bool) -> Result<Vec<Unit>> {
        let mut units: Vec<_> = self
            .work
            .units
            .values()
            .filter(|u| !active_only || u.active)
            .cloned()
            .collect();
        units.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(units)
    }

    async fn update_unit(&mut self, unit: &Unit) -> Result<()> {
        if self
            .work
            .units
            .values()
            .any(|u| u.code == unit.code && u.id != unit.id)
        {
            return Err(unique(constraints::UNIT_CODE));
        }
        let stored = self
            .work
            .units
            .get_mut(&unit.id.as_i64())
            .ok_or(StoreError::NotFound {
                entity: "Unit",
                id: unit.id.as_i64(),
            })?;
        *stored = unit.clone();
        Ok(())
    }

    async fn delete_unit(&mut self, id: UnitId) -> Result<()> {
        if !self.work.units.contains_key(&id.as_i64()) {
            return Err(StoreError::NotFound {
                entity: "Unit",
                id: id.as_i64(),
            });
        }
        if self.work.quote_items.values().any(|i| i.unit_id == id) {
            return Err(foreign_key(constraints::QUOTE_ITEM_UNIT));
        }
        self.work.units.remove(&id.as_i64());
        Ok(())
    }

    async fn insert_client(&mut self, client: NewClient) -> Result<Client> {
        if self.work.clients.values().any(|c| c.tax_id == client.tax_id) {
            return Err(unique(constraints::CLIENT_TAX_ID));
        }
        let id = self.work.next_id();
        let now = Utc::now();
        let row = Client {
            id: ClientId::new(id),
            name: client.name,
            tax_id: client.tax_id,
            address: client.address,
            phone: client.phone,
            email: client.email,
            created_at: now,
            updated_at: now,
        };
        self.work.clients.insert(id, row.clone());
        Ok(row)
    }

    async fn get_client(&mut self, id: ClientId) -> Result<Option<Client>> {
        Ok(self.work.clients.get(&id.as_i64()).cloned())
    }

    async fn find_client_by_tax_id(&mut self, tax_id: &str) -> Result<Option<Client>> {
        Ok(self
            .work
            .clients
            .values()
            .find(|c| c.tax_id == tax_id)
            .cloned())
    }

    async fn list_clients(&mut self) -> Result<Vec<Client>> {
        let mut clients: Vec<_> = self.work.clients.values().cloned().collect();
        clients.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(clients)
    }

    async fn update_client(&mut self, client: &Client) -> Result<Client> {
        if self
            .work
            .clients
            .values()
            .any(|c| c.tax_id == client.tax_id && c.id != client.id)
        {
            return Err(unique(constraints::CLIENT_TAX_ID));
        }
        let stored = self
            .work
            .clients
            .get_mut(&client.id.as_i64())
            .ok_or(StoreError::NotFound {
                entity: "Client",
                id: client.id.as_i64(),
            })?;
        *stored = Client {
            created_at: stored.created_at,
            updated_at: Utc::now(),
            ..client.clone()
        };
        Ok(stored.clone())
    }

    async fn delete_client(&mut self, id: ClientId) -> Result<()> {
        if !self.work.clients.contains_key(&id.as_i64()) {
            return Err(StoreError::NotFound {
                entity: "Client",
                id: id.as_i64(),
            });
        }
        if self.work.quotes.values().any(|q| q.client_id == id) {
            return Err(foreign_key(constraints::QUOTE_CLIENT));
        }
        self.work.clients.remove(&id.as_i64());
        Ok(())
    }

    async fn insert_quote(&mut self, quote: NewQuote) -> Result<QuoteRow> {
        if !self.work.companies.contains_key(&quote.company_id.as_i64()) {
            return Err(foreign_key(constraints::QUOTE_COMPANY));
        }
        if !self.work.clients.contains_key(&quote.client_id.as_i64()) {
            return Err(foreign_key(constraints::QUOTE_CLIENT));
        }
        if self.work.quotes.values().any(|q| q.number == quote.number) {
            return Err(unique(constraints::QUOTE_NUMBER));
        }
        let id = self.work.next_id();
        let now = Utc::now();
        let row = QuoteRow {
            id: QuoteId::new(id),
            company_id: quote.company_id,
            client_id: quote.client_id,
            number: quote.number,
            issue_date: quote.issue_date,
            expiry_date: quote.expiry_date,
            validity_days: quote.validity_days,
            delivery_terms: quote.delivery_terms,
            status: quote.status,
            notes: quote.notes,
            discount: quote.discount,
            total: quote.total,
            locked: false,
            created_at: now,
            updated_at: now,
        };
        self.work.quotes.insert(id, row.clone());
        Ok(row)
    }

    async fn get_quote(&mut self, id: QuoteId) -> Result<Option<QuoteRow>> {
        Ok(self.work.quotes.get(&id.as_i64()).cloned())
    }

    async fn list_quotes(&mut self, filter: QuoteFilter) -> Result<Vec<QuoteRow>> {
        Ok(self
            .work
            .quotes
            .values()
            .rev()
            .filter(|q| filter.matches(q))
            .cloned()
            .collect())
    }

    async fn quote_numbers_for_company(&mut self, company_id: CompanyId) -> Result<Vec<String>> {
        Ok(self
            .work
            .quotes
            .values()
            .filter(|q| q.company_id == company_id)
            .map(|q| q.number.clone())
            .collect())
    }

    async fn update_quote(&mut self, quote: &QuoteRow) -> Result<QuoteRow> {
        if !self.work.clients.contains_key(&quote.client_id.as_i64()) {
            return Err(foreign_key(constraints::QUOTE_CLIENT));
        }
        let stored = self
            .work
            .quotes
            .get_mut(&quote.id.as_i64())
            .ok_or(StoreError::NotFound {
                entity: "Quote",
                id: quote.id.as_i64(),
            })?;
        *stored = QuoteRow {
            number: stored.number.clone(),
            company_id: stored.company_id,
            issue_date: stored.issue_date,
            created_at: stored.created_at,
            updated_at: Utc::now(),
            ..quote.clone()
        };
        Ok(stored.clone())
    }

    async fn delete_quote(&mut self, id: QuoteId) -> Result<()> {
        if self.work.quotes.remove(&id.as_i64()).is_none() {
            return Err(StoreError::NotFound {
                entity: "Quote",
                id: id.as_i64(),
            });
        }
        self.work.quote_items.retain(|_, item| item.quote_id != id);
        Ok(())
    }

    async fn list_quote_items(&mut self, quote_id: QuoteId) -> Result<Vec<QuoteItemRow>> {
        let mut items: Vec<_> = self
            .work
            .quote_items
            .values()
            .filter(|i| i.quote_id == quote_id)
            .cloned()
            .collect();
        items.sort_by_key(|i| i.sequence);
        Ok(items)
    }

    async fn insert_quote_item(&mut self, item: NewQuoteItem) -> Result<QuoteItemRow> {
        if !self.work.quotes.contains_key(&item.quote_id.as_i64()) {
            return Err(foreign_key(constraints::QUOTE_ITEM_QUOTE));
        }
        if !self.work.units.contains_key(&item.unit_id.as_i64()) {
            return Err(foreign_key(constraints::QUOTE_ITEM_UNIT));
        }
        if self
            .work
            .quote_items
            .values()
            .any(|i| i.quote_id == item.quote_id && i.sequence == item.sequence)
        {
            return Err(unique(constraints::QUOTE_ITEM_SEQUENCE));
        }
        let id = self.work.next_id();
        let row = QuoteItemRow {
            id: QuoteItemId::new(id),
            quote_id: item.quote_id,
            sequence: item.sequence,
            unit_id: item.unit_id,
            quantity: item.quantity,
            description: item.description,
            brand: item.brand,
            unit_price: item.unit_price,
            total: item.total,
        };
        self.work.quote_items.insert(id, row.clone());
        Ok(row)
    }

    async fn delete_quote_item(&mut self, quote_id: QuoteId, sequence: i32) -> Result<bool> {
        let key = self
            .work
            .quote_items
            .iter()
            .find(|(_, i)| i.quote_id == quote_id && i.sequence == sequence)
            .map(|(key, _)| *key);
        Ok(match key {
            Some(key) => self.work.quote_items.remove(&key).is_some(),
            None => false,
        })
    }

    async fn delete_quote_items(&mut self, quote_id: QuoteId) -> Result<u64> {
        let before = self.work.quote_items.len();
        self.work.quote_items.retain(|_, i| i.quote_id != quote_id);
        Ok((before - self.work.quote_items.len()) as u64)
    }

    async fn insert_order(&mut self, order: NewOrder) -> Result<OrderRow> {
        let id = self.work.next_id();
        let row = OrderRow {
            id: OrderId::new(id),
            buyer: order.buyer,
            tender_number: order.tender_number,
            commitment_number: order.commitment_number,
            order_date: order.order_date,
            status: order.status,
            created_at: Utc::now(),
        };
        self.work.orders.insert(id, row.clone());
        Ok(row)
    }

    async fn get_order(&mut self, id: OrderId) -> Result<Option<OrderRow>> {
        Ok(self.work.orders.get(&id.as_i64()).cloned())
    }

    async fn list_orders(&mut self) -> Result<Vec<OrderRow>> {
        let mut orders: Vec<_> = self.work.orders.values().cloned().collect();
        orders.sort_by(|a, b| a.order_date.cmp(&b.order_date).then(a.id.cmp(&b.id)));
        Ok(orders)
    }

    async fn update_order(&mut self, order: &OrderRow) -> Result<()> {
        let stored = self
            .work
            .orders
            .get_mut(&order.id.as_i64())
            .ok_or(StoreError::NotFound {
                entity: "Order",
                id: order.id.as_i64(),
            })?;
        *stored = OrderRow {
            created_at: stored.created_at,
            ..order.clone()
        };
        Ok(())
    }

    async fn list_order_items(&mut self, order_id: OrderId) -> Result<Vec<OrderItemRow>> {
        let mut items: Vec<_> = self
            .work
            .order_items
            .values()
            .filter(|i| i.order_id == order_id)
            .cloned()
            .collect();
        items.sort_by_key(|i| i.sequence);
        Ok(items)
    }

    async fn insert_order_item(&mut self, item: NewOrderItem) -> Result<OrderItemRow> {
        if !self.work.orders.contains_key(&item.order_id.as_i64()) {
            return Err(foreign_key(constraints::ORDER_ITEM_ORDER));
        }
        if self
            .work
            .order_items
            .values()
            .any(|i| i.order_id == item.order_id && i.sequence == item.sequence)
        {
            return Err(unique(constraints::ORDER_ITEM_SEQUENCE));
        }
        let id = self.work.next_id();
        let row = OrderItemRow {
            id: OrderItemId::new(id),
            order_id: item.order_id,
            sequence: item.sequence,
            description: item.description,
            unit: item.unit,
            quantity: item.quantity,
            brand: item.brand,
            unit_price: item.unit_price,
            total: item.total,
            notes: item.notes,
        };
        self.work.order_items.insert(id, row.clone());
        Ok(row)
    }

    async fn commit(self) -> Result<()> {
        let Self { mut guard, work } = self;
        *guard = work;
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        tracing::debug!("Discarding in-memory unit of work");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use common::QuoteStatus;
    use rust_decimal_macros::dec;

    fn new_company(name: &str) -> NewCompany {
        NewCompany {
            name: name.to_string(),
            tax_id: None,
            address: None,
            phone: None,
            email: None,
            logo_path: None,
            brand_color: crate::records::DEFAULT_BRAND_COLOR.to_string(),
            active: true,
        }
    }

    fn new_client(tax_id: &str) -> NewClient {
        NewClient {
            name: "Client".to_string(),
            tax_id: tax_id.to_string(),
            address: "Street 1".to_string(),
            phone: None,
            email: None,
        }
    }

    fn new_quote(company_id: CompanyId, client_id: ClientId, number: &str) -> NewQuote {
        NewQuote {
            company_id,
            client_id,
            number: number.to_string(),
            issue_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            expiry_date: None,
            validity_days: 15,
            delivery_terms: "A Combinar".to_string(),
            status: QuoteStatus::Draft,
            notes: String::new(),
            discount: dec!(0),
            total: dec!(0),
        }
    }

    async fn seed(store: &InMemoryStore) -> (CompanyId, ClientId, UnitId) {
        let mut tx = store.begin().await.unwrap();
        let company = tx.insert_company(new_company("Acme")).await.unwrap();
        let client = tx.insert_client(new_client("123")).await.unwrap();
        let unit = tx
            .insert_unit(NewUnit {
                code: "UN".to_string(),
                description: "Unidade".to_string(),
                active: true,
            })
            .await
            .unwrap();
        tx.commit().await.unwrap();
        (company.id, client.id, unit.id)
    }

    #[tokio::test]
    async fn committed_writes_are_visible() {
        let store = InMemoryStore::new();
        let (company_id, _, _) = seed(&store).await;

        let mut tx = store.begin().await.unwrap();
        let company = tx.get_company(company_id).await.unwrap();
        assert_eq!(company.unwrap().name, "Acme");
    }

    #[tokio::test]
    async fn dropped_transaction_discards_writes() {
        let store = InMemoryStore::new();
        {
            let mut tx = store.begin().await.unwrap();
            tx.insert_company(new_company("Ghost")).await.unwrap();
        }

        let mut tx = store.begin().await.unwrap();
        assert!(tx.list_companies(false).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn rollback_discards_writes() {
        let store = InMemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        tx.insert_client(new_client("999")).await.unwrap();
        tx.rollback().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        assert!(tx.find_client_by_tax_id("999").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn quote_number_is_unique() {
        let store = InMemoryStore::new();
        let (company_id, client_id, _) = seed(&store).await;

        let mut tx = store.begin().await.unwrap();
        tx.insert_quote(new_quote(company_id, client_id, "ORC-1-00001"))
            .await
            .unwrap();
        let result = tx
            .insert_quote(new_quote(company_id, client_id, "ORC-1-00001"))
            .await;

        assert!(matches!(
            result,
            Err(ref e) if e.is_unique_violation_of(constraints::QUOTE_NUMBER)
        ));
    }

    #[tokio::test]
    async fn client_tax_id_is_unique() {
        let store = InMemoryStore::new();
        seed(&store).await;

        let mut tx = store.begin().await.unwrap();
        let result = tx.insert_client(new_client("123")).await;
        assert!(matches!(result, Err(StoreError::UniqueViolation { .. })));
    }

    #[tokio::test]
    async fn item_sequence_is_unique_per_quote() {
        let store = InMemoryStore::new();
        let (company_id, client_id, unit_id) = seed(&store).await;

        let mut tx = store.begin().await.unwrap();
        let quote = tx
            .insert_quote(new_quote(company_id, client_id, "ORC-1-00001"))
            .await
            .unwrap();
        let item = NewQuoteItem {
            quote_id: quote.id,
            sequence: 1,
            unit_id,
            quantity: dec!(1),
            description: "Item".to_string(),
            brand: None,
            unit_price: dec!(2.50),
            total: dec!(2.50),
        };
        tx.insert_quote_item(item.clone()).await.unwrap();
        let result = tx.insert_quote_item(item).await;

        assert!(matches!(
            result,
            Err(ref e) if e.is_unique_violation_of(constraints::QUOTE_ITEM_SEQUENCE)
        ));
    }

    #[tokio::test]
    async fn deleting_quote_cascades_to_items() {
        let store = InMemoryStore::new();
        let (company_id, client_id, unit_id) = seed(&store).await;

        let mut tx = store.begin().await.unwrap();
        let quote = tx
            .insert_quote(new_quote(company_id, client_id, "ORC-1-00001"))
            .await
            .unwrap();
        tx.insert_quote_item(NewQuoteItem {
            quote_id: quote.id,
            sequence: 1,
            unit_id,
            quantity: dec!(1),
            description: "Item".to_string(),
            brand: None,
            unit_price: dec!(1),
            total: dec!(1),
        })
        .await
        .unwrap();

        tx.delete_quote(quote.id).await.unwrap();

        assert!(tx.get_quote(quote.id).await.unwrap().is_none());
        assert!(tx.list_quote_items(quote.id).await.unwrap().is_empty());
        // The unit is no longer referenced and may go.
        tx.delete_unit(unit_id).await.unwrap();
    }

    #[tokio::test]
    async fn referenced_rows_are_protected() {
        let store = InMemoryStore::new();
        let (company_id, client_id, _) = seed(&store).await;

        let mut tx = store.begin().await.unwrap();
        tx.insert_quote(new_quote(company_id, client_id, "ORC-1-00001"))
            .await
            .unwrap();

        assert!(matches!(
            tx.delete_company(company_id).await,
            Err(StoreError::ForeignKeyViolation { .. })
        ));
        assert!(matches!(
            tx.delete_client(client_id).await,
            Err(StoreError::ForeignKeyViolation { .. })
        ));
    }

    #[tokio::test]
    async fn update_quote_keeps_immutable_columns() {
        let store = InMemoryStore::new();
        let (company_id, client_id, _) = seed(&store).await;

        let mut tx = store.begin().await.unwrap();
        let quote = tx
            .insert_quote(new_quote(company_id, client_id, "ORC-1-00001"))
            .await
            .unwrap();

        let mut changed = quote.clone();
        changed.number = "ORC-1-99999".to_string();
        changed.notes = "updated".to_string();
        let stored = tx.update_quote(&changed).await.unwrap();

        assert_eq!(stored.number, "ORC-1-00001");
        assert_eq!(stored.notes, "updated");
        assert!(stored.updated_at >= quote.updated_at);
    }

    #[tokio::test]
    async fn quotes_list_newest_first() {
        let store = InMemoryStore::new();
        let (company_id, client_id, _) = seed(&store).await;

        let mut tx = store.begin().await.unwrap();
        let first = tx
            .insert_quote(new_quote(company_id, client_id, "ORC-1-00001"))
            .await
            .unwrap();
        let second = tx
            .insert_quote(new_quote(company_id, client_id, "ORC-1-00002"))
            .await
            .unwrap();

        let listed = tx.list_quotes(QuoteFilter::default()).await.unwrap();
        let ids: Vec<_> = listed.iter().map(|q| q.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);

        let numbers = tx.quote_numbers_for_company(company_id).await.unwrap();
        assert_eq!(numbers.len(), 2);
    }
}
