use async_trait::async_trait;
use common::{
    ClientId, CompanyId, OrderId, OrderItemId, OrderStatus, QuoteId, QuoteItemId, QuoteStatus,
    UnitId,
};
use sqlx::{PgPool, Postgres, Row, Transaction, error::ErrorKind, postgres::PgRow};

use crate::records::{
    Client, Company, NewClient, NewCompany, NewOrder, NewOrderItem, NewQuote, NewQuoteItem,
    NewUnit, OrderItemRow, OrderRow, QuoteFilter, QuoteItemRow, QuoteRow, Unit,
};
use crate::store::{Store, UnitOfWork};
use crate::{Result, StoreError};

const COMPANY_COLUMNS: &str =
    "id, name, tax_id, address, phone, email, logo_path, brand_color, active, created_at";
const CLIENT_COLUMNS: &str = "id, name, tax_id, address, phone, email, created_at, updated_at";
const QUOTE_COLUMNS: &str = "id, company_id, client_id, number, issue_date, expiry_date, \
     validity_days, delivery_terms, status, notes, discount, total, locked, created_at, updated_at";
const QUOTE_ITEM_COLUMNS: &str =
    "id, quote_id, sequence, unit_id, quantity, description, brand, unit_price, total";
const ORDER_COLUMNS: &str =
    "id, buyer, tender_number, commitment_number, order_date, status, created_at";
const ORDER_ITEM_COLUMNS: &str =
    "id, order_id, sequence, description, unit, quantity, brand, unit_price, total, notes";

/// Translates constraint violations into their store variants.
fn map_db_error(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = e {
        let constraint = db_err.constraint().unwrap_or_default().to_string();
        match db_err.kind() {
            ErrorKind::UniqueViolation => return StoreError::UniqueViolation { constraint },
            ErrorKind::ForeignKeyViolation => {
                return StoreError::ForeignKeyViolation { constraint };
            }
            _ => {}
        }
    }
    StoreError::Database(e)
}

/// PostgreSQL-backed store implementation.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects a pool to the given database URL.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl Store for PostgresStore {
    type Tx = PgUnitOfWork;

    async fn begin(&self) -> Result<Self::Tx> {
        Ok(PgUnitOfWork {
            tx: self.pool.begin().await?,
        })
    }
}

/// Unit of work backed by one database transaction.
///
/// Dropping it without committing rolls the transaction back.
pub struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

impl PgUnitOfWork {
    fn row_to_company(row: PgRow) -> Result<Company> {
        Ok(Company {
            id: CompanyId::new(row.try_get("id")?),
            name: row.try_get("name")?,
            tax_id: row.try_get("tax_id")?,
            address: row.try_get("address")?,
            phone: row.try_get("phone")?,
            email: row.try_get("email")?,
            logo_path: row.try_get("logo_path")?,
            brand_color: row.try_get("brand_color")?,
            active: row.try_get("active")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_unit(row: PgRow) -> Result<Unit> {
        Ok(Unit {
            id: UnitId::new(row.try_get("id")?),
            code: row.try_get("code")?,
            description: row.try_get("description")?,
            active: row.try_get("active")?,
        })
    }

    fn row_to_client(row: PgRow) -> Result<Client> {
        Ok(Client {
            id: ClientId::new(row.try_get("id")?),
            name: row.try_get("name")?,
            tax_id: row.try_get("tax_id")?,
            address: row.try_get("address")?,
            phone: row.try_get("phone")?,
            email: row.try_get("email")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_quote(row: PgRow) -> Result<QuoteRow> {
        let status: String = row.try_get("status")?;
        let status = status
            .parse::<QuoteStatus>()
            .map_err(|e| StoreError::Corrupt {
                table: "quotes",
                reason: e.to_string(),
            })?;

        Ok(QuoteRow {
            id: QuoteId::new(row.try_get("id")?),
            company_id: CompanyId::new(row.try_get("company_id")?),
            client_id: ClientId::new(row.try_get("client_id")?),
            number: row.try_get("number")?,
            issue_date: row.try_get("issue_date")?,
            expiry_date: row.try_get("expiry_date")?,
            validity_days: row.try_get("validity_days")?,
            delivery_terms: row.try_get("delivery_terms")?,
            status,
            notes: row.try_get("notes")?,
            discount: row.try_get("discount")?,
            total: row.try_get("total")?,
            locked: row.try_get("locked")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_quote_item(row: PgRow) -> Result<QuoteItemRow> {
        Ok(QuoteItemRow {
            id: QuoteItemId::new(row.try_get("id")?),
            quote_id: QuoteId::new(row.try_get("quote_id")?),
            sequence: row.try_get("sequence")?,
            unit_id: UnitId::new(row.try_get("unit_id")?),
            quantity: row.try_get("quantity")?,
            description: row.try_get("description")?,
            brand: row.try_get("brand")?,
            unit_price: row.try_get("unit_price")?,
            total: row.try_get("total")?,
        })
    }

    fn row_to_order(row: PgRow) -> Result<OrderRow> {
        let status: String = row.try_get("status")?;
        let status = status
            .parse::<OrderStatus>()
            .map_err(|e| StoreError::Corrupt {
                table: "orders",
                reason: e.to_string(),
            })?;

        Ok(OrderRow {
            id: OrderId::new(row.try_get("id")?),
            buyer: row.try_get("buyer")?,
            tender_number: row.try_get("tender_number")?,
            commitment_number: row.try_get("commitment_number")?,
            order_date: row.try_get("order_date")?,
            status,
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_order_item(row: PgRow) -> Result<OrderItemRow> {
        Ok(OrderItemRow {
            id: OrderItemId::new(row.try_get("id")?),
            order_id: OrderId::new(row.try_get("order_id")?),
            sequence: row.try_get("sequence")?,
            description: row.try_get("description")?,
            unit: row.try_get("unit")?,
            quantity: row.try_get("quantity")?,
            brand: row.try_get("brand")?,
            unit_price: row.try_get("unit_price")?,
            total: row.try_get("total")?,
            notes: row.try_get("notes")?,
        })
    }

    /// Deletes one row by id, reporting `NotFound` when nothing was deleted.
    async fn delete_by_id(&mut self, table: &str, entity: &'static str, id: i64) -> Result<()> {
        let result = sqlx::query(&format!("DELETE FROM {table} WHERE id = $1"))
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound { entity, id });
        }
        Ok(())
    }
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn insert_company(&mut self, company: NewCompany) -> Result<Company> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO companies (name, tax_id, address, phone, email, logo_path, brand_color, active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {COMPANY_COLUMNS}
            "#
        ))
        .bind(&company.name)
        .bind(&company.tax_id)
        .bind(&company.address)
        .bind(&company.phone)
        .bind(&company.email)
        .bind(&company.logo_path)
        .bind(&company.brand_color)
        .bind(company.active)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(map_db_error)?;

        Self::row_to_company(row)
    }

    async fn get_company(&mut self, id: CompanyId) -> Result<Option<Company>> {
        let row = sqlx::query(&format!(
            "SELECT {COMPANY_COLUMNS} FROM companies WHERE id = $1"
        ))
        .bind(id.as_i64())
        .fetch_optional(&mut *self.tx)
        .await?;

        row.map(Self::row_to_company).transpose()
    }

    async fn list_companies(&mut self, active_only: bool) -> Result<Vec<Company>> {
        let rows = sqlx::query(&format!(
            "SELECT {COMPANY_COLUMNS} FROM companies WHERE ($1 = FALSE OR active) ORDER BY name, id"
        ))
        .bind(active_only)
        .fetch_all(&mut *self.tx)
        .await?;

        rows.into_iter().map(Self::row_to_company).collect()
    }

    async fn update_company(&mut self, company: &Company) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE companies
            SET name = $2, tax_id = $3, address = $4, phone = $5, email = $6,
                logo_path = $7, brand_color = $8, active = $9
            WHERE id = $1
            "#,
        )
        .bind(company.id.as_i64())
        .bind(&company.name)
        .bind(&company.tax_id)
        .bind(&company.address)
        .bind(&company.phone)
        .bind(&company.email)
        .bind(&company.logo_path)
        .bind(&company.brand_color)
        .bind(company.active)
        .execute(&mut *self.tx)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                entity: "Company",
                id: company.id.as_i64(),
            });
        }
        Ok(())
    }

    async fn delete_company(&mut self, id: CompanyId) -> Result<()> {
        self.delete_by_id("companies", "Company", id.as_i64()).await
    }

    async fn insert_unit(&mut self, unit: NewUnit) -> Result<Unit> {
        let row = sqlx::query(
            r#"
            INSERT INTO units (code, description, active)
            VALUES ($1, $2, $3)
            RETURNING id, code, description, active
            "#,
        )
        .bind(&unit.code)
        .bind(&unit.description)
        .bind(unit.active)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(map_db_error)?;

        Self::row_to_unit(row)
    }

    async fn get_unit(&mut self, id: UnitId) -> Result<Option<Unit>> {
        let row = sqlx::query("SELECT id, code, description, active FROM units WHERE id = $1")
            .bind(id.as_i64())
            .fetch_optional(&mut *self.tx)
            .await?;

        row.map(Self::row_to_unit).transpose()
    }

    async fn list_units(&mut self, active_only: bool) -> Result<Vec<Unit>> {
        let rows = sqlx::query(
            "SELECT id, code, description, active FROM units WHERE ($1 = FALSE OR active) ORDER BY code",
        )
        .bind(active_only)
        .fetch_all(&mut *self.tx)
        .await?;

        rows.into_iter().map(Self::row_to_unit).collect()
    }

    async fn update_unit(&mut self, unit: &Unit) -> Result<()> {
        let result =
            sqlx::query("UPDATE units SET code = $2, description = $3, active = $4 WHERE id = $1")
                .bind(unit.id.as_i64())
                .bind(&unit.code)
                .bind(&unit.description)
                .bind(unit.active)
                .execute(&mut *self.tx)
                .await
                .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                entity: "Unit",
                id: unit.id.as_i64(),
            });
        }
        Ok(())
    }

    async fn delete_unit(&mut self, id: UnitId) -> Result<()> {
        self.delete_by_id("units", "Unit", id.as_i64()).await
    }

    async fn insert_client(&mut self, client: NewClient) -> Result<Client> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO clients (name, tax_id, address, phone, email)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {CLIENT_COLUMNS}
            "#
        ))
        .bind(&client.name)
        .bind(&client.tax_id)
        .bind(&client.address)
        .bind(&client.phone)
        .bind(&client.email)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(map_db_error)?;

        Self::row_to_client(row)
    }

    async fn get_client(&mut self, id: ClientId) -> Result<Option<Client>> {
        let row = sqlx::query(&format!("SELECT {CLIENT_COLUMNS} FROM clients WHERE id = $1"))
            .bind(id.as_i64())
            .fetch_optional(&mut *self.tx)
            .await?;

        row.map(Self::row_to_client).transpose()
    }

    async fn find_client_by_tax_id(&mut self, tax_id: &str) -> Result<Option<Client>> {
        let row = sqlx::query(&format!(
            "SELECT {CLIENT_COLUMNS} FROM clients WHERE tax_id = $1"
        ))
        .bind(tax_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        row.map(Self::row_to_client).transpose()
    }

    async fn list_clients(&mut self) -> Result<Vec<Client>> {
        let rows = sqlx::query(&format!(
            "SELECT {CLIENT_COLUMNS} FROM clients ORDER BY name, id"
        ))
        .fetch_all(&mut *self.tx)
        .await?;

        rows.into_iter().map(Self::row_to_client).collect()
    }

    async fn update_client(&mut self, client: &Client) -> Result<Client> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE clients
            SET name = $2, tax_id = $3, address = $4, phone = $5, email = $6, updated_at = NOW()
            WHERE id = $1
            RETURNING {CLIENT_COLUMNS}
            "#
        ))
        .bind(client.id.as_i64())
        .bind(&client.name)
        .bind(&client.tax_id)
        .bind(&client.address)
        .bind(&client.phone)
        .bind(&client.email)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_db_error)?;

        match row {
            Some(row) => Self::row_to_client(row),
            None => Err(StoreError::NotFound {
                entity: "Client",
                id: client.id.as_i64(),
            }),
        }
    }

    async fn delete_client(&mut self, id: ClientId) -> Result<()> {
        self.delete_by_id("clients", "Client", id.as_i64()).await
    }

    async fn insert_quote(&mut self, quote: NewQuote) -> Result<QuoteRow> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO quotes (company_id, client_id, number, issue_date, expiry_date,
                                validity_days, delivery_terms, status, notes, discount, total)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {QUOTE_COLUMNS}
            "#
        ))
        .bind(quote.company_id.as_i64())
        .bind(quote.client_id.as_i64())
        .bind(&quote.number)
        .bind(quote.issue_date)
        .bind(quote.expiry_date)
        .bind(quote.validity_days)
        .bind(&quote.delivery_terms)
        .bind(quote.status.as_str())
        .bind(&quote.notes)
        .bind(quote.discount)
        .bind(quote.total)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(map_db_error)?;

        Self::row_to_quote(row)
    }

    async fn get_quote(&mut self, id: QuoteId) -> Result<Option<QuoteRow>> {
        let row = sqlx::query(&format!("SELECT {QUOTE_COLUMNS} FROM quotes WHERE id = $1"))
            .bind(id.as_i64())
            .fetch_optional(&mut *self.tx)
            .await?;

        row.map(Self::row_to_quote).transpose()
    }

    async fn list_quotes(&mut self, filter: QuoteFilter) -> Result<Vec<QuoteRow>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {QUOTE_COLUMNS}
            FROM quotes
            WHERE ($1::BIGINT IS NULL OR company_id = $1)
              AND ($2::TEXT IS NULL OR status = $2)
            ORDER BY created_at DESC, id DESC
            "#
        ))
        .bind(filter.company_id.map(|id| id.as_i64()))
        .bind(filter.status.map(|s| s.as_str()))
        .fetch_all(&mut *self.tx)
        .await?;

        rows.into_iter().map(Self::row_to_quote).collect()
    }

    async fn quote_numbers_for_company(&mut self, company_id: CompanyId) -> Result<Vec<String>> {
        let numbers: Vec<String> = sqlx::query_scalar("SELECT number FROM quotes WHERE company_id = $1")
            .bind(company_id.as_i64())
            .fetch_all(&mut *self.tx)
            .await?;

        Ok(numbers)
    }

    async fn update_quote(&mut self, quote: &QuoteRow) -> Result<QuoteRow> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE quotes
            SET client_id = $2, expiry_date = $3, validity_days = $4, delivery_terms = $5,
                status = $6, notes = $7, discount = $8, total = $9, locked = $10,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {QUOTE_COLUMNS}
            "#
        ))
        .bind(quote.id.as_i64())
        .bind(quote.client_id.as_i64())
        .bind(quote.expiry_date)
        .bind(quote.validity_days)
        .bind(&quote.delivery_terms)
        .bind(quote.status.as_str())
        .bind(&quote.notes)
        .bind(quote.discount)
        .bind(quote.total)
        .bind(quote.locked)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_db_error)?;

        match row {
            Some(row) => Self::row_to_quote(row),
            None => Err(StoreError::NotFound {
                entity: "Quote",
                id: quote.id.as_i64(),
            }),
        }
    }

    async fn delete_quote(&mut self, id: QuoteId) -> Result<()> {
        // quote_items cascade
        self.delete_by_id("quotes", "Quote", id.as_i64()).await
    }

    async fn list_quote_items(&mut self, quote_id: QuoteId) -> Result<Vec<QuoteItemRow>> {
        let rows = sqlx::query(&format!(
            "SELECT {QUOTE_ITEM_COLUMNS} FROM quote_items WHERE quote_id = $1 ORDER BY sequence"
        ))
        .bind(quote_id.as_i64())
        .fetch_all(&mut *self.tx)
        .await?;

        rows.into_iter().map(Self::row_to_quote_item).collect()
    }

    async fn insert_quote_item(&mut self, item: NewQuoteItem) -> Result<QuoteItemRow> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO quote_items (quote_id, sequence, unit_id, quantity, description,
                                     brand, unit_price, total)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {QUOTE_ITEM_COLUMNS}
            "#
        ))
        .bind(item.quote_id.as_i64())
        .bind(item.sequence)
        .bind(item.unit_id.as_i64())
        .bind(item.quantity)
        .bind(&item.description)
        .bind(&item.brand)
        .bind(item.unit_price)
        .bind(item.total)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(map_db_error)?;

        Self::row_to_quote_item(row)
    }

    async fn delete_quote_item(&mut self, quote_id: QuoteId, sequence: i32) -> Result<bool> {
        let result = sqlx::query("DELETE FROM quote_items WHERE quote_id = $1 AND sequence = $2")
            .bind(quote_id.as_i64())
            .bind(sequence)
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_quote_items(&mut self, quote_id: QuoteId) -> Result<u64> {
        let result = sqlx::query("DELETE FROM quote_items WHERE quote_id = $1")
            .bind(quote_id.as_i64())
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected())
    }

    async fn insert_order(&mut self, order: NewOrder) -> Result<OrderRow> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO orders (buyer, tender_number, commitment_number, order_date, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(&order.buyer)
        .bind(&order.tender_number)
        .bind(&order.commitment_number)
        .bind(order.order_date)
        .bind(order.status.as_str())
        .fetch_one(&mut *self.tx)
        .await
        .map_err(map_db_error)?;

        Self::row_to_order(row)
    }

    async fn get_order(&mut self, id: OrderId) -> Result<Option<OrderRow>> {
        let row = sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
            .bind(id.as_i64())
            .fetch_optional(&mut *self.tx)
            .await?;

        row.map(Self::row_to_order).transpose()
    }

    async fn list_orders(&mut self) -> Result<Vec<OrderRow>> {
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY order_date, id"
        ))
        .fetch_all(&mut *self.tx)
        .await?;

        rows.into_iter().map(Self::row_to_order).collect()
    }

    async fn update_order(&mut self, order: &OrderRow) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET buyer = $2, tender_number = $3, commitment_number = $4, order_date = $5, status = $6
            WHERE id = $1
            "#,
        )
        .bind(order.id.as_i64())
        .bind(&order.buyer)
        .bind(&order.tender_number)
        .bind(&order.commitment_number)
        .bind(order.order_date)
        .bind(order.status.as_str())
        .execute(&mut *self.tx)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                entity: "Order",
                id: order.id.as_i64(),
            });
        }
        Ok(())
    }

    async fn list_order_items(&mut self, order_id: OrderId) -> Result<Vec<OrderItemRow>> {
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_ITEM_COLUMNS} FROM order_items WHERE order_id = $1 ORDER BY sequence"
        ))
        .bind(order_id.as_i64())
        .fetch_all(&mut *self.tx)
        .await?;

        rows.into_iter().map(Self::row_to_order_item).collect()
    }

    async fn insert_order_item(&mut self, item: NewOrderItem) -> Result<OrderItemRow> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO order_items (order_id, sequence, description, unit, quantity, brand,
                                     unit_price, total, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {ORDER_ITEM_COLUMNS}
            "#
        ))
        .bind(item.order_id.as_i64())
        .bind(item.sequence)
        .bind(&item.description)
        .bind(&item.unit)
        .bind(item.quantity)
        .bind(&item.brand)
        .bind(item.unit_price)
        .bind(item.total)
        .bind(&item.notes)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(map_db_error)?;

        Self::row_to_order_item(row)
    }

    async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        tracing::debug!("Rolling back transaction");
        self.tx.rollback().await?;
        Ok(())
    }
}
