//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container and need a running Docker
//! daemon, so they are ignored by default. Run with:
//!
//! ```bash
//! cargo test -p store --test postgres_integration -- --ignored --test-threads=1
//! ```

use std::sync::Arc;

use chrono::NaiveDate;
use common::{ClientId, CompanyId, OrderStatus, QuoteStatus, UnitId};
use rust_decimal_macros::dec;
use serial_test::serial;
use sqlx::PgPool;
use store::{
    DEFAULT_BRAND_COLOR, NewClient, NewCompany, NewOrder, NewOrderItem, NewQuote, NewQuoteItem,
    NewUnit, PostgresStore, QuoteFilter, Store, StoreError, UnitOfWork, constraints,
};
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

/// Global shared container
static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();
            PostgresStore::new(temp_pool.clone())
                .run_migrations()
                .await
                .unwrap();
            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh store with its own pool and cleared tables
async fn get_test_store() -> PostgresStore {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query(
        "TRUNCATE TABLE order_items, orders, quote_items, quotes, clients, units, companies \
         RESTART IDENTITY CASCADE",
    )
    .execute(&pool)
    .await
    .unwrap();

    PostgresStore::new(pool)
}

async fn seed(store: &PostgresStore) -> (CompanyId, ClientId, UnitId) {
    let mut tx = store.begin().await.unwrap();
    let company = tx
        .insert_company(NewCompany {
            name: "Acme Ltda".to_string(),
            tax_id: Some("12.345.678/0001-90".to_string()),
            address: None,
            phone: None,
            email: None,
            logo_path: None,
            brand_color: DEFAULT_BRAND_COLOR.to_string(),
            active: true,
        })
        .await
        .unwrap();
    let client = tx
        .insert_client(NewClient {
            name: "Prefeitura".to_string(),
            tax_id: "111.222.333-44".to_string(),
            address: "Rua A, 1".to_string(),
            phone: None,
            email: None,
        })
        .await
        .unwrap();
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

fn new_quote(company_id: CompanyId, client_id: ClientId, number: &str) -> NewQuote {
    NewQuote {
        company_id,
        client_id,
        number: number.to_string(),
        issue_date: NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
        expiry_date: None,
        validity_days: 15,
        delivery_terms: "A Combinar".to_string(),
        status: QuoteStatus::Draft,
        notes: String::new(),
        discount: dec!(1.00),
        total: dec!(0),
    }
}

#[tokio::test]
#[ignore = "requires Docker"]
#[serial]
async fn quote_with_items_roundtrips_decimals() {
    let store = get_test_store().await;
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
        quantity: dec!(2.00),
        description: "Caneta".to_string(),
        brand: Some("Bic".to_string()),
        unit_price: dec!(10.00),
        total: dec!(20.00),
    })
    .await
    .unwrap();
    tx.commit().await.unwrap();

    let mut tx = store.begin().await.unwrap();
    let stored = tx.get_quote(quote.id).await.unwrap().unwrap();
    assert_eq!(stored.number, "ORC-1-00001");
    assert_eq!(stored.status, QuoteStatus::Draft);
    assert_eq!(stored.discount, dec!(1.00));
    assert!(!stored.locked);

    let items = tx.list_quote_items(quote.id).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].total, dec!(20.00));
    assert_eq!(items[0].brand.as_deref(), Some("Bic"));
}

#[tokio::test]
#[ignore = "requires Docker"]
#[serial]
async fn duplicate_quote_number_reports_constraint() {
    let store = get_test_store().await;
    let (company_id, client_id, _) = seed(&store).await;

    let mut tx = store.begin().await.unwrap();
    tx.insert_quote(new_quote(company_id, client_id, "ORC-1-00001"))
        .await
        .unwrap();
    tx.commit().await.unwrap();

    let mut tx = store.begin().await.unwrap();
    let err = tx
        .insert_quote(new_quote(company_id, client_id, "ORC-1-00001"))
        .await
        .unwrap_err();
    assert!(err.is_unique_violation_of(constraints::QUOTE_NUMBER));
}

#[tokio::test]
#[ignore = "requires Docker"]
#[serial]
async fn uncommitted_unit_of_work_is_rolled_back() {
    let store = get_test_store().await;
    let (company_id, client_id, _) = seed(&store).await;

    {
        let mut tx = store.begin().await.unwrap();
        tx.insert_quote(new_quote(company_id, client_id, "ORC-1-00001"))
            .await
            .unwrap();
    }

    let mut tx = store.begin().await.unwrap();
    let quotes = tx.list_quotes(QuoteFilter::default()).await.unwrap();
    assert!(quotes.is_empty());
}

#[tokio::test]
#[ignore = "requires Docker"]
#[serial]
async fn referenced_company_cannot_be_deleted() {
    let store = get_test_store().await;
    let (company_id, client_id, _) = seed(&store).await;

    let mut tx = store.begin().await.unwrap();
    tx.insert_quote(new_quote(company_id, client_id, "ORC-1-00001"))
        .await
        .unwrap();
    tx.commit().await.unwrap();

    let mut tx = store.begin().await.unwrap();
    let err = tx.delete_company(company_id).await.unwrap_err();
    assert!(matches!(err, StoreError::ForeignKeyViolation { ref constraint }
        if constraint == constraints::QUOTE_COMPANY));
}

#[tokio::test]
#[ignore = "requires Docker"]
#[serial]
async fn deleting_quote_cascades_items() {
    let store = get_test_store().await;
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
        description: "Papel".to_string(),
        brand: None,
        unit_price: dec!(3.50),
        total: dec!(3.50),
    })
    .await
    .unwrap();
    tx.delete_quote(quote.id).await.unwrap();
    tx.commit().await.unwrap();

    let mut tx = store.begin().await.unwrap();
    assert!(tx.list_quote_items(quote.id).await.unwrap().is_empty());
    tx.delete_unit(unit_id).await.unwrap();
}

#[tokio::test]
#[ignore = "requires Docker"]
#[serial]
async fn orders_roundtrip_with_status() {
    let store = get_test_store().await;

    let mut tx = store.begin().await.unwrap();
    let mut order = tx
        .insert_order(NewOrder {
            buyer: "Secretaria de Saúde".to_string(),
            tender_number: "PE 12/2024".to_string(),
            commitment_number: None,
            order_date: NaiveDate::from_ymd_opt(2024, 4, 2).unwrap(),
            status: OrderStatus::Open,
        })
        .await
        .unwrap();
    tx.insert_order_item(NewOrderItem {
        order_id: order.id,
        sequence: 1,
        description: "Luva".to_string(),
        unit: "CX".to_string(),
        quantity: dec!(4),
        brand: None,
        unit_price: dec!(12.25),
        total: dec!(49.00),
        notes: Some("Tamanho M".to_string()),
    })
    .await
    .unwrap();
    order.status = OrderStatus::Fulfilled;
    tx.update_order(&order).await.unwrap();
    tx.commit().await.unwrap();

    let mut tx = store.begin().await.unwrap();
    let stored = tx.get_order(order.id).await.unwrap().unwrap();
    assert_eq!(stored.status, OrderStatus::Fulfilled);
    let items = tx.list_order_items(order.id).await.unwrap();
    assert_eq!(items[0].total, dec!(49.00));
    assert_eq!(items[0].notes.as_deref(), Some("Tamanho M"));
}
