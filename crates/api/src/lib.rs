//! HTTP API server for the quoting back office.
//!
//! Provides REST endpoints for the catalog, quotes (including the PDF
//! download) and purchase orders, with structured logging (tracing) and
//! Prometheus metrics.

pub mod config;
pub mod error;
pub mod forms;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post, put};
use domain::{CatalogService, OrderService, QuoteService};
use metrics_exporter_prometheus::PrometheusHandle;
use render::{LogoStore, Renderer};
use store::Store;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;

/// Shared application state accessible from all handlers.
pub struct AppState<S: Store> {
    pub catalog: CatalogService<S>,
    pub quotes: QuoteService<S>,
    pub orders: OrderService<S>,
    pub renderer: Renderer,
}

/// Creates the application state over one store.
pub fn create_state<S: Store + Clone>(store: S, config: &Config) -> Arc<AppState<S>> {
    Arc::new(AppState {
        catalog: CatalogService::new(store.clone()),
        quotes: QuoteService::new(store.clone())
            .with_number_attempts(config.quote_number_attempts),
        orders: OrderService::new(store),
        renderer: Renderer::new(LogoStore::new(config.media_root.clone())),
    })
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: Store + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    use routes::{catalog, orders, quotes, system};

    let metrics_router = Router::new()
        .route("/metrics", get(system::metrics))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(system::health))
        // Catalog
        .route(
            "/companies",
            get(catalog::list_companies::<S>).post(catalog::create_company::<S>),
        )
        .route(
            "/companies/{id}",
            get(catalog::get_company::<S>)
                .put(catalog::update_company::<S>)
                .delete(catalog::delete_company::<S>),
        )
        .route(
            "/units",
            get(catalog::list_units::<S>).post(catalog::create_unit::<S>),
        )
        .route(
            "/units/{id}",
            get(catalog::get_unit::<S>)
                .put(catalog::update_unit::<S>)
                .delete(catalog::delete_unit::<S>),
        )
        .route("/clients", get(catalog::list_clients::<S>))
        .route(
            "/clients/{id}",
            get(catalog::get_client::<S>).delete(catalog::delete_client::<S>),
        )
        // Quotes
        .route("/companies/{id}/quotes", post(quotes::create::<S>))
        .route("/quotes", get(quotes::list::<S>))
        .route(
            "/quotes/{id}",
            get(quotes::get::<S>)
                .post(quotes::update::<S>)
                .delete(quotes::delete::<S>),
        )
        .route("/quotes/{id}/items", post(quotes::add_item::<S>))
        .route(
            "/quotes/{id}/items/{sequence}",
            delete(quotes::remove_item::<S>),
        )
        .route("/quotes/{id}/discount", put(quotes::set_discount::<S>))
        .route("/quotes/{id}/status", put(quotes::change_status::<S>))
        .route("/quotes/{id}/order", post(quotes::generate_order::<S>))
        .route("/quotes/{id}/pdf", get(quotes::pdf::<S>))
        // Purchase orders
        .route("/orders", get(orders::list::<S>).post(orders::create::<S>))
        .route("/orders/{id}", get(orders::get::<S>))
        .route("/orders/{id}/items", post(orders::add_item::<S>))
        .route("/orders/{id}/status", put(orders::change_status::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
