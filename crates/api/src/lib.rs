//! HTTP API server for order placement and tracking.
//!
//! Provides REST endpoints over the order service, with structured logging
//! (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, patch};
use common::Money;
use domain::OrderService;
use inventory::{InMemoryInventory, InventoryPort, PostgresInventory, Product};
use metrics_exporter_prometheus::PrometheusHandle;
use order_store::{InMemoryOrderStore, OrderStore, PostgresOrderStore};
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;

/// Shared application state accessible from all handlers.
pub struct AppState<S: OrderStore, I: InventoryPort + Clone + 'static> {
    pub order_service: OrderService<S, I>,
    /// Which adapters are wired, reported by `/health`.
    pub backend: &'static str,
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S, I>(state: Arc<AppState<S, I>>, metrics_handle: PrometheusHandle) -> Router
where
    S: OrderStore + Clone + 'static,
    I: InventoryPort + Clone + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::system::metrics))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::system::health::<S, I>))
        .route(
            "/orders",
            get(routes::orders::list::<S, I>).post(routes::orders::create::<S, I>),
        )
        .route("/orders/{id}", get(routes::orders::get::<S, I>))
        .route(
            "/orders/{id}/status",
            patch(routes::orders::update_status::<S, I>),
        )
        .route("/products/{id}", get(routes::products::get::<S, I>))
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

/// Wires the in-memory adapters.
pub fn in_memory_state(
    store: InMemoryOrderStore,
    inventory: InMemoryInventory,
) -> Arc<AppState<InMemoryOrderStore, InMemoryInventory>> {
    Arc::new(AppState {
        order_service: OrderService::new(store, inventory),
        backend: "memory",
    })
}

/// Connects to Postgres, applies migrations and wires the Postgres adapters.
pub async fn postgres_state(
    config: &Config,
    database_url: &str,
) -> Result<Arc<AppState<PostgresOrderStore, PostgresInventory>>, order_store::StoreError> {
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(database_url)
        .await?;

    let store = PostgresOrderStore::new(pool.clone());
    store.run_migrations().await?;
    tracing::info!(
        max_connections = config.database_max_connections,
        "connected to postgres, migrations applied"
    );

    Ok(Arc::new(AppState {
        order_service: OrderService::new(store, PostgresInventory::new(pool)),
        backend: "postgres",
    }))
}

/// Loads a small demo catalog into an in-memory inventory.
pub async fn seed_demo_catalog(inventory: &InMemoryInventory) -> Vec<Product> {
    let catalog = [
        ("Mechanical Keyboard", 89_99, 25),
        ("Wireless Mouse", 24_50, 100),
        ("USB-C Hub", 39_00, 10),
        ("27\" Monitor", 249_99, 5),
    ];

    let mut products = Vec::with_capacity(catalog.len());
    for (name, cents, stock) in catalog {
        let product = Product::new(name, Money::from_cents(cents), stock);
        inventory.insert_product(product.clone()).await;
        tracing::info!(product_id = %product.id, name, price = %product.price, stock, "seeded product");
        products.push(product);
    }
    products
}
