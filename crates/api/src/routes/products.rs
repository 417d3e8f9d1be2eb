//! Read-only catalog lookup.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use chrono::{DateTime, Utc};
use common::ProductId;
use inventory::{InventoryPort, Product};
use order_store::OrderStore;
use serde::Serialize;

use crate::AppState;
use crate::error::ApiError;
use crate::routes::orders::parse_path_id;

#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub id: String,
    pub name: String,
    pub price_cents: i64,
    pub price: String,
    pub stock: u32,
    pub updated_at: DateTime<Utc>,
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name,
            price_cents: product.price.cents(),
            price: product.price.to_string(),
            stock: product.stock,
            updated_at: product.updated_at,
        }
    }
}

/// GET /products/{id}: current price and stock of a product.
#[tracing::instrument(skip(state))]
pub async fn get<S: OrderStore + Clone + 'static, I: InventoryPort + Clone + 'static>(
    State(state): State<Arc<AppState<S, I>>>,
    Path(id): Path<String>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product_id: ProductId = parse_path_id(&id, "Product")?;
    let product = state
        .order_service
        .inventory()
        .get_product(&product_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Product not found: {product_id}")))?;

    Ok(Json(product.into()))
}
