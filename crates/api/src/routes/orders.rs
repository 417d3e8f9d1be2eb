//! Order placement, lookup and status endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::{OrderId, OwnerId, ProductId};
use domain::CreateOrderRequest;
use inventory::InventoryPort;
use order_store::{Order, OrderItem, OrderStore};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::ApiError;

// -- Request types --

#[derive(Debug, Deserialize)]
pub struct CreateOrderBody {
    pub owner_id: String,
    pub shipping_address: String,
    #[serde(default)]
    pub items: Vec<OrderLineBody>,
}

#[derive(Debug, Deserialize)]
pub struct OrderLineBody {
    pub product_id: String,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub owner_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusBody {
    pub status: String,
}

impl CreateOrderBody {
    /// Parses identifiers and quantities into a typed request.
    ///
    /// Shape rules (empty order, blank address, zero quantity) are left to
    /// the service so they are reported the same way for every caller.
    fn into_request(self) -> Result<CreateOrderRequest, ApiError> {
        let owner_id: OwnerId = parse_id(&self.owner_id, "owner_id")?;
        let mut request = CreateOrderRequest::new(owner_id, self.shipping_address);
        for line in self.items {
            let product_id: ProductId = parse_id(&line.product_id, "product_id")?;
            let quantity = u32::try_from(line.quantity).map_err(|_| {
                ApiError::BadRequest(format!(
                    "Invalid quantity for product {product_id}: {}",
                    line.quantity
                ))
            })?;
            request = request.with_line(product_id, quantity);
        }
        Ok(request)
    }
}

// -- Response types --

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub owner_id: String,
    pub status: String,
    pub shipping_address: String,
    pub total_cents: i64,
    pub total: String,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<OrderItemResponse>,
}

#[derive(Debug, Serialize)]
pub struct OrderItemResponse {
    pub id: String,
    pub product_id: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
    pub subtotal_cents: i64,
}

impl From<OrderItem> for OrderItemResponse {
    fn from(item: OrderItem) -> Self {
        Self {
            id: item.id.to_string(),
            product_id: item.product_id.to_string(),
            quantity: item.quantity,
            unit_price_cents: item.unit_price.cents(),
            subtotal_cents: item.subtotal.cents(),
        }
    }
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            id: order.id.to_string(),
            owner_id: order.owner_id.to_string(),
            status: order.status.to_string(),
            shipping_address: order.shipping_address,
            total_cents: order.total_amount.cents(),
            total: order.total_amount.to_string(),
            version: order.version.as_i64(),
            created_at: order.created_at,
            updated_at: order.updated_at,
            items: order.items.into_iter().map(Into::into).collect(),
        }
    }
}

// -- Handlers --

/// POST /orders: place an order.
#[tracing::instrument(skip(state, body))]
pub async fn create<S: OrderStore + Clone + 'static, I: InventoryPort + Clone + 'static>(
    State(state): State<Arc<AppState<S, I>>>,
    Json(body): Json<CreateOrderBody>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let request = body.into_request()?;
    let order = state.order_service.create_order(request).await?;
    Ok((StatusCode::CREATED, Json(order.into())))
}

/// GET /orders/{id}: load an order with its items.
#[tracing::instrument(skip(state))]
pub async fn get<S: OrderStore + Clone + 'static, I: InventoryPort + Clone + 'static>(
    State(state): State<Arc<AppState<S, I>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id: OrderId = parse_path_id(&id, "Order")?;
    let order = state.order_service.get_order(order_id).await?;
    Ok(Json(order.into()))
}

/// GET /orders: list orders newest first, optionally for one owner.
#[tracing::instrument(skip(state))]
pub async fn list<S: OrderStore + Clone + 'static, I: InventoryPort + Clone + 'static>(
    State(state): State<Arc<AppState<S, I>>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let orders = match query.owner_id.as_deref() {
        Some(owner_id) => {
            let owner_id: OwnerId = parse_id(owner_id, "owner_id")?;
            state.order_service.list_orders_by_owner(owner_id).await?
        }
        None => state.order_service.list_orders().await?,
    };

    Ok(Json(orders.into_iter().map(Into::into).collect()))
}

/// PATCH /orders/{id}/status: move an order through its lifecycle.
#[tracing::instrument(skip(state, body))]
pub async fn update_status<S: OrderStore + Clone + 'static, I: InventoryPort + Clone + 'static>(
    State(state): State<Arc<AppState<S, I>>>,
    Path(id): Path<String>,
    Json(body): Json<UpdateStatusBody>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id: OrderId = parse_path_id(&id, "Order")?;
    let order = state
        .order_service
        .update_order_status(order_id, &body.status)
        .await?;
    Ok(Json(order.into()))
}

fn parse_id<T: std::str::FromStr<Err = uuid::Error>>(value: &str, field: &str) -> Result<T, ApiError> {
    value
        .parse()
        .map_err(|e| ApiError::BadRequest(format!("Invalid {field}: {e}")))
}

/// Path IDs that don't parse can't name an existing resource.
pub(crate) fn parse_path_id<T: std::str::FromStr<Err = uuid::Error>>(
    value: &str,
    resource: &str,
) -> Result<T, ApiError> {
    value
        .parse()
        .map_err(|_| ApiError::NotFound(format!("{resource} not found: {value}")))
}
