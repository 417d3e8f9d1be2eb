//! Domain error types.

use common::{OrderId, ProductId};
use inventory::InventoryError;
use order_store::{OrderStatus, StoreError};
use thiserror::Error;

use crate::order::StockAdjustment;

/// Broad classes of failure, used by callers to decide how to react.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad input; rejected before any side effect.
    Validation,
    /// A referenced product is missing or short on stock.
    Resource,
    /// The request conflicts with the order's current state.
    Consistency,
    /// A backend failed; any stock taken by the attempt was given back.
    Infrastructure,
    /// Stock could not be given back. Inventory no longer matches reality.
    Fatal,
}

/// Errors that can occur during order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The request has no line items.
    #[error("Order must contain at least one item")]
    EmptyOrder,

    /// The shipping address is empty.
    #[error("Shipping address is required")]
    MissingShippingAddress,

    /// A line item asks for zero units.
    #[error("Invalid quantity for product {product_id}: {quantity} (must be greater than 0)")]
    InvalidQuantity {
        product_id: ProductId,
        quantity: u32,
    },

    /// A line item references a product that doesn't exist.
    #[error("Product not found: {product_id}")]
    ProductNotFound { product_id: ProductId },

    /// Not enough stock to cover the requested quantity.
    #[error(
        "Insufficient stock for product {product_id}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        product_id: ProductId,
        requested: u32,
        available: u32,
    },

    /// The order doesn't exist.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// The requested status is not reachable from the current one, or is not
    /// a status at all. `to` carries the requested text verbatim.
    #[error("Illegal status transition from {from} to {to}")]
    IllegalTransition { from: OrderStatus, to: String },

    /// Another update changed the order between read and write.
    #[error("Order {order_id} was modified concurrently")]
    ConcurrentModification { order_id: OrderId },

    /// The inventory backend failed.
    #[error("Inventory error: {0}")]
    Inventory(#[source] InventoryError),

    /// The order store failed.
    #[error("Persistence failure: {0}")]
    Persistence(#[source] StoreError),

    /// The attempt failed and the stock it had reserved could not be fully
    /// restored. Requires operator intervention.
    #[error("Stock rollback failed after: {cause}; {} adjustment(s) not restored", .unrestored.len())]
    RollbackFailed {
        #[source]
        cause: Box<OrderError>,
        unrestored: Vec<StockAdjustment>,
    },
}

impl OrderError {
    /// Returns the failure class of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            OrderError::EmptyOrder
            | OrderError::MissingShippingAddress
            | OrderError::InvalidQuantity { .. } => ErrorKind::Validation,
            OrderError::ProductNotFound { .. }
            | OrderError::InsufficientStock { .. }
            | OrderError::OrderNotFound(_) => ErrorKind::Resource,
            OrderError::IllegalTransition { .. } | OrderError::ConcurrentModification { .. } => {
                ErrorKind::Consistency
            }
            OrderError::Inventory(_) | OrderError::Persistence(_) => ErrorKind::Infrastructure,
            OrderError::RollbackFailed { .. } => ErrorKind::Fatal,
        }
    }

    /// Short machine-readable label, used as a metrics dimension.
    pub fn reason(&self) -> &'static str {
        match self {
            OrderError::EmptyOrder => "empty_order",
            OrderError::MissingShippingAddress => "missing_shipping_address",
            OrderError::InvalidQuantity { .. } => "invalid_quantity",
            OrderError::ProductNotFound { .. } => "product_not_found",
            OrderError::InsufficientStock { .. } => "insufficient_stock",
            OrderError::OrderNotFound(_) => "order_not_found",
            OrderError::IllegalTransition { .. } => "illegal_transition",
            OrderError::ConcurrentModification { .. } => "concurrent_modification",
            OrderError::Inventory(_) => "inventory_failure",
            OrderError::Persistence(_) => "persistence_failure",
            OrderError::RollbackFailed { .. } => "rollback_failed",
        }
    }
}

impl From<InventoryError> for OrderError {
    fn from(e: InventoryError) -> Self {
        match e {
            InventoryError::ProductNotFound(product_id) => OrderError::ProductNotFound { product_id },
            InventoryError::InsufficientStock {
                product_id,
                requested,
                available,
            } => OrderError::InsufficientStock {
                product_id,
                requested,
                available,
            },
            other => OrderError::Inventory(other),
        }
    }
}

impl From<StoreError> for OrderError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::OrderNotFound(order_id) => OrderError::OrderNotFound(order_id),
            StoreError::ConcurrencyConflict { order_id, .. } => {
                OrderError::ConcurrentModification { order_id }
            }
            other => OrderError::Persistence(other),
        }
    }
}
