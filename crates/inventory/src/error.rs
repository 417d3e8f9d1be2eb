use common::ProductId;
use thiserror::Error;

/// Errors that can occur when interacting with the inventory.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// The product does not exist.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// The adjustment would take stock below zero. Nothing was changed.
    #[error(
        "Insufficient stock for product {product_id}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        product_id: ProductId,
        requested: u32,
        available: u32,
    },

    /// The adjustment would overflow the stock counter.
    #[error("Stock overflow for product {0}")]
    StockOverflow(ProductId),

    /// The inventory backend could not be reached.
    #[error("Inventory unavailable: {0}")]
    Unavailable(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result type for inventory operations.
pub type Result<T> = std::result::Result<T, InventoryError>;
