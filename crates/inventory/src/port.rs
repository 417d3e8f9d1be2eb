use async_trait::async_trait;
use common::ProductId;

use crate::{InventoryError, Product, Result};

/// Core trait for inventory implementations.
///
/// The inventory owns stock truth. All implementations must be thread-safe
/// (Send + Sync) and must apply [`adjust_stock`](InventoryPort::adjust_stock)
/// as a single atomic conditional update, never as separate read and write
/// calls.
#[async_trait]
pub trait InventoryPort: Send + Sync {
    /// Looks up a product by ID.
    ///
    /// Returns None if the product doesn't exist.
    async fn get_product(&self, product_id: &ProductId) -> Result<Option<Product>>;

    /// Adds `delta` to the product's stock and returns the new stock level.
    ///
    /// A negative delta reserves stock, a positive one restores it. Fails with
    /// `InsufficientStock` without modifying anything if the result would be
    /// negative.
    async fn adjust_stock(&self, product_id: &ProductId, delta: i64) -> Result<u32>;
}

/// Extension trait providing convenience methods for inventories.
#[async_trait]
pub trait InventoryPortExt: InventoryPort {
    /// Takes `quantity` units out of stock.
    async fn reserve(&self, product_id: &ProductId, quantity: u32) -> Result<u32> {
        self.adjust_stock(product_id, -i64::from(quantity)).await
    }

    /// Puts `quantity` units back into stock.
    async fn restock(&self, product_id: &ProductId, quantity: u32) -> Result<u32> {
        self.adjust_stock(product_id, i64::from(quantity)).await
    }
}

// Blanket implementation for all InventoryPort implementations
impl<T: InventoryPort + ?Sized> InventoryPortExt for T {}

/// Computes the stock level after applying `delta`.
///
/// Shared by adapters that hold stock in process memory.
pub fn apply_adjustment(product_id: ProductId, current: u32, delta: i64) -> Result<u32> {
    let next = i64::from(current) + delta;
    if next < 0 {
        return Err(InventoryError::InsufficientStock {
            product_id,
            requested: u32::try_from(delta.unsigned_abs()).unwrap_or(u32::MAX),
            available: current,
        });
    }
    u32::try_from(next).map_err(|_| InventoryError::StockOverflow(product_id))
}
