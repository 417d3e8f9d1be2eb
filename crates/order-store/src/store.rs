use async_trait::async_trait;

use crate::{NewOrder, Order, OrderId, OrderItem, OrderStatus, OwnerId, Result, Version};

/// Options for updating an order's status.
#[derive(Debug, Clone, Default)]
pub struct UpdateOptions {
    /// Expected version of the order for optimistic concurrency control.
    /// If None, no version check is performed (use with caution).
    pub expected_version: Option<Version>,
}

impl UpdateOptions {
    /// Creates options with no version check.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options expecting the order to be at a specific version.
    pub fn expect_version(version: Version) -> Self {
        Self {
            expected_version: Some(version),
        }
    }
}

/// Core trait for order store implementations.
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persists an order and all of its items.
    ///
    /// The write is atomic - either the order and every item become visible
    /// or nothing does. Identifiers and timestamps are assigned by the store;
    /// the returned order has status `Pending`, version 1 and its items loaded.
    async fn create_order_with_items(&self, order: NewOrder) -> Result<Order>;

    /// Retrieves an order with its items.
    ///
    /// Returns None if the order doesn't exist.
    async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>>;

    /// Retrieves the items of an order in the order they were requested.
    async fn get_items(&self, order_id: OrderId) -> Result<Vec<OrderItem>>;

    /// Lists all orders, most recent first. Items are not loaded.
    async fn list_orders(&self) -> Result<Vec<Order>>;

    /// Lists an owner's orders, most recent first. Items are not loaded.
    async fn list_orders_by_owner(&self, owner_id: OwnerId) -> Result<Vec<Order>>;

    /// Sets an order's status and returns the updated order with its items.
    ///
    /// If `options.expected_version` is set, the operation will fail with
    /// `ConcurrencyConflict` if the stored version doesn't match.
    async fn update_status(
        &self,
        order_id: OrderId,
        status: OrderStatus,
        options: UpdateOptions,
    ) -> Result<Order>;
}

/// Extension trait providing convenience methods for order stores.
#[async_trait]
pub trait OrderStoreExt: OrderStore {
    /// Checks if an order exists.
    async fn order_exists(&self, order_id: OrderId) -> Result<bool> {
        Ok(self.get_order(order_id).await?.is_some())
    }

    /// Loads the items of each order in `orders`.
    ///
    /// One store call per order; meant for display layers that need items on
    /// a handful of listed orders.
    async fn hydrate(&self, orders: Vec<Order>) -> Result<Vec<Order>> {
        let mut hydrated = Vec::with_capacity(orders.len());
        for mut order in orders {
            order.items = self.get_items(order.id).await?;
            hydrated.push(order);
        }
        Ok(hydrated)
    }
}

// Blanket implementation for all OrderStore implementations
impl<T: OrderStore + ?Sized> OrderStoreExt for T {}
