use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
    NewOrder, Order, OrderId, OrderItem, OrderStatus, OwnerId, Result, StoreError,
    store::{OrderStore, UpdateOptions},
};

/// In-memory order store implementation for testing.
///
/// Orders are kept in insertion order; listing walks them backwards so the
/// most recent order comes first even when timestamps tie.
#[derive(Clone, Default)]
pub struct InMemoryOrderStore {
    orders: Arc<RwLock<Vec<Order>>>,
    fail_on_create: Arc<AtomicBool>,
}

impl InMemoryOrderStore {
    /// Creates a new empty in-memory order store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of orders stored.
    pub async fn order_count(&self) -> usize {
        self.orders.read().await.len()
    }

    /// Configures the store to reject every create call.
    pub fn set_fail_on_create(&self, fail: bool) {
        self.fail_on_create.store(fail, Ordering::SeqCst);
    }

    fn summary(order: &Order) -> Order {
        Order {
            items: Vec::new(),
            ..order.clone()
        }
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn create_order_with_items(&self, order: NewOrder) -> Result<Order> {
        if self.fail_on_create.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "in-memory store rejected write".to_string(),
            ));
        }

        let order = order.into_order(Utc::now());
        self.orders.write().await.push(order.clone());
        Ok(order)
    }

    async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>> {
        let orders = self.orders.read().await;
        Ok(orders.iter().find(|o| o.id == order_id).cloned())
    }

    async fn get_items(&self, order_id: OrderId) -> Result<Vec<OrderItem>> {
        let orders = self.orders.read().await;
        Ok(orders
            .iter()
            .find(|o| o.id == order_id)
            .map(|o| o.items.clone())
            .unwrap_or_default())
    }

    async fn list_orders(&self) -> Result<Vec<Order>> {
        let orders = self.orders.read().await;
        Ok(orders.iter().rev().map(Self::summary).collect())
    }

    async fn list_orders_by_owner(&self, owner_id: OwnerId) -> Result<Vec<Order>> {
        let orders = self.orders.read().await;
        Ok(orders
            .iter()
            .rev()
            .filter(|o| o.owner_id == owner_id)
            .map(Self::summary)
            .collect())
    }

    async fn update_status(
        &self,
        order_id: OrderId,
        status: OrderStatus,
        options: UpdateOptions,
    ) -> Result<Order> {
        let mut orders = self.orders.write().await;
        let order = orders
            .iter_mut()
            .find(|o| o.id == order_id)
            .ok_or(StoreError::OrderNotFound(order_id))?;

        if let Some(expected) = options.expected_version {
            if order.version != expected {
                return Err(StoreError::ConcurrencyConflict {
                    order_id,
                    expected,
                    actual: order.version,
                });
            }
        }

        order.status = status;
        order.version = order.version.next();
        order.updated_at = Utc::now();

        Ok(order.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{NewOrderItem, OrderStoreExt, Version};
    use common::{Money, ProductId};

    fn new_order(owner_id: OwnerId) -> NewOrder {
        NewOrder::new(
            owner_id,
            "123 Main St",
            vec![
                NewOrderItem::new(ProductId::new(), 2, Money::from_cents(1000)),
                NewOrderItem::new(ProductId::new(), 1, Money::from_cents(500)),
            ],
        )
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let store = InMemoryOrderStore::new();
        let created = store
            .create_order_with_items(new_order(OwnerId::new()))
            .await
            .unwrap();

        assert_eq!(created.status, OrderStatus::Pending);
        assert_eq!(created.total_amount.cents(), 2500);
        assert_eq!(created.items.len(), 2);

        let loaded = store.get_order(created.id).await.unwrap().unwrap();
        assert_eq!(loaded, created);
        assert_eq!(store.get_items(created.id).await.unwrap().len(), 2);
        assert!(store.get_order(OrderId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_fail_on_create() {
        let store = InMemoryOrderStore::new();
        store.set_fail_on_create(true);

        let result = store
            .create_order_with_items(new_order(OwnerId::new()))
            .await;
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn test_list_is_newest_first_without_items() {
        let store = InMemoryOrderStore::new();
        let alice = OwnerId::new();
        let bob = OwnerId::new();

        let first = store.create_order_with_items(new_order(alice)).await.unwrap();
        let second = store.create_order_with_items(new_order(bob)).await.unwrap();
        let third = store.create_order_with_items(new_order(alice)).await.unwrap();

        let all = store.list_orders().await.unwrap();
        let ids: Vec<_> = all.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![third.id, second.id, first.id]);
        assert!(all.iter().all(|o| o.items.is_empty()));

        let alices = store.list_orders_by_owner(alice).await.unwrap();
        let ids: Vec<_> = alices.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![third.id, first.id]);

        let hydrated = store.hydrate(alices).await.unwrap();
        assert!(hydrated.iter().all(|o| o.items.len() == 2));
    }

    #[tokio::test]
    async fn test_update_status_bumps_version() {
        let store = InMemoryOrderStore::new();
        let order = store
            .create_order_with_items(new_order(OwnerId::new()))
            .await
            .unwrap();

        let updated = store
            .update_status(
                order.id,
                OrderStatus::Confirmed,
                UpdateOptions::expect_version(Version::first()),
            )
            .await
            .unwrap();

        assert_eq!(updated.status, OrderStatus::Confirmed);
        assert_eq!(updated.version, Version::new(2));
        assert_eq!(updated.items.len(), 2);
    }

    #[tokio::test]
    async fn test_update_status_version_conflict() {
        let store = InMemoryOrderStore::new();
        let order = store
            .create_order_with_items(new_order(OwnerId::new()))
            .await
            .unwrap();

        store
            .update_status(order.id, OrderStatus::Confirmed, UpdateOptions::new())
            .await
            .unwrap();

        let result = store
            .update_status(
                order.id,
                OrderStatus::Cancelled,
                UpdateOptions::expect_version(Version::first()),
            )
            .await;

        assert!(matches!(
            result,
            Err(StoreError::ConcurrencyConflict { actual, .. }) if actual == Version::new(2)
        ));
        let stored = store.get_order(order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_update_unknown_order() {
        let store = InMemoryOrderStore::new();
        let result = store
            .update_status(OrderId::new(), OrderStatus::Confirmed, UpdateOptions::new())
            .await;
        assert!(matches!(result, Err(StoreError::OrderNotFound(_))));
        assert!(!store.order_exists(OrderId::new()).await.unwrap());
    }
}
