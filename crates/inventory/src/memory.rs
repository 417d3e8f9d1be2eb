use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::{Money, ProductId};
use tokio::sync::RwLock;

use crate::{InventoryError, InventoryPort, Product, Result, port::apply_adjustment};

#[derive(Debug, Default)]
struct InMemoryInventoryState {
    products: HashMap<ProductId, Product>,
    get_calls: usize,
    adjust_calls: usize,
    fail_reserve_for: HashSet<ProductId>,
    fail_on_restock: bool,
    stall_next_reserve: bool,
    stall_next_restock: bool,
    unavailable: bool,
}

/// In-memory inventory for testing and local runs.
///
/// Every adjustment runs under a single write lock, so the
/// check-and-decrement is atomic across concurrent callers.
#[derive(Debug, Clone, Default)]
pub struct InMemoryInventory {
    state: Arc<RwLock<InMemoryInventoryState>>,
}

impl InMemoryInventory {
    /// Creates a new empty inventory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a product to the catalog, replacing any product with the same ID.
    pub async fn insert_product(&self, product: Product) {
        self.state
            .write()
            .await
            .products
            .insert(product.id, product);
    }

    /// Changes a product's price. Returns false if the product doesn't exist.
    pub async fn set_price(&self, product_id: &ProductId, price: Money) -> bool {
        let mut state = self.state.write().await;
        match state.products.get_mut(product_id) {
            Some(product) => {
                product.price = price;
                product.updated_at = Utc::now();
                true
            }
            None => false,
        }
    }

    /// Returns the current stock of a product.
    pub async fn stock_of(&self, product_id: &ProductId) -> Option<u32> {
        self.state
            .read()
            .await
            .products
            .get(product_id)
            .map(|p| p.stock)
    }

    /// Returns the total number of port calls served.
    pub async fn call_count(&self) -> usize {
        let state = self.state.read().await;
        state.get_calls + state.adjust_calls
    }

    /// Makes reservations of the given product fail as if its stock had just
    /// been taken by someone else. Lookups keep reporting the real stock.
    pub async fn fail_reserve_for(&self, product_id: ProductId) {
        self.state.write().await.fail_reserve_for.insert(product_id);
    }

    /// Configures the inventory to reject every restock (positive delta).
    pub async fn set_fail_on_restock(&self, fail: bool) {
        self.state.write().await.fail_on_restock = fail;
    }

    /// Makes the next reservation hang forever before touching stock, as if
    /// the backend stopped answering.
    pub async fn stall_next_reserve(&self) {
        self.state.write().await.stall_next_reserve = true;
    }

    /// Makes the next restock hang forever before touching stock.
    pub async fn stall_next_restock(&self) {
        self.state.write().await.stall_next_restock = true;
    }

    /// Configures the inventory to behave as if its backend were unreachable.
    pub async fn set_unavailable(&self, unavailable: bool) {
        self.state.write().await.unavailable = unavailable;
    }
}

#[async_trait]
impl InventoryPort for InMemoryInventory {
    async fn get_product(&self, product_id: &ProductId) -> Result<Option<Product>> {
        let mut state = self.state.write().await;
        state.get_calls += 1;

        if state.unavailable {
            return Err(InventoryError::Unavailable(
                "in-memory inventory offline".to_string(),
            ));
        }

        Ok(state.products.get(product_id).cloned())
    }

    async fn adjust_stock(&self, product_id: &ProductId, delta: i64) -> Result<u32> {
        let stall = {
            let mut state = self.state.write().await;
            if delta < 0 {
                std::mem::take(&mut state.stall_next_reserve)
            } else {
                std::mem::take(&mut state.stall_next_restock)
            }
        };
        if stall {
            std::future::pending::<()>().await;
        }

        let mut state = self.state.write().await;
        state.adjust_calls += 1;

        if state.unavailable || (delta > 0 && state.fail_on_restock) {
            return Err(InventoryError::Unavailable(
                "in-memory inventory offline".to_string(),
            ));
        }

        let depleted = delta < 0 && state.fail_reserve_for.contains(product_id);
        let product = state
            .products
            .get_mut(product_id)
            .ok_or(InventoryError::ProductNotFound(*product_id))?;

        if depleted {
            return Err(InventoryError::InsufficientStock {
                product_id: *product_id,
                requested: u32::try_from(delta.unsigned_abs()).unwrap_or(u32::MAX),
                available: 0,
            });
        }

        let next = apply_adjustment(*product_id, product.stock, delta)?;
        product.stock = next;
        product.updated_at = Utc::now();

        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InventoryPortExt;
    use std::time::Duration;

    async fn seeded(stock: u32) -> (InMemoryInventory, ProductId) {
        let inventory = InMemoryInventory::new();
        let product = Product::new("Widget", Money::from_cents(1000), stock);
        let id = product.id;
        inventory.insert_product(product).await;
        (inventory, id)
    }

    #[tokio::test]
    async fn test_get_product() {
        let (inventory, id) = seeded(5).await;

        let product = inventory.get_product(&id).await.unwrap().unwrap();
        assert_eq!(product.stock, 5);
        assert!(
            inventory
                .get_product(&ProductId::new())
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_reserve_and_restock() {
        let (inventory, id) = seeded(5).await;

        assert_eq!(inventory.reserve(&id, 3).await.unwrap(), 2);
        assert_eq!(inventory.restock(&id, 3).await.unwrap(), 5);
        assert_eq!(inventory.stock_of(&id).await, Some(5));
    }

    #[tokio::test]
    async fn test_reserve_more_than_available_leaves_stock_untouched() {
        let (inventory, id) = seeded(2).await;

        let result = inventory.reserve(&id, 5).await;
        assert!(matches!(
            result,
            Err(InventoryError::InsufficientStock {
                requested: 5,
                available: 2,
                ..
            })
        ));
        assert_eq!(inventory.stock_of(&id).await, Some(2));
    }

    #[tokio::test]
    async fn test_adjust_unknown_product() {
        let inventory = InMemoryInventory::new();
        let result = inventory.adjust_stock(&ProductId::new(), -1).await;
        assert!(matches!(result, Err(InventoryError::ProductNotFound(_))));
    }

    #[tokio::test]
    async fn test_set_price() {
        let (inventory, id) = seeded(1).await;
        assert!(inventory.set_price(&id, Money::from_cents(1500)).await);

        let product = inventory.get_product(&id).await.unwrap().unwrap();
        assert_eq!(product.price.cents(), 1500);
        assert!(
            !inventory
                .set_price(&ProductId::new(), Money::zero())
                .await
        );
    }

    #[tokio::test]
    async fn test_fault_injection() {
        let (inventory, id) = seeded(5).await;

        inventory.fail_reserve_for(id).await;
        assert!(matches!(
            inventory.reserve(&id, 1).await,
            Err(InventoryError::InsufficientStock { .. })
        ));

        inventory.set_fail_on_restock(true).await;
        assert!(matches!(
            inventory.restock(&id, 1).await,
            Err(InventoryError::Unavailable(_))
        ));

        inventory.set_unavailable(true).await;
        assert!(inventory.get_product(&id).await.is_err());
        assert_eq!(inventory.stock_of(&id).await, Some(5));
    }

    #[tokio::test]
    async fn test_stalled_adjustment_changes_nothing() {
        let (inventory, id) = seeded(5).await;

        inventory.stall_next_reserve().await;
        let stalled =
            tokio::time::timeout(Duration::from_millis(20), inventory.reserve(&id, 2)).await;
        assert!(stalled.is_err());
        assert_eq!(inventory.stock_of(&id).await, Some(5));

        // The stall is one-shot.
        assert_eq!(inventory.reserve(&id, 2).await.unwrap(), 3);

        inventory.stall_next_restock().await;
        let stalled =
            tokio::time::timeout(Duration::from_millis(20), inventory.restock(&id, 2)).await;
        assert!(stalled.is_err());
        assert_eq!(inventory.stock_of(&id).await, Some(3));
        assert_eq!(inventory.restock(&id, 2).await.unwrap(), 5);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_reservations_never_oversell() {
        let (inventory, id) = seeded(10).await;

        let mut handles = Vec::new();
        for _ in 0..25 {
            let inventory = inventory.clone();
            handles.push(tokio::spawn(
                async move { inventory.reserve(&id, 1).await },
            ));
        }

        let mut succeeded = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                succeeded += 1;
            }
        }

        assert_eq!(succeeded, 10);
        assert_eq!(inventory.stock_of(&id).await, Some(0));
        assert_eq!(inventory.call_count().await, 25);
    }
}
