//! Catalog product as seen by the order core.

use chrono::{DateTime, Utc};
use common::{Money, ProductId};
use serde::{Deserialize, Serialize};

/// A priced, stock-limited catalog entry.
///
/// Owned by the inventory; the order core only reads it and adjusts its stock
/// through [`InventoryPort::adjust_stock`](crate::InventoryPort::adjust_stock).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Money,
    pub stock: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Creates a product with a fresh identifier.
    ///
    /// Negative prices are clamped to zero.
    pub fn new(name: impl Into<String>, price: Money, stock: u32) -> Self {
        let now = Utc::now();
        Self {
            id: ProductId::new(),
            name: name.into(),
            price: if price.is_negative() {
                Money::zero()
            } else {
                price
            },
            stock,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns true if at least `quantity` units are available.
    pub fn has_stock(&self, quantity: u32) -> bool {
        self.stock >= quantity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_product() {
        let product = Product::new("Widget", Money::from_cents(1000), 5);
        assert_eq!(product.name, "Widget");
        assert_eq!(product.price.cents(), 1000);
        assert_eq!(product.stock, 5);
        assert_eq!(product.created_at, product.updated_at);
    }

    #[test]
    fn test_negative_price_is_clamped() {
        let product = Product::new("Freebie", Money::from_cents(-1), 1);
        assert!(product.price.is_zero());
    }

    #[test]
    fn test_has_stock() {
        let product = Product::new("Widget", Money::from_cents(1000), 2);
        assert!(product.has_stock(2));
        assert!(!product.has_stock(3));
    }

    #[test]
    fn test_serialization() {
        let product = Product::new("Widget", Money::from_cents(999), 3);
        let json = serde_json::to_string(&product).unwrap();
        let deserialized: Product = serde_json::from_str(&json).unwrap();
        assert_eq!(product, deserialized);
    }
}
