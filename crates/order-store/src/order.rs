//! Persisted order records and the write model used to create them.

use chrono::{DateTime, Utc};
use common::{Money, OrderId, OrderItemId, OwnerId, ProductId};
use serde::{Deserialize, Serialize};

use crate::OrderStatus;

/// Version number of an order row, used for optimistic concurrency control.
///
/// A freshly created order is at version 1; every status change increments it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Version(i64);

impl Version {
    /// Creates a new version from a raw value.
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the version of a newly created order.
    pub fn first() -> Self {
        Self(1)
    }

    /// Returns the next version.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns the raw version value.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A line item of a persisted order. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: u32,
    /// Unit price captured when the order was placed.
    pub unit_price: Money,
    pub subtotal: Money,
    pub created_at: DateTime<Utc>,
}

/// A persisted order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub owner_id: OwnerId,
    pub status: OrderStatus,
    /// Sum of item subtotals, fixed at creation.
    pub total_amount: Money,
    pub shipping_address: String,
    pub version: Version,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Line items in request order. Empty when the order came from a list call.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<OrderItem>,
}

impl Order {
    /// Sums the subtotals of the loaded items.
    pub fn items_total(&self) -> Money {
        self.items.iter().map(|item| item.subtotal).sum()
    }
}

/// A line item to be written as part of a [`NewOrder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub quantity: u32,
    pub unit_price: Money,
}

impl NewOrderItem {
    pub fn new(product_id: ProductId, quantity: u32, unit_price: Money) -> Self {
        Self {
            product_id,
            quantity,
            unit_price,
        }
    }

    /// Returns quantity * unit_price.
    pub fn subtotal(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

/// Everything needed to persist a new order together with its items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub owner_id: OwnerId,
    pub shipping_address: String,
    pub items: Vec<NewOrderItem>,
}

impl NewOrder {
    pub fn new(
        owner_id: OwnerId,
        shipping_address: impl Into<String>,
        items: Vec<NewOrderItem>,
    ) -> Self {
        Self {
            owner_id,
            shipping_address: shipping_address.into(),
            items,
        }
    }

    /// The order total, derived from the items so it always reconciles.
    pub fn total_amount(&self) -> Money {
        self.items.iter().map(NewOrderItem::subtotal).sum()
    }

    /// Materializes the order with fresh identifiers and timestamps.
    ///
    /// Used by stores that do not generate identifiers in the database.
    pub fn into_order(self, now: DateTime<Utc>) -> Order {
        let order_id = OrderId::new();
        let total_amount = self.total_amount();
        let items = self
            .items
            .into_iter()
            .map(|item| OrderItem {
                id: OrderItemId::new(),
                order_id,
                product_id: item.product_id,
                quantity: item.quantity,
                unit_price: item.unit_price,
                subtotal: item.subtotal(),
                created_at: now,
            })
            .collect();

        Order {
            id: order_id,
            owner_id: self.owner_id,
            status: OrderStatus::Pending,
            total_amount,
            shipping_address: self.shipping_address,
            version: Version::first(),
            created_at: now,
            updated_at: now,
            items,
        }
    }
}
