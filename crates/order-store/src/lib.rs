//! Durable storage for orders and their line items.
//!
//! An order and its items are written in one atomic operation and are
//! afterwards only changed through [`OrderStore::update_status`], which
//! supports optimistic concurrency through [`UpdateOptions`].

pub mod error;
pub mod memory;
pub mod order;
pub mod postgres;
pub mod status;
pub mod store;

pub use common::{OrderId, OrderItemId, OwnerId};
pub use error::{Result, StoreError};
pub use memory::InMemoryOrderStore;
pub use order::{NewOrder, NewOrderItem, Order, OrderItem, Version};
pub use postgres::PostgresOrderStore;
pub use status::{OrderStatus, ParseStatusError};
pub use store::{OrderStore, OrderStoreExt, UpdateOptions};
