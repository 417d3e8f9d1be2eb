//! Inventory port for the order-processing system.
//!
//! The inventory owns product stock. The order core reads products through
//! [`InventoryPort::get_product`] and reserves or restores stock through
//! [`InventoryPort::adjust_stock`], which every implementation applies as one
//! atomic conditional update.

pub mod error;
pub mod memory;
pub mod port;
pub mod postgres;
pub mod product;

pub use common::ProductId;
pub use error::{InventoryError, Result};
pub use memory::InMemoryInventory;
pub use port::{InventoryPort, InventoryPortExt};
pub use postgres::PostgresInventory;
pub use product::Product;
