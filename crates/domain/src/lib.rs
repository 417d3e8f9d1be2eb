//! Order domain layer.
//!
//! This crate ties the inventory and the order store together:
//! - `OrderService` for all-or-nothing order creation with stock reservation
//! - The order status state machine (`OrderStatusExt`, `validate_transition`)
//! - `OrderError` with its `ErrorKind` classification

pub mod error;
pub mod order;

pub use error::{ErrorKind, OrderError};
pub use order::{
    CreateOrderRequest, OrderLine, OrderService, OrderStatusExt, StockAdjustment,
    validate_transition,
};
