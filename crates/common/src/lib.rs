//! Shared types for the order-processing system.

mod money;
mod types;

pub use money::Money;
pub use types::{OrderId, OrderItemId, OwnerId, ProductId};
