//! Order placement, lookup and status lifecycle.

mod request;
mod reservation;
mod service;
mod state;

pub use request::{CreateOrderRequest, OrderLine};
pub use reservation::StockAdjustment;
pub use service::OrderService;
pub use state::{OrderStatusExt, validate_transition};
