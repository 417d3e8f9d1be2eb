//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::{ErrorKind, OrderError};
use inventory::InventoryError;
use order_store::StoreError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Order operation error.
    Order(OrderError),
    /// Inventory lookup error outside of an order operation.
    Inventory(InventoryError),
}

impl ApiError {
    /// Returns the HTTP status this error is reported with.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Order(err) => order_error_status(err),
            ApiError::Inventory(err) => inventory_error_status(err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ApiError::NotFound(msg) | ApiError::BadRequest(msg) => msg,
            ApiError::Order(err) => {
                if status.is_server_error() {
                    tracing::error!(error = %err, kind = ?err.kind(), "order operation failed");
                }
                err.to_string()
            }
            ApiError::Inventory(err) => {
                if status.is_server_error() {
                    tracing::error!(error = %err, "inventory lookup failed");
                }
                err.to_string()
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn order_error_status(err: &OrderError) -> StatusCode {
    match err.kind() {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::Resource => match err {
            OrderError::InsufficientStock { .. } => StatusCode::CONFLICT,
            _ => StatusCode::NOT_FOUND,
        },
        ErrorKind::Consistency => StatusCode::CONFLICT,
        ErrorKind::Infrastructure => match err {
            OrderError::Inventory(e) => inventory_error_status(e),
            OrderError::Persistence(StoreError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            OrderError::Persistence(StoreError::Database(sqlx::Error::PoolTimedOut)) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        },
        ErrorKind::Fatal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn inventory_error_status(err: &InventoryError) -> StatusCode {
    match err {
        InventoryError::ProductNotFound(_) => StatusCode::NOT_FOUND,
        InventoryError::InsufficientStock { .. } => StatusCode::CONFLICT,
        InventoryError::Unavailable(_) | InventoryError::Database(sqlx::Error::PoolTimedOut) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<OrderError> for ApiError {
    fn from(err: OrderError) -> Self {
        ApiError::Order(err)
    }
}

impl From<InventoryError> for ApiError {
    fn from(err: InventoryError) -> Self {
        ApiError::Inventory(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{OrderId, ProductId};
    use order_store::OrderStatus;

    #[test]
    fn test_order_error_statuses() {
        let product_id = ProductId::new();
        let cases = [
            (OrderError::EmptyOrder, StatusCode::BAD_REQUEST),
            (OrderError::MissingShippingAddress, StatusCode::BAD_REQUEST),
            (
                OrderError::ProductNotFound { product_id },
                StatusCode::NOT_FOUND,
            ),
            (
                OrderError::InsufficientStock {
                    product_id,
                    requested: 3,
                    available: 1,
                },
                StatusCode::CONFLICT,
            ),
            (
                OrderError::OrderNotFound(OrderId::new()),
                StatusCode::NOT_FOUND,
            ),
            (
                OrderError::IllegalTransition {
                    from: OrderStatus::Shipped,
                    to: "pending".to_string(),
                },
                StatusCode::CONFLICT,
            ),
            (
                OrderError::ConcurrentModification {
                    order_id: OrderId::new(),
                },
                StatusCode::CONFLICT,
            ),
            (
                OrderError::Inventory(InventoryError::Unavailable("down".to_string())),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                OrderError::Persistence(StoreError::Corrupt("bad row".to_string())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                OrderError::RollbackFailed {
                    cause: Box::new(OrderError::EmptyOrder),
                    unrestored: Vec::new(),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            let label = err.to_string();
            assert_eq!(ApiError::from(err).status(), expected, "{label}");
        }
    }

    #[test]
    fn test_inventory_not_found_is_404() {
        let err = ApiError::from(InventoryError::ProductNotFound(ProductId::new()));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }
}
