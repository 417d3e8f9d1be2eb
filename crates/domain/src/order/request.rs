//! Typed order creation request.

use common::{OwnerId, ProductId};

use crate::error::OrderError;

/// One requested product and quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

impl OrderLine {
    pub fn new(product_id: ProductId, quantity: u32) -> Self {
        Self {
            product_id,
            quantity,
        }
    }
}

/// A request to place an order, built once at the transport boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateOrderRequest {
    pub owner_id: OwnerId,
    pub shipping_address: String,
    pub lines: Vec<OrderLine>,
}

impl CreateOrderRequest {
    /// Creates a request with no lines.
    pub fn new(owner_id: OwnerId, shipping_address: impl Into<String>) -> Self {
        Self {
            owner_id,
            shipping_address: shipping_address.into(),
            lines: Vec::new(),
        }
    }

    /// Appends a line.
    pub fn with_line(mut self, product_id: ProductId, quantity: u32) -> Self {
        self.lines.push(OrderLine::new(product_id, quantity));
        self
    }

    /// Checks the request shape without touching any backend.
    pub fn validate(&self) -> Result<(), OrderError> {
        if self.lines.is_empty() {
            return Err(OrderError::EmptyOrder);
        }

        if self.shipping_address.trim().is_empty() {
            return Err(OrderError::MissingShippingAddress);
        }

        if let Some(line) = self.lines.iter().find(|line| line.quantity == 0) {
            return Err(OrderError::InvalidQuantity {
                product_id: line.product_id,
                quantity: line.quantity,
            });
        }

        Ok(())
    }

    /// Total quantity per product, in order of first appearance.
    pub fn requested_quantities(&self) -> Vec<(ProductId, u32)> {
        let mut totals: Vec<(ProductId, u32)> = Vec::new();
        for line in &self.lines {
            match totals.iter_mut().find(|(id, _)| *id == line.product_id) {
                Some((_, quantity)) => *quantity = quantity.saturating_add(line.quantity),
                None => totals.push((line.product_id, line.quantity)),
            }
        }
        totals
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_request() {
        let request = CreateOrderRequest::new(OwnerId::new(), "addr").with_line(ProductId::new(), 3);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_empty_order() {
        let request = CreateOrderRequest::new(OwnerId::new(), "addr");
        assert!(matches!(request.validate(), Err(OrderError::EmptyOrder)));
    }

    #[test]
    fn test_blank_shipping_address() {
        let request =
            CreateOrderRequest::new(OwnerId::new(), "   ").with_line(ProductId::new(), 1);
        assert!(matches!(
            request.validate(),
            Err(OrderError::MissingShippingAddress)
        ));
    }

    #[test]
    fn test_zero_quantity() {
        let product_id = ProductId::new();
        let request = CreateOrderRequest::new(OwnerId::new(), "addr")
            .with_line(ProductId::new(), 1)
            .with_line(product_id, 0);

        assert!(matches!(
            request.validate(),
            Err(OrderError::InvalidQuantity { product_id: p, quantity: 0 }) if p == product_id
        ));
    }

    #[test]
    fn test_requested_quantities_merges_duplicates_in_first_seen_order() {
        let widget = ProductId::new();
        let gadget = ProductId::new();
        let request = CreateOrderRequest::new(OwnerId::new(), "addr")
            .with_line(widget, 2)
            .with_line(gadget, 1)
            .with_line(widget, 3);

        assert_eq!(request.requested_quantities(), vec![(widget, 5), (gadget, 1)]);
    }
}
