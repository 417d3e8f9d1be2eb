//! Order service: creation with stock reservation, reads, status changes.

use std::time::Instant;

use common::{OrderId, OwnerId};
use inventory::InventoryPort;
use order_store::{
    NewOrder, NewOrderItem, Order, OrderStatus, OrderStore, StoreError, UpdateOptions,
};
use tracing::Instrument;

use crate::error::OrderError;

use super::reservation::StockReservation;
use super::state::{OrderStatusExt, validate_transition};
use super::CreateOrderRequest;

/// Service for managing orders.
///
/// Receives its store and inventory at construction. Order creation is
/// all-or-nothing: every product is looked up and priced first, then stock is
/// reserved through the inventory's atomic decrement, then the order is
/// written. A failure after any stock was taken gives that stock back before
/// returning.
///
/// The write and the decision to keep or return the stock run in their own
/// task. Once the write has started, dropping the `create_order` future no
/// longer affects its outcome: a committed order keeps its stock and a failed
/// write still gives it back.
pub struct OrderService<S, I>
where
    S: OrderStore,
    I: InventoryPort + Clone + 'static,
{
    store: S,
    inventory: I,
}

impl<S, I> OrderService<S, I>
where
    S: OrderStore + Clone + 'static,
    I: InventoryPort + Clone + 'static,
{
    /// Creates a new order service.
    pub fn new(store: S, inventory: I) -> Self {
        Self { store, inventory }
    }

    /// Returns a reference to the underlying inventory.
    pub fn inventory(&self) -> &I {
        &self.inventory
    }

    /// Places an order.
    ///
    /// Returns the persisted order in `Pending` status with its items.
    #[tracing::instrument(
        skip(self, request),
        fields(owner_id = %request.owner_id, lines = request.lines.len())
    )]
    pub async fn create_order(&self, request: CreateOrderRequest) -> Result<Order, OrderError> {
        let start = Instant::now();
        let result = self.place(request).await;
        metrics::histogram!("order_creation_duration_seconds")
            .record(start.elapsed().as_secs_f64());

        match &result {
            Ok(order) => {
                metrics::counter!("orders_created_total").increment(1);
                tracing::info!(
                    order_id = %order.id,
                    total = %order.total_amount,
                    items = order.items.len(),
                    "order created"
                );
            }
            Err(e) => {
                metrics::counter!("order_creation_failures_total", "reason" => e.reason())
                    .increment(1);
                tracing::info!(error = %e, "order rejected");
            }
        }

        result
    }

    async fn place(&self, request: CreateOrderRequest) -> Result<Order, OrderError> {
        request.validate()?;

        // Price every line and check stock before touching anything.
        let quantities = request.requested_quantities();
        let mut items = Vec::with_capacity(request.lines.len());
        for line in &request.lines {
            let product = self
                .inventory
                .get_product(&line.product_id)
                .await?
                .ok_or(OrderError::ProductNotFound {
                    product_id: line.product_id,
                })?;

            let requested = quantities
                .iter()
                .find(|(id, _)| *id == product.id)
                .map_or(line.quantity, |(_, total)| *total);
            if !product.has_stock(requested) {
                return Err(OrderError::InsufficientStock {
                    product_id: product.id,
                    requested,
                    available: product.stock,
                });
            }

            items.push(NewOrderItem::new(product.id, line.quantity, product.price));
        }

        let new_order = NewOrder::new(
            request.owner_id,
            request.shipping_address.trim(),
            items,
        );

        let mut reservation = StockReservation::new(self.inventory.clone());
        for (product_id, quantity) in quantities {
            if let Err(e) = reservation.reserve(product_id, quantity).await {
                return Err(compensate(reservation, e.into()).await);
            }
        }

        let store = self.store.clone();
        let write = tokio::spawn(
            async move {
                match store.create_order_with_items(new_order).await {
                    Ok(order) => {
                        reservation.commit();
                        Ok(order)
                    }
                    Err(e) => Err(compensate(reservation, OrderError::Persistence(e)).await),
                }
            }
            .in_current_span(),
        );

        // A panicking write task drops the reservation, which restores the stock.
        write.await.unwrap_or_else(|e| {
            Err(OrderError::Persistence(StoreError::Unavailable(format!(
                "order write task failed: {e}"
            ))))
        })
    }

    /// Loads an order with its items.
    #[tracing::instrument(skip(self))]
    pub async fn get_order(&self, order_id: OrderId) -> Result<Order, OrderError> {
        self.store
            .get_order(order_id)
            .await?
            .ok_or(OrderError::OrderNotFound(order_id))
    }

    /// Lists all orders, most recent first, without items.
    #[tracing::instrument(skip(self))]
    pub async fn list_orders(&self) -> Result<Vec<Order>, OrderError> {
        Ok(self.store.list_orders().await?)
    }

    /// Lists an owner's orders, most recent first, without items.
    #[tracing::instrument(skip(self))]
    pub async fn list_orders_by_owner(&self, owner_id: OwnerId) -> Result<Vec<Order>, OrderError> {
        Ok(self.store.list_orders_by_owner(owner_id).await?)
    }

    /// Moves an order to the status named by `requested`.
    ///
    /// Unknown names fail as an illegal transition. The write is guarded by
    /// the version that was read, so a concurrent change fails with
    /// `ConcurrentModification` instead of being overwritten.
    #[tracing::instrument(skip(self))]
    pub async fn update_order_status(
        &self,
        order_id: OrderId,
        requested: &str,
    ) -> Result<Order, OrderError> {
        let order = self.get_order(order_id).await?;
        let target = validate_transition(order.status, requested).inspect_err(|_| {
            metrics::counter!("order_status_rejections_total").increment(1);
        })?;
        self.apply_transition(order, target).await
    }

    /// Typed form of [`update_order_status`](Self::update_order_status).
    #[tracing::instrument(skip(self))]
    pub async fn transition_order(
        &self,
        order_id: OrderId,
        target: OrderStatus,
    ) -> Result<Order, OrderError> {
        let order = self.get_order(order_id).await?;
        if !order.status.can_transition_to(target) {
            metrics::counter!("order_status_rejections_total").increment(1);
            return Err(OrderError::IllegalTransition {
                from: order.status,
                to: target.to_string(),
            });
        }
        self.apply_transition(order, target).await
    }

    async fn apply_transition(&self, order: Order, target: OrderStatus) -> Result<Order, OrderError> {
        let from = order.status;
        let updated = self
            .store
            .update_status(order.id, target, UpdateOptions::expect_version(order.version))
            .await?;

        metrics::counter!(
            "order_status_transitions_total",
            "from" => from.as_str(),
            "to" => target.as_str()
        )
        .increment(1);
        tracing::info!(order_id = %order.id, %from, to = %target, "order status changed");

        Ok(updated)
    }
}

/// Returns the stock of a failed attempt and decides the final error.
async fn compensate<I>(reservation: StockReservation<I>, cause: OrderError) -> OrderError
where
    I: InventoryPort + Clone + 'static,
{
    tracing::warn!(error = %cause, "order creation failed after reserving stock, rolling back");
    metrics::counter!("stock_rollbacks_total").increment(1);

    match reservation.release().await {
        Ok(()) => cause,
        Err(unrestored) => {
            metrics::counter!("stock_rollback_failures_total").increment(1);
            tracing::error!(
                error = %cause,
                ?unrestored,
                "stock rollback failed; inventory no longer matches committed orders"
            );
            OrderError::RollbackFailed {
                cause: Box::new(cause),
                unrestored,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::OrderLine;
    use common::{Money, ProductId};
    use inventory::{InMemoryInventory, Product};
    use order_store::InMemoryOrderStore;

    struct Fixture {
        service: OrderService<InMemoryOrderStore, InMemoryInventory>,
        store: InMemoryOrderStore,
        inventory: InMemoryInventory,
    }

    async fn setup() -> Fixture {
        let store = InMemoryOrderStore::new();
        let inventory = InMemoryInventory::new();
        let service = OrderService::new(store.clone(), inventory.clone());
        Fixture {
            service,
            store,
            inventory,
        }
    }

    async fn add_product(inventory: &InMemoryInventory, cents: i64, stock: u32) -> ProductId {
        let product = Product::new("Widget", Money::from_cents(cents), stock);
        let id = product.id;
        inventory.insert_product(product).await;
        id
    }

    #[tokio::test]
    async fn test_create_order_prices_and_reserves() {
        let fx = setup().await;
        let widget = add_product(&fx.inventory, 1000, 5).await;
        let gadget = add_product(&fx.inventory, 250, 10).await;

        let request = CreateOrderRequest::new(OwnerId::new(), "123 Main St")
            .with_line(widget, 3)
            .with_line(gadget, 4);
        let order = fx.service.create_order(request).await.unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total_amount.cents(), 4000);
        assert_eq!(order.items.len(), 2);
        assert_eq!(order.items[0].unit_price.cents(), 1000);
        assert_eq!(order.items[1].subtotal.cents(), 1000);
        assert_eq!(fx.inventory.stock_of(&widget).await, Some(2));
        assert_eq!(fx.inventory.stock_of(&gadget).await, Some(6));
    }

    #[tokio::test]
    async fn test_shipping_address_is_trimmed() {
        let fx = setup().await;
        let widget = add_product(&fx.inventory, 1000, 5).await;

        let request = CreateOrderRequest::new(OwnerId::new(), "  addr  ").with_line(widget, 1);
        let order = fx.service.create_order(request).await.unwrap();
        assert_eq!(order.shipping_address, "addr");
    }

    #[tokio::test]
    async fn test_unknown_product_touches_nothing() {
        let fx = setup().await;
        let widget = add_product(&fx.inventory, 1000, 5).await;
        let missing = ProductId::new();

        let request = CreateOrderRequest::new(OwnerId::new(), "addr")
            .with_line(widget, 1)
            .with_line(missing, 1);
        let err = fx.service.create_order(request).await.unwrap_err();

        assert!(matches!(err, OrderError::ProductNotFound { product_id } if product_id == missing));
        assert_eq!(fx.inventory.stock_of(&widget).await, Some(5));
        assert_eq!(fx.store.order_count().await, 0);
    }

    #[tokio::test]
    async fn test_duplicate_lines_are_checked_cumulatively() {
        let fx = setup().await;
        let widget = add_product(&fx.inventory, 1000, 4).await;

        let request = CreateOrderRequest {
            owner_id: OwnerId::new(),
            shipping_address: "addr".to_string(),
            lines: vec![OrderLine::new(widget, 3), OrderLine::new(widget, 2)],
        };
        let err = fx.service.create_order(request).await.unwrap_err();

        assert!(matches!(
            err,
            OrderError::InsufficientStock {
                requested: 5,
                available: 4,
                ..
            }
        ));
        assert_eq!(fx.inventory.stock_of(&widget).await, Some(4));
    }

    #[tokio::test]
    async fn test_persistence_failure_rolls_back_stock() {
        let fx = setup().await;
        let widget = add_product(&fx.inventory, 1000, 5).await;
        fx.store.set_fail_on_create(true);

        let request = CreateOrderRequest::new(OwnerId::new(), "addr").with_line(widget, 2);
        let err = fx.service.create_order(request).await.unwrap_err();

        assert!(matches!(err, OrderError::Persistence(_)));
        assert_eq!(fx.inventory.stock_of(&widget).await, Some(5));
    }

    #[tokio::test]
    async fn test_get_order() {
        let fx = setup().await;
        let widget = add_product(&fx.inventory, 1000, 5).await;

        let err = fx.service.get_order(OrderId::new()).await.unwrap_err();
        assert!(matches!(err, OrderError::OrderNotFound(_)));

        let request = CreateOrderRequest::new(OwnerId::new(), "addr").with_line(widget, 1);
        let created = fx.service.create_order(request).await.unwrap();

        let loaded = fx.service.get_order(created.id).await.unwrap();
        assert_eq!(loaded.id, created.id);
        assert_eq!(loaded.items.len(), 1);
    }

    #[tokio::test]
    async fn test_full_status_lifecycle() {
        let fx = setup().await;
        let widget = add_product(&fx.inventory, 1000, 5).await;
        let request = CreateOrderRequest::new(OwnerId::new(), "addr").with_line(widget, 1);
        let order = fx.service.create_order(request).await.unwrap();

        for status in ["confirmed", "shipped", "delivered"] {
            let updated = fx
                .service
                .update_order_status(order.id, status)
                .await
                .unwrap();
            assert_eq!(updated.status.as_str(), status);
        }
    }

    #[tokio::test]
    async fn test_transition_order_rejects_illegal_target() {
        let fx = setup().await;
        let widget = add_product(&fx.inventory, 1000, 5).await;
        let request = CreateOrderRequest::new(OwnerId::new(), "addr").with_line(widget, 1);
        let order = fx.service.create_order(request).await.unwrap();

        let err = fx
            .service
            .transition_order(order.id, OrderStatus::Delivered)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            OrderError::IllegalTransition { from: OrderStatus::Pending, ref to } if to == "delivered"
        ));

        let cancelled = fx
            .service
            .transition_order(order.id, OrderStatus::Cancelled)
            .await
            .unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_update_status_of_missing_order() {
        let fx = setup().await;
        let err = fx
            .service
            .update_order_status(OrderId::new(), "confirmed")
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::OrderNotFound(_)));
    }
}
