//! Stock held on behalf of an order that is still being created.

use common::ProductId;
use inventory::{InventoryError, InventoryPort, InventoryPortExt};
use serde::Serialize;

/// A quantity of one product taken out of stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StockAdjustment {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Stock reserved during one order creation attempt.
///
/// Must end in either [`commit`](Self::commit) or
/// [`release`](Self::release). An adjustment stays in `held` until its
/// restock has succeeded, so if the guard is dropped part-way (the creating
/// future was cancelled, even mid-release) every unrestored adjustment is
/// handed to a restock task spawned on the current tokio runtime.
pub(crate) struct StockReservation<I>
where
    I: InventoryPort + Clone + 'static,
{
    inventory: I,
    held: Vec<StockAdjustment>,
    /// Restocks already attempted by `release` that failed.
    failed: Vec<StockAdjustment>,
}

impl<I> StockReservation<I>
where
    I: InventoryPort + Clone + 'static,
{
    pub(crate) fn new(inventory: I) -> Self {
        Self {
            inventory,
            held: Vec::new(),
            failed: Vec::new(),
        }
    }

    /// Takes `quantity` units of a product out of stock.
    pub(crate) async fn reserve(
        &mut self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<(), InventoryError> {
        self.inventory.reserve(&product_id, quantity).await?;
        self.held.push(StockAdjustment {
            product_id,
            quantity,
        });
        Ok(())
    }

    /// Keeps the reserved stock; the order now accounts for it.
    pub(crate) fn commit(mut self) {
        self.held.clear();
    }

    /// Gives all reserved stock back, most recent reservation first.
    ///
    /// Returns the adjustments that could not be restored.
    pub(crate) async fn release(mut self) -> Result<(), Vec<StockAdjustment>> {
        while let Some(adjustment) = self.held.last().copied() {
            let restored = restock_one(&self.inventory, adjustment).await;
            self.held.pop();
            if !restored {
                self.failed.push(adjustment);
            }
        }

        let failed = std::mem::take(&mut self.failed);
        if failed.is_empty() {
            Ok(())
        } else {
            Err(failed)
        }
    }
}

impl<I> Drop for StockReservation<I>
where
    I: InventoryPort + Clone + 'static,
{
    fn drop(&mut self) {
        if self.held.is_empty() && self.failed.is_empty() {
            return;
        }

        // Retry earlier failures too; nobody is left to report them.
        let mut pending = std::mem::take(&mut self.failed);
        pending.append(&mut self.held);
        tracing::warn!(
            adjustments = pending.len(),
            "order creation abandoned with stock held, restoring"
        );

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let inventory = self.inventory.clone();
                handle.spawn(async move {
                    let unrestored = restore(&inventory, pending).await;
                    if !unrestored.is_empty() {
                        metrics::counter!("stock_rollback_failures_total").increment(1);
                        tracing::error!(
                            ?unrestored,
                            "abandoned stock could not be restored; inventory is now inconsistent"
                        );
                    }
                });
            }
            Err(_) => {
                metrics::counter!("stock_rollback_failures_total").increment(1);
                tracing::error!(
                    ?pending,
                    "no runtime available to restore abandoned stock; inventory is now inconsistent"
                );
            }
        }
    }
}

async fn restock_one<I: InventoryPort>(inventory: &I, adjustment: StockAdjustment) -> bool {
    match inventory
        .restock(&adjustment.product_id, adjustment.quantity)
        .await
    {
        Ok(_) => true,
        Err(e) => {
            tracing::error!(
                product_id = %adjustment.product_id,
                quantity = adjustment.quantity,
                error = %e,
                "failed to restore reserved stock"
            );
            false
        }
    }
}

/// Restocks in reverse reservation order and returns what failed.
async fn restore<I: InventoryPort>(
    inventory: &I,
    held: Vec<StockAdjustment>,
) -> Vec<StockAdjustment> {
    let mut unrestored = Vec::new();
    for adjustment in held.into_iter().rev() {
        if !restock_one(inventory, adjustment).await {
            unrestored.push(adjustment);
        }
    }
    unrestored
}
