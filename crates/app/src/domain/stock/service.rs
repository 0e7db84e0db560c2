//! Stock gate.
//!
//! Reads are plain point reads. Every change to `stockCount` is a
//! compare-and-swap guarded on the value just read, retried a bounded number of
//! times, so concurrent reservations can never take stock below zero.

use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use serde_json::json;
use tracing::{debug, info};

use crate::{
    domain::{
        catalog::{
            models::{CatalogItem, ItemId, fields::{SOLD_COUNT, STOCK_COUNT}},
            repository::CatalogRepository,
        },
        stock::StockError,
    },
    store::{DocumentStore, Guard, fields},
};

/// Attempts at a guarded stock write before giving up with [`StockError::Contended`].
pub const MAX_STOCK_ATTEMPTS: usize = 8;

#[derive(Clone)]
pub struct RemoteStockGate {
    catalog: CatalogRepository,
}

impl RemoteStockGate {
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            catalog: CatalogRepository::new(store),
        }
    }

    async fn load(&self, item: &ItemId) -> Result<CatalogItem, StockError> {
        self.catalog.get(item).await?.ok_or(StockError::ItemMissing)
    }

    /// Apply `change` to the current item until the guarded write lands.
    ///
    /// `change` returns the new `(stockCount, soldCount)` or rejects the item.
    async fn swap<F>(&self, item: &ItemId, change: F) -> Result<u32, StockError>
    where
        F: Fn(&CatalogItem) -> Result<(u32, u64), StockError> + Send + Sync,
    {
        for attempt in 1..=MAX_STOCK_ATTEMPTS {
            let current = self.load(item).await?;
            let (stock, sold) = change(&current)?;

            let written = self
                .catalog
                .patch_if(
                    item,
                    Guard::new(STOCK_COUNT, current.stock_count),
                    fields([(STOCK_COUNT, json!(stock)), (SOLD_COUNT, json!(sold))]),
                )
                .await?;

            if written {
                return Ok(stock);
            }

            debug!(item_id = %item, attempt, "stock changed underneath, retrying");
        }

        Err(StockError::Contended)
    }
}

#[async_trait]
impl StockGate for RemoteStockGate {
    async fn check_stock(&self, item: &ItemId) -> Result<u32, StockError> {
        Ok(self.load(item).await?.stock_count)
    }

    #[tracing::instrument(name = "stock.gate.reserve", skip(self, item), fields(item_id = %item), err)]
    async fn reserve(&self, item: &ItemId, quantity: u32) -> Result<u32, StockError> {
        if quantity == 0 {
            return Err(StockError::InvalidQuantity);
        }

        let remaining = self
            .swap(item, |current| {
                if current.stock_count == 0 {
                    return Err(StockError::OutOfStock);
                }

                let Some(stock) = current.stock_count.checked_sub(quantity) else {
                    return Err(StockError::InsufficientStock {
                        available: current.stock_count,
                        requested: quantity,
                    });
                };

                Ok((stock, current.sold_count.saturating_add(u64::from(quantity))))
            })
            .await?;

        info!(item_id = %item, quantity, remaining, "reserved stock");

        Ok(remaining)
    }

    #[tracing::instrument(name = "stock.gate.release", skip(self, item), fields(item_id = %item), err)]
    async fn release(&self, item: &ItemId, quantity: u32) -> Result<u32, StockError> {
        let restored = self
            .swap(item, |current| {
                Ok((
                    current.stock_count.saturating_add(quantity),
                    current.sold_count.saturating_sub(u64::from(quantity)),
                ))
            })
            .await?;

        info!(item_id = %item, quantity, restored, "released stock");

        Ok(restored)
    }

    #[tracing::instrument(name = "stock.gate.restock", skip(self, item), fields(item_id = %item), err)]
    async fn restock(&self, item: &ItemId, quantity: u32) -> Result<u32, StockError> {
        if quantity == 0 {
            return Err(StockError::InvalidQuantity);
        }

        let stock = self
            .swap(item, |current| {
                Ok((current.stock_count.saturating_add(quantity), current.sold_count))
            })
            .await?;

        info!(item_id = %item, quantity, stock, "restocked item");

        Ok(stock)
    }
}

/// Guards every quantity-affecting decision on the remote stock counter.
#[automock]
#[async_trait]
pub trait StockGate: Send + Sync {
    /// Current `stockCount` of an item.
    async fn check_stock(&self, item: &ItemId) -> Result<u32, StockError>;

    /// Take `quantity` units out of stock and count them as sold. Returns the
    /// remaining stock.
    async fn reserve(&self, item: &ItemId, quantity: u32) -> Result<u32, StockError>;

    /// Give back units taken by [`StockGate::reserve`]. Returns the new stock.
    async fn release(&self, item: &ItemId, quantity: u32) -> Result<u32, StockError>;

    /// Add newly delivered units. Returns the new stock.
    async fn restock(&self, item: &ItemId, quantity: u32) -> Result<u32, StockError>;
}

#[cfg(test)]
mod tests {
    use futures::future::join_all;
    use testresult::TestResult;

    use crate::test::{TestContext, helpers::seed_item};

    use super::*;

    #[tokio::test]
    async fn reserve_decrements_stock_and_counts_sales() -> TestResult {
        let ctx = TestContext::new();
        let item = seed_item(&ctx, "42", "Kibble", 100_000, 5).await?;

        let remaining = ctx.app.stock.reserve(&item.id, 2).await?;
        let stored = ctx.app.catalog.get_item(&item.id).await?;

        assert_eq!(remaining, 3);
        assert_eq!(stored.stock_count, 3);
        assert_eq!(stored.sold_count, 2);

        Ok(())
    }

    #[tokio::test]
    async fn reserve_rejects_short_stock_without_writing() -> TestResult {
        let ctx = TestContext::new();
        let empty = seed_item(&ctx, "1", "Kibble", 100_000, 0).await?;
        let low = seed_item(&ctx, "2", "Catnip", 20_000, 1).await?;

        assert!(matches!(
            ctx.app.stock.reserve(&empty.id, 1).await,
            Err(StockError::OutOfStock)
        ));
        assert!(matches!(
            ctx.app.stock.reserve(&low.id, 2).await,
            Err(StockError::InsufficientStock {
                available: 1,
                requested: 2
            })
        ));
        assert_eq!(ctx.app.stock.check_stock(&low.id).await?, 1);

        Ok(())
    }

    #[tokio::test]
    async fn missing_items_are_reported() {
        let ctx = TestContext::new();

        assert!(matches!(
            ctx.app.stock.check_stock(&ItemId::new("404")).await,
            Err(StockError::ItemMissing)
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_reservations_never_oversell() -> TestResult {
        let ctx = TestContext::new();
        let item = seed_item(&ctx, "42", "Kibble", 100_000, 5).await?;

        let attempts = (0..10).map(|_| {
            let stock = Arc::clone(&ctx.app.stock);
            let id = item.id.clone();

            tokio::spawn(async move { stock.reserve(&id, 1).await })
        });

        let results = join_all(attempts).await;

        let reserved = results
            .into_iter()
            .filter(|result| matches!(result, Ok(Ok(_))))
            .count();

        let stored = ctx.app.catalog.get_item(&item.id).await?;

        assert_eq!(reserved, 5);
        assert_eq!(stored.stock_count, 0);
        assert_eq!(stored.sold_count, 5);

        Ok(())
    }

    #[tokio::test]
    async fn release_and_restock_add_units_back() -> TestResult {
        let ctx = TestContext::new();
        let item = seed_item(&ctx, "42", "Kibble", 100_000, 5).await?;

        ctx.app.stock.reserve(&item.id, 3).await?;
        ctx.app.stock.release(&item.id, 3).await?;

        assert_eq!(ctx.app.stock.restock(&item.id, 10).await?, 15);

        let stored = ctx.app.catalog.get_item(&item.id).await?;

        assert_eq!(stored.sold_count, 0);

        Ok(())
    }
}
