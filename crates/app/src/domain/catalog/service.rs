//! Catalog service.

use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use tracing::debug;

use crate::{
    domain::catalog::{
        errors::CatalogServiceError,
        models::{CatalogItem, ItemId, fields},
        repository::CatalogRepository,
    },
    store::{Collection, Direction, DocumentStore, Query, Snapshots},
};

#[derive(Clone)]
pub struct RemoteCatalogService {
    repository: CatalogRepository,
}

impl RemoteCatalogService {
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            repository: CatalogRepository::new(store),
        }
    }
}

#[async_trait]
impl CatalogService for RemoteCatalogService {
    async fn get_item(&self, item: &ItemId) -> Result<CatalogItem, CatalogServiceError> {
        self.repository
            .get(item)
            .await?
            .ok_or(CatalogServiceError::ItemMissing)
    }

    async fn list_items(
        &self,
        category: Option<String>,
    ) -> Result<Vec<CatalogItem>, CatalogServiceError> {
        let mut query = Query::new(Collection::Products);

        if let Some(category) = category {
            query = query.where_eq(fields::CATEGORY, category);
        }

        let items = self
            .repository
            .list(query.order_by("name", Direction::Ascending))
            .await?;

        debug!(count = items.len(), "listed catalog items");

        Ok(items)
    }

    async fn best_sellers(&self, limit: usize) -> Result<Vec<CatalogItem>, CatalogServiceError> {
        Ok(self
            .repository
            .list(
                Query::new(Collection::Products)
                    .order_by(fields::SOLD_COUNT, Direction::Descending)
                    .limit(limit),
            )
            .await?)
    }

    async fn in_price_range(
        &self,
        min: u64,
        max: u64,
    ) -> Result<Vec<CatalogItem>, CatalogServiceError> {
        if min > max {
            return Err(CatalogServiceError::InvalidPriceRange { min, max });
        }

        Ok(self
            .repository
            .list(
                Query::new(Collection::Products)
                    .where_gte(fields::PRICE, min)
                    .where_lte(fields::PRICE, max)
                    .order_by(fields::PRICE, Direction::Ascending),
            )
            .await?)
    }

    async fn subscribe(&self) -> Result<Snapshots<CatalogItem>, CatalogServiceError> {
        Ok(self.repository.subscribe().await?)
    }
}

#[automock]
#[async_trait]
pub trait CatalogService: Send + Sync {
    /// Retrieve a single item.
    async fn get_item(&self, item: &ItemId) -> Result<CatalogItem, CatalogServiceError>;

    /// All items, optionally restricted to one category, by name.
    async fn list_items(
        &self,
        category: Option<String>,
    ) -> Result<Vec<CatalogItem>, CatalogServiceError>;

    /// Items with the most units sold, best first.
    async fn best_sellers(&self, limit: usize) -> Result<Vec<CatalogItem>, CatalogServiceError>;

    /// Items priced between `min` and `max` inclusive, cheapest first.
    async fn in_price_range(
        &self,
        min: u64,
        max: u64,
    ) -> Result<Vec<CatalogItem>, CatalogServiceError>;

    /// Live view of the whole catalog.
    async fn subscribe(&self) -> Result<Snapshots<CatalogItem>, CatalogServiceError>;
}
