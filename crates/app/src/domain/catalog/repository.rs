//! Catalog Repository

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::{
    domain::catalog::models::{CatalogItem, ItemId},
    store::{
        Collection, Direction, Document, DocumentStore, Guard, Query, Snapshots, StoreError, decode,
        encode,
    },
};

#[derive(Clone)]
pub(crate) struct CatalogRepository {
    store: Arc<dyn DocumentStore>,
}

impl CatalogRepository {
    #[must_use]
    pub(crate) fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub(crate) async fn get(&self, item: &ItemId) -> Result<Option<CatalogItem>, StoreError> {
        self.store
            .get(Collection::Products, item.as_str())
            .await?
            .map(decode)
            .transpose()
    }

    pub(crate) async fn list(&self, query: Query) -> Result<Vec<CatalogItem>, StoreError> {
        self.store.query(query).await?.iter().map(Document::decode).collect()
    }

    pub(crate) async fn save(&self, item: &CatalogItem) -> Result<(), StoreError> {
        self.store
            .set(Collection::Products, item.id.as_str(), encode(item)?)
            .await
    }

    pub(crate) async fn patch(
        &self,
        item: &ItemId,
        fields: Map<String, Value>,
    ) -> Result<(), StoreError> {
        self.store
            .update(Collection::Products, item.as_str(), fields)
            .await
    }

    pub(crate) async fn patch_if(
        &self,
        item: &ItemId,
        guard: Guard,
        fields: Map<String, Value>,
    ) -> Result<bool, StoreError> {
        self.store
            .compare_and_update(Collection::Products, item.as_str(), guard, fields)
            .await
    }

    pub(crate) async fn delete(&self, item: &ItemId) -> Result<bool, StoreError> {
        self.store.delete(Collection::Products, item.as_str()).await
    }

    pub(crate) async fn subscribe(&self) -> Result<Snapshots<CatalogItem>, StoreError> {
        Ok(self
            .store
            .subscribe(Query::new(Collection::Products).order_by("name", Direction::Ascending))
            .await?
            .typed())
    }
}
