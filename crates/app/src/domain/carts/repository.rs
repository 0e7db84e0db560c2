//! Cart Lines Repository

use std::sync::Arc;

use serde_json::json;

use crate::{
    domain::carts::models::{CartLine, fields},
    identity::OwnerId,
    store::{
        Collection, Direction, Document, DocumentStore, Query, Snapshots, StoreError, encode,
    },
};

#[derive(Clone)]
pub(crate) struct CartLinesRepository {
    store: Arc<dyn DocumentStore>,
}

impl CartLinesRepository {
    #[must_use]
    pub(crate) fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    fn owner_query(owner: &OwnerId) -> Query {
        Query::new(Collection::Carts)
            .where_eq(fields::OWNER_ID, owner.as_str())
            .order_by(fields::SEQUENCE_INDEX, Direction::Ascending)
    }

    pub(crate) async fn list(&self, owner: &OwnerId) -> Result<Vec<CartLine>, StoreError> {
        self.store
            .query(Self::owner_query(owner))
            .await?
            .iter()
            .map(Document::decode)
            .collect()
    }

    pub(crate) async fn create(&self, line: &CartLine) -> Result<(), StoreError> {
        self.store
            .set(Collection::Carts, &line.key(), encode(line)?)
            .await
    }

    pub(crate) async fn set_quantity(&self, line: &CartLine, quantity: u32) -> Result<(), StoreError> {
        self.store
            .update(
                Collection::Carts,
                &line.key(),
                crate::store::fields([(fields::QUANTITY, json!(quantity))]),
            )
            .await
    }

    pub(crate) async fn delete(&self, line: &CartLine) -> Result<bool, StoreError> {
        self.store.delete(Collection::Carts, &line.key()).await
    }

    pub(crate) async fn subscribe(&self, owner: &OwnerId) -> Result<Snapshots<CartLine>, StoreError> {
        Ok(self.store.subscribe(Self::owner_query(owner)).await?.typed())
    }
}
