//! Orders Repository

use std::sync::Arc;

use petshop::status::OrderStatus;
use serde_json::json;

use crate::{
    domain::{
        catalog::models::ItemId,
        orders::models::{Order, OrderId, fields},
    },
    identity::OwnerId,
    store::{
        Collection, Direction, Document, DocumentStore, Guard, Query, StoreError, decode, encode,
    },
};

#[derive(Clone)]
pub(crate) struct OrdersRepository {
    store: Arc<dyn DocumentStore>,
}

impl OrdersRepository {
    #[must_use]
    pub(crate) fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    async fn list(&self, query: Query) -> Result<Vec<Order>, StoreError> {
        self.store
            .query(query.order_by(fields::CREATED_AT, Direction::Descending))
            .await?
            .iter()
            .map(Document::decode)
            .collect()
    }

    pub(crate) async fn get(&self, order: &OrderId) -> Result<Option<Order>, StoreError> {
        self.store
            .get(Collection::Orders, order.as_str())
            .await?
            .map(decode)
            .transpose()
    }

    /// Sequence indices already used for one owner and item.
    pub(crate) async fn sequences(
        &self,
        owner: &OwnerId,
        item: &ItemId,
    ) -> Result<Vec<u64>, StoreError> {
        Ok(self
            .store
            .query(
                Query::new(Collection::Orders)
                    .where_eq(fields::OWNER_ID, owner.as_str())
                    .where_eq(fields::ITEM_ID, item.as_str()),
            )
            .await?
            .iter()
            .map(Document::decode::<Order>)
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .map(|order| order.sequence_index)
            .collect())
    }

    pub(crate) async fn for_owner(&self, owner: &OwnerId) -> Result<Vec<Order>, StoreError> {
        self.list(Query::new(Collection::Orders).where_eq(fields::OWNER_ID, owner.as_str()))
            .await
    }

    pub(crate) async fn all(&self, status: Option<OrderStatus>) -> Result<Vec<Order>, StoreError> {
        let mut query = Query::new(Collection::Orders);

        if let Some(status) = status {
            query = query.where_eq(fields::STATUS, status.as_str());
        }

        self.list(query).await
    }

    /// Store a new order. Returns `false` when its key is already taken.
    pub(crate) async fn create(&self, order: &Order) -> Result<bool, StoreError> {
        self.store
            .create(Collection::Orders, order.order_id.as_str(), encode(order)?)
            .await
    }

    /// Move an order from `from` to `to`. Returns `false` when the stored status
    /// is no longer `from`.
    pub(crate) async fn set_status(
        &self,
        order: &OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<bool, StoreError> {
        self.store
            .compare_and_update(
                Collection::Orders,
                order.as_str(),
                Guard::new(fields::STATUS, from.as_str()),
                crate::store::fields([(fields::STATUS, json!(to))]),
            )
            .await
    }
}
