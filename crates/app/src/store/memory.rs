//! In-memory document store.

use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use rustc_hash::FxHashMap;
use serde_json::{Map, Value};
use tokio::sync::{RwLock, broadcast};
use tracing::debug;

use super::{
    Collection, Document, DocumentStore, Guard, Query, StoreError, Subscription,
    subscription::SnapshotSender,
};

const CHANGE_BUFFER: usize = 64;

/// A write failure to inject, matched on collection and key prefix.
#[derive(Debug, Clone)]
struct WriteFault {
    collection: Collection,
    key_prefix: String,
}

#[derive(Debug, Default)]
struct State {
    collections: FxHashMap<Collection, BTreeMap<String, Value>>,
    faults: Vec<WriteFault>,
    unavailable: bool,
}

impl State {
    fn check_read(&self) -> Result<(), StoreError> {
        if self.unavailable {
            return Err(StoreError::Unavailable("store is offline".to_string()));
        }

        Ok(())
    }

    fn check_write(&self, collection: Collection, key: &str) -> Result<(), StoreError> {
        self.check_read()?;

        let faulted = self
            .faults
            .iter()
            .any(|fault| fault.collection == collection && key.starts_with(&fault.key_prefix));

        if faulted {
            return Err(StoreError::Unavailable(format!(
                "write to {collection}/{key} rejected"
            )));
        }

        Ok(())
    }

    fn documents(&self, collection: Collection) -> Option<&BTreeMap<String, Value>> {
        self.collections.get(&collection)
    }

    fn documents_mut(&mut self, collection: Collection) -> &mut BTreeMap<String, Value> {
        self.collections.entry(collection).or_default()
    }

    fn run(&self, query: &Query) -> Vec<Document> {
        let Some(documents) = self.documents(query.collection) else {
            return Vec::new();
        };

        let mut matched: Vec<Document> = documents
            .iter()
            .filter(|(_, body)| query.matches(body))
            .map(|(key, body)| Document {
                key: key.clone(),
                body: body.clone(),
            })
            .collect();

        // stable: ties keep key order
        matched.sort_by(|a, b| query.compare(&a.body, &b.body));

        if let Some(limit) = query.limit {
            matched.truncate(limit);
        }

        matched
    }
}

/// Document store held in process memory.
///
/// Clones share the same state. Writes can be made to fail on purpose, which is
/// how partial-failure behaviour of multi-step workflows is exercised.
#[derive(Debug, Clone)]
pub struct MemoryDocumentStore {
    state: Arc<RwLock<State>>,
    changes: broadcast::Sender<Collection>,
}

impl MemoryDocumentStore {
    #[must_use]
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_BUFFER);

        Self {
            state: Arc::new(RwLock::new(State::default())),
            changes,
        }
    }

    /// Reject every write to `collection` whose key starts with `key_prefix`.
    pub async fn fail_writes(&self, collection: Collection, key_prefix: impl Into<String>) {
        self.state.write().await.faults.push(WriteFault {
            collection,
            key_prefix: key_prefix.into(),
        });
    }

    /// Remove all injected write failures.
    pub async fn clear_faults(&self) {
        self.state.write().await.faults.clear();
    }

    /// Make every operation fail, as if the network were down.
    pub async fn set_unavailable(&self, unavailable: bool) {
        self.state.write().await.unavailable = unavailable;
    }

    /// Number of documents in a collection.
    pub async fn count(&self, collection: Collection) -> usize {
        self.state
            .read()
            .await
            .documents(collection)
            .map_or(0, BTreeMap::len)
    }

    fn notify(&self, collection: Collection) {
        // no receivers is fine
        _ = self.changes.send(collection);
    }

    async fn produce(self, query: Query, sender: SnapshotSender) {
        let mut changes = self.changes.subscribe();

        if sender.send(self.query(query.clone()).await).await.is_err() {
            return;
        }

        loop {
            match changes.recv().await {
                Ok(collection) if collection != query.collection => continue,
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => return,
            }

            if sender.send(self.query(query.clone()).await).await.is_err() {
                debug!(collection = %query.collection, "subscriber went away");
                return;
            }
        }
    }
}

impl Default for MemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

fn merge(body: &mut Value, fields: Map<String, Value>) -> Result<(), StoreError> {
    let object = body.as_object_mut().ok_or(StoreError::NotAnObject)?;

    object.extend(fields);

    Ok(())
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, collection: Collection, key: &str) -> Result<Option<Value>, StoreError> {
        let state = self.state.read().await;

        state.check_read()?;

        Ok(state
            .documents(collection)
            .and_then(|documents| documents.get(key))
            .cloned())
    }

    async fn query(&self, query: Query) -> Result<Vec<Document>, StoreError> {
        let state = self.state.read().await;

        state.check_read()?;

        Ok(state.run(&query))
    }

    async fn create(
        &self,
        collection: Collection,
        key: &str,
        body: Value,
    ) -> Result<bool, StoreError> {
        if !body.is_object() {
            return Err(StoreError::NotAnObject);
        }

        {
            let mut state = self.state.write().await;

            state.check_write(collection, key)?;

            let documents = state.documents_mut(collection);

            if documents.contains_key(key) {
                return Ok(false);
            }

            documents.insert(key.to_string(), body);
        }

        self.notify(collection);

        Ok(true)
    }

    async fn set(&self, collection: Collection, key: &str, body: Value) -> Result<(), StoreError> {
        if !body.is_object() {
            return Err(StoreError::NotAnObject);
        }

        {
            let mut state = self.state.write().await;

            state.check_write(collection, key)?;
            state.documents_mut(collection).insert(key.to_string(), body);
        }

        self.notify(collection);

        Ok(())
    }

    async fn update(
        &self,
        collection: Collection,
        key: &str,
        fields: Map<String, Value>,
    ) -> Result<(), StoreError> {
        {
            let mut state = self.state.write().await;

            state.check_write(collection, key)?;

            let body = state
                .documents_mut(collection)
                .get_mut(key)
                .ok_or(StoreError::NotFound)?;

            merge(body, fields)?;
        }

        self.notify(collection);

        Ok(())
    }

    async fn compare_and_update(
        &self,
        collection: Collection,
        key: &str,
        guard: Guard,
        fields: Map<String, Value>,
    ) -> Result<bool, StoreError> {
        {
            let mut state = self.state.write().await;

            state.check_write(collection, key)?;

            let body = state
                .documents_mut(collection)
                .get_mut(key)
                .ok_or(StoreError::NotFound)?;

            if body.get(&guard.field) != Some(&guard.expected) {
                return Ok(false);
            }

            merge(body, fields)?;
        }

        self.notify(collection);

        Ok(true)
    }

    async fn delete(&self, collection: Collection, key: &str) -> Result<bool, StoreError> {
        let existed = {
            let mut state = self.state.write().await;

            state.check_write(collection, key)?;
            state.documents_mut(collection).remove(key).is_some()
        };

        if existed {
            self.notify(collection);
        }

        Ok(existed)
    }

    async fn subscribe(&self, query: Query) -> Result<Subscription, StoreError> {
        self.state.read().await.check_read()?;

        let store = self.clone();

        Ok(Subscription::spawn(move |sender| store.produce(query, sender)))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use testresult::TestResult;

    use crate::store::{Direction, fields};

    use super::*;

    #[tokio::test]
    async fn set_get_and_delete() -> TestResult {
        let store = MemoryDocumentStore::new();

        store
            .set(Collection::Products, "42", json!({ "name": "Kibble" }))
            .await?;

        assert_eq!(
            store.get(Collection::Products, "42").await?,
            Some(json!({ "name": "Kibble" }))
        );

        assert!(store.delete(Collection::Products, "42").await?);
        assert!(!store.delete(Collection::Products, "42").await?);
        assert_eq!(store.get(Collection::Products, "42").await?, None);

        Ok(())
    }

    #[tokio::test]
    async fn create_never_replaces_an_existing_document() -> TestResult {
        let store = MemoryDocumentStore::new();

        assert!(
            store
                .create(Collection::Orders, "u1_42_1", json!({ "quantity": 1 }))
                .await?
        );
        assert!(
            !store
                .create(Collection::Orders, "u1_42_1", json!({ "quantity": 2 }))
                .await?
        );
        assert_eq!(
            store.get(Collection::Orders, "u1_42_1").await?,
            Some(json!({ "quantity": 1 }))
        );

        Ok(())
    }

    #[tokio::test]
    async fn update_merges_fields_and_requires_the_document() -> TestResult {
        let store = MemoryDocumentStore::new();

        store
            .set(Collection::Carts, "u1_1", json!({ "quantity": 1, "itemId": "42" }))
            .await?;

        store
            .update(Collection::Carts, "u1_1", fields([("quantity", json!(3))]))
            .await?;

        assert_eq!(
            store.get(Collection::Carts, "u1_1").await?,
            Some(json!({ "quantity": 3, "itemId": "42" }))
        );

        let missing = store
            .update(Collection::Carts, "u1_2", fields([("quantity", json!(3))]))
            .await;

        assert!(matches!(missing, Err(StoreError::NotFound)));

        Ok(())
    }

    #[tokio::test]
    async fn compare_and_update_respects_the_guard() -> TestResult {
        let store = MemoryDocumentStore::new();

        store
            .set(Collection::Products, "42", json!({ "stockCount": 5 }))
            .await?;

        let stale = store
            .compare_and_update(
                Collection::Products,
                "42",
                Guard::new("stockCount", 4),
                fields([("stockCount", json!(3))]),
            )
            .await?;

        let fresh = store
            .compare_and_update(
                Collection::Products,
                "42",
                Guard::new("stockCount", 5),
                fields([("stockCount", json!(3))]),
            )
            .await?;

        assert!(!stale);
        assert!(fresh);
        assert_eq!(
            store.get(Collection::Products, "42").await?,
            Some(json!({ "stockCount": 3 }))
        );

        Ok(())
    }

    #[tokio::test]
    async fn query_filters_sorts_and_limits() -> TestResult {
        let store = MemoryDocumentStore::new();

        for (key, owner, sequence) in [("a", "u1", 1), ("b", "u1", 3), ("c", "u2", 9), ("d", "u1", 2)]
        {
            store
                .set(
                    Collection::Carts,
                    key,
                    json!({ "ownerId": owner, "sequenceIndex": sequence }),
                )
                .await?;
        }

        let documents = store
            .query(
                Query::new(Collection::Carts)
                    .where_eq("ownerId", "u1")
                    .order_by("sequenceIndex", Direction::Descending)
                    .limit(2),
            )
            .await?;

        let keys: Vec<&str> = documents.iter().map(|d| d.key.as_str()).collect();

        assert_eq!(keys, ["b", "d"]);

        Ok(())
    }

    #[tokio::test]
    async fn injected_faults_reject_matching_writes_only() -> TestResult {
        let store = MemoryDocumentStore::new();

        store.fail_writes(Collection::Orders, "u1_43_").await;

        let rejected = store
            .set(Collection::Orders, "u1_43_1", json!({ "quantity": 1 }))
            .await;

        assert!(matches!(rejected, Err(StoreError::Unavailable(_))));

        store
            .set(Collection::Orders, "u1_42_1", json!({ "quantity": 1 }))
            .await?;

        store.clear_faults().await;

        store
            .set(Collection::Orders, "u1_43_1", json!({ "quantity": 1 }))
            .await?;

        assert_eq!(store.count(Collection::Orders).await, 2);

        Ok(())
    }

    #[tokio::test]
    async fn offline_store_fails_reads() {
        let store = MemoryDocumentStore::new();

        store.set_unavailable(true).await;

        assert!(matches!(
            store.get(Collection::Users, "u1").await,
            Err(StoreError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn subscription_emits_initial_and_changed_snapshots() -> TestResult {
        let store = MemoryDocumentStore::new();

        let mut subscription = store
            .subscribe(Query::new(Collection::Notifications).where_eq("ownerId", "u1"))
            .await?;

        let initial = subscription.next().await.ok_or("no initial snapshot")??;

        assert!(initial.is_empty());

        store
            .set(
                Collection::Notifications,
                "n1",
                json!({ "ownerId": "u1", "title": "Order confirmed" }),
            )
            .await?;

        let changed = subscription.next().await.ok_or("no change snapshot")??;

        assert_eq!(changed.len(), 1);

        subscription.cancel();

        Ok(())
    }
}
