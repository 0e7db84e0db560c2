//! Remote document store.
//!
//! Every entity lives in a collection of JSON documents addressed by string keys.
//! Services depend on the [`DocumentStore`] trait only; the in-memory backend serves
//! tests and demos, the `PostgreSQL` backend keeps documents in a `JSONB` table.

use std::fmt;

use async_trait::async_trait;
use mockall::automock;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use thiserror::Error;

mod memory;
mod postgres;
mod query;
mod subscription;

pub use memory::MemoryDocumentStore;
pub use postgres::PgDocumentStore;
pub use query::{Condition, Direction, Filter, Query};
pub use subscription::{Snapshots, Subscription, SubscriptionGuard};

/// Collections known to the storefront.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Products,
    Carts,
    Orders,
    Reviews,
    Notifications,
    Users,
}

impl Collection {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Products => "products",
            Self::Carts => "carts",
            Self::Orders => "orders",
            Self::Reviews => "reviews",
            Self::Notifications => "notifications",
            Self::Users => "users",
        }
    }

    /// Look a collection up by its stored name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        [
            Self::Products,
            Self::Carts,
            Self::Orders,
            Self::Reviews,
            Self::Notifications,
            Self::Users,
        ]
        .into_iter()
        .find(|collection| collection.as_str() == name)
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored document and its key.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub key: String,
    pub body: Value,
}

impl Document {
    /// Decode the body into a model.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Codec`] when the body does not match the model.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, StoreError> {
        decode(self.body.clone())
    }
}

/// Field guard for [`DocumentStore::compare_and_update`].
#[derive(Debug, Clone, PartialEq)]
pub struct Guard {
    pub field: String,
    pub expected: Value,
}

impl Guard {
    pub fn new(field: impl Into<String>, expected: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            expected: expected.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document not found")]
    NotFound,

    #[error("document body must be a JSON object")]
    NotAnObject,

    #[error("malformed document")]
    Codec(#[source] serde_json::Error),

    #[error("storage error")]
    Sql(#[source] sqlx::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(error: sqlx::Error) -> Self {
        if matches!(error, sqlx::Error::RowNotFound) {
            return Self::NotFound;
        }

        Self::Sql(error)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(error: serde_json::Error) -> Self {
        Self::Codec(error)
    }
}

/// Serialize a model into a document body.
///
/// # Errors
///
/// Returns [`StoreError::NotAnObject`] when the model does not serialize to a JSON object.
pub fn encode<T: Serialize>(model: &T) -> Result<Value, StoreError> {
    let body = serde_json::to_value(model)?;

    if !body.is_object() {
        return Err(StoreError::NotAnObject);
    }

    Ok(body)
}

/// Deserialize a document body into a model.
///
/// # Errors
///
/// Returns [`StoreError::Codec`] when the body does not match the model.
pub fn decode<T: DeserializeOwned>(body: Value) -> Result<T, StoreError> {
    serde_json::from_value(body).map_err(StoreError::Codec)
}

/// Build a field map for partial updates.
#[must_use]
pub fn fields<const N: usize>(entries: [(&str, Value); N]) -> Map<String, Value> {
    entries
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}

#[automock]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Point read by key.
    async fn get(&self, collection: Collection, key: &str) -> Result<Option<Value>, StoreError>;

    /// Filtered, ordered, limited collection query.
    async fn query(&self, query: Query) -> Result<Vec<Document>, StoreError>;

    /// Write a document only if its key is free.
    ///
    /// Returns `false`, leaving the stored document untouched, when the key is taken.
    async fn create(
        &self,
        collection: Collection,
        key: &str,
        body: Value,
    ) -> Result<bool, StoreError>;

    /// Create or fully replace a document.
    async fn set(&self, collection: Collection, key: &str, body: Value) -> Result<(), StoreError>;

    /// Merge fields into an existing document; [`StoreError::NotFound`] when absent.
    async fn update(
        &self,
        collection: Collection,
        key: &str,
        fields: Map<String, Value>,
    ) -> Result<(), StoreError>;

    /// Merge fields only when `guard.field` still equals `guard.expected`.
    ///
    /// Returns `false` when the guard no longer holds. This is the store's only
    /// atomic primitive.
    async fn compare_and_update(
        &self,
        collection: Collection,
        key: &str,
        guard: Guard,
        fields: Map<String, Value>,
    ) -> Result<bool, StoreError>;

    /// Delete a document, returning whether it existed.
    async fn delete(&self, collection: Collection, key: &str) -> Result<bool, StoreError>;

    /// Push subscription yielding the full query result on every change, starting
    /// with the current result.
    async fn subscribe(&self, query: Query) -> Result<Subscription, StoreError>;
}
