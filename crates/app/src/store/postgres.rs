//! `PostgreSQL` document store.
//!
//! Documents live in a single `documents` table with a `JSONB` body. A trigger
//! publishes the collection name on [`CHANGE_CHANNEL`] after every write, which
//! drives subscriptions.

use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::{
    PgPool, Postgres, QueryBuilder, postgres::PgListener, query, query_scalar, types::Json,
};
use tracing::{debug, warn};

use super::{
    Collection, Condition, Direction, Document, DocumentStore, Guard, Query, StoreError,
    Subscription, subscription::SnapshotSender,
};

/// Notification channel written by the `documents_changed` trigger.
pub const CHANGE_CHANNEL: &str = "petshop_documents";

const GET_DOCUMENT_SQL: &str = include_str!("sql/get_document.sql");
const SELECT_DOCUMENTS_SQL: &str = include_str!("sql/select_documents.sql");
const CREATE_DOCUMENT_SQL: &str = include_str!("sql/create_document.sql");
const SET_DOCUMENT_SQL: &str = include_str!("sql/set_document.sql");
const UPDATE_DOCUMENT_SQL: &str = include_str!("sql/update_document.sql");
const COMPARE_AND_UPDATE_DOCUMENT_SQL: &str = include_str!("sql/compare_and_update_document.sql");
const DOCUMENT_EXISTS_SQL: &str = include_str!("sql/document_exists.sql");
const DELETE_DOCUMENT_SQL: &str = include_str!("sql/delete_document.sql");

#[derive(Debug, Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn exists(&self, collection: Collection, key: &str) -> Result<bool, StoreError> {
        Ok(query_scalar::<_, bool>(DOCUMENT_EXISTS_SQL)
            .bind(collection.as_str())
            .bind(key)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn produce(self, mut listener: PgListener, query: Query, sender: SnapshotSender) {
        if sender.send(self.query(query.clone()).await).await.is_err() {
            return;
        }

        loop {
            let notification = match listener.recv().await {
                Ok(notification) => notification,
                Err(error) => {
                    warn!(collection = %query.collection, %error, "change listener failed");
                    _ = sender.send(Err(error.into())).await;
                    return;
                }
            };

            if notification.payload() != query.collection.as_str() {
                continue;
            }

            if sender.send(self.query(query.clone()).await).await.is_err() {
                debug!(collection = %query.collection, "subscriber went away");
                return;
            }
        }
    }
}

/// Translate a [`Query`] into SQL over the `documents` table.
fn build_select(query: &Query) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(SELECT_DOCUMENTS_SQL);

    builder.push_bind(query.collection.as_str());

    for filter in &query.filters {
        // ranges only compare values of the same JSON type
        if filter.condition != Condition::Eq {
            builder
                .push(" AND jsonb_typeof(body -> ")
                .push_bind(filter.field.clone())
                .push("::text) = jsonb_typeof(")
                .push_bind(Json(filter.value.clone()))
                .push(")");
        }

        builder
            .push(" AND (body -> ")
            .push_bind(filter.field.clone())
            .push("::text)")
            .push(filter.condition.sql_operator())
            .push_bind(Json(filter.value.clone()));
    }

    builder.push(" ORDER BY ");

    if let Some((field, direction)) = &query.order_by {
        builder
            .push("(body -> ")
            .push_bind(field.clone())
            .push("::text) ")
            .push(match direction {
                Direction::Ascending => "ASC",
                Direction::Descending => "DESC",
            })
            .push(" NULLS LAST, ");
    }

    builder.push("key");

    if let Some(limit) = query.limit {
        builder
            .push(" LIMIT ")
            .push_bind(i64::try_from(limit).unwrap_or(i64::MAX));
    }

    builder
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn get(&self, collection: Collection, key: &str) -> Result<Option<Value>, StoreError> {
        let body = query_scalar::<_, Json<Value>>(GET_DOCUMENT_SQL)
            .bind(collection.as_str())
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(body.map(|Json(body)| body))
    }

    async fn query(&self, query: Query) -> Result<Vec<Document>, StoreError> {
        let rows: Vec<(String, Json<Value>)> = build_select(&query)
            .build_query_as()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(key, Json(body))| Document { key, body })
            .collect())
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

        let rows_affected = query(CREATE_DOCUMENT_SQL)
            .bind(collection.as_str())
            .bind(key)
            .bind(Json(body))
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(rows_affected == 1)
    }

    async fn set(&self, collection: Collection, key: &str, body: Value) -> Result<(), StoreError> {
        if !body.is_object() {
            return Err(StoreError::NotAnObject);
        }

        query(SET_DOCUMENT_SQL)
            .bind(collection.as_str())
            .bind(key)
            .bind(Json(body))
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn update(
        &self,
        collection: Collection,
        key: &str,
        fields: Map<String, Value>,
    ) -> Result<(), StoreError> {
        let rows_affected = query(UPDATE_DOCUMENT_SQL)
            .bind(collection.as_str())
            .bind(key)
            .bind(Json(Value::Object(fields)))
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows_affected == 0 {
            return Err(StoreError::NotFound);
        }

        Ok(())
    }

    async fn compare_and_update(
        &self,
        collection: Collection,
        key: &str,
        guard: Guard,
        fields: Map<String, Value>,
    ) -> Result<bool, StoreError> {
        let rows_affected = query(COMPARE_AND_UPDATE_DOCUMENT_SQL)
            .bind(collection.as_str())
            .bind(key)
            .bind(guard.field)
            .bind(Json(guard.expected))
            .bind(Json(Value::Object(fields)))
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows_affected > 0 {
            return Ok(true);
        }

        if self.exists(collection, key).await? {
            Ok(false)
        } else {
            Err(StoreError::NotFound)
        }
    }

    async fn delete(&self, collection: Collection, key: &str) -> Result<bool, StoreError> {
        let rows_affected = query(DELETE_DOCUMENT_SQL)
            .bind(collection.as_str())
            .bind(key)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(rows_affected > 0)
    }

    async fn subscribe(&self, query: Query) -> Result<Subscription, StoreError> {
        let mut listener = PgListener::connect_with(&self.pool).await?;

        listener.listen(CHANGE_CHANNEL).await?;

        let store = self.clone();

        Ok(Subscription::spawn(move |sender| {
            store.produce(listener, query, sender)
        }))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use testresult::TestResult;

    use crate::{store::fields, test::db::TestDb};

    use super::*;

    #[test]
    fn select_binds_filters_order_and_limit() {
        let query = Query::new(Collection::Orders)
            .where_eq("ownerId", "u1")
            .where_gte("totalPrice", 10)
            .order_by("sequenceIndex", Direction::Descending)
            .limit(1);

        let builder = build_select(&query);
        let sql = builder.sql();

        assert!(sql.contains("(body -> $2::text) = $3"));
        assert!(sql.contains("jsonb_typeof(body -> $4::text) = jsonb_typeof($5)"));
        assert!(sql.contains("(body -> $6::text) >= $7"));
        assert!(sql.contains("ORDER BY (body -> $8::text) DESC NULLS LAST, key"));
        assert!(sql.ends_with("LIMIT $9"));
    }

    #[tokio::test]
    #[ignore = "requires a docker daemon"]
    async fn documents_round_trip_through_postgres() -> TestResult {
        let db = TestDb::new().await;
        let store = PgDocumentStore::new(db.pool().clone());

        store
            .set(Collection::Products, "42", json!({ "stockCount": 2, "name": "Kibble" }))
            .await?;

        let reserved = store
            .compare_and_update(
                Collection::Products,
                "42",
                Guard::new("stockCount", 2),
                fields([("stockCount", json!(1))]),
            )
            .await?;

        let stale = store
            .compare_and_update(
                Collection::Products,
                "42",
                Guard::new("stockCount", 2),
                fields([("stockCount", json!(0))]),
            )
            .await?;

        assert!(reserved);
        assert!(!stale);
        assert_eq!(
            store.get(Collection::Products, "42").await?,
            Some(json!({ "stockCount": 1, "name": "Kibble" }))
        );

        assert!(matches!(
            store
                .update(Collection::Products, "missing", fields([("x", json!(1))]))
                .await,
            Err(StoreError::NotFound)
        ));

        assert!(
            !store
                .create(Collection::Products, "42", json!({ "stockCount": 9 }))
                .await?
        );
        assert!(
            store
                .create(Collection::Products, "43", json!({ "stockCount": 9 }))
                .await?
        );

        assert!(store.delete(Collection::Products, "42").await?);

        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires a docker daemon"]
    async fn queries_order_numbers_numerically() -> TestResult {
        let db = TestDb::new().await;
        let store = PgDocumentStore::new(db.pool().clone());

        for (key, sold) in [("a", 9), ("b", 10), ("c", 2)] {
            store
                .set(Collection::Products, key, json!({ "soldCount": sold }))
                .await?;
        }

        let best = store
            .query(
                Query::new(Collection::Products)
                    .order_by("soldCount", Direction::Descending)
                    .limit(2),
            )
            .await?;

        let keys: Vec<&str> = best.iter().map(|d| d.key.as_str()).collect();

        assert_eq!(keys, ["b", "a"]);

        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires a docker daemon"]
    async fn subscriptions_follow_notifications() -> TestResult {
        let db = TestDb::new().await;
        let store = PgDocumentStore::new(db.pool().clone());

        let mut subscription = store.subscribe(Query::new(Collection::Carts)).await?;

        assert!(subscription.next().await.ok_or("no snapshot")??.is_empty());

        store
            .set(Collection::Carts, "u1_1", json!({ "ownerId": "u1" }))
            .await?;

        assert_eq!(subscription.next().await.ok_or("no snapshot")??.len(), 1);

        Ok(())
    }
}
