//! In-memory object store.

use std::sync::Arc;

use async_trait::async_trait;
use rustc_hash::FxHashMap;
use tokio::sync::RwLock;

use super::{ObjectStore, ObjectStoreError, validate};

const MEMORY_URL_PREFIX: &str = "memory://objects/";

#[derive(Debug, Clone)]
struct StoredObject {
    bytes: Vec<u8>,
    content_type: String,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryObjectStore {
    objects: Arc<RwLock<FxHashMap<String, StoredObject>>>,
}

impl MemoryObjectStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes and content type stored under `path`.
    pub async fn object(&self, path: &str) -> Option<(Vec<u8>, String)> {
        self.objects
            .read()
            .await
            .get(path)
            .map(|object| (object.bytes.clone(), object.content_type.clone()))
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, ObjectStoreError> {
        validate(path, &bytes)?;

        self.objects.write().await.insert(
            path.to_string(),
            StoredObject {
                bytes,
                content_type: content_type.to_string(),
            },
        );

        Ok(format!("{MEMORY_URL_PREFIX}{path}"))
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[tokio::test]
    async fn put_returns_a_stable_url() -> TestResult {
        let store = MemoryObjectStore::new();

        let url = store.put("products/42.png", vec![1, 2, 3], "image/png").await?;

        assert_eq!(url, "memory://objects/products/42.png");
        assert_eq!(
            store.object("products/42.png").await,
            Some((vec![1, 2, 3], "image/png".to_string()))
        );

        Ok(())
    }
}
