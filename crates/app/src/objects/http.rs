//! HTTP bucket client.
//!
//! Objects are uploaded with `PUT {base_url}/{bucket}/{path}` and a bearer
//! token; the same URL serves the object afterwards.

use async_trait::async_trait;
use reqwest::{Client, header::CONTENT_TYPE};
use tracing::debug;

use super::{ObjectStore, ObjectStoreError, validate};

#[derive(Debug, Clone)]
pub struct HttpObjectStoreConfig {
    /// Storage endpoint, e.g. `"https://storage.example.com"`.
    pub base_url: String,

    pub bucket: String,

    /// Bearer token sent with uploads.
    pub token: String,
}

#[derive(Debug, Clone)]
pub struct HttpObjectStore {
    config: HttpObjectStoreConfig,
    http: Client,
}

impl HttpObjectStore {
    #[must_use]
    pub fn new(config: HttpObjectStoreConfig) -> Self {
        Self {
            config,
            http: Client::new(),
        }
    }

    fn object_url(&self, path: &str) -> String {
        format!(
            "{}/{}/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.bucket,
            path
        )
    }
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    #[tracing::instrument(name = "objects.http.put", skip(self, bytes), fields(size = bytes.len()), err)]
    async fn put(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, ObjectStoreError> {
        validate(path, &bytes)?;

        let url = self.object_url(path);

        let response = self
            .http
            .put(&url)
            .bearer_auth(&self.config.token)
            .header(CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();

            return Err(ObjectStoreError::UnexpectedResponse(format!(
                "upload failed with status {status}: {text}"
            )));
        }

        debug!(%url, "object stored");

        Ok(url)
    }
}
