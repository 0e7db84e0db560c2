//! Object storage for product images.

use async_trait::async_trait;
use mockall::automock;
use thiserror::Error;

mod http;
mod memory;

pub use http::{HttpObjectStore, HttpObjectStoreConfig};
pub use memory::MemoryObjectStore;

#[derive(Debug, Error)]
pub enum ObjectStoreError {
    #[error("object storage request failed")]
    Http(#[from] reqwest::Error),

    #[error("unexpected object storage response: {0}")]
    UnexpectedResponse(String),

    #[error("object is empty")]
    EmptyObject,

    #[error("invalid object path: {0}")]
    InvalidPath(String),
}

/// Blob storage returning a stable retrieval URL for every stored object.
#[automock]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `bytes` under `path`, replacing any previous object, and return its URL.
    async fn put(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, ObjectStoreError>;
}

/// Reject empty blobs and paths that are blank or escape their prefix.
pub(crate) fn validate(path: &str, bytes: &[u8]) -> Result<(), ObjectStoreError> {
    if bytes.is_empty() {
        return Err(ObjectStoreError::EmptyObject);
    }

    let invalid = path.trim().is_empty()
        || path.starts_with('/')
        || path.split('/').any(|segment| segment.is_empty() || segment == "..");

    if invalid {
        return Err(ObjectStoreError::InvalidPath(path.to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_must_be_relative_and_clean() {
        assert!(validate("products/42.png", b"png").is_ok());
        assert!(matches!(
            validate("/products/42.png", b"png"),
            Err(ObjectStoreError::InvalidPath(_))
        ));
        assert!(matches!(
            validate("products/../secrets", b"png"),
            Err(ObjectStoreError::InvalidPath(_))
        ));
        assert!(matches!(
            validate("products/42.png", b""),
            Err(ObjectStoreError::EmptyObject)
        ));
    }
}
