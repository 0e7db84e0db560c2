//! Catalog service errors.

use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum CatalogServiceError {
    #[error("item not found")]
    ItemMissing,

    #[error("invalid price range: {min} > {max}")]
    InvalidPriceRange { min: u64, max: u64 },

    #[error("catalog unavailable")]
    Remote(#[source] StoreError),
}

impl From<StoreError> for CatalogServiceError {
    fn from(error: StoreError) -> Self {
        if matches!(error, StoreError::NotFound) {
            return Self::ItemMissing;
        }

        Self::Remote(error)
    }
}
