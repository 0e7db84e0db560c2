//! Stock gate errors.

use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum StockError {
    #[error("item not found")]
    ItemMissing,

    #[error("item is out of stock")]
    OutOfStock,

    #[error("only {available} left in stock, {requested} requested")]
    InsufficientStock { available: u32, requested: u32 },

    #[error("quantity must be at least 1")]
    InvalidQuantity,

    #[error("stock kept changing, try again")]
    Contended,

    #[error("stock unavailable")]
    Remote(#[source] StoreError),
}

impl From<StoreError> for StockError {
    fn from(error: StoreError) -> Self {
        if matches!(error, StoreError::NotFound) {
            return Self::ItemMissing;
        }

        Self::Remote(error)
    }
}
