//! Carts service errors.

use thiserror::Error;

use crate::{domain::stock::StockError, store::StoreError};

#[derive(Debug, Error)]
pub enum CartsServiceError {
    #[error("sign in to use the cart")]
    NotLoggedIn,

    #[error("item not found")]
    ItemMissing,

    #[error("item is out of stock")]
    OutOfStock,

    #[error("only {available} left in stock, {requested} requested")]
    InsufficientStock { available: u32, requested: u32 },

    #[error("cart line no longer exists")]
    LineNotFound,

    #[error("quantity is too large")]
    InvalidQuantity,

    #[error("cart unavailable")]
    Remote(#[source] StoreError),
}

impl From<StoreError> for CartsServiceError {
    fn from(error: StoreError) -> Self {
        if matches!(error, StoreError::NotFound) {
            return Self::LineNotFound;
        }

        Self::Remote(error)
    }
}

impl From<StockError> for CartsServiceError {
    fn from(error: StockError) -> Self {
        match error {
            StockError::ItemMissing => Self::ItemMissing,
            StockError::OutOfStock => Self::OutOfStock,
            StockError::InsufficientStock {
                available,
                requested,
            } => Self::InsufficientStock {
                available,
                requested,
            },
            StockError::InvalidQuantity => Self::InvalidQuantity,
            StockError::Contended => Self::Remote(StoreError::Unavailable(error.to_string())),
            StockError::Remote(source) => Self::Remote(source),
        }
    }
}
