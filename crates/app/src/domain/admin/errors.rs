//! Admin service errors.

use thiserror::Error;

use crate::{
    domain::{catalog::models::ItemId, orders::OrdersServiceError, stock::StockError},
    objects::ObjectStoreError,
    store::StoreError,
};

#[derive(Debug, Error)]
pub enum AdminServiceError {
    #[error("sign in to use the admin console")]
    NotLoggedIn,

    #[error("admin role required")]
    NotAuthorized,

    #[error("item {0} already exists")]
    ItemExists(ItemId),

    #[error("item not found")]
    ItemMissing,

    #[error("invalid item: {0}")]
    InvalidItem(String),

    #[error("nothing to update")]
    EmptyUpdate,

    #[error("user not found")]
    UserNotFound,

    #[error("quantity must be at least 1")]
    InvalidQuantity,

    #[error(transparent)]
    Orders(#[from] OrdersServiceError),

    #[error("image upload failed")]
    Image(#[from] ObjectStoreError),

    #[error("admin data unavailable")]
    Remote(#[source] StoreError),
}

impl From<StoreError> for AdminServiceError {
    fn from(error: StoreError) -> Self {
        Self::Remote(error)
    }
}

impl From<StockError> for AdminServiceError {
    fn from(error: StockError) -> Self {
        match error {
            StockError::ItemMissing => Self::ItemMissing,
            StockError::InvalidQuantity => Self::InvalidQuantity,
            StockError::Remote(source) => Self::Remote(source),
            StockError::OutOfStock
            | StockError::InsufficientStock { .. }
            | StockError::Contended => Self::Remote(StoreError::Unavailable(error.to_string())),
        }
    }
}
