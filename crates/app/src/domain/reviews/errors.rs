//! Reviews service errors.

use petshop::rating::RatingOutOfRange;
use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum ReviewsServiceError {
    #[error("sign in to leave a review")]
    NotLoggedIn,

    #[error(transparent)]
    InvalidRating(#[from] RatingOutOfRange),

    #[error("item not found")]
    ItemMissing,

    #[error("reviews unavailable")]
    Remote(#[source] StoreError),
}

impl From<StoreError> for ReviewsServiceError {
    fn from(error: StoreError) -> Self {
        Self::Remote(error)
    }
}
