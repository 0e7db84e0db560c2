//! Notifications service errors.

use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum NotificationsServiceError {
    #[error("sign in to see notifications")]
    NotLoggedIn,

    #[error("notification not found")]
    NotFound,

    #[error("notifications unavailable")]
    Remote(#[source] StoreError),
}

impl From<StoreError> for NotificationsServiceError {
    fn from(error: StoreError) -> Self {
        if matches!(error, StoreError::NotFound) {
            return Self::NotFound;
        }

        Self::Remote(error)
    }
}
