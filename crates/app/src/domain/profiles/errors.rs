//! Profiles service errors.

use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum ProfilesServiceError {
    #[error("sign in to manage your profile")]
    NotLoggedIn,

    #[error("display name is required")]
    MissingDisplayName,

    #[error("invalid email address: {0}")]
    InvalidEmail(String),

    #[error("profiles unavailable")]
    Remote(#[source] StoreError),
}

impl From<StoreError> for ProfilesServiceError {
    fn from(error: StoreError) -> Self {
        Self::Remote(error)
    }
}
