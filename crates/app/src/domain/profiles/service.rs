//! Profiles service.

use std::sync::Arc;

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use tracing::info;

use crate::{
    domain::profiles::{
        errors::ProfilesServiceError,
        models::{ProfileUpdate, Role, UserProfile},
    },
    identity::{IdentityProvider, OwnerId},
    store::{Collection, DocumentStore, StoreError, decode, encode},
};

/// Load any profile by id.
pub(crate) async fn load_profile(
    store: &dyn DocumentStore,
    owner: &OwnerId,
) -> Result<Option<UserProfile>, StoreError> {
    store
        .get(Collection::Users, owner.as_str())
        .await?
        .map(decode)
        .transpose()
}

fn normalize(update: ProfileUpdate) -> Result<ProfileUpdate, ProfilesServiceError> {
    let display_name = update.display_name.trim().to_string();
    let email = update.email.trim().to_string();

    if display_name.is_empty() {
        return Err(ProfilesServiceError::MissingDisplayName);
    }

    let valid_email = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));

    if !valid_email {
        return Err(ProfilesServiceError::InvalidEmail(email));
    }

    let optional = |value: Option<String>| {
        value
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    };

    Ok(ProfileUpdate {
        display_name,
        email,
        phone: optional(update.phone),
        address: optional(update.address),
    })
}

#[derive(Clone)]
pub struct RemoteProfilesService {
    store: Arc<dyn DocumentStore>,
    identity: Arc<dyn IdentityProvider>,
}

impl RemoteProfilesService {
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self { store, identity }
    }

    fn owner(&self) -> Result<OwnerId, ProfilesServiceError> {
        self.identity
            .current_owner()
            .ok_or(ProfilesServiceError::NotLoggedIn)
    }
}

#[async_trait]
impl ProfilesService for RemoteProfilesService {
    async fn get_profile(&self) -> Result<Option<UserProfile>, ProfilesServiceError> {
        let owner = self.owner()?;

        Ok(load_profile(self.store.as_ref(), &owner).await?)
    }

    #[tracing::instrument(name = "profiles.service.save_profile", skip(self, update), err)]
    async fn save_profile(
        &self,
        update: ProfileUpdate,
    ) -> Result<UserProfile, ProfilesServiceError> {
        let owner = self.owner()?;
        let update = normalize(update)?;
        let existing = load_profile(self.store.as_ref(), &owner).await?;

        let profile = UserProfile {
            id: owner,
            display_name: update.display_name,
            email: update.email,
            phone: update.phone,
            address: update.address,
            role: existing.as_ref().map_or(Role::Customer, |profile| profile.role),
            created_at: existing.map_or_else(Timestamp::now, |profile| profile.created_at),
        };

        self.store
            .set(Collection::Users, profile.id.as_str(), encode(&profile)?)
            .await?;

        info!(owner_id = %profile.id, "saved profile");

        Ok(profile)
    }
}

#[automock]
#[async_trait]
pub trait ProfilesService: Send + Sync {
    /// The signed-in user's profile, if one was saved.
    async fn get_profile(&self) -> Result<Option<UserProfile>, ProfilesServiceError>;

    /// Create or edit the signed-in user's profile. New profiles are customers;
    /// an existing role is kept.
    async fn save_profile(&self, update: ProfileUpdate)
    -> Result<UserProfile, ProfilesServiceError>;
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::test::TestContext;

    use super::*;

    fn update(name: &str, email: &str) -> ProfileUpdate {
        ProfileUpdate {
            display_name: name.to_string(),
            email: email.to_string(),
            phone: Some("  ".to_string()),
            address: None,
        }
    }

    #[tokio::test]
    async fn new_profiles_are_customers() -> TestResult {
        let ctx = TestContext::new();

        assert_eq!(ctx.app.profiles.get_profile().await?, None);

        let profile = ctx
            .app
            .profiles
            .save_profile(update(" Mai ", "mai@example.com"))
            .await?;

        assert_eq!(profile.display_name, "Mai");
        assert_eq!(profile.role, Role::Customer);
        assert_eq!(profile.phone, None);
        assert_eq!(ctx.app.profiles.get_profile().await?, Some(profile));

        Ok(())
    }

    #[tokio::test]
    async fn saving_keeps_an_existing_role() -> TestResult {
        let ctx = TestContext::new();

        ctx.make_admin("u1").await?;

        let profile = ctx
            .app
            .profiles
            .save_profile(update("Mai", "mai@example.com"))
            .await?;

        assert!(profile.is_admin());

        Ok(())
    }

    #[tokio::test]
    async fn invalid_profiles_are_rejected() {
        let ctx = TestContext::new();

        assert!(matches!(
            ctx.app.profiles.save_profile(update(" ", "mai@example.com")).await,
            Err(ProfilesServiceError::MissingDisplayName)
        ));
        assert!(matches!(
            ctx.app.profiles.save_profile(update("Mai", "mai")).await,
            Err(ProfilesServiceError::InvalidEmail(_))
        ));
    }
}
