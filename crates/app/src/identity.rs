//! Shopper identity.
//!
//! The identity provider is handed to every service explicitly. Services ask it
//! for the current owner on each call, so signing out takes effect immediately.

use mockall::automock;
use tokio::sync::watch;

use crate::{domain::profiles::models::UserProfile, ids::TypedId};

/// Opaque identifier of the signed-in shopper.
pub type OwnerId = TypedId<UserProfile>;

/// Supplies the owner of the current session.
#[automock]
pub trait IdentityProvider: Send + Sync {
    /// Current owner, or `None` when nobody is signed in.
    fn current_owner(&self) -> Option<OwnerId>;
}

/// A fixed identity, for the CLI and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity(Option<OwnerId>);

impl StaticIdentity {
    #[must_use]
    pub fn signed_in(owner: impl Into<OwnerId>) -> Self {
        Self(Some(owner.into()))
    }

    #[must_use]
    pub fn anonymous() -> Self {
        Self(None)
    }
}

impl IdentityProvider for StaticIdentity {
    fn current_owner(&self) -> Option<OwnerId> {
        self.0.clone()
    }
}

/// A session that can be signed in and out, observable by UI layers.
#[derive(Debug)]
pub struct SessionIdentity {
    owner: watch::Sender<Option<OwnerId>>,
}

impl SessionIdentity {
    #[must_use]
    pub fn new() -> Self {
        let (owner, _) = watch::channel(None);

        Self { owner }
    }

    pub fn sign_in(&self, owner: impl Into<OwnerId>) {
        self.owner.send_replace(Some(owner.into()));
    }

    pub fn sign_out(&self) {
        self.owner.send_replace(None);
    }

    /// Receiver notified on every sign in and sign out.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<Option<OwnerId>> {
        self.owner.subscribe()
    }
}

impl Default for SessionIdentity {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityProvider for SessionIdentity {
    fn current_owner(&self) -> Option<OwnerId> {
        self.owner.borrow().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_tracks_sign_in_and_out() {
        let session = SessionIdentity::new();
        let watcher = session.watch();

        assert_eq!(session.current_owner(), None);

        session.sign_in("u1");

        assert_eq!(session.current_owner(), Some(OwnerId::new("u1")));
        assert!(watcher.has_changed().unwrap_or(false));

        session.sign_out();

        assert_eq!(session.current_owner(), None);
    }

    #[test]
    fn anonymous_static_identity_has_no_owner() {
        assert_eq!(StaticIdentity::anonymous().current_owner(), None);
    }
}
