//! Notifications service.

use std::sync::Arc;

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use crate::{
    domain::notifications::{
        errors::NotificationsServiceError,
        models::{NewNotification, Notification, NotificationId, fields},
    },
    identity::{IdentityProvider, OwnerId},
    store::{
        Collection, Direction, Document, DocumentStore, Query, Snapshots, decode, encode,
    },
};

#[derive(Clone)]
pub struct RemoteNotificationsService {
    store: Arc<dyn DocumentStore>,
    identity: Arc<dyn IdentityProvider>,
}

impl RemoteNotificationsService {
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self { store, identity }
    }

    fn owner(&self) -> Result<OwnerId, NotificationsServiceError> {
        self.identity
            .current_owner()
            .ok_or(NotificationsServiceError::NotLoggedIn)
    }

    fn owner_query(owner: &OwnerId) -> Query {
        Query::new(Collection::Notifications)
            .where_eq(fields::OWNER_ID, owner.as_str())
            .order_by(fields::CREATED_AT, Direction::Descending)
    }
}

#[async_trait]
impl NotificationsService for RemoteNotificationsService {
    async fn notify(
        &self,
        notification: NewNotification,
    ) -> Result<Notification, NotificationsServiceError> {
        let notification = Notification {
            id: NotificationId::new(Uuid::now_v7().to_string()),
            owner_id: notification.owner_id,
            title: notification.title,
            body: notification.body,
            order_id: notification.order_id,
            read: false,
            created_at: Timestamp::now(),
        };

        self.store
            .set(
                Collection::Notifications,
                notification.id.as_str(),
                encode(&notification)?,
            )
            .await?;

        debug!(notification_id = %notification.id, owner_id = %notification.owner_id, "notification written");

        Ok(notification)
    }

    async fn list(&self, limit: usize) -> Result<Vec<Notification>, NotificationsServiceError> {
        let owner = self.owner()?;

        Ok(self
            .store
            .query(Self::owner_query(&owner).limit(limit))
            .await?
            .iter()
            .map(Document::decode)
            .collect::<Result<Vec<Notification>, _>>()?)
    }

    async fn mark_read(
        &self,
        notification: &NotificationId,
    ) -> Result<(), NotificationsServiceError> {
        let owner = self.owner()?;

        let stored: Notification = self
            .store
            .get(Collection::Notifications, notification.as_str())
            .await?
            .map(decode)
            .transpose()?
            .ok_or(NotificationsServiceError::NotFound)?;

        if stored.owner_id != owner {
            return Err(NotificationsServiceError::NotFound);
        }

        if stored.read {
            return Ok(());
        }

        self.store
            .update(
                Collection::Notifications,
                notification.as_str(),
                crate::store::fields([(fields::READ, json!(true))]),
            )
            .await?;

        Ok(())
    }

    async fn unread_count(&self) -> Result<usize, NotificationsServiceError> {
        let owner = self.owner()?;

        Ok(self
            .store
            .query(
                Query::new(Collection::Notifications)
                    .where_eq(fields::OWNER_ID, owner.as_str())
                    .where_eq(fields::READ, false),
            )
            .await?
            .len())
    }

    async fn subscribe(&self) -> Result<Snapshots<Notification>, NotificationsServiceError> {
        let owner = self.owner()?;

        Ok(self.store.subscribe(Self::owner_query(&owner)).await?.typed())
    }
}

#[automock]
#[async_trait]
pub trait NotificationsService: Send + Sync {
    /// Write a notification for its owner. Needs no signed-in identity.
    async fn notify(
        &self,
        notification: NewNotification,
    ) -> Result<Notification, NotificationsServiceError>;

    /// The current owner's notifications, newest first.
    async fn list(&self, limit: usize) -> Result<Vec<Notification>, NotificationsServiceError>;

    async fn mark_read(&self, notification: &NotificationId)
    -> Result<(), NotificationsServiceError>;

    async fn unread_count(&self) -> Result<usize, NotificationsServiceError>;

    /// Live view of the current owner's notifications.
    async fn subscribe(&self) -> Result<Snapshots<Notification>, NotificationsServiceError>;
}
