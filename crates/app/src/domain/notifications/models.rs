//! Notification Models

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::{domain::orders::models::OrderId, ids::TypedId, identity::OwnerId};

pub type NotificationId = TypedId<Notification>;

pub(crate) mod fields {
    pub(crate) const OWNER_ID: &str = "ownerId";
    pub(crate) const READ: &str = "read";
    pub(crate) const CREATED_AT: &str = "createdAt";
}

/// A message for one shopper, stored under `notifications/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: NotificationId,
    pub owner_id: OwnerId,
    pub title: String,
    pub body: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<OrderId>,

    #[serde(default)]
    pub read: bool,

    #[serde(with = "jiff::fmt::serde::timestamp::millisecond::required")]
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub owner_id: OwnerId,
    pub title: String,
    pub body: String,
    pub order_id: Option<OrderId>,
}
