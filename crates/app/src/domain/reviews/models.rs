//! Review Models

use jiff::Timestamp;
use petshop::rating::Stars;
use serde::{Deserialize, Serialize};

use crate::{domain::catalog::models::ItemId, ids::TypedId, identity::OwnerId};

pub type ReviewId = TypedId<Review>;

pub(crate) mod fields {
    pub(crate) const ITEM_ID: &str = "itemId";
    pub(crate) const CREATED_AT: &str = "createdAt";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: ReviewId,
    pub item_id: ItemId,
    pub owner_id: OwnerId,
    pub rating: Stars,

    #[serde(default)]
    pub comment: String,

    #[serde(with = "jiff::fmt::serde::timestamp::millisecond::required")]
    pub created_at: Timestamp,
}
