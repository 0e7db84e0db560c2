//! Reviews service.
//!
//! Submitting a review appends it, re-reads every review of the item and writes
//! the truncated average back to the item. Two concurrent submissions can both
//! average a stale read; the later write wins until the next review.

use std::sync::Arc;

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use petshop::rating::{self, Stars};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    domain::{
        catalog::{
            models::{ItemId, fields::RATING},
            repository::CatalogRepository,
        },
        reviews::{
            errors::ReviewsServiceError,
            models::{Review, ReviewId, fields},
        },
    },
    identity::IdentityProvider,
    store::{Collection, Direction, Document, DocumentStore, Query, encode},
};

#[derive(Clone)]
pub struct RemoteReviewsService {
    store: Arc<dyn DocumentStore>,
    identity: Arc<dyn IdentityProvider>,
    catalog: CatalogRepository,
}

impl RemoteReviewsService {
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self {
            catalog: CatalogRepository::new(Arc::clone(&store)),
            store,
            identity,
        }
    }

    /// Recompute and store the item's average rating.
    async fn refresh_rating(&self, item: &ItemId) -> Result<u8, ReviewsServiceError> {
        let reviews = self.list_reviews(item).await?;
        let average = rating::average_rating(reviews.iter().map(|review| review.rating));

        self.catalog
            .patch(item, crate::store::fields([(RATING, json!(average))]))
            .await?;

        Ok(average)
    }
}

#[async_trait]
impl ReviewsService for RemoteReviewsService {
    #[tracing::instrument(
        name = "reviews.service.submit_review",
        skip(self, item, comment),
        fields(item_id = %item),
        err
    )]
    async fn submit_review(
        &self,
        item: &ItemId,
        rating: u8,
        comment: &str,
    ) -> Result<Review, ReviewsServiceError> {
        let owner = self
            .identity
            .current_owner()
            .ok_or(ReviewsServiceError::NotLoggedIn)?;

        let stars = Stars::new(rating)?;

        if self.catalog.get(item).await?.is_none() {
            return Err(ReviewsServiceError::ItemMissing);
        }

        let review = Review {
            id: ReviewId::new(Uuid::now_v7().to_string()),
            item_id: item.clone(),
            owner_id: owner,
            rating: stars,
            comment: comment.trim().to_string(),
            created_at: Timestamp::now(),
        };

        self.store
            .set(Collection::Reviews, review.id.as_str(), encode(&review)?)
            .await?;

        // the review stands even when the average cannot be refreshed
        match self.refresh_rating(item).await {
            Ok(average) => info!(review_id = %review.id, average, "review recorded"),
            Err(error) => warn!(review_id = %review.id, %error, "failed to refresh item rating"),
        }

        Ok(review)
    }

    async fn list_reviews(&self, item: &ItemId) -> Result<Vec<Review>, ReviewsServiceError> {
        Ok(self
            .store
            .query(
                Query::new(Collection::Reviews)
                    .where_eq(fields::ITEM_ID, item.as_str())
                    .order_by(fields::CREATED_AT, Direction::Descending),
            )
            .await?
            .iter()
            .map(Document::decode)
            .collect::<Result<Vec<Review>, _>>()?)
    }
}

#[automock]
#[async_trait]
pub trait ReviewsService: Send + Sync {
    /// Review an item and refresh its average rating.
    async fn submit_review(
        &self,
        item: &ItemId,
        rating: u8,
        comment: &str,
    ) -> Result<Review, ReviewsServiceError>;

    /// Reviews of one item, newest first.
    async fn list_reviews(&self, item: &ItemId) -> Result<Vec<Review>, ReviewsServiceError>;
}
