//! Review service.
//!
//! Reviews go through the caller's own store, so demo reviews live in the
//! demo session and never reach the database. Only persisted reviews feed a
//! product's rating aggregate, and only persisted reviews can be verified
//! purchases.

use chrono::Utc;
use serde::Deserialize;
use tracing::{info, instrument};

use bazaar_core::{IdentityKind, OrderStatus, ProductId, ReviewId};

use super::ServiceError;
use crate::db::RepositoryError;
use crate::models::review::{MAX_RATING, MIN_RATING};
use crate::models::{RatingSummary, Review, User};
use crate::store::{IdentityStore, Storage};

/// A new review.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewDraft {
    pub product_id: ProductId,
    pub rating: u8,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
}

/// Edits to an existing review. The rating is always replaced; title and
/// comment only when given.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewChanges {
    pub rating: u8,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
}

/// Review operations.
pub struct ReviewService<'a> {
    storage: &'a Storage,
}

impl<'a> ReviewService<'a> {
    #[must_use]
    pub const fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Review a product, once per user.
    ///
    /// # Errors
    ///
    /// - `ServiceError::Validation` for a rating outside 1..=5
    /// - `ServiceError::NotFound` for an unknown product
    /// - `ServiceError::DuplicateReview` if the user already reviewed it
    #[instrument(skip(self, user, draft), fields(user_id = %user.id, product_id = %draft.product_id))]
    pub async fn create(&self, user: &User, draft: ReviewDraft) -> Result<Review, ServiceError> {
        validate_rating(draft.rating)?;
        if !self
            .storage
            .catalog()
            .exists_product(&draft.product_id)
            .await?
        {
            return Err(ServiceError::not_found("product", &draft.product_id));
        }

        let store = self.storage.for_user(&user.id).await?;
        if store.has_reviewed(&draft.product_id).await? {
            return Err(ServiceError::DuplicateReview);
        }

        let verified = verified_purchase(store.as_ref(), &draft.product_id).await?;
        let now = Utc::now();
        let review = Review {
            id: store.kind().mint_id("review"),
            product_id: draft.product_id,
            user_id: user.id.clone(),
            user_name: user.display_name(),
            rating: draft.rating,
            title: draft.title,
            comment: draft.comment,
            verified,
            helpful_count: 0,
            created_at: now,
            updated_at: now,
        };
        store.save_review(&review).await.map_err(duplicate_on_conflict)?;
        self.refresh_rating(store.as_ref(), &review.product_id).await?;

        info!(review_id = %review.id, verified, "Review created");
        Ok(review)
    }

    /// Edit one of the user's own reviews.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Forbidden` if the review belongs to someone else.
    #[instrument(skip(self, user, changes), fields(user_id = %user.id))]
    pub async fn update(
        &self,
        user: &User,
        review_id: &ReviewId,
        changes: ReviewChanges,
    ) -> Result<Review, ServiceError> {
        validate_rating(changes.rating)?;
        let store = self.storage.for_user(&user.id).await?;
        let mut review = find_review(store.as_ref(), review_id).await?;
        if review.user_id != user.id {
            return Err(ServiceError::Forbidden(
                "only the author can edit a review".to_owned(),
            ));
        }

        review.rating = changes.rating;
        if let Some(title) = changes.title {
            review.title = Some(title);
        }
        if let Some(comment) = changes.comment {
            review.comment = Some(comment);
        }
        review.updated_at = Utc::now();

        store.save_review(&review).await?;
        self.refresh_rating(store.as_ref(), &review.product_id).await?;
        Ok(review)
    }

    /// Delete a review. Authors may delete their own; admins any persisted one.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Forbidden` for anyone else.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn delete(&self, user: &User, review_id: &ReviewId) -> Result<(), ServiceError> {
        let store = self.storage.for_user(&user.id).await?;
        let review = find_review(store.as_ref(), review_id).await?;
        if review.user_id != user.id && !user.is_admin() {
            return Err(ServiceError::Forbidden(
                "only the author or an admin can delete a review".to_owned(),
            ));
        }

        store.delete_review(review_id).await?;
        self.refresh_rating(store.as_ref(), &review.product_id).await?;
        info!(review_id = %review_id, "Review deleted");
        Ok(())
    }

    /// Count a "this was helpful" vote.
    ///
    /// Demo shoppers may vote on persisted reviews; the vote is reflected in
    /// the returned review but not stored.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` for unknown reviews.
    pub async fn mark_helpful(
        &self,
        user: &User,
        review_id: &ReviewId,
    ) -> Result<Review, ServiceError> {
        let store = self.storage.for_user(&user.id).await?;
        if let Some(mut review) = store.find_review(review_id).await? {
            review.helpful_count = review.helpful_count.saturating_add(1);
            store.save_review(&review).await?;
            return Ok(review);
        }

        if store.kind().is_demo()
            && let Some(mut review) = self.storage.persisted().find_review(review_id).await?
        {
            review.helpful_count = review.helpful_count.saturating_add(1);
            return Ok(review);
        }
        Err(ServiceError::not_found("review", review_id))
    }

    /// Reviews of a product, newest first.
    ///
    /// Everyone sees the persisted reviews; a demo viewer also sees their own.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if storage fails.
    pub async fn list_for_product(
        &self,
        viewer: Option<&User>,
        product_id: &ProductId,
    ) -> Result<Vec<Review>, ServiceError> {
        let mut reviews = self.storage.persisted().product_reviews(product_id).await?;
        if let Some(viewer) = viewer
            && IdentityKind::of_user_id(&viewer.id).is_demo()
        {
            let store = self.storage.for_user(&viewer.id).await?;
            reviews.extend(store.reviews_for_product(product_id).await?);
            reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        }
        Ok(reviews)
    }

    /// Recompute and store a product's rating from persisted reviews.
    /// Demo reviews never move the aggregate.
    async fn refresh_rating(
        &self,
        store: &dyn IdentityStore,
        product_id: &ProductId,
    ) -> Result<(), ServiceError> {
        if store.kind().is_demo() {
            return Ok(());
        }
        let reviews = self.storage.persisted().product_reviews(product_id).await?;
        let summary = RatingSummary::from_reviews(&reviews);
        self.storage
            .catalog()
            .update_rating(product_id, summary)
            .await?;
        Ok(())
    }
}

fn validate_rating(rating: u8) -> Result<(), ServiceError> {
    if (MIN_RATING..=MAX_RATING).contains(&rating) {
        Ok(())
    } else {
        Err(ServiceError::Validation(format!(
            "rating must be between {MIN_RATING} and {MAX_RATING}"
        )))
    }
}

/// Whether the store's identity has a delivered order containing the product.
/// Demo reviews are never verified.
async fn verified_purchase(
    store: &dyn IdentityStore,
    product_id: &ProductId,
) -> Result<bool, ServiceError> {
    if store.kind().is_demo() {
        return Ok(false);
    }
    let delivered = store.list_orders_by_status(OrderStatus::Delivered).await?;
    Ok(delivered.iter().any(|order| order.contains_product(product_id)))
}

async fn find_review(
    store: &dyn IdentityStore,
    review_id: &ReviewId,
) -> Result<Review, ServiceError> {
    store
        .find_review(review_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("review", review_id))
}

/// A unique violation on (product, user) means a concurrent duplicate.
fn duplicate_on_conflict(err: RepositoryError) -> ServiceError {
    match err {
        RepositoryError::Conflict(_) => ServiceError::DuplicateReview,
        other => ServiceError::Repository(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_bounds() {
        assert!(validate_rating(1).is_ok());
        assert!(validate_rating(5).is_ok());
        assert!(matches!(validate_rating(0), Err(ServiceError::Validation(_))));
        assert!(matches!(validate_rating(6), Err(ServiceError::Validation(_))));
    }
}
