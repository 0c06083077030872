//! Review route handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use bazaar_core::{ProductId, ReviewId};

use crate::error::Result;
use crate::middleware::{OptionalUser, RequireUser};
use crate::models::Review;
use crate::services::{ReviewChanges, ReviewDraft, ReviewService};
use crate::state::AppState;

/// GET /api/products/{product_id}/reviews
///
/// Public. A demo viewer also sees their own session reviews.
pub async fn for_product(
    State(state): State<AppState>,
    OptionalUser(viewer): OptionalUser,
    Path(product_id): Path<ProductId>,
) -> Result<Json<Vec<Review>>> {
    let reviews = ReviewService::new(state.storage())
        .list_for_product(viewer.as_ref(), &product_id)
        .await?;
    Ok(Json(reviews))
}

/// POST /api/reviews
pub async fn create(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(draft): Json<ReviewDraft>,
) -> Result<(StatusCode, Json<Review>)> {
    let review = ReviewService::new(state.storage())
        .create(&user, draft)
        .await?;
    Ok((StatusCode::CREATED, Json(review)))
}

/// PUT /api/reviews/{id}
pub async fn update(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(review_id): Path<ReviewId>,
    Json(changes): Json<ReviewChanges>,
) -> Result<Json<Review>> {
    let review = ReviewService::new(state.storage())
        .update(&user, &review_id, changes)
        .await?;
    Ok(Json(review))
}

/// DELETE /api/reviews/{id}
pub async fn delete(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(review_id): Path<ReviewId>,
) -> Result<StatusCode> {
    ReviewService::new(state.storage())
        .delete(&user, &review_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/reviews/{id}/helpful
pub async fn helpful(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(review_id): Path<ReviewId>,
) -> Result<Json<Review>> {
    let review = ReviewService::new(state.storage())
        .mark_helpful(&user, &review_id)
        .await?;
    Ok(Json(review))
}
