//! Review queries.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use bazaar_core::{ProductId, ReviewId, UserId};

use super::{RepositoryError, conflict_on_unique, from_db_int, to_db_int};
use crate::models::Review;

#[derive(Debug, sqlx::FromRow)]
struct ReviewRow {
    id: ReviewId,
    product_id: ProductId,
    user_id: UserId,
    user_name: String,
    rating: i16,
    title: Option<String>,
    comment: Option<String>,
    verified: bool,
    helpful_count: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ReviewRow> for Review {
    type Error = RepositoryError;

    fn try_from(row: ReviewRow) -> Result<Self, Self::Error> {
        let rating = u8::try_from(row.rating).map_err(|_| {
            RepositoryError::DataCorruption(format!("rating out of range: {}", row.rating))
        })?;
        Ok(Self {
            id: row.id,
            product_id: row.product_id,
            user_id: row.user_id,
            user_name: row.user_name,
            rating,
            title: row.title,
            comment: row.comment,
            verified: row.verified,
            helpful_count: from_db_int(row.helpful_count, "helpful_count")?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const SELECT_REVIEW: &str = r"
    SELECT id, product_id, user_id, user_name, rating, title, comment, verified,
           helpful_count, created_at, updated_at
    FROM bazaar.reviews
";

/// Get a review by ID.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn get(pool: &PgPool, id: &ReviewId) -> Result<Option<Review>, RepositoryError> {
    sqlx::query_as::<_, ReviewRow>(&format!("{SELECT_REVIEW} WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .map(Review::try_from)
        .transpose()
}

/// All reviews of a product, newest first.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn list_for_product(
    pool: &PgPool,
    product_id: &ProductId,
) -> Result<Vec<Review>, RepositoryError> {
    sqlx::query_as::<_, ReviewRow>(&format!(
        "{SELECT_REVIEW} WHERE product_id = $1 ORDER BY created_at DESC"
    ))
    .bind(product_id)
    .fetch_all(pool)
    .await?
    .into_iter()
    .map(Review::try_from)
    .collect()
}

/// Whether `user_id` has reviewed `product_id`.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn exists_for(
    pool: &PgPool,
    product_id: &ProductId,
    user_id: &UserId,
) -> Result<bool, RepositoryError> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM bazaar.reviews WHERE product_id = $1 AND user_id = $2)",
    )
    .bind(product_id)
    .bind(user_id)
    .fetch_one(pool)
    .await?;
    Ok(exists)
}

/// Insert or overwrite a review.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if the user already reviewed the product.
/// Returns `RepositoryError::Database` for other database errors.
pub async fn upsert(pool: &PgPool, review: &Review) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        INSERT INTO bazaar.reviews (
            id, product_id, user_id, user_name, rating, title, comment, verified,
            helpful_count, created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        ON CONFLICT (id) DO UPDATE SET
            rating = EXCLUDED.rating,
            title = EXCLUDED.title,
            comment = EXCLUDED.comment,
            verified = EXCLUDED.verified,
            helpful_count = EXCLUDED.helpful_count,
            updated_at = EXCLUDED.updated_at
        ",
    )
    .bind(&review.id)
    .bind(&review.product_id)
    .bind(&review.user_id)
    .bind(&review.user_name)
    .bind(i16::from(review.rating))
    .bind(&review.title)
    .bind(&review.comment)
    .bind(review.verified)
    .bind(to_db_int(review.helpful_count, "helpful_count")?)
    .bind(review.created_at)
    .bind(review.updated_at)
    .execute(pool)
    .await
    .map_err(|e| conflict_on_unique(e, "product already reviewed by user"))?;

    Ok(())
}

/// Delete a review. Returns whether a row was removed.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the write fails.
pub async fn delete(pool: &PgPool, id: &ReviewId) -> Result<bool, RepositoryError> {
    let result = sqlx::query("DELETE FROM bazaar.reviews WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
