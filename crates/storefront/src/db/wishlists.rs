//! Wishlist queries.

use sqlx::PgPool;

use bazaar_core::{ProductId, UserId};

use super::RepositoryError;

/// Product IDs on a user's wishlist, oldest first.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn list(pool: &PgPool, user_id: &UserId) -> Result<Vec<ProductId>, RepositoryError> {
    let ids = sqlx::query_scalar::<_, ProductId>(
        r"
        SELECT product_id FROM bazaar.wishlist_items
        WHERE user_id = $1
        ORDER BY added_at, product_id
        ",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(ids)
}

/// Add a product. Adding twice is a no-op.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the write fails.
pub async fn add(
    pool: &PgPool,
    user_id: &UserId,
    product_id: &ProductId,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        INSERT INTO bazaar.wishlist_items (user_id, product_id)
        VALUES ($1, $2)
        ON CONFLICT DO NOTHING
        ",
    )
    .bind(user_id)
    .bind(product_id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Remove a product. Removing an absent product is a no-op.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the write fails.
pub async fn remove(
    pool: &PgPool,
    user_id: &UserId,
    product_id: &ProductId,
) -> Result<(), RepositoryError> {
    sqlx::query("DELETE FROM bazaar.wishlist_items WHERE user_id = $1 AND product_id = $2")
        .bind(user_id)
        .bind(product_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Whether a product is on the wishlist.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn contains(
    pool: &PgPool,
    user_id: &UserId,
    product_id: &ProductId,
) -> Result<bool, RepositoryError> {
    let found: bool = sqlx::query_scalar(
        r"
        SELECT EXISTS (
            SELECT 1 FROM bazaar.wishlist_items WHERE user_id = $1 AND product_id = $2
        )
        ",
    )
    .bind(user_id)
    .bind(product_id)
    .fetch_one(pool)
    .await?;
    Ok(found)
}

/// Remove every product.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the write fails.
pub async fn clear(pool: &PgPool, user_id: &UserId) -> Result<(), RepositoryError> {
    sqlx::query("DELETE FROM bazaar.wishlist_items WHERE user_id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}
