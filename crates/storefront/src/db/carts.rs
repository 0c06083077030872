//! Cart queries. One row per user; lines are stored as JSONB.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;

use bazaar_core::{CartId, Money, UserId};

use super::{RepositoryError, from_db_int, to_db_int};
use crate::models::{Cart, CartItem};

#[derive(Debug, sqlx::FromRow)]
struct CartRow {
    id: CartId,
    user_id: UserId,
    items: Json<Vec<CartItem>>,
    total_items: i32,
    total_price: Money,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CartRow> for Cart {
    type Error = RepositoryError;

    fn try_from(row: CartRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            items: row.items.0,
            total_items: from_db_int(row.total_items, "total_items")?,
            total_price: row.total_price,
            updated_at: row.updated_at,
        })
    }
}

/// Get a user's cart.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn get(pool: &PgPool, user_id: &UserId) -> Result<Option<Cart>, RepositoryError> {
    sqlx::query_as::<_, CartRow>(
        r"
        SELECT id, user_id, items, total_items, total_price, updated_at
        FROM bazaar.carts
        WHERE user_id = $1
        ",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .map(Cart::try_from)
    .transpose()
}

/// Insert or overwrite a user's cart.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the write fails.
pub async fn upsert(pool: &PgPool, cart: &Cart) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        INSERT INTO bazaar.carts (user_id, id, items, total_items, total_price, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (user_id) DO UPDATE SET
            items = EXCLUDED.items,
            total_items = EXCLUDED.total_items,
            total_price = EXCLUDED.total_price,
            updated_at = EXCLUDED.updated_at
        ",
    )
    .bind(&cart.user_id)
    .bind(&cart.id)
    .bind(Json(&cart.items))
    .bind(to_db_int(cart.total_items, "total_items")?)
    .bind(cart.total_price)
    .bind(cart.updated_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Empty a user's cart, keeping the row.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the write fails.
pub async fn clear(pool: &PgPool, user_id: &UserId) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        UPDATE bazaar.carts
        SET items = '[]', total_items = 0, total_price = 0, updated_at = NOW()
        WHERE user_id = $1
        ",
    )
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(())
}
