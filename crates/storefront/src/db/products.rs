//! Catalog queries.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use bazaar_core::{Money, ProductId};

use super::{RepositoryError, from_db_int, to_db_int};
use crate::models::{Product, RatingSummary};
use crate::store::Catalog;

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    name: String,
    description: Option<String>,
    price: Money,
    image: Option<String>,
    category_id: Option<String>,
    stock_quantity: i32,
    active: bool,
    average_rating: f64,
    review_count: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            name: row.name,
            description: row.description,
            price: row.price,
            image: row.image,
            category_id: row.category_id,
            stock_quantity: from_db_int(row.stock_quantity, "stock_quantity")?,
            active: row.active,
            average_rating: row.average_rating,
            review_count: from_db_int(row.review_count, "review_count")?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Get a product by ID.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn get(pool: &PgPool, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
    sqlx::query_as::<_, ProductRow>(
        r"
        SELECT id, name, description, price, image, category_id, stock_quantity,
               active, average_rating, review_count, created_at, updated_at
        FROM bazaar.products
        WHERE id = $1
        ",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .map(Product::try_from)
    .transpose()
}

/// Insert or overwrite a product.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the write fails.
pub async fn upsert(pool: &PgPool, product: &Product) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        INSERT INTO bazaar.products (
            id, name, description, price, image, category_id, stock_quantity,
            active, average_rating, review_count, created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, NOW())
        ON CONFLICT (id) DO UPDATE SET
            name = EXCLUDED.name,
            description = EXCLUDED.description,
            price = EXCLUDED.price,
            image = EXCLUDED.image,
            category_id = EXCLUDED.category_id,
            stock_quantity = EXCLUDED.stock_quantity,
            active = EXCLUDED.active,
            average_rating = EXCLUDED.average_rating,
            review_count = EXCLUDED.review_count,
            updated_at = NOW()
        ",
    )
    .bind(&product.id)
    .bind(&product.name)
    .bind(&product.description)
    .bind(product.price)
    .bind(&product.image)
    .bind(&product.category_id)
    .bind(to_db_int(product.stock_quantity, "stock_quantity")?)
    .bind(product.active)
    .bind(product.average_rating)
    .bind(to_db_int(product.review_count, "review_count")?)
    .bind(product.created_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Whether a product exists.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn exists(pool: &PgPool, id: &ProductId) -> Result<bool, RepositoryError> {
    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM bazaar.products WHERE id = $1)")
            .bind(id)
            .fetch_one(pool)
            .await?;
    Ok(exists)
}

/// Write a rating aggregate.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the product does not exist.
pub async fn set_rating(
    pool: &PgPool,
    id: &ProductId,
    rating: RatingSummary,
) -> Result<(), RepositoryError> {
    let result = sqlx::query(
        r"
        UPDATE bazaar.products
        SET average_rating = $2, review_count = $3, updated_at = NOW()
        WHERE id = $1
        ",
    )
    .bind(id)
    .bind(rating.average)
    .bind(to_db_int(rating.count, "review_count")?)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }
    Ok(())
}

/// Database-backed [`Catalog`].
#[derive(Debug, Clone)]
pub struct PgCatalog {
    pool: PgPool,
}

impl PgCatalog {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Catalog for PgCatalog {
    async fn find_product(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        get(&self.pool, id).await
    }

    async fn save_product(&self, product: &Product) -> Result<(), RepositoryError> {
        upsert(&self.pool, product).await
    }

    async fn exists_product(&self, id: &ProductId) -> Result<bool, RepositoryError> {
        exists(&self.pool, id).await
    }

    async fn update_rating(
        &self,
        id: &ProductId,
        rating: RatingSummary,
    ) -> Result<(), RepositoryError> {
        set_rating(&self.pool, id, rating).await
    }
}
