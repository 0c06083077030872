//! Database operations for the storefront `PostgreSQL`.
//!
//! # Schema: `bazaar`
//!
//! Holds persisted identities only. Demo sessions are never written here.
//!
//! ## Tables
//!
//! - `users` - Accounts and roles
//! - `products` - The shared catalog, including stock and rating aggregates
//! - `carts` - One cart per user, lines as JSONB
//! - `wishlist_items` - (user, product) pairs
//! - `orders` - Orders with line items and address as JSONB
//! - `payments` - Payment attempts
//! - `reviews` - At most one per (product, user)
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p bazaar-cli -- migrate
//! ```

pub mod carts;
pub mod orders;
pub mod payments;
pub mod products;
pub mod reviews;
pub mod users;
pub mod wishlists;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use bazaar_core::{
    Email, IdentityKind, OrderId, OrderStatus, PaymentId, ProductId, ReviewId, UserId,
};

pub use products::PgCatalog;

use crate::models::{Cart, Order, Payment, Review, User};
use crate::store::{IdentityStore, Page, PageRequest, PersistedStore};

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

// =============================================================================
// Row helpers
// =============================================================================

/// Map a unique violation to `Conflict`, anything else to `Database`.
fn conflict_on_unique(err: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = err
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(what.to_owned());
    }
    RepositoryError::Database(err)
}

/// Narrow a count for an `INTEGER` column.
fn to_db_int(value: u32, column: &str) -> Result<i32, RepositoryError> {
    i32::try_from(value)
        .map_err(|_| RepositoryError::DataCorruption(format!("{column} out of range: {value}")))
}

/// Widen an `INTEGER` column that must not be negative.
fn from_db_int(value: i32, column: &str) -> Result<u32, RepositoryError> {
    u32::try_from(value)
        .map_err(|_| RepositoryError::DataCorruption(format!("negative {column}: {value}")))
}

// =============================================================================
// Persisted store
// =============================================================================

/// Database-backed [`PersistedStore`].
#[derive(Debug, Clone)]
pub struct PgDatabase {
    pool: PgPool,
}

impl PgDatabase {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl PersistedStore for PgDatabase {
    fn identity_store(&self, user_id: &UserId) -> Arc<dyn IdentityStore> {
        Arc::new(PgIdentityStore {
            pool: self.pool.clone(),
            user_id: user_id.clone(),
        })
    }

    async fn find_user(&self, id: &UserId) -> Result<Option<User>, RepositoryError> {
        users::get_by_id(&self.pool, id).await
    }

    async fn find_user_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        users::get_by_email(&self.pool, email).await
    }

    async fn save_user(&self, user: &User) -> Result<(), RepositoryError> {
        users::upsert(&self.pool, user).await
    }

    async fn list_users(&self, page: PageRequest) -> Result<Page<User>, RepositoryError> {
        users::list(&self.pool, page).await
    }

    async fn find_order(&self, id: &OrderId) -> Result<Option<Order>, RepositoryError> {
        orders::get(&self.pool, id).await
    }

    async fn save_order(&self, order: &Order) -> Result<(), RepositoryError> {
        orders::upsert(&self.pool, order).await
    }

    async fn list_orders(
        &self,
        status: Option<OrderStatus>,
        page: PageRequest,
    ) -> Result<Page<Order>, RepositoryError> {
        orders::list_all(&self.pool, status, page).await
    }

    async fn find_review(&self, id: &ReviewId) -> Result<Option<Review>, RepositoryError> {
        reviews::get(&self.pool, id).await
    }

    async fn product_reviews(
        &self,
        product_id: &ProductId,
    ) -> Result<Vec<Review>, RepositoryError> {
        reviews::list_for_product(&self.pool, product_id).await
    }
}

/// [`IdentityStore`] for one persisted user.
#[derive(Debug, Clone)]
pub struct PgIdentityStore {
    pool: PgPool,
    user_id: UserId,
}

#[async_trait]
impl IdentityStore for PgIdentityStore {
    fn kind(&self) -> IdentityKind {
        IdentityKind::Persisted
    }

    fn user_id(&self) -> &UserId {
        &self.user_id
    }

    async fn load_cart(&self) -> Result<Option<Cart>, RepositoryError> {
        carts::get(&self.pool, &self.user_id).await
    }

    async fn save_cart(&self, cart: &Cart) -> Result<(), RepositoryError> {
        carts::upsert(&self.pool, cart).await
    }

    async fn clear_cart(&self) -> Result<(), RepositoryError> {
        carts::clear(&self.pool, &self.user_id).await
    }

    async fn wishlist(&self) -> Result<Vec<ProductId>, RepositoryError> {
        wishlists::list(&self.pool, &self.user_id).await
    }

    async fn wishlist_add(&self, product_id: &ProductId) -> Result<(), RepositoryError> {
        wishlists::add(&self.pool, &self.user_id, product_id).await
    }

    async fn wishlist_remove(&self, product_id: &ProductId) -> Result<(), RepositoryError> {
        wishlists::remove(&self.pool, &self.user_id, product_id).await
    }

    async fn wishlist_contains(&self, product_id: &ProductId) -> Result<bool, RepositoryError> {
        wishlists::contains(&self.pool, &self.user_id, product_id).await
    }

    async fn wishlist_clear(&self) -> Result<(), RepositoryError> {
        wishlists::clear(&self.pool, &self.user_id).await
    }

    async fn save_order(&self, order: &Order) -> Result<(), RepositoryError> {
        orders::upsert(&self.pool, order).await
    }

    async fn find_order(&self, id: &OrderId) -> Result<Option<Order>, RepositoryError> {
        orders::get(&self.pool, id).await
    }

    async fn list_orders(&self) -> Result<Vec<Order>, RepositoryError> {
        orders::list_for_user(&self.pool, &self.user_id, None).await
    }

    async fn list_orders_by_status(
        &self,
        status: OrderStatus,
    ) -> Result<Vec<Order>, RepositoryError> {
        orders::list_for_user(&self.pool, &self.user_id, Some(status)).await
    }

    async fn save_payment(&self, payment: &Payment) -> Result<(), RepositoryError> {
        payments::upsert(&self.pool, payment).await
    }

    async fn find_payment(&self, id: &PaymentId) -> Result<Option<Payment>, RepositoryError> {
        payments::get(&self.pool, id).await
    }

    async fn save_review(&self, review: &Review) -> Result<(), RepositoryError> {
        reviews::upsert(&self.pool, review).await
    }

    async fn find_review(&self, id: &ReviewId) -> Result<Option<Review>, RepositoryError> {
        reviews::get(&self.pool, id).await
    }

    async fn has_reviewed(&self, product_id: &ProductId) -> Result<bool, RepositoryError> {
        reviews::exists_for(&self.pool, product_id, &self.user_id).await
    }

    async fn reviews_for_product(
        &self,
        product_id: &ProductId,
    ) -> Result<Vec<Review>, RepositoryError> {
        reviews::list_for_product(&self.pool, product_id).await
    }

    async fn delete_review(&self, id: &ReviewId) -> Result<bool, RepositoryError> {
        reviews::delete(&self.pool, id).await
    }
}
