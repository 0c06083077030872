//! Storage seams.
//!
//! Services never branch on identity kind to pick a storage path. They ask
//! [`Storage::for_user`] for an [`IdentityStore`] and call it; the resolver
//! hands back either the database-backed store or one over the caller's demo
//! session. The product catalog is shared by both paths.

mod demo;

use std::sync::Arc;

use async_trait::async_trait;

use bazaar_core::{
    Email, IdentityKind, OrderId, OrderStatus, PaymentId, ProductId, ReviewId, UserId,
};

pub use demo::DemoIdentityStore;

use crate::db::RepositoryError;
use crate::demo::{DemoSessionStore, DemoStoreError};
use crate::models::{Cart, Order, Payment, Product, RatingSummary, Review, User};

/// Default page size for admin listings.
pub const DEFAULT_PAGE_SIZE: u32 = 20;
/// Largest page size admin listings accept.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Zero-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
}

impl PageRequest {
    /// Build a request, clamping the size to `1..=MAX_PAGE_SIZE`.
    #[must_use]
    pub fn new(page: u32, size: u32) -> Self {
        Self {
            page,
            size: size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Row offset of the first item.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.page as u64 * self.size as u64
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(0, DEFAULT_PAGE_SIZE)
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total: u64,
}

// =============================================================================
// Catalog
// =============================================================================

/// The shared product catalog.
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn find_product(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError>;

    /// Overwrite a product (stock changes go through here).
    async fn save_product(&self, product: &Product) -> Result<(), RepositoryError>;

    async fn exists_product(&self, id: &ProductId) -> Result<bool, RepositoryError>;

    /// Write a rating aggregate onto a product.
    async fn update_rating(
        &self,
        id: &ProductId,
        rating: RatingSummary,
    ) -> Result<(), RepositoryError>;
}

// =============================================================================
// Per-identity storage
// =============================================================================

/// Everything one identity owns: cart, wishlist, orders, payments, reviews.
///
/// Implemented by the database store and by the demo session store.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Which path this store is on.
    fn kind(&self) -> IdentityKind;

    /// The identity this store is scoped to.
    fn user_id(&self) -> &UserId;

    // --- cart ---

    async fn load_cart(&self) -> Result<Option<Cart>, RepositoryError>;
    async fn save_cart(&self, cart: &Cart) -> Result<(), RepositoryError>;
    /// Empty the cart, keeping its id.
    async fn clear_cart(&self) -> Result<(), RepositoryError>;

    // --- wishlist ---

    async fn wishlist(&self) -> Result<Vec<ProductId>, RepositoryError>;
    /// Idempotent.
    async fn wishlist_add(&self, product_id: &ProductId) -> Result<(), RepositoryError>;
    /// Idempotent.
    async fn wishlist_remove(&self, product_id: &ProductId) -> Result<(), RepositoryError>;
    async fn wishlist_contains(&self, product_id: &ProductId) -> Result<bool, RepositoryError>;
    async fn wishlist_clear(&self) -> Result<(), RepositoryError>;

    // --- orders ---

    /// Insert or replace by id.
    async fn save_order(&self, order: &Order) -> Result<(), RepositoryError>;
    /// Look an order up by id. Not restricted to this identity's orders.
    async fn find_order(&self, id: &OrderId) -> Result<Option<Order>, RepositoryError>;
    /// This identity's orders, newest first.
    async fn list_orders(&self) -> Result<Vec<Order>, RepositoryError>;
    /// This identity's orders in `status`, newest first.
    async fn list_orders_by_status(
        &self,
        status: OrderStatus,
    ) -> Result<Vec<Order>, RepositoryError>;

    // --- payments ---

    /// Insert or replace by id.
    async fn save_payment(&self, payment: &Payment) -> Result<(), RepositoryError>;
    async fn find_payment(&self, id: &PaymentId) -> Result<Option<Payment>, RepositoryError>;

    // --- reviews ---

    /// Insert or replace by id.
    async fn save_review(&self, review: &Review) -> Result<(), RepositoryError>;
    async fn find_review(&self, id: &ReviewId) -> Result<Option<Review>, RepositoryError>;
    /// Whether this identity already reviewed `product_id`.
    async fn has_reviewed(&self, product_id: &ProductId) -> Result<bool, RepositoryError>;
    /// Reviews of `product_id` visible on this path, newest first.
    async fn reviews_for_product(
        &self,
        product_id: &ProductId,
    ) -> Result<Vec<Review>, RepositoryError>;
    /// Returns whether a review was removed.
    async fn delete_review(&self, id: &ReviewId) -> Result<bool, RepositoryError>;
}

/// Durable storage: accounts, cross-identity admin views, and the factory
/// for persisted identity stores.
#[async_trait]
pub trait PersistedStore: Send + Sync {
    /// A store scoped to a persisted identity.
    fn identity_store(&self, user_id: &UserId) -> Arc<dyn IdentityStore>;

    async fn find_user(&self, id: &UserId) -> Result<Option<User>, RepositoryError>;
    /// Case-insensitive email lookup.
    async fn find_user_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError>;
    /// Insert or replace by id.
    async fn save_user(&self, user: &User) -> Result<(), RepositoryError>;
    /// Every registered user, newest first.
    async fn list_users(&self, page: PageRequest) -> Result<Page<User>, RepositoryError>;

    async fn find_order(&self, id: &OrderId) -> Result<Option<Order>, RepositoryError>;
    async fn save_order(&self, order: &Order) -> Result<(), RepositoryError>;
    /// Every persisted order, optionally filtered by status, newest first.
    async fn list_orders(
        &self,
        status: Option<OrderStatus>,
        page: PageRequest,
    ) -> Result<Page<Order>, RepositoryError>;

    async fn find_review(&self, id: &ReviewId) -> Result<Option<Review>, RepositoryError>;
    /// All persisted reviews of a product, newest first.
    async fn product_reviews(&self, product_id: &ProductId)
    -> Result<Vec<Review>, RepositoryError>;
}

// =============================================================================
// Resolver
// =============================================================================

/// Resolves an identity to its storage path.
///
/// Cheap to clone.
#[derive(Clone)]
pub struct Storage {
    catalog: Arc<dyn Catalog>,
    persisted: Arc<dyn PersistedStore>,
    demo: DemoSessionStore,
}

impl Storage {
    #[must_use]
    pub fn new(
        catalog: Arc<dyn Catalog>,
        persisted: Arc<dyn PersistedStore>,
        demo: DemoSessionStore,
    ) -> Self {
        Self {
            catalog,
            persisted,
            demo,
        }
    }

    /// The shared catalog.
    #[must_use]
    pub fn catalog(&self) -> &dyn Catalog {
        self.catalog.as_ref()
    }

    /// Durable storage, for account and admin operations.
    #[must_use]
    pub fn persisted(&self) -> &dyn PersistedStore {
        self.persisted.as_ref()
    }

    /// The in-memory demo sessions.
    #[must_use]
    pub const fn demo_sessions(&self) -> &DemoSessionStore {
        &self.demo
    }

    /// The store holding `user_id`'s data.
    ///
    /// Demo ids get (and lazily create) their session; anything else gets
    /// the database.
    ///
    /// # Errors
    ///
    /// Returns `DemoStoreError` if a demo-prefixed id cannot be mapped back
    /// to a demo address.
    pub async fn for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Arc<dyn IdentityStore>, DemoStoreError> {
        match IdentityKind::of_user_id(user_id) {
            IdentityKind::Demo => {
                let session = self.demo.get_or_create(user_id).await?;
                Ok(Arc::new(DemoIdentityStore::new(session)))
            }
            IdentityKind::Persisted => Ok(self.persisted.identity_store(user_id)),
        }
    }
}
