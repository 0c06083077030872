//! Integration test support for Bazaar.
//!
//! In-memory stand-ins for the persisted collaborators (catalog and database)
//! so the storefront services can be driven end to end without `PostgreSQL`.
//! Demo identities use the real [`DemoSessionStore`].
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p bazaar-integration-tests
//! ```
//!
//! # Fault injection
//!
//! - [`MemoryCatalog::fail_saves_of`] makes stock writes for one product fail
//! - [`MemoryDatabase::fail_payment_saves`] makes persisted payment writes fail
//! - [`BarrierCatalog`] holds concurrent product reads at a rendezvous point

#![allow(clippy::missing_panics_doc, clippy::unwrap_used)]

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::Barrier;

use bazaar_core::{
    Email, IdentityKind, Money, OrderId, OrderStatus, PaymentId, ProductId, ReviewId, Role,
    UserId,
};
use bazaar_storefront::db::RepositoryError;
use bazaar_storefront::demo::{DemoSessionConfig, DemoSessionStore};
use bazaar_storefront::models::{
    Cart, Order, Payment, Product, RatingSummary, Review, ShippingAddress, User,
};
use bazaar_storefront::services::{CheckoutPricing, CheckoutRequest};
use bazaar_storefront::store::{
    Catalog, IdentityStore, Page, PageRequest, PersistedStore, Storage,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap()
}

fn injected(what: &str) -> RepositoryError {
    RepositoryError::Conflict(format!("injected failure: {what}"))
}

// =============================================================================
// Catalog
// =============================================================================

/// In-memory product catalog.
#[derive(Default)]
pub struct MemoryCatalog {
    products: Mutex<HashMap<ProductId, Product>>,
    failing: Mutex<BTreeSet<ProductId>>,
}

impl MemoryCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a product directly.
    pub fn insert(&self, product: Product) {
        lock(&self.products).insert(product.id.clone(), product);
    }

    /// Current state of a product.
    #[must_use]
    pub fn product(&self, id: &ProductId) -> Option<Product> {
        lock(&self.products).get(id).cloned()
    }

    /// Current stock of a product, `0` if unknown.
    #[must_use]
    pub fn stock_of(&self, id: &ProductId) -> u32 {
        self.product(id).map_or(0, |p| p.stock_quantity)
    }

    /// Make every later `save_product` of `id` fail.
    pub fn fail_saves_of(&self, id: &ProductId) {
        lock(&self.failing).insert(id.clone());
    }
}

#[async_trait]
impl Catalog for MemoryCatalog {
    async fn find_product(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(self.product(id))
    }

    async fn save_product(&self, product: &Product) -> Result<(), RepositoryError> {
        if lock(&self.failing).contains(&product.id) {
            return Err(injected("save_product"));
        }
        self.insert(product.clone());
        Ok(())
    }

    async fn exists_product(&self, id: &ProductId) -> Result<bool, RepositoryError> {
        Ok(lock(&self.products).contains_key(id))
    }

    async fn update_rating(
        &self,
        id: &ProductId,
        rating: RatingSummary,
    ) -> Result<(), RepositoryError> {
        let mut products = lock(&self.products);
        let product = products.get_mut(id).ok_or(RepositoryError::NotFound)?;
        product.average_rating = rating.average;
        product.review_count = rating.count;
        Ok(())
    }
}

/// Catalog wrapper whose product reads wait for each other while armed.
///
/// Two checkouts that both read the same product meet at the barrier before
/// either decrements stock, forcing the check-then-act interleaving.
pub struct BarrierCatalog {
    inner: Arc<MemoryCatalog>,
    barrier: Barrier,
    armed: AtomicBool,
}

impl BarrierCatalog {
    #[must_use]
    pub fn new(inner: Arc<MemoryCatalog>, parties: usize) -> Self {
        Self {
            inner,
            barrier: Barrier::new(parties),
            armed: AtomicBool::new(false),
        }
    }

    pub fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }

    pub fn disarm(&self) {
        self.armed.store(false, Ordering::SeqCst);
    }
}

#[async_trait]
impl Catalog for BarrierCatalog {
    async fn find_product(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        let product = self.inner.find_product(id).await?;
        if self.armed.load(Ordering::SeqCst) {
            self.barrier.wait().await;
        }
        Ok(product)
    }

    async fn save_product(&self, product: &Product) -> Result<(), RepositoryError> {
        self.inner.save_product(product).await
    }

    async fn exists_product(&self, id: &ProductId) -> Result<bool, RepositoryError> {
        self.inner.exists_product(id).await
    }

    async fn update_rating(
        &self,
        id: &ProductId,
        rating: RatingSummary,
    ) -> Result<(), RepositoryError> {
        self.inner.update_rating(id, rating).await
    }
}

// =============================================================================
// Persisted database
// =============================================================================

#[derive(Default)]
struct Tables {
    users: HashMap<UserId, User>,
    carts: HashMap<UserId, Cart>,
    wishlists: HashMap<UserId, BTreeSet<ProductId>>,
    orders: HashMap<OrderId, Order>,
    payments: HashMap<PaymentId, Payment>,
    reviews: HashMap<ReviewId, Review>,
}

#[derive(Default)]
struct Shared {
    tables: Mutex<Tables>,
    fail_payments: AtomicBool,
}

/// In-memory [`PersistedStore`] with the same constraints as the database:
/// one review per user and product, case-insensitive email lookup.
#[derive(Default, Clone)]
pub struct MemoryDatabase {
    shared: Arc<Shared>,
}

impl MemoryDatabase {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later persisted payment write fail.
    pub fn fail_payment_saves(&self) {
        self.shared.fail_payments.store(true, Ordering::SeqCst);
    }

    /// Number of persisted orders.
    #[must_use]
    pub fn order_count(&self) -> usize {
        lock(&self.shared.tables).orders.len()
    }

    /// Number of persisted reviews.
    #[must_use]
    pub fn review_count(&self) -> usize {
        lock(&self.shared.tables).reviews.len()
    }

    /// A persisted order by id.
    #[must_use]
    pub fn order(&self, id: &OrderId) -> Option<Order> {
        lock(&self.shared.tables).orders.get(id).cloned()
    }
}

fn paged<T>(rows: Vec<T>, page: PageRequest) -> Page<T> {
    let total = rows.len() as u64;
    let items = rows
        .into_iter()
        .skip(usize::try_from(page.offset()).unwrap())
        .take(page.size as usize)
        .collect();
    Page {
        items,
        page: page.page,
        size: page.size,
        total,
    }
}

fn newest_first(orders: &mut [Order]) {
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

#[async_trait]
impl PersistedStore for MemoryDatabase {
    fn identity_store(&self, user_id: &UserId) -> Arc<dyn IdentityStore> {
        Arc::new(MemoryIdentityStore {
            shared: Arc::clone(&self.shared),
            user_id: user_id.clone(),
        })
    }

    async fn find_user(&self, id: &UserId) -> Result<Option<User>, RepositoryError> {
        Ok(lock(&self.shared.tables).users.get(id).cloned())
    }

    async fn find_user_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        Ok(lock(&self.shared.tables)
            .users
            .values()
            .find(|user| user.email.eq_ignore_case(email.as_str()))
            .cloned())
    }

    async fn save_user(&self, user: &User) -> Result<(), RepositoryError> {
        lock(&self.shared.tables)
            .users
            .insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn list_users(&self, page: PageRequest) -> Result<Page<User>, RepositoryError> {
        let mut users: Vec<User> = lock(&self.shared.tables).users.values().cloned().collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(paged(users, page))
    }

    async fn find_order(&self, id: &OrderId) -> Result<Option<Order>, RepositoryError> {
        Ok(self.order(id))
    }

    async fn save_order(&self, order: &Order) -> Result<(), RepositoryError> {
        lock(&self.shared.tables)
            .orders
            .insert(order.id.clone(), order.clone());
        Ok(())
    }

    async fn list_orders(
        &self,
        status: Option<OrderStatus>,
        page: PageRequest,
    ) -> Result<Page<Order>, RepositoryError> {
        let mut orders: Vec<Order> = lock(&self.shared.tables)
            .orders
            .values()
            .filter(|order| status.is_none_or(|status| order.status == status))
            .cloned()
            .collect();
        newest_first(&mut orders);
        Ok(paged(orders, page))
    }

    async fn find_review(&self, id: &ReviewId) -> Result<Option<Review>, RepositoryError> {
        Ok(lock(&self.shared.tables).reviews.get(id).cloned())
    }

    async fn product_reviews(
        &self,
        product_id: &ProductId,
    ) -> Result<Vec<Review>, RepositoryError> {
        let mut reviews: Vec<Review> = lock(&self.shared.tables)
            .reviews
            .values()
            .filter(|review| &review.product_id == product_id)
            .cloned()
            .collect();
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reviews)
    }
}

/// One persisted identity's view of [`MemoryDatabase`].
struct MemoryIdentityStore {
    shared: Arc<Shared>,
    user_id: UserId,
}

impl MemoryIdentityStore {
    fn tables(&self) -> MutexGuard<'_, Tables> {
        lock(&self.shared.tables)
    }
}

#[async_trait]
impl IdentityStore for MemoryIdentityStore {
    fn kind(&self) -> IdentityKind {
        IdentityKind::Persisted
    }

    fn user_id(&self) -> &UserId {
        &self.user_id
    }

    async fn load_cart(&self) -> Result<Option<Cart>, RepositoryError> {
        Ok(self.tables().carts.get(&self.user_id).cloned())
    }

    async fn save_cart(&self, cart: &Cart) -> Result<(), RepositoryError> {
        self.tables()
            .carts
            .insert(self.user_id.clone(), cart.clone());
        Ok(())
    }

    async fn clear_cart(&self) -> Result<(), RepositoryError> {
        if let Some(cart) = self.tables().carts.get_mut(&self.user_id) {
            cart.clear();
        }
        Ok(())
    }

    async fn wishlist(&self) -> Result<Vec<ProductId>, RepositoryError> {
        Ok(self
            .tables()
            .wishlists
            .get(&self.user_id)
            .map(|items| items.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn wishlist_add(&self, product_id: &ProductId) -> Result<(), RepositoryError> {
        self.tables()
            .wishlists
            .entry(self.user_id.clone())
            .or_default()
            .insert(product_id.clone());
        Ok(())
    }

    async fn wishlist_remove(&self, product_id: &ProductId) -> Result<(), RepositoryError> {
        if let Some(items) = self.tables().wishlists.get_mut(&self.user_id) {
            items.remove(product_id);
        }
        Ok(())
    }

    async fn wishlist_contains(&self, product_id: &ProductId) -> Result<bool, RepositoryError> {
        Ok(self
            .tables()
            .wishlists
            .get(&self.user_id)
            .is_some_and(|items| items.contains(product_id)))
    }

    async fn wishlist_clear(&self) -> Result<(), RepositoryError> {
        self.tables().wishlists.remove(&self.user_id);
        Ok(())
    }

    async fn save_order(&self, order: &Order) -> Result<(), RepositoryError> {
        self.tables().orders.insert(order.id.clone(), order.clone());
        Ok(())
    }

    async fn find_order(&self, id: &OrderId) -> Result<Option<Order>, RepositoryError> {
        Ok(self.tables().orders.get(id).cloned())
    }

    async fn list_orders(&self) -> Result<Vec<Order>, RepositoryError> {
        let mut orders: Vec<Order> = self
            .tables()
            .orders
            .values()
            .filter(|order| order.user_id == self.user_id)
            .cloned()
            .collect();
        newest_first(&mut orders);
        Ok(orders)
    }

    async fn list_orders_by_status(
        &self,
        status: OrderStatus,
    ) -> Result<Vec<Order>, RepositoryError> {
        let mut orders = self.list_orders().await?;
        orders.retain(|order| order.status == status);
        Ok(orders)
    }

    async fn save_payment(&self, payment: &Payment) -> Result<(), RepositoryError> {
        if self.shared.fail_payments.load(Ordering::SeqCst) {
            return Err(injected("save_payment"));
        }
        self.tables()
            .payments
            .insert(payment.id.clone(), payment.clone());
        Ok(())
    }

    async fn find_payment(&self, id: &PaymentId) -> Result<Option<Payment>, RepositoryError> {
        Ok(self.tables().payments.get(id).cloned())
    }

    async fn save_review(&self, review: &Review) -> Result<(), RepositoryError> {
        let mut tables = self.tables();
        let duplicate = tables.reviews.values().any(|existing| {
            existing.id != review.id
                && existing.product_id == review.product_id
                && existing.user_id == review.user_id
        });
        if duplicate {
            return Err(RepositoryError::Conflict("review".to_owned()));
        }
        tables.reviews.insert(review.id.clone(), review.clone());
        Ok(())
    }

    async fn find_review(&self, id: &ReviewId) -> Result<Option<Review>, RepositoryError> {
        Ok(self.tables().reviews.get(id).cloned())
    }

    async fn has_reviewed(&self, product_id: &ProductId) -> Result<bool, RepositoryError> {
        Ok(self
            .tables()
            .reviews
            .values()
            .any(|r| &r.product_id == product_id && r.user_id == self.user_id))
    }

    async fn reviews_for_product(
        &self,
        product_id: &ProductId,
    ) -> Result<Vec<Review>, RepositoryError> {
        let mut reviews: Vec<Review> = self
            .tables()
            .reviews
            .values()
            .filter(|r| &r.product_id == product_id)
            .cloned()
            .collect();
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reviews)
    }

    async fn delete_review(&self, id: &ReviewId) -> Result<bool, RepositoryError> {
        Ok(self.tables().reviews.remove(id).is_some())
    }
}

// =============================================================================
// Fixtures
// =============================================================================

/// A wired-up storage resolver plus handles on its in-memory parts.
pub struct TestShop {
    pub storage: Storage,
    pub catalog: Arc<MemoryCatalog>,
    pub database: MemoryDatabase,
    pub pricing: CheckoutPricing,
}

impl TestShop {
    /// Shop with default pricing (18% tax, free shipping from 500.00).
    #[must_use]
    pub fn new() -> Self {
        let catalog = Arc::new(MemoryCatalog::new());
        let shared: Arc<dyn Catalog> = catalog.clone();
        Self::with_catalog(shared, catalog)
    }

    /// Shop whose services see `catalog`, with `memory` as the backing store
    /// for direct inspection.
    #[must_use]
    pub fn with_catalog(catalog: Arc<dyn Catalog>, memory: Arc<MemoryCatalog>) -> Self {
        let database = MemoryDatabase::new();
        let storage = Storage::new(
            catalog,
            Arc::new(database.clone()),
            DemoSessionStore::new(&DemoSessionConfig::default()),
        );
        Self {
            storage,
            catalog: memory,
            database,
            pricing: CheckoutPricing::default(),
        }
    }

    /// Add an active product to the catalog.
    pub fn add_product(&self, id: &str, price: &str, stock: u32) -> ProductId {
        let now = Utc::now();
        let id = ProductId::new(id);
        self.catalog.insert(Product {
            id: id.clone(),
            name: format!("Product {id}"),
            description: None,
            price: price.parse::<Money>().unwrap(),
            image: None,
            category_id: None,
            stock_quantity: stock,
            active: true,
            average_rating: 0.0,
            review_count: 0,
            created_at: now,
            updated_at: now,
        });
        id
    }

    /// Register a persisted shopper.
    pub async fn register(&self, email: &str) -> User {
        let mut user = User::new(
            IdentityKind::Persisted.mint_id("user"),
            Email::parse(email).unwrap(),
        );
        user.first_name = Some("Test".to_owned());
        user.last_name = Some("Shopper".to_owned());
        self.storage.persisted().save_user(&user).await.unwrap();
        user
    }

    /// Register a persisted administrator.
    pub async fn register_admin(&self, email: &str) -> User {
        let mut user = self.register(email).await;
        user.roles.insert(Role::Admin);
        self.storage.persisted().save_user(&user).await.unwrap();
        user
    }

    /// Start a fresh demo session and return its profile.
    pub async fn demo_user(&self) -> User {
        bazaar_storefront::services::UserService::new(&self.storage)
            .demo_login()
            .await
            .unwrap()
    }

    /// Backdate an order so listings order deterministically.
    pub async fn backdate_order(&self, user: &User, order_id: &OrderId, minutes: i64) {
        let store = self.storage.for_user(&user.id).await.unwrap();
        let mut order = store.find_order(order_id).await.unwrap().unwrap();
        order.created_at -= Duration::minutes(minutes);
        store.save_order(&order).await.unwrap();
    }
}

impl Default for TestShop {
    fn default() -> Self {
        Self::new()
    }
}

/// A complete shipping address.
#[must_use]
pub fn shipping_address() -> ShippingAddress {
    ShippingAddress {
        full_name: "Asha Rao".to_owned(),
        phone: "9876543210".to_owned(),
        street: "12 MG Road".to_owned(),
        city: "Bengaluru".to_owned(),
        state: "Karnataka".to_owned(),
        zip_code: "560001".to_owned(),
        country: "India".to_owned(),
    }
}

/// A checkout request paying with `method`.
#[must_use]
pub fn checkout(method: &str) -> CheckoutRequest {
    CheckoutRequest {
        shipping_address: shipping_address(),
        payment_method: method.to_owned(),
        notes: None,
    }
}
