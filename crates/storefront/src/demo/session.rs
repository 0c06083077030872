//! One demo shopper's in-memory data graph.

use std::collections::{BTreeSet, HashMap};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};

use bazaar_core::{OrderId, OrderStatus, PaymentId, ProductId, ReviewId, UserId};

use crate::models::{Cart, Order, Payment, Review, User};

/// A demo session.
///
/// Each accessor takes the session lock for the duration of one operation.
/// The lock is never held across an `.await`.
#[derive(Debug)]
pub struct DemoSession {
    user_id: UserId,
    created_at: DateTime<Utc>,
    data: RwLock<SessionData>,
}

#[derive(Debug)]
struct SessionData {
    profile: User,
    cart: Option<Cart>,
    wishlist: BTreeSet<ProductId>,
    orders: HashMap<OrderId, Order>,
    /// First-save order of `orders`.
    order_log: Vec<OrderId>,
    payments: HashMap<PaymentId, Payment>,
    reviews: HashMap<ReviewId, Review>,
    /// Per product, newest first.
    reviews_by_product: HashMap<ProductId, Vec<ReviewId>>,
}

impl DemoSession {
    pub(crate) fn new(profile: User) -> Self {
        Self {
            user_id: profile.id.clone(),
            created_at: Utc::now(),
            data: RwLock::new(SessionData {
                profile,
                cart: None,
                wishlist: BTreeSet::new(),
                orders: HashMap::new(),
                order_log: Vec::new(),
                payments: HashMap::new(),
                reviews: HashMap::new(),
                reviews_by_product: HashMap::new(),
            }),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, SessionData> {
        self.data.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionData> {
        self.data.write().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub const fn user_id(&self) -> &UserId {
        &self.user_id
    }

    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    // =========================================================================
    // Profile
    // =========================================================================

    /// The synthesized profile, as last edited.
    #[must_use]
    pub fn profile(&self) -> User {
        self.read().profile.clone()
    }

    pub fn replace_profile(&self, user: User) {
        self.write().profile = user;
    }

    // =========================================================================
    // Cart
    // =========================================================================

    #[must_use]
    pub fn read_cart(&self) -> Option<Cart> {
        self.read().cart.clone()
    }

    pub fn write_cart(&self, cart: Cart) {
        self.write().cart = Some(cart);
    }

    /// Empty the cart's lines and zero its totals. No-op without a cart.
    pub fn clear_cart(&self) {
        if let Some(cart) = self.write().cart.as_mut() {
            cart.clear();
        }
    }

    // =========================================================================
    // Wishlist
    // =========================================================================

    #[must_use]
    pub fn wishlist(&self) -> Vec<ProductId> {
        self.read().wishlist.iter().cloned().collect()
    }

    pub fn wishlist_add(&self, product_id: ProductId) {
        self.write().wishlist.insert(product_id);
    }

    pub fn wishlist_remove(&self, product_id: &ProductId) {
        self.write().wishlist.remove(product_id);
    }

    #[must_use]
    pub fn wishlist_contains(&self, product_id: &ProductId) -> bool {
        self.read().wishlist.contains(product_id)
    }

    pub fn wishlist_clear(&self) {
        self.write().wishlist.clear();
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// Insert or replace an order by id.
    pub fn save_order(&self, order: Order) {
        let mut data = self.write();
        if !data.orders.contains_key(&order.id) {
            data.order_log.push(order.id.clone());
        }
        data.orders.insert(order.id.clone(), order);
    }

    #[must_use]
    pub fn get_order(&self, id: &OrderId) -> Option<Order> {
        self.read().orders.get(id).cloned()
    }

    /// Orders, newest first.
    #[must_use]
    pub fn list_orders(&self) -> Vec<Order> {
        let data = self.read();
        let mut orders: Vec<Order> = data
            .order_log
            .iter()
            .filter_map(|id| data.orders.get(id).cloned())
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        orders
    }

    /// Orders in `status`, newest first.
    #[must_use]
    pub fn orders_with_status(&self, status: OrderStatus) -> Vec<Order> {
        let mut orders = self.list_orders();
        orders.retain(|order| order.status == status);
        orders
    }

    // =========================================================================
    // Payments
    // =========================================================================

    pub fn save_payment(&self, payment: Payment) {
        self.write().payments.insert(payment.id.clone(), payment);
    }

    #[must_use]
    pub fn get_payment(&self, id: &PaymentId) -> Option<Payment> {
        self.read().payments.get(id).cloned()
    }

    // =========================================================================
    // Reviews
    // =========================================================================

    /// Insert or replace a review by id and re-sort its product's list.
    pub fn save_review(&self, review: Review) {
        let mut data = self.write();
        let SessionData {
            reviews,
            reviews_by_product,
            ..
        } = &mut *data;

        let ids = reviews_by_product
            .entry(review.product_id.clone())
            .or_default();
        if !ids.contains(&review.id) {
            ids.push(review.id.clone());
        }
        reviews.insert(review.id.clone(), review);
        ids.sort_by(|a, b| {
            let created = |id: &ReviewId| reviews.get(id).map(|review| review.created_at);
            created(b).cmp(&created(a))
        });
    }

    #[must_use]
    pub fn get_review(&self, id: &ReviewId) -> Option<Review> {
        self.read().reviews.get(id).cloned()
    }

    /// Whether this session's shopper already reviewed `product_id`.
    #[must_use]
    pub fn has_reviewed(&self, product_id: &ProductId) -> bool {
        let data = self.read();
        data.reviews_by_product
            .get(product_id)
            .is_some_and(|ids| {
                ids.iter()
                    .filter_map(|id| data.reviews.get(id))
                    .any(|review| review.user_id == self.user_id)
            })
    }

    /// Reviews of `product_id`, newest first.
    #[must_use]
    pub fn reviews_for_product(&self, product_id: &ProductId) -> Vec<Review> {
        let data = self.read();
        data.reviews_by_product
            .get(product_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| data.reviews.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Remove a review. Returns it if it existed.
    pub fn delete_review(&self, id: &ReviewId) -> Option<Review> {
        let mut data = self.write();
        let review = data.reviews.remove(id)?;
        if let Some(ids) = data.reviews_by_product.get_mut(&review.product_id) {
            ids.retain(|existing| existing != id);
        }
        Some(review)
    }
}
