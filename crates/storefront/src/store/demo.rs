//! [`IdentityStore`] over a demo session.

use std::sync::Arc;

use async_trait::async_trait;

use bazaar_core::{IdentityKind, OrderId, OrderStatus, PaymentId, ProductId, ReviewId, UserId};

use super::IdentityStore;
use crate::db::RepositoryError;
use crate::demo::DemoSession;
use crate::models::{Cart, Order, Payment, Review};

/// Demo-path store. Every operation is an in-memory session access.
#[derive(Debug, Clone)]
pub struct DemoIdentityStore {
    session: Arc<DemoSession>,
}

impl DemoIdentityStore {
    #[must_use]
    pub const fn new(session: Arc<DemoSession>) -> Self {
        Self { session }
    }

    /// The backing session.
    #[must_use]
    pub const fn session(&self) -> &Arc<DemoSession> {
        &self.session
    }
}

#[async_trait]
impl IdentityStore for DemoIdentityStore {
    fn kind(&self) -> IdentityKind {
        IdentityKind::Demo
    }

    fn user_id(&self) -> &UserId {
        self.session.user_id()
    }

    async fn load_cart(&self) -> Result<Option<Cart>, RepositoryError> {
        Ok(self.session.read_cart())
    }

    async fn save_cart(&self, cart: &Cart) -> Result<(), RepositoryError> {
        self.session.write_cart(cart.clone());
        Ok(())
    }

    async fn clear_cart(&self) -> Result<(), RepositoryError> {
        self.session.clear_cart();
        Ok(())
    }

    async fn wishlist(&self) -> Result<Vec<ProductId>, RepositoryError> {
        Ok(self.session.wishlist())
    }

    async fn wishlist_add(&self, product_id: &ProductId) -> Result<(), RepositoryError> {
        self.session.wishlist_add(product_id.clone());
        Ok(())
    }

    async fn wishlist_remove(&self, product_id: &ProductId) -> Result<(), RepositoryError> {
        self.session.wishlist_remove(product_id);
        Ok(())
    }

    async fn wishlist_contains(&self, product_id: &ProductId) -> Result<bool, RepositoryError> {
        Ok(self.session.wishlist_contains(product_id))
    }

    async fn wishlist_clear(&self) -> Result<(), RepositoryError> {
        self.session.wishlist_clear();
        Ok(())
    }

    async fn save_order(&self, order: &Order) -> Result<(), RepositoryError> {
        self.session.save_order(order.clone());
        Ok(())
    }

    async fn find_order(&self, id: &OrderId) -> Result<Option<Order>, RepositoryError> {
        Ok(self.session.get_order(id))
    }

    async fn list_orders(&self) -> Result<Vec<Order>, RepositoryError> {
        Ok(self.session.list_orders())
    }

    async fn list_orders_by_status(
        &self,
        status: OrderStatus,
    ) -> Result<Vec<Order>, RepositoryError> {
        Ok(self.session.orders_with_status(status))
    }

    async fn save_payment(&self, payment: &Payment) -> Result<(), RepositoryError> {
        self.session.save_payment(payment.clone());
        Ok(())
    }

    async fn find_payment(&self, id: &PaymentId) -> Result<Option<Payment>, RepositoryError> {
        Ok(self.session.get_payment(id))
    }

    async fn save_review(&self, review: &Review) -> Result<(), RepositoryError> {
        self.session.save_review(review.clone());
        Ok(())
    }

    async fn find_review(&self, id: &ReviewId) -> Result<Option<Review>, RepositoryError> {
        Ok(self.session.get_review(id))
    }

    async fn has_reviewed(&self, product_id: &ProductId) -> Result<bool, RepositoryError> {
        Ok(self.session.has_reviewed(product_id))
    }

    async fn reviews_for_product(
        &self,
        product_id: &ProductId,
    ) -> Result<Vec<Review>, RepositoryError> {
        Ok(self.session.reviews_for_product(product_id))
    }

    async fn delete_review(&self, id: &ReviewId) -> Result<bool, RepositoryError> {
        Ok(self.session.delete_review(id).is_some())
    }
}
