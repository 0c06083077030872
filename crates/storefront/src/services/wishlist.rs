//! Wishlist service.

use tracing::instrument;

use bazaar_core::ProductId;

use super::ServiceError;
use crate::models::{Cart, Product, User};
use crate::store::Storage;

/// Wishlist operations.
pub struct WishlistService<'a> {
    storage: &'a Storage,
}

impl<'a> WishlistService<'a> {
    #[must_use]
    pub const fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Products on the wishlist. Entries whose product has since been
    /// deleted are skipped.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if storage fails.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn list(&self, user: &User) -> Result<Vec<Product>, ServiceError> {
        let store = self.storage.for_user(&user.id).await?;
        let mut products = Vec::new();
        for product_id in store.wishlist().await? {
            if let Some(product) = self.storage.catalog().find_product(&product_id).await? {
                products.push(product);
            }
        }
        Ok(products)
    }

    /// Add a product. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the product does not exist.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn add(&self, user: &User, product_id: &ProductId) -> Result<(), ServiceError> {
        self.require_product(product_id).await?;
        let store = self.storage.for_user(&user.id).await?;
        store.wishlist_add(product_id).await?;
        Ok(())
    }

    /// Remove a product. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the product does not exist.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn remove(&self, user: &User, product_id: &ProductId) -> Result<(), ServiceError> {
        self.require_product(product_id).await?;
        let store = self.storage.for_user(&user.id).await?;
        store.wishlist_remove(product_id).await?;
        Ok(())
    }

    /// Whether a product is on the wishlist.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if storage fails.
    pub async fn contains(&self, user: &User, product_id: &ProductId) -> Result<bool, ServiceError> {
        let store = self.storage.for_user(&user.id).await?;
        Ok(store.wishlist_contains(product_id).await?)
    }

    /// Remove everything.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if storage fails.
    pub async fn clear(&self, user: &User) -> Result<(), ServiceError> {
        let store = self.storage.for_user(&user.id).await?;
        store.wishlist_clear().await?;
        Ok(())
    }

    /// Move a product into the cart (one unit) and off the wishlist.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the product does not exist and
    /// `ServiceError::InsufficientStock` if it cannot be added.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn move_to_cart(
        &self,
        user: &User,
        product_id: &ProductId,
    ) -> Result<Cart, ServiceError> {
        let cart = super::CartService::new(self.storage)
            .add_item(user, product_id, 1)
            .await?;
        let store = self.storage.for_user(&user.id).await?;
        store.wishlist_remove(product_id).await?;
        Ok(cart)
    }

    async fn require_product(&self, product_id: &ProductId) -> Result<(), ServiceError> {
        if self.storage.catalog().exists_product(product_id).await? {
            Ok(())
        } else {
            Err(ServiceError::not_found("product", product_id))
        }
    }
}

