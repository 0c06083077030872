//! Cart service.

use tracing::{debug, instrument};

use bazaar_core::{CartId, ProductId};

use super::ServiceError;
use crate::models::{Cart, Product, User};
use crate::store::{IdentityStore, Storage};

/// Cart operations for one identity at a time.
pub struct CartService<'a> {
    storage: &'a Storage,
}

impl<'a> CartService<'a> {
    #[must_use]
    pub const fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// The user's cart; an empty one if none exists yet.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if storage fails.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn get_cart(&self, user: &User) -> Result<Cart, ServiceError> {
        let store = self.storage.for_user(&user.id).await?;
        load_or_new(store.as_ref()).await
    }

    /// Add `quantity` units of a product, merging with an existing line.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` for a zero quantity or an inactive
    /// product, `ServiceError::NotFound` for an unknown product, and
    /// `ServiceError::InsufficientStock` if the merged quantity exceeds stock.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn add_item(
        &self,
        user: &User,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<Cart, ServiceError> {
        if quantity == 0 {
            return Err(ServiceError::Validation(
                "quantity must be at least 1".to_owned(),
            ));
        }
        let product = self.sellable_product(product_id).await?;

        let store = self.storage.for_user(&user.id).await?;
        let mut cart = load_or_new(store.as_ref()).await?;

        let wanted = cart.quantity_of(product_id).saturating_add(quantity);
        if !product.has_stock_for(wanted) {
            return Err(ServiceError::InsufficientStock(product.name));
        }

        cart.add(&product, quantity);
        store.save_cart(&cart).await?;
        debug!(product_id = %product_id, quantity, "Cart line added");
        Ok(cart)
    }

    /// Set a line's quantity. Zero removes the line.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the product is not in the cart or
    /// no longer exists, and `ServiceError::InsufficientStock` if stock is
    /// short.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn update_quantity(
        &self,
        user: &User,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<Cart, ServiceError> {
        let store = self.storage.for_user(&user.id).await?;
        let mut cart = load_or_new(store.as_ref()).await?;
        if cart.item(product_id).is_none() {
            return Err(ServiceError::not_found("cart item", product_id));
        }

        if quantity > 0 {
            let product = self
                .storage
                .catalog()
                .find_product(product_id)
                .await?
                .ok_or_else(|| ServiceError::not_found("product", product_id))?;
            if !product.has_stock_for(quantity) {
                return Err(ServiceError::InsufficientStock(product.name));
            }
        }

        cart.set_quantity(product_id, quantity);
        store.save_cart(&cart).await?;
        Ok(cart)
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the product is not in the cart.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn remove_item(
        &self,
        user: &User,
        product_id: &ProductId,
    ) -> Result<Cart, ServiceError> {
        let store = self.storage.for_user(&user.id).await?;
        let mut cart = load_or_new(store.as_ref()).await?;
        if !cart.remove(product_id) {
            return Err(ServiceError::not_found("cart item", product_id));
        }
        store.save_cart(&cart).await?;
        Ok(cart)
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if storage fails.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn clear(&self, user: &User) -> Result<(), ServiceError> {
        let store = self.storage.for_user(&user.id).await?;
        store.clear_cart().await?;
        Ok(())
    }

    /// A product that exists and is active.
    async fn sellable_product(&self, product_id: &ProductId) -> Result<Product, ServiceError> {
        let product = self
            .storage
            .catalog()
            .find_product(product_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("product", product_id))?;
        if !product.active {
            return Err(ServiceError::Validation(format!(
                "{} is not available",
                product.name
            )));
        }
        Ok(product)
    }
}

/// Load the identity's cart, or start an unsaved empty one.
pub(crate) async fn load_or_new(store: &dyn IdentityStore) -> Result<Cart, ServiceError> {
    if let Some(cart) = store.load_cart().await? {
        return Ok(cart);
    }
    let id: CartId = store.kind().mint_id("cart");
    Ok(Cart::new(id, store.user_id().clone()))
}
