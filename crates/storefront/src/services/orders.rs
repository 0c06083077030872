//! Order service: checkout, cancellation and admin order management.
//!
//! # Checkout
//!
//! ```text
//! validate address -> load cart -> check every line's stock
//!   -> take stock -> save order -> take payment -> clear cart
//! ```
//!
//! Stock is only taken once every line has passed its check. If a later step
//! fails, stock already taken is put back and a saved order is cancelled,
//! so a failed checkout leaves no partial state behind. The check and the
//! take are separate reads and writes against the catalog; two concurrent
//! checkouts of the last unit can both pass the check.

use std::sync::atomic::{AtomicU32, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};

use bazaar_core::{OrderId, OrderStatus, ProductId};

use super::{CheckoutPricing, PaymentSimulator, ServiceError, require_admin};
use crate::db::RepositoryError;
use crate::models::{Cart, Order, OrderItem, Payment, Product, ShippingAddress, User};
use crate::store::{Catalog, IdentityStore, Page, PageRequest, Storage};

/// Per-process counter appended to order numbers.
static ORDER_SEQUENCE: AtomicU32 = AtomicU32::new(0);

/// `ORD`, epoch milliseconds, then a three-digit sequence.
fn next_order_number(now: DateTime<Utc>) -> String {
    let seq = ORDER_SEQUENCE.fetch_add(1, Ordering::Relaxed) % 1000;
    format!("ORD{}{seq:03}", now.timestamp_millis())
}

/// Checkout input.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub shipping_address: ShippingAddress,
    /// Free text; unknown methods fall back to cash on delivery.
    pub payment_method: String,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Result of a successful checkout.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedOrder {
    pub order: Order,
    pub payment: Payment,
}

/// Order operations.
pub struct OrderService<'a> {
    storage: &'a Storage,
    pricing: &'a CheckoutPricing,
    payments: PaymentSimulator,
}

impl<'a> OrderService<'a> {
    #[must_use]
    pub const fn new(storage: &'a Storage, pricing: &'a CheckoutPricing) -> Self {
        Self {
            storage,
            pricing,
            payments: PaymentSimulator,
        }
    }

    // =========================================================================
    // Shopper operations
    // =========================================================================

    /// Turn the user's cart into a paid (or cash-on-delivery) order.
    ///
    /// # Errors
    ///
    /// - `ServiceError::Validation` if the shipping address is incomplete
    /// - `ServiceError::EmptyCart` if there is nothing to buy
    /// - `ServiceError::NotFound` if a cart product no longer exists
    /// - `ServiceError::InsufficientStock` if any line exceeds stock
    /// - `ServiceError::Repository` if storage fails
    #[instrument(skip(self, user, request), fields(user_id = %user.id))]
    pub async fn create_order(
        &self,
        user: &User,
        request: CheckoutRequest,
    ) -> Result<PlacedOrder, ServiceError> {
        let missing = request.shipping_address.missing_fields();
        if !missing.is_empty() {
            return Err(ServiceError::Validation(format!(
                "missing shipping address fields: {}",
                missing.join(", ")
            )));
        }

        let store = self.storage.for_user(&user.id).await?;
        let cart = store
            .load_cart()
            .await?
            .filter(|cart| !cart.is_empty())
            .ok_or(ServiceError::EmptyCart)?;

        let lines = self.check_stock(&cart).await?;

        let mut reservation = StockReservation::new(self.storage.catalog());
        for (product, quantity) in lines {
            if let Err(err) = reservation.take(product, quantity).await {
                reservation.release().await;
                return Err(err);
            }
        }

        let mut order = self.build_order(store.as_ref(), user, &cart, &request);
        if let Err(err) = store.save_order(&order).await {
            reservation.release().await;
            return Err(err.into());
        }

        let payment = match self
            .payments
            .process(store.as_ref(), &mut order, &request.payment_method)
            .await
        {
            Ok(payment) => payment,
            Err(err) => {
                abandon(store.as_ref(), &mut order).await;
                reservation.release().await;
                return Err(err);
            }
        };

        if let Err(err) = store.clear_cart().await {
            error!(order_id = %order.id, error = %err, "Order placed but cart was not cleared");
        }

        info!(
            order_id = %order.id,
            order_number = %order.order_number,
            total = %order.total_amount,
            "Order placed"
        );
        Ok(PlacedOrder { order, payment })
    }

    /// The user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if storage fails.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn list_orders(&self, user: &User) -> Result<Vec<Order>, ServiceError> {
        let store = self.storage.for_user(&user.id).await?;
        Ok(store.list_orders().await?)
    }

    /// The user's orders in `status`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if storage fails.
    pub async fn list_orders_by_status(
        &self,
        user: &User,
        status: OrderStatus,
    ) -> Result<Vec<Order>, ServiceError> {
        let store = self.storage.for_user(&user.id).await?;
        Ok(store.list_orders_by_status(status).await?)
    }

    /// One order, visible to its owner and to admins.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` or `ServiceError::Forbidden`.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn get_order(&self, user: &User, order_id: &OrderId) -> Result<Order, ServiceError> {
        let store = self.storage.for_user(&user.id).await?;
        let order = find_order(store.as_ref(), order_id).await?;
        if order.user_id != user.id && !user.is_admin() {
            return Err(ServiceError::Forbidden(
                "order belongs to another user".to_owned(),
            ));
        }
        Ok(order)
    }

    /// Cancel one of the user's own orders and put its stock back.
    ///
    /// # Errors
    ///
    /// - `ServiceError::NotFound` if the order does not exist
    /// - `ServiceError::Forbidden` if it belongs to someone else
    /// - `ServiceError::InvalidState` unless it is `PENDING` or `CONFIRMED`
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn cancel_order(
        &self,
        user: &User,
        order_id: &OrderId,
    ) -> Result<Order, ServiceError> {
        let store = self.storage.for_user(&user.id).await?;
        let mut order = find_order(store.as_ref(), order_id).await?;
        if order.user_id != user.id {
            return Err(ServiceError::Forbidden(
                "only the owner can cancel an order".to_owned(),
            ));
        }
        if !order.status.is_cancellable() {
            return Err(ServiceError::InvalidState(format!(
                "order cannot be cancelled in status {}",
                order.status
            )));
        }

        restore_stock(self.storage.catalog(), &order.items).await?;
        order.transition_to(OrderStatus::Cancelled, Utc::now())?;
        store.save_order(&order).await?;

        info!(order_id = %order.id, "Order cancelled");
        Ok(order)
    }

    // =========================================================================
    // Admin operations (persisted orders only)
    // =========================================================================

    /// Every persisted order, newest first.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Forbidden` for non-admins.
    pub async fn list_all_orders(
        &self,
        admin: &User,
        page: PageRequest,
    ) -> Result<Page<Order>, ServiceError> {
        require_admin(admin)?;
        Ok(self.storage.persisted().list_orders(None, page).await?)
    }

    /// Persisted orders in `status`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Forbidden` for non-admins.
    pub async fn list_all_orders_by_status(
        &self,
        admin: &User,
        status: OrderStatus,
        page: PageRequest,
    ) -> Result<Page<Order>, ServiceError> {
        require_admin(admin)?;
        Ok(self
            .storage
            .persisted()
            .list_orders(Some(status), page)
            .await?)
    }

    /// Any persisted order.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Forbidden` for non-admins and
    /// `ServiceError::NotFound` for unknown ids.
    pub async fn get_order_admin(
        &self,
        admin: &User,
        order_id: &OrderId,
    ) -> Result<Order, ServiceError> {
        require_admin(admin)?;
        self.storage
            .persisted()
            .find_order(order_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("order", order_id))
    }

    /// Move a persisted order along its lifecycle.
    ///
    /// The first move to `SHIPPED`/`DELIVERED` stamps the matching time.
    /// Cancelling puts stock back.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::InvalidState` for an unknown status name or a
    /// move the lifecycle forbids.
    #[instrument(skip(self, admin), fields(admin_id = %admin.id))]
    pub async fn update_status(
        &self,
        admin: &User,
        order_id: &OrderId,
        status: &str,
    ) -> Result<Order, ServiceError> {
        require_admin(admin)?;
        let next: OrderStatus = status
            .parse()
            .map_err(|err: bazaar_core::ParseStatusError| {
                ServiceError::InvalidState(err.to_string())
            })?;
        let mut order = self.get_order_admin(admin, order_id).await?;
        if !order.status.can_transition_to(next) {
            return Err(ServiceError::InvalidState(format!(
                "cannot move order from {} to {next}",
                order.status
            )));
        }

        if next == OrderStatus::Cancelled {
            restore_stock(self.storage.catalog(), &order.items).await?;
        }
        let from = order.status;
        order.transition_to(next, Utc::now())?;
        self.storage.persisted().save_order(&order).await?;

        info!(order_id = %order.id, %from, to = %next, "Order status updated");
        Ok(order)
    }

    /// Attach a carrier tracking number to a persisted order.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` for a blank tracking number.
    pub async fn update_tracking_number(
        &self,
        admin: &User,
        order_id: &OrderId,
        tracking_number: &str,
    ) -> Result<Order, ServiceError> {
        require_admin(admin)?;
        let tracking_number = tracking_number.trim();
        if tracking_number.is_empty() {
            return Err(ServiceError::Validation(
                "tracking number must not be blank".to_owned(),
            ));
        }
        let mut order = self.get_order_admin(admin, order_id).await?;
        order.tracking_number = Some(tracking_number.to_owned());
        order.updated_at = Utc::now();
        self.storage.persisted().save_order(&order).await?;
        Ok(order)
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// Load each line's product and check stock. Touches nothing.
    async fn check_stock(&self, cart: &Cart) -> Result<Vec<(Product, u32)>, ServiceError> {
        let mut lines = Vec::with_capacity(cart.items.len());
        for item in &cart.items {
            let product = self
                .storage
                .catalog()
                .find_product(&item.product_id)
                .await?
                .ok_or_else(|| ServiceError::not_found("product", &item.product_id))?;
            if !product.has_stock_for(item.quantity) {
                return Err(ServiceError::InsufficientStock(product.name));
            }
            lines.push((product, item.quantity));
        }
        Ok(lines)
    }

    fn build_order(
        &self,
        store: &dyn IdentityStore,
        user: &User,
        cart: &Cart,
        request: &CheckoutRequest,
    ) -> Order {
        let now = Utc::now();
        let items: Vec<OrderItem> = cart.items.iter().map(OrderItem::from).collect();
        let totals = self
            .pricing
            .quote(items.iter().map(|item| item.subtotal).sum());

        Order {
            id: store.kind().mint_id("order"),
            order_number: next_order_number(now),
            user_id: user.id.clone(),
            user_name: user.display_name(),
            user_email: user.email.to_string(),
            items,
            shipping_address: request.shipping_address.clone(),
            subtotal: totals.subtotal,
            shipping_cost: totals.shipping_cost,
            tax: totals.tax,
            total_amount: totals.total,
            status: OrderStatus::Pending,
            payment_status: bazaar_core::OrderPaymentStatus::Pending,
            payment_method: request.payment_method.clone(),
            payment_id: None,
            tracking_number: None,
            notes: request.notes.clone(),
            created_at: now,
            updated_at: now,
            shipped_at: None,
            delivered_at: None,
        }
    }
}

async fn find_order(store: &dyn IdentityStore, order_id: &OrderId) -> Result<Order, ServiceError> {
    store
        .find_order(order_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("order", order_id))
}

/// Cancel an order whose checkout failed after it was saved. Best effort.
async fn abandon(store: &dyn IdentityStore, order: &mut Order) {
    if order.transition_to(OrderStatus::Cancelled, Utc::now()).is_err() {
        return;
    }
    if let Err(err) = store.save_order(order).await {
        error!(order_id = %order.id, error = %err, "Failed to cancel abandoned order");
    }
}

// =============================================================================
// Stock
// =============================================================================

/// Stock taken during one checkout, so it can be put back.
struct StockReservation<'c> {
    catalog: &'c dyn Catalog,
    taken: Vec<(ProductId, u32)>,
}

impl<'c> StockReservation<'c> {
    fn new(catalog: &'c dyn Catalog) -> Self {
        Self {
            catalog,
            taken: Vec::new(),
        }
    }

    async fn take(&mut self, mut product: Product, quantity: u32) -> Result<(), ServiceError> {
        product.stock_quantity = product
            .stock_quantity
            .checked_sub(quantity)
            .ok_or_else(|| ServiceError::InsufficientStock(product.name.clone()))?;
        self.catalog.save_product(&product).await?;
        self.taken.push((product.id, quantity));
        Ok(())
    }

    /// Put back everything taken, newest first. Failures are logged.
    async fn release(self) {
        for (product_id, quantity) in self.taken.into_iter().rev() {
            if let Err(err) = restore_one(self.catalog, &product_id, quantity).await {
                error!(product_id = %product_id, quantity, error = %err, "Failed to release stock");
            }
        }
    }
}

/// Add each line's quantity back to its product. One write per product.
async fn restore_stock(catalog: &dyn Catalog, items: &[OrderItem]) -> Result<(), ServiceError> {
    for item in items {
        restore_one(catalog, &item.product_id, item.quantity).await?;
    }
    Ok(())
}

async fn restore_one(
    catalog: &dyn Catalog,
    product_id: &ProductId,
    quantity: u32,
) -> Result<(), RepositoryError> {
    let Some(mut product) = catalog.find_product(product_id).await? else {
        warn!(product_id = %product_id, "Product gone, stock not restored");
        return Ok(());
    };
    product.stock_quantity = product.stock_quantity.saturating_add(quantity);
    catalog.save_product(&product).await
}
