//! Orders and their line items.
//!
//! An order's line items are a snapshot of the cart at checkout; later price
//! changes never touch them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bazaar_core::{Money, OrderId, OrderPaymentStatus, OrderStatus, PaymentId, ProductId, UserId};

use super::CartItem;

/// Rejected order status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot move order from {from} to {to}")]
pub struct InvalidTransition {
    pub from: OrderStatus,
    pub to: OrderStatus,
}

/// A line item frozen at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub product_image: Option<String>,
    pub price: Money,
    pub quantity: u32,
    pub subtotal: Money,
}

impl From<&CartItem> for OrderItem {
    fn from(item: &CartItem) -> Self {
        Self {
            product_id: item.product_id.clone(),
            product_name: item.product_name.clone(),
            product_image: item.product_image.clone(),
            price: item.price,
            quantity: item.quantity,
            subtotal: item.subtotal,
        }
    }
}

/// Where an order ships to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub full_name: String,
    pub phone: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
}

impl ShippingAddress {
    /// Names of required fields that are blank.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("fullName", &self.full_name),
            ("phone", &self.phone),
            ("street", &self.street),
            ("city", &self.city),
            ("state", &self.state),
            ("zipCode", &self.zip_code),
            ("country", &self.country),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    /// Human-facing number, `ORD` followed by digits.
    pub order_number: String,
    pub user_id: UserId,
    pub user_name: String,
    pub user_email: String,
    pub items: Vec<OrderItem>,
    pub shipping_address: ShippingAddress,
    pub subtotal: Money,
    pub shipping_cost: Money,
    pub tax: Money,
    /// `subtotal + shipping_cost + tax`.
    pub total_amount: Money,
    pub status: OrderStatus,
    pub payment_status: OrderPaymentStatus,
    /// Method exactly as the shopper requested it.
    pub payment_method: String,
    pub payment_id: Option<PaymentId>,
    pub tracking_number: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set once, on the first move to `SHIPPED`.
    pub shipped_at: Option<DateTime<Utc>>,
    /// Set once, on the first move to `DELIVERED`.
    pub delivered_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Whether any line is for `product_id`.
    #[must_use]
    pub fn contains_product(&self, product_id: &ProductId) -> bool {
        self.items.iter().any(|item| &item.product_id == product_id)
    }

    /// Move to `next`, stamping shipped/delivered times the first time.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` if the order state machine forbids the move.
    pub fn transition_to(
        &mut self,
        next: OrderStatus,
        now: DateTime<Utc>,
    ) -> Result<(), InvalidTransition> {
        if !self.status.can_transition_to(next) {
            return Err(InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        match next {
            OrderStatus::Shipped => {
                self.shipped_at.get_or_insert(now);
            }
            OrderStatus::Delivered => {
                self.delivered_at.get_or_insert(now);
            }
            _ => {}
        }
        self.updated_at = now;
        Ok(())
    }
}
