//! Shopping cart.
//!
//! A cart belongs to exactly one identity. Line subtotals and cart totals are
//! derived values; every mutation goes through [`Cart::recalculate_totals`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bazaar_core::{CartId, Money, ProductId, UserId};

use super::Product;

/// A line in a cart. Unique per product within a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub product_image: Option<String>,
    /// Unit price captured when the line was added.
    pub price: Money,
    pub quantity: u32,
    /// `price * quantity`.
    pub subtotal: Money,
}

impl CartItem {
    /// Build a line for `quantity` units of `product` at its current price.
    #[must_use]
    pub fn from_product(product: &Product, quantity: u32) -> Self {
        Self {
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            product_image: product.image.clone(),
            price: product.price,
            quantity,
            subtotal: product.price.times(quantity),
        }
    }

    /// Change the quantity and recompute the subtotal.
    pub fn set_quantity(&mut self, quantity: u32) {
        self.quantity = quantity;
        self.subtotal = self.price.times(quantity);
    }
}

/// A shopper's cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub id: CartId,
    pub user_id: UserId,
    pub items: Vec<CartItem>,
    /// Sum of line quantities.
    pub total_items: u32,
    /// Sum of line subtotals.
    pub total_price: Money,
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub fn new(id: CartId, user_id: UserId) -> Self {
        Self {
            id,
            user_id,
            items: Vec::new(),
            total_items: 0,
            total_price: Money::ZERO,
            updated_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The line for `product_id`, if any.
    #[must_use]
    pub fn item(&self, product_id: &ProductId) -> Option<&CartItem> {
        self.items.iter().find(|item| &item.product_id == product_id)
    }

    /// Quantity of `product_id` already in the cart.
    #[must_use]
    pub fn quantity_of(&self, product_id: &ProductId) -> u32 {
        self.item(product_id).map_or(0, |item| item.quantity)
    }

    /// Add `quantity` units of `product`, merging into an existing line.
    pub fn add(&mut self, product: &Product, quantity: u32) {
        match self
            .items
            .iter_mut()
            .find(|item| item.product_id == product.id)
        {
            Some(item) => {
                let merged = item.quantity.saturating_add(quantity);
                item.set_quantity(merged);
            }
            None => self.items.push(CartItem::from_product(product, quantity)),
        }
        self.recalculate_totals();
    }

    /// Set the quantity of an existing line. Zero removes the line.
    ///
    /// Returns `false` if the product is not in the cart.
    pub fn set_quantity(&mut self, product_id: &ProductId, quantity: u32) -> bool {
        if quantity == 0 {
            return self.remove(product_id);
        }
        let Some(item) = self
            .items
            .iter_mut()
            .find(|item| &item.product_id == product_id)
        else {
            return false;
        };
        item.set_quantity(quantity);
        self.recalculate_totals();
        true
    }

    /// Remove the line for `product_id`. Returns whether a line was removed.
    pub fn remove(&mut self, product_id: &ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|item| &item.product_id != product_id);
        let removed = self.items.len() != before;
        if removed {
            self.recalculate_totals();
        }
        removed
    }

    /// Drop every line and zero the totals.
    pub fn clear(&mut self) {
        self.items.clear();
        self.recalculate_totals();
    }

    /// Recompute `total_items` and `total_price` from the lines.
    pub fn recalculate_totals(&mut self) {
        self.total_items = self.items.iter().map(|item| item.quantity).sum();
        self.total_price = self.items.iter().map(|item| item.subtotal).sum();
        self.updated_at = Utc::now();
    }
}
