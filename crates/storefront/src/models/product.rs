//! Catalog product.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bazaar_core::{Money, ProductId};

/// A sellable product. The catalog is shared by every identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    /// Unit price.
    pub price: Money,
    pub image: Option<String>,
    pub category_id: Option<String>,
    /// Units on hand. Never negative.
    pub stock_quantity: u32,
    /// Inactive products cannot be added to carts.
    pub active: bool,
    /// Mean rating over persisted reviews, `0.0` when there are none.
    pub average_rating: f64,
    /// Number of persisted reviews.
    pub review_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Whether `quantity` units can be taken from stock.
    #[must_use]
    pub const fn has_stock_for(&self, quantity: u32) -> bool {
        self.stock_quantity >= quantity
    }
}
