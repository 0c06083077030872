//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `cart` - Cart lines and totals
//! - `wishlist` - Saved products
//! - `orders` - Checkout workflow, cancellation and admin order management
//! - `payments` - Simulated payment processing
//! - `pricing` - Shipping and tax rules
//! - `reviews` - Reviews, verified purchases and rating aggregates
//! - `users` - Current-user resolution, demo login and profile edits
//!
//! Services are short-lived views over [`Storage`](crate::store::Storage),
//! built per request. None of them branch on the identity kind to pick a
//! storage path.

pub mod cart;
pub mod error;
pub mod orders;
pub mod payments;
pub mod pricing;
pub mod reviews;
pub mod users;
pub mod wishlist;

pub use cart::CartService;
pub use error::ServiceError;
pub use orders::{CheckoutRequest, OrderService, PlacedOrder};
pub use payments::PaymentSimulator;
pub use pricing::{CheckoutPricing, OrderTotals};
pub use reviews::{ReviewChanges, ReviewDraft, ReviewService};
pub use users::{ProfileUpdate, UserService};
pub use wishlist::WishlistService;

use crate::models::User;

/// Reject callers without the `ADMIN` role.
///
/// # Errors
///
/// Returns `ServiceError::Forbidden` for non-admins.
pub fn require_admin(user: &User) -> Result<(), ServiceError> {
    if user.is_admin() {
        Ok(())
    } else {
        Err(ServiceError::Forbidden("admin role required".to_owned()))
    }
}
