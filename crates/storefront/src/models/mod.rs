//! Domain models for the storefront.
//!
//! These are validated domain objects shared by both storage paths. Database
//! row types live next to their queries in [`crate::db`].

pub mod cart;
pub mod order;
pub mod payment;
pub mod product;
pub mod review;
pub mod user;

pub use cart::{Cart, CartItem};
pub use order::{InvalidTransition, Order, OrderItem, ShippingAddress};
pub use payment::Payment;
pub use product::Product;
pub use review::{RatingSummary, Review};
pub use user::{Address, User};
