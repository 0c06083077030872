//! Bazaar Core - Shared domain types.
//!
//! This crate provides the vocabulary used across all Bazaar components:
//! - `storefront` - Cart, checkout, reviews and demo sessions
//! - `cli` - Command-line tools for migrations and user management
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. This keeps it lightweight and allows it to be used
//! anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, money, emails, and statuses
//! - [`identity`] - Demo identity classification and id derivation

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod identity;
pub mod types;

pub use identity::{IdentityError, IdentityKind};
pub use types::*;
