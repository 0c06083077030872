//! Service error types.

use thiserror::Error;

use bazaar_core::{EmailError, IdentityError};

use crate::db::RepositoryError;
use crate::demo::DemoStoreError;
use crate::models::InvalidTransition;

/// Errors that can occur in storefront business operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// A referenced entity does not exist (or is invisible to the caller).
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The caller may not touch this entity.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The entity is in a state that does not allow the operation.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Checkout was attempted with no cart or an empty one.
    #[error("cart is empty")]
    EmptyCart,

    /// Not enough units on hand. Carries the product name.
    #[error("insufficient stock for {0}")]
    InsufficientStock(String),

    /// The caller already reviewed this product.
    #[error("you have already reviewed this product")]
    DuplicateReview,

    /// Request input failed validation.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A demo-only operation was routed a persisted identity.
    #[error("demo store error: {0}")]
    Demo(#[from] DemoStoreError),

    /// An identity could not be derived from its address or id.
    #[error("invalid identity: {0}")]
    InvalidIdentity(#[from] IdentityError),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl ServiceError {
    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

impl From<InvalidTransition> for ServiceError {
    fn from(err: InvalidTransition) -> Self {
        Self::InvalidState(err.to_string())
    }
}

impl From<EmailError> for ServiceError {
    fn from(err: EmailError) -> Self {
        Self::Validation(format!("invalid email: {err}"))
    }
}
