//! HTTP middleware stack for the storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//!
//! Caller identity is resolved per handler by the extractors in [`auth`].

pub mod auth;
pub mod request_id;

pub use auth::{AUTHENTICATED_EMAIL_HEADER, OptionalUser, RequireUser};
pub use request_id::{RequestId, request_id_middleware};
