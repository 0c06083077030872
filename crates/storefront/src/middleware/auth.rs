//! Caller identity extractors.
//!
//! Authentication happens upstream; the gateway forwards the authenticated
//! email in the `x-authenticated-email` header. These extractors resolve it
//! to a [`User`], creating the demo session on first sight of a demo address.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::{AppError, set_sentry_user};
use crate::models::User;
use crate::services::UserService;
use crate::state::AppState;

/// Header carrying the authenticated email.
pub const AUTHENTICATED_EMAIL_HEADER: &str = "x-authenticated-email";

/// Extractor that requires an authenticated caller.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(RequireUser(user): RequireUser) -> impl IntoResponse {
///     format!("Hello, {}!", user.display_name())
/// }
/// ```
pub struct RequireUser(pub User);

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let email = authenticated_email(parts)
            .ok_or_else(|| AppError::Unauthorized("authentication required".to_string()))?;
        let user = UserService::new(state.storage())
            .current_user(email)
            .await?;
        set_sentry_user(&user.id, Some(user.email.as_str()));
        Ok(Self(user))
    }
}

/// Extractor that optionally resolves the caller.
///
/// Anonymous requests yield `None`; a header naming an unknown account is
/// still rejected.
pub struct OptionalUser(pub Option<User>);

impl FromRequestParts<AppState> for OptionalUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match authenticated_email(parts) {
            Some(email) => {
                let user = UserService::new(state.storage())
                    .current_user(email)
                    .await?;
                Ok(Self(Some(user)))
            }
            None => Ok(Self(None)),
        }
    }
}

fn authenticated_email(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHENTICATED_EMAIL_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|email| !email.is_empty())
}
