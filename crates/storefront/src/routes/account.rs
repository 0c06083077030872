//! Account route handlers: demo login and the caller's profile.

use axum::{Json, extract::State, http::StatusCode};

use crate::error::Result;
use crate::middleware::RequireUser;
use crate::models::User;
use crate::services::{ProfileUpdate, UserService};
use crate::state::AppState;

/// POST /api/auth/demo-login
///
/// Starts a zero-signup demo session. The returned profile carries the demo
/// email the client presents on later requests.
pub async fn demo_login(State(state): State<AppState>) -> Result<(StatusCode, Json<User>)> {
    let user = UserService::new(state.storage()).demo_login().await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// GET /api/users/me
pub async fn me(RequireUser(user): RequireUser) -> Json<User> {
    Json(user)
}

/// PUT /api/users/me
pub async fn update_me(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<User>> {
    let user = UserService::new(state.storage())
        .update_profile(&user, update)
        .await?;
    Ok(Json(user))
}
