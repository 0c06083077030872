//! Wishlist route handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Serialize;

use bazaar_core::ProductId;

use crate::error::Result;
use crate::middleware::RequireUser;
use crate::models::{Cart, Product};
use crate::services::WishlistService;
use crate::state::AppState;

/// Response of `GET /api/wishlist/{product_id}`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainsResponse {
    pub in_wishlist: bool,
}

/// GET /api/wishlist
pub async fn list(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<Vec<Product>>> {
    let products = WishlistService::new(state.storage()).list(&user).await?;
    Ok(Json(products))
}

/// POST /api/wishlist/{product_id}
pub async fn add(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(product_id): Path<ProductId>,
) -> Result<StatusCode> {
    WishlistService::new(state.storage())
        .add(&user, &product_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/wishlist/{product_id}
pub async fn remove(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(product_id): Path<ProductId>,
) -> Result<StatusCode> {
    WishlistService::new(state.storage())
        .remove(&user, &product_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/wishlist/{product_id}
pub async fn contains(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(product_id): Path<ProductId>,
) -> Result<Json<ContainsResponse>> {
    let in_wishlist = WishlistService::new(state.storage())
        .contains(&user, &product_id)
        .await?;
    Ok(Json(ContainsResponse { in_wishlist }))
}

/// DELETE /api/wishlist
pub async fn clear(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<StatusCode> {
    WishlistService::new(state.storage()).clear(&user).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/wishlist/{product_id}/move-to-cart
pub async fn move_to_cart(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(product_id): Path<ProductId>,
) -> Result<Json<Cart>> {
    let cart = WishlistService::new(state.storage())
        .move_to_cart(&user, &product_id)
        .await?;
    Ok(Json(cart))
}
