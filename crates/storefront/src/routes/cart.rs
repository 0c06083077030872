//! Cart route handlers.
//!
//! Every handler returns the whole cart so clients never recompute totals.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;

use bazaar_core::ProductId;

use crate::error::Result;
use crate::middleware::RequireUser;
use crate::models::Cart;
use crate::services::CartService;
use crate::state::AppState;

/// Body of `POST /api/cart/items`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    pub product_id: ProductId,
    #[serde(default = "one")]
    pub quantity: u32,
}

const fn one() -> u32 {
    1
}

/// Body of `PUT /api/cart/items/{product_id}`.
#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    pub quantity: u32,
}

/// GET /api/cart
pub async fn show(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<Cart>> {
    let cart = CartService::new(state.storage()).get_cart(&user).await?;
    Ok(Json(cart))
}

/// POST /api/cart/items
pub async fn add(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(body): Json<AddItemRequest>,
) -> Result<Json<Cart>> {
    let cart = CartService::new(state.storage())
        .add_item(&user, &body.product_id, body.quantity)
        .await?;
    Ok(Json(cart))
}

/// PUT /api/cart/items/{product_id}
pub async fn update(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(product_id): Path<ProductId>,
    Json(body): Json<UpdateQuantityRequest>,
) -> Result<Json<Cart>> {
    let cart = CartService::new(state.storage())
        .update_quantity(&user, &product_id, body.quantity)
        .await?;
    Ok(Json(cart))
}

/// DELETE /api/cart/items/{product_id}
pub async fn remove(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(product_id): Path<ProductId>,
) -> Result<Json<Cart>> {
    let cart = CartService::new(state.storage())
        .remove_item(&user, &product_id)
        .await?;
    Ok(Json(cart))
}

/// DELETE /api/cart
pub async fn clear(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<StatusCode> {
    CartService::new(state.storage()).clear(&user).await?;
    Ok(StatusCode::NO_CONTENT)
}
