//! Order route handlers for shoppers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;

use bazaar_core::{OrderId, OrderStatus};

use crate::error::{AppError, Result};
use crate::middleware::RequireUser;
use crate::models::Order;
use crate::services::{CheckoutRequest, OrderService, PlacedOrder};
use crate::state::AppState;

/// Query string of `GET /api/orders`.
#[derive(Debug, Default, Deserialize)]
pub struct OrderFilter {
    pub status: Option<String>,
}

impl OrderFilter {
    /// Parse the optional status filter.
    pub(crate) fn status(&self) -> Result<Option<OrderStatus>> {
        self.status
            .as_deref()
            .map(str::parse)
            .transpose()
            .map_err(|err: bazaar_core::ParseStatusError| AppError::BadRequest(err.to_string()))
    }
}

/// POST /api/orders
pub async fn create(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(request): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<PlacedOrder>)> {
    let placed = OrderService::new(state.storage(), state.pricing())
        .create_order(&user, request)
        .await?;
    Ok((StatusCode::CREATED, Json(placed)))
}

/// GET /api/orders?status=SHIPPED
pub async fn list(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Query(filter): Query<OrderFilter>,
) -> Result<Json<Vec<Order>>> {
    let service = OrderService::new(state.storage(), state.pricing());
    let orders = match filter.status()? {
        Some(status) => service.list_orders_by_status(&user, status).await?,
        None => service.list_orders(&user).await?,
    };
    Ok(Json(orders))
}

/// GET /api/orders/{id}
pub async fn show(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(order_id): Path<OrderId>,
) -> Result<Json<Order>> {
    let order = OrderService::new(state.storage(), state.pricing())
        .get_order(&user, &order_id)
        .await?;
    Ok(Json(order))
}

/// POST /api/orders/{id}/cancel
pub async fn cancel(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(order_id): Path<OrderId>,
) -> Result<Json<Order>> {
    let order = OrderService::new(state.storage(), state.pricing())
        .cancel_order(&user, &order_id)
        .await?;
    Ok(Json(order))
}
