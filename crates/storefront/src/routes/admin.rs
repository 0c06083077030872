//! Admin handlers for orders and user accounts.
//!
//! Every handler requires the `ADMIN` role; the service layer enforces it.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use bazaar_core::{OrderId, UserId};

use crate::error::Result;
use crate::middleware::RequireUser;
use crate::models::{Order, User};
use crate::services::{OrderService, UserService};
use crate::store::{DEFAULT_PAGE_SIZE, Page, PageRequest};
use crate::state::AppState;

use super::orders::OrderFilter;

/// Query string of `GET /api/admin/orders`.
#[derive(Debug, Deserialize)]
pub struct AdminOrderQuery {
    #[serde(default)]
    pub page: u32,
    #[serde(default = "default_size")]
    pub size: u32,
    pub status: Option<String>,
}

const fn default_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

/// Query string of `GET /api/admin/users`.
#[derive(Debug, Deserialize)]
pub struct UserListQuery {
    #[serde(default)]
    pub page: u32,
    #[serde(default = "default_size")]
    pub size: u32,
}

/// Body of `PUT /api/admin/users/{id}/status`.
#[derive(Debug, Deserialize)]
pub struct AccountStatusUpdate {
    pub active: bool,
}

/// Body of `PUT /api/admin/users/{id}/role`.
#[derive(Debug, Deserialize)]
pub struct RoleUpdate {
    pub role: String,
}

/// Body of `PUT /api/admin/orders/{id}/status`.
#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: String,
}

/// Body of `PUT /api/admin/orders/{id}/tracking`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingUpdate {
    pub tracking_number: String,
}

/// GET /api/admin/orders?page=0&size=20&status=PENDING
pub async fn list(
    State(state): State<AppState>,
    RequireUser(admin): RequireUser,
    Query(query): Query<AdminOrderQuery>,
) -> Result<Json<Page<Order>>> {
    let service = OrderService::new(state.storage(), state.pricing());
    let page = PageRequest::new(query.page, query.size);
    let filter = OrderFilter {
        status: query.status,
    };
    let orders = match filter.status()? {
        Some(status) => {
            service
                .list_all_orders_by_status(&admin, status, page)
                .await?
        }
        None => service.list_all_orders(&admin, page).await?,
    };
    Ok(Json(orders))
}

/// GET /api/admin/orders/{id}
pub async fn show(
    State(state): State<AppState>,
    RequireUser(admin): RequireUser,
    Path(order_id): Path<OrderId>,
) -> Result<Json<Order>> {
    let order = OrderService::new(state.storage(), state.pricing())
        .get_order_admin(&admin, &order_id)
        .await?;
    Ok(Json(order))
}

/// PUT /api/admin/orders/{id}/status
pub async fn update_status(
    State(state): State<AppState>,
    RequireUser(admin): RequireUser,
    Path(order_id): Path<OrderId>,
    Json(body): Json<StatusUpdate>,
) -> Result<Json<Order>> {
    let order = OrderService::new(state.storage(), state.pricing())
        .update_status(&admin, &order_id, &body.status)
        .await?;
    Ok(Json(order))
}

/// PUT /api/admin/orders/{id}/tracking
pub async fn update_tracking(
    State(state): State<AppState>,
    RequireUser(admin): RequireUser,
    Path(order_id): Path<OrderId>,
    Json(body): Json<TrackingUpdate>,
) -> Result<Json<Order>> {
    let order = OrderService::new(state.storage(), state.pricing())
        .update_tracking_number(&admin, &order_id, &body.tracking_number)
        .await?;
    Ok(Json(order))
}

/// GET /api/admin/users?page=0&size=20
pub async fn list_users(
    State(state): State<AppState>,
    RequireUser(admin): RequireUser,
    Query(query): Query<UserListQuery>,
) -> Result<Json<Page<User>>> {
    let users = UserService::new(state.storage())
        .list_users(&admin, PageRequest::new(query.page, query.size))
        .await?;
    Ok(Json(users))
}

/// GET /api/admin/users/{id}
pub async fn show_user(
    State(state): State<AppState>,
    RequireUser(admin): RequireUser,
    Path(user_id): Path<UserId>,
) -> Result<Json<User>> {
    let user = UserService::new(state.storage())
        .get_user(&admin, &user_id)
        .await?;
    Ok(Json(user))
}

/// PUT /api/admin/users/{id}/status
pub async fn update_user_status(
    State(state): State<AppState>,
    RequireUser(admin): RequireUser,
    Path(user_id): Path<UserId>,
    Json(body): Json<AccountStatusUpdate>,
) -> Result<Json<User>> {
    let user = UserService::new(state.storage())
        .set_active(&admin, &user_id, body.active)
        .await?;
    Ok(Json(user))
}

/// PUT /api/admin/users/{id}/role
pub async fn update_user_role(
    State(state): State<AppState>,
    RequireUser(admin): RequireUser,
    Path(user_id): Path<UserId>,
    Json(body): Json<RoleUpdate>,
) -> Result<Json<User>> {
    let user = UserService::new(state.storage())
        .set_role(&admin, &user_id, &body.role)
        .await?;
    Ok(Json(user))
}
