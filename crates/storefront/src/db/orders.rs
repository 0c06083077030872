//! Order queries. Line items and shipping address are stored as JSONB.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;

use bazaar_core::{Money, OrderId, OrderPaymentStatus, OrderStatus, PaymentId, UserId};

use super::{RepositoryError, conflict_on_unique};
use crate::models::{Order, OrderItem, ShippingAddress};
use crate::store::{Page, PageRequest};

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    order_number: String,
    user_id: UserId,
    user_name: String,
    user_email: String,
    items: Json<Vec<OrderItem>>,
    shipping_address: Json<ShippingAddress>,
    subtotal: Money,
    shipping_cost: Money,
    tax: Money,
    total_amount: Money,
    status: OrderStatus,
    payment_status: OrderPaymentStatus,
    payment_method: String,
    payment_id: Option<PaymentId>,
    tracking_number: Option<String>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    shipped_at: Option<DateTime<Utc>>,
    delivered_at: Option<DateTime<Utc>>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Self {
            id: row.id,
            order_number: row.order_number,
            user_id: row.user_id,
            user_name: row.user_name,
            user_email: row.user_email,
            items: row.items.0,
            shipping_address: row.shipping_address.0,
            subtotal: row.subtotal,
            shipping_cost: row.shipping_cost,
            tax: row.tax,
            total_amount: row.total_amount,
            status: row.status,
            payment_status: row.payment_status,
            payment_method: row.payment_method,
            payment_id: row.payment_id,
            tracking_number: row.tracking_number,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
            shipped_at: row.shipped_at,
            delivered_at: row.delivered_at,
        }
    }
}

const SELECT_ORDER: &str = r"
    SELECT id, order_number, user_id, user_name, user_email, items, shipping_address,
           subtotal, shipping_cost, tax, total_amount, status, payment_status,
           payment_method, payment_id, tracking_number, notes,
           created_at, updated_at, shipped_at, delivered_at
    FROM bazaar.orders
";

/// Get an order by ID.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn get(pool: &PgPool, id: &OrderId) -> Result<Option<Order>, RepositoryError> {
    let row = sqlx::query_as::<_, OrderRow>(&format!("{SELECT_ORDER} WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(Order::from))
}

/// Insert or overwrite an order.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if the order number is taken.
/// Returns `RepositoryError::Database` for other database errors.
pub async fn upsert(pool: &PgPool, order: &Order) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        INSERT INTO bazaar.orders (
            id, order_number, user_id, user_name, user_email, items, shipping_address,
            subtotal, shipping_cost, tax, total_amount, status, payment_status,
            payment_method, payment_id, tracking_number, notes,
            created_at, updated_at, shipped_at, delivered_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
                $17, $18, $19, $20, $21)
        ON CONFLICT (id) DO UPDATE SET
            status = EXCLUDED.status,
            payment_status = EXCLUDED.payment_status,
            payment_id = EXCLUDED.payment_id,
            tracking_number = EXCLUDED.tracking_number,
            notes = EXCLUDED.notes,
            updated_at = EXCLUDED.updated_at,
            shipped_at = EXCLUDED.shipped_at,
            delivered_at = EXCLUDED.delivered_at
        ",
    )
    .bind(&order.id)
    .bind(&order.order_number)
    .bind(&order.user_id)
    .bind(&order.user_name)
    .bind(&order.user_email)
    .bind(Json(&order.items))
    .bind(Json(&order.shipping_address))
    .bind(order.subtotal)
    .bind(order.shipping_cost)
    .bind(order.tax)
    .bind(order.total_amount)
    .bind(order.status)
    .bind(order.payment_status)
    .bind(&order.payment_method)
    .bind(&order.payment_id)
    .bind(&order.tracking_number)
    .bind(&order.notes)
    .bind(order.created_at)
    .bind(order.updated_at)
    .bind(order.shipped_at)
    .bind(order.delivered_at)
    .execute(pool)
    .await
    .map_err(|e| conflict_on_unique(e, "order number already exists"))?;

    Ok(())
}

/// A user's orders, newest first, optionally filtered by status.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn list_for_user(
    pool: &PgPool,
    user_id: &UserId,
    status: Option<OrderStatus>,
) -> Result<Vec<Order>, RepositoryError> {
    let rows = sqlx::query_as::<_, OrderRow>(&format!(
        "{SELECT_ORDER} WHERE user_id = $1 AND ($2::order_status IS NULL OR status = $2) \
         ORDER BY created_at DESC"
    ))
    .bind(user_id)
    .bind(status)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(Order::from).collect())
}

/// One page of all orders, newest first, optionally filtered by status.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn list_all(
    pool: &PgPool,
    status: Option<OrderStatus>,
    page: PageRequest,
) -> Result<Page<Order>, RepositoryError> {
    let total: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM bazaar.orders WHERE ($1::order_status IS NULL OR status = $1)",
    )
    .bind(status)
    .fetch_one(pool)
    .await?;

    let rows = sqlx::query_as::<_, OrderRow>(&format!(
        "{SELECT_ORDER} WHERE ($1::order_status IS NULL OR status = $1) \
         ORDER BY created_at DESC LIMIT $2 OFFSET $3"
    ))
    .bind(status)
    .bind(i64::from(page.size))
    .bind(i64::try_from(page.offset()).unwrap_or(i64::MAX))
    .fetch_all(pool)
    .await?;

    Ok(Page {
        items: rows.into_iter().map(Order::from).collect(),
        page: page.page,
        size: page.size,
        total: u64::try_from(total).unwrap_or_default(),
    })
}
