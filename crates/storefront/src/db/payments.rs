//! Payment queries.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use bazaar_core::{Money, OrderId, PaymentId, PaymentMethod, PaymentStatus, UserId};

use super::RepositoryError;
use crate::models::Payment;

#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    id: PaymentId,
    order_id: OrderId,
    user_id: UserId,
    amount: Money,
    currency: String,
    method: PaymentMethod,
    status: PaymentStatus,
    transaction_id: Option<String>,
    card_last4: Option<String>,
    card_brand: Option<String>,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl From<PaymentRow> for Payment {
    fn from(row: PaymentRow) -> Self {
        Self {
            id: row.id,
            order_id: row.order_id,
            user_id: row.user_id,
            amount: row.amount,
            currency: row.currency,
            method: row.method,
            status: row.status,
            transaction_id: row.transaction_id,
            card_last4: row.card_last4,
            card_brand: row.card_brand,
            created_at: row.created_at,
            completed_at: row.completed_at,
        }
    }
}

/// Get a payment by ID.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn get(pool: &PgPool, id: &PaymentId) -> Result<Option<Payment>, RepositoryError> {
    let row = sqlx::query_as::<_, PaymentRow>(
        r"
        SELECT id, order_id, user_id, amount, currency, method, status,
               transaction_id, card_last4, card_brand, created_at, completed_at
        FROM bazaar.payments
        WHERE id = $1
        ",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(Payment::from))
}

/// Insert or overwrite a payment.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the write fails.
pub async fn upsert(pool: &PgPool, payment: &Payment) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        INSERT INTO bazaar.payments (
            id, order_id, user_id, amount, currency, method, status,
            transaction_id, card_last4, card_brand, created_at, completed_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        ON CONFLICT (id) DO UPDATE SET
            status = EXCLUDED.status,
            transaction_id = EXCLUDED.transaction_id,
            card_last4 = EXCLUDED.card_last4,
            card_brand = EXCLUDED.card_brand,
            completed_at = EXCLUDED.completed_at
        ",
    )
    .bind(&payment.id)
    .bind(&payment.order_id)
    .bind(&payment.user_id)
    .bind(payment.amount)
    .bind(&payment.currency)
    .bind(payment.method)
    .bind(payment.status)
    .bind(&payment.transaction_id)
    .bind(&payment.card_last4)
    .bind(&payment.card_brand)
    .bind(payment.created_at)
    .bind(payment.completed_at)
    .execute(pool)
    .await?;

    Ok(())
}
