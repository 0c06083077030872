//! Simulated payment processing.
//!
//! No gateway is contacted. Cash on delivery records a successful payment
//! while the order's payment status stays `PENDING`; every other method
//! "charges" immediately and confirms the order.

use chrono::Utc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use bazaar_core::{OrderPaymentStatus, OrderStatus, PaymentId, PaymentMethod, PaymentStatus};

use super::ServiceError;
use crate::models::payment::CURRENCY;
use crate::models::{Order, Payment};
use crate::store::IdentityStore;

/// Last four digits reported for simulated card payments.
pub const SIMULATED_CARD_LAST4: &str = "4242";
/// Brand reported for simulated card payments.
pub const SIMULATED_CARD_BRAND: &str = "VISA";

/// Payment processor stand-in.
#[derive(Debug, Clone, Copy, Default)]
pub struct PaymentSimulator;

impl PaymentSimulator {
    /// Take payment for `order` and record the result on it.
    ///
    /// The payment and the updated order are both written through `store`.
    /// Unknown methods fall back to cash on delivery.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::InvalidState` if a prepaid order cannot be
    /// confirmed, or `ServiceError::Repository` if storage fails.
    #[instrument(skip(self, store, order), fields(order_id = %order.id))]
    pub async fn process(
        &self,
        store: &dyn IdentityStore,
        order: &mut Order,
        requested_method: &str,
    ) -> Result<Payment, ServiceError> {
        let (method, fell_back) = PaymentMethod::parse_lenient(requested_method);
        if fell_back {
            warn!(
                requested = requested_method,
                "Unknown payment method, falling back to cash on delivery"
            );
        }

        let id: PaymentId = store.kind().mint_id("payment");
        let mut payment = Payment {
            id,
            order_id: order.id.clone(),
            user_id: order.user_id.clone(),
            amount: order.total_amount,
            currency: CURRENCY.to_owned(),
            method,
            status: PaymentStatus::Initiated,
            transaction_id: None,
            card_last4: None,
            card_brand: None,
            created_at: Utc::now(),
            completed_at: None,
        };
        store.save_payment(&payment).await?;

        let now = Utc::now();
        payment.status = PaymentStatus::Success;
        payment.completed_at = Some(now);

        if !method.is_cash_on_delivery() {
            payment.transaction_id = Some(transaction_id());
            if method.is_card() {
                payment.card_last4 = Some(SIMULATED_CARD_LAST4.to_owned());
                payment.card_brand = Some(SIMULATED_CARD_BRAND.to_owned());
            }
            order.payment_status = OrderPaymentStatus::Completed;
            order.transition_to(OrderStatus::Confirmed, now)?;
        }
        order.payment_id = Some(payment.id.clone());
        order.updated_at = now;

        store.save_payment(&payment).await?;
        store.save_order(order).await?;

        info!(
            payment_id = %payment.id,
            method = ?method,
            amount = %payment.amount,
            "Payment processed"
        );
        Ok(payment)
    }
}

/// `TXN` followed by 12 upper-case hex characters.
fn transaction_id() -> String {
    let hex: String = Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(12)
        .map(|c| c.to_ascii_uppercase())
        .collect();
    format!("TXN{hex}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_id_shape() {
        let id = transaction_id();
        assert_eq!(id.len(), 15);
        assert!(id.starts_with("TXN"));
        assert!(
            id[3..]
                .chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase())
        );
    }
}
