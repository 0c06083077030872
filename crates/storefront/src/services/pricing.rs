//! Checkout pricing rules.
//!
//! Shipping is free at or above the threshold; tax is a flat rate on the
//! subtotal, rounded half-up to two decimals.

use rust_decimal::Decimal;
use serde::Serialize;

use bazaar_core::Money;

/// Default tax rate (18%).
pub const DEFAULT_TAX_RATE: Decimal = Decimal::from_parts(18, 0, 0, false, 2);
/// Default subtotal at which shipping becomes free.
pub const DEFAULT_FREE_SHIPPING_THRESHOLD: Money =
    Money::new(Decimal::from_parts(50_000, 0, 0, false, 2));
/// Default flat shipping fee.
pub const DEFAULT_SHIPPING_FEE: Money = Money::new(Decimal::from_parts(5_000, 0, 0, false, 2));

/// Tunable checkout constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckoutPricing {
    pub tax_rate: Decimal,
    pub free_shipping_threshold: Money,
    pub shipping_fee: Money,
}

impl Default for CheckoutPricing {
    fn default() -> Self {
        Self {
            tax_rate: DEFAULT_TAX_RATE,
            free_shipping_threshold: DEFAULT_FREE_SHIPPING_THRESHOLD,
            shipping_fee: DEFAULT_SHIPPING_FEE,
        }
    }
}

/// Money breakdown of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderTotals {
    pub subtotal: Money,
    pub shipping_cost: Money,
    pub tax: Money,
    pub total: Money,
}

impl CheckoutPricing {
    /// Shipping for a subtotal.
    #[must_use]
    pub fn shipping_for(&self, subtotal: Money) -> Money {
        if subtotal >= self.free_shipping_threshold {
            Money::ZERO
        } else {
            self.shipping_fee
        }
    }

    /// Tax for a subtotal, rounded half-up to cents.
    #[must_use]
    pub fn tax_for(&self, subtotal: Money) -> Money {
        subtotal.scaled_by(self.tax_rate).round_half_up(2)
    }

    /// Full breakdown for a subtotal.
    #[must_use]
    pub fn quote(&self, subtotal: Money) -> OrderTotals {
        let shipping_cost = self.shipping_for(subtotal);
        let tax = self.tax_for(subtotal);
        OrderTotals {
            subtotal,
            shipping_cost,
            tax,
            total: subtotal + shipping_cost + tax,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn money(s: &str) -> Money {
        s.parse().unwrap()
    }

    #[test]
    fn test_defaults() {
        let pricing = CheckoutPricing::default();
        assert_eq!(pricing.tax_rate.to_string(), "0.18");
        assert_eq!(pricing.free_shipping_threshold, money("500.00"));
        assert_eq!(pricing.shipping_fee, money("50.00"));
    }

    #[test]
    fn test_quote_above_threshold() {
        let totals = CheckoutPricing::default().quote(money("1998.00"));
        assert_eq!(totals.shipping_cost, Money::ZERO);
        assert_eq!(totals.tax, money("359.64"));
        assert_eq!(totals.total, money("2357.64"));
    }

    #[test]
    fn test_quote_below_threshold() {
        let totals = CheckoutPricing::default().quote(money("100.00"));
        assert_eq!(totals.shipping_cost, money("50.00"));
        assert_eq!(totals.tax, money("18.00"));
        assert_eq!(totals.total, money("168.00"));
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let pricing = CheckoutPricing::default();
        assert_eq!(pricing.shipping_for(money("500.00")), Money::ZERO);
        assert_eq!(pricing.shipping_for(money("499.99")), money("50.00"));
    }

    #[test]
    fn test_tax_rounds_half_up() {
        // 0.25 * 0.18 = 0.045
        assert_eq!(CheckoutPricing::default().tax_for(money("0.25")), money("0.05"));
    }

    proptest! {
        #[test]
        fn prop_total_is_sum_of_parts(cents in 0i64..100_000_000) {
            let totals = CheckoutPricing::default().quote(Money::from_minor(cents));
            prop_assert_eq!(totals.total, totals.subtotal + totals.shipping_cost + totals.tax);
            prop_assert!(totals.tax.amount().scale() <= 2);
        }
    }
}
