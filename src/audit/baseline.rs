//! Nominal payout baselines.
//!
//! The store records only what was actually paid. A withheld amount can be
//! stated only against an expected payout supplied from outside the store,
//! either per order or from an operator-configured rate card.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::{Deserialize, Serialize};

use crate::config::RateCard;
use crate::models::Order;

/// A source of expected (nominal) payouts for orders.
pub trait PayoutBaseline: Send + Sync {
    /// Short name recorded in the report.
    fn name(&self) -> &str;

    /// Returns the expected payout for `order`, or `None` when this baseline
    /// cannot price it.
    fn expected_payout(&self, order: &Order) -> Option<Decimal>;
}

/// Expected payouts given explicitly per order id.
///
/// # Example
///
/// ```
/// use gig_audit::audit::{ExpectedPayouts, PayoutBaseline};
/// use rust_decimal::Decimal;
///
/// let baseline = ExpectedPayouts::from_iter([("O2".to_string(), Decimal::new(100, 0))]);
/// assert_eq!(baseline.name(), "expected_payouts");
/// assert_eq!(baseline.len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpectedPayouts {
    amounts: BTreeMap<String, Decimal>,
}

impl ExpectedPayouts {
    /// Number of orders with an expected payout.
    pub fn len(&self) -> usize {
        self.amounts.len()
    }

    /// Returns true when no order has an expected payout.
    pub fn is_empty(&self) -> bool {
        self.amounts.is_empty()
    }
}

impl FromIterator<(String, Decimal)> for ExpectedPayouts {
    fn from_iter<I: IntoIterator<Item = (String, Decimal)>>(iter: I) -> Self {
        Self {
            amounts: iter.into_iter().collect(),
        }
    }
}

impl PayoutBaseline for ExpectedPayouts {
    fn name(&self) -> &str {
        "expected_payouts"
    }

    fn expected_payout(&self, order: &Order) -> Option<Decimal> {
        self.amounts.get(&order.order_id).copied()
    }
}

impl PayoutBaseline for RateCard {
    fn name(&self) -> &str {
        &self.name
    }

    /// `base_fare + per_km * distance_km + per_minute * duration_min`,
    /// rounded to cents. Orders missing a measurement the card charges for
    /// are not priced.
    fn expected_payout(&self, order: &Order) -> Option<Decimal> {
        let mut expected = self.base_fare;

        if !self.per_km.is_zero() {
            let km = Decimal::from_f64(order.distance_km?)?;
            expected += self.per_km * km;
        }
        if !self.per_minute.is_zero() {
            expected += self.per_minute * Decimal::from(order.duration_min?);
        }

        Some(expected.round_dp(2))
    }
}
