//! Order model.
//!
//! One order is recorded per completed delivery. Once its payment
//! compliance has been recorded an order is only changed through an
//! [`OrderCorrection`].

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{AuditError, AuditResult};

fn default_compliant() -> bool {
    true
}

/// A single delivery or task performed by a worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Unique identifier for the order.
    pub order_id: String,
    /// The worker who performed the order.
    pub worker_id: String,
    /// When the order was completed.
    pub order_date: DateTime<Utc>,
    /// Distance travelled in kilometres.
    #[serde(default)]
    pub distance_km: Option<f64>,
    /// Duration of the task in minutes.
    #[serde(default)]
    pub duration_min: Option<i64>,
    /// The amount actually paid out.
    pub payout_amount: Decimal,
    /// Free-text platform status (e.g. "delivered").
    #[serde(default)]
    pub status: Option<String>,
    /// Free-text flags attached by the platform (e.g. "late,customer_complaint").
    #[serde(default)]
    pub flags: Option<String>,
    /// Whether the payout met the expected norm.
    #[serde(default = "default_compliant")]
    pub payment_compliant: bool,
    /// Why the payout was reduced; expected whenever `payment_compliant` is false.
    #[serde(default)]
    pub reduction_reason: Option<String>,
}

impl Order {
    /// Returns the reduction reason if it is present and not blank.
    pub fn stated_reduction_reason(&self) -> Option<&str> {
        self.reduction_reason
            .as_deref()
            .map(str::trim)
            .filter(|reason| !reason.is_empty())
    }

    /// Checks that a non-compliant order carries a reduction reason.
    ///
    /// The store accepts orders that break this rule so the audit can surface
    /// them; this returns the error the audit records as a warning.
    ///
    /// # Examples
    ///
    /// ```
    /// use gig_audit::models::Order;
    /// use chrono::{TimeZone, Utc};
    /// use rust_decimal::Decimal;
    ///
    /// let order = Order {
    ///     order_id: "O2".to_string(),
    ///     worker_id: "W1".to_string(),
    ///     order_date: Utc.with_ymd_and_hms(2025, 1, 2, 12, 0, 0).unwrap(),
    ///     distance_km: None,
    ///     duration_min: None,
    ///     payout_amount: Decimal::new(80, 0),
    ///     status: None,
    ///     flags: None,
    ///     payment_compliant: false,
    ///     reduction_reason: None,
    /// };
    /// assert!(order.check_reduction_reason().is_err());
    /// ```
    pub fn check_reduction_reason(&self) -> AuditResult<()> {
        if !self.payment_compliant && self.stated_reduction_reason().is_none() {
            return Err(AuditError::InconsistentRecord {
                record: format!("order {}", self.order_id),
                message: "non-compliant payout has no reduction reason".to_string(),
            });
        }
        Ok(())
    }

    /// Validates the fields required to store the order.
    pub fn validate(&self) -> AuditResult<()> {
        if self.order_id.trim().is_empty() {
            return Err(AuditError::invalid("order_id", "must not be empty"));
        }
        if self.worker_id.trim().is_empty() {
            return Err(AuditError::invalid("worker_id", "must not be empty"));
        }
        if self.payout_amount.is_sign_negative() {
            return Err(AuditError::invalid("payout_amount", "must not be negative"));
        }
        if self.distance_km.is_some_and(|km| !km.is_finite() || km < 0.0) {
            return Err(AuditError::invalid("distance_km", "must be a non-negative number"));
        }
        if self.duration_min.is_some_and(|min| min < 0) {
            return Err(AuditError::invalid("duration_min", "must not be negative"));
        }
        Ok(())
    }
}

/// A corrective audit update to an order's compliance record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCorrection {
    /// The corrected compliance flag.
    pub payment_compliant: bool,
    /// The corrected reduction reason.
    #[serde(default)]
    pub reduction_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn create_test_order(compliant: bool, reason: Option<&str>) -> Order {
        Order {
            order_id: "O1".to_string(),
            worker_id: "W1".to_string(),
            order_date: Utc.with_ymd_and_hms(2025, 1, 2, 12, 0, 0).unwrap(),
            distance_km: Some(4.2),
            duration_min: Some(35),
            payout_amount: dec("80.00"),
            status: Some("delivered".to_string()),
            flags: None,
            payment_compliant: compliant,
            reduction_reason: reason.map(str::to_string),
        }
    }

    #[test]
    fn test_compliant_order_needs_no_reason() {
        assert!(create_test_order(true, None).check_reduction_reason().is_ok());
    }

    #[test]
    fn test_non_compliant_order_with_reason_is_consistent() {
        let order = create_test_order(false, Some("late delivery"));
        assert!(order.check_reduction_reason().is_ok());
        assert_eq!(order.stated_reduction_reason(), Some("late delivery"));
    }

    #[test]
    fn test_blank_reason_counts_as_missing() {
        let order = create_test_order(false, Some("   "));
        assert_eq!(order.stated_reduction_reason(), None);
        match order.check_reduction_reason() {
            Err(AuditError::InconsistentRecord { record, .. }) => assert_eq!(record, "order O1"),
            other => panic!("Expected InconsistentRecord, got {:?}", other),
        }
    }

    #[test]
    fn test_payment_compliant_defaults_to_true() {
        let json = r#"{
            "order_id": "O9",
            "worker_id": "W1",
            "order_date": "2025-01-02T12:00:00Z",
            "payout_amount": "55.50"
        }"#;

        let order: Order = serde_json::from_str(json).unwrap();
        assert!(order.payment_compliant);
        assert_eq!(order.payout_amount, dec("55.50"));
    }

    #[test]
    fn test_validate_rejects_negative_payout() {
        let mut order = create_test_order(true, None);
        order.payout_amount = dec("-1");
        assert!(matches!(
            order.validate(),
            Err(AuditError::InvalidRecord { field, .. }) if field == "payout_amount"
        ));
    }

    #[test]
    fn test_validate_rejects_negative_distance() {
        let mut order = create_test_order(true, None);
        order.distance_km = Some(-3.0);
        assert!(order.validate().is_err());
    }
}
