//! Payout compliance summary.
//!
//! Partitions a worker's orders by their recorded `payment_compliant` flag,
//! surfaces the stated reduction reason of each non-compliant order and,
//! when a payout baseline is supplied, the amount withheld against it.

use rust_decimal::Decimal;
use serde_json::json;

use crate::error::AuditError;
use crate::models::{
    AuditStep, DataQualityWarning, Order, OrderFinding, PayoutSummary, WarningSeverity,
    WithheldLine, WithheldSummary,
};

use super::PayoutBaseline;

/// The result of summarising payouts, including audit steps and warnings.
#[derive(Debug, Clone)]
pub struct PayoutComplianceResult {
    /// The payout summary section of the report.
    pub summary: PayoutSummary,
    /// The partition step, followed by the withheld-amount step when a
    /// baseline was supplied.
    pub audit_steps: Vec<AuditStep>,
    /// One warning per non-compliant order without a reduction reason.
    pub warnings: Vec<DataQualityWarning>,
}

/// Summarises payout compliance across `orders`.
///
/// Non-compliant orders are listed oldest first. A non-compliant order with
/// no reduction reason is still counted, and is also reported as an
/// inconsistent record.
///
/// # Examples
///
/// ```
/// use gig_audit::audit::summarize_payouts;
///
/// let result = summarize_payouts(&[], None, 1);
/// assert_eq!(result.summary.total_orders, 0);
/// assert_eq!(result.summary.compliant_orders, 0);
/// assert!(result.summary.withheld.is_none());
/// ```
pub fn summarize_payouts(
    orders: &[Order],
    baseline: Option<&dyn PayoutBaseline>,
    step_number: u32,
) -> PayoutComplianceResult {
    let mut chronological: Vec<&Order> = orders.iter().collect();
    chronological.sort_by(|a, b| {
        a.order_date
            .cmp(&b.order_date)
            .then_with(|| a.order_id.cmp(&b.order_id))
    });

    let mut compliant_payout = Decimal::ZERO;
    let mut non_compliant_payout = Decimal::ZERO;
    let mut non_compliant = Vec::new();
    let mut warnings = Vec::new();

    for order in &chronological {
        if order.payment_compliant {
            compliant_payout += order.payout_amount;
            continue;
        }
        non_compliant_payout += order.payout_amount;
        non_compliant.push(OrderFinding {
            order_id: order.order_id.clone(),
            order_date: order.order_date,
            payout_amount: order.payout_amount,
            reduction_reason: order.stated_reduction_reason().map(str::to_string),
            flags: order.flags.clone(),
        });
        if let Err(AuditError::InconsistentRecord { record, message }) =
            order.check_reduction_reason()
        {
            warnings.push(DataQualityWarning::inconsistent_record(
                record,
                message,
                WarningSeverity::High,
            ));
        }
    }

    let compliant_orders = orders.len() - non_compliant.len();
    let mut audit_steps = vec![AuditStep {
        step_number,
        rule_id: "payout_compliance".to_string(),
        rule_name: "Payout Compliance Partition".to_string(),
        input: json!({ "orders": orders.len() }),
        output: json!({
            "compliant_orders": compliant_orders,
            "non_compliant_orders": non_compliant.len(),
            "compliant_payout": compliant_payout,
            "non_compliant_payout": non_compliant_payout,
            "missing_reasons": warnings.len(),
        }),
        reasoning: partition_reasoning(orders.len(), &non_compliant),
    }];

    let withheld = baseline.map(|baseline| {
        let withheld = withheld_against(&chronological, baseline);
        audit_steps.push(withheld_step(step_number + 1, &withheld));
        withheld
    });

    PayoutComplianceResult {
        summary: PayoutSummary {
            total_orders: orders.len(),
            compliant_orders,
            non_compliant_orders: non_compliant.len(),
            total_payout: compliant_payout + non_compliant_payout,
            compliant_payout,
            non_compliant_payout,
            non_compliant,
            withheld,
        },
        audit_steps,
        warnings,
    }
}

/// `withheld = max(expected - actual, 0)` for every order the baseline can
/// price.
fn withheld_against(orders: &[&Order], baseline: &dyn PayoutBaseline) -> WithheldSummary {
    let mut lines = Vec::new();
    let mut unpriced_order_ids = Vec::new();

    for order in orders {
        match baseline.expected_payout(order) {
            Some(expected) => lines.push(WithheldLine {
                order_id: order.order_id.clone(),
                expected_payout: expected,
                actual_payout: order.payout_amount,
                withheld: (expected - order.payout_amount).max(Decimal::ZERO),
            }),
            None => unpriced_order_ids.push(order.order_id.clone()),
        }
    }

    WithheldSummary {
        baseline: baseline.name().to_string(),
        total_withheld: lines.iter().map(|line| line.withheld).sum(),
        complete: unpriced_order_ids.is_empty(),
        lines,
        unpriced_order_ids,
    }
}

fn partition_reasoning(total: usize, non_compliant: &[OrderFinding]) -> String {
    if total == 0 {
        return "No orders recorded; nothing to partition".to_string();
    }
    if non_compliant.is_empty() {
        return format!("All {} orders recorded as payment-compliant", total);
    }
    let reasons: Vec<String> = non_compliant
        .iter()
        .map(|finding| {
            format!(
                "{} ({})",
                finding.order_id,
                finding.reduction_reason.as_deref().unwrap_or("no reason recorded")
            )
        })
        .collect();
    format!(
        "{} of {} orders recorded as non-compliant: {}",
        non_compliant.len(),
        total,
        reasons.join(", ")
    )
}

fn withheld_step(step_number: u32, withheld: &WithheldSummary) -> AuditStep {
    let reasoning = if withheld.complete {
        format!(
            "Compared {} orders against {}; {} withheld",
            withheld.lines.len(),
            withheld.baseline,
            withheld.total_withheld
        )
    } else {
        format!(
            "Compared {} orders against {}; {} withheld on priced orders, {} order(s) could not be priced",
            withheld.lines.len(),
            withheld.baseline,
            withheld.total_withheld,
            withheld.unpriced_order_ids.len()
        )
    };

    AuditStep {
        step_number,
        rule_id: "withheld_amount".to_string(),
        rule_name: "Withheld Amount Against Baseline".to_string(),
        input: json!({
            "baseline": withheld.baseline,
            "priced_orders": withheld.lines.len(),
            "unpriced_orders": withheld.unpriced_order_ids,
        }),
        output: json!({
            "total_withheld": withheld.total_withheld,
            "complete": withheld.complete,
        }),
        reasoning,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::ExpectedPayouts;
    use chrono::{TimeZone, Utc};
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn create_test_order(id: &str, day: u32, payout: &str, compliant: bool, reason: Option<&str>) -> Order {
        Order {
            order_id: id.to_string(),
            worker_id: "W1".to_string(),
            order_date: Utc.with_ymd_and_hms(2025, 1, day, 12, 0, 0).unwrap(),
            distance_km: None,
            duration_min: None,
            payout_amount: dec(payout),
            status: None,
            flags: None,
            payment_compliant: compliant,
            reduction_reason: reason.map(str::to_string),
        }
    }

    fn w1_orders() -> Vec<Order> {
        vec![
            create_test_order("O2", 3, "80", false, Some("late delivery")),
            create_test_order("O1", 2, "100", true, None),
        ]
    }

    #[test]
    fn test_zero_orders_give_empty_summary() {
        let result = summarize_payouts(&[], None, 1);
        assert_eq!(result.summary.total_orders, 0);
        assert_eq!(result.summary.compliant_orders, 0);
        assert_eq!(result.summary.non_compliant_orders, 0);
        assert_eq!(result.summary.total_payout, Decimal::ZERO);
        assert!(result.warnings.is_empty());
        assert_eq!(result.audit_steps.len(), 1);
    }

    #[test]
    fn test_partition_surfaces_reduction_reason() {
        let result = summarize_payouts(&w1_orders(), None, 1);
        let summary = &result.summary;

        assert_eq!(summary.compliant_orders, 1);
        assert_eq!(summary.non_compliant_orders, 1);
        assert_eq!(summary.total_payout, dec("180"));
        assert_eq!(summary.compliant_payout, dec("100"));
        assert_eq!(summary.non_compliant_payout, dec("80"));
        assert_eq!(
            summary.non_compliant[0].reduction_reason.as_deref(),
            Some("late delivery")
        );
        assert!(summary.withheld.is_none());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_missing_reason_is_flagged_not_dropped() {
        let orders = vec![create_test_order("O3", 4, "50", false, None)];
        let result = summarize_payouts(&orders, None, 1);

        assert_eq!(result.summary.non_compliant_orders, 1);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].record, "order O3");
        assert_eq!(result.warnings[0].severity, WarningSeverity::High);
        assert!(result.audit_steps[0].reasoning.contains("no reason recorded"));
    }

    #[test]
    fn test_non_compliant_listed_oldest_first() {
        let orders = vec![
            create_test_order("O9", 9, "10", false, Some("b")),
            create_test_order("O5", 5, "10", false, Some("a")),
        ];
        let result = summarize_payouts(&orders, None, 1);
        let ids: Vec<&str> = result
            .summary
            .non_compliant
            .iter()
            .map(|finding| finding.order_id.as_str())
            .collect();
        assert_eq!(ids, vec!["O5", "O9"]);
    }

    #[test]
    fn test_withheld_amount_against_expected_payouts() {
        let baseline = ExpectedPayouts::from_iter([
            ("O1".to_string(), dec("95")),
            ("O2".to_string(), dec("100")),
        ]);
        let result = summarize_payouts(&w1_orders(), Some(&baseline), 4);

        let withheld = result.summary.withheld.unwrap();
        // O1 was paid above its expected amount and contributes nothing.
        assert_eq!(withheld.total_withheld, dec("20"));
        assert!(withheld.complete);
        assert_eq!(result.audit_steps.len(), 2);
        assert_eq!(result.audit_steps[1].step_number, 5);
        assert_eq!(result.audit_steps[1].rule_id, "withheld_amount");
    }

    #[test]
    fn test_unpriced_orders_make_withheld_partial() {
        let baseline = ExpectedPayouts::from_iter([("O2".to_string(), dec("100"))]);
        let result = summarize_payouts(&w1_orders(), Some(&baseline), 1);

        let withheld = result.summary.withheld.unwrap();
        assert!(!withheld.complete);
        assert_eq!(withheld.unpriced_order_ids, vec!["O1".to_string()]);
        assert_eq!(withheld.total_withheld, dec("20"));
    }
}
