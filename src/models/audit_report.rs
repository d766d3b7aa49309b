//! Audit report models.
//!
//! This module contains the [`AuditReport`] type and the structures that make
//! up a worker's compliance report: the payout summary, the termination
//! justification chain, the review snapshot, the explanation trail and any
//! data-quality warnings.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{AppealWindow, TerminationLogEntry, Worker};

/// Warning code for records that break an application-level invariant.
pub const INCONSISTENT_RECORD: &str = "INCONSISTENT_RECORD";

/// A non-compliant order surfaced by the audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderFinding {
    /// The order identifier.
    pub order_id: String,
    /// When the order was completed.
    pub order_date: DateTime<Utc>,
    /// The amount actually paid.
    pub payout_amount: Decimal,
    /// The recorded reduction reason, if one was given.
    pub reduction_reason: Option<String>,
    /// Platform flags on the order.
    pub flags: Option<String>,
}

/// The expected-versus-actual comparison for one order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithheldLine {
    /// The order identifier.
    pub order_id: String,
    /// The nominal payout supplied by the baseline.
    pub expected_payout: Decimal,
    /// The amount actually paid.
    pub actual_payout: Decimal,
    /// `expected - actual`, floored at zero.
    pub withheld: Decimal,
}

/// The withheld amount, computed only when a payout baseline is supplied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithheldSummary {
    /// Which baseline produced the expected figures.
    pub baseline: String,
    /// Sum of the per-order withheld amounts.
    pub total_withheld: Decimal,
    /// Per-order comparisons for the orders the baseline could price.
    pub lines: Vec<WithheldLine>,
    /// Orders the baseline had no figure for.
    pub unpriced_order_ids: Vec<String>,
    /// True when every order was priced.
    pub complete: bool,
}

/// Payout compliance summary for a worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayoutSummary {
    /// Number of orders on record.
    pub total_orders: usize,
    /// Orders marked payment-compliant.
    pub compliant_orders: usize,
    /// Orders marked non-compliant.
    pub non_compliant_orders: usize,
    /// Sum of all payouts.
    pub total_payout: Decimal,
    /// Sum of payouts on compliant orders.
    pub compliant_payout: Decimal,
    /// Sum of payouts on non-compliant orders.
    pub non_compliant_payout: Decimal,
    /// The non-compliant orders with their stated reasons, oldest first.
    pub non_compliant: Vec<OrderFinding>,
    /// The withheld amount; `None` when no payout baseline was supplied.
    pub withheld: Option<WithheldSummary>,
}

/// The termination part of a report, present only for terminated workers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminationSection {
    /// When the termination took effect.
    pub terminated_at: Option<DateTime<Utc>>,
    /// Platform reason code.
    pub reason_code: Option<String>,
    /// Human-readable reason.
    pub reason_text: Option<String>,
    /// Log entries supporting the decision, in chronological order.
    pub justification_chain: Vec<TerminationLogEntry>,
    /// Highest severity in the chain.
    pub max_severity: Option<i64>,
    /// Whether an appeal is currently permitted.
    pub appeal: AppealWindow,
}

/// The review counts as stored, with the recomputed total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewSnapshot {
    /// Number of 5★ reviews.
    pub count_5: i64,
    /// Number of 4★ reviews.
    pub count_4: i64,
    /// Number of 3★ reviews.
    pub count_3: i64,
    /// Number of 2★ reviews.
    pub count_2: i64,
    /// Number of 1★ reviews.
    pub count_1: i64,
    /// The total as stored.
    pub stored_total: i64,
    /// The sum of the five counts, absent when it overflows.
    pub computed_total: Option<i64>,
    /// True when the stored total equals the computed one.
    pub consistent: bool,
}

/// A single step in the explanation trail.
///
/// Each step captures the input, output, and reasoning for one audit rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStep {
    /// The sequential step number.
    pub step_number: u32,
    /// The unique identifier of the rule that was applied.
    pub rule_id: String,
    /// The human-readable name of the rule.
    pub rule_name: String,
    /// The input data for this step.
    pub input: serde_json::Value,
    /// The output data from this step.
    pub output: serde_json::Value,
    /// Human-readable explanation of the decision.
    pub reasoning: String,
}

/// How serious a data-quality warning is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningSeverity {
    /// Cosmetic or cached-value drift.
    Low,
    /// Missing supporting data.
    Medium,
    /// Missing justification for a decision that affected the worker.
    High,
}

/// A data-quality problem found while auditing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataQualityWarning {
    /// A code identifying the type of warning.
    pub code: String,
    /// Which record the warning is about.
    pub record: String,
    /// A human-readable description.
    pub message: String,
    /// How serious the problem is.
    pub severity: WarningSeverity,
}

impl DataQualityWarning {
    /// An [`INCONSISTENT_RECORD`] warning.
    pub fn inconsistent_record(
        record: impl Into<String>,
        message: impl Into<String>,
        severity: WarningSeverity,
    ) -> Self {
        Self {
            code: INCONSISTENT_RECORD.to_string(),
            record: record.into(),
            message: message.into(),
            severity,
        }
    }
}

/// The complete audit report for one worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditReport {
    /// The version of the engine that produced the report.
    pub engine_version: String,
    /// The instant the report was evaluated at.
    pub evaluated_at: DateTime<Utc>,
    /// The worker's identity record.
    pub worker: Worker,
    /// Payout compliance summary.
    pub payout: PayoutSummary,
    /// Termination justification; `None` unless the worker is terminated.
    pub termination: Option<TerminationSection>,
    /// Review snapshot; `None` when no review row exists.
    pub reviews: Option<ReviewSnapshot>,
    /// The ordered explanation trail.
    pub explanation: Vec<AuditStep>,
    /// Data-quality warnings.
    pub warnings: Vec<DataQualityWarning>,
}

impl AuditReport {
    /// Returns true if any warning with `code` was raised.
    pub fn has_warning(&self, code: &str) -> bool {
        self.warnings.iter().any(|warning| warning.code == code)
    }

    /// Returns the warnings raised about `record`.
    pub fn warnings_for<'a>(&'a self, record: &'a str) -> impl Iterator<Item = &'a DataQualityWarning> {
        self.warnings.iter().filter(move |warning| warning.record == record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inconsistent_record_warning_uses_code() {
        let warning = DataQualityWarning::inconsistent_record(
            "order O2",
            "missing reason",
            WarningSeverity::High,
        );
        assert_eq!(warning.code, INCONSISTENT_RECORD);
        assert_eq!(warning.severity, WarningSeverity::High);
    }

    #[test]
    fn test_warning_severity_orders_low_to_high() {
        assert!(WarningSeverity::Low < WarningSeverity::Medium);
        assert!(WarningSeverity::Medium < WarningSeverity::High);
        assert_eq!(
            serde_json::to_string(&WarningSeverity::Medium).unwrap(),
            "\"medium\""
        );
    }

    #[test]
    fn test_withheld_line_serializes_decimals_as_strings() {
        let line = WithheldLine {
            order_id: "O2".to_string(),
            expected_payout: Decimal::new(10000, 2),
            actual_payout: Decimal::new(8000, 2),
            withheld: Decimal::new(2000, 2),
        };
        let json = serde_json::to_value(&line).unwrap();
        assert_eq!(json["withheld"], "20.00");
    }
}
