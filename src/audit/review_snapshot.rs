//! Review count snapshot.

use serde_json::json;

use crate::error::AuditError;
use crate::models::{AuditStep, DataQualityWarning, ReviewCounts, ReviewSnapshot, WarningSeverity};

/// The result of taking the review snapshot.
#[derive(Debug, Clone)]
pub struct ReviewSnapshotResult {
    /// The snapshot, or `None` when the worker has no review row.
    pub snapshot: Option<ReviewSnapshot>,
    /// The audit step recording this check.
    pub audit_step: AuditStep,
    /// A warning when the stored total drifts from the star counts.
    pub warnings: Vec<DataQualityWarning>,
}

/// Reports the stored review counts and checks `total_reviews` against the
/// sum of the five star counts.
pub fn snapshot_reviews(counts: Option<&ReviewCounts>, step_number: u32) -> ReviewSnapshotResult {
    let Some(counts) = counts else {
        return ReviewSnapshotResult {
            snapshot: None,
            audit_step: AuditStep {
                step_number,
                rule_id: "review_snapshot".to_string(),
                rule_name: "Review Count Snapshot".to_string(),
                input: json!({ "review_row": false }),
                output: json!({}),
                reasoning: "No review counts recorded".to_string(),
            },
            warnings: Vec::new(),
        };
    };

    let computed_total = counts.computed_total();
    let mut warnings = Vec::new();
    if let Err(AuditError::InconsistentRecord { record, message }) = counts.check_total() {
        let severity = if computed_total.is_some() {
            WarningSeverity::Medium
        } else {
            WarningSeverity::High
        };
        warnings.push(DataQualityWarning::inconsistent_record(record, message, severity));
    }
    let consistent = warnings.is_empty();

    let reasoning = match computed_total {
        Some(total) if consistent => {
            format!("{} reviews; stored total matches the star counts", total)
        }
        Some(total) => format!(
            "Stored total {} does not match the {} reviews counted by star",
            counts.total_reviews, total
        ),
        None => format!(
            "Stored total {} cannot be checked: the star counts overflow",
            counts.total_reviews
        ),
    };

    ReviewSnapshotResult {
        snapshot: Some(ReviewSnapshot {
            count_5: counts.count_5,
            count_4: counts.count_4,
            count_3: counts.count_3,
            count_2: counts.count_2,
            count_1: counts.count_1,
            stored_total: counts.total_reviews,
            computed_total,
            consistent,
        }),
        audit_step: AuditStep {
            step_number,
            rule_id: "review_snapshot".to_string(),
            rule_name: "Review Count Snapshot".to_string(),
            input: json!({
                "counts": [counts.count_5, counts.count_4, counts.count_3, counts.count_2, counts.count_1],
                "total_reviews": counts.total_reviews,
            }),
            output: json!({
                "computed_total": computed_total,
                "consistent": consistent,
            }),
            reasoning,
        },
        warnings,
    }
}
