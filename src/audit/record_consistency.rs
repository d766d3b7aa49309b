//! Cross-table consistency checks.
//!
//! These compare rows that the store keeps in separate tables and report
//! disagreements as warnings. They never change the report sections.

use std::collections::HashSet;

use serde_json::json;

use crate::models::{AuditStep, DataQualityWarning, WarningSeverity, WorkerRecords, WorkerStatus};

/// The result of the cross-table checks.
#[derive(Debug, Clone)]
pub struct RecordConsistencyResult {
    /// The audit step recording these checks.
    pub audit_step: AuditStep,
    /// One warning per disagreement found.
    pub warnings: Vec<DataQualityWarning>,
}

/// Checks that the worker's `current_status` agrees with the termination
/// status row (see [`WorkerStatus::agrees_with_termination`]), and that
/// every termination log entry's related order is one of the worker's own
/// orders.
pub fn check_record_consistency(records: &WorkerRecords, step_number: u32) -> RecordConsistencyResult {
    let mut warnings = Vec::new();
    let worker = &records.worker;
    let status_says_terminated = worker.current_status == WorkerStatus::Terminated;

    match &records.termination_status {
        Some(status) if !worker.current_status.agrees_with_termination(status.is_terminated) => {
            warnings.push(DataQualityWarning::inconsistent_record(
                format!("termination_status {}", worker.worker_id),
                format!(
                    "is_terminated is {} but the worker's current status is {}",
                    status.is_terminated, worker.current_status
                ),
                WarningSeverity::Medium,
            ));
        }
        None if status_says_terminated => {
            warnings.push(DataQualityWarning::inconsistent_record(
                format!("worker {}", worker.worker_id),
                "current status is terminated but no termination status is recorded",
                WarningSeverity::Medium,
            ));
        }
        _ => {}
    }

    let own_orders: HashSet<&str> = records
        .orders
        .iter()
        .map(|order| order.order_id.as_str())
        .collect();
    for entry in &records.termination_logs {
        let Some(order_id) = entry.related_order_id.as_deref() else {
            continue;
        };
        if !own_orders.contains(order_id) {
            warnings.push(DataQualityWarning::inconsistent_record(
                format!("termination_log {}", entry.log_id),
                format!("related order {} is not one of this worker's orders", order_id),
                WarningSeverity::Medium,
            ));
        }
    }

    let reasoning = if warnings.is_empty() {
        "Worker status, termination status and log references agree".to_string()
    } else {
        format!("{} cross-table disagreement(s) found", warnings.len())
    };

    RecordConsistencyResult {
        audit_step: AuditStep {
            step_number,
            rule_id: "record_consistency".to_string(),
            rule_name: "Cross-Table Consistency".to_string(),
            input: json!({
                "current_status": worker.current_status,
                "is_terminated": records.termination_status.as_ref().map(|s| s.is_terminated),
                "log_entries": records.termination_logs.len(),
            }),
            output: json!({ "disagreements": warnings.len() }),
            reasoning,
        },
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TerminationLogEntry, TerminationStatus, Worker};
    use chrono::{TimeZone, Utc};

    fn records(status: WorkerStatus) -> WorkerRecords {
        WorkerRecords::for_worker(Worker {
            worker_id: "W2".to_string(),
            name: "Ravi".to_string(),
            phone: None,
            email: None,
            joined_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            current_status: status,
            notes: None,
        })
    }

    fn terminated_row() -> TerminationStatus {
        TerminationStatus {
            is_terminated: true,
            terminated_at: Some(Utc.with_ymd_and_hms(2025, 1, 10, 0, 0, 0).unwrap()),
            ..TerminationStatus::not_terminated("W2")
        }
    }

    #[test]
    fn test_agreeing_records_have_no_warnings() {
        let mut records = records(WorkerStatus::Terminated);
        records.termination_status = Some(terminated_row());
        let result = check_record_consistency(&records, 1);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_terminated_row_with_active_worker_is_flagged() {
        let mut records = records(WorkerStatus::Active);
        records.termination_status = Some(terminated_row());
        let result = check_record_consistency(&records, 1);

        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].severity, WarningSeverity::Medium);
        assert!(result.warnings[0].message.contains("current status is active"));
    }

    #[test]
    fn test_terminated_worker_under_review_agrees() {
        let mut records = records(WorkerStatus::UnderReview);
        records.termination_status = Some(terminated_row());
        assert!(check_record_consistency(&records, 1).warnings.is_empty());
    }

    #[test]
    fn test_terminated_worker_without_row_is_flagged() {
        let result = check_record_consistency(&records(WorkerStatus::Terminated), 1);
        assert_eq!(result.warnings[0].record, "worker W2");
    }

    #[test]
    fn test_log_referencing_foreign_order_is_flagged() {
        let mut records = records(WorkerStatus::Active);
        records.termination_logs.push(TerminationLogEntry {
            log_id: 4,
            worker_id: "W2".to_string(),
            logged_at: Utc.with_ymd_and_hms(2025, 1, 3, 0, 0, 0).unwrap(),
            reason_code: None,
            reason_text: None,
            related_order_id: Some("O-OTHER".to_string()),
            evidence: None,
            severity: 1,
            action_taken: None,
            recorded_by: None,
        });
        let result = check_record_consistency(&records, 1);

        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].record, "termination_log 4");
    }
}
