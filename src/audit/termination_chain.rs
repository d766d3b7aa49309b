//! Termination justification chain and appeal window.

use chrono::{DateTime, Utc};
use serde_json::json;

use crate::models::{
    AppealWindow, AuditStep, DataQualityWarning, TerminationLogEntry, TerminationSection,
    TerminationStatus, WarningSeverity, sort_chronologically,
};

/// The result of building the termination section.
#[derive(Debug, Clone)]
pub struct TerminationChainResult {
    /// The report section; `None` when the worker is not terminated.
    pub section: Option<TerminationSection>,
    /// The audit step recording this check.
    pub audit_step: AuditStep,
    /// Warnings about the termination record itself.
    pub warnings: Vec<DataQualityWarning>,
}

/// Builds the termination section for a worker.
///
/// Without a termination status row, or with `is_terminated` false, there is
/// no section and no appeal comparison. Otherwise every log entry is
/// presented oldest first (ties in insertion order) and the appeal deadline
/// is compared to `evaluated_at`; a deadline equal to `evaluated_at` has
/// closed.
pub fn build_termination_chain(
    status: Option<&TerminationStatus>,
    logs: &[TerminationLogEntry],
    evaluated_at: DateTime<Utc>,
    step_number: u32,
) -> TerminationChainResult {
    let appeal = status.and_then(|status| status.appeal_window(evaluated_at));
    let (Some(status), Some(appeal)) = (status, appeal) else {
        return TerminationChainResult {
            section: None,
            audit_step: AuditStep {
                step_number,
                rule_id: "termination_chain".to_string(),
                rule_name: "Termination Justification Chain".to_string(),
                input: json!({
                    "status_recorded": status.is_some(),
                    "log_entries": logs.len(),
                }),
                output: json!({ "terminated": false }),
                reasoning: "Worker is not terminated; no justification chain or appeal comparison"
                    .to_string(),
            },
            warnings: Vec::new(),
        };
    };

    let mut chain = logs.to_vec();
    sort_chronologically(&mut chain);
    let max_severity = chain.iter().map(|entry| entry.severity).max();

    let mut warnings = Vec::new();
    if status.terminated_at.is_none() {
        warnings.push(DataQualityWarning::inconsistent_record(
            format!("termination_status {}", status.worker_id),
            "worker is terminated but terminated_at is not recorded",
            WarningSeverity::Medium,
        ));
    }

    let audit_step = AuditStep {
        step_number,
        rule_id: "termination_chain".to_string(),
        rule_name: "Termination Justification Chain".to_string(),
        input: json!({
            "reason_code": status.termination_reason_code,
            "appeal_allowed": status.appeal_allowed,
            "appeal_deadline": status.appeal_deadline,
            "evaluated_at": evaluated_at,
            "log_entries": chain.len(),
        }),
        output: json!({
            "terminated": true,
            "max_severity": max_severity,
            "appeal": appeal,
        }),
        reasoning: format!(
            "Terminated ({}); {} log entr{} in the justification chain; {}",
            status
                .termination_reason_code
                .as_deref()
                .unwrap_or("no reason code"),
            chain.len(),
            if chain.len() == 1 { "y" } else { "ies" },
            describe_appeal(&appeal, evaluated_at)
        ),
    };

    TerminationChainResult {
        section: Some(TerminationSection {
            terminated_at: status.terminated_at,
            reason_code: status.termination_reason_code.clone(),
            reason_text: status.termination_reason_text.clone(),
            justification_chain: chain,
            max_severity,
            appeal,
        }),
        audit_step,
        warnings,
    }
}

/// Plain-language statement of an appeal window.
pub fn describe_appeal(appeal: &AppealWindow, evaluated_at: DateTime<Utc>) -> String {
    match appeal {
        AppealWindow::NotAllowed => "appeal is not permitted".to_string(),
        AppealWindow::OpenIndefinitely => "appeal is permitted with no deadline".to_string(),
        AppealWindow::Open {
            deadline,
            remaining_seconds,
        } => format!(
            "appeal window is open until {} ({} hours remaining at {})",
            deadline.to_rfc3339(),
            remaining_seconds / 3600,
            evaluated_at.to_rfc3339()
        ),
        AppealWindow::Closed { deadline } => format!(
            "appeal window closed at {} (evaluated {})",
            deadline.to_rfc3339(),
            evaluated_at.to_rfc3339()
        ),
    }
}
