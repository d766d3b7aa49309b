//! Audit and compliance evaluation.
//!
//! This module turns everything stored about one worker into an
//! [`AuditReport`]: the payout compliance summary, the termination
//! justification chain with its appeal window, the review snapshot and a
//! numbered explanation trail. Inconsistent source rows are reported as
//! warnings inside the report rather than failing the audit.
//!
//! [`evaluate`] is a pure function of the loaded records, the evaluation
//! instant and the optional payout baseline, so the same inputs always give
//! the same report.

mod baseline;
mod payout_compliance;
mod record_consistency;
mod review_snapshot;
mod termination_chain;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::error::AuditResult;
use crate::models::{AuditReport, AuditStep, DataQualityWarning, WorkerRecords};
use crate::store::Store;

pub use baseline::{ExpectedPayouts, PayoutBaseline};
pub use payout_compliance::{PayoutComplianceResult, summarize_payouts};
pub use record_consistency::{RecordConsistencyResult, check_record_consistency};
pub use review_snapshot::{ReviewSnapshotResult, snapshot_reviews};
pub use termination_chain::{TerminationChainResult, build_termination_chain, describe_appeal};

/// Version stamped on every report.
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Evaluates a worker's records as of `evaluated_at`.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use gig_audit::audit::evaluate;
/// use gig_audit::models::{Worker, WorkerRecords, WorkerStatus};
///
/// let worker = Worker {
///     worker_id: "W3".to_string(),
///     name: "Meena".to_string(),
///     phone: None,
///     email: None,
///     joined_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
///     current_status: WorkerStatus::Active,
///     notes: None,
/// };
/// let at = Utc.with_ymd_and_hms(2025, 1, 31, 0, 0, 0).unwrap();
///
/// let report = evaluate(&WorkerRecords::for_worker(worker), at, None);
/// assert_eq!(report.payout.total_orders, 0);
/// assert!(report.termination.is_none());
/// assert!(report.warnings.is_empty());
/// ```
pub fn evaluate(
    records: &WorkerRecords,
    evaluated_at: DateTime<Utc>,
    baseline: Option<&dyn PayoutBaseline>,
) -> AuditReport {
    let mut explanation: Vec<AuditStep> = Vec::new();
    let mut warnings: Vec<DataQualityWarning> = Vec::new();
    let mut step_number: u32 = 1;

    // Step 1 (and 2 with a baseline): payout compliance
    let payout = summarize_payouts(&records.orders, baseline, step_number);
    step_number += payout.audit_steps.len() as u32;
    explanation.extend(payout.audit_steps);
    warnings.extend(payout.warnings);

    let termination = build_termination_chain(
        records.termination_status.as_ref(),
        &records.termination_logs,
        evaluated_at,
        step_number,
    );
    step_number += 1;
    explanation.push(termination.audit_step);
    warnings.extend(termination.warnings);

    let reviews = snapshot_reviews(records.review_counts.as_ref(), step_number);
    step_number += 1;
    explanation.push(reviews.audit_step);
    warnings.extend(reviews.warnings);

    let consistency = check_record_consistency(records, step_number);
    explanation.push(consistency.audit_step);
    warnings.extend(consistency.warnings);

    AuditReport {
        engine_version: ENGINE_VERSION.to_string(),
        evaluated_at,
        worker: records.worker.clone(),
        payout: payout.summary,
        termination: termination.section,
        reviews: reviews.snapshot,
        explanation,
        warnings,
    }
}

/// Loads a worker's records from `store` and evaluates them.
///
/// Fails with `NotFound` when the worker does not exist.
pub async fn audit_worker(
    store: &Store,
    worker_id: &str,
    evaluated_at: DateTime<Utc>,
    baseline: Option<&dyn PayoutBaseline>,
) -> AuditResult<AuditReport> {
    let records = store.load_worker_records(worker_id).await?;
    let report = evaluate(&records, evaluated_at, baseline);

    info!(
        worker_id,
        orders = report.payout.total_orders,
        non_compliant = report.payout.non_compliant_orders,
        terminated = report.termination.is_some(),
        warnings = report.warnings.len(),
        "Audit evaluated"
    );
    Ok(report)
}
