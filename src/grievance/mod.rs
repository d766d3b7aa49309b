//! Grievance intake.
//!
//! A grievance is a worker's free-text complaint (typically a voice
//! transcript) about one platform. Intake loads the worker's stored records,
//! asks a [`GrievanceValidator`] for a verdict and returns it with the subset
//! of records that bear on the complaint. Stored records take precedence
//! over the worker's account of events.

mod discrepancy;
mod topics;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::error::{AuditError, AuditResult};
use crate::models::{Order, ReviewCounts, TerminationLogEntry, TerminationStatus, Worker, WorkerRecords};
use crate::store::Store;

pub use discrepancy::RecordDiscrepancyValidator;
pub use topics::{Topics, claimed_amount};

/// Orders returned in full when a complaint is about payment; larger
/// histories are narrowed.
const MAX_RELEVANT_ORDERS: usize = 10;

/// A complaint submitted by a worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grievance {
    /// Identifier assigned at intake.
    pub grievance_id: Uuid,
    /// The complaining worker.
    pub worker_id: String,
    /// What the worker said.
    pub transcript: String,
    /// The platform the complaint is about.
    pub platform_name: Option<String>,
    /// When the complaint was received.
    pub submitted_at: DateTime<Utc>,
}

impl Grievance {
    /// Creates a grievance with a fresh id.
    pub fn new(
        worker_id: impl Into<String>,
        transcript: impl Into<String>,
        platform_name: Option<String>,
        submitted_at: DateTime<Utc>,
    ) -> AuditResult<Self> {
        let worker_id = worker_id.into();
        if worker_id.trim().is_empty() {
            return Err(AuditError::invalid("worker_id", "must not be empty"));
        }
        Ok(Self {
            grievance_id: Uuid::new_v4(),
            worker_id,
            transcript: transcript.into(),
            platform_name,
            submitted_at,
        })
    }
}

/// Outcome of a grievance assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// The complaint is consistent with the record and actionable.
    Valid,
    /// The complaint contradicts the record or raises nothing actionable.
    Invalid,
}

impl Decision {
    /// The phrase shown to the worker.
    pub fn label(&self) -> &'static str {
        match self {
            Decision::Valid => "Valid complaint",
            Decision::Invalid => "Invalid complaint",
        }
    }
}

/// A point where the worker's account contradicts the stored record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Discrepancy {
    /// Claims termination or suspension; the record says not terminated.
    TerminationNotRecorded,
    /// Claims there was no notice; the record holds a termination reason.
    ReasonOnRecord {
        /// The recorded termination reason text.
        reason_text: String,
    },
    /// Claims non-payment; every recorded order is payment-compliant.
    PaymentsCompliant {
        /// Number of orders on record.
        orders: usize,
    },
    /// Claims an amount far from the most recent recorded payout.
    AmountMismatch {
        /// The amount stated in the transcript.
        claimed: rust_decimal::Decimal,
        /// The most recent order's recorded payout.
        recorded: rust_decimal::Decimal,
        /// The tolerance that was exceeded.
        tolerance: rust_decimal::Decimal,
    },
}

/// A validator's verdict on one grievance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    /// The decision.
    pub decision: Decision,
    /// Contradictions found between the complaint and the record.
    pub discrepancies: Vec<Discrepancy>,
    /// How the decision was reached.
    pub basis: String,
}

/// Decides whether a grievance is valid against the worker's records.
pub trait GrievanceValidator: Send + Sync {
    /// Assesses `grievance` against `records`.
    fn assess(&self, grievance: &Grievance, records: &WorkerRecords) -> Verdict;
}

/// The subset of a worker's records relevant to a complaint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelevantRecords {
    /// Always included.
    pub worker: Worker,
    /// Included for termination and appeal complaints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub termination_status: Option<TerminationStatus>,
    /// Included for termination and appeal complaints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub termination_logs: Option<Vec<TerminationLogEntry>>,
    /// Included for payment and rating complaints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orders: Option<Vec<Order>>,
    /// Included for rating and review complaints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_counts: Option<ReviewCounts>,
}

impl RelevantRecords {
    /// Selects the records bearing on the topics of `transcript`.
    pub fn select(transcript: &str, records: &WorkerRecords) -> Self {
        let topics = Topics::detect(transcript);

        let (termination_status, termination_logs) = if topics.termination_or_appeal {
            (
                records.termination_status.clone(),
                Some(records.termination_logs.clone()),
            )
        } else {
            (None, None)
        };

        let orders = if topics.payment {
            Some(payment_orders(&records.orders))
        } else if topics.rating {
            Some(records.orders.clone())
        } else {
            None
        };

        Self {
            worker: records.worker.clone(),
            termination_status,
            termination_logs,
            orders,
            review_counts: if topics.reviews {
                records.review_counts.clone()
            } else {
                None
            },
        }
    }
}

/// Large order histories are narrowed to the non-compliant orders, or to the
/// most recent ones when every order is compliant.
fn payment_orders(orders: &[Order]) -> Vec<Order> {
    if orders.len() <= MAX_RELEVANT_ORDERS {
        return orders.to_vec();
    }
    let flagged: Vec<Order> = orders
        .iter()
        .filter(|order| !order.payment_compliant)
        .cloned()
        .collect();
    if !flagged.is_empty() {
        return flagged;
    }
    let mut recent = orders.to_vec();
    recent.sort_by(|a, b| b.order_date.cmp(&a.order_date));
    recent.truncate(MAX_RELEVANT_ORDERS);
    recent
}

/// The response to a grievance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrievanceAssessment {
    /// The assessed grievance.
    pub grievance: Grievance,
    /// The decision phrase shown to the worker.
    pub final_decision: String,
    /// The validator's verdict.
    pub verdict: Verdict,
    /// Records bearing on the complaint.
    pub relevant_records: RelevantRecords,
}

/// Assesses a grievance against the worker's stored records.
///
/// Fails with `NotFound` when the worker does not exist.
pub async fn assess_grievance(
    store: &Store,
    validator: &dyn GrievanceValidator,
    grievance: Grievance,
) -> AuditResult<GrievanceAssessment> {
    let records = store.load_worker_records(&grievance.worker_id).await?;
    let verdict = validator.assess(&grievance, &records);
    let relevant_records = RelevantRecords::select(&grievance.transcript, &records);

    info!(
        grievance_id = %grievance.grievance_id,
        worker_id = %grievance.worker_id,
        decision = verdict.decision.label(),
        discrepancies = verdict.discrepancies.len(),
        "Grievance assessed"
    );
    Ok(GrievanceAssessment {
        final_decision: verdict.decision.label().to_string(),
        grievance,
        verdict,
        relevant_records,
    })
}
