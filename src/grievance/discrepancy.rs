//! Record-precedence grievance validation.

use rust_decimal::Decimal;

use crate::config::GrievanceConfig;
use crate::models::WorkerRecords;

use super::topics::{Topics, claimed_amount};
use super::{Decision, Discrepancy, Grievance, GrievanceValidator, Verdict};

/// Validates grievances by comparing the worker's account against the stored
/// records.
///
/// Any contradiction makes the complaint invalid. Without one, a complaint
/// is valid when it raises a suspension, termination, deduction, non-payment
/// or appeal issue, unless the worker's termination status row records them
/// as not terminated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordDiscrepancyValidator {
    payout_tolerance: Decimal,
}

impl RecordDiscrepancyValidator {
    /// Creates a validator that tolerates claimed amounts within
    /// `payout_tolerance` of the latest recorded payout.
    pub fn new(payout_tolerance: Decimal) -> Self {
        Self { payout_tolerance }
    }

    /// Creates a validator from the grievance configuration section.
    pub fn from_config(config: &GrievanceConfig) -> Self {
        Self::new(config.payout_tolerance)
    }

    fn discrepancies(&self, topics: &Topics, transcript: &str, records: &WorkerRecords) -> Vec<Discrepancy> {
        let mut found = Vec::new();
        let status = records.termination_status.as_ref();

        if topics.claims_termination && status.is_some_and(|status| !status.is_terminated) {
            found.push(Discrepancy::TerminationNotRecorded);
        }

        if topics.payment {
            if let (Some(claimed), Some(latest)) = (claimed_amount(transcript), records.latest_order()) {
                if (latest.payout_amount - claimed).abs() > self.payout_tolerance {
                    found.push(Discrepancy::AmountMismatch {
                        claimed,
                        recorded: latest.payout_amount,
                        tolerance: self.payout_tolerance,
                    });
                }
            }
        }

        if topics.claims_no_notice {
            let reason = status
                .and_then(|status| status.termination_reason_text.as_deref())
                .filter(|text| !text.trim().is_empty());
            if let Some(reason_text) = reason {
                found.push(Discrepancy::ReasonOnRecord {
                    reason_text: reason_text.to_string(),
                });
            }
        }

        if topics.claims_not_paid
            && !records.orders.is_empty()
            && records.orders.iter().all(|order| order.payment_compliant)
        {
            found.push(Discrepancy::PaymentsCompliant {
                orders: records.orders.len(),
            });
        }

        found
    }
}

impl Default for RecordDiscrepancyValidator {
    fn default() -> Self {
        Self::from_config(&GrievanceConfig::default())
    }
}

impl GrievanceValidator for RecordDiscrepancyValidator {
    fn assess(&self, grievance: &Grievance, records: &WorkerRecords) -> Verdict {
        let topics = Topics::detect(&grievance.transcript);
        let discrepancies = self.discrepancies(&topics, &grievance.transcript, records);

        if !discrepancies.is_empty() {
            return Verdict {
                decision: Decision::Invalid,
                basis: format!(
                    "{} contradiction(s) with the stored records; stored records take precedence",
                    discrepancies.len()
                ),
                discrepancies,
            };
        }

        let recorded_not_terminated = records
            .termination_status
            .as_ref()
            .is_some_and(|status| !status.is_terminated);
        let (decision, basis) = if !topics.grievance_trigger {
            (
                Decision::Invalid,
                "Complaint raises no suspension, termination, deduction or appeal issue",
            )
        } else if recorded_not_terminated {
            (
                Decision::Invalid,
                "Termination status records the worker as not terminated",
            )
        } else {
            (
                Decision::Valid,
                "Complaint raises an actionable issue and matches the stored records",
            )
        };
        Verdict {
            decision,
            discrepancies,
            basis: basis.to_string(),
        }
    }
}
