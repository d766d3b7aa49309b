//! Termination status and termination log models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AuditError, AuditResult};

/// The current termination state of a worker (at most one per worker).
///
/// When `is_terminated` is false the remaining fields carry no meaning;
/// [`TerminationStatus::normalized`] clears them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminationStatus {
    /// The worker this status belongs to.
    pub worker_id: String,
    /// Whether the worker is currently terminated.
    #[serde(default)]
    pub is_terminated: bool,
    /// When the termination took effect.
    #[serde(default)]
    pub terminated_at: Option<DateTime<Utc>>,
    /// Platform reason code (e.g. "FRAUD_SUSPECTED").
    #[serde(default)]
    pub termination_reason_code: Option<String>,
    /// Human-readable reason.
    #[serde(default)]
    pub termination_reason_text: Option<String>,
    /// Whether the worker may appeal.
    #[serde(default)]
    pub appeal_allowed: bool,
    /// Last moment an appeal is accepted.
    #[serde(default)]
    pub appeal_deadline: Option<DateTime<Utc>>,
}

impl TerminationStatus {
    /// A status row for a worker who is not terminated.
    pub fn not_terminated(worker_id: impl Into<String>) -> Self {
        Self {
            worker_id: worker_id.into(),
            is_terminated: false,
            terminated_at: None,
            termination_reason_code: None,
            termination_reason_text: None,
            appeal_allowed: false,
            appeal_deadline: None,
        }
    }

    /// Returns the status with termination fields cleared when not terminated.
    pub fn normalized(self) -> Self {
        if self.is_terminated {
            self
        } else {
            Self::not_terminated(self.worker_id)
        }
    }

    /// Classifies the appeal window at `now`.
    ///
    /// Returns `None` when the worker is not terminated, since no appeal
    /// comparison applies. A deadline equal to `now` counts as closed.
    ///
    /// # Examples
    ///
    /// ```
    /// use gig_audit::models::{AppealWindow, TerminationStatus};
    /// use chrono::{Duration, TimeZone, Utc};
    ///
    /// let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
    /// let mut status = TerminationStatus::not_terminated("W2");
    /// assert_eq!(status.appeal_window(now), None);
    ///
    /// status.is_terminated = true;
    /// status.appeal_allowed = true;
    /// status.appeal_deadline = Some(now - Duration::days(1));
    /// assert!(matches!(status.appeal_window(now), Some(AppealWindow::Closed { .. })));
    /// ```
    pub fn appeal_window(&self, now: DateTime<Utc>) -> Option<AppealWindow> {
        if !self.is_terminated {
            return None;
        }
        if !self.appeal_allowed {
            return Some(AppealWindow::NotAllowed);
        }
        Some(match self.appeal_deadline {
            None => AppealWindow::OpenIndefinitely,
            Some(deadline) if deadline > now => AppealWindow::Open {
                deadline,
                remaining_seconds: (deadline - now).num_seconds(),
            },
            Some(deadline) => AppealWindow::Closed { deadline },
        })
    }
}

/// Whether a terminated worker may currently appeal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AppealWindow {
    /// The platform did not allow an appeal.
    NotAllowed,
    /// Appeals are accepted until `deadline`.
    Open {
        /// The appeal deadline.
        deadline: DateTime<Utc>,
        /// Seconds left until the deadline at evaluation time.
        remaining_seconds: i64,
    },
    /// Appeals are allowed and no deadline was recorded.
    OpenIndefinitely,
    /// The deadline has passed.
    Closed {
        /// The appeal deadline.
        deadline: DateTime<Utc>,
    },
}

impl AppealWindow {
    /// Returns true if an appeal can be lodged.
    pub fn is_open(&self) -> bool {
        matches!(self, AppealWindow::Open { .. } | AppealWindow::OpenIndefinitely)
    }
}

/// The details recorded when a worker is terminated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminationDecision {
    /// When the termination took effect.
    pub terminated_at: DateTime<Utc>,
    /// Platform reason code.
    #[serde(default)]
    pub reason_code: Option<String>,
    /// Human-readable reason.
    #[serde(default)]
    pub reason_text: Option<String>,
    /// Whether the worker may appeal.
    #[serde(default)]
    pub appeal_allowed: bool,
    /// Last moment an appeal is accepted.
    #[serde(default)]
    pub appeal_deadline: Option<DateTime<Utc>>,
}

impl TerminationDecision {
    /// Builds the status row for `worker_id`.
    pub fn into_status(self, worker_id: impl Into<String>) -> TerminationStatus {
        TerminationStatus {
            worker_id: worker_id.into(),
            is_terminated: true,
            terminated_at: Some(self.terminated_at),
            termination_reason_code: self.reason_code,
            termination_reason_text: self.reason_text,
            appeal_allowed: self.appeal_allowed,
            appeal_deadline: self.appeal_deadline,
        }
    }
}

/// A stored termination log entry. Entries are never modified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminationLogEntry {
    /// Auto-assigned identifier.
    pub log_id: i64,
    /// The worker the event concerns.
    pub worker_id: String,
    /// When the event was logged.
    pub logged_at: DateTime<Utc>,
    /// Platform reason code.
    pub reason_code: Option<String>,
    /// Human-readable reason.
    pub reason_text: Option<String>,
    /// The order that triggered the event, if any.
    pub related_order_id: Option<String>,
    /// Evidence attached to the event.
    pub evidence: Option<String>,
    /// Severity score; higher is more severe.
    pub severity: i64,
    /// What the platform did (e.g. "warning", "suspension").
    pub action_taken: Option<String>,
    /// Who recorded the event.
    pub recorded_by: Option<String>,
}

/// A termination log entry to be appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTerminationLog {
    /// The worker the event concerns.
    pub worker_id: String,
    /// When the event was logged.
    pub logged_at: DateTime<Utc>,
    /// Platform reason code.
    #[serde(default)]
    pub reason_code: Option<String>,
    /// Human-readable reason.
    #[serde(default)]
    pub reason_text: Option<String>,
    /// The order that triggered the event, if any.
    #[serde(default)]
    pub related_order_id: Option<String>,
    /// Evidence attached to the event.
    #[serde(default)]
    pub evidence: Option<String>,
    /// Severity score.
    #[serde(default)]
    pub severity: i64,
    /// What the platform did.
    #[serde(default)]
    pub action_taken: Option<String>,
    /// Who recorded the event.
    #[serde(default)]
    pub recorded_by: Option<String>,
}

impl NewTerminationLog {
    /// Validates the entry before it is appended.
    pub fn validate(&self) -> AuditResult<()> {
        if self.worker_id.trim().is_empty() {
            return Err(AuditError::invalid("worker_id", "must not be empty"));
        }
        if self.severity < 0 {
            return Err(AuditError::invalid("severity", "must not be negative"));
        }
        Ok(())
    }

    /// Attaches the identifier assigned by the store.
    pub fn with_id(self, log_id: i64) -> TerminationLogEntry {
        TerminationLogEntry {
            log_id,
            worker_id: self.worker_id,
            logged_at: self.logged_at,
            reason_code: self.reason_code,
            reason_text: self.reason_text,
            related_order_id: self.related_order_id,
            evidence: self.evidence,
            severity: self.severity,
            action_taken: self.action_taken,
            recorded_by: self.recorded_by,
        }
    }
}

/// Sorts entries into justification-chain order: `logged_at`, then `log_id`.
pub fn sort_chronologically(entries: &mut [TerminationLogEntry]) {
    entries.sort_by(|a, b| a.logged_at.cmp(&b.logged_at).then(a.log_id.cmp(&b.log_id)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn terminated(appeal_allowed: bool, deadline: Option<DateTime<Utc>>) -> TerminationStatus {
        TerminationDecision {
            terminated_at: now() - Duration::days(10),
            reason_code: Some("LOW_RATING".to_string()),
            reason_text: Some("Rating below threshold".to_string()),
            appeal_allowed,
            appeal_deadline: deadline,
        }
        .into_status("W2")
    }

    #[test]
    fn test_not_terminated_has_no_appeal_comparison() {
        let status = TerminationStatus::not_terminated("W1");
        assert_eq!(status.appeal_window(now()), None);
    }

    #[test]
    fn test_normalized_clears_fields_when_not_terminated() {
        let mut status = terminated(true, Some(now()));
        status.is_terminated = false;

        let normalized = status.normalized();
        assert_eq!(normalized, TerminationStatus::not_terminated("W2"));
    }

    #[test]
    fn test_normalized_keeps_terminated_rows() {
        let status = terminated(true, Some(now()));
        assert_eq!(status.clone().normalized(), status);
    }

    #[test]
    fn test_past_deadline_is_closed() {
        let deadline = now() - Duration::hours(1);
        let status = terminated(true, Some(deadline));
        assert_eq!(
            status.appeal_window(now()),
            Some(AppealWindow::Closed { deadline })
        );
    }

    #[test]
    fn test_deadline_at_evaluation_instant_is_closed() {
        let status = terminated(true, Some(now()));
        let window = status.appeal_window(now()).unwrap();
        assert!(!window.is_open());
    }

    #[test]
    fn test_future_deadline_is_open_with_remaining_time() {
        let deadline = now() + Duration::days(2);
        let status = terminated(true, Some(deadline));
        assert_eq!(
            status.appeal_window(now()),
            Some(AppealWindow::Open {
                deadline,
                remaining_seconds: 2 * 24 * 3600,
            })
        );
    }

    #[test]
    fn test_appeal_not_allowed_ignores_deadline() {
        let status = terminated(false, Some(now() + Duration::days(2)));
        assert_eq!(status.appeal_window(now()), Some(AppealWindow::NotAllowed));
    }

    #[test]
    fn test_allowed_without_deadline_is_open_indefinitely() {
        let status = terminated(true, None);
        let window = status.appeal_window(now()).unwrap();
        assert_eq!(window, AppealWindow::OpenIndefinitely);
        assert!(window.is_open());
    }

    #[test]
    fn test_appeal_window_serializes_with_state_tag() {
        let json = serde_json::to_value(AppealWindow::NotAllowed).unwrap();
        assert_eq!(json["state"], "not_allowed");
    }

    #[test]
    fn test_sort_chronologically_breaks_ties_by_log_id() {
        let base = NewTerminationLog {
            worker_id: "W2".to_string(),
            logged_at: now(),
            reason_code: None,
            reason_text: None,
            related_order_id: None,
            evidence: None,
            severity: 0,
            action_taken: None,
            recorded_by: None,
        };
        let mut entries = vec![
            base.clone().with_id(3),
            NewTerminationLog {
                logged_at: now() - Duration::days(1),
                ..base.clone()
            }
            .with_id(7),
            base.with_id(1),
        ];

        sort_chronologically(&mut entries);
        let ids: Vec<i64> = entries.iter().map(|e| e.log_id).collect();
        assert_eq!(ids, vec![7, 1, 3]);
    }

    #[test]
    fn test_negative_severity_is_rejected() {
        let log = NewTerminationLog {
            worker_id: "W2".to_string(),
            logged_at: now(),
            reason_code: None,
            reason_text: None,
            related_order_id: None,
            evidence: None,
            severity: -1,
            action_taken: None,
            recorded_by: None,
        };
        assert!(log.validate().is_err());
    }
}
