//! Worker model and the worker status state machine.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AuditError, AuditResult};

/// The lifecycle status of a worker on the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerStatus {
    /// Working normally.
    Active,
    /// Temporarily blocked from taking orders.
    Suspended,
    /// Account is being reviewed (e.g. after a complaint or an appeal).
    UnderReview,
    /// Deactivated by the platform.
    Terminated,
    /// Restored after a suspension or termination.
    Reinstated,
}

impl WorkerStatus {
    /// All statuses, in declaration order.
    pub const ALL: [WorkerStatus; 5] = [
        WorkerStatus::Active,
        WorkerStatus::Suspended,
        WorkerStatus::UnderReview,
        WorkerStatus::Terminated,
        WorkerStatus::Reinstated,
    ];

    /// Returns the stored text form of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerStatus::Active => "active",
            WorkerStatus::Suspended => "suspended",
            WorkerStatus::UnderReview => "under_review",
            WorkerStatus::Terminated => "terminated",
            WorkerStatus::Reinstated => "reinstated",
        }
    }

    /// Returns the statuses this status may move to.
    pub fn allowed_transitions(&self) -> &'static [WorkerStatus] {
        use WorkerStatus::*;
        match self {
            Active => &[Suspended, UnderReview, Terminated],
            Suspended => &[UnderReview, Terminated, Reinstated],
            UnderReview => &[Active, Suspended, Terminated, Reinstated],
            Terminated => &[UnderReview, Reinstated],
            Reinstated => &[Suspended, UnderReview, Terminated],
        }
    }

    /// Returns true if moving from `self` to `next` is permitted.
    ///
    /// # Examples
    ///
    /// ```
    /// use gig_audit::models::WorkerStatus;
    ///
    /// assert!(WorkerStatus::Active.can_transition_to(WorkerStatus::Terminated));
    /// assert!(!WorkerStatus::Terminated.can_transition_to(WorkerStatus::Active));
    /// ```
    pub fn can_transition_to(&self, next: WorkerStatus) -> bool {
        self.allowed_transitions().contains(&next)
    }

    /// Returns true if this status agrees with a termination row whose
    /// `is_terminated` flag is `is_terminated`.
    ///
    /// `under_review` agrees with either value: a terminated worker whose
    /// decision is being reviewed keeps the decision in force until they
    /// are reinstated or terminated again.
    pub fn agrees_with_termination(&self, is_terminated: bool) -> bool {
        match self {
            WorkerStatus::Terminated => is_terminated,
            WorkerStatus::UnderReview => true,
            _ => !is_terminated,
        }
    }
}

impl fmt::Display for WorkerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkerStatus {
    type Err = AuditError;

    fn from_str(s: &str) -> AuditResult<Self> {
        let normalized = s.trim().to_lowercase();
        WorkerStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| {
                AuditError::invalid("current_status", format!("unknown worker status '{}'", s))
            })
    }
}

/// A worker registered on the platform.
///
/// Workers are never deleted while any order, termination or review row
/// still references them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Worker {
    /// Unique identifier for the worker.
    pub worker_id: String,
    /// Display name.
    pub name: String,
    /// Contact phone number.
    #[serde(default)]
    pub phone: Option<String>,
    /// Contact email address.
    #[serde(default)]
    pub email: Option<String>,
    /// When the worker joined the platform.
    pub joined_at: DateTime<Utc>,
    /// Current lifecycle status.
    pub current_status: WorkerStatus,
    /// Free-form notes; the store keeps extra fields here as a JSON object.
    #[serde(default)]
    pub notes: Option<String>,
}

impl Worker {
    /// Validates the fields the store relies on.
    pub fn validate(&self) -> AuditResult<()> {
        if self.worker_id.trim().is_empty() {
            return Err(AuditError::invalid("worker_id", "must not be empty"));
        }
        if self.name.trim().is_empty() {
            return Err(AuditError::invalid("name", "must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn create_test_worker() -> Worker {
        Worker {
            worker_id: "W1".to_string(),
            name: "Asha Rao".to_string(),
            phone: Some("+91-9000000001".to_string()),
            email: None,
            joined_at: Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
            current_status: WorkerStatus::Active,
            notes: None,
        }
    }

    #[test]
    fn test_status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&WorkerStatus::UnderReview).unwrap(),
            "\"under_review\""
        );
        let status: WorkerStatus = serde_json::from_str("\"reinstated\"").unwrap();
        assert_eq!(status, WorkerStatus::Reinstated);
    }

    #[test]
    fn test_status_parses_stored_text() {
        assert_eq!(
            "under_review".parse::<WorkerStatus>().unwrap(),
            WorkerStatus::UnderReview
        );
        assert_eq!(" Active ".parse::<WorkerStatus>().unwrap(), WorkerStatus::Active);
    }

    #[test]
    fn test_unknown_status_is_invalid_record() {
        let result = "on_holiday".parse::<WorkerStatus>();
        match result {
            Err(AuditError::InvalidRecord { field, .. }) => assert_eq!(field, "current_status"),
            other => panic!("Expected InvalidRecord, got {:?}", other),
        }
    }

    #[test]
    fn test_as_str_round_trips_for_every_status() {
        for status in WorkerStatus::ALL {
            assert_eq!(status.as_str().parse::<WorkerStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_no_status_transitions_to_itself() {
        for status in WorkerStatus::ALL {
            assert!(!status.can_transition_to(status), "{} -> itself", status);
        }
    }

    #[test]
    fn test_terminated_worker_must_be_reviewed_or_reinstated() {
        let terminated = WorkerStatus::Terminated;
        assert!(terminated.can_transition_to(WorkerStatus::UnderReview));
        assert!(terminated.can_transition_to(WorkerStatus::Reinstated));
        assert!(!terminated.can_transition_to(WorkerStatus::Active));
        assert!(!terminated.can_transition_to(WorkerStatus::Suspended));
    }

    #[test]
    fn test_every_status_can_reach_terminated_except_terminated() {
        for status in WorkerStatus::ALL {
            let expected = status != WorkerStatus::Terminated;
            assert_eq!(status.can_transition_to(WorkerStatus::Terminated), expected);
        }
    }

    #[test]
    fn test_validate_rejects_blank_name() {
        let mut worker = create_test_worker();
        worker.name = "  ".to_string();
        assert!(matches!(
            worker.validate(),
            Err(AuditError::InvalidRecord { field, .. }) if field == "name"
        ));
    }

    #[test]
    fn test_deserialize_worker_with_optional_fields_missing() {
        let json = r#"{
            "worker_id": "W2",
            "name": "Ravi",
            "joined_at": "2024-05-01T00:00:00Z",
            "current_status": "suspended"
        }"#;

        let worker: Worker = serde_json::from_str(json).unwrap();
        assert_eq!(worker.worker_id, "W2");
        assert_eq!(worker.current_status, WorkerStatus::Suspended);
        assert!(worker.phone.is_none());
        assert!(worker.notes.is_none());
    }
}
