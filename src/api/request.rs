//! Request types for the audit engine API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::audit::ExpectedPayouts;
use crate::error::{AuditError, AuditResult};
use crate::models::{Worker, WorkerStatus};

/// Request body for `POST /workers`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateWorkerRequest {
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
    /// When the worker joined; defaults to the time of the request.
    #[serde(default)]
    pub joined_at: Option<DateTime<Utc>>,
    /// Initial status; defaults to `active`.
    #[serde(default)]
    pub current_status: Option<WorkerStatus>,
    /// Free-form notes.
    #[serde(default)]
    pub notes: Option<String>,
}

impl CreateWorkerRequest {
    /// Builds the worker row, filling defaults relative to `now`.
    pub fn into_worker(self, now: DateTime<Utc>) -> Worker {
        Worker {
            worker_id: self.worker_id,
            name: self.name,
            phone: self.phone,
            email: self.email,
            joined_at: self.joined_at.unwrap_or(now),
            current_status: self.current_status.unwrap_or(WorkerStatus::Active),
            notes: self.notes,
        }
    }
}

/// Request body for `POST /workers/:worker_id/status`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StatusChangeRequest {
    /// The status to move to.
    pub status: WorkerStatus,
}

/// Request body for `POST /workers/:worker_id/fields`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum NoteFieldRequest {
    /// Sets `field` to `value`.
    Set {
        /// The field name.
        field: String,
        /// Any JSON value.
        value: Value,
    },
    /// Removes `field`.
    Remove {
        /// The field name.
        field: String,
    },
}

/// Request body for `POST /workers/:worker_id/reviews`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ReviewRequest {
    /// Star rating, 1 to 5.
    pub stars: u8,
}

/// Request body for `POST /workers/:worker_id/audit`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditRequest {
    /// Evaluation time; defaults to the time of the request.
    #[serde(default)]
    pub evaluated_at: Option<DateTime<Utc>>,
    /// Expected payout per order id. Takes precedence over the configured
    /// rate card.
    #[serde(default)]
    pub expected_payouts: Option<ExpectedPayouts>,
}

/// Query string for `GET /workers/:worker_id/audit/export`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportQuery {
    /// `json` (default) or `text`.
    #[serde(default)]
    pub format: Option<String>,
    /// Evaluation time; defaults to the time of the request.
    #[serde(default)]
    pub at: Option<DateTime<Utc>>,
}

/// Request body for `POST /grievances`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrievanceRequest {
    /// The complaining worker.
    pub worker_id: String,
    /// What the worker said.
    pub transcript: String,
    /// The platform the complaint is about.
    #[serde(default)]
    pub platform_name: Option<String>,
}

impl GrievanceRequest {
    /// Rejects an empty transcript.
    pub fn validate(&self) -> AuditResult<()> {
        if self.transcript.trim().is_empty() {
            return Err(AuditError::invalid("transcript", "must not be empty"));
        }
        Ok(())
    }
}
