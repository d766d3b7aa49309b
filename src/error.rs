//! Error types for the gig-worker audit engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for every failure the data store, the audit evaluator and the HTTP layer
//! can report.

use thiserror::Error;

use crate::models::WorkerStatus;

/// The main error type for the audit engine.
///
/// # Example
///
/// ```
/// use gig_audit::error::AuditError;
///
/// let error = AuditError::NotFound {
///     entity: "worker",
///     id: "W1".to_string(),
/// };
/// assert_eq!(error.to_string(), "worker not found: W1");
/// ```
#[derive(Debug, Error)]
pub enum AuditError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// A dataset fixture could not be read or decoded.
    #[error("Failed to load dataset '{path}': {message}")]
    DatasetLoad {
        /// The fixture path.
        path: String,
        /// A description of the failure.
        message: String,
    },

    /// The requested record does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of record (e.g. "worker", "order").
        entity: &'static str,
        /// The key that was looked up.
        id: String,
    },

    /// A record with the same key already exists.
    #[error("{entity} already exists: {id}")]
    AlreadyExists {
        /// The kind of record.
        entity: &'static str,
        /// The duplicated key.
        id: String,
    },

    /// Deleting the record would orphan dependent rows.
    #[error("{entity} '{id}' is still referenced by {dependents}")]
    ReferencedRecord {
        /// The kind of record that was to be deleted.
        entity: &'static str,
        /// The key of that record.
        id: String,
        /// Which dependent tables still reference it.
        dependents: String,
    },

    /// The requested worker status change is not in the transition table.
    #[error("Worker '{worker_id}' cannot move from {from} to {to}")]
    InvalidStatusTransition {
        /// The worker whose status was to change.
        worker_id: String,
        /// The current status.
        from: WorkerStatus,
        /// The requested status.
        to: WorkerStatus,
    },

    /// Input or stored data failed validation.
    #[error("Invalid {field}: {message}")]
    InvalidRecord {
        /// The field that was invalid.
        field: String,
        /// A description of what made it invalid.
        message: String,
    },

    /// A stored record violates an application-level invariant.
    ///
    /// The audit evaluator turns these into report warnings instead of
    /// failing.
    #[error("Inconsistent record {record}: {message}")]
    InconsistentRecord {
        /// Identifies the offending record (e.g. "order O2").
        record: String,
        /// A description of the inconsistency.
        message: String,
    },

    /// The underlying store failed.
    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),

    /// A report or payload could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AuditError {
    /// Shorthand for a [`AuditError::NotFound`] error.
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Shorthand for a [`AuditError::InvalidRecord`] error.
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidRecord {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// A type alias for Results that return AuditError.
pub type AuditResult<T> = Result<T, AuditError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_not_found_displays_path() {
        let error = AuditError::ConfigNotFound {
            path: "/missing/file.yaml".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Configuration file not found: /missing/file.yaml"
        );
    }

    #[test]
    fn test_not_found_displays_entity_and_id() {
        let error = AuditError::not_found("order", "O-404");
        assert_eq!(error.to_string(), "order not found: O-404");
    }

    #[test]
    fn test_referenced_record_names_dependents() {
        let error = AuditError::ReferencedRecord {
            entity: "worker",
            id: "W1".to_string(),
            dependents: "orders, review_counts".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "worker 'W1' is still referenced by orders, review_counts"
        );
    }

    #[test]
    fn test_invalid_transition_displays_statuses() {
        let error = AuditError::InvalidStatusTransition {
            worker_id: "W1".to_string(),
            from: WorkerStatus::Terminated,
            to: WorkerStatus::Active,
        };
        assert_eq!(
            error.to_string(),
            "Worker 'W1' cannot move from terminated to active"
        );
    }

    #[test]
    fn test_inconsistent_record_displays_record_and_message() {
        let error = AuditError::InconsistentRecord {
            record: "order O2".to_string(),
            message: "non-compliant payout has no reduction reason".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Inconsistent record order O2: non-compliant payout has no reduction reason"
        );
    }

    #[test]
    fn test_errors_implement_std_error() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<AuditError>();
    }

    #[test]
    fn test_error_propagation_with_question_mark() {
        fn returns_not_found() -> AuditResult<()> {
            Err(AuditError::not_found("worker", "W9"))
        }

        fn propagates_error() -> AuditResult<()> {
            returns_not_found()?;
            Ok(())
        }

        assert!(matches!(
            propagates_error(),
            Err(AuditError::NotFound { entity: "worker", .. })
        ));
    }
}
