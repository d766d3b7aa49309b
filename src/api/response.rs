//! Response types for the audit engine API.
//!
//! This module defines the error response structures and the mapping from
//! [`AuditError`] to HTTP status codes.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::error::AuditError;

/// API error response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional details about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Creates a new API error with details.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Some(details.into()),
        }
    }

    /// Creates a validation error response.
    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    /// Creates a malformed JSON error response.
    pub fn malformed_json(message: impl Into<String>) -> Self {
        Self::new("MALFORMED_JSON", message)
    }
}

/// Health check body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always "ok" when the store answered.
    pub status: String,
    /// Engine version.
    pub version: String,
}

/// API error with HTTP status code.
#[derive(Debug)]
pub struct ApiErrorResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The error body.
    pub error: ApiError,
}

impl ApiErrorResponse {
    /// A 400 response.
    pub fn bad_request(error: ApiError) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error,
        }
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}

impl From<AuditError> for ApiErrorResponse {
    fn from(error: AuditError) -> Self {
        let message = error.to_string();
        let (status, error) = match error {
            AuditError::ConfigNotFound { .. } | AuditError::ConfigParseError { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::with_details("CONFIG_ERROR", "Configuration error", message),
            ),
            AuditError::DatasetLoad { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::with_details("DATASET_ERROR", "Dataset could not be loaded", message),
            ),
            AuditError::NotFound { entity, .. } => (
                StatusCode::NOT_FOUND,
                ApiError::with_details(
                    "NOT_FOUND",
                    message,
                    format!("No {} is stored under that key", entity),
                ),
            ),
            AuditError::AlreadyExists { .. } => (
                StatusCode::CONFLICT,
                ApiError::new("ALREADY_EXISTS", message),
            ),
            AuditError::ReferencedRecord { .. } => (
                StatusCode::CONFLICT,
                ApiError::with_details(
                    "RECORD_REFERENCED",
                    message,
                    "Dependent records must be removed first",
                ),
            ),
            AuditError::InvalidStatusTransition { .. } => (
                StatusCode::CONFLICT,
                ApiError::new("INVALID_STATUS_TRANSITION", message),
            ),
            AuditError::InvalidRecord { field, .. } => (
                StatusCode::BAD_REQUEST,
                ApiError::with_details(
                    "VALIDATION_ERROR",
                    message,
                    format!("Check the '{}' field", field),
                ),
            ),
            AuditError::InconsistentRecord { .. } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ApiError::new("INCONSISTENT_RECORD", message),
            ),
            AuditError::Storage(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::with_details("STORAGE_ERROR", "Data store failure", message),
            ),
            AuditError::Serialization(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::with_details("SERIALIZATION_ERROR", "Response could not be encoded", message),
            ),
        };
        Self { status, error }
    }
}
