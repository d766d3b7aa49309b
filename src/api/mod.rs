//! HTTP API module for the gig-worker audit engine.
//!
//! This module provides the REST endpoints for managing platform records,
//! producing audit reports and assessing grievances.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub use request::{
    AuditRequest, CreateWorkerRequest, ExportQuery, GrievanceRequest, NoteFieldRequest,
    ReviewRequest, StatusChangeRequest,
};
pub use response::{ApiError, ApiErrorResponse, HealthResponse};
pub use state::AppState;
