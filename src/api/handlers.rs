//! HTTP request handlers for the audit engine API.
//!
//! This module contains the handler functions for all API endpoints.

use std::time::Instant;

use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::audit::{ENGINE_VERSION, PayoutBaseline, audit_worker};
use crate::error::AuditError;
use crate::grievance::{Grievance, GrievanceAssessment, assess_grievance};
use crate::models::{
    AuditReport, Dataset, NewTerminationLog, Order, OrderCorrection, ReviewCounts, Snapshot,
    TerminationDecision, TerminationLogEntry, TerminationStatus, Worker, WorkerRecords,
};
use crate::report::{ReportFormat, render};
use crate::simulator::{InlineSource, seed};
use crate::store::ImportSummary;

use super::request::{
    AuditRequest, CreateWorkerRequest, ExportQuery, GrievanceRequest, NoteFieldRequest,
    ReviewRequest, StatusChangeRequest,
};
use super::response::{ApiError, ApiErrorResponse, HealthResponse};
use super::state::AppState;

type ApiResult<T> = Result<T, ApiErrorResponse>;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/db/print", get(snapshot_handler))
        .route("/workers", get(list_workers_handler).post(create_worker_handler))
        .route(
            "/workers/:worker_id",
            get(get_worker_handler).delete(delete_worker_handler),
        )
        .route("/workers/:worker_id/status", post(change_status_handler))
        .route("/workers/:worker_id/fields", post(note_field_handler))
        .route("/workers/:worker_id/terminate", post(terminate_handler))
        .route("/workers/:worker_id/reinstate", post(reinstate_handler))
        .route(
            "/workers/:worker_id/termination_logs",
            get(list_logs_handler),
        )
        .route("/workers/:worker_id/reviews", post(record_review_handler))
        .route(
            "/workers/:worker_id/audit",
            get(audit_handler).post(audit_with_options_handler),
        )
        .route("/workers/:worker_id/audit/export", get(export_handler))
        .route("/orders", post(create_order_handler))
        .route(
            "/orders/:order_id",
            get(get_order_handler).delete(delete_order_handler),
        )
        .route("/orders/:order_id/correction", post(correct_order_handler))
        .route("/termination_status", put(upsert_status_handler))
        .route("/termination_status/:worker_id", get(get_status_handler))
        .route("/termination_logs", post(append_log_handler))
        .route("/review_counts", put(upsert_reviews_handler))
        .route("/review_counts/:worker_id", get(get_reviews_handler))
        .route("/grievances", post(grievance_handler))
        .route("/simulator/seed", post(seed_handler))
        .with_state(state)
}

/// Assigns a correlation id to a request.
fn begin(operation: &'static str) -> Uuid {
    let correlation_id = Uuid::new_v4();
    debug!(correlation_id = %correlation_id, operation, "Handling request");
    correlation_id
}

/// Logs a failed operation and converts it to an error response.
fn fail(correlation_id: Uuid) -> impl Fn(AuditError) -> ApiErrorResponse {
    move |error| {
        warn!(correlation_id = %correlation_id, error = %error, "Request failed");
        error.into()
    }
}

/// Unwraps a JSON body, turning extractor rejections into 400 responses.
fn read_json<T>(
    payload: Result<Json<T>, JsonRejection>,
    correlation_id: Uuid,
) -> ApiResult<T> {
    let rejection = match payload {
        Ok(Json(body)) => return Ok(body),
        Err(rejection) => rejection,
    };

    let error = match rejection {
        JsonRejection::JsonDataError(err) => {
            // The body text carries serde's description of the problem
            let body_text = err.body_text();
            warn!(
                correlation_id = %correlation_id,
                error = %body_text,
                "JSON data error"
            );
            if body_text.contains("missing field") {
                ApiError::validation_error(body_text)
            } else {
                ApiError::malformed_json(body_text)
            }
        }
        JsonRejection::JsonSyntaxError(err) => {
            warn!(
                correlation_id = %correlation_id,
                error = %err,
                "JSON syntax error"
            );
            ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
        }
        JsonRejection::MissingJsonContentType(_) => {
            ApiError::new("MISSING_CONTENT_TYPE", "Content-Type must be application/json")
        }
        _ => ApiError::malformed_json("Failed to parse request body"),
    };
    Err(ApiErrorResponse::bad_request(error))
}

/// Handler for GET /health.
async fn health_handler(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    let correlation_id = begin("health");
    state
        .store()
        .health_check()
        .await
        .map_err(fail(correlation_id))?;
    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: ENGINE_VERSION.to_string(),
    }))
}

/// Handler for GET /db/print.
async fn snapshot_handler(State(state): State<AppState>) -> ApiResult<Json<Snapshot>> {
    let correlation_id = begin("snapshot");
    let snapshot = state.store().snapshot().await.map_err(fail(correlation_id))?;
    info!(
        correlation_id = %correlation_id,
        workers = snapshot.workers.len(),
        orders = snapshot.orders.len(),
        "Snapshot served"
    );
    Ok(Json(snapshot))
}

/// Handler for GET /workers.
async fn list_workers_handler(State(state): State<AppState>) -> ApiResult<Json<Vec<Worker>>> {
    let correlation_id = begin("list_workers");
    let workers = state.store().list_workers().await.map_err(fail(correlation_id))?;
    Ok(Json(workers))
}

/// Handler for POST /workers.
async fn create_worker_handler(
    State(state): State<AppState>,
    payload: Result<Json<CreateWorkerRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Worker>)> {
    let correlation_id = begin("create_worker");
    let worker = read_json(payload, correlation_id)?.into_worker(Utc::now());

    state
        .store()
        .create_worker(&worker)
        .await
        .map_err(fail(correlation_id))?;
    info!(correlation_id = %correlation_id, worker_id = %worker.worker_id, "Worker created");
    Ok((StatusCode::CREATED, Json(worker)))
}

/// Handler for GET /workers/:worker_id.
///
/// Returns everything stored about the worker.
async fn get_worker_handler(
    State(state): State<AppState>,
    Path(worker_id): Path<String>,
) -> ApiResult<Json<WorkerRecords>> {
    let correlation_id = begin("get_worker");
    let records = state
        .store()
        .load_worker_records(&worker_id)
        .await
        .map_err(fail(correlation_id))?;
    Ok(Json(records))
}

/// Handler for DELETE /workers/:worker_id.
async fn delete_worker_handler(
    State(state): State<AppState>,
    Path(worker_id): Path<String>,
) -> ApiResult<StatusCode> {
    let correlation_id = begin("delete_worker");
    state
        .store()
        .delete_worker(&worker_id)
        .await
        .map_err(fail(correlation_id))?;
    info!(correlation_id = %correlation_id, worker_id = %worker_id, "Worker deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for POST /workers/:worker_id/status.
async fn change_status_handler(
    State(state): State<AppState>,
    Path(worker_id): Path<String>,
    payload: Result<Json<StatusChangeRequest>, JsonRejection>,
) -> ApiResult<Json<Worker>> {
    let correlation_id = begin("change_status");
    let request = read_json(payload, correlation_id)?;
    let worker = state
        .store()
        .transition_worker_status(&worker_id, request.status)
        .await
        .map_err(fail(correlation_id))?;
    Ok(Json(worker))
}

/// Handler for POST /workers/:worker_id/fields.
async fn note_field_handler(
    State(state): State<AppState>,
    Path(worker_id): Path<String>,
    payload: Result<Json<NoteFieldRequest>, JsonRejection>,
) -> ApiResult<Json<Worker>> {
    let correlation_id = begin("note_field");
    let store = state.store();
    let result = match read_json(payload, correlation_id)? {
        NoteFieldRequest::Set { field, value } => {
            store.set_worker_note_field(&worker_id, &field, value).await
        }
        NoteFieldRequest::Remove { field } => {
            store.remove_worker_note_field(&worker_id, &field).await
        }
    };
    Ok(Json(result.map_err(fail(correlation_id))?))
}

/// Handler for POST /workers/:worker_id/terminate.
async fn terminate_handler(
    State(state): State<AppState>,
    Path(worker_id): Path<String>,
    payload: Result<Json<TerminationDecision>, JsonRejection>,
) -> ApiResult<Json<TerminationStatus>> {
    let correlation_id = begin("terminate");
    let decision = read_json(payload, correlation_id)?;
    let status = state
        .store()
        .terminate_worker(&worker_id, decision)
        .await
        .map_err(fail(correlation_id))?;
    info!(correlation_id = %correlation_id, worker_id = %worker_id, "Worker terminated");
    Ok(Json(status))
}

/// Handler for POST /workers/:worker_id/reinstate.
async fn reinstate_handler(
    State(state): State<AppState>,
    Path(worker_id): Path<String>,
) -> ApiResult<Json<Worker>> {
    let correlation_id = begin("reinstate");
    let worker = state
        .store()
        .reinstate_worker(&worker_id)
        .await
        .map_err(fail(correlation_id))?;
    info!(correlation_id = %correlation_id, worker_id = %worker_id, "Worker reinstated");
    Ok(Json(worker))
}

/// Handler for GET /workers/:worker_id/termination_logs.
async fn list_logs_handler(
    State(state): State<AppState>,
    Path(worker_id): Path<String>,
) -> ApiResult<Json<Vec<TerminationLogEntry>>> {
    let correlation_id = begin("list_termination_logs");
    let logs = state
        .store()
        .list_termination_logs(&worker_id)
        .await
        .map_err(fail(correlation_id))?;
    Ok(Json(logs))
}

/// Handler for POST /workers/:worker_id/reviews.
async fn record_review_handler(
    State(state): State<AppState>,
    Path(worker_id): Path<String>,
    payload: Result<Json<ReviewRequest>, JsonRejection>,
) -> ApiResult<Json<ReviewCounts>> {
    let correlation_id = begin("record_review");
    let request = read_json(payload, correlation_id)?;
    let counts = state
        .store()
        .record_review(&worker_id, request.stars)
        .await
        .map_err(fail(correlation_id))?;
    Ok(Json(counts))
}

/// Handler for GET /workers/:worker_id/audit.
async fn audit_handler(
    State(state): State<AppState>,
    Path(worker_id): Path<String>,
) -> ApiResult<Json<AuditReport>> {
    let correlation_id = begin("audit");
    let report = run_audit(&state, &worker_id, AuditRequest::default(), correlation_id).await?;
    Ok(Json(report))
}

/// Handler for POST /workers/:worker_id/audit.
///
/// The body may fix the evaluation time and supply expected payouts.
async fn audit_with_options_handler(
    State(state): State<AppState>,
    Path(worker_id): Path<String>,
    payload: Result<Json<AuditRequest>, JsonRejection>,
) -> ApiResult<Json<AuditReport>> {
    let correlation_id = begin("audit");
    let request = read_json(payload, correlation_id)?;
    let report = run_audit(&state, &worker_id, request, correlation_id).await?;
    Ok(Json(report))
}

/// Handler for GET /workers/:worker_id/audit/export.
///
/// Returns the report as a file attachment.
async fn export_handler(
    State(state): State<AppState>,
    Path(worker_id): Path<String>,
    Query(query): Query<ExportQuery>,
) -> ApiResult<Response> {
    let correlation_id = begin("export");
    let format = match query.format.as_deref() {
        Some(format) => format.parse::<ReportFormat>().map_err(fail(correlation_id))?,
        None => ReportFormat::default(),
    };
    let request = AuditRequest {
        evaluated_at: query.at,
        expected_payouts: None,
    };
    let report = run_audit(&state, &worker_id, request, correlation_id).await?;
    let exported = render(&report, format).map_err(fail(correlation_id))?;

    info!(
        correlation_id = %correlation_id,
        worker_id = %worker_id,
        format = %format,
        bytes = exported.body.len(),
        "Report exported"
    );
    Ok((
        [
            (header::CONTENT_TYPE, exported.content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", exported.filename),
            ),
        ],
        exported.body,
    )
        .into_response())
}

async fn run_audit(
    state: &AppState,
    worker_id: &str,
    request: AuditRequest,
    correlation_id: Uuid,
) -> ApiResult<AuditReport> {
    let evaluated_at = request.evaluated_at.unwrap_or_else(Utc::now);
    let baseline: Option<&dyn PayoutBaseline> = match &request.expected_payouts {
        Some(expected) => Some(expected as &dyn PayoutBaseline),
        None => state.rate_card().map(|card| card as &dyn PayoutBaseline),
    };

    let start_time = Instant::now();
    let report = audit_worker(state.store(), worker_id, evaluated_at, baseline)
        .await
        .map_err(fail(correlation_id))?;
    info!(
        correlation_id = %correlation_id,
        worker_id = %worker_id,
        baseline = baseline.map(|b| b.name()).unwrap_or("none"),
        duration_us = start_time.elapsed().as_micros(),
        "Audit completed"
    );
    Ok(report)
}

/// Handler for POST /orders.
async fn create_order_handler(
    State(state): State<AppState>,
    payload: Result<Json<Order>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Order>)> {
    let correlation_id = begin("create_order");
    let order = read_json(payload, correlation_id)?;
    state
        .store()
        .create_order(&order)
        .await
        .map_err(fail(correlation_id))?;
    info!(
        correlation_id = %correlation_id,
        order_id = %order.order_id,
        worker_id = %order.worker_id,
        "Order recorded"
    );
    Ok((StatusCode::CREATED, Json(order)))
}

/// Handler for GET /orders/:order_id.
async fn get_order_handler(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> ApiResult<Json<Order>> {
    let correlation_id = begin("get_order");
    let order = state
        .store()
        .get_order(&order_id)
        .await
        .map_err(fail(correlation_id))?;
    Ok(Json(order))
}

/// Handler for DELETE /orders/:order_id.
async fn delete_order_handler(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> ApiResult<StatusCode> {
    let correlation_id = begin("delete_order");
    state
        .store()
        .delete_order(&order_id)
        .await
        .map_err(fail(correlation_id))?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for POST /orders/:order_id/correction.
async fn correct_order_handler(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
    payload: Result<Json<OrderCorrection>, JsonRejection>,
) -> ApiResult<Json<Order>> {
    let correlation_id = begin("correct_order");
    let correction = read_json(payload, correlation_id)?;
    let order = state
        .store()
        .correct_order_compliance(&order_id, &correction)
        .await
        .map_err(fail(correlation_id))?;
    Ok(Json(order))
}

/// Handler for PUT /termination_status.
async fn upsert_status_handler(
    State(state): State<AppState>,
    payload: Result<Json<TerminationStatus>, JsonRejection>,
) -> ApiResult<Json<TerminationStatus>> {
    let correlation_id = begin("upsert_termination_status");
    let status = read_json(payload, correlation_id)?;
    let status = state
        .store()
        .upsert_termination_status(&status)
        .await
        .map_err(fail(correlation_id))?;
    Ok(Json(status))
}

/// Handler for GET /termination_status/:worker_id.
async fn get_status_handler(
    State(state): State<AppState>,
    Path(worker_id): Path<String>,
) -> ApiResult<Json<TerminationStatus>> {
    let correlation_id = begin("get_termination_status");
    let status = state
        .store()
        .get_termination_status(&worker_id)
        .await
        .map_err(fail(correlation_id))?;
    Ok(Json(status))
}

/// Handler for POST /termination_logs.
async fn append_log_handler(
    State(state): State<AppState>,
    payload: Result<Json<NewTerminationLog>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<TerminationLogEntry>)> {
    let correlation_id = begin("append_termination_log");
    let entry = read_json(payload, correlation_id)?;
    let entry = state
        .store()
        .append_termination_log(&entry)
        .await
        .map_err(fail(correlation_id))?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// Handler for PUT /review_counts.
async fn upsert_reviews_handler(
    State(state): State<AppState>,
    payload: Result<Json<ReviewCounts>, JsonRejection>,
) -> ApiResult<Json<ReviewCounts>> {
    let correlation_id = begin("upsert_review_counts");
    let counts = read_json(payload, correlation_id)?;
    let counts = state
        .store()
        .upsert_review_counts(&counts)
        .await
        .map_err(fail(correlation_id))?;
    Ok(Json(counts))
}

/// Handler for GET /review_counts/:worker_id.
async fn get_reviews_handler(
    State(state): State<AppState>,
    Path(worker_id): Path<String>,
) -> ApiResult<Json<ReviewCounts>> {
    let correlation_id = begin("get_review_counts");
    let counts = state
        .store()
        .get_review_counts(&worker_id)
        .await
        .map_err(fail(correlation_id))?;
    Ok(Json(counts))
}

/// Handler for POST /grievances.
async fn grievance_handler(
    State(state): State<AppState>,
    payload: Result<Json<GrievanceRequest>, JsonRejection>,
) -> ApiResult<Json<GrievanceAssessment>> {
    let correlation_id = begin("grievance");
    let request = read_json(payload, correlation_id)?;
    request.validate().map_err(fail(correlation_id))?;

    let grievance = Grievance::new(
        request.worker_id,
        request.transcript,
        request.platform_name,
        Utc::now(),
    )
    .map_err(fail(correlation_id))?;
    let assessment = assess_grievance(state.store(), state.validator(), grievance)
        .await
        .map_err(fail(correlation_id))?;

    info!(
        correlation_id = %correlation_id,
        grievance_id = %assessment.grievance.grievance_id,
        decision = %assessment.final_decision,
        "Grievance answered"
    );
    Ok(Json(assessment))
}

/// Handler for POST /simulator/seed.
async fn seed_handler(
    State(state): State<AppState>,
    payload: Result<Json<Dataset>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ImportSummary>)> {
    let correlation_id = begin("seed");
    let dataset = read_json(payload, correlation_id)?;
    let summary = seed(state.store(), &InlineSource::new(dataset))
        .await
        .map_err(fail(correlation_id))?;
    info!(correlation_id = %correlation_id, rows = summary.total(), "Dataset seeded");
    Ok((StatusCode::CREATED, Json(summary)))
}
