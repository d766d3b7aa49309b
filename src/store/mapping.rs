//! Row mapping between SQLite rows and domain models.

use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::error::{AuditError, AuditResult};
use crate::models::{
    Order, ReviewCounts, TerminationLogEntry, TerminationStatus, Worker, WorkerStatus,
};

pub(crate) const WORKER_COLUMNS: &str =
    "worker_id, name, phone, email, joined_at, current_status, notes";

pub(crate) const ORDER_COLUMNS: &str = "order_id, worker_id, order_date, distance_km, duration_min, \
     payout_amount, status, flags, payment_compliant, reduction_reason";

pub(crate) const STATUS_COLUMNS: &str = "worker_id, is_terminated, terminated_at, \
     termination_reason_code, termination_reason_text, appeal_allowed, appeal_deadline";

pub(crate) const LOG_COLUMNS: &str = "log_id, worker_id, logged_at, reason_code, reason_text, \
     related_order_id, evidence, severity, action_taken, recorded_by";

pub(crate) const REVIEW_COLUMNS: &str =
    "worker_id, count_5, count_4, count_3, count_2, count_1, total_reviews";

/// Converts a payout to the REAL stored in SQLite.
pub(crate) fn money_to_real(amount: Decimal) -> AuditResult<f64> {
    amount
        .to_f64()
        .ok_or_else(|| AuditError::invalid("payout_amount", format!("{} is out of range", amount)))
}

/// Converts a stored REAL back to a two-decimal-place amount.
pub(crate) fn real_to_money(value: f64) -> AuditResult<Decimal> {
    let mut amount = Decimal::from_f64(value)
        .ok_or_else(|| AuditError::invalid("payout_amount", format!("{} is not a number", value)))?
        .round_dp(2);
    amount.rescale(2);
    Ok(amount)
}

pub(crate) fn row_to_worker(row: &SqliteRow) -> AuditResult<Worker> {
    let status: String = row.try_get("current_status")?;
    Ok(Worker {
        worker_id: row.try_get("worker_id")?,
        name: row.try_get("name")?,
        phone: row.try_get("phone")?,
        email: row.try_get("email")?,
        joined_at: row.try_get("joined_at")?,
        current_status: status.parse::<WorkerStatus>()?,
        notes: row.try_get("notes")?,
    })
}

pub(crate) fn row_to_order(row: &SqliteRow) -> AuditResult<Order> {
    Ok(Order {
        order_id: row.try_get("order_id")?,
        worker_id: row.try_get("worker_id")?,
        order_date: row.try_get("order_date")?,
        distance_km: row.try_get("distance_km")?,
        duration_min: row.try_get("duration_min")?,
        payout_amount: real_to_money(row.try_get("payout_amount")?)?,
        status: row.try_get("status")?,
        flags: row.try_get("flags")?,
        payment_compliant: row.try_get("payment_compliant")?,
        reduction_reason: row.try_get("reduction_reason")?,
    })
}

pub(crate) fn row_to_status(row: &SqliteRow) -> AuditResult<TerminationStatus> {
    Ok(TerminationStatus {
        worker_id: row.try_get("worker_id")?,
        is_terminated: row.try_get("is_terminated")?,
        terminated_at: row.try_get("terminated_at")?,
        termination_reason_code: row.try_get("termination_reason_code")?,
        termination_reason_text: row.try_get("termination_reason_text")?,
        appeal_allowed: row.try_get("appeal_allowed")?,
        appeal_deadline: row.try_get("appeal_deadline")?,
    })
}

pub(crate) fn row_to_log(row: &SqliteRow) -> AuditResult<TerminationLogEntry> {
    Ok(TerminationLogEntry {
        log_id: row.try_get("log_id")?,
        worker_id: row.try_get("worker_id")?,
        logged_at: row.try_get("logged_at")?,
        reason_code: row.try_get("reason_code")?,
        reason_text: row.try_get("reason_text")?,
        related_order_id: row.try_get("related_order_id")?,
        evidence: row.try_get("evidence")?,
        severity: row.try_get("severity")?,
        action_taken: row.try_get("action_taken")?,
        recorded_by: row.try_get("recorded_by")?,
    })
}

pub(crate) fn row_to_reviews(row: &SqliteRow) -> AuditResult<ReviewCounts> {
    Ok(ReviewCounts {
        worker_id: row.try_get("worker_id")?,
        count_5: row.try_get("count_5")?,
        count_4: row.try_get("count_4")?,
        count_3: row.try_get("count_3")?,
        count_2: row.try_get("count_2")?,
        count_1: row.try_get("count_1")?,
        total_reviews: row.try_get("total_reviews")?,
    })
}

/// Maps a failed INSERT to a domain error.
pub(crate) fn insert_error(error: sqlx::Error, entity: &'static str, id: &str) -> AuditError {
    match &error {
        sqlx::Error::Database(db) if db.is_unique_violation() => AuditError::AlreadyExists {
            entity,
            id: id.to_string(),
        },
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            AuditError::invalid(entity, format!("'{}' references a row that does not exist", id))
        }
        _ => AuditError::Storage(error),
    }
}
