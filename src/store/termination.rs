//! Termination status rows and the append-only termination log.

use sqlx::SqliteConnection;
use tracing::{info, warn};

use crate::error::{AuditError, AuditResult};
use crate::models::{
    NewTerminationLog, TerminationDecision, TerminationLogEntry, TerminationStatus, Worker,
    WorkerStatus, sort_chronologically,
};

use super::Store;
use super::mapping::{LOG_COLUMNS, STATUS_COLUMNS, insert_error, row_to_log, row_to_status};
use super::orders::fetch_order;
use super::workers::{apply_transition, require_worker};

impl Store {
    /// Inserts or replaces a worker's termination status row.
    ///
    /// A row with `is_terminated = false` is stored with every other
    /// termination field cleared. The worker's `current_status` is left
    /// alone; use [`Store::terminate_worker`] or [`Store::reinstate_worker`]
    /// to change both together.
    pub async fn upsert_termination_status(
        &self,
        status: &TerminationStatus,
    ) -> AuditResult<TerminationStatus> {
        let status = status.clone().normalized();
        let mut tx = self.pool.begin().await?;
        let worker = require_worker(&mut tx, &status.worker_id).await?;
        write_status(&mut tx, &status).await?;
        tx.commit().await?;

        if !worker.current_status.agrees_with_termination(status.is_terminated) {
            warn!(
                worker_id = %status.worker_id,
                is_terminated = status.is_terminated,
                current_status = %worker.current_status,
                "Termination status disagrees with worker status"
            );
        }
        Ok(status)
    }

    /// Fetches a worker's termination status row.
    pub async fn get_termination_status(&self, worker_id: &str) -> AuditResult<TerminationStatus> {
        let mut conn = self.pool.acquire().await?;
        fetch_status(&mut conn, worker_id)
            .await?
            .ok_or_else(|| AuditError::not_found("termination_status", worker_id))
    }

    /// Terminates a worker: records the decision and moves the worker to
    /// `terminated` in one transaction.
    pub async fn terminate_worker(
        &self,
        worker_id: &str,
        decision: TerminationDecision,
    ) -> AuditResult<TerminationStatus> {
        if let Some(deadline) = decision.appeal_deadline {
            if deadline < decision.terminated_at {
                return Err(AuditError::invalid(
                    "appeal_deadline",
                    "must not be earlier than terminated_at",
                ));
            }
        }

        let mut tx = self.pool.begin().await?;
        let worker = require_worker(&mut tx, worker_id).await?;
        apply_transition(&mut tx, worker, WorkerStatus::Terminated).await?;
        let status = decision.into_status(worker_id);
        write_status(&mut tx, &status).await?;
        tx.commit().await?;

        info!(
            worker_id,
            reason_code = status.termination_reason_code.as_deref().unwrap_or("-"),
            appeal_allowed = status.appeal_allowed,
            "Worker terminated"
        );
        Ok(status)
    }

    /// Reinstates a worker: clears the termination status row and moves the
    /// worker to `reinstated` in one transaction.
    pub async fn reinstate_worker(&self, worker_id: &str) -> AuditResult<Worker> {
        let mut tx = self.pool.begin().await?;
        let worker = require_worker(&mut tx, worker_id).await?;
        let worker = apply_transition(&mut tx, worker, WorkerStatus::Reinstated).await?;
        write_status(&mut tx, &TerminationStatus::not_terminated(worker_id)).await?;
        tx.commit().await?;

        info!(worker_id, "Worker reinstated");
        Ok(worker)
    }

    /// Appends an entry to the termination log and returns it with its new id.
    ///
    /// The worker must exist, as must the related order when one is given.
    pub async fn append_termination_log(
        &self,
        entry: &NewTerminationLog,
    ) -> AuditResult<TerminationLogEntry> {
        entry.validate()?;
        let mut tx = self.pool.begin().await?;
        require_worker(&mut tx, &entry.worker_id).await?;
        if let Some(order_id) = &entry.related_order_id {
            if fetch_order(&mut tx, order_id).await?.is_none() {
                return Err(AuditError::not_found("order", order_id.as_str()));
            }
        }
        let log_id = insert_log(&mut tx, entry).await?;
        tx.commit().await?;

        info!(
            log_id,
            worker_id = %entry.worker_id,
            severity = entry.severity,
            "Termination log appended"
        );
        Ok(entry.clone().with_id(log_id))
    }

    /// Lists a worker's termination log entries oldest first, ties broken by
    /// insertion order.
    pub async fn list_termination_logs(
        &self,
        worker_id: &str,
    ) -> AuditResult<Vec<TerminationLogEntry>> {
        let mut conn = self.pool.acquire().await?;
        require_worker(&mut conn, worker_id).await?;
        logs_for_worker(&mut conn, worker_id).await
    }
}

pub(crate) async fn write_status(
    conn: &mut SqliteConnection,
    status: &TerminationStatus,
) -> AuditResult<()> {
    let sql = format!(
        "INSERT INTO termination_status ({}) VALUES (?, ?, ?, ?, ?, ?, ?) \
         ON CONFLICT(worker_id) DO UPDATE SET \
         is_terminated = excluded.is_terminated, \
         terminated_at = excluded.terminated_at, \
         termination_reason_code = excluded.termination_reason_code, \
         termination_reason_text = excluded.termination_reason_text, \
         appeal_allowed = excluded.appeal_allowed, \
         appeal_deadline = excluded.appeal_deadline",
        STATUS_COLUMNS
    );
    sqlx::query(&sql)
        .bind(&status.worker_id)
        .bind(status.is_terminated)
        .bind(status.terminated_at)
        .bind(&status.termination_reason_code)
        .bind(&status.termination_reason_text)
        .bind(status.appeal_allowed)
        .bind(status.appeal_deadline)
        .execute(&mut *conn)
        .await
        .map_err(|e| insert_error(e, "termination_status", &status.worker_id))?;
    Ok(())
}

pub(crate) async fn fetch_status(
    conn: &mut SqliteConnection,
    worker_id: &str,
) -> AuditResult<Option<TerminationStatus>> {
    let sql = format!(
        "SELECT {} FROM termination_status WHERE worker_id = ?",
        STATUS_COLUMNS
    );
    let row = sqlx::query(&sql)
        .bind(worker_id)
        .fetch_optional(&mut *conn)
        .await?;
    row.as_ref().map(row_to_status).transpose()
}

/// Inserts a log row and returns its id.
pub(crate) async fn insert_log(
    conn: &mut SqliteConnection,
    entry: &NewTerminationLog,
) -> AuditResult<i64> {
    let result = sqlx::query(
        "INSERT INTO termination_logs (worker_id, logged_at, reason_code, reason_text, \
         related_order_id, evidence, severity, action_taken, recorded_by) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&entry.worker_id)
    .bind(entry.logged_at)
    .bind(&entry.reason_code)
    .bind(&entry.reason_text)
    .bind(&entry.related_order_id)
    .bind(&entry.evidence)
    .bind(entry.severity)
    .bind(&entry.action_taken)
    .bind(&entry.recorded_by)
    .execute(&mut *conn)
    .await
    .map_err(|e| insert_error(e, "termination_log", &entry.worker_id))?;
    Ok(result.last_insert_rowid())
}

pub(crate) async fn logs_for_worker(
    conn: &mut SqliteConnection,
    worker_id: &str,
) -> AuditResult<Vec<TerminationLogEntry>> {
    let sql = format!(
        "SELECT {} FROM termination_logs WHERE worker_id = ? ORDER BY logged_at, log_id",
        LOG_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(worker_id)
        .fetch_all(&mut *conn)
        .await?;
    let mut entries = rows.iter().map(row_to_log).collect::<AuditResult<Vec<_>>>()?;
    // Text ordering in SQLite is not guaranteed to match instant ordering for
    // rows written with other offsets.
    sort_chronologically(&mut entries);
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AppealWindow;
    use crate::store::test_support::{at, log, order, worker};

    async fn store_with_worker(id: &str) -> Store {
        let store = Store::in_memory().await.unwrap();
        store.create_worker(&worker(id)).await.unwrap();
        store
    }

    fn decision() -> TerminationDecision {
        TerminationDecision {
            terminated_at: at(10, 9),
            reason_code: Some("LOW_RATING".to_string()),
            reason_text: Some("Rating dropped below 3.5".to_string()),
            appeal_allowed: true,
            appeal_deadline: Some(at(17, 9)),
        }
    }

    #[tokio::test]
    async fn test_upsert_normalizes_non_terminated_rows() {
        let store = store_with_worker("W1").await;
        let mut status = decision().into_status("W1");
        status.is_terminated = false;

        let stored = store.upsert_termination_status(&status).await.unwrap();
        assert_eq!(stored, TerminationStatus::not_terminated("W1"));
        assert_eq!(store.get_termination_status("W1").await.unwrap(), stored);
    }

    #[tokio::test]
    async fn test_upsert_replaces_existing_row() {
        let store = store_with_worker("W1").await;
        store
            .upsert_termination_status(&TerminationStatus::not_terminated("W1"))
            .await
            .unwrap();
        let terminated = decision().into_status("W1");
        store.upsert_termination_status(&terminated).await.unwrap();

        assert_eq!(store.get_termination_status("W1").await.unwrap(), terminated);
    }

    #[tokio::test]
    async fn test_missing_status_row_is_not_found() {
        let store = store_with_worker("W1").await;
        assert!(matches!(
            store.get_termination_status("W1").await,
            Err(AuditError::NotFound { entity: "termination_status", .. })
        ));
    }

    #[tokio::test]
    async fn test_terminate_and_reinstate_worker() {
        let store = store_with_worker("W2").await;

        let status = store.terminate_worker("W2", decision()).await.unwrap();
        assert!(status.is_terminated);
        assert_eq!(
            store.get_worker("W2").await.unwrap().current_status,
            WorkerStatus::Terminated
        );
        assert!(matches!(
            status.appeal_window(at(20, 9)),
            Some(AppealWindow::Closed { .. })
        ));

        let worker = store.reinstate_worker("W2").await.unwrap();
        assert_eq!(worker.current_status, WorkerStatus::Reinstated);
        assert!(!store.get_termination_status("W2").await.unwrap().is_terminated);
    }

    #[tokio::test]
    async fn test_review_keeps_termination_decision_in_force() {
        let store = store_with_worker("W2").await;
        store.terminate_worker("W2", decision()).await.unwrap();

        let worker = store
            .transition_worker_status("W2", WorkerStatus::UnderReview)
            .await
            .unwrap();
        assert_eq!(worker.current_status, WorkerStatus::UnderReview);
        assert!(store.get_termination_status("W2").await.unwrap().is_terminated);

        let result = store
            .transition_worker_status("W2", WorkerStatus::Active)
            .await;
        assert!(matches!(result, Err(AuditError::InvalidRecord { .. })));

        let worker = store.reinstate_worker("W2").await.unwrap();
        assert_eq!(worker.current_status, WorkerStatus::Reinstated);
        assert!(!store.get_termination_status("W2").await.unwrap().is_terminated);
    }

    #[tokio::test]
    async fn test_terminating_twice_is_an_invalid_transition() {
        let store = store_with_worker("W2").await;
        store.terminate_worker("W2", decision()).await.unwrap();

        let result = store.terminate_worker("W2", decision()).await;
        assert!(matches!(
            result,
            Err(AuditError::InvalidStatusTransition { .. })
        ));
    }

    #[tokio::test]
    async fn test_failed_transition_leaves_status_row_untouched() {
        let store = store_with_worker("W1").await;
        let result = store.reinstate_worker("W1").await;
        assert!(result.is_err());
        assert!(store.get_termination_status("W1").await.is_err());
    }

    #[tokio::test]
    async fn test_deadline_before_termination_is_rejected() {
        let store = store_with_worker("W2").await;
        let mut bad = decision();
        bad.appeal_deadline = Some(at(1, 0));
        assert!(matches!(
            store.terminate_worker("W2", bad).await,
            Err(AuditError::InvalidRecord { .. })
        ));
    }

    #[tokio::test]
    async fn test_append_assigns_increasing_ids() {
        let store = store_with_worker("W2").await;
        let first = store
            .append_termination_log(&log("W2", at(3, 9), "late"))
            .await
            .unwrap();
        let second = store
            .append_termination_log(&log("W2", at(4, 9), "complaint"))
            .await
            .unwrap();
        assert!(second.log_id > first.log_id);
        assert_eq!(second.reason_text.as_deref(), Some("complaint"));
    }

    #[tokio::test]
    async fn test_logs_returned_in_chronological_order() {
        let store = store_with_worker("W2").await;
        for (day, reason) in [(8, "third"), (2, "first"), (5, "second")] {
            store
                .append_termination_log(&log("W2", at(day, 9), reason))
                .await
                .unwrap();
        }

        let reasons: Vec<String> = store
            .list_termination_logs("W2")
            .await
            .unwrap()
            .into_iter()
            .filter_map(|entry| entry.reason_text)
            .collect();
        assert_eq!(reasons, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_log_with_unknown_order_is_rejected() {
        let store = store_with_worker("W2").await;
        let mut entry = log("W2", at(3, 9), "late");
        entry.related_order_id = Some("O404".to_string());

        assert!(matches!(
            store.append_termination_log(&entry).await,
            Err(AuditError::NotFound { entity: "order", .. })
        ));
    }

    #[tokio::test]
    async fn test_log_may_reference_existing_order() {
        let store = store_with_worker("W2").await;
        store
            .create_order(&order("O7", "W2", 60, false, Some("customer complaint")))
            .await
            .unwrap();
        let mut entry = log("W2", at(3, 9), "complaint");
        entry.related_order_id = Some("O7".to_string());

        let stored = store.append_termination_log(&entry).await.unwrap();
        assert_eq!(stored.related_order_id.as_deref(), Some("O7"));
    }
}
