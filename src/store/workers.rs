//! Worker rows: registration, status transitions, note fields and deletion.

use serde_json::{Map, Value};
use sqlx::SqliteConnection;
use tracing::{debug, info};

use crate::error::{AuditError, AuditResult};
use crate::models::{Worker, WorkerStatus};

use super::Store;
use super::mapping::{WORKER_COLUMNS, insert_error, row_to_worker};
use super::termination::fetch_status;

/// Key under which notes that were not a JSON object are preserved.
pub const RAW_NOTES_KEY: &str = "__raw_notes";

/// Tables whose rows keep a worker from being deleted.
const WORKER_DEPENDENTS: [&str; 4] = [
    "orders",
    "termination_status",
    "termination_logs",
    "review_counts",
];

impl Store {
    /// Registers a new worker.
    ///
    /// Fails with `AlreadyExists` when the id is taken. A worker cannot be
    /// registered as `terminated`; use [`Store::terminate_worker`] so the
    /// decision is recorded.
    pub async fn create_worker(&self, worker: &Worker) -> AuditResult<()> {
        worker.validate()?;
        if worker.current_status == WorkerStatus::Terminated {
            return Err(terminate_separately());
        }
        let mut conn = self.pool.acquire().await?;
        insert_worker(&mut conn, worker).await?;

        info!(worker_id = %worker.worker_id, status = %worker.current_status, "Worker registered");
        Ok(())
    }

    /// Fetches a worker by id.
    pub async fn get_worker(&self, worker_id: &str) -> AuditResult<Worker> {
        let mut conn = self.pool.acquire().await?;
        require_worker(&mut conn, worker_id).await
    }

    /// Lists every worker, most recently joined first.
    pub async fn list_workers(&self) -> AuditResult<Vec<Worker>> {
        let sql = format!(
            "SELECT {} FROM workers ORDER BY joined_at DESC, worker_id",
            WORKER_COLUMNS
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter().map(row_to_worker).collect()
    }

    /// Moves a worker to `next`, enforcing the status transition table.
    ///
    /// Termination goes through [`Store::terminate_worker`]. While a
    /// termination decision is in force the worker may only be put
    /// `under_review`; [`Store::reinstate_worker`] lifts the decision.
    pub async fn transition_worker_status(
        &self,
        worker_id: &str,
        next: WorkerStatus,
    ) -> AuditResult<Worker> {
        if next == WorkerStatus::Terminated {
            return Err(terminate_separately());
        }

        let mut tx = self.pool.begin().await?;
        let worker = require_worker(&mut tx, worker_id).await?;
        let decision_in_force = fetch_status(&mut tx, worker_id)
            .await?
            .is_some_and(|status| status.is_terminated);
        if decision_in_force
            && worker.current_status.can_transition_to(next)
            && !next.agrees_with_termination(true)
        {
            return Err(AuditError::invalid(
                "status",
                format!(
                    "worker {} has a termination decision in force; reinstate them instead",
                    worker_id
                ),
            ));
        }
        let worker = apply_transition(&mut tx, worker, next).await?;
        tx.commit().await?;
        Ok(worker)
    }

    /// Sets one free-form field in the worker's notes object.
    pub async fn set_worker_note_field(
        &self,
        worker_id: &str,
        key: &str,
        value: Value,
    ) -> AuditResult<Worker> {
        let key = note_key(key)?;
        self.edit_notes(worker_id, |fields| {
            fields.insert(key.to_string(), value);
        })
        .await
    }

    /// Removes one free-form field from the worker's notes object.
    ///
    /// Removing a field that is not present leaves the notes unchanged.
    pub async fn remove_worker_note_field(&self, worker_id: &str, key: &str) -> AuditResult<Worker> {
        let key = note_key(key)?;
        self.edit_notes(worker_id, |fields| {
            fields.remove(key);
        })
        .await
    }

    async fn edit_notes<F>(&self, worker_id: &str, edit: F) -> AuditResult<Worker>
    where
        F: FnOnce(&mut Map<String, Value>),
    {
        let mut tx = self.pool.begin().await?;
        let mut worker = require_worker(&mut tx, worker_id).await?;

        let mut fields = parse_notes(worker.notes.as_deref());
        edit(&mut fields);
        worker.notes = if fields.is_empty() {
            None
        } else {
            Some(Value::Object(fields).to_string())
        };

        sqlx::query("UPDATE workers SET notes = ? WHERE worker_id = ?")
            .bind(&worker.notes)
            .bind(worker_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        debug!(worker_id, "Worker notes updated");
        Ok(worker)
    }

    /// Deletes a worker that nothing references any more.
    ///
    /// Fails with `ReferencedRecord` naming the dependent tables otherwise.
    pub async fn delete_worker(&self, worker_id: &str) -> AuditResult<()> {
        let mut tx = self.pool.begin().await?;
        require_worker(&mut tx, worker_id).await?;

        let mut dependents = Vec::new();
        for table in WORKER_DEPENDENTS {
            let sql = format!("SELECT COUNT(*) FROM {} WHERE worker_id = ?", table);
            let count: i64 = sqlx::query_scalar(&sql)
                .bind(worker_id)
                .fetch_one(&mut *tx)
                .await?;
            if count > 0 {
                dependents.push(table);
            }
        }
        if !dependents.is_empty() {
            return Err(AuditError::ReferencedRecord {
                entity: "worker",
                id: worker_id.to_string(),
                dependents: dependents.join(", "),
            });
        }

        sqlx::query("DELETE FROM workers WHERE worker_id = ?")
            .bind(worker_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        info!(worker_id, "Worker deleted");
        Ok(())
    }
}

pub(crate) async fn insert_worker(conn: &mut SqliteConnection, worker: &Worker) -> AuditResult<()> {
    let sql = format!(
        "INSERT INTO workers ({}) VALUES (?, ?, ?, ?, ?, ?, ?)",
        WORKER_COLUMNS
    );
    sqlx::query(&sql)
        .bind(&worker.worker_id)
        .bind(&worker.name)
        .bind(&worker.phone)
        .bind(&worker.email)
        .bind(worker.joined_at)
        .bind(worker.current_status.as_str())
        .bind(&worker.notes)
        .execute(&mut *conn)
        .await
        .map_err(|e| insert_error(e, "worker", &worker.worker_id))?;
    Ok(())
}

pub(crate) async fn fetch_worker(
    conn: &mut SqliteConnection,
    worker_id: &str,
) -> AuditResult<Option<Worker>> {
    let sql = format!("SELECT {} FROM workers WHERE worker_id = ?", WORKER_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(worker_id)
        .fetch_optional(&mut *conn)
        .await?;
    row.as_ref().map(row_to_worker).transpose()
}

pub(crate) async fn require_worker(
    conn: &mut SqliteConnection,
    worker_id: &str,
) -> AuditResult<Worker> {
    fetch_worker(conn, worker_id)
        .await?
        .ok_or_else(|| AuditError::not_found("worker", worker_id))
}

/// Checks and writes a status change for an already-loaded worker.
pub(crate) async fn apply_transition(
    conn: &mut SqliteConnection,
    mut worker: Worker,
    next: WorkerStatus,
) -> AuditResult<Worker> {
    let from = worker.current_status;
    if !from.can_transition_to(next) {
        return Err(AuditError::InvalidStatusTransition {
            worker_id: worker.worker_id,
            from,
            to: next,
        });
    }

    sqlx::query("UPDATE workers SET current_status = ? WHERE worker_id = ?")
        .bind(next.as_str())
        .bind(&worker.worker_id)
        .execute(&mut *conn)
        .await?;

    info!(worker_id = %worker.worker_id, %from, to = %next, "Worker status changed");
    worker.current_status = next;
    Ok(worker)
}

fn terminate_separately() -> AuditError {
    AuditError::invalid(
        "status",
        "workers are terminated through the terminate operation so the decision is recorded",
    )
}

fn note_key(key: &str) -> AuditResult<&str> {
    let key = key.trim();
    if key.is_empty() {
        return Err(AuditError::invalid("field", "name must not be empty"));
    }
    Ok(key)
}

/// Reads the notes column as a JSON object of free fields.
pub fn parse_notes(notes: Option<&str>) -> Map<String, Value> {
    let Some(text) = notes.map(str::trim).filter(|text| !text.is_empty()) else {
        return Map::new();
    };
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(fields)) => fields,
        _ => {
            let mut fields = Map::new();
            fields.insert(RAW_NOTES_KEY.to_string(), Value::String(text.to_string()));
            fields
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::{at, order, worker};
    use serde_json::json;

    #[tokio::test]
    async fn test_create_and_get_worker() {
        let store = Store::in_memory().await.unwrap();
        let mut w1 = worker("W1");
        w1.phone = Some("+91-9000000001".to_string());
        store.create_worker(&w1).await.unwrap();

        let loaded = store.get_worker("W1").await.unwrap();
        assert_eq!(loaded, w1);
    }

    #[tokio::test]
    async fn test_duplicate_worker_is_rejected() {
        let store = Store::in_memory().await.unwrap();
        store.create_worker(&worker("W1")).await.unwrap();

        let result = store.create_worker(&worker("W1")).await;
        assert!(matches!(
            result,
            Err(AuditError::AlreadyExists { entity: "worker", .. })
        ));
    }

    #[tokio::test]
    async fn test_get_missing_worker_is_not_found() {
        let store = Store::in_memory().await.unwrap();
        let result = store.get_worker("W404").await;
        match result {
            Err(AuditError::NotFound { entity, id }) => {
                assert_eq!(entity, "worker");
                assert_eq!(id, "W404");
            }
            other => panic!("Expected NotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_list_workers_newest_first() {
        let store = Store::in_memory().await.unwrap();
        let mut early = worker("W1");
        early.joined_at = at(1, 8);
        let mut late = worker("W2");
        late.joined_at = at(5, 8);
        store.create_worker(&early).await.unwrap();
        store.create_worker(&late).await.unwrap();

        let ids: Vec<String> = store
            .list_workers()
            .await
            .unwrap()
            .into_iter()
            .map(|w| w.worker_id)
            .collect();
        assert_eq!(ids, vec!["W2", "W1"]);
    }

    #[tokio::test]
    async fn test_transition_follows_table() {
        let store = Store::in_memory().await.unwrap();
        store.create_worker(&worker("W1")).await.unwrap();

        let suspended = store
            .transition_worker_status("W1", WorkerStatus::Suspended)
            .await
            .unwrap();
        assert_eq!(suspended.current_status, WorkerStatus::Suspended);

        let result = store
            .transition_worker_status("W1", WorkerStatus::Active)
            .await;
        assert!(matches!(
            result,
            Err(AuditError::InvalidStatusTransition {
                from: WorkerStatus::Suspended,
                to: WorkerStatus::Active,
                ..
            })
        ));
        assert_eq!(
            store.get_worker("W1").await.unwrap().current_status,
            WorkerStatus::Suspended
        );
    }

    #[tokio::test]
    async fn test_terminated_is_not_a_plain_transition() {
        let store = Store::in_memory().await.unwrap();
        store.create_worker(&worker("W5")).await.unwrap();

        let result = store
            .transition_worker_status("W5", WorkerStatus::Terminated)
            .await;
        assert!(matches!(result, Err(AuditError::InvalidRecord { .. })));
        assert_eq!(
            store.get_worker("W5").await.unwrap().current_status,
            WorkerStatus::Active
        );
    }

    #[tokio::test]
    async fn test_worker_cannot_be_registered_terminated() {
        let store = Store::in_memory().await.unwrap();
        let mut w5 = worker("W5");
        w5.current_status = WorkerStatus::Terminated;

        assert!(matches!(
            store.create_worker(&w5).await,
            Err(AuditError::InvalidRecord { .. })
        ));
        assert!(store.get_worker("W5").await.is_err());
    }

    #[tokio::test]
    async fn test_note_fields_are_added_and_removed() {
        let store = Store::in_memory().await.unwrap();
        store.create_worker(&worker("W1")).await.unwrap();

        store
            .set_worker_note_field("W1", "vehicle", json!("scooter"))
            .await
            .unwrap();
        let updated = store
            .set_worker_note_field("W1", "zone", json!(4))
            .await
            .unwrap();
        let fields = parse_notes(updated.notes.as_deref());
        assert_eq!(fields["vehicle"], "scooter");
        assert_eq!(fields["zone"], 4);

        let updated = store.remove_worker_note_field("W1", "vehicle").await.unwrap();
        let fields = parse_notes(updated.notes.as_deref());
        assert!(!fields.contains_key("vehicle"));
        assert_eq!(fields.len(), 1);
    }

    #[tokio::test]
    async fn test_plain_text_notes_are_preserved() {
        let store = Store::in_memory().await.unwrap();
        let mut w1 = worker("W1");
        w1.notes = Some("prefers morning shifts".to_string());
        store.create_worker(&w1).await.unwrap();

        let updated = store
            .set_worker_note_field("W1", "zone", json!("north"))
            .await
            .unwrap();
        let fields = parse_notes(updated.notes.as_deref());
        assert_eq!(fields["__raw_notes"], "prefers morning shifts");
        assert_eq!(fields["zone"], "north");
    }

    #[tokio::test]
    async fn test_blank_field_name_is_rejected() {
        let store = Store::in_memory().await.unwrap();
        store.create_worker(&worker("W1")).await.unwrap();
        let result = store.set_worker_note_field("W1", "  ", json!(1)).await;
        assert!(matches!(result, Err(AuditError::InvalidRecord { .. })));
    }

    #[tokio::test]
    async fn test_delete_unreferenced_worker() {
        let store = Store::in_memory().await.unwrap();
        store.create_worker(&worker("W1")).await.unwrap();
        store.delete_worker("W1").await.unwrap();
        assert!(store.get_worker("W1").await.is_err());
    }

    #[tokio::test]
    async fn test_delete_referenced_worker_is_restricted() {
        let store = Store::in_memory().await.unwrap();
        store.create_worker(&worker("W1")).await.unwrap();
        store
            .create_order(&order("O1", "W1", 100, true, None))
            .await
            .unwrap();
        store.record_review("W1", 5).await.unwrap();

        match store.delete_worker("W1").await {
            Err(AuditError::ReferencedRecord { dependents, .. }) => {
                assert_eq!(dependents, "orders, review_counts");
            }
            other => panic!("Expected ReferencedRecord, got {:?}", other),
        }
        assert!(store.get_worker("W1").await.is_ok());
    }

    #[test]
    fn test_parse_notes_handles_empty_and_objects() {
        assert!(parse_notes(None).is_empty());
        assert!(parse_notes(Some("  ")).is_empty());
        let fields = parse_notes(Some(r#"{"zone": "east"}"#));
        assert_eq!(fields["zone"], "east");
    }
}
