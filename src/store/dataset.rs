//! Whole-worker reads, full snapshots and bulk dataset import.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::AuditResult;
use crate::models::{Dataset, Snapshot, WorkerRecords};

use super::Store;
use super::mapping::{
    LOG_COLUMNS, ORDER_COLUMNS, REVIEW_COLUMNS, STATUS_COLUMNS, WORKER_COLUMNS, row_to_log,
    row_to_order, row_to_reviews, row_to_status, row_to_worker,
};
use super::orders::{insert_order, orders_for_worker};
use super::reviews::{fetch_reviews, write_reviews};
use super::termination::{fetch_status, insert_log, logs_for_worker, write_status};
use super::workers::{insert_worker, require_worker};

/// Number of rows written per table by [`Store::import_dataset`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    /// Worker rows.
    pub workers: usize,
    /// Order rows.
    pub orders: usize,
    /// Termination status rows.
    pub termination_status: usize,
    /// Termination log rows.
    pub termination_logs: usize,
    /// Review count rows.
    pub review_counts: usize,
}

impl ImportSummary {
    /// Total rows written.
    pub fn total(&self) -> usize {
        self.workers
            + self.orders
            + self.termination_status
            + self.termination_logs
            + self.review_counts
    }
}

impl Store {
    /// Reads everything stored about one worker in a single transaction.
    ///
    /// Orders are newest first; termination logs are oldest first.
    pub async fn load_worker_records(&self, worker_id: &str) -> AuditResult<WorkerRecords> {
        let mut tx = self.pool.begin().await?;
        let worker = require_worker(&mut tx, worker_id).await?;
        let orders = orders_for_worker(&mut tx, worker_id).await?;
        let termination_status = fetch_status(&mut tx, worker_id).await?;
        let termination_logs = logs_for_worker(&mut tx, worker_id).await?;
        let review_counts = fetch_reviews(&mut tx, worker_id).await?;
        tx.commit().await?;

        Ok(WorkerRecords {
            worker,
            orders,
            termination_status,
            termination_logs,
            review_counts,
        })
    }

    /// Returns every row of every table.
    pub async fn snapshot(&self) -> AuditResult<Snapshot> {
        let mut tx = self.pool.begin().await?;

        let sql = format!("SELECT {} FROM workers ORDER BY worker_id", WORKER_COLUMNS);
        let workers = sqlx::query(&sql).fetch_all(&mut *tx).await?;
        let sql = format!("SELECT {} FROM orders ORDER BY order_id", ORDER_COLUMNS);
        let orders = sqlx::query(&sql).fetch_all(&mut *tx).await?;
        let sql = format!(
            "SELECT {} FROM termination_status ORDER BY worker_id",
            STATUS_COLUMNS
        );
        let statuses = sqlx::query(&sql).fetch_all(&mut *tx).await?;
        let sql = format!("SELECT {} FROM termination_logs ORDER BY log_id", LOG_COLUMNS);
        let logs = sqlx::query(&sql).fetch_all(&mut *tx).await?;
        let sql = format!(
            "SELECT {} FROM review_counts ORDER BY worker_id",
            REVIEW_COLUMNS
        );
        let reviews = sqlx::query(&sql).fetch_all(&mut *tx).await?;
        tx.commit().await?;

        Ok(Snapshot {
            workers: workers.iter().map(row_to_worker).collect::<AuditResult<_>>()?,
            orders: orders.iter().map(row_to_order).collect::<AuditResult<_>>()?,
            termination_status: statuses.iter().map(row_to_status).collect::<AuditResult<_>>()?,
            termination_logs: logs.iter().map(row_to_log).collect::<AuditResult<_>>()?,
            review_counts: reviews.iter().map(row_to_reviews).collect::<AuditResult<_>>()?,
        })
    }

    /// Imports a dataset in one transaction.
    ///
    /// Rows are written as given: termination status rows are not
    /// normalised and stored review totals are kept, so the audit can report
    /// inconsistent source data. Nothing is written if any row fails.
    pub async fn import_dataset(&self, dataset: &Dataset) -> AuditResult<ImportSummary> {
        for worker in &dataset.workers {
            worker.validate()?;
        }
        for order in &dataset.orders {
            order.validate()?;
        }
        for entry in &dataset.termination_logs {
            entry.validate()?;
        }
        for counts in &dataset.review_counts {
            counts.validate()?;
        }

        let mut tx = self.pool.begin().await?;
        for worker in &dataset.workers {
            insert_worker(&mut tx, worker).await?;
        }
        for order in &dataset.orders {
            insert_order(&mut tx, order).await?;
        }
        for status in &dataset.termination_status {
            write_status(&mut tx, status).await?;
        }
        for entry in &dataset.termination_logs {
            insert_log(&mut tx, entry).await?;
        }
        for counts in &dataset.review_counts {
            write_reviews(&mut tx, counts).await?;
        }
        tx.commit().await?;

        let summary = ImportSummary {
            workers: dataset.workers.len(),
            orders: dataset.orders.len(),
            termination_status: dataset.termination_status.len(),
            termination_logs: dataset.termination_logs.len(),
            review_counts: dataset.review_counts.len(),
        };
        info!(
            workers = summary.workers,
            orders = summary.orders,
            termination_logs = summary.termination_logs,
            "Dataset imported"
        );
        Ok(summary)
    }
}
