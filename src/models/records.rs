//! Aggregates of stored rows: one worker's records, a full snapshot, and an
//! importable dataset.

use serde::{Deserialize, Serialize};

use super::{NewTerminationLog, Order, ReviewCounts, TerminationLogEntry, TerminationStatus, Worker};

/// Everything stored about one worker, read at a single point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerRecords {
    /// The worker row.
    pub worker: Worker,
    /// The worker's orders, newest first.
    pub orders: Vec<Order>,
    /// The termination status row, if one exists.
    pub termination_status: Option<TerminationStatus>,
    /// Termination log entries in chronological order.
    pub termination_logs: Vec<TerminationLogEntry>,
    /// The review count row, if one exists.
    pub review_counts: Option<ReviewCounts>,
}

impl WorkerRecords {
    /// Records for a worker with nothing else stored yet.
    pub fn for_worker(worker: Worker) -> Self {
        Self {
            worker,
            orders: Vec::new(),
            termination_status: None,
            termination_logs: Vec::new(),
            review_counts: None,
        }
    }

    /// Returns the most recent order, if any.
    pub fn latest_order(&self) -> Option<&Order> {
        self.orders.iter().max_by_key(|order| order.order_date)
    }

    /// Returns true if the termination row marks the worker as terminated.
    pub fn is_terminated(&self) -> bool {
        self.termination_status
            .as_ref()
            .is_some_and(|status| status.is_terminated)
    }
}

/// Every row of every table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// All workers.
    pub workers: Vec<Worker>,
    /// All orders.
    pub orders: Vec<Order>,
    /// All termination status rows.
    pub termination_status: Vec<TerminationStatus>,
    /// All termination log entries.
    pub termination_logs: Vec<TerminationLogEntry>,
    /// All review count rows.
    pub review_counts: Vec<ReviewCounts>,
}

/// Platform data to be imported verbatim into the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    /// Workers to create.
    #[serde(default)]
    pub workers: Vec<Worker>,
    /// Orders to create.
    #[serde(default)]
    pub orders: Vec<Order>,
    /// Termination status rows to write.
    #[serde(default)]
    pub termination_status: Vec<TerminationStatus>,
    /// Termination log entries to append.
    #[serde(default)]
    pub termination_logs: Vec<NewTerminationLog>,
    /// Review count rows to write, totals included as given.
    #[serde(default)]
    pub review_counts: Vec<ReviewCounts>,
}

impl Dataset {
    /// Total number of rows in the dataset.
    pub fn row_count(&self) -> usize {
        self.workers.len()
            + self.orders.len()
            + self.termination_status.len()
            + self.termination_logs.len()
            + self.review_counts.len()
    }
}
