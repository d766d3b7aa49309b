//! Platform simulator.
//!
//! Stands in for a delivery platform by feeding a prepared [`Dataset`] into
//! the store. Datasets come from a [`DatasetSource`]: a fixture file on disk
//! or a dataset already in memory (e.g. posted to the API).
//!
//! # Example
//!
//! ```no_run
//! use gig_audit::simulator::{FixtureSource, seed};
//! use gig_audit::store::Store;
//!
//! # async fn run() -> gig_audit::error::AuditResult<()> {
//! let store = Store::in_memory().await?;
//! let summary = seed(&store, &FixtureSource::new("./fixtures/demo_dataset.yaml")).await?;
//! println!("imported {} rows", summary.total());
//! # Ok(())
//! # }
//! ```

mod fixture;

use tracing::info;

use crate::error::AuditResult;
use crate::models::Dataset;
use crate::store::{ImportSummary, Store};

pub use fixture::{FixtureFormat, FixtureSource};

/// Produces platform data to import.
pub trait DatasetSource: Send + Sync {
    /// Describes where the data comes from, for logs.
    fn describe(&self) -> String;

    /// Produces the dataset.
    fn load(&self) -> AuditResult<Dataset>;
}

/// A dataset that is already in memory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InlineSource {
    dataset: Dataset,
}

impl InlineSource {
    /// Wraps `dataset`.
    pub fn new(dataset: Dataset) -> Self {
        Self { dataset }
    }
}

impl DatasetSource for InlineSource {
    fn describe(&self) -> String {
        format!("inline dataset ({} rows)", self.dataset.row_count())
    }

    fn load(&self) -> AuditResult<Dataset> {
        Ok(self.dataset.clone())
    }
}

/// Loads a dataset from `source` and imports it into `store`.
///
/// The import is all-or-nothing; see [`Store::import_dataset`].
pub async fn seed(store: &Store, source: &dyn DatasetSource) -> AuditResult<ImportSummary> {
    let dataset = source.load()?;
    let summary = store.import_dataset(&dataset).await?;
    info!(
        source = %source.describe(),
        rows = summary.total(),
        "Simulator dataset seeded"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Worker, WorkerStatus};
    use chrono::{TimeZone, Utc};

    fn create_test_dataset() -> Dataset {
        Dataset {
            workers: vec![Worker {
                worker_id: "W1".to_string(),
                name: "Meena".to_string(),
                phone: None,
                email: None,
                joined_at: Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
                current_status: WorkerStatus::Active,
                notes: None,
            }],
            ..Dataset::default()
        }
    }

    #[tokio::test]
    async fn test_seed_imports_inline_dataset() {
        let store = Store::in_memory().await.unwrap();
        let source = InlineSource::new(create_test_dataset());

        let summary = seed(&store, &source).await.unwrap();
        assert_eq!(summary.workers, 1);
        assert_eq!(store.list_workers().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_seeding_twice_fails_on_duplicates() {
        let store = Store::in_memory().await.unwrap();
        let source = InlineSource::new(create_test_dataset());

        seed(&store, &source).await.unwrap();
        assert!(seed(&store, &source).await.is_err());
    }

    #[test]
    fn test_inline_source_describes_row_count() {
        let source = InlineSource::new(create_test_dataset());
        assert_eq!(source.describe(), "inline dataset (1 rows)");
    }
}
