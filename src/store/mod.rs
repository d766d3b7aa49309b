//! SQLite data store for workers, orders, termination records and reviews.
//!
//! The store owns the five tables and is the only writer. It is
//! append-biased: termination logs are never updated or deleted, orders only
//! change through a corrective compliance update, and deleting a worker or
//! an order is refused while dependent rows still reference it.
//!
//! # Example
//!
//! ```no_run
//! use gig_audit::config::DatabaseConfig;
//! use gig_audit::store::Store;
//!
//! # async fn run() -> gig_audit::error::AuditResult<()> {
//! let store = Store::connect(&DatabaseConfig::default()).await?;
//! let workers = store.list_workers().await?;
//! println!("{} workers on record", workers.len());
//! # Ok(())
//! # }
//! ```

mod dataset;
mod mapping;
mod orders;
mod reviews;
mod termination;
mod workers;

use std::str::FromStr;
use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::{debug, info};

use crate::config::DatabaseConfig;
use crate::error::AuditResult;

pub use dataset::ImportSummary;

/// Table definitions applied on every connect.
const SCHEMA: &str = include_str!("schema.sql");

/// Handle to the data store. Cloning is cheap and shares the pool.
#[derive(Debug, Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Opens (creating if needed) the database described by `config` and
    /// applies the schema.
    pub async fn connect(config: &DatabaseConfig) -> AuditResult<Self> {
        let options = SqliteConnectOptions::from_str(&config.url)?
            .create_if_missing(true)
            .foreign_keys(true);

        // Every connection to an in-memory database is a separate database,
        // so those pools hold exactly one connection for their whole life.
        let in_memory = config.url.contains(":memory:") || config.url.contains("mode=memory");
        let max_connections = if in_memory { 1 } else { config.max_connections };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .min_connections(if in_memory { 1 } else { 0 })
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
            .idle_timeout(if in_memory { None } else { Some(Duration::from_secs(600)) })
            .max_lifetime(if in_memory { None } else { Some(Duration::from_secs(1800)) })
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.apply_schema().await?;
        info!(url = %config.url, max_connections, "Data store ready");
        Ok(store)
    }

    /// Opens a private in-memory store. Used by tests and demos.
    pub async fn in_memory() -> AuditResult<Self> {
        Self::connect(&DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            ..DatabaseConfig::default()
        })
        .await
    }

    async fn apply_schema(&self) -> AuditResult<()> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        debug!("Schema applied");
        Ok(())
    }

    /// Returns the underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Runs a trivial query to confirm the store is reachable.
    pub async fn health_check(&self) -> AuditResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Closes every pooled connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
