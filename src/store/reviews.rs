//! Review count aggregate rows.

use sqlx::SqliteConnection;
use tracing::{debug, info};

use crate::error::{AuditError, AuditResult};
use crate::models::{ReviewCounts, star_column};

use super::Store;
use super::mapping::{REVIEW_COLUMNS, insert_error, row_to_reviews};
use super::workers::require_worker;

impl Store {
    /// Records one review of `stars` (1-5) for a worker.
    ///
    /// This is the only increment path. The star count and `total_reviews`
    /// are updated in the same statement, the total being recomputed from
    /// the five counts.
    pub async fn record_review(&self, worker_id: &str, stars: u8) -> AuditResult<ReviewCounts> {
        let column = star_column(stars)?;
        let mut tx = self.pool.begin().await?;
        require_worker(&mut tx, worker_id).await?;

        sqlx::query("INSERT OR IGNORE INTO review_counts (worker_id) VALUES (?)")
            .bind(worker_id)
            .execute(&mut *tx)
            .await?;
        let current = fetch_reviews(&mut tx, worker_id)
            .await?
            .ok_or_else(|| AuditError::not_found("review_counts", worker_id))?;
        if current.computed_total().and_then(|total| total.checked_add(1)).is_none() {
            return Err(AuditError::invalid(
                "review_counts",
                "the star counts sum past the largest storable total",
            ));
        }
        let sql = format!(
            "UPDATE review_counts SET {col} = {col} + 1, \
             total_reviews = count_5 + count_4 + count_3 + count_2 + count_1 + 1 \
             WHERE worker_id = ?",
            col = column
        );
        sqlx::query(&sql).bind(worker_id).execute(&mut *tx).await?;

        let counts = fetch_reviews(&mut tx, worker_id)
            .await?
            .ok_or_else(|| AuditError::not_found("review_counts", worker_id))?;
        tx.commit().await?;

        debug!(worker_id, stars, total = counts.total_reviews, "Review recorded");
        Ok(counts)
    }

    /// Writes all five star counts for a worker. The stored total is derived
    /// from the counts; any total supplied by the caller is ignored.
    pub async fn upsert_review_counts(&self, counts: &ReviewCounts) -> AuditResult<ReviewCounts> {
        counts.validate()?;
        let total_reviews = counts.computed_total().ok_or_else(|| {
            AuditError::invalid("review_counts", "the star counts sum past the largest storable total")
        })?;
        let counts = ReviewCounts {
            total_reviews,
            ..counts.clone()
        };

        let mut tx = self.pool.begin().await?;
        require_worker(&mut tx, &counts.worker_id).await?;
        write_reviews(&mut tx, &counts).await?;
        tx.commit().await?;

        info!(worker_id = %counts.worker_id, total = counts.total_reviews, "Review counts replaced");
        Ok(counts)
    }

    /// Fetches a worker's review counts.
    pub async fn get_review_counts(&self, worker_id: &str) -> AuditResult<ReviewCounts> {
        let mut conn = self.pool.acquire().await?;
        fetch_reviews(&mut conn, worker_id)
            .await?
            .ok_or_else(|| AuditError::not_found("review_counts", worker_id))
    }
}

/// Writes a review row exactly as given, including its stored total.
pub(crate) async fn write_reviews(
    conn: &mut SqliteConnection,
    counts: &ReviewCounts,
) -> AuditResult<()> {
    let sql = format!(
        "INSERT INTO review_counts ({}) VALUES (?, ?, ?, ?, ?, ?, ?) \
         ON CONFLICT(worker_id) DO UPDATE SET \
         count_5 = excluded.count_5, count_4 = excluded.count_4, \
         count_3 = excluded.count_3, count_2 = excluded.count_2, \
         count_1 = excluded.count_1, total_reviews = excluded.total_reviews",
        REVIEW_COLUMNS
    );
    sqlx::query(&sql)
        .bind(&counts.worker_id)
        .bind(counts.count_5)
        .bind(counts.count_4)
        .bind(counts.count_3)
        .bind(counts.count_2)
        .bind(counts.count_1)
        .bind(counts.total_reviews)
        .execute(&mut *conn)
        .await
        .map_err(|e| insert_error(e, "review_counts", &counts.worker_id))?;
    Ok(())
}

pub(crate) async fn fetch_reviews(
    conn: &mut SqliteConnection,
    worker_id: &str,
) -> AuditResult<Option<ReviewCounts>> {
    let sql = format!(
        "SELECT {} FROM review_counts WHERE worker_id = ?",
        REVIEW_COLUMNS
    );
    let row = sqlx::query(&sql)
        .bind(worker_id)
        .fetch_optional(&mut *conn)
        .await?;
    row.as_ref().map(row_to_reviews).transpose()
}
