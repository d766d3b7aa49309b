//! Review count aggregate.

use serde::{Deserialize, Serialize};

use crate::error::{AuditError, AuditResult};

/// Denormalized per-worker counts of 5★ to 1★ reviews.
///
/// `total_reviews` is a cached value and must equal the sum of the five
/// counts. Rows imported from the platform may not, which
/// [`ReviewCounts::check_total`] reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewCounts {
    /// The worker the counts belong to.
    pub worker_id: String,
    /// Number of 5★ reviews.
    #[serde(default)]
    pub count_5: i64,
    /// Number of 4★ reviews.
    #[serde(default)]
    pub count_4: i64,
    /// Number of 3★ reviews.
    #[serde(default)]
    pub count_3: i64,
    /// Number of 2★ reviews.
    #[serde(default)]
    pub count_2: i64,
    /// Number of 1★ reviews.
    #[serde(default)]
    pub count_1: i64,
    /// The cached total.
    #[serde(default)]
    pub total_reviews: i64,
}

impl ReviewCounts {
    /// A row with no reviews.
    pub fn empty(worker_id: impl Into<String>) -> Self {
        Self {
            worker_id: worker_id.into(),
            count_5: 0,
            count_4: 0,
            count_3: 0,
            count_2: 0,
            count_1: 0,
            total_reviews: 0,
        }
    }

    /// Builds a row from star counts, deriving the total. A sum past
    /// `i64::MAX` is stored as `i64::MAX`.
    pub fn from_counts(worker_id: impl Into<String>, counts: [i64; 5]) -> Self {
        let [count_5, count_4, count_3, count_2, count_1] = counts;
        let mut row = Self {
            worker_id: worker_id.into(),
            count_5,
            count_4,
            count_3,
            count_2,
            count_1,
            total_reviews: 0,
        };
        row.total_reviews = row.computed_total().unwrap_or(i64::MAX);
        row
    }

    /// Sum of the five star counts, or `None` when it does not fit in an
    /// `i64`.
    ///
    /// # Examples
    ///
    /// ```
    /// use gig_audit::models::ReviewCounts;
    ///
    /// let counts = ReviewCounts::from_counts("W1", [3, 1, 0, 0, 0]);
    /// assert_eq!(counts.computed_total(), Some(4));
    /// assert!(counts.check_total().is_ok());
    /// ```
    pub fn computed_total(&self) -> Option<i64> {
        self.counts()
            .into_iter()
            .try_fold(0i64, |sum, count| sum.checked_add(count))
    }

    /// Checks the cached total against the star counts.
    pub fn check_total(&self) -> AuditResult<()> {
        let Some(computed) = self.computed_total() else {
            return Err(AuditError::InconsistentRecord {
                record: format!("review_counts {}", self.worker_id),
                message: "the star counts sum past the largest storable total".to_string(),
            });
        };
        if computed != self.total_reviews {
            return Err(AuditError::InconsistentRecord {
                record: format!("review_counts {}", self.worker_id),
                message: format!(
                    "total_reviews is {} but the star counts sum to {}",
                    self.total_reviews, computed
                ),
            });
        }
        Ok(())
    }

    /// Validates counts before they are stored.
    pub fn validate(&self) -> AuditResult<()> {
        if self.counts().iter().any(|count| *count < 0) {
            return Err(AuditError::invalid("review_counts", "counts must not be negative"));
        }
        if self.computed_total().is_none() {
            return Err(AuditError::invalid(
                "review_counts",
                "the star counts sum past the largest storable total",
            ));
        }
        Ok(())
    }

    fn counts(&self) -> [i64; 5] {
        [
            self.count_5,
            self.count_4,
            self.count_3,
            self.count_2,
            self.count_1,
        ]
    }
}

/// Returns the `review_counts` column that stores `stars` reviews.
pub fn star_column(stars: u8) -> AuditResult<&'static str> {
    match stars {
        5 => Ok("count_5"),
        4 => Ok("count_4"),
        3 => Ok("count_3"),
        2 => Ok("count_2"),
        1 => Ok("count_1"),
        _ => Err(invalid_stars(stars)),
    }
}

fn invalid_stars(stars: u8) -> AuditError {
    AuditError::invalid("stars", format!("{} is not between 1 and 5", stars))
}
