//! Transcript topic detection.
//!
//! Matching is case-insensitive substring search over the transcript. The
//! keyword lists are the intake vocabulary workers actually use when
//! describing a complaint; they are not a classifier.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;

const TERMINATION_TERMS: &[&str] = &[
    "terminate",
    "terminated",
    "suspend",
    "suspended",
    "deactivated",
    "blocked",
    "banned",
];

const PAYMENT_TERMS: &[&str] = &["payout", "paid", "unpaid", "payment", "rupees", "rs.", "₹"];

const RATING_TERMS: &[&str] = &["rating", "algo", "algorithm", "penalty", "deduct", "deduction"];

const NO_NOTICE_TERMS: &[&str] = &["no notice", "sudden", "immediately", "without notice"];

const NOT_PAID_TERMS: &[&str] = &[
    "not paid",
    "didn't get paid",
    "unpaid",
    "not received",
];

/// 1-6 digits with an optional 1-2 digit fraction.
static AMOUNT: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"[0-9]{1,6}(?:\.[0-9]{1,2})?").ok());

const GRIEVANCE_TRIGGERS: &[&str] = &[
    "suspend",
    "suspended",
    "terminated",
    "termination",
    "no notice",
    "deduct",
    "penalty",
    "reduced",
    "unpaid",
    "not paid",
    "appeal",
];

/// The topics a transcript touches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Topics {
    /// Mentions being terminated, suspended, deactivated or blocked.
    pub claims_termination: bool,
    /// Mentions termination or an appeal in any form.
    pub termination_or_appeal: bool,
    /// Mentions payouts or payment.
    pub payment: bool,
    /// Mentions ratings, penalties or deductions.
    pub rating: bool,
    /// Mentions reviews or ratings.
    pub reviews: bool,
    /// Claims the action came without notice.
    pub claims_no_notice: bool,
    /// Claims money was not paid.
    pub claims_not_paid: bool,
    /// Touches a topic that makes a complaint actionable.
    pub grievance_trigger: bool,
}

impl Topics {
    /// Detects the topics in `transcript`.
    pub fn detect(transcript: &str) -> Self {
        let text = transcript.to_lowercase();
        let mentions = |terms: &[&str]| terms.iter().any(|term| text.contains(term));

        let claims_termination = mentions(TERMINATION_TERMS);
        let rating = mentions(RATING_TERMS);
        Self {
            claims_termination,
            termination_or_appeal: claims_termination
                || text.contains("termination")
                || text.contains("appeal"),
            payment: mentions(PAYMENT_TERMS),
            rating,
            reviews: rating || text.contains("review"),
            claims_no_notice: mentions(NO_NOTICE_TERMS),
            claims_not_paid: mentions(NOT_PAID_TERMS),
            grievance_trigger: mentions(GRIEVANCE_TRIGGERS),
        }
    }
}

/// Returns the first amount stated in `transcript`.
///
/// An amount reads as 1-6 digits with an optional 1-2 digit fraction and
/// must not touch another digit or a dot, so phone numbers and dates like
/// `12.05.2025` are skipped.
///
/// # Examples
///
/// ```
/// use gig_audit::grievance::claimed_amount;
/// use rust_decimal::Decimal;
///
/// assert_eq!(claimed_amount("I was paid only 45.50 for order 3"), Some(Decimal::new(4550, 2)));
/// assert_eq!(claimed_amount("call me on 9876543210"), None);
/// ```
pub fn claimed_amount(transcript: &str) -> Option<Decimal> {
    let pattern = AMOUNT.as_ref()?;
    let bytes = transcript.as_bytes();
    let numeric_at = |i: usize| {
        bytes
            .get(i)
            .is_some_and(|b| b.is_ascii_digit() || *b == b'.')
    };

    pattern
        .find_iter(transcript)
        .filter(|found| {
            let touches_before = found.start() > 0 && numeric_at(found.start() - 1);
            !touches_before && !numeric_at(found.end())
        })
        .find_map(|found| Decimal::from_str(found.as_str()).ok())
}
