//! Core data models for the audit engine.
//!
//! This module contains the stored records (workers, orders, termination
//! status and logs, review counts) and the report types the audit produces.

mod audit_report;
mod order;
mod records;
mod review_counts;
mod termination;
mod worker;

pub use audit_report::{
    AuditReport, AuditStep, DataQualityWarning, INCONSISTENT_RECORD, OrderFinding, PayoutSummary,
    ReviewSnapshot, TerminationSection, WarningSeverity, WithheldLine, WithheldSummary,
};
pub use order::{Order, OrderCorrection};
pub use records::{Dataset, Snapshot, WorkerRecords};
pub use review_counts::{ReviewCounts, star_column};
pub use termination::{
    AppealWindow, NewTerminationLog, TerminationDecision, TerminationLogEntry, TerminationStatus,
    sort_chronologically,
};
pub use worker::{Worker, WorkerStatus};
