//! Exportable audit statements.
//!
//! An [`AuditReport`] can be exported as pretty-printed JSON or as a plain
//! text "Worker Audit Statement" suitable for attaching to a grievance.

mod json;
mod text;

use std::fmt;
use std::str::FromStr;

use crate::error::{AuditError, AuditResult};
use crate::models::AuditReport;

pub use text::render_text;

/// Export format for an audit report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    /// Pretty-printed JSON of the full report.
    #[default]
    Json,
    /// Plain text statement.
    Text,
}

impl ReportFormat {
    /// MIME type of the exported document.
    pub fn content_type(&self) -> &'static str {
        match self {
            ReportFormat::Json => "application/json",
            ReportFormat::Text => "text/plain; charset=utf-8",
        }
    }

    /// File extension of the exported document.
    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Json => "json",
            ReportFormat::Text => "txt",
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportFormat::Json => f.write_str("json"),
            ReportFormat::Text => f.write_str("text"),
        }
    }
}

impl FromStr for ReportFormat {
    type Err = AuditError;

    fn from_str(s: &str) -> AuditResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(ReportFormat::Json),
            "text" | "txt" | "plain" => Ok(ReportFormat::Text),
            other => Err(AuditError::invalid(
                "format",
                format!("unknown report format '{}' (expected json or text)", other),
            )),
        }
    }
}

/// A rendered report ready to be served as a download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedReport {
    /// MIME type of `body`.
    pub content_type: &'static str,
    /// Suggested download file name.
    pub filename: String,
    /// The document.
    pub body: String,
}

/// Renders `report` in the requested format.
pub fn render(report: &AuditReport, format: ReportFormat) -> AuditResult<ExportedReport> {
    let body = match format {
        ReportFormat::Json => json::generate(report)?,
        ReportFormat::Text => render_text(report),
    };

    Ok(ExportedReport {
        content_type: format.content_type(),
        filename: format!(
            "audit_{}_{}.{}",
            report.worker.worker_id,
            report.evaluated_at.format("%Y%m%dT%H%M%SZ"),
            format.extension()
        ),
        body,
    })
}
