//! JSON report generation

use crate::error::AuditResult;
use crate::models::AuditReport;

pub fn generate(report: &AuditReport) -> AuditResult<String> {
    Ok(serde_json::to_string_pretty(report)?)
}
