//! Plain text audit statement.

use std::fmt::{self, Write};

use chrono::{DateTime, SecondsFormat, Utc};

use crate::audit::describe_appeal;
use crate::models::{AuditReport, PayoutSummary, TerminationSection, WarningSeverity};

/// Renders the report as a plain text "Worker Audit Statement".
///
/// Sections appear in a fixed order: header, payout compliance,
/// termination, reviews, data quality, explanation.
pub fn render_text(report: &AuditReport) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_statement(&mut out, report);
    out
}

fn write_statement(out: &mut String, report: &AuditReport) -> fmt::Result {
    let worker = &report.worker;
    heading(out, "WORKER AUDIT STATEMENT", '=')?;
    writeln!(out, "Worker:        {} ({})", worker.worker_id, worker.name)?;
    writeln!(out, "Status:        {}", worker.current_status)?;
    writeln!(out, "Joined:        {}", timestamp(worker.joined_at))?;
    writeln!(out, "Evaluated at:  {}", timestamp(report.evaluated_at))?;
    writeln!(out, "Engine:        {}", report.engine_version)?;

    writeln!(out)?;
    heading(out, "PAYOUT COMPLIANCE", '-')?;
    write_payout(out, &report.payout)?;

    writeln!(out)?;
    heading(out, "TERMINATION", '-')?;
    match &report.termination {
        Some(section) => write_termination(out, section, report.evaluated_at)?,
        None => writeln!(out, "Not terminated. No justification chain or appeal window applies.")?,
    }

    writeln!(out)?;
    heading(out, "REVIEWS", '-')?;
    match &report.reviews {
        Some(reviews) => {
            let counts = [
                reviews.count_5,
                reviews.count_4,
                reviews.count_3,
                reviews.count_2,
                reviews.count_1,
            ];
            for (stars, count) in (1..=5).rev().zip(counts) {
                writeln!(out, "{} star{}: {}", stars, if stars == 1 { "" } else { "s" }, count)?;
            }
            if reviews.consistent {
                writeln!(out, "Total:   {}", reviews.stored_total)?;
            } else if let Some(computed) = reviews.computed_total {
                writeln!(
                    out,
                    "Total:   {} stored, {} counted by star (MISMATCH)",
                    reviews.stored_total, computed
                )?;
            } else {
                writeln!(
                    out,
                    "Total:   {} stored, star counts overflow (MISMATCH)",
                    reviews.stored_total
                )?;
            }
        }
        None => writeln!(out, "No review counts recorded.")?,
    }

    writeln!(out)?;
    heading(out, "DATA QUALITY", '-')?;
    if report.warnings.is_empty() {
        writeln!(out, "No inconsistent records found.")?;
    }
    for warning in &report.warnings {
        writeln!(
            out,
            "[{}] {} {}: {}",
            severity_label(warning.severity),
            warning.code,
            warning.record,
            warning.message
        )?;
    }

    writeln!(out)?;
    heading(out, "EXPLANATION", '-')?;
    for step in &report.explanation {
        writeln!(out, "{:>2}. {}: {}", step.step_number, step.rule_name, step.reasoning)?;
    }
    Ok(())
}

fn write_payout(out: &mut String, payout: &PayoutSummary) -> fmt::Result {
    writeln!(
        out,
        "Orders:                {} ({} compliant, {} non-compliant)",
        payout.total_orders, payout.compliant_orders, payout.non_compliant_orders
    )?;
    writeln!(out, "Total payout:          {}", payout.total_payout)?;
    writeln!(out, "Compliant payout:      {}", payout.compliant_payout)?;
    writeln!(out, "Non-compliant payout:  {}", payout.non_compliant_payout)?;

    if !payout.non_compliant.is_empty() {
        writeln!(out, "Non-compliant orders:")?;
        for finding in &payout.non_compliant {
            writeln!(
                out,
                "  {}  {}  paid {}  reason: {}{}",
                finding.order_id,
                finding.order_date.format("%Y-%m-%d"),
                finding.payout_amount,
                finding
                    .reduction_reason
                    .as_deref()
                    .unwrap_or("NONE RECORDED"),
                finding
                    .flags
                    .as_deref()
                    .map(|flags| format!("  flags: {}", flags))
                    .unwrap_or_default()
            )?;
        }
    }

    match &payout.withheld {
        None => writeln!(out, "Withheld amount:       not stated (no expected payout supplied)")?,
        Some(withheld) => {
            writeln!(
                out,
                "Withheld amount:       {} against {}{}",
                withheld.total_withheld,
                withheld.baseline,
                if withheld.complete { "" } else { " (partial)" }
            )?;
            for line in withheld.lines.iter().filter(|line| !line.withheld.is_zero()) {
                writeln!(
                    out,
                    "  {}  expected {}  paid {}  withheld {}",
                    line.order_id, line.expected_payout, line.actual_payout, line.withheld
                )?;
            }
            if !withheld.unpriced_order_ids.is_empty() {
                writeln!(out, "  Not priced: {}", withheld.unpriced_order_ids.join(", "))?;
            }
        }
    }
    Ok(())
}

fn write_termination(
    out: &mut String,
    section: &TerminationSection,
    evaluated_at: DateTime<Utc>,
) -> fmt::Result {
    writeln!(
        out,
        "Terminated at: {}",
        section
            .terminated_at
            .map(timestamp)
            .unwrap_or_else(|| "not recorded".to_string())
    )?;
    writeln!(
        out,
        "Reason:        {}{}",
        section.reason_code.as_deref().unwrap_or("no code"),
        section
            .reason_text
            .as_deref()
            .map(|text| format!(" - {}", text))
            .unwrap_or_default()
    )?;
    writeln!(out, "Appeal:        {}", describe_appeal(&section.appeal, evaluated_at))?;

    if section.justification_chain.is_empty() {
        return writeln!(out, "Justification chain: no log entries recorded.");
    }
    writeln!(
        out,
        "Justification chain ({} entries, max severity {}):",
        section.justification_chain.len(),
        section.max_severity.unwrap_or(0)
    )?;
    for (index, entry) in section.justification_chain.iter().enumerate() {
        write!(
            out,
            "  {}. {}  [{}] severity {}",
            index + 1,
            timestamp(entry.logged_at),
            entry.reason_code.as_deref().unwrap_or("-"),
            entry.severity
        )?;
        if let Some(text) = &entry.reason_text {
            write!(out, "  {}", text)?;
        }
        if let Some(order_id) = &entry.related_order_id {
            write!(out, "  (order {})", order_id)?;
        }
        if let Some(action) = &entry.action_taken {
            write!(out, "  action: {}", action)?;
        }
        if let Some(recorded_by) = &entry.recorded_by {
            write!(out, "  by: {}", recorded_by)?;
        }
        writeln!(out)?;
        if let Some(evidence) = &entry.evidence {
            writeln!(out, "     evidence: {}", evidence)?;
        }
    }
    Ok(())
}

fn heading(out: &mut String, title: &str, underline: char) -> fmt::Result {
    writeln!(out, "{}", title)?;
    writeln!(out, "{}", underline.to_string().repeat(title.len()))
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn severity_label(severity: WarningSeverity) -> &'static str {
    match severity {
        WarningSeverity::Low => "LOW",
        WarningSeverity::Medium => "MEDIUM",
        WarningSeverity::High => "HIGH",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::evaluate;
    use crate::models::{
        Order, ReviewCounts, TerminationDecision, TerminationLogEntry, Worker, WorkerRecords,
        WorkerStatus,
    };
    use chrono::{Duration, TimeZone};
    use rust_decimal::Decimal;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap()
    }

    fn create_test_worker(status: WorkerStatus) -> Worker {
        Worker {
            worker_id: "W1".to_string(),
            name: "Asha Rao".to_string(),
            phone: None,
            email: None,
            joined_at: Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
            current_status: status,
            notes: None,
        }
    }

    fn create_test_order(id: &str, payout: i64, compliant: bool, reason: Option<&str>) -> Order {
        Order {
            order_id: id.to_string(),
            worker_id: "W1".to_string(),
            order_date: now() - Duration::days(2),
            distance_km: None,
            duration_min: None,
            payout_amount: Decimal::new(payout * 100, 2),
            status: None,
            flags: None,
            payment_compliant: compliant,
            reduction_reason: reason.map(str::to_string),
        }
    }

    #[test]
    fn test_statement_contains_every_section() {
        let mut records = WorkerRecords::for_worker(create_test_worker(WorkerStatus::Active));
        records.orders = vec![
            create_test_order("O1", 100, true, None),
            create_test_order("O2", 80, false, Some("late delivery")),
        ];
        records.review_counts = Some(ReviewCounts::from_counts("W1", [3, 1, 0, 0, 0]));

        let text = render_text(&evaluate(&records, now(), None));
        for section in [
            "WORKER AUDIT STATEMENT",
            "PAYOUT COMPLIANCE",
            "TERMINATION",
            "REVIEWS",
            "DATA QUALITY",
            "EXPLANATION",
        ] {
            assert!(text.contains(section), "missing section {}", section);
        }
        assert!(text.contains("2 (1 compliant, 1 non-compliant)"));
        assert!(text.contains("reason: late delivery"));
        assert!(text.contains("Not terminated."));
        assert!(text.contains("Total:   4"));
        assert!(text.contains("not stated"));
    }

    #[test]
    fn test_statement_shows_closed_appeal_and_chain() {
        let mut records = WorkerRecords::for_worker(create_test_worker(WorkerStatus::Terminated));
        records.termination_status = Some(
            TerminationDecision {
                terminated_at: now() - Duration::days(10),
                reason_code: Some("LOW_RATING".to_string()),
                reason_text: Some("Rating below threshold".to_string()),
                appeal_allowed: true,
                appeal_deadline: Some(now() - Duration::days(3)),
            }
            .into_status("W1"),
        );
        records.termination_logs = vec![TerminationLogEntry {
            log_id: 1,
            worker_id: "W1".to_string(),
            logged_at: now() - Duration::days(12),
            reason_code: Some("COMPLAINT".to_string()),
            reason_text: Some("Customer complaint".to_string()),
            related_order_id: None,
            evidence: Some("ticket #4411".to_string()),
            severity: 2,
            action_taken: Some("warning".to_string()),
            recorded_by: Some("ops".to_string()),
        }];

        let text = render_text(&evaluate(&records, now(), None));
        assert!(text.contains("Reason:        LOW_RATING - Rating below threshold"));
        assert!(text.contains("appeal window closed"));
        assert!(text.contains("1 entries, max severity 2"));
        assert!(text.contains("evidence: ticket #4411"));
    }

    #[test]
    fn test_statement_lists_warnings() {
        let mut records = WorkerRecords::for_worker(create_test_worker(WorkerStatus::Active));
        records.orders = vec![create_test_order("O3", 40, false, None)];

        let text = render_text(&evaluate(&records, now(), None));
        assert!(text.contains("reason: NONE RECORDED"));
        assert!(text.contains("[HIGH] INCONSISTENT_RECORD order O3"));
    }
}
