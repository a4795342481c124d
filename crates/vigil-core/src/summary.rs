//! Human-readable run summary.

use std::fmt::Write;

use vigil_types::RunReport;
use vigil_types::report::SubmissionStatus;

/// Render the end-of-run summary printed by the CLI.
pub fn render(report: &RunReport) -> String {
    let mut out = String::new();
    let alerts = &report.alerts;

    let _ = writeln!(out, "Run {}", report.run_id);
    let _ = writeln!(
        out,
        "  records: {} from {} page(s), {} skipped, {} degraded",
        report.records, report.pages.fetched, report.pages.skipped, report.pages.degraded
    );
    let _ = writeln!(
        out,
        "  requests: {} ({} retried: {} rate limited, {} server errors, {} transport errors)",
        report.fetch.attempts,
        report.fetch.retries,
        report.fetch.rate_limited,
        report.fetch.server_errors,
        report.fetch.transport_errors
    );
    let _ = writeln!(
        out,
        "  malformed fields: age {}, temperature {}, blood pressure {}",
        report.malformed.age, report.malformed.temperature, report.malformed.blood_pressure
    );
    if report.pages.dropped_entries > 0 {
        let _ = writeln!(out, "  unusable entries dropped: {}", report.pages.dropped_entries);
    }

    write_list(&mut out, "High-risk patients", &alerts.high_risk);
    write_list(&mut out, "Fever patients", &alerts.fever);
    write_list(&mut out, "Data-quality issues", &alerts.data_quality);

    let submission = match &report.submission {
        SubmissionStatus::NotAttempted => "not attempted".to_string(),
        SubmissionStatus::Skipped => "skipped (dry run)".to_string(),
        SubmissionStatus::Submitted { response } => format!("submitted, response: {response}"),
        SubmissionStatus::Failed { error } => format!("FAILED: {error}"),
    };
    let _ = writeln!(out, "Submission: {submission}");

    if let Some(error) = &report.error {
        let _ = writeln!(out, "Error: {error}");
    }
    if let Some(ms) = report.duration_ms() {
        let _ = writeln!(out, "Finished in {:.1}s", ms as f64 / 1000.0);
    }
    out
}

fn write_list(out: &mut String, title: &str, ids: &[String]) {
    let _ = writeln!(out, "{title} ({}):", ids.len());
    if ids.is_empty() {
        let _ = writeln!(out, "  (none)");
    } else {
        let _ = writeln!(out, "  {}", ids.join(", "));
    }
}
