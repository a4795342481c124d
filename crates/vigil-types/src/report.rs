//! Structured run report.
//!
//! One [`RunReport`] is produced per run, including failed runs, so the
//! operator can see how many retries, degraded pages and malformed fields
//! the run absorbed before it succeeded or gave up.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::risk::AlertSets;

/// Request-level counters from the retrying fetcher.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchStats {
    /// Every HTTP attempt, including the first one of each request.
    pub attempts: u32,
    /// Attempts beyond the first.
    pub retries: u32,
    /// 429 responses seen.
    pub rate_limited: u32,
    /// 500 and 503 responses seen.
    pub server_errors: u32,
    /// Connection-level failures seen.
    pub transport_errors: u32,
}

impl FetchStats {
    /// Counters accumulated since `earlier` was taken.
    pub fn since(&self, earlier: &FetchStats) -> FetchStats {
        FetchStats {
            attempts: self.attempts.saturating_sub(earlier.attempts),
            retries: self.retries.saturating_sub(earlier.retries),
            rate_limited: self.rate_limited.saturating_sub(earlier.rate_limited),
            server_errors: self.server_errors.saturating_sub(earlier.server_errors),
            transport_errors: self.transport_errors.saturating_sub(earlier.transport_errors),
        }
    }
}

/// Page-level counters from the pagination collector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageStats {
    /// Pages that produced at least one record.
    pub fetched: u32,
    /// Fetches that failed and were treated as an empty page.
    pub degraded: u32,
    /// Re-attempts of a page that came back empty.
    pub empty_retries: u32,
    /// Pages given up on after the empty-page retries ran out.
    pub skipped: u32,
    /// `data` entries that could not be read as a patient record.
    pub dropped_entries: u32,
}

/// Per-field validation failures across all assessed records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MalformedCounts {
    pub age: u32,
    pub temperature: u32,
    pub blood_pressure: u32,
}

impl MalformedCounts {
    pub fn total(&self) -> u32 {
        self.age + self.temperature + self.blood_pressure
    }
}

/// What happened to the assessment submission.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubmissionStatus {
    /// The run stopped before submission.
    #[default]
    NotAttempted,
    /// Dry run: the payload was built but not sent.
    Skipped,
    Submitted {
        /// The API's response body, unvalidated.
        response: Value,
    },
    Failed {
        error: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub dry_run: bool,
    /// Records handed to the assessor.
    pub records: usize,
    pub fetch: FetchStats,
    pub pages: PageStats,
    pub malformed: MalformedCounts,
    pub alerts: AlertSets,
    pub submission: SubmissionStatus,
    /// Fatal error message when the run did not complete.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunReport {
    pub fn start(dry_run: bool) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            finished_at: None,
            dry_run,
            records: 0,
            fetch: FetchStats::default(),
            pages: PageStats::default(),
            malformed: MalformedCounts::default(),
            alerts: AlertSets::default(),
            submission: SubmissionStatus::default(),
            error: None,
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn duration_ms(&self) -> Option<i64> {
        self.finished_at
            .map(|end| (end - self.started_at).num_milliseconds())
    }
}
