//! Run orchestration: collect, assess, report, submit.
//!
//! One [`Orchestrator::run`] call is one run. Every stage either succeeds,
//! degrades (logged and counted in the [`RunReport`]) or fails with a
//! [`RunError`]. The report is filled in as far as the run got, so a
//! failed run still explains itself.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use vigil_client::{AssessmentSink, PaginationCollector};
use vigil_types::report::SubmissionStatus;
use vigil_types::{AssessmentPayload, RunReport};

use crate::assess::RiskAssessor;
use crate::error::RunError;

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Build the payload but do not submit it.
    pub dry_run: bool,
}

pub struct Orchestrator {
    collector: PaginationCollector,
    assessor: RiskAssessor,
    sink: Arc<dyn AssessmentSink>,
    options: RunOptions,
}

impl Orchestrator {
    pub fn new(
        collector: PaginationCollector,
        assessor: RiskAssessor,
        sink: Arc<dyn AssessmentSink>,
        options: RunOptions,
    ) -> Self {
        Self {
            collector,
            assessor,
            sink,
            options,
        }
    }

    /// Run the whole pipeline once.
    pub async fn run(&self, cancel: &CancellationToken) -> Result<RunReport, RunError> {
        let (report, outcome) = self.run_with_report(cancel).await;
        outcome.map(|()| report)
    }

    /// Like [`run`](Self::run), but always hands back the report.
    pub async fn run_with_report(
        &self,
        cancel: &CancellationToken,
    ) -> (RunReport, Result<(), RunError>) {
        let mut report = RunReport::start(self.options.dry_run);
        let baseline = self.collector.fetch_stats();
        info!(run_id = %report.run_id, dry_run = self.options.dry_run, "run started");

        let outcome = self.drive(&mut report, cancel).await;
        report.fetch = self.collector.fetch_stats().since(&baseline);
        report.finish();

        match &outcome {
            Ok(()) => info!(
                run_id = %report.run_id,
                duration_ms = report.duration_ms(),
                "run finished"
            ),
            Err(e) => {
                report.error = Some(e.to_string());
                error!(run_id = %report.run_id, error = %e, "run failed");
            }
        }
        (report, outcome)
    }

    async fn drive(&self, report: &mut RunReport, cancel: &CancellationToken) -> Result<(), RunError> {
        let collection = self
            .collector
            .collect_all(cancel)
            .await
            .map_err(RunError::collection)?;
        report.pages = collection.stats;

        if collection.records.is_empty() {
            return Err(RunError::NoRecords);
        }

        let assessment = self.assessor.assess(&collection.records);
        report.records = assessment.records;
        report.malformed = assessment.malformed;
        report.alerts = assessment.alerts;
        log_summary(report);

        let payload = AssessmentPayload::from(&report.alerts);
        if self.options.dry_run {
            info!("dry run, not submitting");
            report.submission = SubmissionStatus::Skipped;
            return Ok(());
        }

        match self.sink.submit(&payload, cancel).await {
            Ok(response) => {
                info!(response = %response, "assessment submitted");
                report.submission = SubmissionStatus::Submitted { response };
                Ok(())
            }
            Err(e) => {
                let err = RunError::submission(e);
                if let RunError::Submission(inner) = &err {
                    warn!(status = inner.status(), error = %inner, "assessment submission failed");
                    report.submission = SubmissionStatus::Failed {
                        error: inner.to_string(),
                    };
                }
                Err(err)
            }
        }
    }
}

fn log_summary(report: &RunReport) {
    let alerts = &report.alerts;
    info!(
        records = report.records,
        high_risk = alerts.high_risk.len(),
        fever = alerts.fever.len(),
        data_quality = alerts.data_quality.len(),
        "assessment complete"
    );
    info!(patients = ?alerts.high_risk, "high-risk patients");
    info!(patients = ?alerts.fever, "fever patients");
    info!(patients = ?alerts.data_quality, "data-quality issues");

    let malformed = report.malformed;
    if malformed.total() > 0 {
        warn!(
            age = malformed.age,
            temperature = malformed.temperature,
            blood_pressure = malformed.blood_pressure,
            "records with unreadable vitals"
        );
    }
}
