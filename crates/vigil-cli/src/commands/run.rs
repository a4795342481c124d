//! `vigil run` -- fetch, assess and submit.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::Args;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use vigil_core::{RunOptions, summary};
use vigil_platform::env::{Environment, NativeEnvironment};
use vigil_platform::fs::NativeFileSystem;
use vigil_platform::{NativePlatform, Platform};
use vigil_types::AssessmentPayload;

/// Arguments for `vigil run`.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Config file path (overrides auto-discovery).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Assess but do not submit; print the payload instead.
    #[arg(long)]
    pub dry_run: bool,

    /// Also write the run report as JSON to this file.
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,

    /// Print the run report as JSON instead of the summary.
    #[arg(long)]
    pub json: bool,
}

/// Setup problems (config, credential, HTTP client) are returned as errors;
/// pipeline failures come back as their exit code.
pub async fn run(args: RunArgs) -> anyhow::Result<ExitCode> {
    let env = NativeEnvironment;
    let config = super::load_config(&NativeFileSystem, &env, args.config.as_deref()).await?;
    config.validate()?;
    let api_key = config.resolve_api_key(|name| env.get_var(name))?;

    let platform = NativePlatform::new(Duration::from_secs(config.api.request_timeout_secs))
        .context("failed to build HTTP client")?;
    let options = RunOptions {
        dry_run: args.dry_run,
    };
    let orchestrator = super::build_orchestrator(&config, api_key, platform.shared_http(), options)?;

    let cancel = CancellationToken::new();
    let watcher = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupt received, cancelling run");
                cancel.cancel();
            }
        }
    });

    let (report, outcome) = orchestrator.run_with_report(&cancel).await;
    watcher.abort();

    let report_json =
        serde_json::to_string_pretty(&report).context("failed to serialize run report")?;

    if let Some(path) = &args.report {
        match platform.fs().write_string(path, &report_json).await {
            Ok(()) => info!(path = %path.display(), "run report written"),
            Err(e) => warn!(path = %path.display(), error = %e, "failed to write run report"),
        }
    }

    if args.json {
        println!("{report_json}");
    } else {
        print!("{}", summary::render(&report));
        if args.dry_run && outcome.is_ok() {
            let payload = AssessmentPayload::from(&report.alerts);
            let payload = serde_json::to_string_pretty(&payload)
                .context("failed to serialize payload")?;
            println!("Payload that would be submitted:\n{payload}");
        }
    }

    Ok(match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(e.exit_code())
        }
    })
}
