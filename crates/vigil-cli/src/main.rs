//! `vigil` -- CLI binary for the patient risk triage client.
//!
//! Provides the following subcommands:
//!
//! - `vigil run` -- Fetch all patients, assess risk, submit the alerts.
//! - `vigil config` -- Show the resolved configuration.
//!
//! Exit codes: 0 success, 1 configuration or usage error, 2 collection
//! failure, 3 submission failure, 130 cancelled.

use std::process::ExitCode;

use clap::{Parser, Subcommand};

mod commands;

const EXIT_USAGE: u8 = 1;

/// Patient risk triage client.
#[derive(Parser, Debug)]
#[command(name = "vigil", about = "Patient risk triage client", version)]
struct Cli {
    /// Enable verbose (debug-level) logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch patients, assess risk and submit the alert lists.
    Run(commands::run::RunArgs),

    /// Show the resolved configuration (API key redacted).
    Config(commands::config_cmd::ConfigArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::from(EXIT_USAGE)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .init();

    let result = match cli.command {
        Commands::Run(args) => commands::run::run(args).await,
        Commands::Config(args) => commands::config_cmd::run(args)
            .await
            .map(|()| ExitCode::SUCCESS),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(EXIT_USAGE)
        }
    }
}
