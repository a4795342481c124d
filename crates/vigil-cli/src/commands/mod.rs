//! CLI command implementations for `vigil`.
//!
//! - [`run`] -- the full collect, assess and submit pipeline.
//! - [`config_cmd`] -- show the resolved configuration.

pub mod config_cmd;
pub mod run;

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use vigil_client::{
    ApiEndpoint, CollectorConfig, HttpSubmitter, PageFetcher, PaginationCollector, RetryConfig,
    RetryingFetcher,
};
use vigil_core::{Orchestrator, RiskAssessor, RunOptions};
use vigil_platform::env::Environment;
use vigil_platform::fs::FileSystem;
use vigil_platform::http::HttpClient;
use vigil_types::{Config, SecretString};

/// Load configuration from `--config` or via discovery, with environment
/// overrides applied.
pub async fn load_config(
    fs: &dyn FileSystem,
    env: &dyn Environment,
    config_override: Option<&Path>,
) -> anyhow::Result<Config> {
    vigil_platform::config_loader::load_config(fs, env, config_override)
        .await
        .context("failed to load config")
}

/// Wire the pipeline stages together over a shared HTTP client.
pub fn build_orchestrator(
    config: &Config,
    api_key: SecretString,
    http: Arc<dyn HttpClient>,
    options: RunOptions,
) -> anyhow::Result<Orchestrator> {
    let endpoint = ApiEndpoint::new(config.api.base_url.trim(), api_key);

    let fetcher = RetryingFetcher::new(http.clone(), RetryConfig::from(&config.retry));
    let pages = PageFetcher::new(fetcher, endpoint.clone(), config.fetch.page_size);
    let collector = PaginationCollector::new(pages, CollectorConfig::from(&config.fetch));
    let sink = Arc::new(HttpSubmitter::new(http, endpoint));
    let assessor = RiskAssessor::new().context("failed to build risk assessor")?;

    Ok(Orchestrator::new(collector, assessor, sink, options))
}
