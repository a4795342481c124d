//! Configuration schema.
//!
//! Every field has a serde default so an empty JSON object is a complete
//! configuration apart from `api.base_url` and the credential. Keys may be
//! written in camelCase; the platform loader normalizes them before they
//! reach these structs. Unknown fields are ignored.

use serde::{Deserialize, Serialize};

use crate::error::{Result, VigilError};
use crate::secret::SecretString;

/// Environment variable that overrides `api.base_url`.
pub const BASE_URL_ENV: &str = "VIGIL_API_URL";

// ── Root config ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Clinical API endpoint and credential.
    #[serde(default)]
    pub api: ApiConfig,

    /// Pagination behaviour.
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Retry and backoff behaviour for individual requests.
    #[serde(default)]
    pub retry: RetrySettings,
}

impl Config {
    /// Apply environment overrides through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(BASE_URL_ENV).filter(|u| !u.trim().is_empty()) {
            self.api.base_url = url;
        }
    }

    /// Resolve the API key: explicit `api.api_key` first, then the
    /// variable named by `api.api_key_env`.
    pub fn resolve_api_key<F>(&self, lookup: F) -> Result<SecretString>
    where
        F: Fn(&str) -> Option<String>,
    {
        if !self.api.api_key.is_empty() {
            return Ok(self.api.api_key.clone());
        }
        lookup(self.api.api_key_env.as_str())
            .map(SecretString::from)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                VigilError::config(format!(
                    "no API key: set api.api_key or the {} env var",
                    self.api.api_key_env
                ))
            })
    }

    /// Reject configurations that cannot drive a run.
    pub fn validate(&self) -> Result<()> {
        let url = self.api.base_url.trim();
        if url.is_empty() {
            return Err(VigilError::config(format!(
                "api.base_url is not set (or set {BASE_URL_ENV})"
            )));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(VigilError::config(format!(
                "api.base_url must start with http:// or https://, got {url}"
            )));
        }
        if self.fetch.page_size == 0 {
            return Err(VigilError::config("fetch.page_size must be at least 1"));
        }
        if self.fetch.max_pages == 0 {
            return Err(VigilError::config("fetch.max_pages must be at least 1"));
        }
        if self.retry.max_attempts == 0 {
            return Err(VigilError::config("retry.max_attempts must be at least 1"));
        }
        Ok(())
    }
}

// ── API ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL up to and including the `/api` segment.
    #[serde(default)]
    pub base_url: String,

    /// Explicit API key. Prefer `api_key_env` outside of local testing.
    #[serde(default)]
    pub api_key: SecretString,

    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Per-request timeout.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_api_key_env() -> String {
    "VIGIL_API_KEY".into()
}
fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: SecretString::default(),
            api_key_env: default_api_key_env(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

// ── Fetch ────────────────────────────────────────────────────────────────

/// What to do with a page that is still empty after its retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EmptyPagePolicy {
    /// Move on to the next page.
    #[default]
    Skip,
    /// Fail the collection.
    Abort,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Records requested per page.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Pages to fetch when the API does not report a page count.
    #[serde(default = "default_page_count")]
    pub default_page_count: u32,

    /// Hard upper bound on pages, whatever the API reports.
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,

    /// Pause between successive page requests.
    #[serde(default = "default_page_delay_ms")]
    pub page_delay_ms: u64,

    /// Re-attempts for a page that comes back empty.
    #[serde(default = "default_empty_page_retries")]
    pub empty_page_retries: u32,

    /// Base delay before re-attempting an empty page; doubles each time.
    #[serde(default = "default_empty_page_delay_ms")]
    pub empty_page_delay_ms: u64,

    #[serde(default)]
    pub empty_page_policy: EmptyPagePolicy,
}

fn default_page_size() -> u32 {
    20
}
fn default_page_count() -> u32 {
    3
}
fn default_max_pages() -> u32 {
    50
}
fn default_page_delay_ms() -> u64 {
    1_000
}
fn default_empty_page_retries() -> u32 {
    3
}
fn default_empty_page_delay_ms() -> u64 {
    1_000
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            default_page_count: default_page_count(),
            max_pages: default_max_pages(),
            page_delay_ms: default_page_delay_ms(),
            empty_page_retries: default_empty_page_retries(),
            empty_page_delay_ms: default_empty_page_delay_ms(),
            empty_page_policy: EmptyPagePolicy::default(),
        }
    }
}

// ── Retry ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Cooldown after HTTP 429.
    #[serde(default = "default_rate_limit_cooldown_ms")]
    pub rate_limit_cooldown_ms: u64,

    /// Cooldown after HTTP 500/503 or a transport failure.
    #[serde(default = "default_server_error_cooldown_ms")]
    pub server_error_cooldown_ms: u64,

    /// Ceiling for the doubled cooldown.
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,

    /// Attempts per request, first one included.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

fn default_rate_limit_cooldown_ms() -> u64 {
    15_000
}
fn default_server_error_cooldown_ms() -> u64 {
    1_000
}
fn default_max_backoff_ms() -> u64 {
    60_000
}
fn default_max_attempts() -> u32 {
    8
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            rate_limit_cooldown_ms: default_rate_limit_cooldown_ms(),
            server_error_cooldown_ms: default_server_error_cooldown_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            max_attempts: default_max_attempts(),
        }
    }
}
