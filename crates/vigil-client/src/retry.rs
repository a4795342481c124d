//! Status-aware retry with bounded exponential backoff.
//!
//! [`RetryingFetcher`] sends one logical request and returns its JSON body.
//! HTTP 429 waits a long cooldown, HTTP 500/503 and transport failures a
//! short one; both double per retry up to a ceiling, and the whole request
//! is abandoned after `max_attempts`. Any other non-success status fails
//! on the spot.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use vigil_platform::http::{HttpClient, HttpRequest};
use vigil_types::config::RetrySettings;
use vigil_types::report::FetchStats;

use crate::error::{ClientError, Result};

#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Attempts per request, first one included (default: 8).
    pub max_attempts: u32,
    /// Base wait after HTTP 429 (default: 15 seconds).
    pub rate_limit_cooldown: Duration,
    /// Base wait after HTTP 500/503 or a transport failure (default: 1 second).
    pub server_error_cooldown: Duration,
    /// Ceiling for the doubled wait (default: 60 seconds). Never lowers a
    /// wait below its base cooldown.
    pub max_backoff: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::from(&RetrySettings::default())
    }
}

impl From<&RetrySettings> for RetryConfig {
    fn from(settings: &RetrySettings) -> Self {
        Self {
            max_attempts: settings.max_attempts.max(1),
            rate_limit_cooldown: Duration::from_millis(settings.rate_limit_cooldown_ms),
            server_error_cooldown: Duration::from_millis(settings.server_error_cooldown_ms),
            max_backoff: Duration::from_millis(settings.max_backoff_ms),
        }
    }
}

/// Wait before the next attempt, given the failure and how many retries
/// have already been made.
///
/// `min(cooldown * 2^retries, max(max_backoff, cooldown))`
pub fn compute_delay(config: &RetryConfig, err: &ClientError, retries: u32) -> Duration {
    let cooldown = match err {
        ClientError::RateLimited => config.rate_limit_cooldown,
        _ => config.server_error_cooldown,
    };
    let factor = 2u32.saturating_pow(retries);
    cooldown
        .saturating_mul(factor)
        .min(config.max_backoff.max(cooldown))
}

#[derive(Debug, Default)]
struct Counters {
    attempts: AtomicU32,
    retries: AtomicU32,
    rate_limited: AtomicU32,
    server_errors: AtomicU32,
    transport_errors: AtomicU32,
}

impl Counters {
    fn record_failure(&self, err: &ClientError) {
        let counter = match err {
            ClientError::RateLimited => &self.rate_limited,
            ClientError::ServerError { .. } => &self.server_errors,
            ClientError::Transport(_) => &self.transport_errors,
            _ => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> FetchStats {
        FetchStats {
            attempts: self.attempts.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
            rate_limited: self.rate_limited.load(Ordering::Relaxed),
            server_errors: self.server_errors.load(Ordering::Relaxed),
            transport_errors: self.transport_errors.load(Ordering::Relaxed),
        }
    }
}

/// Sends requests through an [`HttpClient`], retrying transient failures.
pub struct RetryingFetcher {
    http: Arc<dyn HttpClient>,
    config: RetryConfig,
    counters: Counters,
}

impl RetryingFetcher {
    pub fn new(http: Arc<dyn HttpClient>, config: RetryConfig) -> Self {
        Self {
            http,
            config,
            counters: Counters::default(),
        }
    }

    /// Counters accumulated over every request made so far.
    pub fn stats(&self) -> FetchStats {
        self.counters.snapshot()
    }

    /// Send `request` until it succeeds, fails permanently, runs out of
    /// attempts, or `cancel` fires.
    ///
    /// The same `request` value is sent on every attempt.
    pub async fn fetch_with_retry(
        &self,
        request: &HttpRequest,
        cancel: &CancellationToken,
    ) -> Result<Value> {
        let mut attempt = 0u32;

        loop {
            if cancel.is_cancelled() {
                return Err(ClientError::Cancelled);
            }
            attempt += 1;
            self.counters.attempts.fetch_add(1, Ordering::Relaxed);

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ClientError::Cancelled),
                outcome = self.attempt(request) => outcome,
            };

            let err = match outcome {
                Ok(body) => {
                    if attempt > 1 {
                        debug!(url = %request.url, attempt, "request succeeded after retry");
                    }
                    return Ok(body);
                }
                Err(err) => err,
            };

            if !err.is_retryable() {
                return Err(err);
            }
            self.counters.record_failure(&err);

            if attempt >= self.config.max_attempts {
                warn!(
                    method = %request.method,
                    url = %request.url,
                    attempts = attempt,
                    error = %err,
                    "giving up after transient errors"
                );
                return Err(ClientError::RetriesExhausted {
                    attempts: attempt,
                    last: Box::new(err),
                });
            }

            let delay = compute_delay(&self.config, &err, attempt - 1);
            warn!(
                method = %request.method,
                url = %request.url,
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "retrying after transient error"
            );
            self.counters.retries.fetch_add(1, Ordering::Relaxed);

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ClientError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    async fn attempt(&self, request: &HttpRequest) -> Result<Value> {
        let response = self
            .http
            .send(request)
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        if !response.is_success() {
            return Err(ClientError::from_status(response.status, response.text_lossy()));
        }

        response
            .json::<Value>()
            .map_err(|e| ClientError::InvalidResponse(format!("body is not JSON: {e}")))
    }
}

impl std::fmt::Debug for RetryingFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryingFetcher")
            .field("config", &self.config)
            .field("stats", &self.stats())
            .finish()
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{Scripted, ScriptedHttp};
    use super::*;
    use serde_json::json;

    fn fetcher(script: Vec<Scripted>, config: RetryConfig) -> (Arc<ScriptedHttp>, RetryingFetcher) {
        let http = Arc::new(ScriptedHttp::new(script));
        let fetcher = RetryingFetcher::new(http.clone(), config);
        (http, fetcher)
    }

    fn fast_config(max_attempts: u32) -> RetryConfig {
        RetryConfig {
            max_attempts,
            rate_limit_cooldown: Duration::from_millis(3),
            server_error_cooldown: Duration::from_millis(1),
            max_backoff: Duration::from_millis(10),
        }
    }

    fn request() -> HttpRequest {
        HttpRequest::get("http://clinic.test/api/patients?page=1&limit=20")
            .header("x-api-key", "k")
    }

    #[test]
    fn default_config_matches_cooldowns() {
        let cfg = RetryConfig::default();
        assert_eq!(cfg.rate_limit_cooldown, Duration::from_secs(15));
        assert_eq!(cfg.server_error_cooldown, Duration::from_secs(1));
        assert_eq!(cfg.max_backoff, Duration::from_secs(60));
        assert_eq!(cfg.max_attempts, 8);
    }

    #[test]
    fn zero_attempts_setting_still_allows_one() {
        let settings = RetrySettings {
            max_attempts: 0,
            ..RetrySettings::default()
        };
        assert_eq!(RetryConfig::from(&settings).max_attempts, 1);
    }

    #[test]
    fn delay_depends_on_failure_class() {
        let cfg = RetryConfig::default();
        assert_eq!(compute_delay(&cfg, &ClientError::RateLimited, 0), Duration::from_secs(15));
        assert_eq!(
            compute_delay(&cfg, &ClientError::ServerError { status: 503 }, 0),
            Duration::from_secs(1)
        );
        assert_eq!(
            compute_delay(&cfg, &ClientError::Transport("reset".into()), 0),
            Duration::from_secs(1)
        );
    }

    #[test]
    fn delay_doubles_and_caps() {
        let cfg = RetryConfig::default();
        let err = ClientError::ServerError { status: 500 };
        assert_eq!(compute_delay(&cfg, &err, 1), Duration::from_secs(2));
        assert_eq!(compute_delay(&cfg, &err, 3), Duration::from_secs(8));
        assert_eq!(compute_delay(&cfg, &err, 10), Duration::from_secs(60));
        assert_eq!(compute_delay(&cfg, &ClientError::RateLimited, 3), Duration::from_secs(60));
    }

    #[test]
    fn cap_never_undercuts_cooldown() {
        let cfg = RetryConfig {
            max_backoff: Duration::from_secs(5),
            ..RetryConfig::default()
        };
        assert_eq!(compute_delay(&cfg, &ClientError::RateLimited, 0), Duration::from_secs(15));
        assert_eq!(compute_delay(&cfg, &ClientError::RateLimited, 4), Duration::from_secs(15));
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limit_then_server_error_then_success() {
        let (http, fetcher) = fetcher(
            vec![
                Scripted::empty(429),
                Scripted::empty(500),
                Scripted::json(200, json!({ "data": [{ "patient_id": "DEMO001" }] })),
            ],
            RetryConfig::default(),
        );

        let start = tokio::time::Instant::now();
        let body = fetcher
            .fetch_with_retry(&request(), &CancellationToken::new())
            .await
            .unwrap();
        let waited = start.elapsed();

        assert_eq!(body["data"][0]["patient_id"], "DEMO001");
        assert!(waited >= Duration::from_secs(16), "waited only {waited:?}");

        let gaps = http.gaps();
        assert_eq!(gaps.len(), 2);
        assert!(gaps[0] >= Duration::from_secs(15), "429 cooldown was {:?}", gaps[0]);
        assert!(gaps[1] >= Duration::from_secs(1), "500 cooldown was {:?}", gaps[1]);

        let stats = fetcher.stats();
        assert_eq!(stats.attempts, 3);
        assert_eq!(stats.retries, 2);
        assert_eq!(stats.rate_limited, 1);
        assert_eq!(stats.server_errors, 1);

        let seen = http.requests();
        assert_eq!(seen.len(), 3);
        assert!(seen.iter().all(|r| *r == request()), "every attempt must be identical");
    }

    #[tokio::test(start_paused = true)]
    async fn first_wait_is_the_full_rate_limit_cooldown() {
        let (_http, fetcher) = fetcher(
            vec![Scripted::empty(429), Scripted::json(200, json!({}))],
            RetryConfig::default(),
        );
        let start = tokio::time::Instant::now();
        fetcher
            .fetch_with_retry(&request(), &CancellationToken::new())
            .await
            .unwrap();
        assert!(start.elapsed() >= Duration::from_secs(15));
    }

    #[tokio::test]
    async fn success_first_try_makes_one_attempt() {
        let (http, fetcher) = fetcher(vec![Scripted::json(200, json!({ "ok": true }))], fast_config(3));
        let body = fetcher
            .fetch_with_retry(&request(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(body["ok"], true);
        assert_eq!(http.requests().len(), 1);
        assert_eq!(fetcher.stats().retries, 0);
    }

    #[tokio::test]
    async fn other_status_fails_without_retry() {
        let (http, fetcher) = fetcher(
            vec![Scripted::Status(404, "no such page".into())],
            fast_config(5),
        );
        let err = fetcher
            .fetch_with_retry(&request(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Http { status: 404, .. }), "{err:?}");
        assert_eq!(http.requests().len(), 1);
    }

    #[tokio::test]
    async fn unparseable_success_body_is_an_error() {
        let (_http, fetcher) = fetcher(
            vec![Scripted::Status(200, "<html>maintenance</html>".into())],
            fast_config(3),
        );
        let err = fetcher
            .fetch_with_retry(&request(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn transport_failures_are_retried() {
        let (http, fetcher) = fetcher(
            vec![
                Scripted::Transport("connection reset"),
                Scripted::json(200, json!({ "data": [] })),
            ],
            fast_config(3),
        );
        fetcher
            .fetch_with_retry(&request(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(http.requests().len(), 2);
        assert_eq!(fetcher.stats().transport_errors, 1);
    }

    #[tokio::test]
    async fn attempts_are_bounded() {
        let (http, fetcher) = fetcher(vec![Scripted::empty(503)], fast_config(4));
        let err = fetcher
            .fetch_with_retry(&request(), &CancellationToken::new())
            .await
            .unwrap_err();
        match err {
            ClientError::RetriesExhausted { attempts, last } => {
                assert_eq!(attempts, 4);
                assert!(matches!(*last, ClientError::ServerError { status: 503 }));
            }
            other => panic!("expected RetriesExhausted, got {other:?}"),
        }
        assert_eq!(http.requests().len(), 4);
        assert_eq!(fetcher.stats().retries, 3);
    }

    #[tokio::test]
    async fn cancelled_before_first_attempt() {
        let (http, fetcher) = fetcher(vec![Scripted::json(200, json!({}))], fast_config(3));
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = fetcher.fetch_with_retry(&request(), &cancel).await.unwrap_err();
        assert!(matches!(err, ClientError::Cancelled));
        assert!(http.requests().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_interrupts_cooldown() {
        let (http, fetcher) = fetcher(vec![Scripted::empty(429)], RetryConfig::default());
        let cancel = CancellationToken::new();

        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(2)).await;
            canceller.cancel();
        });

        let start = tokio::time::Instant::now();
        let err = fetcher.fetch_with_retry(&request(), &cancel).await.unwrap_err();
        assert!(matches!(err, ClientError::Cancelled));
        assert!(start.elapsed() < Duration::from_secs(15));
        assert_eq!(http.requests().len(), 1);
    }
}
