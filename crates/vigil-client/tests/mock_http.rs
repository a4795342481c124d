//! Wire-format tests against a local mock of the clinical API.
//!
//! Uses [`wiremock`] and the real reqwest-backed `NativeHttpClient`, so the
//! URL, query, header and body shapes are checked end to end.
//!
//! Coverage:
//! - Page request carries page, limit and the API key
//! - Rate limit then success on one page
//! - Hard HTTP error degrades a page without failing collection
//! - Pagination totals drive the page walk
//! - Submission body and headers

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vigil_client::{
    ApiEndpoint, AssessmentSink, ClientError, CollectorConfig, HttpSubmitter, PageFetcher,
    PaginationCollector, RetryConfig, RetryingFetcher,
};
use vigil_platform::http::{HttpClient, NativeHttpClient};
use vigil_types::config::EmptyPagePolicy;
use vigil_types::{AssessmentPayload, SecretString};

const KEY: &str = "ak_mock_key";

fn http() -> Arc<dyn HttpClient> {
    Arc::new(NativeHttpClient::new(Duration::from_secs(5)).unwrap())
}

fn endpoint(server: &MockServer) -> ApiEndpoint {
    ApiEndpoint::new(format!("{}/api", server.uri()), SecretString::new(KEY))
}

fn fast_retry() -> RetryConfig {
    RetryConfig {
        max_attempts: 3,
        rate_limit_cooldown: Duration::from_millis(20),
        server_error_cooldown: Duration::from_millis(5),
        max_backoff: Duration::from_millis(50),
    }
}

fn page_fetcher(server: &MockServer) -> PageFetcher {
    PageFetcher::new(RetryingFetcher::new(http(), fast_retry()), endpoint(server), 20)
}

fn quick_collector(server: &MockServer) -> PaginationCollector {
    let config = CollectorConfig {
        page_count: 3,
        max_pages: 10,
        page_delay: Duration::ZERO,
        empty_page_retries: 1,
        empty_page_delay: Duration::from_millis(5),
        empty_page_policy: EmptyPagePolicy::Skip,
    };
    PaginationCollector::new(page_fetcher(server), config)
}

fn patients(ids: &[&str]) -> serde_json::Value {
    let data: Vec<_> = ids
        .iter()
        .map(|id| json!({ "patient_id": id, "age": 50, "temperature": 98.6, "blood_pressure": "120/80" }))
        .collect();
    json!({ "data": data })
}

// ── Pages ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn page_request_wire_format() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/patients"))
        .and(query_param("page", "2"))
        .and(query_param("limit", "20"))
        .and(header("x-api-key", KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(patients(&["DEMO021", "DEMO022"])))
        .expect(1)
        .mount(&server)
        .await;

    let page = page_fetcher(&server)
        .fetch_page(2, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(page.number, 2);
    assert_eq!(page.records.len(), 2);
    assert_eq!(page.records[0].patient_id, "DEMO021");
    assert!(!page.is_degraded());
}

#[tokio::test]
async fn rate_limited_page_is_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/patients"))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/patients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(patients(&["DEMO001"])))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = page_fetcher(&server);
    let page = fetcher.fetch_page(1, &CancellationToken::new()).await.unwrap();

    assert_eq!(page.records.len(), 1);
    let stats = fetcher.fetcher().stats();
    assert_eq!(stats.attempts, 2);
    assert_eq!(stats.rate_limited, 1);
}

#[tokio::test]
async fn unauthorized_page_degrades_to_empty() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/patients"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "error": "invalid key" })))
        .expect(1)
        .mount(&server)
        .await;

    let page = page_fetcher(&server)
        .fetch_page(1, &CancellationToken::new())
        .await
        .unwrap();

    assert!(page.is_empty());
    assert!(page.degraded.unwrap().contains("401"));
}

#[tokio::test]
async fn html_success_body_degrades_to_empty() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/patients"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let page = page_fetcher(&server)
        .fetch_page(1, &CancellationToken::new())
        .await
        .unwrap();
    assert!(page.is_degraded());
}

// ── Collection ─────────────────────────────────────────────────────────

#[tokio::test]
async fn collection_follows_total_pages() {
    let server = MockServer::start().await;

    for (n, ids) in [(1, ["A1", "A2"]), (2, ["B1", "B2"])] {
        let mut body = patients(&ids);
        body["pagination"] = json!({ "page": n, "limit": 20, "total": 4, "totalPages": 2, "hasNext": n < 2 });
        Mock::given(method("GET"))
            .and(path("/api/patients"))
            .and(query_param("page", n.to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(1)
            .mount(&server)
            .await;
    }

    let collection = quick_collector(&server)
        .collect_all(&CancellationToken::new())
        .await
        .unwrap();

    let ids: Vec<_> = collection.records.iter().map(|r| r.patient_id.as_str()).collect();
    assert_eq!(ids, ["A1", "A2", "B1", "B2"]);
    assert_eq!(collection.stats.fetched, 2);
}

#[tokio::test]
async fn collection_survives_a_failing_page() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/patients"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(patients(&["P1"])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/patients"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(404))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/patients"))
        .and(query_param("page", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(patients(&["P3"])))
        .mount(&server)
        .await;

    let collection = quick_collector(&server)
        .collect_all(&CancellationToken::new())
        .await
        .unwrap();

    let ids: Vec<_> = collection.records.iter().map(|r| r.patient_id.as_str()).collect();
    assert_eq!(ids, ["P1", "P3"]);
    assert_eq!(collection.stats.degraded, 2);
    assert_eq!(collection.stats.skipped, 1);
}

// ── Submission ─────────────────────────────────────────────────────────

#[tokio::test]
async fn submission_wire_format() {
    let server = MockServer::start().await;

    let expected = json!({
        "high_risk_patients": ["DEMO002", "DEMO031"],
        "fever_patients": ["DEMO005"],
        "data_quality_issues": ["DEMO004"]
    });

    Mock::given(method("POST"))
        .and(path("/api/submit-assessment"))
        .and(header("x-api-key", KEY))
        .and(header("content-type", "application/json"))
        .and(body_json(&expected))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "results": { "score": 91.5 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let payload = AssessmentPayload {
        high_risk_patients: vec!["DEMO002".into(), "DEMO031".into()],
        fever_patients: vec!["DEMO005".into()],
        data_quality_issues: vec!["DEMO004".into()],
    };
    let submitter = HttpSubmitter::new(http(), endpoint(&server));
    let response = submitter
        .submit(&payload, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(response["success"], true);
}

#[tokio::test]
async fn submission_failure_is_reported_once() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/submit-assessment"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let submitter = HttpSubmitter::new(http(), endpoint(&server));
    let err = submitter
        .submit(&AssessmentPayload::default(), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::ServerError { status: 500 }));
}
