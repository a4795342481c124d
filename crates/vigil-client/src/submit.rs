//! Assessment submission.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use vigil_platform::http::{HttpClient, HttpRequest};
use vigil_types::AssessmentPayload;

use crate::endpoint::ApiEndpoint;
use crate::error::{ClientError, Result};

/// Destination for a finished assessment.
#[async_trait]
pub trait AssessmentSink: Send + Sync {
    /// Deliver `payload` once. Returns the response body.
    async fn submit(&self, payload: &AssessmentPayload, cancel: &CancellationToken) -> Result<Value>;
}

/// `POST {base}/submit-assessment`, one attempt.
pub struct HttpSubmitter {
    http: Arc<dyn HttpClient>,
    endpoint: ApiEndpoint,
}

impl HttpSubmitter {
    pub fn new(http: Arc<dyn HttpClient>, endpoint: ApiEndpoint) -> Self {
        Self { http, endpoint }
    }

    pub fn request(&self, payload: &AssessmentPayload) -> Result<HttpRequest> {
        let request = HttpRequest::post_json(self.endpoint.url("submit-assessment"), payload)?;
        Ok(self.endpoint.authorize(request))
    }
}

#[async_trait]
impl AssessmentSink for HttpSubmitter {
    async fn submit(&self, payload: &AssessmentPayload, cancel: &CancellationToken) -> Result<Value> {
        let request = self.request(payload)?;
        debug!(url = %request.url, "submitting assessment");

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ClientError::Cancelled),
            sent = self.http.send(&request) => sent.map_err(|e| ClientError::Transport(e.to_string()))?,
        };

        if !response.is_success() {
            return Err(ClientError::from_status(response.status, response.text_lossy()));
        }

        info!(status = response.status, "assessment accepted");
        // The response is reported, not validated.
        Ok(response
            .json::<Value>()
            .unwrap_or_else(|_| Value::String(response.text_lossy())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::testing::{Scripted, ScriptedHttp};
    use serde_json::json;
    use vigil_platform::http::Method;
    use vigil_types::SecretString;

    fn submitter(script: Vec<Scripted>) -> (Arc<ScriptedHttp>, HttpSubmitter) {
        let http = Arc::new(ScriptedHttp::new(script));
        let endpoint = ApiEndpoint::new("http://clinic.test/api", SecretString::new("ak_sub"));
        (http.clone(), HttpSubmitter::new(http, endpoint))
    }

    fn payload() -> AssessmentPayload {
        AssessmentPayload {
            high_risk_patients: vec!["DEMO002".into()],
            fever_patients: vec!["DEMO005".into()],
            data_quality_issues: vec![],
        }
    }

    #[tokio::test]
    async fn posts_payload_once() {
        let (http, submitter) = submitter(vec![Scripted::json(200, json!({ "success": true }))]);
        let response = submitter.submit(&payload(), &CancellationToken::new()).await.unwrap();
        assert_eq!(response["success"], true);

        let seen = http.requests();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].method, Method::Post);
        assert_eq!(seen[0].url, "http://clinic.test/api/submit-assessment");
        assert!(seen[0].headers.iter().any(|(k, v)| k == "x-api-key" && v == "ak_sub"));

        let body: Value = serde_json::from_slice(seen[0].body.as_deref().unwrap()).unwrap();
        assert_eq!(
            body,
            json!({
                "high_risk_patients": ["DEMO002"],
                "fever_patients": ["DEMO005"],
                "data_quality_issues": []
            })
        );
    }

    #[tokio::test]
    async fn server_error_is_not_retried() {
        let (http, submitter) = submitter(vec![Scripted::empty(503)]);
        let err = submitter.submit(&payload(), &CancellationToken::new()).await.unwrap_err();
        assert_eq!(err.status(), Some(503));
        assert_eq!(http.requests().len(), 1);
    }

    #[tokio::test]
    async fn non_json_success_body_is_kept_as_text() {
        let (_http, submitter) = submitter(vec![Scripted::Status(200, "accepted".into())]);
        let response = submitter.submit(&payload(), &CancellationToken::new()).await.unwrap();
        assert_eq!(response, json!("accepted"));
    }

    #[tokio::test]
    async fn transport_failure_surfaces() {
        let (_http, submitter) = submitter(vec![Scripted::Transport("connection refused")]);
        let err = submitter.submit(&payload(), &CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, ClientError::Transport(msg) if msg.contains("refused")));
    }
}
