//! Clinical API endpoint: base URL plus credential.

use vigil_platform::http::HttpRequest;
use vigil_types::SecretString;

/// Header carrying the API key on every request.
pub const API_KEY_HEADER: &str = "x-api-key";

#[derive(Debug, Clone)]
pub struct ApiEndpoint {
    base_url: String,
    api_key: SecretString,
}

impl ApiEndpoint {
    /// `base_url` includes the `/api` segment, e.g. `https://host/api`.
    pub fn new(base_url: impl Into<String>, api_key: SecretString) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, api_key }
    }

    /// Absolute URL for `path` under the base URL.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Attach the API key header.
    pub fn authorize(&self, request: HttpRequest) -> HttpRequest {
        request.header(API_KEY_HEADER, self.api_key.expose())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_without_double_slash() {
        let ep = ApiEndpoint::new("https://clinic.example/api/", SecretString::new("k"));
        assert_eq!(ep.url("/patients?page=1"), "https://clinic.example/api/patients?page=1");
        assert_eq!(ep.url("submit-assessment"), "https://clinic.example/api/submit-assessment");
    }

    #[test]
    fn authorize_adds_key_header() {
        let ep = ApiEndpoint::new("http://x/api", SecretString::new("ak_123"));
        let req = ep.authorize(HttpRequest::get(ep.url("patients")));
        assert!(req
            .headers
            .iter()
            .any(|(k, v)| k == API_KEY_HEADER && v == "ak_123"));
    }

    #[test]
    fn debug_does_not_leak_key() {
        let ep = ApiEndpoint::new("http://x/api", SecretString::new("ak_123"));
        assert!(!format!("{ep:?}").contains("ak_123"));
    }
}
