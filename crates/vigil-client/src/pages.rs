//! Single-page retrieval from `GET /patients`.
//!
//! A page never fails outright. Whatever goes wrong below the retry layer
//! (hard HTTP errors, exhausted retries, unparseable bodies) comes back as
//! an empty [`Page`] carrying the reason, so pagination can carry on. Only
//! cancellation propagates.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use vigil_platform::http::HttpRequest;
use vigil_types::PatientRecord;

use crate::endpoint::ApiEndpoint;
use crate::error::{ClientError, Result};
use crate::retry::RetryingFetcher;

/// Pagination block returned alongside the records. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationInfo {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default, alias = "totalPages")]
    pub total_pages: Option<u32>,
    #[serde(default, alias = "hasNext")]
    pub has_next: Option<bool>,
}

impl PaginationInfo {
    /// Whether `page` lies beyond what the API says it holds.
    pub fn is_past_end(&self, page: u32) -> bool {
        self.total == Some(0) || self.total_pages.is_some_and(|total| page > total)
    }

    /// Whether the API says nothing follows `page`, either because `page`
    /// lies past the end or because `hasNext` is false.
    pub fn is_exhausted(&self, page: u32) -> bool {
        self.has_next == Some(false) || self.is_past_end(page)
    }
}

/// One page of patients.
#[derive(Debug, Clone, Default)]
pub struct Page {
    /// 1-based page number.
    pub number: u32,
    pub records: Vec<PatientRecord>,
    pub pagination: Option<PaginationInfo>,
    /// Entries in the record list that were not usable patient objects.
    pub dropped_entries: u32,
    /// Why the page was degraded to empty, if it was.
    pub degraded: Option<String>,
}

impl Page {
    fn degraded(number: u32, reason: String) -> Self {
        Self {
            number,
            degraded: Some(reason),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded.is_some()
    }

    /// Whether the API reported no data at or after this page.
    pub fn is_exhausted(&self) -> bool {
        self.pagination
            .as_ref()
            .is_some_and(|info| info.is_exhausted(self.number))
    }
}

/// Extract a [`Page`] from a `/patients` response body.
///
/// The record list is read from `data` (or `patients`, or the body itself
/// when it is an array). Anything else yields an empty page.
pub fn parse_page(number: u32, body: &Value) -> Page {
    let entries = match body {
        Value::Array(items) => Some(items),
        Value::Object(map) => ["data", "patients"]
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_array)),
        _ => None,
    };

    let pagination = body
        .get("pagination")
        .and_then(|raw| serde_json::from_value::<PaginationInfo>(raw.clone()).ok());

    let mut page = Page {
        number,
        pagination,
        ..Page::default()
    };

    let Some(entries) = entries else {
        debug!(page = number, "response has no record list");
        return page;
    };

    for entry in entries {
        if !entry.is_object() {
            page.dropped_entries += 1;
            continue;
        }
        match serde_json::from_value::<PatientRecord>(entry.clone()) {
            Ok(record) => page.records.push(record),
            Err(e) => {
                debug!(page = number, error = %e, "dropping unusable patient entry");
                page.dropped_entries += 1;
            }
        }
    }

    page
}

/// Fetches individual pages through a [`RetryingFetcher`].
pub struct PageFetcher {
    fetcher: RetryingFetcher,
    endpoint: ApiEndpoint,
    page_size: u32,
}

impl PageFetcher {
    pub fn new(fetcher: RetryingFetcher, endpoint: ApiEndpoint, page_size: u32) -> Self {
        Self {
            fetcher,
            endpoint,
            page_size: page_size.max(1),
        }
    }

    pub fn fetcher(&self) -> &RetryingFetcher {
        &self.fetcher
    }

    /// The request for page `number`, identical across retries.
    pub fn request(&self, number: u32) -> HttpRequest {
        let url = self
            .endpoint
            .url(&format!("patients?page={number}&limit={}", self.page_size));
        self.endpoint.authorize(HttpRequest::get(url))
    }

    /// Fetch page `number`. Errors other than cancellation degrade the
    /// page to empty.
    pub async fn fetch_page(&self, number: u32, cancel: &CancellationToken) -> Result<Page> {
        let request = self.request(number);

        match self.fetcher.fetch_with_retry(&request, cancel).await {
            Ok(body) => {
                let page = parse_page(number, &body);
                if page.dropped_entries > 0 {
                    warn!(
                        page = number,
                        dropped = page.dropped_entries,
                        "page contained unusable patient entries"
                    );
                }
                debug!(page = number, records = page.records.len(), "page fetched");
                Ok(page)
            }
            Err(ClientError::Cancelled) => Err(ClientError::Cancelled),
            Err(e) => {
                warn!(
                    page = number,
                    status = e.status(),
                    error = %e,
                    "page request failed, treating page as empty"
                );
                Ok(Page::degraded(number, e.to_string()))
            }
        }
    }
}
