//! Walks the paginated `/patients` listing and accumulates every record.
//!
//! The page count starts at the configured default and is replaced by the
//! API's own `totalPages` (bounded by `max_pages`) as soon as a response
//! reports it. Pages are requested strictly one after another with a
//! pacing pause in between.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use vigil_types::PatientRecord;
use vigil_types::config::{EmptyPagePolicy, FetchConfig};
use vigil_types::report::{FetchStats, PageStats};

use crate::error::{ClientError, Result};
use crate::pages::{Page, PageFetcher};

#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Pages to fetch when the API does not say how many there are.
    pub page_count: u32,
    /// Upper bound on pages regardless of what the API reports.
    pub max_pages: u32,
    /// Pause between successive page requests.
    pub page_delay: Duration,
    /// Re-attempts for a page that comes back empty.
    pub empty_page_retries: u32,
    /// First re-attempt delay for an empty page; doubles each time.
    pub empty_page_delay: Duration,
    pub empty_page_policy: EmptyPagePolicy,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self::from(&FetchConfig::default())
    }
}

impl From<&FetchConfig> for CollectorConfig {
    fn from(fetch: &FetchConfig) -> Self {
        Self {
            page_count: fetch.default_page_count,
            max_pages: fetch.max_pages.max(1),
            page_delay: Duration::from_millis(fetch.page_delay_ms),
            empty_page_retries: fetch.empty_page_retries,
            empty_page_delay: Duration::from_millis(fetch.empty_page_delay_ms),
            empty_page_policy: fetch.empty_page_policy,
        }
    }
}

/// Everything collected in one pass.
#[derive(Debug, Clone, Default)]
pub struct Collection {
    /// Page order, then within-page order.
    pub records: Vec<PatientRecord>,
    pub stats: PageStats,
}

pub struct PaginationCollector {
    pages: PageFetcher,
    config: CollectorConfig,
}

impl PaginationCollector {
    pub fn new(pages: PageFetcher, config: CollectorConfig) -> Self {
        Self { pages, config }
    }

    /// Retry counters from the underlying fetcher.
    pub fn fetch_stats(&self) -> FetchStats {
        self.pages.fetcher().stats()
    }

    /// Fetch every page and concatenate the records.
    pub async fn collect_all(&self, cancel: &CancellationToken) -> Result<Collection> {
        let mut collection = Collection::default();
        let mut target = self.config.page_count.min(self.config.max_pages).max(1);
        let mut number = 1u32;

        while number <= target {
            if number > 1 {
                pause(self.config.page_delay, cancel).await?;
            }

            let (page, attempts) = self
                .fetch_non_empty(number, &mut collection.stats, cancel)
                .await?;
            collection.stats.dropped_entries += page.dropped_entries;

            if let Some(info) = &page.pagination {
                if let Some(total) = info.total_pages {
                    let bounded = total.min(self.config.max_pages);
                    if bounded != target {
                        debug!(page = number, total_pages = total, pages = bounded, "page count from API");
                    }
                    target = bounded;
                }
                if info.has_next == Some(false) {
                    target = target.min(number);
                }
            }

            if page.is_empty() {
                if page.is_exhausted() {
                    info!(page = number, "API reports no further pages");
                    break;
                }
                match self.config.empty_page_policy {
                    EmptyPagePolicy::Skip => {
                        warn!(page = number, attempts, "page still empty, skipping");
                        collection.stats.skipped += 1;
                    }
                    EmptyPagePolicy::Abort => {
                        return Err(ClientError::PageUnavailable {
                            page: number,
                            attempts,
                        });
                    }
                }
            } else {
                collection.stats.fetched += 1;
                info!(
                    page = number,
                    of = target,
                    records = page.records.len(),
                    "collected page"
                );
                collection.records.extend(page.records);
            }

            number += 1;
        }

        info!(
            records = collection.records.len(),
            pages = collection.stats.fetched,
            skipped = collection.stats.skipped,
            "collection complete"
        );
        Ok(collection)
    }

    /// Fetch page `number`, re-attempting while it comes back empty.
    /// Returns the last page seen and how many times it was requested.
    async fn fetch_non_empty(
        &self,
        number: u32,
        stats: &mut PageStats,
        cancel: &CancellationToken,
    ) -> Result<(Page, u32)> {
        let mut retries = 0u32;
        loop {
            let page = self.pages.fetch_page(number, cancel).await?;
            if page.is_degraded() {
                stats.degraded += 1;
            }
            if !page.is_empty() || page.is_exhausted() || retries >= self.config.empty_page_retries {
                return Ok((page, retries + 1));
            }

            let delay = self
                .config
                .empty_page_delay
                .saturating_mul(2u32.saturating_pow(retries));
            retries += 1;
            stats.empty_retries += 1;
            warn!(
                page = number,
                attempt = retries,
                delay_ms = delay.as_millis() as u64,
                "page came back empty, re-requesting"
            );
            pause(delay, cancel).await?;
        }
    }
}

/// Sleep for `delay` unless cancelled first.
pub(crate) async fn pause(delay: Duration, cancel: &CancellationToken) -> Result<()> {
    if delay.is_zero() {
        return if cancel.is_cancelled() {
            Err(ClientError::Cancelled)
        } else {
            Ok(())
        };
    }
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ClientError::Cancelled),
        _ = tokio::time::sleep(delay) => Ok(()),
    }
}
