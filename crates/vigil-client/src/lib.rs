//! Resilient client for the clinical patient API.
//!
//! Layers, innermost first:
//!
//! - [`RetryingFetcher`] sends one request with status-aware, bounded
//!   exponential backoff
//! - [`PageFetcher`] fetches one page of patients and degrades failures to
//!   an empty page
//! - [`PaginationCollector`] walks the page range and concatenates records
//! - [`HttpSubmitter`] posts the finished assessment, once
//!
//! Every async entry point takes a [`CancellationToken`] that is honoured
//! before each request and during each wait.
//!
//! [`CancellationToken`]: tokio_util::sync::CancellationToken

pub mod collector;
pub mod endpoint;
pub mod error;
pub mod pages;
pub mod retry;
pub mod submit;

pub use collector::{Collection, CollectorConfig, PaginationCollector};
pub use endpoint::ApiEndpoint;
pub use error::{ClientError, Result};
pub use pages::{Page, PageFetcher, PaginationInfo};
pub use retry::{RetryConfig, RetryingFetcher};
pub use submit::{AssessmentSink, HttpSubmitter};
