//! Client error types.
//!
//! All client operations return [`Result<T>`] with [`ClientError`]. The
//! variants split into transient failures that the retrying fetcher absorbs
//! ([`ClientError::is_retryable`]) and everything else, which surfaces to
//! the caller.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    /// A non-success status that is not retried.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// HTTP 429.
    #[error("rate limited (HTTP 429)")]
    RateLimited,

    /// HTTP 500 or 503.
    #[error("server error (HTTP {status})")]
    ServerError { status: u16 },

    /// The exchange did not complete (connect, TLS, timeout, body read).
    #[error("transport error: {0}")]
    Transport(String),

    /// A success status whose body is not JSON.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Transient failures continued past the attempt ceiling.
    #[error("gave up after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last: Box<ClientError>,
    },

    /// A page stayed empty through all of its re-attempts.
    #[error("page {page} still empty after {attempts} attempts")]
    PageUnavailable { page: u32, attempts: u32 },

    #[error("cancelled")]
    Cancelled,
}

impl ClientError {
    /// Classify a non-success status from a fetch.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            429 => Self::RateLimited,
            500 | 503 => Self::ServerError { status },
            _ => Self::Http { status, body },
        }
    }

    /// Whether waiting and re-sending the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited | Self::ServerError { .. } | Self::Transport(_)
        )
    }

    /// The HTTP status behind this error, if there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } | Self::ServerError { status } => Some(*status),
            Self::RateLimited => Some(429),
            Self::RetriesExhausted { last, .. } => last.status(),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
