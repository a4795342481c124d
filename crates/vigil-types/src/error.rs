//! Error type shared by the configuration and reporting layers.
//!
//! HTTP and pipeline failures have their own enums in `vigil-client` and
//! `vigil-core`; [`VigilError`] covers what is left: bad configuration and
//! the I/O or JSON work done while loading it or writing reports.

use thiserror::Error;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum VigilError {
    /// Configuration is missing a required value or holds an unusable one.
    #[error("invalid config: {reason}")]
    ConfigInvalid {
        /// What is wrong with the configuration.
        reason: String,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl VigilError {
    pub fn config(reason: impl Into<String>) -> Self {
        Self::ConfigInvalid {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, VigilError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_invalid_display() {
        let err = VigilError::config("api.base_url is not set");
        assert_eq!(err.to_string(), "invalid config: api.base_url is not set");
    }

    #[test]
    fn from_io() {
        let err: VigilError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, VigilError::Io(_)));
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn from_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{nope").unwrap_err();
        let err: VigilError = json_err.into();
        assert!(err.to_string().starts_with("json error:"));
    }
}
