//! Platform abstraction layer for vigil.
//!
//! The pipeline never touches reqwest, tokio::fs or std::env directly; it
//! goes through the capability traits here so tests can substitute
//! scripted HTTP responses and fixed environments.
//!
//! - [`http::HttpClient`] sends one request, no retries.
//! - [`fs::FileSystem`] reads config and writes reports.
//! - [`env::Environment`] resolves credentials and overrides.
//! - [`config_loader`] discovers and loads the JSON config file.

pub mod config_loader;
pub mod env;
pub mod fs;
pub mod http;

use std::sync::Arc;
use std::time::Duration;

/// Bundle of platform capabilities.
pub trait Platform: Send + Sync {
    fn fs(&self) -> &dyn fs::FileSystem;
}

/// Native platform: reqwest and tokio::fs. The process environment is read
/// through [`env::NativeEnvironment`] before the platform exists, since the
/// HTTP timeout comes from the loaded config.
pub struct NativePlatform {
    http: Arc<http::NativeHttpClient>,
    fs: fs::NativeFileSystem,
}

impl NativePlatform {
    /// Build the native platform with the given HTTP request timeout.
    pub fn new(request_timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            http: Arc::new(http::NativeHttpClient::new(request_timeout)?),
            fs: fs::NativeFileSystem,
        })
    }

    /// A shared handle to the HTTP client for long-lived pipeline stages.
    pub fn shared_http(&self) -> Arc<dyn http::HttpClient> {
        self.http.clone()
    }
}

impl Platform for NativePlatform {
    fn fs(&self) -> &dyn fs::FileSystem {
        &self.fs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn native_platform_writes_through_fs() {
        let platform = NativePlatform::new(Duration::from_secs(10)).unwrap();
        let _shared = platform.shared_http();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("report.json");
        platform.fs().write_string(&path, "{}").await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");
    }

    #[test]
    fn platform_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<NativePlatform>();
    }
}
