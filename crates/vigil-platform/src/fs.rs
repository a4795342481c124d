//! Filesystem abstraction and native implementation.
//!
//! Only what vigil needs: reading the config file and writing run reports.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

#[async_trait]
pub trait FileSystem: Send + Sync {
    async fn read_to_string(&self, path: &Path) -> std::io::Result<String>;

    /// Write `content`, creating parent directories and replacing any
    /// existing file.
    async fn write_string(&self, path: &Path, content: &str) -> std::io::Result<()>;

    async fn exists(&self, path: &Path) -> bool;

    fn home_dir(&self) -> Option<PathBuf>;
}

/// Native filesystem implementation using [`tokio::fs`].
pub struct NativeFileSystem;

#[async_trait]
impl FileSystem for NativeFileSystem {
    async fn read_to_string(&self, path: &Path) -> std::io::Result<String> {
        tokio::fs::read_to_string(path).await
    }

    async fn write_string(&self, path: &Path, content: &str) -> std::io::Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, content).await
    }

    async fn exists(&self, path: &Path) -> bool {
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }

    fn home_dir(&self) -> Option<PathBuf> {
        dirs::home_dir()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");

        NativeFileSystem.write_string(&path, "{}").await.unwrap();
        assert_eq!(NativeFileSystem.read_to_string(&path).await.unwrap(), "{}");
    }

    #[tokio::test]
    async fn write_creates_parents_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("runs").join("latest.json");

        NativeFileSystem.write_string(&path, "first").await.unwrap();
        NativeFileSystem.write_string(&path, "second").await.unwrap();
        assert_eq!(NativeFileSystem.read_to_string(&path).await.unwrap(), "second");
    }

    #[tokio::test]
    async fn exists_reflects_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.json");
        assert!(!NativeFileSystem.exists(&path).await);
        NativeFileSystem.write_string(&path, "").await.unwrap();
        assert!(NativeFileSystem.exists(&path).await);
    }

    #[tokio::test]
    async fn reading_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(NativeFileSystem
            .read_to_string(&dir.path().join("nope"))
            .await
            .is_err());
    }
}
