use async_trait::async_trait;
use chrono::Utc;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::config::StorageConfig;
use crate::errors::CollaboratorError;
use crate::pipeline::SourceStore;

use super::StoreError;

/// Upper bound on name suffixes tried for uploads landing in the same second.
const MAX_NAME_ATTEMPTS: u32 = 1000;

/// Writes uploaded files as `<unix-seconds>_<file name>` under a directory.
///
/// A name already taken becomes `<unix-seconds>_<n>_<file name>`; existing
/// uploads are never overwritten.
pub struct FsSourceStore {
    dir: PathBuf,
}

impl FsSourceStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store rooted at `storage.uploads_dir`.
    pub fn from_config(storage: &StorageConfig) -> Self {
        Self::new(storage.uploads_dir.clone())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Target path for an upload. Only the last component of `file_name` is kept.
    ///
    /// `attempt` 0 gives the plain name, later attempts insert a counter.
    pub fn target_path(
        &self,
        file_name: &str,
        unix_seconds: i64,
        attempt: u32,
    ) -> Result<PathBuf, StoreError> {
        let base = Path::new(file_name)
            .file_name()
            .and_then(|name| name.to_str())
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| StoreError::InvalidFileName(file_name.to_string()))?;

        let name = if attempt == 0 {
            format!("{}_{}", unix_seconds, base)
        } else {
            format!("{}_{}_{}", unix_seconds, attempt, base)
        };

        Ok(self.dir.join(name))
    }

    async fn write_at(
        &self,
        file_name: &str,
        bytes: &[u8],
        unix_seconds: i64,
    ) -> Result<PathBuf, StoreError> {
        // Reject bad names before touching the filesystem.
        self.target_path(file_name, unix_seconds, 0)?;
        tokio::fs::create_dir_all(&self.dir).await?;

        for attempt in 0..MAX_NAME_ATTEMPTS {
            let path = self.target_path(file_name, unix_seconds, attempt)?;

            let mut file = match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            };

            file.write_all(bytes).await?;
            file.flush().await?;
            debug!("Stored {} bytes at {}", bytes.len(), path.display());

            return Ok(path);
        }

        Err(StoreError::Io(std::io::Error::new(
            ErrorKind::AlreadyExists,
            format!("no free name for {} after {} attempts", file_name, MAX_NAME_ATTEMPTS),
        )))
    }
}

#[async_trait]
impl SourceStore for FsSourceStore {
    async fn store(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, CollaboratorError> {
        Ok(self
            .write_at(file_name, bytes, Utc::now().timestamp())
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_path_strips_directories() {
        let store = FsSourceStore::new("/data/uploads");
        let path = store.target_path("../../etc/payers.xlsx", 1700000000, 0).unwrap();
        assert_eq!(path, PathBuf::from("/data/uploads/1700000000_payers.xlsx"));
    }

    #[test]
    fn test_target_path_rejects_empty_name() {
        let store = FsSourceStore::new("/data/uploads");
        assert!(matches!(
            store.target_path("", 1, 0),
            Err(StoreError::InvalidFileName(_))
        ));
        assert!(store.target_path("..", 1, 0).is_err());
    }

    #[tokio::test]
    async fn test_store_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsSourceStore::new(dir.path().join("nested"));

        let path = store.store("payers.xlsx", b"sheet").await.unwrap();

        assert!(path.starts_with(dir.path().join("nested")));
        assert!(path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap()
            .ends_with("_payers.xlsx"));
        assert_eq!(std::fs::read(&path).unwrap(), b"sheet");
    }

    #[test]
    fn test_target_path_inserts_counter() {
        let store = FsSourceStore::new("/data/uploads");
        let path = store.target_path("payers.xlsx", 1700000000, 2).unwrap();
        assert_eq!(path, PathBuf::from("/data/uploads/1700000000_2_payers.xlsx"));
    }

    #[tokio::test]
    async fn test_same_name_same_second_keeps_both() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsSourceStore::new(dir.path());

        let first = store.write_at("payers.xlsx", b"first", 1700000000).await.unwrap();
        let second = store.write_at("payers.xlsx", b"second", 1700000000).await.unwrap();

        assert_ne!(first, second);
        assert_eq!(first, dir.path().join("1700000000_payers.xlsx"));
        assert_eq!(second, dir.path().join("1700000000_1_payers.xlsx"));
        assert_eq!(std::fs::read(&first).unwrap(), b"first");
        assert_eq!(std::fs::read(&second).unwrap(), b"second");
    }

    #[test]
    fn test_from_config_uses_uploads_dir() {
        let storage = StorageConfig {
            uploads_dir: PathBuf::from("/srv/remit/uploads"),
            ..Default::default()
        };
        let store = FsSourceStore::from_config(&storage);
        assert_eq!(store.dir(), Path::new("/srv/remit/uploads"));
    }
}
