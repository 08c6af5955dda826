//! Local filesystem blob storage implementation

use crate::storage::{check_key, BlobStore, BlobWriter, StoreError};
use async_trait::async_trait;
use log::{debug, info};
use std::path::{Path, PathBuf};

/// Stores each object as a file under `base_path/<key>`
pub struct LocalBlobStore {
    base_path: PathBuf,
}

impl LocalBlobStore {
    pub fn new(base_path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let base_path = base_path.as_ref().to_path_buf();
        if !base_path.exists() {
            std::fs::create_dir_all(&base_path)?;
        }
        info!("Using local storage directory: {}", base_path.display());
        Ok(Self { base_path })
    }

    /// Filesystem location of an object
    pub fn object_path(&self, key: &str) -> PathBuf {
        self.base_path.join(key)
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn open_writer(&self, key: &str) -> Result<BlobWriter, StoreError> {
        check_key(key)?;
        let path = self.object_path(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| StoreError::Open {
                key: key.to_string(),
                reason: e.to_string(),
            })?;
        }

        let file = tokio::fs::File::create(&path).await.map_err(|e| StoreError::Open {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        debug!("Opened local object {} at {}", key, path.display());
        Ok(Box::pin(file))
    }

    fn backend_name(&self) -> &'static str {
        "local"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    #[tokio::test]
    async fn test_local_store_writes_nested_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path()).unwrap();
        let key = "images/raw/gallery/upload3/photo0.jpg";

        let mut writer = store.open_writer(key).await.unwrap();
        writer.write_all(b"Hello, local storage!").await.unwrap();
        writer.shutdown().await.unwrap();

        let stored = std::fs::read(store.object_path(key)).unwrap();
        assert_eq!(stored, b"Hello, local storage!");
    }

    #[tokio::test]
    async fn test_local_store_overwrites_existing_object() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path()).unwrap();
        let key = "images/gallery/upload1/photo0/500w.jpg";

        for payload in [&b"first version"[..], &b"second"[..]] {
            let mut writer = store.open_writer(key).await.unwrap();
            writer.write_all(payload).await.unwrap();
            writer.shutdown().await.unwrap();
        }

        assert_eq!(std::fs::read(store.object_path(key)).unwrap(), b"second");
    }

    #[tokio::test]
    async fn test_local_store_rejects_escaping_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path()).unwrap();
        assert!(store.open_writer("../outside.jpg").await.is_err());
    }
}
