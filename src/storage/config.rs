//! Configuration for blob storage backends

use crate::config::StorageConfig;
use crate::storage::{BlobStore, StoreError, gcs_store::GcsBlobStore, local_store::LocalBlobStore, mock_store::MockBlobStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use log::info;

/// Available blob storage backends
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Local,
    Gcs,
    Mock,
}

impl Default for StorageBackend {
    fn default() -> Self {
        StorageBackend::Gcs
    }
}

impl std::str::FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" | "fs" | "filesystem" => Ok(StorageBackend::Local),
            "gcs" | "google" => Ok(StorageBackend::Gcs),
            "mock" | "memory" => Ok(StorageBackend::Mock),
            _ => Err(format!("Unknown storage backend: {}", s))
        }
    }
}

/// Create a storage instance based on the configuration
pub fn create_store(config: &StorageConfig) -> Result<Arc<dyn BlobStore>, StoreError> {
    let store: Arc<dyn BlobStore> = match config.backend {
        StorageBackend::Local => {
            info!("Using local storage backend with base_path: {}", config.base_path);
            Arc::new(LocalBlobStore::new(&config.base_path)?)
        }
        StorageBackend::Gcs => {
            info!("Using GCS storage backend with bucket: {}", config.bucket);
            Arc::new(GcsBlobStore::new(&config.bucket, config.credentials_file.as_deref())?)
        }
        StorageBackend::Mock => {
            info!("Using mock storage backend");
            Arc::new(MockBlobStore::new())
        }
    };
    Ok(store)
}
