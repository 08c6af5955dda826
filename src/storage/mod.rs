//! Object Store Abstraction
//!
//! This module provides an abstraction over blob storage backends, allowing
//! the ingestion pipeline to write to a local directory, Google Cloud Storage,
//! or an in-memory store without affecting the higher-level services.

pub mod config;
pub mod gcs_store;
pub mod keys;
pub mod local_store;
pub mod mock_store;

#[cfg(test)]
mod comprehensive_test;

use async_trait::async_trait;
use std::pin::Pin;
use thiserror::Error;
use tokio::io::AsyncWrite;

/// Streaming writer for one object. Shutting it down finalizes the object.
pub type BlobWriter = Pin<Box<dyn AsyncWrite + Send>>;

/// Errors raised by storage backends
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Invalid object key: {0}")]
    InvalidKey(String),

    #[error("Failed to open object {key}: {reason}")]
    Open { key: String, reason: String },

    #[error("Storage backend misconfigured: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Trait defining the blob storage interface
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Open a writer for `key`. Data becomes visible once the writer is shut down.
    async fn open_writer(&self, key: &str) -> Result<BlobWriter, StoreError>;

    /// Short backend name for logs
    fn backend_name(&self) -> &'static str;
}

/// Reject keys that could escape a key namespace
pub(crate) fn check_key(key: &str) -> Result<(), StoreError> {
    if key.is_empty() || key.starts_with('/') || key.split('/').any(|part| part.is_empty() || part == "." || part == "..") {
        return Err(StoreError::InvalidKey(key.to_string()));
    }
    Ok(())
}
