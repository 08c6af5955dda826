//! Streams local files into the object store

use crate::error::ErrorKind;
use crate::storage::BlobStore;
use log::{error, info};
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};

const CHUNK_SIZE: usize = 64 * 1024;

/// What was written for one key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub key: String,
    pub bytes: u64,
    pub md5: String,
}

/// Copies byte streams to object keys, chunk by chunk
#[derive(Clone)]
pub struct BlobUploader {
    store: Arc<dyn BlobStore>,
}

impl BlobUploader {
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self { store }
    }

    pub fn backend_name(&self) -> &'static str {
        self.store.backend_name()
    }

    /// Upload the file at `path` to `key`
    pub async fn upload_file(&self, path: &Path, key: &str) -> Result<UploadReceipt, ErrorKind> {
        let mut file = tokio::fs::File::open(path).await.map_err(|e| {
            error!("Could not open {} for upload: {}", path.display(), e);
            ErrorKind::TransferFailed
        })?;
        self.upload(&mut file, key).await
    }

    /// Copy `reader` to `key`. A failure while copying is `TransferFailed`; a failure
    /// finalizing the object afterwards is `StoreCloseFailed`. Either way the remote
    /// state of `key` is undefined.
    pub async fn upload<R>(&self, reader: &mut R, key: &str) -> Result<UploadReceipt, ErrorKind>
    where
        R: AsyncRead + Unpin + Send + ?Sized,
    {
        let mut writer = self.store.open_writer(key).await.map_err(|e| {
            error!("Could not open {} on {} store: {}", key, self.store.backend_name(), e);
            ErrorKind::TransferFailed
        })?;

        let mut digest = md5::Context::new();
        let mut buffer = vec![0u8; CHUNK_SIZE];
        let mut bytes: u64 = 0;
        loop {
            let read = reader.read(&mut buffer).await.map_err(|e| {
                error!("Read failed while uploading {}: {}", key, e);
                ErrorKind::TransferFailed
            })?;
            if read == 0 {
                break;
            }
            writer.write_all(&buffer[..read]).await.map_err(|e| {
                error!("Transfer to {} failed after {} bytes: {}", key, bytes, e);
                ErrorKind::TransferFailed
            })?;
            digest.consume(&buffer[..read]);
            bytes += read as u64;
        }

        writer.shutdown().await.map_err(|e| {
            error!("Could not finalize {}: {}", key, e);
            ErrorKind::StoreCloseFailed
        })?;

        let md5 = hex::encode(digest.compute().0);
        info!("Uploaded {} ({} bytes, md5 {})", key, bytes, md5);
        Ok(UploadReceipt {
            key: key.to_string(),
            bytes,
            md5,
        })
    }
}
