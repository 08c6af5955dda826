//! Google Cloud Storage backend built on the `object_store` crate

use crate::storage::{check_key, BlobStore, BlobWriter, StoreError};
use async_trait::async_trait;
use log::{debug, info, warn};
use object_store::buffered::BufWriter;
use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::path::Path;
use object_store::ObjectStore;
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::io::AsyncWrite;
use tokio::runtime::Handle;

/// Bytes buffered before a write turns into a multipart upload
const WRITE_CAPACITY: usize = 10 * 1024 * 1024;

/// Writes objects into a single GCS bucket
pub struct GcsBlobStore {
    store: Arc<dyn ObjectStore>,
    bucket: String,
    capacity: usize,
}

impl GcsBlobStore {
    /// Build a client for `bucket`, authenticating with a service account key file
    /// when given and with the ambient Google credentials otherwise.
    pub fn new(bucket: &str, credentials_file: Option<&str>) -> Result<Self, StoreError> {
        let mut builder = GoogleCloudStorageBuilder::from_env().with_bucket_name(bucket);
        if let Some(path) = credentials_file {
            builder = builder.with_service_account_path(path);
        }
        let store = builder.build().map_err(|e| StoreError::Config(e.to_string()))?;

        info!("GCS client created for bucket {}", bucket);
        Ok(Self::from_store(Arc::new(store), bucket))
    }

    /// Write through an already configured object store
    pub fn from_store(store: Arc<dyn ObjectStore>, bucket: &str) -> Self {
        Self {
            store,
            bucket: bucket.to_string(),
            capacity: WRITE_CAPACITY,
        }
    }
}

#[async_trait]
impl BlobStore for GcsBlobStore {
    async fn open_writer(&self, key: &str) -> Result<BlobWriter, StoreError> {
        check_key(key)?;
        debug!("Opening gs://{}/{}", self.bucket, key);
        // Small objects go up in a single PUT, larger ones as a multipart upload
        // completed when the writer is shut down.
        let writer = BufWriter::with_capacity(Arc::clone(&self.store), Path::from(key), self.capacity);
        Ok(Box::pin(GcsWriter {
            inner: Some(writer),
            key: key.to_string(),
            finishing: false,
        }))
    }

    fn backend_name(&self) -> &'static str {
        "gcs"
    }
}

/// `BufWriter` that aborts its multipart upload when dropped before shutdown,
/// so a failed photo does not leave uncommitted parts in the bucket.
struct GcsWriter {
    inner: Option<BufWriter>,
    key: String,
    finishing: bool,
}

impl GcsWriter {
    fn writer(&mut self) -> io::Result<&mut BufWriter> {
        self.inner
            .as_mut()
            .ok_or_else(|| io::Error::other(format!("writer for {} already closed", self.key)))
    }
}

impl AsyncWrite for GcsWriter {
    fn poll_write(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
        match self.get_mut().writer() {
            Ok(writer) => Pin::new(writer).poll_write(cx, buf),
            Err(e) => Poll::Ready(Err(e)),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut().writer() {
            Ok(writer) => Pin::new(writer).poll_flush(cx),
            Err(e) => Poll::Ready(Err(e)),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        // Once completion has started the upload can no longer be aborted
        this.finishing = true;
        match this.writer() {
            Ok(writer) => Pin::new(writer).poll_shutdown(cx),
            Err(e) => Poll::Ready(Err(e)),
        }
    }
}

impl Drop for GcsWriter {
    fn drop(&mut self) {
        if self.finishing {
            return;
        }
        let Some(mut writer) = self.inner.take() else {
            return;
        };
        let key = std::mem::take(&mut self.key);
        match Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    match writer.abort().await {
                        Ok(()) => debug!("Aborted unfinished upload of {}", key),
                        Err(e) => warn!("Could not abort unfinished upload of {}: {}", key, e),
                    }
                });
            }
            Err(_) => warn!("No runtime left to abort unfinished upload of {}", key),
        }
    }
}
