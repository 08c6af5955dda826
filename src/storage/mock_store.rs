//! Mock implementation of BlobStore for testing

use crate::storage::{check_key, BlobStore, BlobWriter, StoreError};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll};
use tokio::io::AsyncWrite;
use log::info;

/// In-memory object store with failure injection
pub struct MockBlobStore {
    // key -> committed object bytes
    objects: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    failing_writes: Mutex<HashSet<String>>,
    failing_closes: Mutex<HashSet<String>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockBlobStore {
    pub fn new() -> Self {
        Self {
            objects: Arc::new(Mutex::new(HashMap::new())),
            failing_writes: Mutex::new(HashSet::new()),
            failing_closes: Mutex::new(HashSet::new()),
        }
    }

    /// Make every write to `key` fail partway
    pub fn fail_writes_to(&self, key: &str) {
        lock(&self.failing_writes).insert(key.to_string());
    }

    /// Make finalizing `key` fail after its data was written
    pub fn fail_close_of(&self, key: &str) {
        lock(&self.failing_closes).insert(key.to_string());
    }

    /// Get the number of committed objects
    pub fn object_count(&self) -> usize {
        lock(&self.objects).len()
    }

    /// Check if an object has been committed
    pub fn object_exists(&self, key: &str) -> bool {
        lock(&self.objects).contains_key(key)
    }

    /// Committed bytes of an object
    pub fn get_object(&self, key: &str) -> Option<Vec<u8>> {
        lock(&self.objects).get(key).cloned()
    }

    /// All committed keys, sorted
    pub fn list_objects(&self) -> Vec<String> {
        let mut keys: Vec<String> = lock(&self.objects).keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Compare an object's MD5 against a hex digest
    pub fn verify_object(&self, key: &str, md5_hex: &str) -> Result<bool, StoreError> {
        let objects = lock(&self.objects);
        let data = objects.get(key).ok_or_else(|| StoreError::InvalidKey(format!("{} does not exist", key)))?;
        Ok(hex::encode(md5::compute(data).0) == md5_hex)
    }

    /// Clear all data from the store
    pub fn clear(&self) {
        lock(&self.objects).clear();
    }
}

impl Default for MockBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BlobStore for MockBlobStore {
    async fn open_writer(&self, key: &str) -> Result<BlobWriter, StoreError> {
        check_key(key)?;
        Ok(Box::pin(MockWriter {
            key: key.to_string(),
            buffer: Vec::new(),
            objects: Arc::clone(&self.objects),
            fail_write: lock(&self.failing_writes).contains(key),
            fail_close: lock(&self.failing_closes).contains(key),
        }))
    }

    fn backend_name(&self) -> &'static str {
        "mock"
    }
}

/// Buffers writes and commits them to the shared map on shutdown
struct MockWriter {
    key: String,
    buffer: Vec<u8>,
    objects: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    fail_write: bool,
    fail_close: bool,
}

impl AsyncWrite for MockWriter {
    fn poll_write(self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        if this.fail_write {
            return Poll::Ready(Err(io::Error::new(io::ErrorKind::BrokenPipe, "mock write failure")));
        }
        this.buffer.extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        if this.fail_close {
            return Poll::Ready(Err(io::Error::new(io::ErrorKind::Other, "mock close failure")));
        }
        let data = std::mem::take(&mut this.buffer);
        info!("Mock: Committed object {} with size {}", this.key, data.len());
        lock(&this.objects).insert(this.key.clone(), data);
        Poll::Ready(Ok(()))
    }
}
