//! In-memory notifier for tests and dry runs

use super::Notifier;
use crate::error::ErrorKind;
use crate::ingest::BatchResult;
use async_trait::async_trait;
use log::info;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// What a notifier was told about one batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub upload_identifier: u64,
    pub title: String,
    pub photo_count: usize,
    pub captions: String,
    pub types: String,
}

/// Records every call; can be told to fail
#[derive(Debug, Clone, Default)]
pub struct MockNotifier {
    calls: Arc<Mutex<Vec<Notification>>>,
    failing: Arc<AtomicBool>,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent calls fail with `NotificationFailed`
    pub fn fail(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<Notification> {
        self.calls.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(|p| p.into_inner()).len()
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn notify(&self, batch: &BatchResult) -> Result<(), ErrorKind> {
        self.calls.lock().unwrap_or_else(|p| p.into_inner()).push(Notification {
            upload_identifier: batch.upload_identifier,
            title: batch.title.clone(),
            photo_count: batch.photo_count(),
            captions: batch.joined_captions(),
            types: batch.joined_types(),
        });
        if self.failing.load(Ordering::SeqCst) {
            return Err(ErrorKind::NotificationFailed);
        }
        info!("Mock notification for upload {} ({})", batch.upload_identifier, batch.title);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
