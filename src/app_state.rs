//! Application State Management
//!
//! This module provides the application state that contains the batch
//! orchestrator and its collaborators, following the dependency injection pattern.

use std::sync::Arc;
use log::info;
use tokio::runtime::Handle;

use crate::config::AppConfig;
use crate::ingest::counter::UploadCounter;
use crate::ingest::orchestrator::{BatchOrchestrator, PipelineOptions};
use crate::ingest::transcoder::{ExternalTranscoder, Transcoder};
use crate::ingest::uploader::BlobUploader;
use crate::notifier::{create_notifier, MockNotifier, Notifier};
use crate::storage::config::create_store;
use crate::storage::mock_store::MockBlobStore;
use crate::storage::BlobStore;

/// Application state shared by every HTTP worker
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<BatchOrchestrator>,
    pub config: AppConfig,
}

impl AppState {
    /// Create application state from configuration. Photo tasks run on `workers`.
    pub fn from_config(config: AppConfig, workers: Handle) -> Result<Self, Box<dyn std::error::Error>> {
        info!("Initializing application state with configuration");

        let store = create_store(&config.storage)?;
        let transcoder: Arc<dyn Transcoder> = Arc::new(ExternalTranscoder::with_args(
            &config.ingest.transcoder_path,
            config.ingest.transcoder_args.clone(),
        ));
        let notifier = create_notifier(&config.notifier)?;

        let state = Self::from_parts(config, store, transcoder, notifier, workers)?;
        info!("Application state initialized successfully");
        Ok(state)
    }

    /// Assemble state from explicit collaborators
    pub fn from_parts(
        config: AppConfig,
        store: Arc<dyn BlobStore>,
        transcoder: Arc<dyn Transcoder>,
        notifier: Arc<dyn Notifier>,
        workers: Handle,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let work_dir = config.temp_dir();
        std::fs::create_dir_all(&work_dir)?;
        info!(
            "Ingest work dir {}, transcode {}, uploads start at {}",
            work_dir.display(),
            config.ingest.transcode,
            config.ingest.upload_offset
        );

        let orchestrator = BatchOrchestrator::new(
            BlobUploader::new(store),
            transcoder,
            notifier,
            Arc::new(UploadCounter::new(config.ingest.upload_offset)),
            PipelineOptions::from(&config.ingest),
            config.ingest.shared_secret.clone(),
            work_dir,
            workers,
        );

        Ok(Self {
            orchestrator: Arc::new(orchestrator),
            config,
        })
    }

    /// Create application state for testing with mock backends and no transcoding.
    /// Must be called from within a tokio runtime.
    pub fn new_for_testing(work_dir: &std::path::Path) -> Result<(Self, Arc<MockBlobStore>, MockNotifier), Box<dyn std::error::Error>> {
        let mut config = AppConfig::default();
        config.ingest.transcode = false;
        config.ingest.temp_dir = work_dir.to_string_lossy().into_owned();

        let store = Arc::new(MockBlobStore::new());
        let notifier = MockNotifier::new();
        let transcoder: Arc<dyn Transcoder> = Arc::new(ExternalTranscoder::new(&config.ingest.transcoder_path));
        let state = Self::from_parts(
            config,
            store.clone(),
            transcoder,
            Arc::new(notifier.clone()),
            Handle::current(),
        )?;
        Ok((state, store, notifier))
    }
}
