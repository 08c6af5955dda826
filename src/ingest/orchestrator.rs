//! Batch orchestration
//!
//! A batch moves through `Received -> Validating -> Processing -> Aggregating`
//! and ends `Completed` or `Failed`. Request-level checks run before any photo
//! work. Each photo then gets its own task on the ingest runtime; a failed photo
//! never cancels its siblings. Results land in slots indexed by submission order
//! and a single aggregation step picks the lowest-index failure as the batch error.

use crate::error::ErrorKind;
use crate::ingest::counter::UploadCounter;
use crate::ingest::transcoder::Transcoder;
use crate::ingest::uploader::BlobUploader;
use crate::ingest::{validator, BatchResult, ImageExtension, PhotoFile, PhotoResult, PhotoSubmission, SinglePhotoRequest, UploadRequest};
use crate::logging;
use crate::notifier::Notifier;
use crate::storage::keys;
use futures::stream::{FuturesUnordered, StreamExt};
use log::{debug, error, info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Handle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BatchState {
    Received,
    Validating,
    Processing,
    Aggregating,
    Completed,
    Failed,
}

/// Per-photo processing switches
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub transcode: bool,
    pub rendition_labels: Vec<String>,
    pub notify_on_partial_failure: bool,
}

impl From<&crate::config::IngestConfig> for PipelineOptions {
    fn from(config: &crate::config::IngestConfig) -> Self {
        Self {
            transcode: config.transcode,
            rendition_labels: config.rendition_labels.clone(),
            notify_on_partial_failure: config.notify_on_partial_failure,
        }
    }
}

/// Runs batches and single-photo uploads on a dedicated multi-threaded runtime
pub struct BatchOrchestrator {
    uploader: BlobUploader,
    transcoder: Arc<dyn Transcoder>,
    notifier: Arc<dyn Notifier>,
    counter: Arc<UploadCounter>,
    options: PipelineOptions,
    shared_secret: String,
    work_dir: PathBuf,
    workers: Handle,
}

impl BatchOrchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        uploader: BlobUploader,
        transcoder: Arc<dyn Transcoder>,
        notifier: Arc<dyn Notifier>,
        counter: Arc<UploadCounter>,
        options: PipelineOptions,
        shared_secret: String,
        work_dir: PathBuf,
        workers: Handle,
    ) -> Self {
        Self {
            uploader,
            transcoder,
            notifier,
            counter,
            options,
            shared_secret,
            work_dir,
            workers,
        }
    }

    pub fn counter(&self) -> &UploadCounter {
        &self.counter
    }

    /// Directory spooled photos and per-photo workspaces live in
    pub fn work_dir(&self) -> &std::path::Path {
        &self.work_dir
    }

    /// Process a whole batch. The batch runs to completion on the ingest runtime
    /// even if the caller stops waiting.
    pub async fn run(self: &Arc<Self>, request: UploadRequest) -> BatchResult {
        let title = request.title.clone();
        let this = Arc::clone(self);
        match self.workers.spawn(logging::carry_peer(async move { this.execute(request).await })).await {
            Ok(batch) => batch,
            Err(e) => {
                error!("Batch {:?} stopped unexpectedly: {}", title, e);
                BatchResult {
                    upload_identifier: self.counter.peek(),
                    title,
                    photo_results: Vec::new(),
                    overall_error: Some(ErrorKind::WorkerFailed),
                }
            }
        }
    }

    /// Store one photo under its date-keyed path and return the key
    pub async fn run_single(self: &Arc<Self>, request: SinglePhotoRequest) -> Result<String, ErrorKind> {
        let this = Arc::clone(self);
        self.workers
            .spawn(logging::carry_peer(async move { this.store_single(request).await }))
            .await
            .map_err(|e| {
                error!("Single photo upload stopped unexpectedly: {}", e);
                ErrorKind::WorkerFailed
            })?
    }

    fn transition(&self, title: &str, upload_id: Option<u64>, state: BatchState) {
        match upload_id {
            Some(id) => debug!("Batch {:?} (upload{}) -> {:?}", title, id, state),
            None => debug!("Batch {:?} -> {:?}", title, state),
        }
    }

    fn validate_request(&self, request: &UploadRequest) -> Result<(), ErrorKind> {
        if request.title.is_empty() {
            return Err(ErrorKind::MissingTitle);
        }
        if request.shared_secret != self.shared_secret {
            return Err(ErrorKind::BadPassphrase);
        }
        if request.items.len() != request.photo_count {
            return Err(ErrorKind::InvalidPhotoCount);
        }
        Ok(())
    }

    async fn execute(self: Arc<Self>, request: UploadRequest) -> BatchResult {
        self.transition(&request.title, None, BatchState::Received);
        self.transition(&request.title, None, BatchState::Validating);
        if let Err(e) = self.validate_request(&request) {
            warn!("Rejected batch {:?}: {}", request.title, e);
            self.transition(&request.title, None, BatchState::Failed);
            return BatchResult {
                upload_identifier: self.counter.peek(),
                title: request.title,
                photo_results: Vec::new(),
                overall_error: Some(e),
            };
        }

        let UploadRequest { title, items, .. } = request;
        let lease = self.counter.reserve();
        let upload_id = lease.id();
        info!("Processing batch {:?} as upload{} with {} photos", title, upload_id, items.len());
        self.transition(&title, Some(upload_id), BatchState::Processing);

        let mut slots: Vec<Option<PhotoResult>> = (0..items.len()).map(|_| None).collect();
        let mut pending = FuturesUnordered::new();
        for (slot, submission) in items.into_iter().enumerate() {
            let index = submission.index;
            let caption = submission.caption.clone();
            let this = Arc::clone(&self);
            let task = self
                .workers
                .spawn(logging::carry_peer(async move { this.process_photo(upload_id, submission).await }));
            pending.push(async move { (slot, index, caption, task.await) });
        }

        while let Some((slot, index, caption, joined)) = pending.next().await {
            let result = joined.unwrap_or_else(|e| {
                error!("Task for photo {} of upload{} stopped unexpectedly: {}", index, upload_id, e);
                PhotoResult::failed(index, caption, ErrorKind::WorkerFailed)
            });
            slots[slot] = Some(result);
        }

        self.transition(&title, Some(upload_id), BatchState::Aggregating);
        let photo_results: Vec<PhotoResult> = slots
            .into_iter()
            .enumerate()
            .map(|(slot, result)| {
                result.unwrap_or_else(|| PhotoResult::failed(slot, String::new(), ErrorKind::WorkerFailed))
            })
            .collect();
        let overall_error = photo_results.iter().find_map(|r| r.error.clone());
        let mut batch = BatchResult {
            upload_identifier: upload_id,
            title,
            photo_results,
            overall_error,
        };

        if batch.is_success() || self.options.notify_on_partial_failure {
            if let Err(e) = self.notifier.notify(&batch).await {
                error!("{} notifier failed for upload{}: {}", self.notifier.name(), upload_id, e);
                if batch.overall_error.is_none() {
                    batch.overall_error = Some(e);
                }
            }
        } else {
            debug!("Skipping {} notifier for partially failed upload{}", self.notifier.name(), upload_id);
        }

        if batch.is_success() {
            lease.commit();
            info!("Completed upload{} ({} objects)", upload_id, batch.uploaded_keys().len());
            self.transition(&batch.title, Some(upload_id), BatchState::Completed);
        } else {
            // Dropping the lease hands the identifier to the next batch
            drop(lease);
            warn!(
                "Upload{} failed with {:?}; {} objects were written and left in place",
                upload_id,
                batch.overall_error,
                batch.uploaded_keys().len()
            );
            self.transition(&batch.title, Some(upload_id), BatchState::Failed);
        }
        batch
    }

    async fn process_photo(&self, upload_id: u64, submission: PhotoSubmission) -> PhotoResult {
        let PhotoSubmission { index, caption, file } = submission;
        let mut result = PhotoResult::new(index, caption);

        let Some(file) = file else {
            warn!("Photo {} of upload{} is missing from the form", index, upload_id);
            result.error = Some(ErrorKind::MissingPhoto);
            return result;
        };
        if let Err(e) = validator::validate(file.size, &file.content_type) {
            warn!("Photo {} of upload{} rejected: {}", index, upload_id, e);
            result.error = Some(e);
            return result;
        }
        let Some(ext) = ImageExtension::from_content_type(&file.content_type) else {
            result.error = Some(ErrorKind::UnsupportedType);
            return result;
        };
        result.resolved_extension = Some(ext);

        if let Err(e) = self.store_photo(upload_id, index, file, ext, &mut result).await {
            result.error = Some(e);
        }
        result
    }

    /// Transcode and upload one validated photo. Keys are recorded as they are
    /// written so a partial failure still reports what reached the store.
    async fn store_photo(
        &self,
        upload_id: u64,
        index: usize,
        file: PhotoFile,
        ext: ImageExtension,
        result: &mut PhotoResult,
    ) -> Result<(), ErrorKind> {
        let workspace = tempfile::Builder::new()
            .prefix(&format!("upload{}-photo{}-", upload_id, index))
            .tempdir_in(&self.work_dir)
            .map_err(|e| {
                error!("Could not create workspace for photo {} of upload{}: {}", index, upload_id, e);
                ErrorKind::WorkspaceFailed
            })?;
        let source = workspace.path().join(keys::photo_file_name(index, ext));
        file.path.persist(&source).map_err(|e| {
            error!("Could not move photo {} of upload{} into its workspace: {}", index, upload_id, e);
            ErrorKind::WorkspaceFailed
        })?;

        if self.options.transcode {
            let renditions = self.transcoder.transcode(&source, &self.options.rendition_labels).await?;
            for rendition in &renditions {
                let key = keys::rendition_key(upload_id, index, &rendition.label);
                self.uploader.upload_file(&rendition.produced_file_path, &key).await?;
                result.uploaded_keys.insert(key);
            }
        }

        let key = keys::original_key(upload_id, index, ext);
        self.uploader.upload_file(&source, &key).await?;
        result.uploaded_keys.insert(key);

        if let Err(e) = workspace.close() {
            warn!("Could not remove workspace for photo {} of upload{}: {}", index, upload_id, e);
        }
        Ok(())
    }

    async fn store_single(&self, request: SinglePhotoRequest) -> Result<String, ErrorKind> {
        if request.shared_secret != self.shared_secret {
            return Err(ErrorKind::BadPassphrase);
        }
        let file = request.file.ok_or(ErrorKind::MissingPhoto)?;
        validator::validate(file.size, &file.content_type)?;
        let ext = ImageExtension::from_content_type(&file.content_type).ok_or(ErrorKind::UnsupportedType)?;

        let key = keys::dated_original_key(&request.date, request.index, ext);
        self.uploader.upload_file(&file.path, &key).await?;
        info!("Stored single photo {} for {}", request.index, request.date);
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::transcoder::rendition_dir;
    use crate::ingest::RenditionSpec;
    use crate::notifier::MockNotifier;
    use crate::storage::mock_store::MockBlobStore;
    use async_trait::async_trait;
    use std::io::Write;
    use std::path::Path;
    use tempfile::TempDir;

    /// Writes one small file per label next to the source
    struct CopyingTranscoder;

    #[async_trait]
    impl Transcoder for CopyingTranscoder {
        async fn transcode(&self, source: &Path, labels: &[String]) -> Result<Vec<RenditionSpec>, ErrorKind> {
            let dir = rendition_dir(source);
            std::fs::create_dir_all(&dir).map_err(|_| ErrorKind::TranscodeFailed)?;
            let mut renditions = Vec::new();
            for label in labels {
                let path = dir.join(format!("{}.jpg", label));
                std::fs::copy(source, &path).map_err(|_| ErrorKind::TranscodeFailed)?;
                renditions.push(RenditionSpec {
                    label: format!("{}.jpg", label),
                    produced_file_path: path,
                });
            }
            Ok(renditions)
        }
    }

    struct BrokenTranscoder;

    #[async_trait]
    impl Transcoder for BrokenTranscoder {
        async fn transcode(&self, _source: &Path, _labels: &[String]) -> Result<Vec<RenditionSpec>, ErrorKind> {
            Err(ErrorKind::TranscodeFailed)
        }
    }

    struct Harness {
        orchestrator: Arc<BatchOrchestrator>,
        store: Arc<MockBlobStore>,
        notifier: MockNotifier,
        work_dir: TempDir,
    }

    fn harness(transcoder: Arc<dyn Transcoder>, transcode: bool, notify_on_partial_failure: bool) -> Harness {
        let store = Arc::new(MockBlobStore::new());
        let notifier = MockNotifier::new();
        let work_dir = tempfile::tempdir().unwrap();
        let orchestrator = BatchOrchestrator::new(
            BlobUploader::new(store.clone()),
            transcoder,
            Arc::new(notifier.clone()),
            Arc::new(UploadCounter::new(7)),
            PipelineOptions {
                transcode,
                rendition_labels: vec!["3d500w".to_string(), "3d288w".to_string()],
                notify_on_partial_failure,
            },
            "secret".to_string(),
            work_dir.path().to_path_buf(),
            Handle::current(),
        );
        Harness {
            orchestrator: Arc::new(orchestrator),
            store,
            notifier,
            work_dir,
        }
    }

    fn photo(dir: &Path, content_type: &str, bytes: &[u8]) -> PhotoFile {
        let mut file = tempfile::NamedTempFile::new_in(dir).unwrap();
        file.write_all(bytes).unwrap();
        PhotoFile {
            path: file.into_temp_path(),
            content_type: content_type.to_string(),
            size: bytes.len() as u64,
        }
    }

    fn request(dir: &Path, photos: Vec<(&str, &str, &str)>) -> UploadRequest {
        let items: Vec<PhotoSubmission> = photos
            .into_iter()
            .enumerate()
            .map(|(index, (caption, content_type, bytes))| PhotoSubmission {
                index,
                caption: caption.to_string(),
                file: Some(photo(dir, content_type, bytes.as_bytes())),
            })
            .collect();
        UploadRequest {
            title: "Spring".to_string(),
            shared_secret: "secret".to_string(),
            photo_count: items.len(),
            items,
        }
    }

    fn work_dir_is_empty(dir: &Path) -> bool {
        std::fs::read_dir(dir).unwrap().next().is_none()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_full_success_uploads_originals_and_advances_counter() {
        let h = harness(Arc::new(CopyingTranscoder), false, false);
        let req = request(h.work_dir.path(), vec![("x", "image/jpeg", "one"), ("y", "image/png", "two")]);

        let batch = h.orchestrator.run(req).await;

        assert!(batch.is_success(), "{:?}", batch.overall_error);
        assert_eq!(batch.upload_identifier, 7);
        assert_eq!(
            h.store.list_objects(),
            vec!["images/raw/gallery/upload7/photo0.jpg", "images/raw/gallery/upload7/photo1.png"]
        );
        assert_eq!(h.store.get_object("images/raw/gallery/upload7/photo1.png").unwrap(), b"two");
        assert_eq!(h.orchestrator.counter().peek(), 8);
        assert_eq!(h.notifier.calls()[0].captions, "x,y");
        assert_eq!(h.notifier.calls()[0].types, "jpg,png");
        assert!(work_dir_is_empty(h.work_dir.path()));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_order_preserved_and_lowest_failure_reported() {
        let h = harness(Arc::new(CopyingTranscoder), false, true);
        let req = request(
            h.work_dir.path(),
            vec![("a", "image/jpeg", "aaa"), ("b", "image/gif", "bbb"), ("c", "image/png", "ccc")],
        );

        let batch = h.orchestrator.run(req).await;

        assert_eq!(batch.overall_error, Some(ErrorKind::UnsupportedType));
        assert_eq!(batch.joined_captions(), "a,b,c");
        assert_eq!(batch.joined_types(), "jpg,,png");
        assert!(batch.photo_results[0].is_success());
        assert!(batch.photo_results[2].is_success());
        // Siblings ran to completion
        assert_eq!(h.store.object_count(), 2);
        assert_eq!(h.notifier.calls()[0].captions, "a,b,c");
        assert!(work_dir_is_empty(h.work_dir.path()));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_empty_photo_fails_batch_but_not_siblings() {
        let h = harness(Arc::new(CopyingTranscoder), false, false);
        let req = request(
            h.work_dir.path(),
            vec![("a", "image/jpeg", "aaa"), ("b", "image/jpeg", ""), ("c", "image/jpeg", ""), ("d", "image/jpeg", "ddd")],
        );

        let batch = h.orchestrator.run(req).await;

        assert_eq!(batch.overall_error, Some(ErrorKind::EmptyPhoto));
        assert_eq!(batch.photo_results[1].error, Some(ErrorKind::EmptyPhoto));
        assert_eq!(batch.photo_results[2].error, Some(ErrorKind::EmptyPhoto));
        assert_eq!(h.store.object_count(), 2);
        // Partial batches are not reported downstream by default
        assert_eq!(h.notifier.call_count(), 0);
        assert_eq!(h.orchestrator.counter().peek(), 7);
        assert!(work_dir_is_empty(h.work_dir.path()));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_request_checks_short_circuit() {
        let h = harness(Arc::new(CopyingTranscoder), false, false);

        let mut req = request(h.work_dir.path(), vec![("a", "image/jpeg", "aaa")]);
        req.title.clear();
        assert_eq!(h.orchestrator.run(req).await.overall_error, Some(ErrorKind::MissingTitle));

        let mut req = request(h.work_dir.path(), vec![("a", "image/jpeg", "aaa")]);
        req.shared_secret = "wrong".to_string();
        let batch = h.orchestrator.run(req).await;
        assert_eq!(batch.overall_error, Some(ErrorKind::BadPassphrase));
        assert!(batch.photo_results.is_empty());

        assert_eq!(h.store.object_count(), 0);
        assert_eq!(h.notifier.call_count(), 0);
        // Rejected requests leave no spooled files behind
        assert!(work_dir_is_empty(h.work_dir.path()));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_missing_photo_part() {
        let h = harness(Arc::new(CopyingTranscoder), false, false);
        let req = UploadRequest {
            title: "Spring".to_string(),
            shared_secret: "secret".to_string(),
            photo_count: 1,
            items: vec![PhotoSubmission {
                index: 0,
                caption: "gone".to_string(),
                file: None,
            }],
        };
        assert_eq!(h.orchestrator.run(req).await.overall_error, Some(ErrorKind::MissingPhoto));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_transcode_uploads_renditions_then_original() {
        let h = harness(Arc::new(CopyingTranscoder), true, false);
        let req = request(h.work_dir.path(), vec![("x", "image/jpeg", "jpeg bytes")]);

        let batch = h.orchestrator.run(req).await;

        assert!(batch.is_success());
        assert_eq!(
            h.store.list_objects(),
            vec![
                "images/gallery/upload7/photo0/3d288w.jpg",
                "images/gallery/upload7/photo0/3d500w.jpg",
                "images/raw/gallery/upload7/photo0.jpg",
            ]
        );
        assert_eq!(batch.photo_results[0].uploaded_keys.len(), 3);
        assert!(work_dir_is_empty(h.work_dir.path()));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_transcode_failure_skips_original_and_cleans_up() {
        let h = harness(Arc::new(BrokenTranscoder), true, false);
        let req = request(h.work_dir.path(), vec![("x", "image/jpeg", "jpeg bytes")]);

        let batch = h.orchestrator.run(req).await;

        assert_eq!(batch.overall_error, Some(ErrorKind::TranscodeFailed));
        assert_eq!(batch.photo_results[0].resolved_extension, Some(ImageExtension::Jpg));
        assert_eq!(h.store.object_count(), 0);
        assert!(work_dir_is_empty(h.work_dir.path()));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_partial_upload_keys_are_reported() {
        let h = harness(Arc::new(CopyingTranscoder), true, false);
        h.store.fail_writes_to("images/raw/gallery/upload7/photo0.jpg");
        let req = request(h.work_dir.path(), vec![("x", "image/jpeg", "jpeg bytes")]);

        let batch = h.orchestrator.run(req).await;

        assert_eq!(batch.overall_error, Some(ErrorKind::TransferFailed));
        // Renditions went up before the original failed and stay in the store
        assert_eq!(batch.photo_results[0].uploaded_keys.len(), 2);
        assert_eq!(h.store.object_count(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_notifier_failure_fails_batch_and_identifier_is_reused() {
        let h = harness(Arc::new(CopyingTranscoder), false, false);
        h.notifier.fail(true);

        let first = h.orchestrator.run(request(h.work_dir.path(), vec![("x", "image/jpeg", "v1")])).await;
        assert_eq!(first.overall_error, Some(ErrorKind::NotificationFailed));
        assert_eq!(h.orchestrator.counter().peek(), 7);

        h.notifier.fail(false);
        let retry = h.orchestrator.run(request(h.work_dir.path(), vec![("x", "image/jpeg", "v2")])).await;
        assert!(retry.is_success());
        assert_eq!(retry.upload_identifier, first.upload_identifier);
        assert_eq!(retry.uploaded_keys(), first.uploaded_keys());
        assert_eq!(h.store.get_object("images/raw/gallery/upload7/photo0.jpg").unwrap(), b"v2");
        assert_eq!(h.orchestrator.counter().peek(), 8);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_batches_get_distinct_keys() {
        let h = harness(Arc::new(CopyingTranscoder), false, false);
        let mut runs = Vec::new();
        for batch in 0..50 {
            let photos: Vec<(String, String)> = (0..10)
                .map(|i| (format!("b{}p{}", batch, i), format!("{}-{}", batch, i)))
                .collect();
            let req = request(
                h.work_dir.path(),
                photos.iter().map(|(c, b)| (c.as_str(), "image/jpeg", b.as_str())).collect(),
            );
            let orchestrator = Arc::clone(&h.orchestrator);
            runs.push(tokio::spawn(async move { orchestrator.run(req).await }));
        }

        let mut identifiers = std::collections::HashSet::new();
        for run in runs {
            let batch = run.await.unwrap();
            assert!(batch.is_success(), "{:?}", batch.overall_error);
            assert!(identifiers.insert(batch.upload_identifier));
        }

        assert_eq!(h.store.object_count(), 500);
        assert_eq!(h.orchestrator.counter().peek(), 57);
        assert_eq!(h.orchestrator.counter().committed(), 50);
        assert_eq!(h.notifier.call_count(), 50);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_single_photo_uses_dated_key() {
        let h = harness(Arc::new(CopyingTranscoder), true, false);
        let req = SinglePhotoRequest {
            date: "2024-05-01".to_string(),
            index: 3,
            shared_secret: "secret".to_string(),
            file: Some(photo(h.work_dir.path(), "image/png", b"png")),
        };

        let key = h.orchestrator.run_single(req).await.unwrap();

        assert_eq!(key, "images/raw/gallery/2024-05-01/photo3.png");
        assert_eq!(h.store.list_objects(), vec![key]);
        assert_eq!(h.orchestrator.counter().peek(), 7);
        assert_eq!(h.notifier.call_count(), 0);
        assert!(work_dir_is_empty(h.work_dir.path()));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_single_photo_rejections() {
        let h = harness(Arc::new(CopyingTranscoder), false, false);
        let single = |secret: &str, file: Option<PhotoFile>| SinglePhotoRequest {
            date: "2024-05-01".to_string(),
            index: 0,
            shared_secret: secret.to_string(),
            file,
        };

        let wrong = single("wrong", Some(photo(h.work_dir.path(), "image/png", b"png")));
        assert_eq!(h.orchestrator.run_single(wrong).await, Err(ErrorKind::BadPassphrase));
        assert_eq!(h.orchestrator.run_single(single("secret", None)).await, Err(ErrorKind::MissingPhoto));
        let empty = single("secret", Some(photo(h.work_dir.path(), "image/png", b"")));
        assert_eq!(h.orchestrator.run_single(empty).await, Err(ErrorKind::EmptyPhoto));
        assert_eq!(h.store.object_count(), 0);
    }
}
