//! Photo ingestion pipeline
//!
//! Request and result types shared by the validator, transcoder, uploader and
//! the batch orchestrator that ties them together.

pub mod counter;
pub mod orchestrator;
pub mod transcoder;
pub mod uploader;
pub mod validator;

use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use tempfile::TempPath;

use crate::error::ErrorKind;

/// File extension a stored photo gets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageExtension {
    Jpg,
    Png,
}

impl ImageExtension {
    /// Map an accepted content type to its extension
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        match content_type {
            "image/jpeg" => Some(ImageExtension::Jpg),
            "image/png" => Some(ImageExtension::Png),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ImageExtension::Jpg => "jpg",
            ImageExtension::Png => "png",
        }
    }
}

impl fmt::Display for ImageExtension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A submitted photo spooled to local disk. The file is removed when dropped.
#[derive(Debug)]
pub struct PhotoFile {
    pub path: TempPath,
    pub content_type: String,
    pub size: u64,
}

/// One photo of a batch, owned by its processing task
#[derive(Debug)]
pub struct PhotoSubmission {
    pub index: usize,
    pub caption: String,
    /// `None` when the form carried no `photo<index>` part
    pub file: Option<PhotoFile>,
}

/// A validated-shape batch upload, before authentication checks
#[derive(Debug)]
pub struct UploadRequest {
    pub title: String,
    pub shared_secret: String,
    pub photo_count: usize,
    pub items: Vec<PhotoSubmission>,
}

/// A single photo stored under a date-keyed path
#[derive(Debug)]
pub struct SinglePhotoRequest {
    /// `YYYY-MM-DD`
    pub date: String,
    pub index: usize,
    pub shared_secret: String,
    pub file: Option<PhotoFile>,
}

/// Output of the transcoder for one size label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenditionSpec {
    pub label: String,
    pub produced_file_path: PathBuf,
}

/// Outcome of one photo task
#[derive(Debug, Clone, Serialize)]
pub struct PhotoResult {
    pub index: usize,
    pub caption: String,
    pub resolved_extension: Option<ImageExtension>,
    pub uploaded_keys: BTreeSet<String>,
    pub error: Option<ErrorKind>,
}

impl PhotoResult {
    pub fn new(index: usize, caption: String) -> Self {
        Self {
            index,
            caption,
            resolved_extension: None,
            uploaded_keys: BTreeSet::new(),
            error: None,
        }
    }

    pub fn failed(index: usize, caption: String, error: ErrorKind) -> Self {
        Self {
            error: Some(error),
            ..Self::new(index, caption)
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// `photo<index>.<ext>` once the type is known
    pub fn file_name(&self) -> Option<String> {
        self.resolved_extension
            .map(|ext| crate::storage::keys::photo_file_name(self.index, ext))
    }
}

/// Aggregated outcome of one request
#[derive(Debug, Clone, Serialize)]
pub struct BatchResult {
    pub upload_identifier: u64,
    pub title: String,
    pub photo_results: Vec<PhotoResult>,
    pub overall_error: Option<ErrorKind>,
}

impl BatchResult {
    pub fn is_success(&self) -> bool {
        self.overall_error.is_none()
    }

    pub fn photo_count(&self) -> usize {
        self.photo_results.len()
    }

    /// Captions in submission order, comma separated. Commas inside captions are not escaped.
    pub fn joined_captions(&self) -> String {
        self.photo_results
            .iter()
            .map(|r| r.caption.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Resolved extensions in submission order, comma separated; unresolved photos leave an empty slot
    pub fn joined_types(&self) -> String {
        self.photo_results
            .iter()
            .map(|r| r.resolved_extension.map(|ext| ext.as_str()).unwrap_or(""))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Every key written for this batch, across all photos
    pub fn uploaded_keys(&self) -> BTreeSet<String> {
        self.photo_results
            .iter()
            .flat_map(|r| r.uploaded_keys.iter().cloned())
            .collect()
    }
}
