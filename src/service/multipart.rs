//! Multipart form reading
//!
//! Text parts are collected in memory with a size cap. File parts are spooled
//! straight to temp files in the ingest work directory and never held whole in
//! memory. The whole form is bounded by [`FormLimits`] before any field is
//! looked at, so an unauthenticated client cannot fill memory or disk.

use crate::config::IngestConfig;
use crate::error::ErrorKind;
use crate::ingest::{PhotoFile, PhotoSubmission, SinglePhotoRequest, UploadRequest};
use actix_multipart::{Field, Multipart};
use actix_web::http::header;
use bytes::BytesMut;
use chrono::NaiveDate;
use futures::TryStreamExt;
use log::{debug, error, warn};
use std::collections::HashMap;
use std::path::Path;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;

const MAX_TEXT_FIELD_BYTES: usize = 64 * 1024;
const MAX_TEXT_BYTES: usize = 1024 * 1024;
const MAX_PHOTOS_PER_BATCH: usize = 500;
// A photo and a caption per slot, plus title, passphrase and count
const MAX_FORM_PARTS: usize = 2 * MAX_PHOTOS_PER_BATCH + 16;

/// Bounds applied while a form is read. Exceeding any of them is `MalformedForm`.
#[derive(Debug, Clone)]
pub struct FormLimits {
    /// Parts of any kind, named or not
    pub max_parts: usize,
    /// Bytes in one text field
    pub max_text_field_bytes: usize,
    /// Bytes across every text field
    pub max_text_bytes: usize,
    /// Bytes in one file part
    pub max_file_bytes: u64,
}

impl Default for FormLimits {
    fn default() -> Self {
        Self {
            max_parts: MAX_FORM_PARTS,
            max_text_field_bytes: MAX_TEXT_FIELD_BYTES,
            max_text_bytes: MAX_TEXT_BYTES,
            max_file_bytes: IngestConfig::default().max_photo_bytes,
        }
    }
}

impl From<&IngestConfig> for FormLimits {
    fn from(config: &IngestConfig) -> Self {
        Self {
            max_file_bytes: config.max_photo_bytes,
            ..Self::default()
        }
    }
}

/// Parsed form: text fields by name, spooled files by name
#[derive(Debug, Default)]
pub struct MultipartForm {
    pub fields: HashMap<String, String>,
    pub files: HashMap<String, PhotoFile>,
}

impl MultipartForm {
    /// Read every part of `payload`, spooling files into `spool_dir`
    pub async fn read(mut payload: Multipart, spool_dir: &Path, limits: &FormLimits) -> Result<Self, ErrorKind> {
        let mut form = MultipartForm::default();
        let mut parts = 0;
        let mut text_budget = limits.max_text_bytes;
        while let Some(field) = payload.try_next().await.map_err(|e| {
            warn!("Could not read multipart body: {}", e);
            ErrorKind::MalformedForm
        })? {
            parts += 1;
            if parts > limits.max_parts {
                warn!("Form has more than {} parts", limits.max_parts);
                return Err(ErrorKind::MalformedForm);
            }
            let Some(name) = field.name().map(str::to_string) else {
                debug!("Skipping unnamed multipart part");
                continue;
            };
            let is_file = field
                .content_disposition()
                .and_then(|cd| cd.get_filename())
                .is_some();

            if is_file {
                let file = spool_file(field, spool_dir, limits.max_file_bytes).await?;
                form.files.insert(name, file);
            } else {
                let cap = limits.max_text_field_bytes.min(text_budget);
                let value = read_text(field, cap).await?;
                text_budget -= value.len();
                form.fields.insert(name, value);
            }
        }
        Ok(form)
    }

    /// Remove a text field, empty if absent
    pub fn take_field(&mut self, name: &str) -> String {
        self.fields.remove(name).unwrap_or_default()
    }

    pub fn take_file(&mut self, name: &str) -> Option<PhotoFile> {
        self.files.remove(name)
    }
}

async fn read_text(mut field: Field, cap: usize) -> Result<String, ErrorKind> {
    let mut buf = BytesMut::new();
    while let Some(chunk) = field.try_next().await.map_err(|e| {
        warn!("Could not read form field: {}", e);
        ErrorKind::MalformedForm
    })? {
        if buf.len() + chunk.len() > cap {
            warn!("Form field {:?} exceeds the remaining {} text bytes", field.name(), cap);
            return Err(ErrorKind::MalformedForm);
        }
        buf.extend_from_slice(&chunk);
    }
    String::from_utf8(buf.to_vec()).map_err(|_| ErrorKind::MalformedForm)
}

async fn spool_file(mut field: Field, spool_dir: &Path, max_bytes: u64) -> Result<PhotoFile, ErrorKind> {
    let spool_failed = |e: std::io::Error| {
        error!("Could not spool uploaded file to {}: {}", spool_dir.display(), e);
        ErrorKind::WorkspaceFailed
    };

    // The declared type is compared verbatim later, so keep the raw header
    let content_type = field
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let (file, path) = NamedTempFile::new_in(spool_dir).map_err(spool_failed)?.into_parts();
    let mut file = tokio::fs::File::from_std(file);
    let mut size: u64 = 0;
    while let Some(chunk) = field.try_next().await.map_err(|e| {
        warn!("Upload of {:?} interrupted: {}", field.name(), e);
        ErrorKind::MalformedForm
    })? {
        size += chunk.len() as u64;
        if size > max_bytes {
            // Dropping `path` removes the partial spool file
            warn!("Upload of {:?} exceeds {} bytes", field.name(), max_bytes);
            return Err(ErrorKind::MalformedForm);
        }
        file.write_all(&chunk).await.map_err(spool_failed)?;
    }
    file.flush().await.map_err(spool_failed)?;

    Ok(PhotoFile {
        path,
        content_type,
        size,
    })
}

impl UploadRequest {
    /// Build a batch from form fields `title`, `passphrase`, `numPhotos`,
    /// `caption<i>` and `photo<i>`. Only the photo count is checked here.
    pub fn from_form(mut form: MultipartForm) -> Result<Self, ErrorKind> {
        let photo_count: usize = form
            .take_field("numPhotos")
            .parse()
            .map_err(|_| ErrorKind::InvalidPhotoCount)?;
        if photo_count > MAX_PHOTOS_PER_BATCH {
            warn!("Rejecting batch of {} photos", photo_count);
            return Err(ErrorKind::InvalidPhotoCount);
        }

        let items = (0..photo_count)
            .map(|index| PhotoSubmission {
                index,
                caption: form.take_field(&format!("caption{}", index)),
                file: form.take_file(&format!("photo{}", index)),
            })
            .collect();

        Ok(Self {
            title: form.take_field("title"),
            shared_secret: form.take_field("passphrase"),
            photo_count,
            items,
        })
    }
}

impl SinglePhotoRequest {
    /// Build from form fields `date` (`YYYY-MM-DD`), `index`, `passphrase` and `photo`
    pub fn from_form(mut form: MultipartForm) -> Result<Self, ErrorKind> {
        let date = form.take_field("date");
        NaiveDate::parse_from_str(&date, "%Y-%m-%d").map_err(|_| ErrorKind::InvalidDate)?;
        let index = form
            .take_field("index")
            .parse()
            .map_err(|_| ErrorKind::InvalidPhotoIndex)?;

        Ok(Self {
            date,
            index,
            shared_secret: form.take_field("passphrase"),
            file: form.take_file("photo"),
        })
    }
}
