//! Rendition generation
//!
//! The resize step is behind the `Transcoder` trait so the external executable
//! can be replaced by an in-process implementation without touching the
//! orchestrator.

use crate::error::ErrorKind;
use crate::ingest::RenditionSpec;
use async_trait::async_trait;
use log::{debug, error, info};
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// Produces resized renditions of one photo
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Resize `source` once per label. Outputs are written to `rendition_dir(source)`,
    /// which the caller owns and must remove.
    async fn transcode(&self, source: &Path, labels: &[String]) -> Result<Vec<RenditionSpec>, ErrorKind>;
}

/// `<dir of source>/<stem of source>`, e.g. `work/photo0.jpg` -> `work/photo0`
pub fn rendition_dir(source: &Path) -> PathBuf {
    let parent = source.parent().unwrap_or_else(|| Path::new("."));
    match source.file_stem() {
        Some(stem) => parent.join(stem),
        None => parent.join("renditions"),
    }
}

/// List the files a transcoder left in `dir`, sorted by name
pub async fn list_renditions(dir: &Path) -> Result<Vec<RenditionSpec>, ErrorKind> {
    let listing_failed = |e: std::io::Error| {
        error!("Could not list renditions in {}: {}", dir.display(), e);
        ErrorKind::RenditionListingFailed
    };

    let mut entries = tokio::fs::read_dir(dir).await.map_err(listing_failed)?;
    let mut renditions = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(listing_failed)? {
        if !entry.file_type().await.map_err(listing_failed)?.is_file() {
            continue;
        }
        renditions.push(RenditionSpec {
            label: entry.file_name().to_string_lossy().into_owned(),
            produced_file_path: entry.path(),
        });
    }
    renditions.sort_by(|a, b| a.label.cmp(&b.label));
    Ok(renditions)
}

/// Runs a pre-installed resize executable as `<program> [args...] <input> <output dir> <labels...>`
pub struct ExternalTranscoder {
    program: PathBuf,
    leading_args: Vec<String>,
}

impl ExternalTranscoder {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self::with_args(program, Vec::new())
    }

    /// For tools launched through an interpreter, e.g. `python3 webpic.py`
    pub fn with_args(program: impl Into<PathBuf>, leading_args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            leading_args,
        }
    }
}

#[async_trait]
impl Transcoder for ExternalTranscoder {
    async fn transcode(&self, source: &Path, labels: &[String]) -> Result<Vec<RenditionSpec>, ErrorKind> {
        let output_root = source.parent().unwrap_or_else(|| Path::new("."));
        debug!("Running {} on {} with labels {:?}", self.program.display(), source.display(), labels);

        let output = Command::new(&self.program)
            .args(&self.leading_args)
            .arg(source)
            .arg(output_root)
            .args(labels)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                error!("Could not start transcoder {}: {}", self.program.display(), e);
                ErrorKind::TranscodeFailed
            })?;

        if !output.status.success() {
            error!(
                "Transcoder exited with {} for {}: {}",
                output.status,
                source.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
            return Err(ErrorKind::TranscodeFailed);
        }

        let renditions = list_renditions(&rendition_dir(source)).await?;
        info!("Produced {} renditions for {}", renditions.len(), source.display());
        Ok(renditions)
    }
}
