//! Gallery record creation through an external program

use super::Notifier;
use crate::config::CatalogConfig;
use crate::error::ErrorKind;
use crate::ingest::BatchResult;
use async_trait::async_trait;
use log::{error, info, warn};
use std::path::PathBuf;
use tokio::process::Command;
use tokio::sync::Mutex;

/// Runs `<program> [args..] <upload id> <title> <count> <captions> <types>`
///
/// Every run shares one scratch checkout, so runs are serialized and the
/// checkout is removed before the next one starts.
pub struct CatalogNotifier {
    program: PathBuf,
    leading_args: Vec<String>,
    cleanup_dir: Option<PathBuf>,
    run_lock: Mutex<()>,
}

impl CatalogNotifier {
    pub fn new(config: &CatalogConfig) -> Self {
        Self {
            program: PathBuf::from(&config.program),
            leading_args: config.args.clone(),
            cleanup_dir: config.cleanup_dir.as_ref().map(PathBuf::from),
            run_lock: Mutex::new(()),
        }
    }

    fn args(batch: &BatchResult) -> Vec<String> {
        vec![
            batch.upload_identifier.to_string(),
            batch.title.clone(),
            batch.photo_count().to_string(),
            batch.joined_captions(),
            batch.joined_types(),
        ]
    }

    async fn remove_scratch(&self) {
        let Some(dir) = &self.cleanup_dir else {
            return;
        };
        match tokio::fs::remove_dir_all(dir).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Could not remove catalog scratch directory {}: {}", dir.display(), e),
        }
    }
}

#[async_trait]
impl Notifier for CatalogNotifier {
    async fn notify(&self, batch: &BatchResult) -> Result<(), ErrorKind> {
        let _running = self.run_lock.lock().await;
        let status = Command::new(&self.program)
            .args(&self.leading_args)
            .args(Self::args(batch))
            .kill_on_drop(true)
            .status()
            .await;

        // The tool leaves its checkout behind whether or not it succeeded
        self.remove_scratch().await;

        match status {
            Ok(status) if status.success() => {
                info!("Created catalog record for upload {}", batch.upload_identifier);
                Ok(())
            }
            Ok(status) => {
                error!("{} exited with {} for upload {}", self.program.display(), status, batch.upload_identifier);
                Err(ErrorKind::CatalogCreateFailed)
            }
            Err(e) => {
                error!("Could not start {}: {}", self.program.display(), e);
                Err(ErrorKind::CatalogCreateFailed)
            }
        }
    }

    fn name(&self) -> &'static str {
        "catalog"
    }
}
