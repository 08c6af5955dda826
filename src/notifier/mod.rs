//! Post-batch side effects
//!
//! After a batch is aggregated exactly one notifier runs: either the catalog
//! tool that creates the gallery record, or a summary email.

pub mod catalog;
pub mod email;
pub mod mock_notifier;

use crate::config::{NotifierConfig, NotifierStrategy};
use crate::error::ErrorKind;
use crate::ingest::BatchResult;
use async_trait::async_trait;
use log::info;
use std::sync::Arc;

pub use catalog::CatalogNotifier;
pub use email::EmailNotifier;
pub use mock_notifier::MockNotifier;

/// Reports a finished batch downstream
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, batch: &BatchResult) -> Result<(), ErrorKind>;

    fn name(&self) -> &'static str;
}

/// Build the notifier selected in configuration
pub fn create_notifier(config: &NotifierConfig) -> Result<Arc<dyn Notifier>, Box<dyn std::error::Error>> {
    let notifier: Arc<dyn Notifier> = match config.strategy {
        NotifierStrategy::Catalog => Arc::new(CatalogNotifier::new(&config.catalog)),
        NotifierStrategy::Email => Arc::new(EmailNotifier::from_config(&config.email)?),
        NotifierStrategy::Mock => Arc::new(MockNotifier::new()),
    };
    info!("Using {} notifier", notifier.name());
    Ok(notifier)
}
