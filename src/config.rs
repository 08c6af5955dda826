//! Application Configuration
//!
//! This module provides configuration management for the application,
//! supporting YAML configuration files with sensible defaults and a small
//! set of environment overrides for deployment secrets.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use log::{info, warn};

use crate::storage::config::StorageBackend;

/// Post-batch side effect
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum NotifierStrategy {
    Catalog,
    Email,
    Mock,
}

impl Default for NotifierStrategy {
    fn default() -> Self {
        NotifierStrategy::Catalog
    }
}

impl std::str::FromStr for NotifierStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "catalog" | "photogroup" => Ok(NotifierStrategy::Catalog),
            "email" | "mail" => Ok(NotifierStrategy::Email),
            "mock" => Ok(NotifierStrategy::Mock),
            _ => Err(format!("Unknown notifier strategy: {}", s)),
        }
    }
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Ingestion pipeline configuration
    pub ingest: IngestConfig,
    /// Object store configuration
    pub storage: StorageConfig,
    /// Post-batch notifier configuration
    pub notifier: NotifierConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Number of HTTP worker threads
    pub workers: usize,
    /// Number of threads running photo tasks
    pub ingest_workers: usize,
}

/// Ingestion pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Passphrase every upload form must carry
    pub shared_secret: String,
    /// First upload identifier handed out after start
    pub upload_offset: u64,
    /// Scratch directory for spooled photos and renditions
    pub temp_dir: String,
    /// Produce resized renditions before uploading
    pub transcode: bool,
    /// Size labels passed to the resize executable
    pub rendition_labels: Vec<String>,
    /// Path to the resize executable
    pub transcoder_path: String,
    /// Arguments placed before the input path, for interpreted tools
    pub transcoder_args: Vec<String>,
    /// Run the notifier even when some photos failed
    pub notify_on_partial_failure: bool,
    /// Largest photo accepted in a form, in bytes
    pub max_photo_bytes: u64,
}

/// Object store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Storage backend type
    pub backend: StorageBackend,
    /// Root directory for the local backend
    pub base_path: String,
    /// Bucket name for the GCS backend
    pub bucket: String,
    /// Service account key file for the GCS backend
    pub credentials_file: Option<String>,
}

/// Post-batch notifier configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifierConfig {
    pub strategy: NotifierStrategy,
    pub catalog: CatalogConfig,
    pub email: EmailConfig,
}

/// Catalog record creation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Path to the record creation executable
    pub program: String,
    /// Arguments placed before the batch arguments
    pub args: Vec<String>,
    /// Directory the executable leaves behind, removed after each run
    pub cleanup_dir: Option<String>,
}

/// SMTP settings for the summary email
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub username: Option<String>,
    /// Password, or OAuth access token when `xoauth2` is set
    pub password: Option<String>,
    pub xoauth2: bool,
    pub starttls: bool,
    pub from: String,
    pub recipients: Vec<String>,
    pub subject: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Path to log configuration file
    pub config_file: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            workers: 4,
            ingest_workers: 4,
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            shared_secret: "care for your surroundings".to_string(),
            upload_offset: 0,
            temp_dir: "./data/workspace".to_string(),
            transcode: true,
            rendition_labels: vec!["3d500w".to_string(), "3d382w".to_string(), "3d288w".to_string()],
            transcoder_path: "./webpic".to_string(),
            transcoder_args: Vec::new(),
            notify_on_partial_failure: false,
            max_photo_bytes: 50 * 1024 * 1024,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            base_path: "./data/storage".to_string(),
            bucket: "growinggreen-assets".to_string(),
            credentials_file: Some("asset-bucket-sa-key.json".to_string()),
        }
    }
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            strategy: NotifierStrategy::default(),
            catalog: CatalogConfig::default(),
            email: EmailConfig::default(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            program: "./new-photogroup".to_string(),
            args: Vec::new(),
            cleanup_dir: Some("growinggreen-site".to_string()),
        }
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_host: "smtp.gmail.com".to_string(),
            smtp_port: 587,
            username: None,
            password: None,
            xoauth2: false,
            starttls: true,
            from: String::new(),
            recipients: Vec::new(),
            subject: "New photos uploaded".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            config_file: "server_log.yaml".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file, use defaults if not found, then apply environment overrides
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = env::var("PHOTO_UPLOADER_CONFIG").unwrap_or_else(|_| "config.yaml".to_string());
        let mut config = Self::load_from(Path::new(&config_path))?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Load configuration from a specific file without environment overrides
    pub fn load_from(config_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        if config_path.exists() {
            let content = fs::read_to_string(config_path)?;
            let config: AppConfig = serde_yaml::from_str(&content)?;
            info!("Loaded configuration from {}", config_path.display());
            Ok(config)
        } else {
            warn!("Config file {} not found, using defaults", config_path.display());
            Ok(Self::default())
        }
    }

    /// Override deployment-specific values from the process environment
    pub fn apply_env_overrides(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        if let Ok(port) = env::var("PORT") {
            self.server.port = port.parse()?;
        }
        if let Ok(offset) = env::var("UPLOAD_OFFSET") {
            self.ingest.upload_offset = offset.parse()?;
        }
        if let Ok(secret) = env::var("UPLOAD_PASSPHRASE") {
            self.ingest.shared_secret = secret;
        }
        if let Ok(backend) = env::var("STORAGE_BACKEND") {
            match backend.parse::<StorageBackend>() {
                Ok(backend) => {
                    info!("Using storage backend from environment: {:?}", backend);
                    self.storage.backend = backend;
                }
                Err(e) => warn!("Invalid storage backend in environment: {}. Keeping {:?}.", e, self.storage.backend),
            }
        }
        if let Ok(bucket) = env::var("STORAGE_BUCKET") {
            self.storage.bucket = bucket;
        }
        if let Ok(credentials) = env::var("GOOGLE_APPLICATION_CREDENTIALS") {
            self.storage.credentials_file = Some(credentials);
        }

        let email = &mut self.notifier.email;
        if let Ok(host) = env::var("SMTP_HOST") {
            email.smtp_host = host;
        }
        if let Ok(port) = env::var("SMTP_PORT") {
            email.smtp_port = port.parse()?;
        }
        if let Ok(username) = env::var("SMTP_USERNAME") {
            email.username = Some(username);
        }
        if let Ok(password) = env::var("SMTP_PASSWORD") {
            email.password = Some(password);
        }
        if let Ok(from) = env::var("SMTP_FROM") {
            email.from = from;
        }
        if let Ok(recipients) = env::var("SMTP_RECIPIENTS") {
            email.recipients = recipients
                .split(',')
                .map(|r| r.trim().to_string())
                .filter(|r| !r.is_empty())
                .collect();
        }
        if let Ok(subject) = env::var("SMTP_SUBJECT") {
            email.subject = subject;
        }
        if let Ok(xoauth2) = env::var("SMTP_XOAUTH2") {
            email.xoauth2 = matches!(xoauth2.to_lowercase().as_str(), "1" | "true" | "yes");
        }
        Ok(())
    }

    /// Scratch directory as a path
    pub fn temp_dir(&self) -> PathBuf {
        PathBuf::from(&self.ingest.temp_dir)
    }
}
