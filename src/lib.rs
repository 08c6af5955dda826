// src/lib.rs

pub mod app_state;
pub mod config;
pub mod error;
pub mod ingest;
pub mod logging;
pub mod notifier;
pub mod service;
pub mod storage;
