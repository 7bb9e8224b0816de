//! Bulletin-Harvest: incremental harvester for dated exchange bulletins
//!
//! This crate walks a paginated bulletin listing, downloads the referenced
//! report files under a global rate limit, parses them into trading records
//! and stores only the records the database has not seen yet.

pub mod config;
pub mod crawler;
pub mod importer;
pub mod output;
pub mod pipeline;
pub mod storage;
pub mod table;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Bulletin-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Rate limited by upstream (429 Too Many Requests) for {url}")]
    RateLimited { url: String },

    #[error("HTTP {status} for {url}")]
    Http { url: String, status: u16 },

    #[error("Transport error for {url}: {source}")]
    Transport { url: String, source: reqwest::Error },

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Parse error in {context}: {message}")]
    Parse { context: String, message: String },

    #[error("Storage error: {0}")]
    Store(#[from] storage::StorageError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Cannot derive a file name from {url}")]
    FileName { url: String },

    #[error("IO error at {}: {source}", path.display())]
    File {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Background task failed: {0}")]
    Task(String),
}

impl HarvestError {
    /// Builds a parse error for the given context (a URL, a file path, a page)
    pub fn parse(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            context: context.into(),
            message: message.into(),
        }
    }

    /// Returns true for upstream throttling, which callers may back off on
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// Returns true for network and HTTP failures other than throttling
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Http { .. } | Self::Transport { .. })
    }
}

impl From<tokio::task::JoinError> for HarvestError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Task(err.to_string())
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Bulletin-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{DateWindow, ReportLink};
pub use importer::DedupBulkImporter;
pub use pipeline::Coordinator;
pub use storage::{Record, TradeKey};
pub use table::{ParsedTable, TradeRow};
