//! Adkeep: incremental backups of classified-ad listings
//!
//! This crate crawls the public ad listing of a marketplace user, extracts
//! every ad into a text file and downloads its images into one directory per
//! ad. Repeated runs skip images that are already present on disk, using a
//! perceptual hash to recognise re-encoded copies.

pub mod ad;
pub mod config;
pub mod crawler;
pub mod images;
pub mod output;
pub mod state;
pub mod url;

use std::path::PathBuf;
use thiserror::Error;

pub use crawler::FetchError;
pub use output::TemplateError;

/// Main error type for Adkeep operations
#[derive(Debug, Error)]
pub enum AdkeepError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("could not get page {url}: {source}")]
    Fetch { url: String, source: FetchError },

    #[error("could not extract ad data, got empty struct: {url}")]
    IncompleteAd { url: String },

    #[error("failed to process image {name}: {message}")]
    Image { name: String, message: String },

    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("invalid or no user id specified")]
    NothingToDo,
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid template '{name}': {source}")]
    Template {
        name: &'static str,
        source: TemplateError,
    },
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("invalid URI: {0}")]
    InvalidUri(String),

    #[error("Failed to parse URL: {0}")]
    Parse(String),
}

/// Result type alias for Adkeep operations
pub type Result<T> = std::result::Result<T, AdkeepError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use ad::AdRecord;
pub use config::Config;
pub use crawler::{run_backup, Coordinator, Transport};
pub use output::BackupStats;
pub use state::VisitedRegistry;
