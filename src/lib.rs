//! Kagami: a single-site offline mirroring tool
//!
//! This crate crawls one website breadth-first from an entry page, downloads
//! every same-domain page and referenced resource, rewrites internal links to
//! relative local paths so the mirror browses offline, and can alternatively
//! flatten the whole crawl into a single markdown document.

pub mod config;
pub mod crawler;
pub mod output;
pub mod rewrite;
pub mod url;

use thiserror::Error;

/// Main error type for Kagami operations
#[derive(Debug, Error)]
pub enum KagamiError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Entry page {url} could not be retrieved: {reason}")]
    EntryUnreachable { url: String, reason: String },

    #[error("Fetch failed for {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid entry URL '{url}': {reason}")]
    InvalidEntryUrl { url: String, reason: String },

    #[error("Invalid delay: {0}")]
    InvalidDelay(String),

    #[error("Cannot use output directory {path}: {source}")]
    OutputDir {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for Kagami operations
pub type Result<T> = std::result::Result<T, KagamiError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::{default_output_dir, Options};
pub use crawler::{run_mirror, Crawler};
pub use output::RunStats;
pub use url::{classify, normalize_url, UrlClass};
