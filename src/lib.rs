//! Site-Auditor: a bounded single-site crawler for offline site audits
//!
//! This crate crawls a scoped subset of one website breadth-first and turns
//! every fetched page into typed audit records (inventory, SEO, content,
//! media, forms, integrations, API endpoint mentions, redirects, errors).

pub mod config;
pub mod crawler;
pub mod extract;
pub mod output;
pub mod state;
pub mod store;
pub mod url;

use thiserror::Error;

/// Main error type for Site-Auditor operations
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("Extractor setup error: {0}")]
    Extract(#[from] extract::ExtractError),

    #[error("Invalid traversal transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Page task for {url} aborted: {message}")]
    TaskAborted { url: String, message: String },
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

    #[error("Invalid rule pattern: {0}")]
    InvalidPattern(String),
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

/// Result type alias for Site-Auditor operations
pub type Result<T> = std::result::Result<T, AuditError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{run_audit, Crawler};
pub use state::{DoneReason, TraversalState};
pub use store::{AggregationStore, AuditRecords};
pub use crate::url::{normalize_url, UrlFilter, UrlNormalizer};
