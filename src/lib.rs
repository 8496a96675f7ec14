//! Dragnet: a declarative web scraper
//!
//! This crate turns a declarative target description (base URL, field
//! selectors, pagination rule) into a bounded, polite sequence of
//! fetch/extract/paginate cycles, respecting robots.txt, per-origin rate
//! limits, and retry budgets, with both sequential and concurrent drivers.

pub mod config;
pub mod limiter;
pub mod output;
pub mod robots;
pub mod scrape;
pub mod url;

use thiserror::Error;

/// Main error type for Dragnet operations
#[derive(Debug, Error)]
pub enum DragnetError {
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

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
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

    #[error("Invalid selector for field '{field}': {message}")]
    InvalidSelector { field: String, message: String },
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

/// Result type alias for Dragnet operations
pub type Result<T> = std::result::Result<T, DragnetError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::{Config, FieldSpec, PaginationRule, SelectorKind, Target};
pub use scrape::{FailureKind, Record, ScrapeContext, ScrapeOutcome, ScrapeReport};
pub use crate::url::{origin_of, resolve, validate_absolute};
