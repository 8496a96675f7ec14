//! Scrape orchestration core
//!
//! This module contains the fetch/extract/paginate machinery:
//! - HTTP fetching with retry and exponential backoff
//! - Field extraction via CSS and XPath selectors
//! - Pagination decisions with cycle and duplicate guards
//! - The per-URL state machine and its sequential and concurrent drivers

mod engine;
mod extractor;
mod fetcher;
mod paginator;

pub use engine::{run_target, run_urls, ScrapeContext, ScrapeOutcome, ScrapeReport};
pub use extractor::{extract, first_href, FieldValue, PageMeta, Record, Selector};
pub use fetcher::{build_http_client, fetch_url, FetchResult, RetryPolicy};
pub use paginator::{next_page, NextAction};

/// Failure taxonomy surfaced to the CLI layer
///
/// Per-field selector failures stay inside the record; everything else
/// terminates one page or one chain and is reported alongside whatever
/// records were already accumulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FailureKind {
    /// Connection failure or timeout after exhausting retries
    NetworkError,
    /// Non-retryable HTTP status, or a retryable one that outlived retries
    HttpStatus,
    /// robots.txt denies the URL
    RobotsDisallowed,
    /// A selector could not be evaluated
    SelectorError,
    /// The page could not be parsed at all
    ParseError,
    /// Malformed target or selector map, detected before any fetch
    ConfigError,
    /// Run-level wall-clock budget expired
    Timeout,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FailureKind::NetworkError => "network-error",
            FailureKind::HttpStatus => "http-status",
            FailureKind::RobotsDisallowed => "robots-disallowed",
            FailureKind::SelectorError => "selector-error",
            FailureKind::ParseError => "parse-error",
            FailureKind::ConfigError => "config-error",
            FailureKind::Timeout => "timeout",
        };
        write!(f, "{}", name)
    }
}
