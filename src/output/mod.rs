//! Output handling for scraped records
//!
//! The orchestration core hands an ordered record sequence plus run
//! metadata to an `OutputSink`; everything about on-disk format lives
//! behind that trait.

mod csv_sink;
mod json_sink;

pub use csv_sink::CsvSink;
pub use json_sink::JsonSink;

use crate::config::{OutputConfig, OutputFormat};
use crate::scrape::{FailureKind, Record, ScrapeReport};
use chrono::{DateTime, Local};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while writing output
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Metadata handed to the sink alongside the records
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Target name or URL description
    pub source: String,
    pub started_at: DateTime<Local>,
    pub record_count: usize,
    pub page_count: u32,
    /// Failures by kind across all reports of the run
    pub failures: BTreeMap<FailureKind, usize>,
}

impl RunSummary {
    /// Aggregates counts over the reports of one invocation
    pub fn from_reports(source: &str, started_at: DateTime<Local>, reports: &[ScrapeReport]) -> Self {
        let mut failures: BTreeMap<FailureKind, usize> = BTreeMap::new();
        for report in reports {
            if let Some((kind, _)) = &report.failure {
                *failures.entry(*kind).or_default() += 1;
            }
        }

        Self {
            source: source.to_string(),
            started_at,
            record_count: reports.iter().map(|r| r.records.len()).sum(),
            page_count: reports.iter().map(|r| r.pages_fetched).sum(),
            failures,
        }
    }
}

/// Writes one run's records somewhere; the format is the sink's concern
pub trait OutputSink {
    fn write(&self, records: &[Record], summary: &RunSummary) -> OutputResult<PathBuf>;
}

/// Builds the configured sink for a run
pub fn make_sink(config: &OutputConfig, stem: &str) -> Box<dyn OutputSink> {
    match config.format {
        OutputFormat::Csv => Box::new(CsvSink::new(
            &config.directory,
            stem,
            config.include_timestamp,
        )),
        OutputFormat::Json => Box::new(JsonSink::new(
            &config.directory,
            stem,
            config.include_timestamp,
        )),
    }
}

/// Computes the output path: `<dir>/<stem>[_<YYYYMMDD_HHMMSS>].<ext>`
fn output_path(
    directory: &str,
    stem: &str,
    extension: &str,
    include_timestamp: bool,
    started_at: &DateTime<Local>,
) -> PathBuf {
    let file_name = if include_timestamp {
        format!(
            "{}_{}.{}",
            stem,
            started_at.format("%Y%m%d_%H%M%S"),
            extension
        )
    } else {
        format!("{}.{}", stem, extension)
    };

    Path::new(directory).join(file_name)
}

/// Header column order: union of record keys in first-seen order
fn column_order(records: &[Record]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for record in records {
        for (name, _) in record.iter() {
            if !columns.iter().any(|c| c == name) {
                columns.push(name.clone());
            }
        }
    }
    columns
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrape::FieldValue;
    use chrono::TimeZone;

    fn record(pairs: &[(&str, &str)]) -> Record {
        let mut record = Record::new();
        for (name, value) in pairs {
            record.push(*name, FieldValue::Text(value.to_string()));
        }
        record
    }

    #[test]
    fn test_output_path_with_timestamp() {
        let started = Local.with_ymd_and_hms(2026, 8, 6, 12, 30, 45).unwrap();
        let path = output_path("/tmp/out", "books", "csv", true, &started);
        assert_eq!(path, PathBuf::from("/tmp/out/books_20260806_123045.csv"));
    }

    #[test]
    fn test_output_path_without_timestamp() {
        let started = Local::now();
        let path = output_path("out", "books", "json", false, &started);
        assert_eq!(path, PathBuf::from("out/books.json"));
    }

    #[test]
    fn test_column_order_is_first_seen_union() {
        let records = vec![
            record(&[("a", "1"), ("b", "2")]),
            record(&[("a", "3"), ("c", "4")]),
        ];
        assert_eq!(column_order(&records), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_run_summary_aggregates_reports() {
        let reports = vec![
            ScrapeReport {
                source: "u1".to_string(),
                records: vec![record(&[("a", "1")]), record(&[("a", "2")])],
                pages_fetched: 2,
                failure: None,
            },
            ScrapeReport {
                source: "u2".to_string(),
                records: vec![],
                pages_fetched: 0,
                failure: Some((FailureKind::NetworkError, "down".to_string())),
            },
        ];

        let summary = RunSummary::from_reports("run", Local::now(), &reports);
        assert_eq!(summary.record_count, 2);
        assert_eq!(summary.page_count, 2);
        assert_eq!(summary.failures.get(&FailureKind::NetworkError), Some(&1));
    }
}
