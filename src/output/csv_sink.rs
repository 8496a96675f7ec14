//! CSV output sink

use crate::output::{column_order, output_path, OutputResult, OutputSink, RunSummary};
use crate::scrape::{FieldValue, Record};
use std::fs;
use std::path::PathBuf;

/// Writes records as a CSV file with a header row.
///
/// Columns are the union of field names across all records, in first-seen
/// order; missing and invalid fields become empty cells.
pub struct CsvSink {
    directory: String,
    stem: String,
    include_timestamp: bool,
}

impl CsvSink {
    pub fn new(directory: &str, stem: &str, include_timestamp: bool) -> Self {
        Self {
            directory: directory.to_string(),
            stem: stem.to_string(),
            include_timestamp,
        }
    }
}

impl OutputSink for CsvSink {
    fn write(&self, records: &[Record], summary: &RunSummary) -> OutputResult<PathBuf> {
        let path = output_path(
            &self.directory,
            &self.stem,
            "csv",
            self.include_timestamp,
            &summary.started_at,
        );

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let columns = column_order(records);
        let mut writer = csv::Writer::from_path(&path)?;

        if !columns.is_empty() {
            writer.write_record(&columns)?;
        }

        for record in records {
            let row: Vec<&str> = columns
                .iter()
                .map(|column| match record.get(column) {
                    Some(FieldValue::Text(text)) => text.as_str(),
                    _ => "",
                })
                .collect();
            writer.write_record(&row)?;
        }

        writer.flush()?;
        tracing::info!(path = %path.display(), rows = records.len(), "wrote CSV output");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;
    use std::collections::BTreeMap;

    fn summary() -> RunSummary {
        RunSummary {
            source: "test".to_string(),
            started_at: Local::now(),
            record_count: 0,
            page_count: 0,
            failures: BTreeMap::new(),
        }
    }

    #[test]
    fn test_write_csv_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let sink = CsvSink::new(dir.path().to_str().unwrap(), "data", false);

        let mut first = Record::new();
        first.push("title", FieldValue::Text("Alpha".to_string()));
        first.push("price", FieldValue::Text("10.00".to_string()));

        let mut second = Record::new();
        second.push("title", FieldValue::Text("Beta".to_string()));
        second.push("price", FieldValue::Missing);

        let path = sink.write(&[first, second], &summary()).unwrap();
        let content = fs::read_to_string(&path).unwrap();

        let mut lines = content.lines();
        assert_eq!(lines.next(), Some("title,price"));
        assert_eq!(lines.next(), Some("Alpha,10.00"));
        assert_eq!(lines.next(), Some("Beta,"));
    }

    #[test]
    fn test_write_empty_records_produces_header_only_file() {
        let dir = tempfile::tempdir().unwrap();
        let sink = CsvSink::new(dir.path().to_str().unwrap(), "empty", false);

        let path = sink.write(&[], &summary()).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.trim().is_empty());
    }
}
