//! JSON output sink

use crate::output::{output_path, OutputResult, OutputSink, RunSummary};
use crate::scrape::{FieldValue, Record};
use serde_json::{Map, Value};
use std::fs;
use std::path::PathBuf;

/// Writes records as a JSON array of objects, preserving field order
pub struct JsonSink {
    directory: String,
    stem: String,
    include_timestamp: bool,
}

impl JsonSink {
    pub fn new(directory: &str, stem: &str, include_timestamp: bool) -> Self {
        Self {
            directory: directory.to_string(),
            stem: stem.to_string(),
            include_timestamp,
        }
    }
}

fn record_to_value(record: &Record) -> Value {
    let mut object = Map::new();
    for (name, value) in record.iter() {
        let json_value = match value {
            FieldValue::Text(text) => Value::String(text.clone()),
            // Missing and unevaluable fields both surface as null; the
            // extraction layer already logged the selector error.
            FieldValue::Missing | FieldValue::Invalid(_) => Value::Null,
        };
        object.insert(name.clone(), json_value);
    }
    Value::Object(object)
}

impl OutputSink for JsonSink {
    fn write(&self, records: &[Record], summary: &RunSummary) -> OutputResult<PathBuf> {
        let path = output_path(
            &self.directory,
            &self.stem,
            "json",
            self.include_timestamp,
            &summary.started_at,
        );

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let values: Vec<Value> = records.iter().map(record_to_value).collect();
        let json = serde_json::to_string_pretty(&Value::Array(values))?;
        fs::write(&path, json)?;

        tracing::info!(path = %path.display(), rows = records.len(), "wrote JSON output");
        Ok(path)
    }
}
