//! CSV export of the recorded entries.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};

use crate::models::{FishEntry, SamplingInfo};

/// One exported column: the key it is read from and the header it is
/// written under.
#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub key: &'static str,
    pub header: &'static str,
}

const fn col(key: &'static str, header: &'static str) -> Column {
    Column { key, header }
}

pub const COLUMNS: [Column; 15] = [
    col("fishId", "fishId"),
    col("penId", "penId"),
    col("species", "species"),
    col("location", "location"),
    col("weight", "weightG"),
    col("length", "lengthMm"),
    col("width", "widthMm"),
    col("breadth", "breadthMm"),
    col("circumference", "circumferenceMm"),
    col("captureStart", "captureStart"),
    col("captureEnd", "captureEnd"),
    col("sedationEnd", "sedationEnd"),
    col("measurementEnd", "measurementEnd"),
    col("notes", "notes"),
    col("collectionName", "collectionName"),
];

/// Render the entries as CSV, or `None` when there is nothing to export.
pub fn to_csv(entries: &[FishEntry], info: &SamplingInfo) -> Option<String> {
    if entries.is_empty() {
        return None;
    }

    let header = COLUMNS
        .iter()
        .map(|column| column.header)
        .collect::<Vec<_>>()
        .join(",");

    let mut lines = Vec::with_capacity(entries.len() + 1);
    lines.push(header);
    for entry in entries {
        let row = row_values(entry, info);
        let cells: Vec<String> = COLUMNS
            .iter()
            .map(|column| escape_csv(row.get(column.key).unwrap_or(&Value::Null)))
            .collect();
        lines.push(cells.join(","));
    }

    Some(lines.join("\n"))
}

/// The entry's own fields plus the session-scoped columns.
fn row_values(entry: &FishEntry, info: &SamplingInfo) -> Map<String, Value> {
    let mut row = match serde_json::to_value(entry) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    };
    row.insert("penId".into(), Value::String(info.pen_id.clone()));
    row.insert(
        "location".into(),
        info.location.clone().map(Value::String).unwrap_or(Value::Null),
    );
    row.insert("species".into(), Value::String(info.species.clone()));
    row.insert("collectionName".into(), Value::String(info.name.clone()));
    row
}

/// Stringify one cell, quoting it when it holds a comma, quote or line break.
pub fn escape_csv(value: &Value) -> String {
    let text = match value {
        Value::Null => return String::new(),
        Value::String(text) => text.clone(),
        Value::Number(number) => match number.as_i64() {
            Some(int) => int.to_string(),
            None => number
                .as_f64()
                .map(|float| float.to_string())
                .unwrap_or_else(|| number.to_string()),
        },
        Value::Bool(flag) => flag.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    };

    if text.contains(&[',', '"', '\n', '\r'][..]) {
        format!("\"{}\"", text.replace('"', "\"\""))
    } else {
        text
    }
}

/// `gtsf-entries-2025-03-01T09-30-00.csv` for an export taken at that instant.
pub fn export_file_name(now: DateTime<Utc>) -> String {
    let stamp: String = now
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace(&[':', '.'][..], "-")
        .chars()
        .take(19)
        .collect();
    format!("gtsf-entries-{stamp}.csv")
}

/// Write the CSV into `dir`. Returns `None` without touching the
/// filesystem when there are no entries.
pub fn write_csv_file(
    dir: &Path,
    entries: &[FishEntry],
    info: &SamplingInfo,
    now: DateTime<Utc>,
) -> Result<Option<PathBuf>> {
    let Some(csv) = to_csv(entries, info) else {
        return Ok(None);
    };

    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create export directory {}", dir.display()))?;
    let path = dir.join(export_file_name(now));
    std::fs::write(&path, csv)
        .with_context(|| format!("failed to write export to {}", path.display()))?;
    Ok(Some(path))
}
