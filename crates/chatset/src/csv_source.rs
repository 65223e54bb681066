use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ChatsetError, Result};
use crate::schema::Record;

/// Which CSV columns feed each record field.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ColumnMap {
    pub text: String,
    pub label_a: String,
    pub label_b: String,
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self {
            text: "Review".to_string(),
            label_a: "Rating".to_string(),
            label_b: "Sentiment".to_string(),
        }
    }
}

pub fn load_records(path: &Path, columns: &ColumnMap) -> Result<Vec<Record>> {
    let f = std::fs::File::open(path)?;
    let records = read_records(f, columns)?;
    info!(path = %path.display(), rows = records.len(), "records loaded");
    Ok(records)
}

/// Read every data row. The first row is the header. Row indices in errors
/// are 0-based over data rows.
pub fn read_records<R: io::Read>(reader: R, columns: &ColumnMap) -> Result<Vec<Record>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);
    let headers = rdr.headers()?.clone();

    let find = |name: &str| headers.iter().position(|h| h.trim() == name);
    let text_idx = find(&columns.text);
    let a_idx = find(&columns.label_a);
    let b_idx = find(&columns.label_b);

    let mut out = Vec::new();
    for (row, result) in rdr.records().enumerate() {
        let rec = result?;

        let cell = |idx: Option<usize>, field: &str| -> Result<String> {
            match idx.and_then(|i| rec.get(i)) {
                Some(v) if !v.trim().is_empty() => Ok(v.to_string()),
                _ => Err(ChatsetError::MissingField { row, field: field.to_string() }),
            }
        };

        let text = cell(text_idx, &columns.text)?;
        let raw_rating = cell(a_idx, &columns.label_a)?;
        let label_b = cell(b_idx, &columns.label_b)?;

        let label_a = raw_rating.trim().parse::<i64>().map_err(|_| ChatsetError::InvalidField {
            row,
            field: columns.label_a.clone(),
            value: raw_rating.clone(),
        })?;

        out.push(Record { text, label_a, label_b });
    }

    Ok(out)
}
