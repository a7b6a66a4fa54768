use crate::shared::error::{Error, Result};
use crate::shared::models::{DocumentPayload, PayloadValue};
use std::fs;
use std::path::Path;

/// Source key holding the document text in line-delimited JSON input.
const JSON_TEXT_KEY: &str = "description";
/// Source column holding the document text in CSV input.
const CSV_TEXT_COLUMN: &str = "short_description";

/// Metadata key renames applied to JSON records: source key -> canonical key.
const KEY_RENAMES: [(&str, &str); 2] = [("images", "logoUrl"), ("link", "homepageUrl")];

/// Documents and their metadata, extracted from a source file and ready for
/// embedding and upload. `documents[i]` pairs with `metadata[i]`.
#[derive(Debug)]
pub struct PreparedDocuments {
    pub documents: Vec<String>,
    pub metadata: Vec<DocumentPayload>,
}

/// Dispatch on file extension. Line-delimited `.json` and tabular `.csv`
/// are supported; any other extension yields `None`, never an error.
pub fn preprocess(path: &Path) -> Result<Option<PreparedDocuments>> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => preprocess_jsonl(path).map(Some),
        Some("csv") => preprocess_csv(path).map(Some),
        _ => Ok(None),
    }
}

/// One JSON object per line. The text key is removed from the record; the
/// remaining attributes become metadata, with `images`/`link` renamed to
/// their canonical names.
fn preprocess_jsonl(path: &Path) -> Result<PreparedDocuments> {
    let contents = fs::read_to_string(path).map_err(Error::preprocessing)?;

    let mut documents = Vec::new();
    let mut metadata = Vec::new();
    for (line_no, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let mut record: serde_json::Map<String, serde_json::Value> =
            serde_json::from_str(line).map_err(|e| {
                Error::Preprocessing(format!("line {}: {}", line_no + 1, e))
            })?;

        let text = match record.remove(JSON_TEXT_KEY) {
            Some(serde_json::Value::String(text)) => text,
            Some(_) => {
                return Err(Error::Preprocessing(format!(
                    "line {}: '{}' is not a string",
                    line_no + 1,
                    JSON_TEXT_KEY
                )))
            }
            None => {
                return Err(Error::Preprocessing(format!(
                    "line {}: missing '{}'",
                    line_no + 1,
                    JSON_TEXT_KEY
                )))
            }
        };

        for (source, canonical) in KEY_RENAMES {
            if let Some(value) = record.remove(source) {
                record.insert(canonical.to_string(), value);
            }
        }

        let mut payload = DocumentPayload::new();
        for (key, value) in record {
            payload.insert(key, scalar_value(&value, line_no + 1)?);
        }

        documents.push(text);
        metadata.push(payload);
    }

    Ok(PreparedDocuments {
        documents,
        metadata,
    })
}

/// One document per CSV row; every column other than the text column becomes
/// metadata, with numbers and booleans parsed from their cell text.
fn preprocess_csv(path: &Path) -> Result<PreparedDocuments> {
    let mut reader = csv::Reader::from_path(path).map_err(Error::preprocessing)?;
    let headers = reader.headers().map_err(Error::preprocessing)?.clone();
    let text_column = headers
        .iter()
        .position(|h| h == CSV_TEXT_COLUMN)
        .ok_or_else(|| {
            Error::Preprocessing(format!("missing '{}' column", CSV_TEXT_COLUMN))
        })?;

    let mut documents = Vec::new();
    let mut metadata = Vec::new();
    for record in reader.records() {
        let record = record.map_err(Error::preprocessing)?;
        let mut payload = DocumentPayload::new();
        for (idx, cell) in record.iter().enumerate() {
            if idx == text_column {
                continue;
            }
            let key = headers.get(idx).unwrap_or_default().to_string();
            payload.insert(key, parse_cell(cell));
        }
        documents.push(record.get(text_column).unwrap_or_default().to_string());
        metadata.push(payload);
    }

    Ok(PreparedDocuments {
        documents,
        metadata,
    })
}

fn scalar_value(value: &serde_json::Value, line_no: usize) -> Result<PayloadValue> {
    match value {
        serde_json::Value::Null => Ok(PayloadValue::Null),
        serde_json::Value::Bool(b) => Ok(PayloadValue::Bool(*b)),
        serde_json::Value::Number(n) => Ok(PayloadValue::Number(n.as_f64().unwrap_or(0.0))),
        serde_json::Value::String(s) => Ok(PayloadValue::String(s.clone())),
        _ => Err(Error::Preprocessing(format!(
            "line {}: nested values are not supported",
            line_no
        ))),
    }
}

fn parse_cell(cell: &str) -> PayloadValue {
    if cell.is_empty() {
        return PayloadValue::Null;
    }
    match cell {
        "true" | "True" => return PayloadValue::Bool(true),
        "false" | "False" => return PayloadValue::Bool(false),
        _ => {}
    }
    if let Ok(n) = cell.parse::<f64>() {
        return PayloadValue::Number(n);
    }
    PayloadValue::String(cell.to_string())
}
