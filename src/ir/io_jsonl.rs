//! JSON Lines persistence for documents.
//!
//! Each line holds one document object in the canonical camelCase layout
//! (`indexInDocument`, `tokenDocumentIndices`, `headMentionIndex`, ...).
//! This is the format importers hand to the core and the format the CLI
//! reads and writes.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::model::Document;
use crate::error::SpanscoreError;

/// Reads all documents from a JSONL file.
///
/// Blank lines are ignored.
///
/// # Errors
/// Returns an error if the file cannot be read or a line fails to parse.
/// Parse errors carry the 1-based line number.
pub fn read_jsonl(path: &Path) -> Result<Vec<Document>, SpanscoreError> {
    read_records(path)
}

/// Writes documents to a JSONL file, one document per line.
///
/// # Errors
/// Returns an error if the file cannot be written.
pub fn write_jsonl(path: &Path, documents: &[Document]) -> Result<(), SpanscoreError> {
    write_records(path, documents)
}

/// Reads one record per non-blank line.
pub fn read_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, SpanscoreError> {
    let file = File::open(path).map_err(SpanscoreError::Io)?;
    let reader = BufReader::new(file);

    let mut records = Vec::new();
    for (line_idx, line) in reader.lines().enumerate() {
        let line = line.map_err(SpanscoreError::Io)?;
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(&line).map_err(|source| SpanscoreError::JsonlParse {
            path: path.to_path_buf(),
            line: line_idx + 1,
            source,
        })?;
        records.push(record);
    }

    Ok(records)
}

/// Writes one record per line.
pub fn write_records<T: Serialize>(path: &Path, records: &[T]) -> Result<(), SpanscoreError> {
    let file = File::create(path).map_err(SpanscoreError::Io)?;
    let mut writer = BufWriter::new(file);

    for record in records {
        serde_json::to_writer(&mut writer, record).map_err(|source| {
            SpanscoreError::JsonlWrite {
                path: path.to_path_buf(),
                source,
            }
        })?;
        writer.write_all(b"\n").map_err(SpanscoreError::Io)?;
    }

    writer.flush().map_err(SpanscoreError::Io)
}

/// Parses documents from a JSONL string.
///
/// Useful for testing without file I/O.
pub fn from_jsonl_str(jsonl: &str) -> Result<Vec<Document>, serde_json::Error> {
    jsonl
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(serde_json::from_str)
        .collect()
}

/// Serializes records to a JSONL string.
pub fn to_jsonl_string<T: Serialize>(records: &[T]) -> Result<String, serde_json::Error> {
    let mut out = String::new();
    for record in records {
        out.push_str(&serde_json::to_string(record)?);
        out.push('\n');
    }
    Ok(out)
}
