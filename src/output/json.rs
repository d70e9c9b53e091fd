//! JSON Lines record writer and reader.
//!
//! Each record is written as one compact JSON object on its own line.
//! Escaping of quotes and control characters inside source-derived text is
//! left to `serde_json`, so a record can never break out of its envelope.

use crate::parser::Record;
use crate::utils::error::OutputError;
use log::debug;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

/// Write a record as one JSON line
///
/// **Public** - main entry point for JSON output
///
/// # Errors
/// * `OutputError::SerializationFailed` - JSON serialization error
/// * `OutputError::WriteFailed` - I/O error during write
pub fn write_json_record<W: Write>(writer: &mut W, record: &Record) -> Result<(), OutputError> {
    serde_json::to_writer(&mut *writer, record)?;
    writer.write_all(b"\n")?;
    Ok(())
}

/// Serialize a record to a JSON string (no trailing newline)
///
/// **Public** - useful for tests and debugging
pub fn record_to_string(record: &Record) -> Result<String, OutputError> {
    serde_json::to_string(record).map_err(OutputError::SerializationFailed)
}

/// Read every record from a JSON Lines file
///
/// **Public** - used by the validate command
///
/// # Errors
/// * `OutputError::WriteFailed` - File read error (reusing WriteFailed for I/O)
/// * `OutputError::InvalidRecord` - A line is not a valid record
pub fn read_records(input_path: impl AsRef<Path>) -> Result<Vec<Record>, OutputError> {
    let input_path = input_path.as_ref();

    debug!("Reading records from: {}", input_path.display());

    let file = File::open(input_path).map_err(OutputError::WriteFailed)?;
    let records = read_records_from(BufReader::new(file))?;

    debug!("Loaded {} records", records.len());

    Ok(records)
}

/// Read every record from a JSON Lines stream
///
/// Blank lines are skipped. Line numbers in errors are 1-based.
pub fn read_records_from<R: BufRead>(reader: R) -> Result<Vec<Record>, OutputError> {
    let mut records = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let invalid = |reason: String| OutputError::InvalidRecord {
            line: index + 1,
            reason,
        };

        let value: serde_json::Value =
            serde_json::from_str(&line).map_err(|e| invalid(e.to_string()))?;
        let record = Record::try_from(value).map_err(|e| invalid(e.to_string()))?;
        records.push(record);
    }

    Ok(records)
}
