//! Output writers for converted records.
//!
//! This module handles writing records in the supported formats:
//! - JSON Lines (one object per trace line)
//! - Normalized trace lines (placeholders filled in)
//!
//! and reading JSON Lines output back for validation.

pub mod json;
pub mod trace;

use crate::parser::Record;
use crate::utils::error::OutputError;
use std::io::Write;

// Re-export main functions
pub use json::{read_records, read_records_from, record_to_string, write_json_record};
pub use trace::write_trace_record;

/// Serialization used for every emitted record of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// One JSON object per line
    #[default]
    Json,
    /// Normalized memtracker trace line
    Trace,
}

/// Write one record followed by a newline
///
/// **Public** - used by both pipelines
pub fn write_record<W: Write>(
    writer: &mut W,
    record: &Record,
    format: OutputFormat,
) -> Result<(), OutputError> {
    match format {
        OutputFormat::Json => write_json_record(writer, record),
        OutputFormat::Trace => write_trace_record(writer, record),
    }
}
