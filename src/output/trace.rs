//! Normalized trace-line output.

use crate::parser::Record;
use crate::utils::error::OutputError;
use std::io::Write;

/// Write a record in memtracker line form
pub fn write_trace_record<W: Write>(writer: &mut W, record: &Record) -> Result<(), OutputError> {
    writeln!(writer, "{}", record)?;
    Ok(())
}
