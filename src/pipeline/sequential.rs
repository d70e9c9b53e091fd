//! Streaming line-by-line conversion.
//!
//! Reads a trace one line at a time and writes one record per recognized
//! line, in input order. Nothing beyond the current line is held in memory.

use super::cancel::CancellationToken;
use crate::output::{write_record, OutputFormat};
use crate::parser::{parse_line, LineOutcome};
use crate::utils::error::ConvertError;
use log::warn;
use std::io::{BufRead, Write};

/// Per-run conversion settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Keep lines mentioning `.plt` / `.text`
    pub keep_noise: bool,

    /// Serialization for emitted records
    pub format: OutputFormat,
}

/// A malformed line that produced no record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// 1-based line number in the input
    pub line: usize,
    pub message: String,
}

/// Counters and diagnostics collected over one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversionReport {
    pub lines_read: usize,
    pub records_written: usize,
    pub filtered: usize,
    pub unrecognized: usize,
    pub diagnostics: Vec<Diagnostic>,
}

impl ConversionReport {
    /// Fold a later report into this one
    pub fn merge(&mut self, other: ConversionReport) {
        self.lines_read += other.lines_read;
        self.records_written += other.records_written;
        self.filtered += other.filtered;
        self.unrecognized += other.unrecognized;
        self.diagnostics.extend(other.diagnostics);
    }

    /// One-line human readable summary
    pub fn summary(&self) -> String {
        format!(
            "{} lines, {} records, {} filtered, {} unrecognized, {} malformed",
            self.lines_read,
            self.records_written,
            self.filtered,
            self.unrecognized,
            self.diagnostics.len()
        )
    }
}

/// Classify, extract and serialize lines one at a time
///
/// **Public** - shared by the sequential pipeline and every parallel worker
#[derive(Debug)]
pub struct LineConverter {
    options: ConvertOptions,
    report: ConversionReport,
}

impl LineConverter {
    pub fn new(options: ConvertOptions) -> Self {
        Self {
            options,
            report: ConversionReport::default(),
        }
    }

    /// Convert one raw line, writing at most one record
    ///
    /// Malformed lines are reported on the log's warning channel and recorded
    /// as diagnostics; they never abort the run.
    ///
    /// # Errors
    /// * `ConvertError::Output` - the record could not be written
    pub fn convert_line<W: Write>(
        &mut self,
        line_number: usize,
        line: &str,
        out: &mut W,
    ) -> Result<(), ConvertError> {
        self.report.lines_read += 1;

        match parse_line(line, self.options.keep_noise) {
            Ok(LineOutcome::Record(record)) => {
                write_record(out, &record, self.options.format)?;
                self.report.records_written += 1;
            }
            Ok(LineOutcome::Filtered) => self.report.filtered += 1,
            Ok(LineOutcome::Unrecognized) => self.report.unrecognized += 1,
            Err(e) => {
                warn!("line {}: {}", line_number, e);
                self.report.diagnostics.push(Diagnostic {
                    line: line_number,
                    message: e.to_string(),
                });
            }
        }

        Ok(())
    }

    pub fn finish(self) -> ConversionReport {
        self.report
    }
}

/// Convert a whole trace stream sequentially
///
/// **Public** - main entry point for streaming conversion
///
/// # Arguments
/// * `input` - Trace source, read line by line
/// * `output` - Destination for records (wrap it in a `BufWriter` for files)
/// * `options` - Filter and format settings
/// * `cancel` - Checked before every line
///
/// # Errors
/// * `ConvertError::Io` - reading the input or flushing the output failed
/// * `ConvertError::Output` - a record could not be written
/// * `ConvertError::Cancelled` - the token was set mid-run
pub fn convert_stream<R: BufRead, W: Write>(
    mut input: R,
    mut output: W,
    options: &ConvertOptions,
    cancel: &CancellationToken,
) -> Result<ConversionReport, ConvertError> {
    let mut converter = LineConverter::new(*options);
    let mut buffer = Vec::new();
    let mut line_number = 0;

    loop {
        if cancel.is_cancelled() {
            return Err(ConvertError::Cancelled);
        }

        buffer.clear();
        if input.read_until(b'\n', &mut buffer)? == 0 {
            break;
        }
        line_number += 1;

        let line = String::from_utf8_lossy(&buffer);
        converter.convert_line(line_number, &line, &mut output)?;
    }

    output.flush()?;

    Ok(converter.finish())
}
