//! Line classification and dispatch.
//!
//! Decides whether a raw trace line is kept, which record kind it encodes,
//! and hands it to the matching extractor.

use super::fields::{extract_access, extract_allocation, extract_free, extract_function};
use super::schema::Record;
use crate::utils::config::{
    ALLOC_PREFIX, FREE_PREFIX, FUNCTION_BEGIN_PREFIX, FUNCTION_END_PREFIX, NOISE_MARKERS,
    READ_PREFIX, WRITE_PREFIX,
};
use crate::utils::error::ParseError;

/// Record kind encoded by a trace line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineKind {
    Allocation,
    Access,
    Function,
    Free,
}

/// Prefix table, checked in order; the first match wins
const PREFIXES: &[(&str, LineKind)] = &[
    (ALLOC_PREFIX, LineKind::Allocation),
    (READ_PREFIX, LineKind::Access),
    (WRITE_PREFIX, LineKind::Access),
    (FUNCTION_BEGIN_PREFIX, LineKind::Function),
    (FUNCTION_END_PREFIX, LineKind::Function),
    (FREE_PREFIX, LineKind::Free),
];

/// Result of classifying one raw line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification<'a> {
    /// Dropped by the `.plt` / `.text` filter
    Noise,
    /// No known prefix
    Unrecognized,
    /// Known kind, with trailing whitespace already stripped
    Kind(LineKind, &'a str),
}

/// What a single line turned into
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    Record(Record),
    Filtered,
    Unrecognized,
}

/// Check whether a line references instrumentation-internal sections
pub fn is_noise(line: &str) -> bool {
    NOISE_MARKERS.iter().any(|marker| line.contains(marker))
}

/// Classify a raw trace line
///
/// **Public** - used by the pipelines and tests
///
/// The noise filter runs on the raw line; prefix matching is case-sensitive
/// and runs on the line with trailing whitespace removed.
pub fn classify(line: &str, keep_noise: bool) -> Classification<'_> {
    if !keep_noise && is_noise(line) {
        return Classification::Noise;
    }

    let line = line.trim_end();

    PREFIXES
        .iter()
        .find(|(prefix, _)| line.starts_with(prefix))
        .map(|(_, kind)| Classification::Kind(*kind, line))
        .unwrap_or(Classification::Unrecognized)
}

/// Classify a line and extract its record
///
/// **Public** - main entry point for per-line conversion
///
/// # Arguments
/// * `line` - Raw trace line, with or without its newline
/// * `keep_noise` - Keep lines mentioning `.plt` / `.text`
///
/// # Errors
/// * `ParseError::MissingRequiredField` - an `implicit-free` line without its address
pub fn parse_line(line: &str, keep_noise: bool) -> Result<LineOutcome, ParseError> {
    let record = match classify(line, keep_noise) {
        Classification::Noise => return Ok(LineOutcome::Filtered),
        Classification::Unrecognized => return Ok(LineOutcome::Unrecognized),
        Classification::Kind(LineKind::Allocation, line) => {
            Record::Allocation(extract_allocation(line)?)
        }
        Classification::Kind(LineKind::Access, line) => Record::Access(extract_access(line)?),
        Classification::Kind(LineKind::Function, line) => {
            Record::Function(extract_function(line)?)
        }
        Classification::Kind(LineKind::Free, line) => Record::Free(extract_free(line)?),
    };

    Ok(LineOutcome::Record(record))
}
