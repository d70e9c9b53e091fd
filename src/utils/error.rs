//! Error types for the entire application.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs and commands.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while extracting a record from one trace line
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("{kind} record without the {field} parameter")]
    MissingRequiredField {
        kind: &'static str,
        field: &'static str,
    },
}

/// Errors that can occur during record output and read-back
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    WriteFailed(#[from] std::io::Error),

    #[error("Failed to serialize JSON: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    #[error("Invalid record on line {line}: {reason}")]
    InvalidRecord { line: usize, reason: String },
}

/// Errors that abort a conversion run
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Output(#[from] OutputError),

    #[error("Input too large to buffer in memory ({bytes} bytes); rerun without --parallel to stream it sequentially")]
    InputTooLarge { bytes: u64 },

    #[error("Worker count must be at least 1")]
    NoWorkers,

    #[error("Failed to create chunk directory under {}: {source}", base.display())]
    TempDir {
        base: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Partition {partition} failed: {reason}")]
    WorkerFailed { partition: usize, reason: String },

    #[error("Conversion cancelled")]
    Cancelled,
}
