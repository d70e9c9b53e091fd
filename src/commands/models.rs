use crate::output::OutputFormat;
use std::path::PathBuf;

/// Arguments for the convert command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone, Default)]
pub struct ConvertArgs {
    /// Trace file (None = stdin)
    pub input: Option<PathBuf>,

    /// Output file (None = stdout)
    pub output: Option<PathBuf>,

    /// Keep records from .text and .plt
    pub keep_noise: bool,

    /// Output record format
    pub format: OutputFormat,

    /// Use the chunked parallel pipeline
    pub parallel: bool,

    /// Base directory for per-worker chunk files (None = system temp dir)
    pub temp_base: Option<PathBuf>,

    /// Worker count override (None = available parallelism)
    pub workers: Option<usize>,
}
