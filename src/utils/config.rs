//! Configuration and constants for the converter.

/// Literal written for any field whose token was absent from the trace line
pub const PLACEHOLDER: &str = "-";

/// Substrings marking instrumentation-internal addresses (dropped unless `--keepdots`)
pub const NOISE_MARKERS: &[&str] = &[".plt", ".text"];

// Line prefixes emitted by the memtracker pintool
pub const ALLOC_PREFIX: &str = "alloc:";
pub const READ_PREFIX: &str = "read:";
pub const WRITE_PREFIX: &str = "write:";
pub const FUNCTION_BEGIN_PREFIX: &str = "function-begin";
pub const FUNCTION_END_PREFIX: &str = "function-end";
pub const FREE_PREFIX: &str = "implicit-free";

// Event discriminators written in the `event` key
pub const ALLOCATION_EVENT: &str = "allocation";
pub const FREE_EVENT: &str = "implicit-free";
pub const ACCESS_EVENT: &str = "memory-access";

/// Prefix of the per-run temporary directory used by parallel mode
pub const TEMP_DIR_PREFIX: &str = "memtrace-chunks-";

/// Environment variable consulted for the parallel-mode temp base directory
pub const TMPDIR_ENV: &str = "MEMTRACE_TMPDIR";

/// File name of the private output for partition `index`
pub fn chunk_file_name(index: usize) -> String {
    format!("chunk-{:04}.jsonl", index)
}
