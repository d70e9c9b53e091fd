//! Conversion pipelines.
//!
//! - `sequential`: streaming, one line at a time
//! - `chunked`: whole trace buffered, partitions converted in parallel and
//!   reassembled in order
//!
//! Both produce identical output and reports for the same input.

pub mod cancel;
pub mod chunked;
pub mod sequential;

pub use cancel::CancellationToken;
pub use chunked::{convert_chunked, default_workers, load_lines, partition, ParallelOptions};
pub use sequential::{convert_stream, ConversionReport, ConvertOptions, Diagnostic, LineConverter};
