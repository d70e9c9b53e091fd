//! Trace line parsing and record definitions.
//!
//! This module handles:
//! - Classifying raw memtracker lines by prefix
//! - Filtering instrumentation noise
//! - Extracting positional fields with placeholder fallback
//! - Defining the output records

pub mod fields;
pub mod line;
pub mod schema;

// Re-export main types
pub use fields::{FieldLayout, FieldSpec, Source};
pub use line::{classify, parse_line, Classification, LineKind, LineOutcome};
pub use schema::{Access, Allocation, Field, Free, FunctionEvent, Record};
