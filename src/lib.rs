//! Memtrace JSON
//!
//! Converts the line-oriented traces written by the memtracker pintool
//! (allocations, implicit frees, memory accesses, function boundaries)
//! into one JSON record per line for downstream tooling.
//!
//! This crate provides the core implementation for the
//! `memtrace2json` CLI tool.
//!
//! ## Getting Started
//!
//! ```bash
//! memtrace2json convert --infile trace.out --output trace.jsonl
//! memtrace2json convert --infile trace.out --parallel --tmp-dir /scratch
//! ```

pub mod commands;
pub mod output;
pub mod parser;
pub mod pipeline;
pub mod utils;
