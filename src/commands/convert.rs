//! Convert command implementation.
//!
//! The convert command:
//! 1. Validates the input file and parallel settings
//! 2. Opens input (file or stdin) and output (file or stdout)
//! 3. Runs the sequential or chunked pipeline
//! 4. Logs the conversion report

use super::models::ConvertArgs;
use crate::pipeline::{
    convert_chunked, convert_stream, default_workers, CancellationToken, ConversionReport,
    ConvertOptions, ParallelOptions,
};
use anyhow::{Context, Result};
use log::{debug, info};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;
use std::time::Instant;
use tempfile::NamedTempFile;

/// Execute the convert command
///
/// **Public** - main entry point called from main.rs
///
/// # Arguments
/// * `args` - Convert command arguments
/// * `cancel` - Token wired to Ctrl-C by the binary
///
/// # Returns
/// The conversion report (counts and malformed-line diagnostics)
///
/// # Errors
/// * Missing input file (reported before any output is produced)
/// * Input or output I/O failures
/// * Parallel-mode failures (buffering, temp directory, worker failure)
pub fn execute_convert(args: &ConvertArgs, cancel: &CancellationToken) -> Result<ConversionReport> {
    let start_time = Instant::now();

    validate_args(args)?;

    let options = ConvertOptions {
        keep_noise: args.keep_noise,
        format: args.format,
    };

    match &args.input {
        Some(path) => info!("Converting trace: {}", path.display()),
        None => info!("Converting trace from stdin"),
    }

    let report = if args.parallel {
        run_parallel(args, &options, cancel)?
    } else {
        run_sequential(args, &options, cancel)?
    };

    info!("Conversion report: {}", report.summary());
    if let Some(path) = &args.output {
        info!("✓ Records written to: {}", path.display());
    }

    let elapsed = start_time.elapsed();
    info!("Conversion completed in {:.2}s", elapsed.as_secs_f64());

    Ok(report)
}

/// Stream the trace through the sequential pipeline
///
/// **Private** - internal helper for execute_convert
///
/// Records reach the output as they are converted, so a failed or cancelled
/// run leaves the records written so far.
fn run_sequential(
    args: &ConvertArgs,
    options: &ConvertOptions,
    cancel: &CancellationToken,
) -> Result<ConversionReport> {
    debug!("Using sequential pipeline");

    let output: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path)
                .with_context(|| format!("Failed to create output file {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    let report = match &args.input {
        Some(path) => {
            let file = open_input(path)?;
            convert_stream(BufReader::new(file), output, options, cancel)
        }
        None => convert_stream(io::stdin().lock(), output, options, cancel),
    };

    report.context("Sequential conversion failed")
}

/// Buffer the trace and convert it with the chunked pipeline
///
/// **Private** - internal helper for execute_convert
///
/// A file output is staged next to its destination and only moved into
/// place once every partition succeeded. A failed run leaves an existing
/// output file untouched and never creates a new one.
fn run_parallel(
    args: &ConvertArgs,
    options: &ConvertOptions,
    cancel: &CancellationToken,
) -> Result<ConversionReport> {
    let temp_base = args.temp_base.clone().unwrap_or_else(std::env::temp_dir);
    let workers = args.workers.unwrap_or_else(default_workers);
    let parallel = ParallelOptions::new(temp_base).with_workers(workers);

    debug!(
        "Using chunked pipeline: {} workers, temp base {}",
        parallel.workers,
        parallel.temp_base.display()
    );

    match &args.output {
        Some(path) => {
            let dir = match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent,
                _ => Path::new("."),
            };
            let staged = NamedTempFile::new_in(dir)
                .with_context(|| format!("Failed to create output file in {}", dir.display()))?;

            let report = convert_input_chunked(
                args,
                BufWriter::new(staged.as_file()),
                options,
                &parallel,
                cancel,
            )?;

            staged
                .persist(path)
                .with_context(|| format!("Failed to write output file {}", path.display()))?;
            Ok(report)
        }
        None => convert_input_chunked(
            args,
            BufWriter::new(io::stdout().lock()),
            options,
            &parallel,
            cancel,
        ),
    }
}

/// **Private** - feed file or stdin input to the chunked pipeline
fn convert_input_chunked<W: Write>(
    args: &ConvertArgs,
    output: W,
    options: &ConvertOptions,
    parallel: &ParallelOptions,
    cancel: &CancellationToken,
) -> Result<ConversionReport> {
    let report = match &args.input {
        Some(path) => {
            let file = open_input(path)?;
            let size_hint = file.metadata().ok().map(|m| m.len());
            convert_chunked(file, size_hint, output, options, parallel, cancel)
        }
        None => convert_chunked(io::stdin().lock(), None, output, options, parallel, cancel),
    };

    report.context("Parallel conversion failed")
}

/// Open a trace file for reading
///
/// **Private** - internal utility
fn open_input(path: &Path) -> Result<File> {
    File::open(path).with_context(|| format!("Failed to open trace file {}", path.display()))
}

/// Validate convert arguments
///
/// **Public** - can be called before execute_convert for early validation
///
/// # Returns
/// Ok if arguments are valid, Err with message if not
pub fn validate_args(args: &ConvertArgs) -> Result<()> {
    if let Some(path) = &args.input {
        if !path.exists() {
            anyhow::bail!("File {} does not exist.", path.display());
        }
        if path.is_dir() {
            anyhow::bail!("Input path is a directory: {}", path.display());
        }
    }

    if !args.parallel {
        if args.workers.is_some() || args.temp_base.is_some() {
            debug!("--workers/--tmp-dir only apply with --parallel; ignoring");
        }
        return Ok(());
    }

    if args.workers == Some(0) {
        anyhow::bail!("workers must be greater than 0");
    }

    if let Some(base) = &args.temp_base {
        if !base.is_dir() {
            anyhow::bail!("Temp directory does not exist: {}", base.display());
        }
    }

    Ok(())
}
