//! Parallel conversion over contiguous line partitions.
//!
//! The whole trace is buffered, split into one contiguous range per worker,
//! and each range is converted by a pool job into its own file inside a
//! private temp directory. Once every job has reported, the files are
//! concatenated in partition order, so the result is byte-identical to the
//! sequential pipeline. A partition that fails or never reports fails the
//! whole run; nothing is concatenated in that case.
//!
//! Algorithm:
//! 1. Buffer input lines (`load_lines`)
//! 2. Compute ranges (`partition`), remainder goes to the last worker
//! 3. Create one output file per partition, then dispatch jobs
//! 4. Collect one status per partition from the result channel
//! 5. Concatenate in order, then drop the temp directory

use super::cancel::CancellationToken;
use super::sequential::{ConversionReport, ConvertOptions, LineConverter};
use crate::utils::config::{chunk_file_name, TEMP_DIR_PREFIX};
use crate::utils::error::ConvertError;
use log::{debug, info, warn};
use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::num::NonZeroUsize;
use std::ops::Range;
use std::path::PathBuf;
use std::sync::mpsc::channel;
use std::sync::Arc;
use workerpool::thunk::{Thunk, ThunkWorker};
use workerpool::Pool;

/// Settings specific to parallel mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParallelOptions {
    /// Number of partitions and pool threads
    pub workers: usize,

    /// Directory under which the per-run chunk directory is created
    pub temp_base: PathBuf,
}

impl ParallelOptions {
    /// Options using every available hardware thread
    pub fn new(temp_base: impl Into<PathBuf>) -> Self {
        Self {
            workers: default_workers(),
            temp_base: temp_base.into(),
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }
}

/// Available hardware parallelism, 1 if it cannot be determined
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

/// Split `total` lines into `workers` contiguous ranges
///
/// **Public** - exposed for tests and diagnostics
///
/// Every range holds `total / workers` lines except the last, which also
/// takes the remainder. With more workers than lines, all but the last range
/// are empty.
pub fn partition(total: usize, workers: usize) -> Vec<Range<usize>> {
    if workers == 0 {
        return Vec::new();
    }

    let share = total / workers;
    (0..workers)
        .map(|k| {
            let start = k * share;
            let end = if k == workers - 1 { total } else { start + share };
            start..end
        })
        .collect()
}

/// Buffer a whole trace as lines
///
/// **Public** - first step of parallel conversion
///
/// Lines are split on `\n` and decoded lossily, exactly as the sequential
/// pipeline sees them. A trailing newline does not produce an extra line.
///
/// # Arguments
/// * `input` - Trace source
/// * `size_hint` - Input size in bytes when known (reserved up front)
///
/// # Errors
/// * `ConvertError::InputTooLarge` - the buffer could not be allocated
/// * `ConvertError::Io` - reading failed
pub fn load_lines<R: Read>(
    mut input: R,
    size_hint: Option<u64>,
) -> Result<Vec<String>, ConvertError> {
    let mut buffer = Vec::new();

    if let Some(hint) = size_hint {
        let bytes =
            usize::try_from(hint).map_err(|_| ConvertError::InputTooLarge { bytes: hint })?;
        buffer
            .try_reserve_exact(bytes)
            .map_err(|_| ConvertError::InputTooLarge { bytes: hint })?;
    }

    input.read_to_end(&mut buffer).map_err(|e| {
        if e.kind() == io::ErrorKind::OutOfMemory {
            ConvertError::InputTooLarge {
                bytes: buffer.len() as u64,
            }
        } else {
            ConvertError::Io(e)
        }
    })?;

    let mut segments: Vec<&[u8]> = buffer.split(|b| *b == b'\n').collect();
    if segments.last().is_some_and(|s| s.is_empty()) {
        segments.pop();
    }

    let mut lines = Vec::new();
    lines
        .try_reserve_exact(segments.len())
        .map_err(|_| ConvertError::InputTooLarge {
            bytes: buffer.len() as u64,
        })?;
    lines.extend(
        segments
            .into_iter()
            .map(|s| String::from_utf8_lossy(s).into_owned()),
    );

    debug!("Buffered {} lines ({} bytes)", lines.len(), buffer.len());

    Ok(lines)
}

/// Status reported by one pool job
struct ChunkOutcome {
    partition: usize,
    result: Result<ConversionReport, ConvertError>,
}

/// Convert a trace in parallel
///
/// **Public** - main entry point for parallel conversion
///
/// # Arguments
/// * `input` - Trace source, read fully into memory
/// * `size_hint` - Input size in bytes when known
/// * `output` - Destination for the combined records
/// * `options` - Filter and format settings, identical for every worker
/// * `parallel` - Worker count and temp base directory
/// * `cancel` - Checked before every line in every worker
///
/// # Errors
/// * `ConvertError::NoWorkers` - `parallel.workers` is zero
/// * `ConvertError::InputTooLarge` - rerun with the sequential pipeline
/// * `ConvertError::TempDir` - the chunk directory could not be created
/// * `ConvertError::WorkerFailed` - a partition failed; no output was written
/// * `ConvertError::Cancelled` - the token was set mid-run
pub fn convert_chunked<R: Read, W: Write>(
    input: R,
    size_hint: Option<u64>,
    output: W,
    options: &ConvertOptions,
    parallel: &ParallelOptions,
    cancel: &CancellationToken,
) -> Result<ConversionReport, ConvertError> {
    if parallel.workers == 0 {
        return Err(ConvertError::NoWorkers);
    }

    let lines = Arc::new(load_lines(input, size_hint)?);
    let options = *options;

    run_partitions(lines, output, parallel, cancel, move |lines, first_line, out, cancel| {
        convert_partition(lines, first_line, out, options, cancel)
    })
}

/// Worker body: the sequential per-line chain over one slice
fn convert_partition(
    lines: &[String],
    first_line: usize,
    out: &mut BufWriter<File>,
    options: ConvertOptions,
    cancel: &CancellationToken,
) -> Result<ConversionReport, ConvertError> {
    let mut converter = LineConverter::new(options);
    for (offset, line) in lines.iter().enumerate() {
        if cancel.is_cancelled() {
            return Err(ConvertError::Cancelled);
        }
        converter.convert_line(first_line + offset, line, out)?;
    }
    Ok(converter.finish())
}

/// Dispatch one job per partition, gather statuses, concatenate
///
/// **Private** - `job` receives its slice, the 1-based number of its first
/// line, its private writer and the cancellation token.
fn run_partitions<W, J>(
    lines: Arc<Vec<String>>,
    mut output: W,
    parallel: &ParallelOptions,
    cancel: &CancellationToken,
    job: J,
) -> Result<ConversionReport, ConvertError>
where
    W: Write,
    J: Fn(
            &[String],
            usize,
            &mut BufWriter<File>,
            &CancellationToken,
        ) -> Result<ConversionReport, ConvertError>
        + Send
        + Sync
        + 'static,
{
    let ranges = partition(lines.len(), parallel.workers);
    info!(
        "Converting {} lines with {} workers",
        lines.len(),
        ranges.len()
    );

    let temp_dir = tempfile::Builder::new()
        .prefix(TEMP_DIR_PREFIX)
        .tempdir_in(&parallel.temp_base)
        .map_err(|source| ConvertError::TempDir {
            base: parallel.temp_base.clone(),
            source,
        })?;
    debug!("Chunk directory: {}", temp_dir.path().display());

    // Every private output exists before any job starts
    let mut chunk_paths = Vec::with_capacity(ranges.len());
    let mut chunk_files = Vec::with_capacity(ranges.len());
    for partition in 0..ranges.len() {
        let path = temp_dir.path().join(chunk_file_name(partition));
        chunk_files.push(File::create(&path)?);
        chunk_paths.push(path);
    }

    let job = Arc::new(job);
    let pool = Pool::<ThunkWorker<ChunkOutcome>>::new(ranges.len());
    let (tx, rx) = channel();

    for (partition, (range, file)) in ranges.iter().cloned().zip(chunk_files).enumerate() {
        debug!(
            "Partition {}: lines {}..{} ({} lines)",
            partition,
            range.start,
            range.end,
            range.len()
        );

        let lines = Arc::clone(&lines);
        let job = Arc::clone(&job);
        let cancel = cancel.clone();

        pool.execute_to(
            tx.clone(),
            Thunk::of(move || ChunkOutcome {
                partition,
                result: run_job(&lines[range.clone()], range.start + 1, file, &cancel, &*job),
            }),
        );
    }
    drop(tx);

    // Jobs that panic drop their sender without reporting
    let mut statuses: Vec<Option<Result<ConversionReport, ConvertError>>> =
        (0..ranges.len()).map(|_| None).collect();
    for outcome in rx.iter() {
        statuses[outcome.partition] = Some(outcome.result);
    }
    pool.join();

    if cancel.is_cancelled() {
        return Err(ConvertError::Cancelled);
    }

    let mut report = ConversionReport::default();
    for (partition, status) in statuses.into_iter().enumerate() {
        match status {
            Some(Ok(partial)) => report.merge(partial),
            Some(Err(ConvertError::Cancelled)) => return Err(ConvertError::Cancelled),
            Some(Err(e)) => {
                return Err(ConvertError::WorkerFailed {
                    partition,
                    reason: e.to_string(),
                })
            }
            None => {
                return Err(ConvertError::WorkerFailed {
                    partition,
                    reason: "worker exited without reporting a result".to_string(),
                })
            }
        }
    }

    for path in &chunk_paths {
        let mut chunk = File::open(path)?;
        io::copy(&mut chunk, &mut output)?;
    }
    output.flush()?;

    if let Err(e) = temp_dir.close() {
        warn!("Failed to remove chunk directory: {}", e);
    }

    Ok(report)
}

/// Run one job against its private file and flush it
fn run_job<J>(
    lines: &[String],
    first_line: usize,
    file: File,
    cancel: &CancellationToken,
    job: &J,
) -> Result<ConversionReport, ConvertError>
where
    J: Fn(
        &[String],
        usize,
        &mut BufWriter<File>,
        &CancellationToken,
    ) -> Result<ConversionReport, ConvertError>,
{
    let mut out = BufWriter::new(file);
    let report = job(lines, first_line, &mut out, cancel)?;
    out.flush()?;
    Ok(report)
}
