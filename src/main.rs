//! memtrace2json CLI
//!
//! Converts memtracker pintool traces into JSON Lines event records,
//! either streaming or in parallel chunks.

use anyhow::Result;
use clap::{Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;

use memtrace_json::commands::{
    display_schema, display_version, execute_convert, validate_records_file, ConvertArgs,
};
use memtrace_json::output::OutputFormat;
use memtrace_json::pipeline::CancellationToken;
use memtrace_json::utils::config::TMPDIR_ENV;

/// memtrace2json - memtracker trace to JSON converter
#[derive(Parser, Debug)]
#[command(name = "memtrace2json")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert a memtracker trace to JSON records
    Convert {
        /// Trace file generated by the memtracker pintool (default: stdin)
        #[arg(long)]
        infile: Option<PathBuf>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Do not skip records from .text and .plt
        #[arg(long)]
        keepdots: bool,

        /// Output record format
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,

        /// Convert in parallel chunks (buffers the whole trace in memory)
        #[arg(long)]
        parallel: bool,

        /// Base directory for per-worker chunk files
        #[arg(long, env = TMPDIR_ENV)]
        tmp_dir: Option<PathBuf>,

        /// Number of workers (default: available parallelism)
        #[arg(long)]
        workers: Option<usize>,
    },

    /// Validate a JSON Lines record file
    Validate {
        /// Path to record file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Display record schema information
    Schema {
        /// Show full schema details
        #[arg(long)]
        show: bool,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    // Execute command
    match cli.command {
        Commands::Convert {
            infile,
            output,
            keepdots,
            format,
            parallel,
            tmp_dir,
            workers,
        } => {
            let args = ConvertArgs {
                input: infile,
                output,
                keep_noise: keepdots,
                format,
                parallel,
                temp_base: tmp_dir,
                workers,
            };

            let cancel = CancellationToken::new();
            let handler_token = cancel.clone();
            ctrlc::set_handler(move || {
                if handler_token.is_cancelled() {
                    // 128 + SIGINT
                    std::process::exit(130);
                } else {
                    handler_token.cancel();
                }
            })?;

            execute_convert(&args, &cancel)?;
        }

        Commands::Validate { file } => {
            validate_records_file(&file)?;
        }

        Commands::Schema { show } => {
            display_schema(show);
        }

        Commands::Version => {
            display_version();
        }
    }

    Ok(())
}
