//! `flatlog` command-line entry point.
//!
//! # Responsibility
//! - Parse arguments and bootstrap logging.
//! - Run one conversion and print the written document paths.

use clap::Parser;
use flatlog_core::{
    convert_flat_log_with, default_log_level, init_logging, ConvertOptions, DEFAULT_MARKER_TAG,
};
use log::error;
use std::path::PathBuf;
use std::process::ExitCode;

/// Split a flat note log into one markdown document per note.
#[derive(Debug, Parser)]
#[command(name = "flatlog", version)]
struct Cli {
    /// Flat log file to read.
    input: PathBuf,

    /// Existing directory that receives the documents.
    out_dir: PathBuf,

    /// Replace documents that already exist.
    #[arg(long)]
    overwrite: bool,

    /// Validate and print planned paths without writing.
    #[arg(long)]
    dry_run: bool,

    /// Tag added to every document.
    #[arg(long, default_value = DEFAULT_MARKER_TAG)]
    marker_tag: String,

    /// trace|debug|info|warn|error (defaults by build mode).
    #[arg(long)]
    log_level: Option<String>,

    /// Absolute directory for rolling log files; logs go to stderr when unset.
    #[arg(long)]
    log_dir: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = cli.log_level.as_deref().unwrap_or(default_log_level());
    if let Err(message) = init_logging(level, cli.log_dir.as_deref()) {
        eprintln!("flatlog: {message}");
        return ExitCode::FAILURE;
    }

    let options = ConvertOptions {
        overwrite_ok: cli.overwrite,
        marker_tag: cli.marker_tag,
        dry_run: cli.dry_run,
    };

    match convert_flat_log_with(&cli.input, &cli.out_dir, &options) {
        Ok(paths) => {
            for path in paths {
                println!("{}", path.display());
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("event=cli_exit module=cli status=error");
            eprintln!("flatlog: {err}");
            ExitCode::FAILURE
        }
    }
}
