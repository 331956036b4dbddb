//! Rolling-mean signal job - main entry point
//!
//! Reads a CSV dataset and a YAML config, writes a JSON metrics envelope to
//! the output path and echoes it to stdout. Logs go to the given file only,
//! so stdout carries nothing but the envelope.

use anyhow::{Context, Result};
use clap::Parser;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::debug;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use signal_job::{Job, JobError, JobPaths};

#[derive(Parser, Debug)]
#[command(name = "signal-job")]
#[command(about = "Compute a rolling-mean signal rate from a CSV dataset", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the input CSV dataset
    #[arg(long)]
    input: PathBuf,

    /// Path to the YAML configuration file
    #[arg(long)]
    config: PathBuf,

    /// Path the JSON metrics envelope is written to
    #[arg(long)]
    output: PathBuf,

    /// Path of the log file (appended to)
    #[arg(long)]
    log_file: PathBuf,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn setup_logging(log_file: &Path, verbose: bool) -> Result<()> {
    let dir = log_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = log_file
        .file_name()
        .context("Log file path has no file name")?
        .to_string_lossy()
        .into_owned();
    std::fs::create_dir_all(dir).context("Failed to create log directory")?;

    let level = if verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // Single file, never rotated; the appender opens it in append mode
    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name)
        .build(dir)
        .context("Failed to open log file")?;

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(file_appender)
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .try_init()
        .context("Failed to install log subscriber")?;

    debug!("Log file: {}", log_file.display());
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut job = Job::new(JobPaths {
        input: cli.input,
        config: cli.config,
        output: cli.output,
    });

    let stdout = io::stdout();
    let mut out = stdout.lock();

    let outcome = match setup_logging(&cli.log_file, cli.verbose) {
        Ok(()) => job.run(&mut out),
        Err(e) => job.fail(JobError::Logging(format!("{:#}", e)), &mut out),
    };

    ExitCode::from(outcome.exit_code())
}
