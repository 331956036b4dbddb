//! Job orchestration
//!
//! Runs the stages in order, each returning a `JobResult`. The first error
//! short-circuits to [`Job::fail`], which is the only place failures are
//! turned into output: the error envelope, the log entry and the exit code.

use rand::rngs::StdRng;
use std::backtrace::Backtrace;
use std::error::Error;
use std::fmt;
use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, info};

use crate::config::{self, JobConfig};
use crate::data::Dataset;
use crate::error::{JobError, JobResult};
use crate::report::{self, elapsed_ms, ErrorReport, MetricsEnvelope, Status, SuccessReport};
use crate::signal::SignalFrame;

/// Input and output locations for one run
#[derive(Debug, Clone)]
pub struct JobPaths {
    pub input: PathBuf,
    pub config: PathBuf,
    pub output: PathBuf,
}

/// Last stage a job completed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Init,
    ConfigValidated,
    DatasetValidated,
    SignalComputed,
    MetricsWritten,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Stage::Init => "init",
            Stage::ConfigValidated => "config_validated",
            Stage::DatasetValidated => "dataset_validated",
            Stage::SignalComputed => "signal_computed",
            Stage::MetricsWritten => "metrics_written",
        };
        write!(f, "{}", name)
    }
}

/// Terminal state of a run
#[derive(Debug, Clone, PartialEq)]
pub struct JobOutcome {
    pub envelope: MetricsEnvelope,
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        self.envelope.status() == Status::Success
    }

    /// Process exit status matching the envelope status
    pub fn exit_code(&self) -> u8 {
        match self.envelope.status() {
            Status::Success => 0,
            Status::Error => 1,
        }
    }
}

pub struct Job {
    paths: JobPaths,
    started: Instant,
    stage: Stage,
    rng: Option<StdRng>,
}

impl Job {
    /// Create a job; latency is measured from this call
    pub fn new(paths: JobPaths) -> Self {
        Job {
            paths,
            started: Instant::now(),
            stage: Stage::Init,
            rng: None,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Job-scoped generator, available once the config is validated
    pub fn rng(&mut self) -> Option<&mut StdRng> {
        self.rng.as_mut()
    }

    /// Run every stage and report the outcome to the output path and `out`
    pub fn run(&mut self, out: &mut dyn Write) -> JobOutcome {
        match self.execute(out) {
            Ok(envelope) => JobOutcome { envelope },
            Err(err) => self.fail(err, out),
        }
    }

    fn execute(&mut self, out: &mut dyn Write) -> JobResult<MetricsEnvelope> {
        info!("Job started");

        let config = JobConfig::from_file(&self.paths.config)?;
        self.rng = Some(config.rng());
        info!(
            "Config validated: seed={}, window={}, version={}",
            config.seed, config.window, config.version
        );
        self.stage = Stage::ConfigValidated;

        let dataset = Dataset::from_csv(&self.paths.input)?;
        self.stage = Stage::DatasetValidated;

        info!("Computing rolling mean");
        let frame = SignalFrame::compute(dataset.close(), config.window);
        info!("Signal generation completed");
        self.stage = Stage::SignalComputed;

        let envelope =
            MetricsEnvelope::from(SuccessReport::new(&config, &frame, elapsed_ms(self.started)));
        report::emit(&self.paths.output, &envelope, out)?;
        self.stage = Stage::MetricsWritten;

        info!("Job completed successfully");
        Ok(envelope)
    }

    /// Convert an error into the error envelope.
    ///
    /// Recovering the version and writing the envelope are best effort:
    /// their own failures are logged and never change the outcome.
    pub fn fail(&self, err: JobError, out: &mut dyn Write) -> JobOutcome {
        let latency_ms = elapsed_ms(self.started);
        let version = config::recover_version(&self.paths.config);
        let envelope = MetricsEnvelope::from(ErrorReport::new(version, &err));

        if let Err(write_err) = report::write_envelope(&self.paths.output, &envelope) {
            error!(
                "Failed to write error envelope to {}: {}",
                self.paths.output.display(),
                write_err
            );
        }

        error!(
            stage = %self.stage,
            latency_ms,
            "Job failed: {}",
            err
        );
        error!("{}", diagnostic_trace(&err, &Backtrace::force_capture()));

        if let Err(echo_err) = report::echo(&envelope, out) {
            error!("Failed to echo error envelope: {}", echo_err);
        }

        JobOutcome { envelope }
    }
}

/// Multi-line failure report: debug form, cause chain and stack trace
fn diagnostic_trace(err: &JobError, backtrace: &Backtrace) -> String {
    let mut trace = format!("Diagnostic: {:?}", err);
    let mut source = err.source();
    while let Some(cause) = source {
        trace.push_str(&format!("\n  caused by: {}", cause));
        source = cause.source();
    }
    trace.push_str(&format!("\nstack backtrace:\n{}", backtrace));
    trace
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;
    use std::fs;
    use std::path::Path;

    fn paths(dir: &Path) -> JobPaths {
        JobPaths {
            input: dir.join("data.csv"),
            config: dir.join("config.yaml"),
            output: dir.join("metrics.json"),
        }
    }

    #[test]
    fn test_stage_progression() {
        let dir = tempfile::tempdir().unwrap();
        let paths = paths(dir.path());
        fs::write(&paths.config, "seed: 7\nwindow: 2\nversion: t\n").unwrap();
        fs::write(&paths.input, "close\n1\n2\n3\n").unwrap();

        let mut job = Job::new(paths);
        assert_eq!(job.stage(), Stage::Init);
        assert!(job.rng().is_none());

        let mut out = Vec::new();
        let outcome = job.run(&mut out);
        assert!(outcome.is_success());
        assert_eq!(outcome.exit_code(), 0);
        assert_eq!(job.stage(), Stage::MetricsWritten);
        assert!(job.rng().is_some());
    }

    #[test]
    fn test_rng_follows_config_seed() {
        let dir = tempfile::tempdir().unwrap();
        let paths = paths(dir.path());
        fs::write(&paths.config, "seed: 99\nwindow: 1\nversion: t\n").unwrap();
        fs::write(&paths.input, "close\n1\n").unwrap();

        let mut job = Job::new(paths);
        job.run(&mut Vec::new());

        let mut expected = JobConfig {
            seed: 99,
            window: 1,
            version: "t".to_string(),
        }
        .rng();
        let rng = job.rng().unwrap();
        assert_eq!(rng.gen::<u64>(), expected.gen::<u64>());
    }

    #[test]
    fn test_failure_stops_at_stage() {
        let dir = tempfile::tempdir().unwrap();
        let paths = paths(dir.path());
        fs::write(&paths.config, "seed: 1\nwindow: 2\nversion: t\n").unwrap();
        fs::write(&paths.input, "open\n1\n").unwrap();

        let mut job = Job::new(paths);
        let outcome = job.run(&mut Vec::new());
        assert_eq!(outcome.exit_code(), 1);
        assert_eq!(job.stage(), Stage::ConfigValidated);
    }

    #[test]
    fn test_diagnostic_trace_includes_causes_and_stack() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "disk is read-only");
        let trace = diagnostic_trace(&JobError::from(io_err), &Backtrace::force_capture());

        let lines: Vec<&str> = trace.lines().collect();
        assert!(lines[0].starts_with("Diagnostic: Io("));
        assert!(lines.contains(&"  caused by: disk is read-only"));
        assert!(lines.contains(&"stack backtrace:"));
        assert!(lines.len() > 3);
    }

    #[test]
    fn test_fail_survives_unwritable_output() {
        let dir = tempfile::tempdir().unwrap();
        let job = Job::new(JobPaths {
            input: dir.path().join("data.csv"),
            config: dir.path().join("config.yaml"),
            output: dir.path().join("no_such_dir").join("metrics.json"),
        });

        let mut out = Vec::new();
        let outcome = job.fail(JobError::DatasetEmpty, &mut out);
        assert_eq!(outcome.exit_code(), 1);
        assert!(String::from_utf8(out).unwrap().contains("Input CSV is empty"));
    }
}
