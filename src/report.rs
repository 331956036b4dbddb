//! Metrics reporting
//!
//! The envelope is the job's single output of record. Both variants
//! serialize with a fixed key order, 2-space indented.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;
use std::time::Instant;
use tracing::info;

use crate::config::JobConfig;
use crate::error::{JobError, JobResult};
use crate::signal::SignalFrame;

/// Name of the reported metric
pub const SIGNAL_RATE_METRIC: &str = "signal_rate";

/// Decimal places kept in the reported value
pub const VALUE_DECIMALS: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuccessReport {
    pub version: String,
    pub rows_processed: usize,
    pub metric: String,
    /// Rounded signal rate; `null` when no row has a rolling mean
    pub value: Option<f64>,
    pub latency_ms: u64,
    pub seed: u64,
    pub status: Status,
}

impl SuccessReport {
    pub fn new(config: &JobConfig, frame: &SignalFrame, latency_ms: u64) -> Self {
        SuccessReport {
            version: config.version.clone(),
            rows_processed: frame.len(),
            metric: SIGNAL_RATE_METRIC.to_string(),
            value: frame
                .signal_rate()
                .and_then(round_value)
                .and_then(|value| value.to_f64()),
            latency_ms,
            seed: config.seed,
            status: Status::Success,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub version: String,
    pub status: Status,
    pub error_message: String,
}

impl ErrorReport {
    pub fn new(version: impl Into<String>, error: &JobError) -> Self {
        ErrorReport {
            version: version.into(),
            status: Status::Error,
            error_message: error.to_string(),
        }
    }
}

/// Success or error result envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricsEnvelope {
    Success(SuccessReport),
    Error(ErrorReport),
}

impl MetricsEnvelope {
    pub fn status(&self) -> Status {
        match self {
            MetricsEnvelope::Success(report) => report.status,
            MetricsEnvelope::Error(report) => report.status,
        }
    }

    pub fn to_pretty_json(&self) -> JobResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl From<SuccessReport> for MetricsEnvelope {
    fn from(report: SuccessReport) -> Self {
        MetricsEnvelope::Success(report)
    }
}

impl From<ErrorReport> for MetricsEnvelope {
    fn from(report: ErrorReport) -> Self {
        MetricsEnvelope::Error(report)
    }
}

/// Round a metric to [`VALUE_DECIMALS`] places, half-to-even.
///
/// Rounds the binary value of `value` as stored, not the decimal it was
/// meant to approximate: `1.0 / 160.0` is slightly above `0.00625` and
/// rounds up. `None` for NaN or infinite input.
pub fn round_value(value: f64) -> Option<Decimal> {
    Decimal::from_f64_retain(value)
        .map(|d| d.round_dp_with_strategy(VALUE_DECIMALS, RoundingStrategy::MidpointNearestEven))
}

/// Whole milliseconds elapsed since `started`
pub fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Overwrite `path` with the envelope JSON
pub fn write_envelope(path: impl AsRef<Path>, envelope: &MetricsEnvelope) -> JobResult<()> {
    let json = envelope.to_pretty_json()?;
    fs::write(path.as_ref(), json)?;
    Ok(())
}

/// Write the envelope, log it and echo it to `out`
pub fn emit(
    path: impl AsRef<Path>,
    envelope: &MetricsEnvelope,
    out: &mut dyn Write,
) -> JobResult<()> {
    write_envelope(path, envelope)?;
    info!("Metrics: {}", serde_json::to_string(envelope)?);
    echo(envelope, out)
}

/// Print the pretty-printed envelope followed by a newline
pub fn echo(envelope: &MetricsEnvelope, out: &mut dyn Write) -> JobResult<()> {
    writeln!(out, "{}", envelope.to_pretty_json()?).map_err(JobError::from)
}
