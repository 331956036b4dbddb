//! Rolling-Mean Signal Job
//!
//! A single-pass batch job: validate a YAML config and a CSV dataset,
//! compute a trailing rolling mean over `close`, derive a binary signal,
//! and report the signal rate as a JSON envelope.

pub mod config;
pub mod data;
pub mod error;
pub mod indicators;
pub mod job;
pub mod report;
pub mod signal;

pub use config::JobConfig;
pub use data::Dataset;
pub use error::{JobError, JobResult};
pub use job::{Job, JobOutcome, JobPaths};
pub use report::{ErrorReport, MetricsEnvelope, Status, SuccessReport};
pub use signal::SignalFrame;
