//! Job error taxonomy
//!
//! Every failure a job can hit is one of these variants. The `Display` text
//! is what ends up in the `error_message` field of the error envelope.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum JobError {
    #[error("Config file not found")]
    ConfigNotFound,

    #[error("Invalid config format: {0}")]
    ConfigParse(String),

    #[error("Missing required config field: {0}")]
    ConfigMissingField(&'static str),

    #[error("Invalid config field {field}: {reason}")]
    ConfigInvalidField { field: &'static str, reason: String },

    #[error("Invalid CSV format: {0}")]
    DatasetParse(String),

    #[error("Input CSV is empty")]
    DatasetEmpty,

    #[error("Missing required column: {0}")]
    DatasetMissingColumn(String),

    #[error("Invalid numeric value in column {column} at row {row}: {value:?}")]
    DatasetInvalidValue {
        row: usize,
        column: String,
        value: String,
    },

    #[error("Failed to initialize logging: {0}")]
    Logging(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type JobResult<T> = Result<T, JobError>;
