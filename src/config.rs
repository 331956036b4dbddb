//! Configuration management
//!
//! Loads the YAML job configuration and validates the three required
//! fields. Presence of every field is checked (in a fixed order) before
//! any of them is type-checked, so a document missing `window` always
//! reports the missing field even if `seed` is malformed.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_yaml::Value;
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::error::{JobError, JobResult};

/// Required keys, in the order they are checked.
pub const REQUIRED_FIELDS: [&str; 3] = ["seed", "window", "version"];

/// Version label used when the config cannot supply one.
pub const UNKNOWN_VERSION: &str = "unknown";

/// Validated job configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobConfig {
    /// Seed for the job-scoped random generator
    pub seed: u64,
    /// Rolling window length in rows, always >= 1
    pub window: usize,
    /// Free-form label echoed into the envelope
    pub version: String,
}

impl JobConfig {
    /// Load and validate configuration from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> JobResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(JobError::ConfigNotFound);
        }

        let contents = fs::read_to_string(path)?;
        debug!("Read {} bytes of config from {}", contents.len(), path.display());
        Self::from_yaml_str(&contents)
    }

    /// Validate configuration from YAML text
    pub fn from_yaml_str(contents: &str) -> JobResult<Self> {
        let doc = parse_mapping(contents)?;

        for field in REQUIRED_FIELDS {
            if doc.get(field).is_none() {
                return Err(JobError::ConfigMissingField(field));
            }
        }

        Ok(JobConfig {
            seed: parse_seed(&doc["seed"])?,
            window: parse_window(&doc["window"])?,
            version: version_label(&doc["version"]).ok_or_else(|| JobError::ConfigInvalidField {
                field: "version",
                reason: "must be a string, number or boolean".to_string(),
            })?,
        })
    }

    /// Random generator seeded from this config.
    ///
    /// Two generators built from equal configs yield identical streams.
    pub fn rng(&self) -> StdRng {
        StdRng::seed_from_u64(self.seed)
    }
}

/// Best-effort lookup of the `version` label for error reporting.
///
/// Never fails: any problem reading or parsing the file yields
/// [`UNKNOWN_VERSION`].
pub fn recover_version(path: impl AsRef<Path>) -> String {
    let path = path.as_ref();
    if !path.exists() {
        return UNKNOWN_VERSION.to_string();
    }

    fs::read_to_string(path)
        .ok()
        .and_then(|contents| parse_mapping(&contents).ok())
        .and_then(|doc| doc.get("version").and_then(version_label))
        .unwrap_or_else(|| UNKNOWN_VERSION.to_string())
}

fn parse_mapping(contents: &str) -> JobResult<Value> {
    let doc: Value =
        serde_yaml::from_str(contents).map_err(|e| JobError::ConfigParse(e.to_string()))?;

    if !doc.is_mapping() {
        return Err(JobError::ConfigParse(
            "document is not a key-value mapping".to_string(),
        ));
    }

    Ok(doc)
}

fn parse_seed(value: &Value) -> JobResult<u64> {
    value.as_u64().ok_or_else(|| JobError::ConfigInvalidField {
        field: "seed",
        reason: format!("must be a non-negative integer, got {}", describe(value)),
    })
}

fn parse_window(value: &Value) -> JobResult<usize> {
    match value.as_i64() {
        Some(window) if window >= 1 => usize::try_from(window).map_err(|_| {
            JobError::ConfigInvalidField {
                field: "window",
                reason: format!("{} is too large", window),
            }
        }),
        _ => Err(JobError::ConfigInvalidField {
            field: "window",
            reason: format!("must be a positive integer, got {}", describe(value)),
        }),
    }
}

/// Render a scalar YAML value as a version label
fn version_label(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Tagged(tagged) => version_label(&tagged.value),
        _ => None,
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => format!("{:?}", s),
        Value::Sequence(_) => "a sequence".to_string(),
        Value::Mapping(_) => "a mapping".to_string(),
        Value::Tagged(tagged) => describe(&tagged.value),
    }
}
