//! Data loading and validation
//!
//! Reads the input CSV into an in-memory table with normalized column
//! names and extracts the numeric `close` series the signal engine runs on.

use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::error::{JobError, JobResult};

/// Column the rolling statistic is computed over
pub const CLOSE_COLUMN: &str = "close";

/// Cell texts read as a missing value, matched exactly after trimming
const NA_VALUES: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

// =============================================================================
// Dataset
// =============================================================================

/// Validated input table
#[derive(Debug, Clone)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<csv::StringRecord>,
    close: Vec<Option<f64>>,
}

impl Dataset {
    /// Load and validate a CSV file
    pub fn from_csv(path: impl AsRef<Path>) -> JobResult<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| JobError::DatasetParse(format!("{}: {}", path.display(), e)))?;
        Self::from_reader(file)
    }

    /// Load and validate CSV from any reader
    pub fn from_reader<R: Read>(reader: R) -> JobResult<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers = reader
            .headers()
            .map_err(|e| JobError::DatasetParse(e.to_string()))?
            .clone();
        if headers.is_empty() {
            return Err(JobError::DatasetParse("no header row".to_string()));
        }
        let columns: Vec<String> = headers.iter().map(normalize_column).collect();

        let mut rows = Vec::new();
        for (row_idx, result) in reader.records().enumerate() {
            let mut record = result.map_err(|e| JobError::DatasetParse(e.to_string()))?;
            if record.len() > columns.len() {
                return Err(JobError::DatasetParse(format!(
                    "expected {} fields in row {}, saw {}",
                    columns.len(),
                    row_idx + 1,
                    record.len()
                )));
            }
            while record.len() < columns.len() {
                record.push_field("");
            }
            rows.push(record);
        }
        debug!("Read {} data rows", rows.len());

        if rows.is_empty() {
            return Err(JobError::DatasetEmpty);
        }

        info!("Columns found: {:?}", columns);

        let close_idx = find_column(&columns, CLOSE_COLUMN)
            .ok_or_else(|| JobError::DatasetMissingColumn(CLOSE_COLUMN.to_string()))?;

        let close = rows
            .iter()
            .enumerate()
            .map(|(row_idx, record)| parse_cell(&record[close_idx], row_idx + 1))
            .collect::<JobResult<Vec<_>>>()?;

        Ok(Dataset {
            columns,
            rows,
            close,
        })
    }

    /// Normalized column names, in file order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of data rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Raw cell text by row index and normalized column name
    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        let idx = find_column(&self.columns, column)?;
        self.rows.get(row).and_then(|record| record.get(idx))
    }

    /// The `close` series; `None` marks a missing value
    pub fn close(&self) -> &[Option<f64>] {
        &self.close
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Trim whitespace (and a stray byte-order mark) and lower-case
pub fn normalize_column(name: &str) -> String {
    name.trim_start_matches('\u{feff}').trim().to_lowercase()
}

fn find_column(columns: &[String], name: &str) -> Option<usize> {
    let mut matches = columns.iter().enumerate().filter(|(_, c)| c.as_str() == name);
    let (idx, _) = matches.next()?;
    if matches.next().is_some() {
        warn!("Column '{}' appears more than once, using the first occurrence", name);
    }
    Some(idx)
}

fn parse_cell(cell: &str, row: usize) -> JobResult<Option<f64>> {
    let text = cell.trim();
    if NA_VALUES.contains(&text) {
        return Ok(None);
    }

    match text.parse::<f64>() {
        Ok(value) if value.is_nan() => Ok(None),
        Ok(value) => Ok(Some(value)),
        Err(_) => Err(JobError::DatasetInvalidValue {
            row,
            column: CLOSE_COLUMN.to_string(),
            value: cell.to_string(),
        }),
    }
}

// =============================================================================
// Tests
// =============================================================================
