//! Signal engine
//!
//! Derives the binary "close above its rolling mean" signal. Rows without a
//! rolling mean are not valid rows: their signal is 0 and they are excluded
//! from the signal rate.

use tracing::debug;

use crate::indicators::rolling_mean;

/// Derived columns for a processed dataset
#[derive(Debug, Clone, PartialEq)]
pub struct SignalFrame {
    pub rolling_mean: Vec<Option<f64>>,
    pub signal: Vec<u8>,
}

impl SignalFrame {
    /// Compute the rolling mean and signal over a close series
    pub fn compute(close: &[Option<f64>], window: usize) -> Self {
        let rolling_mean = rolling_mean(close, window);

        let signal = close
            .iter()
            .zip(&rolling_mean)
            .map(|(close, mean)| match (close, mean) {
                (Some(c), Some(m)) if c > m => 1,
                _ => 0,
            })
            .collect();

        let frame = SignalFrame {
            rolling_mean,
            signal,
        };
        debug!(
            "Signal frame: {} rows, {} valid, window={}",
            frame.len(),
            frame.valid_rows(),
            window
        );
        frame
    }

    /// Total rows, valid or not
    pub fn len(&self) -> usize {
        self.signal.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signal.is_empty()
    }

    /// Rows with a defined rolling mean
    pub fn valid_rows(&self) -> usize {
        self.rolling_mean.iter().filter(|m| m.is_some()).count()
    }

    /// Rows where the signal fired (always a subset of the valid rows)
    pub fn signal_count(&self) -> usize {
        self.signal.iter().filter(|&&s| s == 1).count()
    }

    /// Mean signal over valid rows, `None` when there are none
    pub fn signal_rate(&self) -> Option<f64> {
        match self.valid_rows() {
            0 => None,
            valid => Some(self.signal_count() as f64 / valid as f64),
        }
    }
}
