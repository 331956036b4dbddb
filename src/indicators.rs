//! Rolling-window indicators
//!
//! Series are `Option<f64>` so a missing observation propagates: any window
//! containing a gap has no value.

/// Trailing simple moving average.
///
/// `result[i]` is the mean of `values[i + 1 - window..=i]` once a full
/// window is available and every value in it is present, `None` otherwise.
/// A zero window produces an all-`None` series.
pub fn rolling_mean(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    let mut result = Vec::with_capacity(values.len());

    if window == 0 {
        result.resize(values.len(), None);
        return result;
    }

    for i in 0..values.len() {
        if i + 1 < window {
            result.push(None);
        } else {
            let sum: Option<f64> = values[i + 1 - window..=i].iter().copied().sum();
            result.push(sum.map(|s| s / window as f64));
        }
    }

    result
}
