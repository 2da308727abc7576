//! Trailing-window running averages.

use crate::error::{AnalyticsError, AnalyticsResult};

/// Running average of `series` over a trailing window of `window` elements.
///
/// The output has the same length as the input. Until `window` values have been
/// seen the average expands over everything so far, so the first point always
/// equals `series[0]`. A window larger than the series is clamped to its length,
/// which yields the cumulative average.
pub fn running_average(series: &[f64], window: usize) -> AnalyticsResult<Vec<f64>> {
    if window == 0 {
        return Err(AnalyticsError::config("running average window must be >= 1"));
    }
    if series.is_empty() {
        return Err(AnalyticsError::config(
            "running average of an empty series is undefined",
        ));
    }

    // the subtract-outgoing update is not exact in floating point
    if window == 1 {
        return Ok(series.to_vec());
    }

    let window = window.min(series.len());
    let mut out = Vec::with_capacity(series.len());
    let mut sum = 0.0;

    for (i, &value) in series.iter().enumerate() {
        sum += value;
        if i >= window {
            sum -= series[i - window];
        }
        let seen = (i + 1).min(window);
        out.push(sum / seen as f64);
    }

    Ok(out)
}

/// Average of everything up to and including each point (the "overall average" line).
pub fn cumulative_average(series: &[f64]) -> AnalyticsResult<Vec<f64>> {
    running_average(series, series.len().max(1))
}
