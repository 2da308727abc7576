//! Quantize-and-deduplicate decimation for dense scatter plots.
//!
//! This is an approximation, not a statistical sample: surviving points are
//! guaranteed to occupy distinct quantized cells and nothing more.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AnalyticsError, AnalyticsResult};

/// Point count above which scatter inputs are decimated
pub const DEFAULT_DECIMATION_THRESHOLD: usize = 500_000;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Decimated {
    /// Quantized x coordinates of surviving points.
    pub xs: Vec<f64>,
    /// Quantized y coordinates of surviving points.
    pub ys: Vec<f64>,
    /// Index into the caller's input of each surviving point, so unquantized
    /// attributes (a colour value, say) can be looked up.
    pub source_indices: Vec<usize>,
}

impl Decimated {
    pub fn len(&self) -> usize {
        self.source_indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.source_indices.is_empty()
    }

    fn identity(xs: &[f64], ys: &[f64]) -> Self {
        Self {
            xs: xs.to_vec(),
            ys: ys.to_vec(),
            source_indices: (0..xs.len()).collect(),
        }
    }
}

fn check_quantum(name: &str, q: f64) -> AnalyticsResult<()> {
    if !q.is_finite() || q <= 0.0 {
        return Err(AnalyticsError::config(format!(
            "{name} quantum must be finite and > 0, got {q}"
        )));
    }
    Ok(())
}

/// Snap each point to a `x_quantum` by `y_quantum` grid and keep the first point
/// encountered in every occupied cell.
///
/// Output is in first-encounter order. Points with a non-finite coordinate are
/// dropped.
pub fn decimate(
    xs: &[f64],
    ys: &[f64],
    x_quantum: f64,
    y_quantum: f64,
) -> AnalyticsResult<Decimated> {
    check_quantum("x", x_quantum)?;
    check_quantum("y", y_quantum)?;
    if xs.len() != ys.len() {
        return Err(AnalyticsError::integrity(format!(
            "decimation input has {} xs but {} ys",
            xs.len(),
            ys.len()
        )));
    }

    let mut seen: HashSet<(i64, i64)> = HashSet::with_capacity(xs.len());
    let mut out = Decimated::default();

    for (idx, (&x, &y)) in xs.iter().zip(ys).enumerate() {
        let qx = (x / x_quantum).round();
        let qy = (y / y_quantum).round();
        if !qx.is_finite() || !qy.is_finite() {
            continue;
        }
        if seen.insert((qy as i64, qx as i64)) {
            out.xs.push(qx * x_quantum);
            out.ys.push(qy * y_quantum);
            out.source_indices.push(idx);
        }
    }

    Ok(out)
}

/// Decimate with the most recent point winning each contested cell.
///
/// `xs`/`ys` are in ascending-attempt order (oldest first). They are walked
/// newest-first and the returned indices refer back to the ascending input.
pub fn decimate_most_recent(
    xs: &[f64],
    ys: &[f64],
    x_quantum: f64,
    y_quantum: f64,
) -> AnalyticsResult<Decimated> {
    let rev_x: Vec<f64> = xs.iter().rev().copied().collect();
    let rev_y: Vec<f64> = ys.iter().rev().copied().collect();
    let mut out = decimate(&rev_x, &rev_y, x_quantum, y_quantum)?;
    let last = xs.len().saturating_sub(1);
    for idx in &mut out.source_indices {
        *idx = last - *idx;
    }
    Ok(out)
}

/// Decides whether a scatter input is large enough to be decimated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecimationPolicy {
    pub threshold: usize,
}

impl Default for DecimationPolicy {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_DECIMATION_THRESHOLD,
        }
    }
}

impl DecimationPolicy {
    pub fn new(threshold: usize) -> Self {
        Self { threshold }
    }

    pub fn should_decimate(&self, len: usize) -> bool {
        len > self.threshold
    }

    /// Decimate (most recent wins) above the threshold, pass through otherwise.
    pub fn apply(
        &self,
        xs: &[f64],
        ys: &[f64],
        x_quantum: f64,
        y_quantum: f64,
    ) -> AnalyticsResult<Decimated> {
        if !self.should_decimate(xs.len()) {
            if xs.len() != ys.len() {
                return Err(AnalyticsError::integrity(format!(
                    "decimation input has {} xs but {} ys",
                    xs.len(),
                    ys.len()
                )));
            }
            return Ok(Decimated::identity(xs, ys));
        }

        let out = decimate_most_recent(xs, ys, x_quantum, y_quantum)?;
        debug!(
            input = xs.len(),
            kept = out.len(),
            threshold = self.threshold,
            "decimated scatter input"
        );
        Ok(out)
    }
}
