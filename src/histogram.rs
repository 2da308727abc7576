//! Histogram binning for accuracy and speed distributions.
//!
//! Bin edges are always derived from integers (whole percents for accuracy,
//! whole speed units for speed) and rescaled once, never accumulated by repeated
//! fractional addition. Accumulated edges drift and produce duplicate or missing
//! buckets around values such as 0.29 or 0.57.

use itertools::Itertools;
use serde::Serialize;

use crate::error::{AnalyticsError, AnalyticsResult};
use crate::util::min_max;

/// Accuracy bins extend to 101% so a perfect score lands inside the last bin.
const ACCURACY_TOP_PCT: i64 = 101;
const PERCENT_EPSILON: f64 = 1e-6;
const MAX_TICKS: usize = 10;
/// Upper bound on unit-width speed bins a single layout allocates
pub const MAX_SPEED_BINS: i64 = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub bins: Vec<Bin>,
}

impl Histogram {
    pub fn edges(&self) -> Vec<f64> {
        let mut edges: Vec<f64> = self.bins.iter().map(|b| b.lower).collect();
        if let Some(last) = self.bins.last() {
            edges.push(last.upper);
        }
        edges
    }

    pub fn total(&self) -> usize {
        self.bins.iter().map(|b| b.count).sum()
    }
}

/// Axis tick for a histogram edge
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tick {
    pub value: f64,
    /// Where the label is drawn; the centre of the bin starting at `value`.
    pub position: f64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccuracyHistogram {
    pub histogram: Histogram,
    pub ticks: Vec<Tick>,
}

/// Whole percent containing `accuracy`, tolerant of representation error
/// (`0.29 * 100.0` is `28.999999999999996`).
fn whole_percent(accuracy: f64) -> i64 {
    (accuracy * 100.0 + PERCENT_EPSILON).floor() as i64
}

/// Fixed bin layout, reusable across prefixes of the same data (animation frames
/// keep the edges of the full dataset).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Binning {
    /// Width 0.01 from `lo_pct / 100` to 1.01.
    Accuracy { lo_pct: i64 },
    /// Unit-width bins on `[lo, hi)`.
    Unit { lo: i64, hi: i64 },
    /// Integer-width bins on `[lo, lo + width * count)`.
    Spanned { lo: i64, width: i64, count: usize },
}

impl Binning {
    pub fn for_accuracy(values: &[f64]) -> AnalyticsResult<Self> {
        let (min, _) = checked_range(values, "accuracy")?;
        if let Some(bad) = values.iter().find(|v| !(0.0..=1.0).contains(*v)) {
            return Err(AnalyticsError::config(format!(
                "accuracy {bad} is outside [0, 1]"
            )));
        }
        Ok(Binning::Accuracy {
            lo_pct: whole_percent(min),
        })
    }

    pub fn for_speed(values: &[f64]) -> AnalyticsResult<Self> {
        let (lo, hi) = speed_bounds(values)?;
        if hi - lo > MAX_SPEED_BINS {
            return Err(AnalyticsError::config(format!(
                "speed range [{lo}, {hi}) needs more than {MAX_SPEED_BINS} unit bins"
            )));
        }
        Ok(Binning::Unit { lo, hi })
    }

    /// At most `bin_count` bins of a common integer width covering every value.
    pub fn for_speed_spanned(values: &[f64], bin_count: usize) -> AnalyticsResult<Self> {
        if bin_count == 0 {
            return Err(AnalyticsError::config("bin count must be >= 1"));
        }
        let (lo, hi) = speed_bounds(values)?;
        let span = hi - lo;
        let per_bin = i64::try_from(bin_count).unwrap_or(i64::MAX);
        let width = (span / per_bin + i64::from(span % per_bin != 0)).max(1);
        let count = span / width + i64::from(span % width != 0);
        count
            .checked_mul(width)
            .and_then(|covered| lo.checked_add(covered))
            .ok_or_else(|| {
                AnalyticsError::config(format!("speed range [{lo}, {hi}) cannot be binned"))
            })?;
        Ok(Binning::Spanned {
            lo,
            width,
            count: count as usize,
        })
    }

    pub fn bin_count(&self) -> usize {
        match *self {
            Binning::Accuracy { lo_pct } => (ACCURACY_TOP_PCT - lo_pct).max(0) as usize,
            Binning::Unit { lo, hi } => (hi - lo).max(0) as usize,
            Binning::Spanned { count, .. } => count,
        }
    }

    pub fn edges(&self) -> Vec<f64> {
        (0..=self.bin_count()).map(|k| self.edge(k)).collect()
    }

    fn edge(&self, k: usize) -> f64 {
        let k = k as i64;
        match *self {
            Binning::Accuracy { lo_pct } => (lo_pct + k) as f64 / 100.0,
            Binning::Unit { lo, .. } => (lo + k) as f64,
            Binning::Spanned { lo, width, .. } => (lo + k * width) as f64,
        }
    }

    /// Bin containing `value` under half-open `[lower, upper)` membership
    pub fn index_of(&self, value: f64) -> Option<usize> {
        if !value.is_finite() {
            return None;
        }
        let idx = match *self {
            Binning::Accuracy { lo_pct } => whole_percent(value).checked_sub(lo_pct),
            Binning::Unit { lo, .. } => (value.floor() as i64).checked_sub(lo),
            Binning::Spanned { lo, width, .. } => (value.floor() as i64)
                .checked_sub(lo)
                .map(|offset| offset.div_euclid(width)),
        }?;
        usize::try_from(idx)
            .ok()
            .filter(|&i| i < self.bin_count())
    }

    /// Count `values` into this layout. Values outside it are ignored.
    pub fn histogram(&self, values: &[f64]) -> Histogram {
        let mut counts = vec![0usize; self.bin_count()];
        for &v in values {
            if let Some(i) = self.index_of(v) {
                counts[i] += 1;
            }
        }
        let bins = counts
            .into_iter()
            .enumerate()
            .map(|(k, count)| Bin {
                lower: self.edge(k),
                upper: self.edge(k + 1),
                count,
            })
            .collect();
        Histogram { bins }
    }

    /// Labels for at most ~10 edges. Accuracy edges above 100% only close the
    /// last bin and are never labelled.
    pub fn ticks(&self) -> Vec<Tick> {
        let candidates: Vec<(f64, f64)> = match *self {
            Binning::Accuracy { lo_pct } => (lo_pct..=100)
                .map(|pct| (pct as f64 / 100.0, pct as f64))
                .collect(),
            _ => self.edges().into_iter().map(|e| (e, e)).collect(),
        };
        let stride = (candidates.len() / MAX_TICKS).max(1);
        let half_width = match *self {
            Binning::Accuracy { .. } => 0.005,
            Binning::Unit { .. } => 0.5,
            Binning::Spanned { width, .. } => width as f64 / 2.0,
        };

        candidates
            .into_iter()
            .step_by(stride)
            .map(|(value, shown)| Tick {
                value,
                position: value + half_width,
                label: format!("{shown}"),
            })
            .collect()
    }
}

fn checked_range(values: &[f64], what: &str) -> AnalyticsResult<(f64, f64)> {
    if values.is_empty() {
        return Err(AnalyticsError::config(format!(
            "{what} histogram needs at least one value"
        )));
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(AnalyticsError::config(format!(
            "{what} histogram values must be finite"
        )));
    }
    min_max(values).ok_or_else(|| AnalyticsError::config(format!("no finite {what} values")))
}

/// Whole-unit `[lo, hi)` covering `values`, rejecting ranges an `i64` cannot hold.
fn speed_bounds(values: &[f64]) -> AnalyticsResult<(i64, i64)> {
    let (min, max) = checked_range(values, "speed")?;
    let whole = |v: f64| {
        let v = v.floor();
        (v >= i64::MIN as f64 && v < i64::MAX as f64).then_some(v as i64)
    };
    let bounds = whole(min).zip(whole(max).and_then(|m| m.checked_add(1)));
    bounds
        .filter(|&(lo, hi)| hi.checked_sub(lo).is_some())
        .ok_or_else(|| {
            AnalyticsError::config(format!("speed range [{min}, {max}] is not representable"))
        })
}

/// 0.01-wide accuracy histogram with percent tick labels
pub fn accuracy_histogram(values: &[f64]) -> AnalyticsResult<AccuracyHistogram> {
    let binning = Binning::for_accuracy(values)?;
    Ok(AccuracyHistogram {
        histogram: binning.histogram(values),
        ticks: binning.ticks(),
    })
}

/// Unit-width speed histogram covering every observed value
pub fn speed_histogram(values: &[f64]) -> AnalyticsResult<Histogram> {
    Ok(Binning::for_speed(values)?.histogram(values))
}

/// Speed histogram with at most `bin_count` integer-width bins
pub fn speed_histogram_spanned(values: &[f64], bin_count: usize) -> AnalyticsResult<Histogram> {
    Ok(Binning::for_speed_spanned(values, bin_count)?.histogram(values))
}

/// One `(speed, races)` entry per distinct observed speed, ascending
pub fn speed_counts(values: &[f64]) -> AnalyticsResult<Vec<(f64, usize)>> {
    checked_range(values, "speed")?;
    Ok(values
        .iter()
        .copied()
        .sorted_by(f64::total_cmp)
        .dedup_with_count()
        .map(|(count, value)| (value, count))
        .collect())
}
