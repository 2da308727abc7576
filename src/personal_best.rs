//! Personal-best (running maximum) trajectories.

use serde::{Deserialize, Serialize};

use crate::error::{AnalyticsError, AnalyticsResult};

/// How a PB trajectory is presented
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PbMode {
    /// Improvement points only, joined by straight connectors.
    #[default]
    Gradual,
    /// Step function: the previous best is held until the attempt that beats it.
    Snap,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PbPoint {
    pub attempt: u64,
    pub value: f64,
}

impl PbPoint {
    pub fn new(attempt: u64, value: f64) -> Self {
        Self { attempt, value }
    }
}

impl From<(u64, f64)> for PbPoint {
    fn from(v: (u64, f64)) -> Self {
        PbPoint::new(v.0, v.1)
    }
}

/// Horizontal reference line drawn from a PB to the end of the attempt range
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CeilingLine {
    pub from_attempt: u64,
    pub to_attempt: u64,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PbTrajectory {
    pub mode: PbMode,
    /// Points to plot, shaped by `mode`.
    pub points: Vec<PbPoint>,
    /// Every strict improvement, in attempt order, regardless of `mode`.
    pub records: Vec<PbPoint>,
    pub ceilings: Vec<CeilingLine>,
}

impl PbTrajectory {
    /// PB values for a secondary axis
    pub fn ticks(&self) -> Vec<f64> {
        self.records.iter().map(|p| p.value).collect()
    }

    pub fn best(&self) -> Option<PbPoint> {
        self.records.last().copied()
    }
}

/// Track the running maximum of `values`, aligned with ascending `attempts`.
///
/// A point is recorded only when a value is strictly greater than every value
/// before it; repeating a PB is not a new PB.
pub fn track(attempts: &[u64], values: &[f64], mode: PbMode) -> AnalyticsResult<PbTrajectory> {
    if attempts.len() != values.len() {
        return Err(AnalyticsError::integrity(format!(
            "pb input has {} attempts but {} values",
            attempts.len(),
            values.len()
        )));
    }
    let Some(&last_attempt) = attempts.last() else {
        return Err(AnalyticsError::config("pb tracking needs at least one value"));
    };

    let mut best = f64::NEG_INFINITY;
    let mut records = Vec::new();
    for (&attempt, &value) in attempts.iter().zip(values) {
        if value > best {
            best = value;
            records.push(PbPoint::new(attempt, value));
        }
    }

    let points = match mode {
        PbMode::Gradual => records.clone(),
        PbMode::Snap => snap_points(&records, last_attempt),
    };

    let ceilings = records
        .iter()
        .map(|p| CeilingLine {
            from_attempt: p.attempt,
            to_attempt: last_attempt,
            value: p.value,
        })
        .collect();

    Ok(PbTrajectory {
        mode,
        points,
        records,
        ceilings,
    })
}

fn snap_points(records: &[PbPoint], last_attempt: u64) -> Vec<PbPoint> {
    let mut points = Vec::with_capacity(records.len() * 2 + 1);
    let mut prev: Option<PbPoint> = None;

    for &pb in records {
        if let Some(prev) = prev {
            points.push(PbPoint::new(pb.attempt, prev.value));
        }
        points.push(pb);
        prev = Some(pb);
    }

    if let Some(last) = prev {
        points.push(PbPoint::new(last_attempt, last.value));
    }

    points
}
