//! Per-day race counts and speed buckets.

use chrono::NaiveDate;
use itertools::Itertools;
use serde::Serialize;

use crate::record::{Record, RecordSequence};

/// Races of one calendar day. Days without races have no bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayBucket {
    pub date: NaiveDate,
    pub count: usize,
    pub best_speed: f64,
    pub worst_speed: f64,
    pub average_speed: f64,
}

impl DayBucket {
    fn from_day<'a>(date: NaiveDate, records: impl Iterator<Item = &'a Record>) -> Self {
        let mut count = 0usize;
        let mut sum = 0.0;
        let mut best = f64::NEG_INFINITY;
        let mut worst = f64::INFINITY;

        for r in records {
            count += 1;
            sum += r.speed;
            best = best.max(r.speed);
            worst = worst.min(r.speed);
        }

        Self {
            date,
            count,
            best_speed: best,
            worst_speed: worst,
            average_speed: sum / count as f64,
        }
    }
}

/// Group consecutive records sharing a calendar day.
///
/// A new bucket starts whenever the day differs from the previous record's, so
/// with monotonic dates each day appears exactly once.
pub fn aggregate(seq: &RecordSequence) -> Vec<DayBucket> {
    seq.iter()
        .chunk_by(|r| r.day())
        .into_iter()
        .map(|(day, records)| DayBucket::from_day(day, records))
        .collect()
}

/// Races per calendar day
pub fn races_per_day(seq: &RecordSequence) -> Vec<(NaiveDate, usize)> {
    seq.iter()
        .chunk_by(|r| r.day())
        .into_iter()
        .map(|(day, records)| (day, records.count()))
        .collect()
}
