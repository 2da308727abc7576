//! Race records and the validated ascending sequence built from them.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AnalyticsError, AnalyticsResult};

/// One completed race
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub attempt: u64,
    pub speed: f64,
    pub accuracy: f64,
    /// Zero when the source reported no score.
    pub score: u32,
    pub place: String,
    pub date: NaiveDateTime,
}

impl Record {
    pub fn new(
        attempt: u64,
        speed: f64,
        accuracy: f64,
        score: u32,
        place: impl Into<String>,
        date: NaiveDateTime,
    ) -> Self {
        Self {
            attempt,
            speed,
            accuracy,
            score,
            place: place.into(),
            date,
        }
    }

    /// Calendar day the race belongs to
    pub fn day(&self) -> NaiveDate {
        self.date.date()
    }
}

/// Race history ordered by ascending attempt (oldest race first).
///
/// A sequence is never empty and its attempts strictly increase. It is read-only
/// once built; every derived series is a fresh allocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordSequence {
    records: Vec<Record>,
}

impl RecordSequence {
    /// Build from records already in ascending-attempt order.
    pub fn new(records: Vec<Record>) -> AnalyticsResult<Self> {
        if records.is_empty() {
            return Err(AnalyticsError::config("record sequence must not be empty"));
        }

        for (prev, next) in records.iter().zip(records.iter().skip(1)) {
            if next.attempt <= prev.attempt {
                return Err(AnalyticsError::integrity(format!(
                    "attempt {} follows attempt {}; attempts must strictly increase",
                    next.attempt, prev.attempt
                )));
            }
        }

        debug!(
            count = records.len(),
            first_attempt = records[0].attempt,
            last_attempt = records[records.len() - 1].attempt,
            "built record sequence"
        );
        Ok(Self { records })
    }

    /// Build from records delivered newest-first, as both the race-history pages
    /// and the flat file store them.
    pub fn from_newest_first(mut records: Vec<Record>) -> AnalyticsResult<Self> {
        records.reverse();
        Self::new(records)
    }

    /// Zip six parallel series into a sequence. All series must share one length.
    pub fn from_series(
        attempts: Vec<u64>,
        speeds: Vec<f64>,
        accuracies: Vec<f64>,
        scores: Vec<u32>,
        places: Vec<String>,
        dates: Vec<NaiveDateTime>,
    ) -> AnalyticsResult<Self> {
        let len = attempts.len();
        let lengths = [
            speeds.len(),
            accuracies.len(),
            scores.len(),
            places.len(),
            dates.len(),
        ];
        if lengths.iter().any(|&l| l != len) {
            return Err(AnalyticsError::integrity(format!(
                "parallel series have mismatched lengths: attempts={len}, others={lengths:?}"
            )));
        }

        let records = attempts
            .into_iter()
            .zip(speeds)
            .zip(accuracies)
            .zip(scores)
            .zip(places)
            .zip(dates)
            .map(|(((((attempt, speed), accuracy), score), place), date)| Record {
                attempt,
                speed,
                accuracy,
                score,
                place,
                date,
            })
            .collect();

        Self::new(records)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Always false; kept for API symmetry with collections.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    pub fn first(&self) -> &Record {
        &self.records[0]
    }

    pub fn last(&self) -> &Record {
        &self.records[self.records.len() - 1]
    }

    pub fn speeds(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.speed).collect()
    }

    pub fn accuracies(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.accuracy).collect()
    }

    pub fn attempts(&self) -> Vec<u64> {
        self.records.iter().map(|r| r.attempt).collect()
    }

    /// Attempts as plot coordinates
    pub fn attempt_axis(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.attempt as f64).collect()
    }

    pub fn scores(&self) -> Vec<u32> {
        self.records.iter().map(|r| r.score).collect()
    }

    pub fn places(&self) -> Vec<String> {
        self.records.iter().map(|r| r.place.clone()).collect()
    }

    pub fn dates(&self) -> Vec<NaiveDateTime> {
        self.records.iter().map(|r| r.date).collect()
    }

    /// Records newest-first, the on-disk order of the stores.
    pub fn newest_first(&self) -> impl Iterator<Item = &Record> {
        self.records.iter().rev()
    }
}

impl<'a> IntoIterator for &'a RecordSequence {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
