//! Paging through a remote race history.
//!
//! The transport is abstracted behind [`PageSource`]; this module owns the
//! cursor loop, the start-date cut-off, the newest-first to ascending reversal
//! and the parsing of scraped table cells.

use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashSet;
use tracing::{debug, trace, warn};

use crate::error::AcquireError;
use crate::record::{Record, RecordSequence};
use crate::util::round_to;

const MONTHS: [&str; 12] = [
    "Jan.", "Feb.", "March", "April", "May", "June", "July", "Aug.", "Sept.", "Oct.", "Nov.",
    "Dec.",
];

/// One page of race rows, newest race first
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub rows: Vec<Record>,
    /// Cursor of the next (older) page; `None` on the last page.
    pub next: Option<String>,
}

/// Something that can hand out pages of a race history
pub trait PageSource {
    /// Fetch the page at `cursor`, or the newest page when `cursor` is `None`.
    fn fetch(&mut self, cursor: Option<&str>) -> Result<Page, AcquireError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Acquired {
    pub sequence: RecordSequence,
    pub pages: usize,
    /// A later page failed and the history stops early. The sequence is still
    /// well-formed, just shorter.
    pub truncated: bool,
}

/// Follow cursors until the source runs out and build the ascending sequence.
///
/// Races dated before `start_date` are dropped. A failure on the first page is
/// an error; a failure on a later page ends acquisition with what was gathered.
pub fn collect_pages<S: PageSource>(
    source: &mut S,
    start_date: Option<NaiveDate>,
) -> Result<Acquired, AcquireError> {
    let mut rows = Vec::new();
    let mut cursor: Option<String> = None;
    let mut visited: HashSet<String> = HashSet::new();
    let mut pages = 0usize;
    let mut truncated = false;

    loop {
        let page = match source.fetch(cursor.as_deref()) {
            Ok(page) => page,
            Err(err) if pages > 0 => {
                warn!(pages, error = %err, "race history truncated");
                truncated = true;
                break;
            }
            Err(err) => return Err(err),
        };
        pages += 1;
        trace!(page = pages, rows = page.rows.len(), "fetched race page");

        rows.extend(
            page.rows
                .into_iter()
                .filter(|r| start_date.map_or(true, |start| r.day() >= start)),
        );

        match page.next {
            Some(next) if !visited.insert(next.clone()) => {
                warn!(cursor = %next, "page source revisited a cursor; stopping");
                break;
            }
            Some(next) => cursor = Some(next),
            None => break,
        }
    }

    debug!(pages, races = rows.len(), truncated, "race history collected");
    Ok(Acquired {
        sequence: RecordSequence::from_newest_first(rows)?,
        pages,
        truncated,
    })
}

fn row_err(msg: impl Into<String>) -> AcquireError {
    AcquireError::Row(msg.into())
}

/// Parse a scraped date such as `"Jan. 5, 2020"`, or `"today"`.
pub fn parse_scraped_date(raw: &str, today: NaiveDate) -> Result<NaiveDate, AcquireError> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("today") {
        return Ok(today);
    }

    let mut parts = raw.split_whitespace();
    let (Some(month), Some(day), Some(year), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(row_err(format!("unrecognised date {raw:?}")));
    };

    let month = MONTHS
        .iter()
        .position(|m| *m == month)
        .ok_or_else(|| row_err(format!("unknown month {month:?}")))? as u32
        + 1;
    let day: u32 = day
        .trim_end_matches(',')
        .parse()
        .map_err(|_| row_err(format!("bad day in {raw:?}")))?;
    let year: i32 = year
        .parse()
        .map_err(|_| row_err(format!("bad year in {raw:?}")))?;

    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| row_err(format!("impossible date {raw:?}")))
}

/// Parse the cells of one scraped race row:
/// attempt, speed (`"87 WPM"`), accuracy (`"97.5%"`), score (or `"N/A"`), place, date.
pub fn parse_row(cells: &[&str], today: NaiveDate) -> Result<Record, AcquireError> {
    let [attempt, speed, accuracy, score, place, date] = cells else {
        return Err(row_err(format!("expected 6 cells, found {}", cells.len())));
    };

    let attempt: u64 = attempt
        .trim()
        .parse()
        .map_err(|_| row_err(format!("bad attempt {attempt:?}")))?;
    let speed: f64 = speed
        .split_whitespace()
        .next()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| row_err(format!("bad speed {speed:?}")))?;
    let accuracy: f64 = accuracy
        .trim()
        .trim_end_matches('%')
        .parse::<f64>()
        .map(|pct| round_to(pct / 100.0, 3))
        .map_err(|_| row_err(format!("bad accuracy {accuracy:?}")))?;
    let score: u32 = match score.trim() {
        "N/A" | "" => 0,
        s => s
            .parse()
            .map_err(|_| row_err(format!("bad score {score:?}")))?,
    };
    let date: NaiveDateTime = parse_scraped_date(date, today)?
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| row_err("midnight out of range"))?;

    Ok(Record::new(attempt, speed, accuracy, score, place.trim(), date))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalyticsError;
    use assert_matches::assert_matches;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn race(attempt: u64, month: u32) -> Record {
        let date = NaiveDate::from_ymd_opt(2024, month, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        Record::new(attempt, 60.0 + attempt as f64, 0.95, 0, "1/2", date)
    }

    /// Serves pages newest-first, optionally failing on one page.
    struct ScriptedSource {
        pages: Vec<Vec<Record>>,
        fail_at: Option<usize>,
        /// Cursor handed out after the last page instead of ending.
        cycle_to: Option<usize>,
    }

    impl PageSource for ScriptedSource {
        fn fetch(&mut self, cursor: Option<&str>) -> Result<Page, AcquireError> {
            let idx: usize = cursor.map_or(0, |c| c.parse().unwrap());
            if self.fail_at == Some(idx) {
                return Err(AcquireError::Source("connection reset".into()));
            }
            let next = if idx + 1 < self.pages.len() {
                Some((idx + 1).to_string())
            } else {
                self.cycle_to.map(|c| c.to_string())
            };
            Ok(Page {
                rows: self.pages[idx].clone(),
                next,
            })
        }
    }

    #[test]
    fn collects_all_pages_in_ascending_order() {
        let mut source = ScriptedSource {
            pages: vec![vec![race(5, 5), race(4, 4)], vec![race(3, 3), race(2, 2)], vec![race(1, 1)]],
            fail_at: None,
            cycle_to: None,
        };
        let got = collect_pages(&mut source, None).unwrap();
        assert_eq!(got.pages, 3);
        assert!(!got.truncated);
        assert_eq!(got.sequence.attempts(), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn start_date_drops_older_races() {
        let mut source = ScriptedSource {
            pages: vec![vec![race(3, 3), race(2, 2)], vec![race(1, 1)]],
            fail_at: None,
            cycle_to: None,
        };
        let start = NaiveDate::from_ymd_opt(2024, 2, 1);
        let got = collect_pages(&mut source, start).unwrap();
        assert_eq!(got.sequence.attempts(), vec![2, 3]);
    }

    #[test]
    fn later_failure_truncates() {
        let mut source = ScriptedSource {
            pages: vec![vec![race(3, 3), race(2, 2)], vec![race(1, 1)]],
            fail_at: Some(1),
            cycle_to: None,
        };
        let got = collect_pages(&mut source, None).unwrap();
        assert!(got.truncated);
        assert_eq!(got.sequence.attempts(), vec![2, 3]);
    }

    #[test]
    fn cycling_cursors_stop_collection() {
        let mut source = ScriptedSource {
            pages: vec![vec![race(5, 5), race(4, 4)], vec![race(3, 3), race(2, 2)], vec![race(1, 1)]],
            fail_at: None,
            cycle_to: Some(1),
        };
        let got = collect_pages(&mut source, None).unwrap();
        assert_eq!(got.pages, 3);
        assert!(!got.truncated);
        assert_eq!(got.sequence.attempts(), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn first_page_failure_is_an_error() {
        let mut source = ScriptedSource {
            pages: vec![vec![race(1, 1)]],
            fail_at: Some(0),
            cycle_to: None,
        };
        assert_matches!(collect_pages(&mut source, None), Err(AcquireError::Source(_)));
    }

    #[test]
    fn empty_history_is_a_configuration_error() {
        let mut source = ScriptedSource {
            pages: vec![vec![]],
            fail_at: None,
            cycle_to: None,
        };
        assert_matches!(
            collect_pages(&mut source, None),
            Err(AcquireError::Analytics(AnalyticsError::Configuration(_)))
        );
    }

    #[test]
    fn parses_scraped_row() {
        let r = parse_row(
            &["1042", "87 WPM", "97.5%", "N/A", "2nd of 4", "Sept. 14, 2023"],
            today(),
        )
        .unwrap();
        assert_eq!(r.attempt, 1042);
        assert_eq!(r.speed, 87.0);
        assert_eq!(r.accuracy, 0.975);
        assert_eq!(r.score, 0);
        assert_eq!(r.place, "2nd of 4");
        assert_eq!(r.day(), NaiveDate::from_ymd_opt(2023, 9, 14).unwrap());
    }

    #[test]
    fn parses_today_and_scores() {
        let r = parse_row(&["7", "101 WPM", "100%", "188", "1st", "today"], today()).unwrap();
        assert_eq!(r.score, 188);
        assert_eq!(r.accuracy, 1.0);
        assert_eq!(r.day(), today());
    }

    #[test]
    fn rejects_malformed_rows() {
        assert_matches!(parse_row(&["1", "2"], today()), Err(AcquireError::Row(_)));
        assert_matches!(
            parse_row(&["x", "87 WPM", "97%", "0", "1st", "today"], today()),
            Err(AcquireError::Row(_))
        );
        assert_matches!(
            parse_scraped_date("Smarch 3, 2020", today()),
            Err(AcquireError::Row(_))
        );
        assert_matches!(
            parse_scraped_date("Feb. 30, 2020", today()),
            Err(AcquireError::Row(_))
        );
    }
}
