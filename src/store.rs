//! Loading and saving race histories as a delimited file or an SQLite database.

use chrono::NaiveDateTime;
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::record::{Record, RecordSequence};
use crate::util::round_to;

/// Timestamp layout of the delimited file
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const FIELD_DELIMITER: u8 = b';';
const ACCURACY_DIGITS: i32 = 3;

/// Somewhere a race history can be loaded from and saved to
pub trait RecordStore {
    fn load(&self) -> Result<RecordSequence, StoreError>;
    fn save(&mut self, seq: &RecordSequence) -> Result<(), StoreError>;
}

/// Semicolon-delimited text file, one race per line, newest race first:
/// `attempt;speed;accuracy;score;place;date`
#[derive(Debug, Clone)]
pub struct DelimitedFileStore {
    path: PathBuf,
}

impl DelimitedFileStore {
    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Raw cell; only numeric and date cells are trimmed before parsing, `place`
/// is kept byte for byte.
fn field<'a>(
    row: &'a csv::StringRecord,
    idx: usize,
    name: &str,
    line: u64,
) -> Result<&'a str, StoreError> {
    row.get(idx).ok_or_else(|| StoreError::Parse {
        line,
        reason: format!("missing {name} field"),
    })
}

fn parse_field<T: std::str::FromStr>(raw: &str, name: &str, line: u64) -> Result<T, StoreError>
where
    T::Err: std::fmt::Display,
{
    raw.trim().parse::<T>().map_err(|e| StoreError::Parse {
        line,
        reason: format!("bad {name} {raw:?}: {e}"),
    })
}

fn parse_row(row: &csv::StringRecord) -> Result<Record, StoreError> {
    let line = row.position().map_or(0, |p| p.line());
    if row.len() != 6 {
        return Err(StoreError::Parse {
            line,
            reason: format!("expected 6 fields, found {}", row.len()),
        });
    }

    let date_raw = field(row, 5, "date", line)?.trim();
    let date = NaiveDateTime::parse_from_str(date_raw, DATE_FORMAT).map_err(|e| StoreError::Parse {
        line,
        reason: format!("bad date {date_raw:?}: {e}"),
    })?;

    Ok(Record {
        attempt: parse_field(field(row, 0, "attempt", line)?, "attempt", line)?,
        speed: parse_field(field(row, 1, "speed", line)?, "speed", line)?,
        accuracy: parse_field(field(row, 2, "accuracy", line)?, "accuracy", line)?,
        score: parse_field(field(row, 3, "score", line)?, "score", line)?,
        place: field(row, 4, "place", line)?.to_string(),
        date,
    })
}

impl RecordStore for DelimitedFileStore {
    fn load(&self) -> Result<RecordSequence, StoreError> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(FIELD_DELIMITER)
            .has_headers(false)
            .flexible(true)
            .from_path(&self.path)?;

        let mut records = Vec::new();
        for row in reader.records() {
            records.push(parse_row(&row?)?);
        }

        debug!(path = %self.path.display(), count = records.len(), "loaded race file");
        Ok(RecordSequence::from_newest_first(records)?)
    }

    fn save(&mut self, seq: &RecordSequence) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut writer = csv::WriterBuilder::new()
            .delimiter(FIELD_DELIMITER)
            .has_headers(false)
            .from_path(&self.path)?;

        for r in seq.newest_first() {
            writer.write_record([
                r.attempt.to_string(),
                r.speed.to_string(),
                round_to(r.accuracy, ACCURACY_DIGITS).to_string(),
                r.score.to_string(),
                r.place.clone(),
                r.date.format(DATE_FORMAT).to_string(),
            ])?;
        }
        writer.flush()?;

        debug!(path = %self.path.display(), count = seq.len(), "saved race file");
        Ok(())
    }
}

/// Race history kept in an SQLite database
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS races (
                attempt INTEGER PRIMARY KEY,
                speed REAL NOT NULL,
                accuracy REAL NOT NULL,
                score INTEGER NOT NULL,
                place TEXT NOT NULL,
                date TEXT NOT NULL
            )
            "#,
            [],
        )?;
        Ok(Self { conn })
    }

    pub fn race_count(&self) -> Result<usize, StoreError> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM races", [], |row| row.get(0))?;
        Ok(n as usize)
    }
}

impl RecordStore for SqliteStore {
    fn load(&self) -> Result<RecordSequence, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT attempt, speed, accuracy, score, place, date FROM races ORDER BY attempt",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, f64>(1)?,
                row.get::<_, f64>(2)?,
                row.get::<_, u32>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (attempt, speed, accuracy, score, place, date_raw) = row?;
            let date = NaiveDateTime::parse_from_str(&date_raw, DATE_FORMAT).map_err(|e| {
                StoreError::Parse {
                    line: attempt as u64,
                    reason: format!("bad date {date_raw:?}: {e}"),
                }
            })?;
            records.push(Record {
                attempt: attempt as u64,
                speed,
                accuracy,
                score,
                place,
                date,
            });
        }

        debug!(count = records.len(), "loaded races from database");
        Ok(RecordSequence::new(records)?)
    }

    /// Replace the stored history with `seq`.
    fn save(&mut self, seq: &RecordSequence) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        let removed = tx.execute("DELETE FROM races", [])?;
        if removed > 0 {
            warn!(removed, "replacing stored race history");
        }

        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO races (attempt, speed, accuracy, score, place, date)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )?;
            for r in seq {
                stmt.execute(params![
                    r.attempt as i64,
                    r.speed,
                    r.accuracy,
                    r.score,
                    r.place,
                    r.date.format(DATE_FORMAT).to_string(),
                ])?;
            }
        }

        tx.commit()?;
        debug!(count = seq.len(), "saved races to database");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalyticsError;
    use crate::record::tests::at;
    use assert_matches::assert_matches;
    use tempfile::tempdir;

    fn sample() -> RecordSequence {
        RecordSequence::new(vec![
            Record::new(1, 72.0, 0.96, 110, "2/5", at(1, 9)),
            Record::new(2, 80.5, 0.9834, 0, "1/5", at(1, 10)),
            Record::new(3, 91.0, 1.0, 150, "1/3", at(2, 21)),
        ])
        .unwrap()
    }

    #[test]
    fn delimited_file_is_newest_first() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("races.txt");
        let mut store = DelimitedFileStore::with_path(&path);
        store.save(&sample()).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "3;91;1;150;1/3;2024-03-02 21:00:00");
        assert_eq!(lines[1], "2;80.5;0.983;0;1/5;2024-03-01 10:00:00");
    }

    #[test]
    fn delimited_roundtrip() {
        let dir = tempdir().unwrap();
        let mut store = DelimitedFileStore::with_path(dir.path().join("races.txt"));
        let seq = sample();
        store.save(&seq).unwrap();
        let loaded = store.load().unwrap();

        assert_eq!(loaded.attempts(), seq.attempts());
        assert_eq!(loaded.speeds(), seq.speeds());
        assert_eq!(loaded.scores(), seq.scores());
        assert_eq!(loaded.places(), seq.places());
        assert_eq!(loaded.dates(), seq.dates());
        assert_eq!(loaded.accuracies(), vec![0.96, 0.983, 1.0]);
    }

    #[test]
    fn delimited_roundtrip_keeps_place_verbatim() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("races.txt");
        let seq = RecordSequence::new(vec![
            Record::new(1, 70.0, 0.95, 10, " 2nd of 4 ", at(1, 9)),
            Record::new(2, 75.0, 0.96, 12, "1st\t", at(1, 10)),
            Record::new(3, 80.0, 0.97, 14, "3;5", at(1, 11)),
        ])
        .unwrap();
        let mut store = DelimitedFileStore::with_path(&path);
        store.save(&seq).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains(";10; 2nd of 4 ;"));

        let loaded = store.load().unwrap();
        assert_eq!(loaded.places(), vec![" 2nd of 4 ", "1st\t", "3;5"]);
    }

    #[test]
    fn delimited_tolerates_padded_numbers() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("races.txt");
        std::fs::write(&path, " 1 ; 80 ;0.95 ; 0;1/2; 2024-03-01 10:00:00 \n").unwrap();
        let loaded = DelimitedFileStore::with_path(&path).load().unwrap();
        assert_eq!(loaded.speeds(), vec![80.0]);
        assert_eq!(loaded.places(), vec!["1/2"]);
        assert_eq!(loaded.dates(), vec![at(1, 10)]);
    }

    #[test]
    fn delimited_reports_bad_line() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("races.txt");
        std::fs::write(
            &path,
            "2;80;0.95;0;1/2;2024-03-01 10:00:00\n1;fast;0.95;0;1/2;2024-03-01 09:00:00\n",
        )
        .unwrap();
        let err = DelimitedFileStore::with_path(&path).load().unwrap_err();
        assert_matches!(err, StoreError::Parse { line: 2, .. });
    }

    #[test]
    fn delimited_rejects_unordered_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("races.txt");
        std::fs::write(
            &path,
            "1;80;0.95;0;1/2;2024-03-01 10:00:00\n2;70;0.95;0;1/2;2024-03-01 09:00:00\n",
        )
        .unwrap();
        let err = DelimitedFileStore::with_path(&path).load().unwrap_err();
        assert_matches!(err, StoreError::Analytics(AnalyticsError::DataIntegrity(_)));
    }

    #[test]
    fn sqlite_roundtrip_replaces_history() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.save(&sample()).unwrap();
        store.save(&sample()).unwrap();
        assert_eq!(store.race_count().unwrap(), 3);

        let loaded = store.load().unwrap();
        assert_eq!(loaded, sample());
    }

    #[test]
    fn sqlite_empty_table_is_a_configuration_error() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert_matches!(
            store.load(),
            Err(StoreError::Analytics(AnalyticsError::Configuration(_)))
        );
    }
}
