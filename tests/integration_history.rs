use chrono::NaiveDate;
use racetrend::chart::{speed_chart, ChartKind};
use racetrend::config::AnalyticsConfig;
use racetrend::daily::aggregate;
use racetrend::store::{DelimitedFileStore, RecordStore, SqliteStore};
use racetrend::{PbMode, Record, RecordSequence};
use tempfile::tempdir;

// End-to-end: a race history goes to disk, comes back, and feeds every chart.

fn history() -> RecordSequence {
    let records = (1..=120u64)
        .map(|attempt| {
            let day = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap()
                + chrono::Duration::days((attempt / 9) as i64);
            let date = day.and_hms_opt((attempt % 9) as u32 + 8, 15, 30).unwrap();
            let speed = 60.0 + (attempt % 17) as f64 + attempt as f64 / 10.0;
            let accuracy = 0.9 + (attempt % 11) as f64 / 110.0;
            let score = if attempt % 5 == 0 { 0 } else { attempt as u32 * 3 };
            Record::new(attempt, speed, accuracy, score, format!("{}/5", attempt % 5 + 1), date)
        })
        .collect();
    RecordSequence::new(records).unwrap()
}

#[test]
fn delimited_file_roundtrip_preserves_exact_fields() {
    let dir = tempdir().unwrap();
    let mut store = DelimitedFileStore::with_path(dir.path().join("races.txt"));
    let seq = history();
    store.save(&seq).unwrap();

    let loaded = store.load().unwrap();
    assert_eq!(loaded.attempts(), seq.attempts());
    assert_eq!(loaded.speeds(), seq.speeds());
    assert_eq!(loaded.scores(), seq.scores());
    assert_eq!(loaded.places(), seq.places());
    assert_eq!(loaded.dates(), seq.dates());
    for (a, b) in loaded.accuracies().iter().zip(seq.accuracies()) {
        assert!((a - b).abs() <= 0.0005, "{a} vs {b}");
    }
}

#[test]
fn file_to_database_import_keeps_history() {
    let dir = tempdir().unwrap();
    let mut file = DelimitedFileStore::with_path(dir.path().join("races.txt"));
    file.save(&history()).unwrap();

    let loaded = file.load().unwrap();
    let mut db = SqliteStore::open(dir.path().join("db").join("races.db")).unwrap();
    db.save(&loaded).unwrap();

    assert_eq!(db.load().unwrap(), loaded);
}

#[test]
fn every_chart_builds_from_a_loaded_history() {
    let seq = history();
    let cfg = AnalyticsConfig::default();
    let kinds = [
        ChartKind::Speed,
        ChartKind::Accuracy,
        ChartKind::SpeedHistogram,
        ChartKind::SpeedCounts,
        ChartKind::AccuracyHistogram,
        ChartKind::AccuracyByAttempt,
        ChartKind::SpeedByAttempt,
        ChartKind::SpeedVsAccuracy,
        ChartKind::DailyRaces,
        ChartKind::DailySpeed,
    ];
    for kind in kinds {
        let chart = kind.build(&seq, &cfg).unwrap();
        assert!(!chart.series.is_empty(), "{kind} has no series");
        serde_json::to_string(&chart).unwrap();
    }
}

#[test]
fn snap_and_gradual_share_pb_values() {
    let seq = history();
    let gradual = speed_chart(&seq, &AnalyticsConfig::default()).unwrap();
    let snap = speed_chart(
        &seq,
        &AnalyticsConfig {
            pb_mode: PbMode::Snap,
            ..AnalyticsConfig::default()
        },
    )
    .unwrap();
    assert_eq!(gradual.secondary_y_ticks, snap.secondary_y_ticks);
    assert_eq!(
        snap.series_named("PB's").unwrap().points.len(),
        gradual.series_named("PB's").unwrap().points.len() * 2
    );
}

#[test]
fn daily_buckets_conserve_races() {
    let seq = history();
    let buckets = aggregate(&seq);
    assert_eq!(buckets.iter().map(|b| b.count).sum::<usize>(), seq.len());
    assert!(buckets.windows(2).all(|w| w[0].date < w[1].date));
    for b in &buckets {
        assert!(b.worst_speed <= b.average_speed && b.average_speed <= b.best_speed);
    }
}
