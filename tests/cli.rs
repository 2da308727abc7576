use assert_cmd::Command;
use tempfile::{tempdir, TempDir};

const RACES: &str = "\
6;95;1;210;1/4;2024-03-03 20:00:00
5;88;0.97;180;2/4;2024-03-03 19:00:00
4;91;0.985;N/A;1/3;2024-03-02 12:00:00
3;80;0.955;150;3/5;2024-03-01 11:00:00
2;85;0.96;160;2/5;2024-03-01 10:00:00
1;70;0.91;120;4/5;2024-03-01 09:00:00
";

fn race_file(dir: &TempDir, body: &str) -> std::path::PathBuf {
    let path = dir.path().join("races.txt");
    std::fs::write(&path, body).unwrap();
    path
}

fn racetrend(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("racetrend").unwrap();
    cmd.env("HOME", dir.path())
        .arg("--config")
        .arg(dir.path().join("config.json"));
    cmd
}

fn json(output: &[u8]) -> serde_json::Value {
    serde_json::from_slice(output).unwrap()
}

#[test]
fn speed_chart_is_printed_as_json() {
    let dir = tempdir().unwrap();
    // score "N/A" is not valid in a stored file
    let file = race_file(&dir, &RACES.replace("N/A", "0"));

    let out = racetrend(&dir)
        .arg("--file")
        .arg(&file)
        .args(["chart", "speed", "--pb-mode", "snap", "--window", "3"])
        .output()
        .unwrap();
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let chart = json(&out.stdout);
    assert_eq!(chart["kind"], "speed");
    let names: Vec<_> = chart["series"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap().to_string())
        .collect();
    assert!(names.contains(&"PB's".to_string()));
    assert!(names.contains(&"Average of 3".to_string()));
    assert_eq!(
        chart["secondary_y_ticks"],
        serde_json::json!([70.0, 85.0, 91.0, 95.0])
    );
}

#[test]
fn daily_summary_counts_every_race() {
    let dir = tempdir().unwrap();
    let file = race_file(&dir, &RACES.replace("N/A", "0"));

    let out = racetrend(&dir)
        .arg("--file")
        .arg(&file)
        .arg("daily")
        .output()
        .unwrap();
    assert!(out.status.success());

    let days = json(&out.stdout);
    let days = days.as_array().unwrap();
    assert_eq!(days.len(), 3);
    assert_eq!(days[0]["date"], "2024-03-01");
    assert_eq!(days[0]["count"], 3);
    assert_eq!(days[0]["best_speed"], 85.0);
    assert_eq!(days[0]["worst_speed"], 70.0);
}

#[test]
fn import_then_read_from_database() {
    let dir = tempdir().unwrap();
    let file = race_file(&dir, &RACES.replace("N/A", "0"));
    let db = dir.path().join("races.db");

    racetrend(&dir)
        .arg("--file")
        .arg(&file)
        .arg("import")
        .arg("--to")
        .arg(&db)
        .assert()
        .success();

    let out = racetrend(&dir)
        .arg("--db")
        .arg(&db)
        .arg("summary")
        .output()
        .unwrap();
    assert!(out.status.success());
    let summary = json(&out.stdout);
    assert_eq!(summary["races"], 6);
    assert_eq!(summary["best_speed"], 95.0);
    assert_eq!(summary["personal_bests"], 4);
}

#[test]
fn animation_plan_is_reported() {
    let dir = tempdir().unwrap();
    let file = race_file(&dir, &RACES.replace("N/A", "0"));

    let out = racetrend(&dir)
        .arg("--file")
        .arg(&file)
        .args(["animate", "accuracy", "--duration", "2"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let anim = json(&out.stdout);
    assert_eq!(anim["plan"]["frame_step"], 1);
    assert_eq!(anim["plan"]["frame_count"], 6);
    assert_eq!(anim["plan"]["fps"], 3);
    assert_eq!(anim["frames"].as_array().unwrap().len(), 6);
}

#[test]
fn malformed_file_fails() {
    let dir = tempdir().unwrap();
    let file = race_file(&dir, RACES);

    racetrend(&dir)
        .arg("--file")
        .arg(&file)
        .arg("daily")
        .assert()
        .failure();
}
