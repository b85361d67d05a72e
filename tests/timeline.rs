//! Tests for timeline module

use std::fs;
use std::path::Path;

use fixeval::timeline::*;
use fixeval::{AccuracyMode, EvalError, GeoPoint, TimelineConfig};
use tempdir::TempDir;

fn snapshot(timestamp: i64, gps_fixes: u64) -> FixSnapshot {
    FixSnapshot {
        timestamp,
        point: GeoPoint::new(51.447, 7.273),
        gps_fixes,
        accuracy: 10.0,
    }
}

fn write_snapshot(dir: &Path, name: &str, gps_fixes: u64) {
    fs::create_dir_all(dir).unwrap();
    fs::write(
        dir.join(name),
        format!(
            r#"{{"lat": 51.447, "lng": 7.273, "gpsfix": {}, "accuracy": 12.5}}"#,
            gps_fixes
        ),
    )
    .unwrap();
}

#[test]
fn test_series_from_unordered_snapshots() {
    let strategy = AccuracyMode::new("PERIODIC", "#17BEBB");
    let series = TimelineSeries::from_snapshots(
        &strategy,
        vec![snapshot(1_000_060, 9), snapshot(1_000_000, 4), snapshot(1_000_030, 6)],
    );

    let elapsed: Vec<i64> = series.samples.iter().map(|s| s.elapsed_secs).collect();
    let deltas: Vec<i64> = series.samples.iter().map(|s| s.fix_delta).collect();
    assert_eq!(elapsed, vec![0, 30, 60]);
    assert_eq!(deltas, vec![4, 2, 3]);
    assert_eq!(series.total_fixes(), 5);
    assert_eq!(series.duration_secs(), 60);
}

#[test]
fn test_counter_reset_gives_negative_delta() {
    let strategy = AccuracyMode::new("SPEED", "#32A852");
    let series =
        TimelineSeries::from_snapshots(&strategy, vec![snapshot(10, 8), snapshot(20, 2)]);
    assert_eq!(series.samples[1].fix_delta, -6);
    assert_eq!(series.total_fixes(), 0);
}

#[test]
fn test_empty_series() {
    let strategy = AccuracyMode::new("DISTANCE", "#EF3E36");
    let series = TimelineSeries::from_snapshots(&strategy, Vec::new());
    assert!(series.samples.is_empty());
    assert_eq!(series.total_fixes(), 0);
    assert_eq!(series.duration_secs(), 0);
}

#[test]
fn test_parse_snapshot() {
    let s = parse_snapshot(
        r#"{"lat": 1.0, "lng": 2.0, "gpsfix": 3, "accuracy": 4.5}"#,
        77,
        Path::new("77.json"),
    )
    .unwrap();
    assert_eq!(s.timestamp, 77);
    assert_eq!(s.point, GeoPoint::new(1.0, 2.0));
    assert_eq!(s.gps_fixes, 3);
    assert_eq!(s.accuracy, 4.5);

    assert!(matches!(
        parse_snapshot(r#"{"lat": 1.0}"#, 1, Path::new("1.json")),
        Err(EvalError::Json { .. })
    ));
}

#[test]
fn test_load_timelines() {
    let root = TempDir::new("timeline-load").unwrap();
    let periodic = root.path().join("PERIODIC");
    write_snapshot(&periodic, "1617712400.json", 3);
    write_snapshot(&periodic, "1617712345.json", 1);
    write_snapshot(&periodic, "latest.json", 99);
    fs::write(periodic.join("1617712500.json"), "{").unwrap();

    let config = TimelineConfig {
        strategies: vec![
            AccuracyMode::new("PERIODIC", "#17BEBB"),
            AccuracyMode::new("SPEED", "#32A852"),
        ],
    };
    let timelines = load_timelines(root.path(), &config).unwrap();

    assert_eq!(timelines.series.len(), 2);
    let periodic = &timelines.series[0];
    assert_eq!(periodic.strategy.label, "PERIODIC");
    assert_eq!(periodic.samples.len(), 2);
    assert_eq!(periodic.samples[0].timestamp, 1617712345);
    assert_eq!(periodic.samples[1].elapsed_secs, 55);
    assert_eq!(periodic.samples[1].fix_delta, 2);

    // Missing strategy directory yields an empty series
    assert!(timelines.series[1].samples.is_empty());
    assert_eq!(timelines.failures.len(), 1);
}

#[test]
fn test_load_timelines_missing_root() {
    let result = load_timelines(Path::new("/nonexistent/fixeval"), &TimelineConfig::default());
    assert!(matches!(result, Err(EvalError::Io { .. })));
}

#[test]
fn test_large_counters_do_not_wrap() {
    let strategy = AccuracyMode::new("PERIODIC", "#17BEBB");
    let series = TimelineSeries::from_snapshots(
        &strategy,
        vec![
            snapshot(0, u64::MAX - 10),
            snapshot(10, u64::MAX),
            snapshot(20, 0),
        ],
    );
    // First delta reports the counter itself, saturated to i64
    assert_eq!(series.samples[0].fix_delta, i64::MAX);
    assert_eq!(series.samples[1].fix_delta, 10);
    assert_eq!(series.samples[2].fix_delta, i64::MIN);
}

#[cfg(unix)]
#[test]
fn test_unreadable_strategy_directory_stays_local() {
    use std::os::unix::fs::PermissionsExt;

    let root = TempDir::new("timeline-unreadable").unwrap();
    let locked = root.path().join("DISTANCE");
    write_snapshot(&locked, "100.json", 1);
    write_snapshot(&root.path().join("SPEED"), "100.json", 5);
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // Privileged users can still list the directory
    if fs::read_dir(&locked).is_ok() {
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let config = TimelineConfig {
        strategies: vec![
            AccuracyMode::new("DISTANCE", "#EF3E36"),
            AccuracyMode::new("SPEED", "#32A852"),
        ],
    };
    let timelines = load_timelines(root.path(), &config).unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    assert_eq!(timelines.series.len(), 2);
    assert!(timelines.series[0].samples.is_empty());
    assert_eq!(timelines.series[1].samples.len(), 1);
    assert_eq!(timelines.failures.len(), 1);
    assert_eq!(timelines.failures[0].path, locked);
    assert!(matches!(timelines.failures[0].error, EvalError::Io { .. }));
}
