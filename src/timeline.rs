//! Fix-count timelines for tracking strategy experiments.
//!
//! Each strategy directory holds snapshots named by their unix timestamp in
//! seconds (`<root>/<STRATEGY>/<unix_seconds>.json`). A snapshot records the
//! position at that moment, the device's cumulative GPS-fix counter and the
//! reported accuracy:
//!
//! ```json
//! { "lat": 51.447, "lng": 7.273, "gpsfix": 42, "accuracy": 12.5 }
//! ```

use std::fs;
use std::path::Path;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{EvalError, Result};
use crate::ingest::{file_name, is_json_file, sorted_entries, FileFailure};
use crate::{AccuracyMode, GeoPoint, TimelineConfig};

#[derive(Deserialize)]
struct RawSnapshot {
    lat: f64,
    lng: f64,
    gpsfix: u64,
    accuracy: f64,
}

/// One timestamped snapshot of a tracking strategy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixSnapshot {
    /// Unix timestamp in seconds, taken from the file name
    pub timestamp: i64,
    pub point: GeoPoint,
    /// Cumulative GPS-fix counter
    pub gps_fixes: u64,
    /// Reported accuracy radius in meters
    pub accuracy: f64,
}

/// A snapshot placed on its strategy's timeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimelineSample {
    pub timestamp: i64,
    /// Seconds since the strategy's first snapshot
    pub elapsed_secs: i64,
    pub point: GeoPoint,
    pub gps_fixes: u64,
    /// Fixes since the previous snapshot; the first sample reports its counter
    pub fix_delta: i64,
    pub accuracy: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineSeries {
    pub strategy: AccuracyMode,
    pub samples: Vec<TimelineSample>,
}

impl TimelineSeries {
    /// Order snapshots by timestamp and derive elapsed time and fix deltas.
    pub fn from_snapshots(strategy: &AccuracyMode, mut snapshots: Vec<FixSnapshot>) -> Self {
        snapshots.sort_by_key(|s| s.timestamp);

        let start = snapshots.first().map_or(0, |s| s.timestamp);
        let mut previous: Option<u64> = None;
        let samples = snapshots
            .into_iter()
            .map(|s| {
                let fix_delta = counter_delta(s.gps_fixes, previous.unwrap_or(0));
                previous = Some(s.gps_fixes);
                TimelineSample {
                    timestamp: s.timestamp,
                    elapsed_secs: s.timestamp - start,
                    point: s.point,
                    gps_fixes: s.gps_fixes,
                    fix_delta,
                    accuracy: s.accuracy,
                }
            })
            .collect();

        Self {
            strategy: strategy.clone(),
            samples,
        }
    }

    /// Fixes acquired over the whole series.
    pub fn total_fixes(&self) -> u64 {
        match (self.samples.first(), self.samples.last()) {
            (Some(first), Some(last)) => last.gps_fixes.saturating_sub(first.gps_fixes),
            _ => 0,
        }
    }

    /// Seconds between the first and last snapshot.
    pub fn duration_secs(&self) -> i64 {
        self.samples.last().map_or(0, |s| s.elapsed_secs)
    }
}

/// Signed change of a fix counter, saturating at the `i64` range.
fn counter_delta(current: u64, previous: u64) -> i64 {
    if current >= previous {
        i64::try_from(current - previous).unwrap_or(i64::MAX)
    } else {
        i64::try_from(previous - current).map_or(i64::MIN, |d| -d)
    }
}

/// Parse one snapshot document.
pub fn parse_snapshot(content: &str, timestamp: i64, source: &Path) -> Result<FixSnapshot> {
    let raw: RawSnapshot = serde_json::from_str(content).map_err(|e| EvalError::Json {
        path: source.to_path_buf(),
        source: e,
    })?;
    Ok(FixSnapshot {
        timestamp,
        point: GeoPoint::new(raw.lat, raw.lng),
        gps_fixes: raw.gpsfix,
        accuracy: raw.accuracy,
    })
}

/// Timelines for every configured strategy, plus the files that were skipped.
#[derive(Debug, Default)]
pub struct Timelines {
    pub series: Vec<TimelineSeries>,
    pub failures: Vec<FileFailure>,
}

/// Load the timeline of every configured strategy under `root`.
///
/// A missing strategy directory yields an empty series. Files whose stem is
/// not an integer timestamp are skipped.
pub fn load_timelines(root: &Path, config: &TimelineConfig) -> Result<Timelines> {
    if !root.is_dir() {
        return Err(EvalError::io(
            root,
            std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
        ));
    }

    let mut timelines = Timelines::default();

    for strategy in &config.strategies {
        let dir = root.join(&strategy.label);
        if !dir.is_dir() {
            warn!("[Timeline] No snapshots for {} in {}", strategy.label, root.display());
            timelines
                .series
                .push(TimelineSeries::from_snapshots(strategy, Vec::new()));
            continue;
        }

        let entries = match sorted_entries(&dir) {
            Ok(entries) => entries,
            Err(error) => {
                warn!("[Timeline] {}", error);
                timelines.failures.push(FileFailure { path: dir, error });
                timelines
                    .series
                    .push(TimelineSeries::from_snapshots(strategy, Vec::new()));
                continue;
            }
        };

        let mut snapshots = Vec::new();
        for path in entries.into_iter().filter(|p| is_json_file(p)) {
            let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("");
            let Ok(timestamp) = stem.parse::<i64>() else {
                warn!("[Timeline] Skipping {}: name is not a timestamp", file_name(&path));
                continue;
            };

            let loaded = fs::read_to_string(&path)
                .map_err(|e| EvalError::io(&path, e))
                .and_then(|content| parse_snapshot(&content, timestamp, &path));
            match loaded {
                Ok(snapshot) => snapshots.push(snapshot),
                Err(error) => {
                    warn!("[Timeline] Skipping file: {}", error);
                    timelines.failures.push(FileFailure { path, error });
                }
            }
        }

        debug!("[Timeline] {}: {} snapshots", strategy.label, snapshots.len());
        timelines
            .series
            .push(TimelineSeries::from_snapshots(strategy, snapshots));
    }

    info!(
        "[Timeline] Loaded {} strategies, {} files failed",
        timelines.series.len(),
        timelines.failures.len()
    );

    Ok(timelines)
}
