//! Dataset discovery and fix document normalization.
//!
//! A dataset root holds one directory per route, one directory per accuracy
//! mode inside each route, and JSON fix documents inside each mode:
//!
//! ```text
//! <root>/route1/gps/1617712345.json
//! <root>/route1/high/1617712399.json
//! <root>/route2/gps/...
//! ```
//!
//! A fix document is either an object whose values are records or an array
//! of records. Records carry `lat`/`lng` or `Latitude`/`Longitude`.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{EvalError, Result};
use crate::{EvalConfig, GeoPoint};

/// The recorded fixes of one (route, mode, file) group, in document order.
#[derive(Debug, Clone, PartialEq)]
pub struct FixGroup {
    pub route_id: String,
    pub mode: String,
    /// File the fixes were read from
    pub source: PathBuf,
    pub fixes: Vec<GeoPoint>,
}

/// A file that could not be turned into a fix group.
#[derive(Debug)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: EvalError,
}

/// Everything discovered under a dataset root.
#[derive(Debug, Default)]
pub struct Dataset {
    /// Fix groups in route, mode, file-name order
    pub groups: Vec<FixGroup>,
    /// Files skipped because they could not be read or parsed
    pub failures: Vec<FileFailure>,
}

impl Dataset {
    pub fn fix_count(&self) -> usize {
        self.groups.iter().map(|g| g.fixes.len()).sum()
    }
}

/// Top-level shape of a fix document, inspected once at load time.
#[derive(Debug, Clone, PartialEq)]
pub enum FixDocument {
    /// Object of arbitrary keys to records, in file order
    Keyed(Vec<(String, Value)>),
    /// Array of records
    Listed(Vec<Value>),
}

/// Coordinate field conventions accepted in a record.
#[derive(Deserialize)]
#[serde(untagged)]
enum CoordinateRecord {
    Short {
        lat: f64,
        lng: f64,
    },
    Long {
        #[serde(rename = "Latitude")]
        latitude: f64,
        #[serde(rename = "Longitude")]
        longitude: f64,
    },
}

impl From<CoordinateRecord> for GeoPoint {
    fn from(record: CoordinateRecord) -> Self {
        match record {
            CoordinateRecord::Short { lat, lng } => GeoPoint::new(lat, lng),
            CoordinateRecord::Long {
                latitude,
                longitude,
            } => GeoPoint::new(latitude, longitude),
        }
    }
}

impl FixDocument {
    /// Classify a parsed JSON value.
    pub fn from_value(value: Value, source: &Path) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(FixDocument::Keyed(map.into_iter().collect())),
            Value::Array(items) => Ok(FixDocument::Listed(items)),
            other => Err(EvalError::InvalidDocument {
                file: source.to_path_buf(),
                reason: format!("expected an object or array, found {}", json_kind(&other)),
            }),
        }
    }

    /// Number of records in the document.
    pub fn len(&self) -> usize {
        match self {
            FixDocument::Keyed(entries) => entries.len(),
            FixDocument::Listed(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Normalize into fixes in document order.
    ///
    /// Any record without numeric coordinates fails the whole document.
    pub fn into_points(self, source: &Path) -> Result<Vec<GeoPoint>> {
        match self {
            FixDocument::Keyed(entries) => entries
                .into_iter()
                .map(|(key, record)| parse_record(record, key, source))
                .collect(),
            FixDocument::Listed(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, record)| parse_record(record, i.to_string(), source))
                .collect(),
        }
    }
}

fn parse_record(record: Value, index: String, source: &Path) -> Result<GeoPoint> {
    if !record.is_object() {
        return Err(EvalError::MalformedRecord {
            file: source.to_path_buf(),
            index,
            reason: format!("expected an object, found {}", json_kind(&record)),
        });
    }

    CoordinateRecord::deserialize(record)
        .map(GeoPoint::from)
        .map_err(|_| EvalError::MalformedRecord {
            file: source.to_path_buf(),
            index,
            reason: "expected numeric lat/lng or Latitude/Longitude fields".to_string(),
        })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Parse fix document text. `source` is only used in error reports.
pub fn parse_fix_document(content: &str, source: &Path) -> Result<Vec<GeoPoint>> {
    let value: Value = serde_json::from_str(content).map_err(|e| EvalError::Json {
        path: source.to_path_buf(),
        source: e,
    })?;
    FixDocument::from_value(value, source)?.into_points(source)
}

/// Read and normalize a single fix document.
pub fn load_fix_document(path: &Path) -> Result<Vec<GeoPoint>> {
    let content = fs::read_to_string(path).map_err(|e| EvalError::io(path, e))?;
    parse_fix_document(&content, path)
}

/// Sorted entries of a directory.
pub(crate) fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(|e| EvalError::io(dir, e))?
        .flatten()
        .map(|entry| entry.path())
        .collect();
    entries.sort();
    Ok(entries)
}

pub(crate) fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

pub(crate) fn is_json_file(path: &Path) -> bool {
    path.is_file() && path.extension().is_some_and(|ext| ext == "json")
}

/// Walk a dataset root and load every fix document.
///
/// Hidden directories are ignored. Any other route directory without a
/// matching route definition aborts discovery. Unconfigured mode directories
/// are skipped with a warning. Unreadable or malformed files are collected in
/// [`Dataset::failures`].
pub fn discover_dataset(root: &Path, config: &EvalConfig) -> Result<Dataset> {
    info!("[Ingest] Scanning dataset at {}", root.display());

    let mut dataset = Dataset::default();

    for route_dir in sorted_entries(root)? {
        if !route_dir.is_dir() {
            debug!("[Ingest] Ignoring non-directory {}", route_dir.display());
            continue;
        }

        let route_id = file_name(&route_dir);
        if route_id.starts_with('.') {
            debug!("[Ingest] Ignoring hidden directory {}", route_dir.display());
            continue;
        }
        if config.route(&route_id).is_none() {
            return Err(EvalError::UnknownRoute {
                directory: route_dir,
            });
        }

        let mode_dirs = match sorted_entries(&route_dir) {
            Ok(dirs) => dirs,
            Err(error) => {
                warn!("[Ingest] {}", error);
                dataset.failures.push(FileFailure {
                    path: route_dir,
                    error,
                });
                continue;
            }
        };

        for mode_dir in mode_dirs.into_iter().filter(|p| p.is_dir()) {
            let mode = file_name(&mode_dir);
            if config.mode(&mode).is_none() {
                warn!(
                    "[Ingest] Skipping unconfigured accuracy mode '{}' in {}",
                    mode,
                    route_dir.display()
                );
                continue;
            }

            load_mode_directory(&route_id, &mode, &mode_dir, &mut dataset);
        }
    }

    info!(
        "[Ingest] Loaded {} groups ({} fixes), {} files failed",
        dataset.groups.len(),
        dataset.fix_count(),
        dataset.failures.len()
    );

    Ok(dataset)
}

fn load_mode_directory(route_id: &str, mode: &str, dir: &Path, dataset: &mut Dataset) {
    let files = match sorted_entries(dir) {
        Ok(files) => files,
        Err(error) => {
            warn!("[Ingest] {}", error);
            dataset.failures.push(FileFailure {
                path: dir.to_path_buf(),
                error,
            });
            return;
        }
    };

    for path in files.into_iter().filter(|p| is_json_file(p)) {
        match load_fix_document(&path) {
            Ok(fixes) => {
                debug!("[Ingest] {} -> {} fixes", path.display(), fixes.len());
                dataset.groups.push(FixGroup {
                    route_id: route_id.to_string(),
                    mode: mode.to_string(),
                    source: path,
                    fixes,
                });
            }
            Err(error) => {
                warn!("[Ingest] Skipping file: {}", error);
                dataset.failures.push(FileFailure { path, error });
            }
        }
    }
}
