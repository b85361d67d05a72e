//! # fixeval
//!
//! Positional accuracy evaluation for recorded location fixes.
//!
//! This library provides:
//! - Great-circle error distances between recorded fixes and reference points
//! - Per-accuracy-mode error populations with empirical CDFs and percentiles
//! - Dataset ingestion for keyed and listed JSON fix documents
//! - CDF charts and map overlays (GeoJSON / Leaflet HTML)
//! - Fix-count timelines for tracking strategy experiments
//!
//! ## Features
//!
//! - **`parallel`** - Evaluate fix groups in parallel with rayon
//! - **`synthetic`** - Synthetic noisy fix generator for benchmarks
//!
//! ## Quick Start
//!
//! ```rust
//! use fixeval::{AccuracyMode, ErrorAggregator, GeoPoint, Route};
//! use fixeval::aggregate::evaluate_group;
//! use fixeval::ingest::FixGroup;
//!
//! let route = Route::new(
//!     "route1",
//!     vec![GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 1.0), GeoPoint::new(0.0, 2.0)],
//! );
//! let group = FixGroup {
//!     route_id: "route1".to_string(),
//!     mode: "gps".to_string(),
//!     source: "route1/gps/a.json".into(),
//!     fixes: route.points.clone(),
//! };
//!
//! let mut aggregator = ErrorAggregator::new(&[AccuracyMode::new("gps", "#EDB88B")]);
//! let outcome = evaluate_group(&route, &group);
//! aggregator.accumulate_outcome(&outcome).unwrap();
//!
//! let summary = &aggregator.summaries()[0];
//! assert_eq!(summary.percentiles.unwrap().p95, 0.0);
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{EvalError, OptionExt, Result};

// Geographic utilities (haversine distance, bounds)
pub mod geo_utils;

// Empirical CDF and percentile interpolation
pub mod stats;
pub use stats::{CdfPoint, EmpiricalCdf, PercentileSummary};

// Fix/reference pairing and per-mode accumulation
pub mod aggregate;
#[cfg(feature = "parallel")]
pub use aggregate::evaluate_groups_parallel;
pub use aggregate::{
    evaluate_group, evaluate_groups, pair_with_reference, run_evaluation, CountMismatch,
    ErrorAggregator, EvaluatedFix, Evaluation, GroupOutcome, ModeSummary,
};

// Dataset discovery and JSON document normalization
pub mod ingest;
pub use ingest::{
    discover_dataset, load_fix_document, parse_fix_document, Dataset, FileFailure, FixDocument,
    FixGroup,
};

// Charts and map overlays
pub mod render;

// Fix-count timelines for tracking strategies
pub mod timeline;
pub use timeline::{load_timelines, FixSnapshot, TimelineSample, TimelineSeries, Timelines};

// Synthetic fixes for benchmarks and stress tests
#[cfg(feature = "synthetic")]
pub mod synthetic;

// ============================================================================
// Core Types
// ============================================================================

/// A coordinate in degrees.
///
/// Used both for reference points on a route and for recorded fixes.
///
/// # Example
/// ```
/// use fixeval::GeoPoint;
/// let point = GeoPoint::new(51.48219, 7.21652); // Bochum
/// assert!(point.is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Check if the point has finite, in-range coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

impl From<(f64, f64)> for GeoPoint {
    fn from((latitude, longitude): (f64, f64)) -> Self {
        Self::new(latitude, longitude)
    }
}

/// Bounding box of a set of points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl Bounds {
    /// Center point of the bounds.
    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lng + self.max_lng) / 2.0,
        )
    }
}

/// A ground-truth path: the ordered reference points fixes are paired against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    /// Route identifier, also the name of the route's dataset directory
    pub id: String,
    /// Human-readable place name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Reference points in pairing order
    pub points: Vec<GeoPoint>,
}

impl Route {
    pub fn new(id: &str, points: Vec<GeoPoint>) -> Self {
        Self {
            id: id.to_string(),
            name: None,
            points,
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Number of fixes a group must contain to be paired with this route.
    pub fn reference_count(&self) -> usize {
        self.points.len()
    }
}

/// A measurement strategy whose fixes form one error population.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccuracyMode {
    /// Label, also the name of the mode's dataset directory
    pub label: String,
    /// Display color as `#RRGGBB`
    pub color: String,
}

impl AccuracyMode {
    pub fn new(label: &str, color: &str) -> Self {
        Self {
            label: label.to_string(),
            color: color.to_string(),
        }
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// Routes and accuracy modes for an evaluation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalConfig {
    /// Reference routes, keyed by `Route::id`
    pub routes: Vec<Route>,
    /// Accuracy modes in reporting order
    pub modes: Vec<AccuracyMode>,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            routes: default_routes(),
            modes: vec![
                AccuracyMode::new("high", "#EF3E36"),
                AccuracyMode::new("balanced", "#17BEBB"),
                AccuracyMode::new("gps", "#EDB88B"),
                AccuracyMode::new("gps_high", "#32A852"),
            ],
        }
    }
}

impl EvalConfig {
    /// Load and validate a configuration from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| EvalError::io(path, e))?;
        let config: EvalConfig =
            serde_json::from_str(&content).map_err(|source| EvalError::Json {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that cannot be evaluated unambiguously.
    pub fn validate(&self) -> Result<()> {
        let mut route_ids = HashSet::new();
        for route in &self.routes {
            if route.points.is_empty() {
                return Err(EvalError::Config(format!(
                    "route '{}' has no reference points",
                    route.id
                )));
            }
            if let Some(bad) = route.points.iter().position(|p| !p.is_valid()) {
                return Err(EvalError::Config(format!(
                    "route '{}' has an invalid reference point at index {}",
                    route.id, bad
                )));
            }
            if !route_ids.insert(route.id.as_str()) {
                return Err(EvalError::Config(format!(
                    "duplicate route id '{}'",
                    route.id
                )));
            }
        }

        let mut labels = HashSet::new();
        for mode in &self.modes {
            if !labels.insert(mode.label.as_str()) {
                return Err(EvalError::Config(format!(
                    "duplicate accuracy mode '{}'",
                    mode.label
                )));
            }
        }

        if self.modes.is_empty() {
            return Err(EvalError::Config("no accuracy modes configured".into()));
        }

        Ok(())
    }

    /// Pretty-printed JSON accepted by [`EvalConfig::from_json_file`].
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| EvalError::Config(e.to_string()))
    }

    pub fn route(&self, id: &str) -> Option<&Route> {
        self.routes.iter().find(|r| r.id == id)
    }

    pub fn mode(&self, label: &str) -> Option<&AccuracyMode> {
        self.modes.iter().find(|m| m.label == label)
    }
}

/// Tracking strategies compared in fix-count timelines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineConfig {
    /// Strategies in reporting order; labels double as directory names
    pub strategies: Vec<AccuracyMode>,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            strategies: vec![
                AccuracyMode::new("DISTANCE", "#EF3E36"),
                AccuracyMode::new("PERIODIC", "#17BEBB"),
                AccuracyMode::new("SLEEP_AWARE", "#EDB88B"),
                AccuracyMode::new("SLEEP_AWARE_MOTION", "#8A6642"),
                AccuracyMode::new("SPEED", "#32A852"),
            ],
        }
    }
}

impl TimelineConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| EvalError::io(path, e))?;
        let config: TimelineConfig =
            serde_json::from_str(&content).map_err(|source| EvalError::Json {
                path: path.to_path_buf(),
                source,
            })?;
        if config.strategies.is_empty() {
            return Err(EvalError::Config("no tracking strategies configured".into()));
        }
        Ok(config)
    }

    /// Pretty-printed JSON accepted by [`TimelineConfig::from_json_file`].
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| EvalError::Config(e.to_string()))
    }
}

fn route_from(id: &str, name: &str, points: &[(f64, f64)]) -> Route {
    Route::new(id, points.iter().copied().map(GeoPoint::from).collect()).with_name(name)
}

/// Built-in reference routes walked during the field measurements.
pub fn default_routes() -> Vec<Route> {
    vec![
        route_from(
            "route1",
            "Bochum Citypoint",
            &[
                (51.48219, 7.21652),
                (51.4822, 7.21686),
                (51.4821, 7.21719),
                (51.48174, 7.2173),
                (51.48136, 7.21724),
                (51.48073, 7.21715),
                (51.4804, 7.21711),
                (51.48019, 7.21651),
            ],
        ),
        route_from(
            "route2",
            "Bochum Hbf",
            &[
                (51.47938, 7.22209),
                (51.47923, 7.22229),
                (51.47912, 7.22252),
                (51.47888, 7.22279),
                (51.47845, 7.22331),
                (51.47807, 7.22376),
                (51.47789, 7.22352),
                (51.4777, 7.22276),
                (51.47807, 7.22227),
                (51.47837, 7.22193),
            ],
        ),
        route_from(
            "route3",
            "Bochum Querenburg",
            &[
                (51.46154, 7.27469),
                (51.46179, 7.27643),
                (51.46106, 7.27863),
                (51.46011, 7.28052),
                (51.45937, 7.28211),
                (51.45936, 7.2836),
            ],
        ),
        route_from(
            "route4",
            "Mülheim an der Ruhr",
            &[
                (51.42779, 6.88152),
                (51.42844, 6.88298),
                (51.42894, 6.88485),
                (51.42953, 6.88671),
                (51.43044, 6.88661),
                (51.43176, 6.88676),
                (51.43183, 6.8886),
                (51.43321, 6.88873),
            ],
        ),
    ]
}
