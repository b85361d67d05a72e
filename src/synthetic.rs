//! Synthetic fix generator for benchmarks and stress tests.
//!
//! Produces fix groups scattered around a route's reference points with a
//! known noise level per accuracy mode, so the resulting error populations
//! have predictable percentiles.
//!
//! Feature-gated behind `synthetic`.
//!
//! # Example
//!
//! ```rust
//! use fixeval::synthetic::SyntheticScenario;
//! use fixeval::{default_routes, AccuracyMode};
//!
//! let scenario = SyntheticScenario {
//!     route: default_routes().remove(0),
//!     modes: vec![(AccuracyMode::new("gps", "#EDB88B"), 5.0)],
//!     files_per_mode: 10,
//!     mismatch_every: None,
//!     seed: 42,
//! };
//!
//! let groups = scenario.generate();
//! assert_eq!(groups.len(), 10);
//! ```

use std::f64::consts::PI;
use std::path::PathBuf;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::ingest::FixGroup;
use crate::{AccuracyMode, GeoPoint, Route};

/// Approximate meters per degree of latitude.
const METERS_PER_DEGREE: f64 = 111_320.0;

/// Noisy fix groups around one route.
#[derive(Debug, Clone)]
pub struct SyntheticScenario {
    pub route: Route,
    /// Accuracy modes with their noise sigma in meters
    pub modes: Vec<(AccuracyMode, f64)>,
    pub files_per_mode: usize,
    /// Drop the last fix of every n-th file to provoke count mismatches
    pub mismatch_every: Option<usize>,
    pub seed: u64,
}

impl SyntheticScenario {
    /// Generate `files_per_mode` groups for every mode.
    pub fn generate(&self) -> Vec<FixGroup> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut groups = Vec::with_capacity(self.modes.len() * self.files_per_mode);

        for (mode, sigma) in &self.modes {
            for file in 0..self.files_per_mode {
                let mut fixes: Vec<GeoPoint> = self
                    .route
                    .points
                    .iter()
                    .map(|p| jitter(p, *sigma, &mut rng))
                    .collect();

                if let Some(n) = self.mismatch_every {
                    if n > 0 && file % n == n - 1 {
                        fixes.pop();
                    }
                }

                groups.push(FixGroup {
                    route_id: self.route.id.clone(),
                    mode: mode.label.clone(),
                    source: PathBuf::from(format!(
                        "{}/{}/{:06}.json",
                        self.route.id, mode.label, file
                    )),
                    fixes,
                });
            }
        }

        groups
    }
}

/// Standard normal sample (Box-Muller).
fn gaussian(rng: &mut StdRng) -> f64 {
    let u1: f64 = rng.random::<f64>().max(f64::MIN_POSITIVE);
    let u2: f64 = rng.random();
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}

/// Offset a point by Gaussian noise of `sigma` meters on each axis.
fn jitter(point: &GeoPoint, sigma: f64, rng: &mut StdRng) -> GeoPoint {
    let north = gaussian(rng) * sigma;
    let east = gaussian(rng) * sigma;
    let lng_scale = METERS_PER_DEGREE * point.latitude.to_radians().cos().max(1e-6);
    GeoPoint::new(
        point.latitude + north / METERS_PER_DEGREE,
        point.longitude + east / lng_scale,
    )
}
