//! Empirical CDF and percentile interpolation over error populations.
//!
//! A CDF is always rebuilt from the full sample set; there is no incremental
//! update path.

use serde::{Deserialize, Serialize};

/// One step of an empirical CDF.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CdfPoint {
    /// Error distance in meters
    pub distance: f64,
    /// Cumulative fraction in [0, 1]
    pub fraction: f64,
}

/// Error distance at the median and the 95th percentile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PercentileSummary {
    pub p50: f64,
    pub p95: f64,
}

/// Sorted error distances paired with their cumulative fractions.
///
/// For `N > 1` samples the i-th sorted value gets fraction `i / (N - 1)`, so
/// the curve starts at 0 and ends at 1. A single sample yields the one-point
/// curve `[(x, 1.0)]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmpiricalCdf {
    points: Vec<CdfPoint>,
}

impl EmpiricalCdf {
    /// Build the CDF of `samples`. Returns `None` for an empty population.
    ///
    /// # Example
    /// ```
    /// use fixeval::EmpiricalCdf;
    ///
    /// let cdf = EmpiricalCdf::from_samples(&[3.0, 1.0, 2.0]).unwrap();
    /// assert_eq!(cdf.fractions(), vec![0.0, 0.5, 1.0]);
    /// assert_eq!(cdf.percentile(0.5), 2.0);
    /// ```
    pub fn from_samples(samples: &[f64]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }

        let mut sorted = samples.to_vec();
        sorted.sort_by(f64::total_cmp);

        if sorted.len() == 1 {
            return Some(Self {
                points: vec![CdfPoint {
                    distance: sorted[0],
                    fraction: 1.0,
                }],
            });
        }

        let last = (sorted.len() - 1) as f64;
        let points = sorted
            .into_iter()
            .enumerate()
            .map(|(i, distance)| CdfPoint {
                distance,
                fraction: i as f64 / last,
            })
            .collect();

        Some(Self { points })
    }

    pub fn points(&self) -> &[CdfPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Sorted error distances.
    pub fn distances(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.distance).collect()
    }

    pub fn fractions(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.fraction).collect()
    }

    /// Largest error distance in the population.
    pub fn max_distance(&self) -> f64 {
        self.points.last().map_or(0.0, |p| p.distance)
    }

    /// Error distance at which the CDF reaches fraction `q`.
    ///
    /// Linearly interpolates between neighbouring steps. Fractions below the
    /// first step or above the last clamp to the end values. A NaN fraction
    /// or a curve without steps yields NaN.
    pub fn percentile(&self, q: f64) -> f64 {
        let (Some(&first), Some(&last)) = (self.points.first(), self.points.last()) else {
            return f64::NAN;
        };
        if q.is_nan() {
            return f64::NAN;
        }
        if q <= first.fraction {
            return first.distance;
        }
        if q >= last.fraction {
            return last.distance;
        }

        // First step whose fraction is >= q; index >= 1 after the clamps above
        let upper = self.points.partition_point(|p| p.fraction < q);
        let hi = self.points[upper];
        if hi.fraction == q {
            return hi.distance;
        }
        let lo = self.points[upper - 1];

        let span = hi.fraction - lo.fraction;
        if span <= 0.0 {
            return hi.distance;
        }
        let ratio = (q - lo.fraction) / span;
        lo.distance + ratio * (hi.distance - lo.distance)
    }

    pub fn summary(&self) -> PercentileSummary {
        PercentileSummary {
            p50: self.percentile(0.5),
            p95: self.percentile(0.95),
        }
    }
}
