//! Geographic utilities: great-circle distance and bounding boxes.

use crate::{Bounds, GeoPoint};

/// Sphere radius used for all error distances, in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_372_800.0;

/// Great-circle distance between two points in meters (haversine formula).
///
/// The result is symmetric and zero for identical points. Inputs are not
/// validated: a NaN or infinite coordinate yields NaN.
///
/// # Example
/// ```
/// use fixeval::GeoPoint;
/// use fixeval::geo_utils::haversine_distance;
///
/// let a = GeoPoint::new(0.0, 0.0);
/// let b = GeoPoint::new(0.0, 1.0);
/// let d = haversine_distance(&a, &b);
/// assert!((d - 111_226.3).abs() < 1.0);
/// ```
pub fn haversine_distance(p1: &GeoPoint, p2: &GeoPoint) -> f64 {
    let phi1 = p1.latitude.to_radians();
    let phi2 = p2.latitude.to_radians();
    let d_phi = (p2.latitude - p1.latitude).to_radians();
    let d_lambda = (p2.longitude - p1.longitude).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    // Rounding can push `a` past 1 near antipodes; NaN still passes through
    let a = a.clamp(0.0, 1.0);

    2.0 * EARTH_RADIUS_METERS * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Bounding box of a set of points, `None` when empty.
pub fn compute_bounds(points: &[GeoPoint]) -> Option<Bounds> {
    let first = points.first()?;
    let seed = Bounds {
        min_lat: first.latitude,
        max_lat: first.latitude,
        min_lng: first.longitude,
        max_lng: first.longitude,
    };

    Some(points.iter().skip(1).fold(seed, |b, p| Bounds {
        min_lat: b.min_lat.min(p.latitude),
        max_lat: b.max_lat.max(p.latitude),
        min_lng: b.min_lng.min(p.longitude),
        max_lng: b.max_lng.max(p.longitude),
    }))
}
