//! Tests for stats module

use fixeval::EmpiricalCdf;

fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
    (a - b).abs() < epsilon
}

#[test]
fn test_empty_population_has_no_cdf() {
    assert!(EmpiricalCdf::from_samples(&[]).is_none());
}

#[test]
fn test_singleton_population() {
    let cdf = EmpiricalCdf::from_samples(&[4.2]).unwrap();
    assert_eq!(cdf.len(), 1);
    assert_eq!(cdf.fractions(), vec![1.0]);
    assert_eq!(cdf.percentile(0.0), 4.2);
    assert_eq!(cdf.percentile(0.5), 4.2);
    assert_eq!(cdf.percentile(0.95), 4.2);
}

#[test]
fn test_fractions_span_zero_to_one() {
    let samples = [12.0, 3.5, 7.25, 0.5, 99.0, 7.25, 41.0];
    let cdf = EmpiricalCdf::from_samples(&samples).unwrap();
    let fractions = cdf.fractions();

    assert_eq!(fractions.len(), samples.len());
    assert_eq!(fractions[0], 0.0);
    assert_eq!(*fractions.last().unwrap(), 1.0);
    assert!(fractions.windows(2).all(|w| w[0] <= w[1]));

    let distances = cdf.distances();
    assert!(distances.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(distances[0], 0.5);
    assert_eq!(cdf.max_distance(), 99.0);
}

#[test]
fn test_percentile_at_step_returns_sample() {
    let samples = [0.1, 0.3, 0.7, 1.9, 2.2, 8.8, 13.0, 21.4, 30.3, 55.5, 77.7];
    let cdf = EmpiricalCdf::from_samples(&samples).unwrap();
    for point in cdf.points() {
        assert_eq!(cdf.percentile(point.fraction), point.distance);
    }
}

#[test]
fn test_percentile_interpolates() {
    // Fractions 0, 1/3, 2/3, 1
    let cdf = EmpiricalCdf::from_samples(&[30.0, 0.0, 10.0, 20.0]).unwrap();
    assert!(approx_eq(cdf.percentile(0.5), 15.0, 1e-9));
    assert!(approx_eq(cdf.percentile(0.95), 28.5, 1e-9));
    assert!(approx_eq(cdf.summary().p50, 15.0, 1e-9));
}

#[test]
fn test_percentile_clamps() {
    let cdf = EmpiricalCdf::from_samples(&[1.0, 2.0, 3.0]).unwrap();
    assert_eq!(cdf.percentile(-0.5), 1.0);
    assert_eq!(cdf.percentile(1.5), 3.0);
    assert!(cdf.percentile(f64::NAN).is_nan());
}

#[test]
fn test_all_zero_samples() {
    let cdf = EmpiricalCdf::from_samples(&[0.0, 0.0, 0.0]).unwrap();
    let points: Vec<(f64, f64)> = cdf.points().iter().map(|p| (p.distance, p.fraction)).collect();
    assert_eq!(points, vec![(0.0, 0.0), (0.0, 0.5), (0.0, 1.0)]);

    let summary = cdf.summary();
    assert_eq!(summary.p50, 0.0);
    assert_eq!(summary.p95, 0.0);
}

#[test]
fn test_duplicate_values() {
    let cdf = EmpiricalCdf::from_samples(&[5.0, 5.0, 5.0, 10.0, 10.0]).unwrap();
    assert_eq!(cdf.percentile(0.5), 5.0);
    assert_eq!(cdf.percentile(1.0), 10.0);
}

#[test]
fn test_input_order_does_not_matter() {
    let a = EmpiricalCdf::from_samples(&[3.0, 1.0, 2.0, 9.0]).unwrap();
    let b = EmpiricalCdf::from_samples(&[9.0, 2.0, 1.0, 3.0]).unwrap();
    assert_eq!(a, b);
}
