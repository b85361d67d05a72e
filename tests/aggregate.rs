//! Tests for aggregate module

use std::path::PathBuf;

use fixeval::aggregate::*;
use fixeval::ingest::FixGroup;
use fixeval::{AccuracyMode, EvalConfig, EvalError, GeoPoint, Route};

fn equator_route() -> Route {
    Route::new(
        "route1",
        vec![
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(0.0, 1.0),
            GeoPoint::new(0.0, 2.0),
        ],
    )
}

fn config() -> EvalConfig {
    EvalConfig {
        routes: vec![equator_route()],
        modes: vec![
            AccuracyMode::new("gps", "#EDB88B"),
            AccuracyMode::new("balanced", "#17BEBB"),
        ],
    }
}

fn group(mode: &str, file: &str, fixes: Vec<GeoPoint>) -> FixGroup {
    FixGroup {
        route_id: "route1".to_string(),
        mode: mode.to_string(),
        source: PathBuf::from(format!("route1/{}/{}", mode, file)),
        fixes,
    }
}

#[test]
fn test_pair_exact_fixes() {
    let route = equator_route();
    let samples = pair_with_reference(&route, &route.points, &PathBuf::from("a.json")).unwrap();
    assert_eq!(samples, vec![0.0, 0.0, 0.0]);
}

#[test]
fn test_pair_by_ordinal_position() {
    let route = equator_route();
    // Second fix sits on the third reference point
    let fixes = vec![
        GeoPoint::new(0.0, 0.0),
        GeoPoint::new(0.0, 2.0),
        GeoPoint::new(0.0, 2.0),
    ];
    let samples = pair_with_reference(&route, &fixes, &PathBuf::from("a.json")).unwrap();
    assert_eq!(samples[0], 0.0);
    assert!((samples[1] - 111_226.3).abs() < 1.0);
    assert_eq!(samples[2], 0.0);
}

#[test]
fn test_pair_count_mismatch() {
    let route = equator_route();
    let fixes = vec![GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 1.0)];
    let err = pair_with_reference(&route, &fixes, &PathBuf::from("short.json")).unwrap_err();
    match err {
        EvalError::GroupCountMismatch {
            file,
            observed,
            expected,
        } => {
            assert_eq!(file, PathBuf::from("short.json"));
            assert_eq!(observed, 2);
            assert_eq!(expected, 3);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_evaluate_group_flags_mismatch_for_display() {
    let route = equator_route();
    let short = group("gps", "short.json", vec![GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 1.0)]);
    let outcome = evaluate_group(&route, &short);

    assert!(!outcome.is_paired());
    assert_eq!(
        outcome.mismatch,
        Some(CountMismatch {
            observed: 2,
            expected: 3
        })
    );
    assert_eq!(outcome.fixes.len(), 2);
    assert!(outcome.fixes.iter().all(|f| f.distance.is_none() && f.reference.is_none()));
    assert!(outcome.samples().is_empty());
    assert!(matches!(
        outcome.mismatch_error(),
        Some(EvalError::GroupCountMismatch { .. })
    ));
}

#[test]
fn test_mismatch_contributes_no_samples() {
    let config = config();
    let groups = vec![group(
        "gps",
        "short.json",
        vec![GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 1.0)],
    )];

    let evaluation = run_evaluation(&groups, &config).unwrap();
    assert_eq!(evaluation.mismatches().count(), 1);
    assert_eq!(evaluation.aggregator.samples("gps").unwrap().len(), 0);
    assert!(matches!(
        evaluation.aggregator.cdf("gps"),
        Err(EvalError::EmptyPopulation { .. })
    ));
}

#[test]
fn test_exact_route_scenario() {
    let config = config();
    let groups = vec![group("gps", "exact.json", equator_route().points)];

    let evaluation = run_evaluation(&groups, &config).unwrap();
    assert_eq!(evaluation.aggregator.samples("gps").unwrap(), &[0.0, 0.0, 0.0]);

    let cdf = evaluation.aggregator.cdf("gps").unwrap();
    let points: Vec<(f64, f64)> = cdf.points().iter().map(|p| (p.distance, p.fraction)).collect();
    assert_eq!(points, vec![(0.0, 0.0), (0.0, 0.5), (0.0, 1.0)]);

    let summaries = evaluation.aggregator.summaries();
    let gps = summaries.iter().find(|s| s.mode.label == "gps").unwrap();
    let p = gps.percentiles.unwrap();
    assert_eq!(p.p50, 0.0);
    assert_eq!(p.p95, 0.0);
}

#[test]
fn test_summaries_follow_configured_order() {
    let config = config();
    let groups = vec![group("balanced", "a.json", equator_route().points)];
    let evaluation = run_evaluation(&groups, &config).unwrap();

    let summaries = evaluation.aggregator.summaries();
    let labels: Vec<&str> = summaries.iter().map(|s| s.mode.label.as_str()).collect();
    assert_eq!(labels, vec!["gps", "balanced"]);

    // Empty mode reports no data instead of a degenerate curve
    assert_eq!(summaries[0].sample_count, 0);
    assert!(summaries[0].cdf.is_none());
    assert!(summaries[0].percentiles.is_none());
    assert_eq!(summaries[1].sample_count, 3);
}

#[test]
fn test_repeated_groups_are_not_deduplicated() {
    let config = config();
    let exact = group("gps", "a.json", equator_route().points);
    let groups = vec![exact.clone(), exact];
    let evaluation = run_evaluation(&groups, &config).unwrap();
    assert_eq!(evaluation.aggregator.samples("gps").unwrap().len(), 6);
}

#[test]
fn test_unknown_route_is_fatal() {
    let config = config();
    let mut stray = group("gps", "a.json", equator_route().points);
    stray.route_id = "route9".to_string();

    let result = evaluate_groups(&[stray], &config);
    assert!(matches!(result, Err(EvalError::UnknownRoute { .. })));
}

#[test]
fn test_accumulate_unknown_mode() {
    let mut aggregator = ErrorAggregator::new(&config().modes);
    assert!(matches!(
        aggregator.accumulate("wifi", &[1.0]),
        Err(EvalError::UnknownMode { .. })
    ));
    assert!(aggregator.samples("wifi").is_none());
}

#[test]
fn test_accumulate_appends() {
    let mut aggregator = ErrorAggregator::new(&config().modes);
    aggregator.accumulate("gps", &[3.0, 1.0]).unwrap();
    aggregator.accumulate("gps", &[2.0]).unwrap();
    assert_eq!(aggregator.samples("gps").unwrap(), &[3.0, 1.0, 2.0]);
    assert_eq!(aggregator.total_samples(), 3);

    // CDF is rebuilt from the current population
    let cdf = aggregator.cdf("gps").unwrap();
    assert_eq!(cdf.distances(), vec![1.0, 2.0, 3.0]);
    aggregator.accumulate("gps", &[0.5]).unwrap();
    assert_eq!(aggregator.cdf("gps").unwrap().distances(), vec![0.5, 1.0, 2.0, 3.0]);
}

#[test]
fn test_sequential_and_parallel_agree() {
    let config = config();
    let offset: Vec<GeoPoint> = equator_route()
        .points
        .iter()
        .map(|p| GeoPoint::new(p.latitude + 0.0001, p.longitude))
        .collect();
    let groups: Vec<FixGroup> = (0..20)
        .map(|i| {
            let mode = if i % 2 == 0 { "gps" } else { "balanced" };
            group(mode, &format!("{i}.json"), offset.clone())
        })
        .collect();

    let sequential = evaluate_groups(&groups, &config).unwrap();
    #[cfg(feature = "parallel")]
    {
        let parallel = evaluate_groups_parallel(&groups, &config).unwrap();
        assert_eq!(sequential, parallel);
    }
    assert_eq!(sequential.len(), 20);
    assert_eq!(sequential[3].source, groups[3].source);
}

#[test]
fn test_unconfigured_mode_group_stays_local() {
    let config = config();
    let groups = vec![
        group("gps", "a.json", equator_route().points),
        group("wifi", "b.json", equator_route().points),
        group("balanced", "c.json", equator_route().points),
    ];

    let evaluation = run_evaluation(&groups, &config).unwrap();

    assert_eq!(evaluation.outcomes.len(), 3);
    assert_eq!(evaluation.aggregator.samples("gps").unwrap().len(), 3);
    assert_eq!(evaluation.aggregator.samples("balanced").unwrap().len(), 3);
    assert_eq!(evaluation.failures.len(), 1);
    assert_eq!(evaluation.failures[0].path, PathBuf::from("route1/wifi/b.json"));
    assert!(matches!(
        evaluation.failures[0].error,
        EvalError::UnknownMode { .. }
    ));
}
