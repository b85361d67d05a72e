//! Pairing of recorded fixes with reference points and per-mode accumulation.
//!
//! The k-th fix of a group is compared with the k-th reference point of its
//! route. Groups whose fix count differs from the route's reference count are
//! kept for display but contribute nothing to the statistics.

use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::Serialize;

use crate::error::{EvalError, OptionExt, Result};
use crate::geo_utils::haversine_distance;
use crate::ingest::{FileFailure, FixGroup};
use crate::stats::{EmpiricalCdf, PercentileSummary};
use crate::{AccuracyMode, EvalConfig, GeoPoint, Route};

/// Error distances of a group, paired by ordinal position.
///
/// Fails with [`EvalError::GroupCountMismatch`] when the group does not hold
/// exactly one fix per reference point.
pub fn pair_with_reference(route: &Route, fixes: &[GeoPoint], source: &Path) -> Result<Vec<f64>> {
    if fixes.len() != route.reference_count() {
        return Err(EvalError::GroupCountMismatch {
            file: source.to_path_buf(),
            observed: fixes.len(),
            expected: route.reference_count(),
        });
    }

    Ok(route
        .points
        .iter()
        .zip(fixes)
        .map(|(reference, fix)| haversine_distance(reference, fix))
        .collect())
}

/// A recorded fix as forwarded to presentation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EvaluatedFix {
    pub fix: GeoPoint,
    /// Paired reference point, `None` when the group was not paired
    pub reference: Option<GeoPoint>,
    /// Error distance in meters, `None` when the group was not paired
    pub distance: Option<f64>,
}

/// Fix count of a group that could not be paired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CountMismatch {
    pub observed: usize,
    pub expected: usize,
}

/// Result of evaluating one fix group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupOutcome {
    pub route_id: String,
    pub mode: String,
    pub source: PathBuf,
    pub fixes: Vec<EvaluatedFix>,
    /// Set when the group was excluded from statistics
    pub mismatch: Option<CountMismatch>,
}

impl GroupOutcome {
    /// Error samples contributed by this group (empty on mismatch).
    pub fn samples(&self) -> Vec<f64> {
        self.fixes.iter().filter_map(|f| f.distance).collect()
    }

    pub fn is_paired(&self) -> bool {
        self.mismatch.is_none()
    }

    /// The mismatch as an error, for reporting.
    pub fn mismatch_error(&self) -> Option<EvalError> {
        self.mismatch.map(|m| EvalError::GroupCountMismatch {
            file: self.source.clone(),
            observed: m.observed,
            expected: m.expected,
        })
    }
}

/// Pair a group with its route.
///
/// A count mismatch is logged and flags every fix of the group as unpaired.
pub fn evaluate_group(route: &Route, group: &FixGroup) -> GroupOutcome {
    let (fixes, mismatch) = match pair_with_reference(route, &group.fixes, &group.source) {
        Ok(distances) => {
            let fixes = group
                .fixes
                .iter()
                .zip(&route.points)
                .zip(distances)
                .map(|((fix, reference), distance)| EvaluatedFix {
                    fix: *fix,
                    reference: Some(*reference),
                    distance: Some(distance),
                })
                .collect();
            (fixes, None)
        }
        Err(error) => {
            warn!("[Aggregate] {}", error);
            let fixes = group
                .fixes
                .iter()
                .map(|fix| EvaluatedFix {
                    fix: *fix,
                    reference: None,
                    distance: None,
                })
                .collect();
            let mismatch = CountMismatch {
                observed: group.fixes.len(),
                expected: route.reference_count(),
            };
            (fixes, Some(mismatch))
        }
    };

    GroupOutcome {
        route_id: group.route_id.clone(),
        mode: group.mode.clone(),
        source: group.source.clone(),
        fixes,
        mismatch,
    }
}

fn route_for<'a>(config: &'a EvalConfig, group: &FixGroup) -> Result<&'a Route> {
    config
        .route(&group.route_id)
        .ok_or_else(|| EvalError::UnknownRoute {
            directory: group
                .source
                .ancestors()
                .nth(2)
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(&group.route_id)),
        })
}

/// Evaluate groups in order. A group referencing an undefined route is fatal.
pub fn evaluate_groups(groups: &[FixGroup], config: &EvalConfig) -> Result<Vec<GroupOutcome>> {
    groups
        .iter()
        .map(|group| Ok(evaluate_group(route_for(config, group)?, group)))
        .collect()
}

/// Parallel version of [`evaluate_groups`]. Outcomes keep the input order.
#[cfg(feature = "parallel")]
pub fn evaluate_groups_parallel(
    groups: &[FixGroup],
    config: &EvalConfig,
) -> Result<Vec<GroupOutcome>> {
    use rayon::prelude::*;

    groups
        .par_iter()
        .map(|group| Ok(evaluate_group(route_for(config, group)?, group)))
        .collect()
}

/// Error samples of one accuracy mode.
#[derive(Debug, Clone)]
struct ModePopulation {
    mode: AccuracyMode,
    samples: Vec<f64>,
}

/// Statistics of one accuracy mode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModeSummary {
    pub mode: AccuracyMode,
    pub sample_count: usize,
    /// `None` when the mode has no samples
    pub cdf: Option<EmpiricalCdf>,
    pub percentiles: Option<PercentileSummary>,
}

/// Owns one error population per configured accuracy mode.
///
/// Built once per batch run. Samples are appended as-is: repeated files or
/// fixes each contribute independent samples.
#[derive(Debug, Clone)]
pub struct ErrorAggregator {
    populations: Vec<ModePopulation>,
}

impl ErrorAggregator {
    pub fn new(modes: &[AccuracyMode]) -> Self {
        Self {
            populations: modes
                .iter()
                .map(|mode| ModePopulation {
                    mode: mode.clone(),
                    samples: Vec::new(),
                })
                .collect(),
        }
    }

    fn population_mut(&mut self, mode: &str) -> Result<&mut ModePopulation> {
        self.populations
            .iter_mut()
            .find(|p| p.mode.label == mode)
            .ok_or_else(|| EvalError::UnknownMode {
                mode: mode.to_string(),
            })
    }

    /// Append samples to a mode's population.
    pub fn accumulate(&mut self, mode: &str, samples: &[f64]) -> Result<()> {
        self.population_mut(mode)?.samples.extend_from_slice(samples);
        Ok(())
    }

    /// Append the samples of a paired group. Unpaired groups add nothing.
    pub fn accumulate_outcome(&mut self, outcome: &GroupOutcome) -> Result<()> {
        if !outcome.is_paired() {
            return Ok(());
        }
        self.accumulate(&outcome.mode, &outcome.samples())
    }

    /// Samples of a mode in accumulation order.
    pub fn samples(&self, mode: &str) -> Option<&[f64]> {
        self.populations
            .iter()
            .find(|p| p.mode.label == mode)
            .map(|p| p.samples.as_slice())
    }

    pub fn total_samples(&self) -> usize {
        self.populations.iter().map(|p| p.samples.len()).sum()
    }

    /// CDF of a mode, rebuilt from its current samples.
    pub fn cdf(&self, mode: &str) -> Result<EmpiricalCdf> {
        let samples = self.samples(mode).ok_or_else(|| EvalError::UnknownMode {
            mode: mode.to_string(),
        })?;
        EmpiricalCdf::from_samples(samples).ok_or_empty_population(mode)
    }

    /// Summaries for every configured mode, in configuration order.
    pub fn summaries(&self) -> Vec<ModeSummary> {
        self.populations
            .iter()
            .map(|p| {
                let cdf = EmpiricalCdf::from_samples(&p.samples);
                let percentiles = cdf.as_ref().map(EmpiricalCdf::summary);
                ModeSummary {
                    mode: p.mode.clone(),
                    sample_count: p.samples.len(),
                    cdf,
                    percentiles,
                }
            })
            .collect()
    }
}

/// Outcomes and statistics of one batch run.
#[derive(Debug)]
pub struct Evaluation {
    pub outcomes: Vec<GroupOutcome>,
    pub aggregator: ErrorAggregator,
    /// Groups whose samples could not be accumulated
    pub failures: Vec<FileFailure>,
}

impl Evaluation {
    /// Groups excluded from statistics.
    pub fn mismatches(&self) -> impl Iterator<Item = &GroupOutcome> {
        self.outcomes.iter().filter(|o| !o.is_paired())
    }
}

/// Evaluate all groups and accumulate the paired ones.
///
/// Groups are evaluated in parallel when the `parallel` feature is enabled;
/// accumulation always happens afterwards, in group order.
pub fn run_evaluation(groups: &[FixGroup], config: &EvalConfig) -> Result<Evaluation> {
    #[cfg(feature = "parallel")]
    let outcomes = evaluate_groups_parallel(groups, config)?;
    #[cfg(not(feature = "parallel"))]
    let outcomes = evaluate_groups(groups, config)?;

    let mut aggregator = ErrorAggregator::new(&config.modes);
    let mut failures = Vec::new();
    for outcome in &outcomes {
        if let Err(error) = aggregator.accumulate_outcome(outcome) {
            warn!("[Aggregate] Skipping group: {}", error);
            failures.push(FileFailure {
                path: outcome.source.clone(),
                error,
            });
        }
    }

    let excluded = outcomes.iter().filter(|o| !o.is_paired()).count();
    info!(
        "[Aggregate] {} groups evaluated, {} excluded, {} error samples",
        outcomes.len(),
        excluded,
        aggregator.total_samples()
    );

    Ok(Evaluation {
        outcomes,
        aggregator,
        failures,
    })
}
