// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Quality assessment (component C16): the scalar figure of merit per
//! schedule, hard-condition gating, and the gentle source-reduction
//! retry pass, per spec.md §4.13.

use crate::model::schedule::Schedule;

/// Weights for the figure-of-merit's five terms, per spec.md §4.13. Not
/// required to sum to 1; the figure of merit is a weighted sum, not a
/// normalised score.
#[derive(Clone, Copy, Debug)]
pub struct QualityWeights {
    pub total_observations: f64,
    pub mean_sky_coverage: f64,
    /// Applied to the *negated* standard deviation of per-station scan
    /// counts, so a larger weight rewards balance across the network.
    pub station_balance: f64,
    pub low_declination_fraction: f64,
    pub repeat_completion: f64,
}

impl Default for QualityWeights {
    fn default() -> Self {
        Self {
            total_observations: 1.0,
            mean_sky_coverage: 1.0,
            station_balance: 1.0,
            low_declination_fraction: 1.0,
            repeat_completion: 1.0,
        }
    }
}

/// A hard condition on a named group of sources: the schedule fails
/// (score 0, per spec.md §4.13) unless at least `min_baselines` distinct
/// baselines were observed among `source_indices`.
#[derive(Clone, Debug)]
pub struct GroupBaselineCondition {
    pub group_name: String,
    pub source_indices: Vec<usize>,
    pub min_baselines: usize,
}

/// Hard conditions a schedule must satisfy to receive a nonzero score,
/// per spec.md §4.13.
#[derive(Clone, Debug, Default)]
pub struct HardConditions {
    pub min_scans: usize,
    pub groups: Vec<GroupBaselineCondition>,
}

/// Declination threshold (radians) above which a source counts as
/// "low-declination" for the figure of merit's low-declination-fraction
/// term. Distinct from the scorer's (C10) low-declination ramp knobs:
/// this is a single fixed cutoff used only for whole-schedule reporting.
const LOW_DECLINATION_THRESHOLD_RAD: f64 = 15.0 * std::f64::consts::PI / 180.0;

/// Number of azimuth/elevation cells used to approximate "mean sky
/// coverage per station": the fraction of a coarse grid whose cells
/// contain at least one pointing. 8 azimuth bins by 5 elevation bins is
/// coarse enough to be robust on a short session, fine enough to
/// distinguish a clustered schedule from a well-spread one.
const SKY_COVERAGE_AZ_BINS: usize = 8;
const SKY_COVERAGE_EL_BINS: usize = 5;

fn sky_coverage_cell(az: f64, el: f64) -> (usize, usize) {
    let az_frac = crate::time::normalise_radians(az) / std::f64::consts::TAU;
    let az_bin = ((az_frac * SKY_COVERAGE_AZ_BINS as f64) as usize).min(SKY_COVERAGE_AZ_BINS - 1);
    let el_frac = (el / crate::constants::FRAC_PI_2).clamp(0.0, 1.0);
    let el_bin = ((el_frac * SKY_COVERAGE_EL_BINS as f64) as usize).min(SKY_COVERAGE_EL_BINS - 1);
    (az_bin, el_bin)
}

/// Mean, over stations, of the fraction of sky-coverage cells that
/// station observed at least once during the schedule.
fn mean_sky_coverage_per_station(schedule: &Schedule) -> f64 {
    if schedule.stations.is_empty() {
        return 0.0;
    }
    let mut cells_hit: Vec<std::collections::HashSet<(usize, usize)>> =
        vec![std::collections::HashSet::new(); schedule.stations.len()];
    for scan in &schedule.scans {
        for pv in &scan.pointings {
            if let Some(set) = cells_hit.get_mut(pv.station) {
                set.insert(sky_coverage_cell(pv.azel.az, pv.azel.el));
            }
        }
    }
    let total_cells = (SKY_COVERAGE_AZ_BINS * SKY_COVERAGE_EL_BINS) as f64;
    cells_hit.iter().map(|s| s.len() as f64 / total_cells).sum::<f64>() / schedule.stations.len() as f64
}

/// Standard deviation of per-station scan counts (population stddev,
/// i.e. divided by N not N-1: the station array *is* the whole
/// population for this schedule, not a sample of it).
fn station_count_stddev(schedule: &Schedule) -> f64 {
    let n = schedule.stations.len();
    if n == 0 {
        return 0.0;
    }
    let counts: Vec<f64> = (0..n)
        .map(|s| schedule.number_of_scans_for_station(s) as f64)
        .collect();
    let mean = counts.iter().sum::<f64>() / n as f64;
    let variance = counts.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / n as f64;
    variance.sqrt()
}

/// Fraction of total observing time spent on sources at or below
/// [`LOW_DECLINATION_THRESHOLD_RAD`], per spec.md §4.13.
fn low_declination_time_fraction(schedule: &Schedule) -> f64 {
    let mut low_seconds = 0.0;
    let mut total_seconds = 0.0;
    for scan in &schedule.scans {
        let Some(start) = scan.observing_start() else {
            continue;
        };
        let Some(end) = scan.observing_end() else {
            continue;
        };
        let duration = (end - start).to_seconds().max(0.0);
        total_seconds += duration;
        if schedule.sources[scan.source].radec.dec.abs() <= LOW_DECLINATION_THRESHOLD_RAD {
            low_seconds += duration;
        }
    }
    if total_seconds <= 0.0 {
        0.0
    } else {
        low_seconds / total_seconds
    }
}

/// Completion ratio of repeat goals: for each source with a nonzero
/// `min_repeat`-implied observation target (`target_observations`), the
/// fraction of that target actually reached, averaged over sources that
/// have a target. Sources without a target (`target_observations ==
/// 0`) don't contribute, matching a schedule with no repeat goals at all
/// scoring this term as `0` rather than inflating it via division by
/// zero (callers that don't track repeat goals should pass an empty map
/// and expect `0.0`).
fn repeat_goal_completion_ratio(schedule: &Schedule, targets: &std::collections::HashMap<usize, usize>) -> f64 {
    if targets.is_empty() {
        return 0.0;
    }
    let mut total_ratio = 0.0;
    for (&source, &target) in targets {
        if target == 0 {
            continue;
        }
        let achieved = schedule
            .sources
            .get(source)
            .map(|s| s.state.number_of_observations)
            .unwrap_or(0);
        total_ratio += (achieved as f64 / target as f64).min(1.0);
    }
    total_ratio / targets.len() as f64
}

/// The number of distinct baselines observed among the given source
/// indices.
fn baselines_observed_among(schedule: &Schedule, source_indices: &[usize]) -> usize {
    let wanted: std::collections::HashSet<usize> = source_indices.iter().copied().collect();
    let mut baselines = std::collections::HashSet::new();
    for scan in &schedule.scans {
        if !wanted.contains(&scan.source) {
            continue;
        }
        for obs in &scan.observations {
            baselines.insert(obs.baseline);
        }
    }
    baselines.len()
}

/// Whether `schedule` satisfies every configured hard condition, per
/// spec.md §4.13. A failing schedule is assigned score 0 by
/// [`figure_of_merit`]; the caller (the multi-schedule driver, or a
/// direct build invocation) is responsible for triggering
/// [`GentleReduction::next_sources_to_disable`] in response.
pub fn satisfies_hard_conditions(schedule: &Schedule, conditions: &HardConditions) -> bool {
    if schedule.scans.len() < conditions.min_scans {
        return false;
    }
    conditions
        .groups
        .iter()
        .all(|g| baselines_observed_among(schedule, &g.source_indices) >= g.min_baselines)
}

/// The scalar figure of merit for a completed schedule, per spec.md
/// §4.13. Returns `0.0` whenever `conditions` are not met, regardless of
/// how good the raw weighted sum would otherwise be.
///
/// `repeat_targets` maps a source index to its target observation count
/// (derived from the session length and that source's `min_repeat`);
/// pass an empty map if repeat goals are not tracked by the caller.
pub fn figure_of_merit(
    schedule: &Schedule,
    weights: &QualityWeights,
    conditions: &HardConditions,
    repeat_targets: &std::collections::HashMap<usize, usize>,
) -> f64 {
    if !satisfies_hard_conditions(schedule, conditions) {
        return 0.0;
    }

    let total_observations = schedule.scans.iter().map(|s| s.observations.len()).sum::<usize>() as f64;
    let mean_sky_coverage = mean_sky_coverage_per_station(schedule);
    let stddev = station_count_stddev(schedule);
    let low_dec_fraction = low_declination_time_fraction(schedule);
    let repeat_completion = repeat_goal_completion_ratio(schedule, repeat_targets);

    weights.total_observations * total_observations
        + weights.mean_sky_coverage * mean_sky_coverage
        + weights.station_balance * (-stddev)
        + weights.low_declination_fraction * low_dec_fraction
        + weights.repeat_completion * repeat_completion
}

/// Picks the `n` least-observed, non-ignored sources for the "gentle
/// source reduction" retry pass (spec.md §4.13): when a build fails its
/// hard conditions, the driver disables these and rebuilds, up to
/// `maxNumberOfIterations` attempts (tracked by the caller, not this
/// function — it is a pure selection step).
pub fn gentle_reduction_candidates(schedule: &Schedule, n: usize) -> Vec<usize> {
    let mut by_count: Vec<(usize, usize)> = schedule
        .sources
        .iter()
        .enumerate()
        .filter(|(_, s)| !s.ignore)
        .map(|(i, s)| (i, s.state.number_of_observations))
        .collect();
    // Ties broken by source name ascending, per spec.md §9's canonical
    // tie-break-ordering fix.
    by_count.sort_by(|a, b| {
        a.1.cmp(&b.1)
            .then_with(|| schedule.sources[a.0].name.cmp(&schedule.sources[b.0].name))
    });
    by_count.into_iter().take(n).map(|(i, _)| i).collect()
}
