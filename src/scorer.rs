// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Scorer (component C10): nine weighted, normalised sub-scores combined
//! into one candidate-scan score, per spec.md §4.7.

use crate::candidate::Candidate;
use crate::model::baseline::BaselineId;
use crate::skycoverage::SkyCoverageArea;

/// The nine scorer weights plus the sky-coverage influence knobs,
/// threaded through the planner as a value rather than the original's
/// thread-local statics (spec.md §9).
#[derive(Clone, Copy, Debug)]
pub struct WeightContext {
    pub sky_coverage: f64,
    pub n_obs: f64,
    pub duration: f64,
    pub average_source: f64,
    pub average_station: f64,
    pub average_baseline: f64,
    pub idle_time: f64,
    pub low_declination: f64,
    pub low_elevation: f64,

    pub idle_time_interval_seconds: f64,
    pub declination_start_weight_rad: f64,
    pub declination_full_weight_rad: f64,
    pub low_elevation_start_weight_rad: f64,
    pub low_elevation_full_weight_rad: f64,
}

impl WeightContext {
    /// Normalise the nine weights to sum to 1, per spec.md §4.7. A no-op
    /// (and thus idempotent, per spec.md §8) once already normalised.
    pub fn normalise(&mut self) {
        let sum = self.sky_coverage
            + self.n_obs
            + self.duration
            + self.average_source
            + self.average_station
            + self.average_baseline
            + self.idle_time
            + self.low_declination
            + self.low_elevation;
        if sum <= 0.0 {
            return;
        }
        self.sky_coverage /= sum;
        self.n_obs /= sum;
        self.duration /= sum;
        self.average_source /= sum;
        self.average_station /= sum;
        self.average_baseline /= sum;
        self.idle_time /= sum;
        self.low_declination /= sum;
        self.low_elevation /= sum;
    }
}

/// A piecewise-linear ramp from 0 (at or below `start`) to 1 (at or
/// beyond `full`), used by the low-declination and low-elevation
/// sub-scores. `start` may be greater than `full` (ramp runs the other
/// way, e.g. elevation decreasing toward the horizon).
fn ramp(value: f64, start: f64, full: f64) -> f64 {
    if (full - start).abs() < 1e-12 {
        return if value >= full { 1.0 } else { 0.0 };
    }
    ((value - start) / (full - start)).clamp(0.0, 1.0)
}

/// Running observation counts the `average_*` sub-scores compare a
/// candidate against, per spec.md §4.7.
#[derive(Clone, Debug, Default)]
pub struct ObservationCounts {
    pub per_source: Vec<usize>,
    pub per_station: Vec<usize>,
    pub per_baseline: std::collections::HashMap<BaselineId, usize>,
}

impl ObservationCounts {
    fn average_deficit(counts: &[usize], members: &[usize]) -> f64 {
        if counts.is_empty() || members.is_empty() {
            return 0.5;
        }
        let mean = counts.iter().sum::<usize>() as f64 / counts.len() as f64;
        if mean <= 0.0 {
            return 1.0;
        }
        let member_mean = members
            .iter()
            .map(|&i| *counts.get(i).unwrap_or(&0) as f64)
            .sum::<f64>()
            / members.len() as f64;
        (1.0 - member_mean / mean).clamp(0.0, 1.0)
    }
}

/// Compute the nine sub-scores and the weighted total for `candidate`,
/// per spec.md §4.7. `max_baselines` is the maximum possible baseline
/// count across the whole network, used to normalise `n_obs`.
#[allow(clippy::too_many_arguments)]
pub fn score_candidate(
    candidate: &Candidate,
    weights: &WeightContext,
    counts: &ObservationCounts,
    sky_coverage_areas: &[SkyCoverageArea],
    station_to_area: &dyn Fn(usize) -> usize,
    max_baselines: usize,
    min_scan_seconds: f64,
    max_scan_seconds: f64,
    observing_duration_seconds: f64,
    station_idle_seconds: &dyn Fn(usize) -> f64,
    focus_factor: Option<f64>,
) -> f64 {
    let station_indices: Vec<usize> = candidate.pointings.iter().map(|pv| pv.station).collect();

    let sky_coverage_score = if station_indices.is_empty() {
        0.0
    } else {
        station_indices
            .iter()
            .map(|&s| {
                let area = station_to_area(s);
                sky_coverage_areas
                    .get(area)
                    .map(|a| a.novelty(candidate.pointings[0].azel, candidate.observing_start))
                    .unwrap_or(1.0)
            })
            .sum::<f64>()
            / station_indices.len() as f64
    };

    let n = station_indices.len();
    let baseline_count = n * n.saturating_sub(1) / 2;
    let n_obs_score = if max_baselines == 0 {
        0.0
    } else {
        (baseline_count as f64 / max_baselines as f64).clamp(0.0, 1.0)
    };

    let duration_score = if (max_scan_seconds - min_scan_seconds).abs() < 1e-9 {
        1.0
    } else {
        (1.0 - (observing_duration_seconds - min_scan_seconds) / (max_scan_seconds - min_scan_seconds))
            .clamp(0.0, 1.0)
    };

    let average_source_score =
        ObservationCounts::average_deficit(&counts.per_source, &[candidate.source]);
    let average_station_score =
        ObservationCounts::average_deficit(&counts.per_station, &station_indices);

    let baseline_counts_vec: Vec<usize> = counts.per_baseline.values().copied().collect();
    let candidate_baselines: Vec<BaselineId> = station_indices
        .iter()
        .enumerate()
        .flat_map(|(i, &a)| {
            station_indices[i + 1..]
                .iter()
                .map(move |&b| BaselineId::new(a, b))
        })
        .collect();
    let average_baseline_score = if candidate_baselines.is_empty() || baseline_counts_vec.is_empty() {
        0.5
    } else {
        let mean = baseline_counts_vec.iter().sum::<usize>() as f64 / baseline_counts_vec.len() as f64;
        if mean <= 0.0 {
            1.0
        } else {
            let member_mean = candidate_baselines
                .iter()
                .map(|b| *counts.per_baseline.get(b).unwrap_or(&0) as f64)
                .sum::<f64>()
                / candidate_baselines.len() as f64;
            (1.0 - member_mean / mean).clamp(0.0, 1.0)
        }
    };

    let idle_time_score = if station_indices.is_empty() {
        0.0
    } else {
        station_indices
            .iter()
            .map(|&s| {
                if station_idle_seconds(s) > weights.idle_time_interval_seconds {
                    1.0
                } else {
                    0.0
                }
            })
            .sum::<f64>()
            / station_indices.len() as f64
    };

    let dec = candidate
        .pointings
        .first()
        .and_then(|pv| pv.hadec)
        .map(|h| h.dec)
        .unwrap_or(0.0)
        .abs();
    let low_declination_score = ramp(
        dec,
        weights.declination_start_weight_rad,
        weights.declination_full_weight_rad,
    );

    let low_elevation_score = if station_indices.is_empty() {
        0.0
    } else {
        candidate
            .pointings
            .iter()
            .map(|pv| {
                ramp(
                    pv.azel.el,
                    weights.low_elevation_start_weight_rad,
                    weights.low_elevation_full_weight_rad,
                )
            })
            .sum::<f64>()
            / candidate.pointings.len() as f64
    };

    let total = weights.sky_coverage * sky_coverage_score
        + weights.n_obs * n_obs_score
        + weights.duration * duration_score
        + weights.average_source * average_source_score
        + weights.average_station * average_station_score
        + weights.average_baseline * average_baseline_score
        + weights.idle_time * idle_time_score
        + weights.low_declination * low_declination_score
        + weights.low_elevation * low_elevation_score;

    total * focus_factor.unwrap_or(1.0)
}

/// Tie-break ordering for equally scored candidates (spec.md §4.7):
/// higher observing count first, then lexicographic source name.
pub fn tie_break_key(observation_count: usize, source_name: &str) -> (std::cmp::Reverse<usize>, String) {
    (std::cmp::Reverse(observation_count), source_name.to_string())
}
