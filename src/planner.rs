// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The greedy scheduling planner (component C13): the IDLE -> REQUEST
//! CANDIDATES -> SCORE -> [SUBNETTING] -> SELECT -> COMMIT -> [FILLIN]
//! loop that drives every other component into one built [`Schedule`],
//! per spec.md §4.11.

use std::collections::HashMap;

use hifitime::{Duration, Epoch, Unit};

use crate::candidate::{self, Candidate, CandidateParams};
use crate::config::ResolvedParameters;
use crate::duration::{self, BaselineDurationInput};
use crate::error::SchedulerError;
use crate::fillin::{self, FillinStationCheck};
use crate::flux::project_uv;
use crate::model::baseline::{Baseline, BaselineId};
use crate::model::observation::Observation;
use crate::model::scan::{Scan, ScanTag, StationScanTimes};
use crate::model::schedule::Schedule;
use crate::model::source::Source;
use crate::model::station::Station;
use crate::model::{SourceIndex, StationIndex};
use crate::obsmode::ModeDescriptor;
use crate::scorer::{score_candidate, tie_break_key, ObservationCounts, WeightContext};
use crate::skycoverage::SkyCoverageArea;
use crate::subnetting::{self, ScoredCandidate};

const SPEED_OF_LIGHT_M_PER_S: f64 = 299_792_458.0;

/// Everything the planner needs that is not itself a [`Station`]/[`Source`]
/// (those are owned by the [`Schedule`] it builds), per spec.md §4.11.
pub struct PlannerInputs<'a> {
    pub params: ResolvedParameters,
    pub weights: WeightContext,
    pub baselines: HashMap<BaselineId, Baseline>,
    pub mode: ModeDescriptor,
    /// Bands considered when solving scan duration (spec.md §4.4); usually
    /// every band the mode records.
    pub bands: Vec<String>,
    /// One [`SkyCoverageArea`] per distinct area; `station_to_area` maps a
    /// station index into this array (spec.md §4.5's twin-telescope
    /// grouping).
    pub sky_coverage_areas: Vec<SkyCoverageArea>,
    pub station_to_area: &'a dyn Fn(StationIndex) -> usize,
    /// Calibrator-block / high-impact / focus-corner rules (component
    /// C14), per spec.md §4.10.
    pub rules: crate::rules::RulesConfig,
}

/// Mutable C14 rule-tracking state carried across the main scheduling
/// loop's iterations, per spec.md §4.10/§4.11. The fill-in pass does not
/// touch this: fill-in scans are always tagged [`ScanTag::Fillin`].
struct RuleState {
    in_calibrator_block: bool,
    last_calibrator_block_end: Option<Epoch>,
    scans_since_last_calibrator_block: usize,
    calibrator_scans_committed_this_block: usize,
    /// Consecutive ticks an active calibrator block has found no
    /// candidate in its source group at all. Guards against a
    /// misconfigured or permanently-invisible `source_group` wedging the
    /// block open forever (see `CALIBRATOR_BLOCK_MAX_STALL_TICKS`).
    calibrator_block_stall_ticks: usize,
    focus_corner_tracker: Option<crate::rules::FocusCornerTracker>,
}

impl RuleState {
    fn new(rules: &crate::rules::RulesConfig) -> Self {
        Self {
            in_calibrator_block: false,
            last_calibrator_block_end: None,
            scans_since_last_calibrator_block: 0,
            calibrator_scans_committed_this_block: 0,
            calibrator_block_stall_ticks: 0,
            focus_corner_tracker: rules.focus_corner_cadence.map(crate::rules::FocusCornerTracker::new),
        }
    }
}

/// A calibrator block that finds zero source-group candidates for this
/// many consecutive ticks is abandoned rather than held open forever,
/// falling back to ordinary scheduling for the rest of the session.
const CALIBRATOR_BLOCK_MAX_STALL_TICKS: usize = 10;

/// Classify a committed candidate's [`ScanTag`], per spec.md §4.10's
/// priority: a calibrator-block scan outranks a high-impact scan, which
/// outranks a focus-corner scan, which outranks a standard scan.
fn classify_tag(candidate: &Candidate, schedule: &Schedule, rules: &crate::rules::RulesConfig, rule_state: &RuleState) -> ScanTag {
    if rule_state.in_calibrator_block {
        if let Some(cal) = &rules.calibrator {
            let source = &schedule.sources[candidate.source];
            if source.groups.iter().any(|g| g == &cal.source_group) {
                return ScanTag::Calibrator;
            }
        }
    }
    for target in &rules.high_impact_targets {
        if let Some(pv) = candidate.pointings.iter().find(|pv| pv.station == target.station) {
            if crate::rules::high_impact_triggered(target, pv.azel) {
                return ScanTag::HighImpact;
            }
        }
    }
    if let Some(tracker) = &rule_state.focus_corner_tracker {
        let overdue = candidate
            .pointings
            .iter()
            .any(|pv| tracker.is_overdue(crate::rules::SkyCorner::containing(pv.azel.az), candidate.observing_start));
        if overdue {
            return ScanTag::AstrometricCorner;
        }
    }
    ScanTag::Standard
}

/// Score bonus contributed by C14 rules (spec.md §4.10): high-impact
/// targets and an overdue focus corner each add their configured bonus on
/// top of the base scorer output; a calibrator candidate during an active
/// calibrator block is further ranked by how close it sits to the
/// configured low/high elevation-pair target.
fn rule_score_bonus(
    candidate: &Candidate,
    schedule: &Schedule,
    rules: &crate::rules::RulesConfig,
    rule_state: &RuleState,
) -> f64 {
    let mut bonus = 0.0;
    for target in &rules.high_impact_targets {
        if let Some(pv) = candidate.pointings.iter().find(|pv| pv.station == target.station) {
            if crate::rules::high_impact_triggered(target, pv.azel) {
                bonus += target.score_bonus;
            }
        }
    }
    if let Some(tracker) = &rule_state.focus_corner_tracker {
        let overdue = candidate
            .pointings
            .iter()
            .any(|pv| tracker.is_overdue(crate::rules::SkyCorner::containing(pv.azel.az), candidate.observing_start));
        if overdue {
            bonus += rules.focus_corner_score_bonus;
        }
    }
    if rule_state.in_calibrator_block {
        if let Some(cal) = &rules.calibrator {
            let source = &schedule.sources[candidate.source];
            if source.groups.iter().any(|g| g == &cal.source_group) {
                let elevations = candidate.pointings.iter().map(|pv| pv.azel.el);
                let low = elevations.clone().fold(f64::INFINITY, f64::min);
                let high = elevations.fold(f64::NEG_INFINITY, f64::max);
                if low.is_finite() && high.is_finite() {
                    bonus -= crate::rules::calibrator_elevation_pair_cost(
                        low,
                        high,
                        cal.target_low_elevation_rad,
                        cal.target_high_elevation_rad,
                    );
                }
            }
        }
    }
    bonus
}

/// Tick used to nudge the clock forward when no candidate is admissible at
/// all, per spec.md §4.11's "advance the clock" recovery step.
const NO_CANDIDATE_CLOCK_STEP_SECONDS: f64 = 60.0;

fn seconds(s: f64) -> Duration {
    Duration::from_f64(s, Unit::Second)
}

/// Build a complete [`Schedule`] by repeatedly enumerating, scoring,
/// optionally subnetting, selecting, and committing candidate scans,
/// interleaved with an a-posteriori fill-in pass, per spec.md §4.11.
pub fn build_schedule(
    stations: Vec<Station>,
    sources: Vec<Source>,
    inputs: &PlannerInputs,
) -> Result<Schedule, SchedulerError> {
    let params = &inputs.params;
    let candidate_params = params.candidate_params();

    let mut schedule = Schedule::new(params.session_start, params.session_end, stations, sources);
    let mut counts = ObservationCounts::default();
    let mut sky_coverage_areas = inputs.sky_coverage_areas.clone();

    let network_size = schedule.stations.len();
    let max_baselines = network_size * network_size.saturating_sub(1) / 2;

    let mut clock = params.session_start;
    let mut clock_advances = 0usize;
    let mut rule_state = RuleState::new(&inputs.rules);

    loop {
        if clock >= params.session_end {
            break;
        }
        if total_observing_seconds(&schedule) >= params.max_total_obs_time_seconds {
            break;
        }
        if schedule.scans.len() >= params.max_number_of_scans {
            break;
        }

        let raw_candidates =
            candidate::enumerate_candidates(clock, &schedule.stations, &schedule.sources, &candidate_params);

        let mut evaluated: Vec<(Candidate, f64, f64)> = Vec::new(); // (candidate, duration, score)
        for cand in raw_candidates {
            let Ok(duration_seconds) = solve_duration(&cand, &schedule, inputs) else {
                continue;
            };
            let score = score_candidate(
                &cand,
                &inputs.weights,
                &counts,
                &sky_coverage_areas,
                inputs.station_to_area,
                max_baselines,
                params.min_scan_seconds,
                params.max_scan_seconds,
                duration_seconds,
                &|s: usize| idle_seconds(&schedule, s, clock),
                schedule.sources[cand.source].focus_factor,
            );
            let bonus = rule_score_bonus(&cand, &schedule, &inputs.rules, &rule_state);
            evaluated.push((cand, duration_seconds, score + bonus));
        }

        if let Some(cal) = &inputs.rules.calibrator {
            if !rule_state.in_calibrator_block
                && crate::rules::calibrator_block_due(
                    cal,
                    clock,
                    rule_state.last_calibrator_block_end,
                    rule_state.scans_since_last_calibrator_block,
                )
            {
                rule_state.in_calibrator_block = true;
                rule_state.calibrator_scans_committed_this_block = 0;
                rule_state.calibrator_block_stall_ticks = 0;
            }
            if rule_state.in_calibrator_block {
                evaluated.retain(|(c, _, _)| schedule.sources[c.source].groups.iter().any(|g| g == &cal.source_group));
                if evaluated.is_empty() {
                    rule_state.calibrator_block_stall_ticks += 1;
                    if rule_state.calibrator_block_stall_ticks > CALIBRATOR_BLOCK_MAX_STALL_TICKS {
                        rule_state.in_calibrator_block = false;
                        rule_state.calibrator_block_stall_ticks = 0;
                        rule_state.last_calibrator_block_end = Some(clock);
                    }
                } else {
                    rule_state.calibrator_block_stall_ticks = 0;
                }
            }
        }

        if evaluated.is_empty() {
            clock_advances += 1;
            if clock_advances > params.max_clock_advances {
                return Err(SchedulerError::NoFeasibleScan(
                    "exhausted max_clock_advances with no admissible candidate".to_string(),
                ));
            }
            clock = clock + seconds(NO_CANDIDATE_CLOCK_STEP_SECONDS);
            continue;
        }
        clock_advances = 0;

        let chosen = select_candidates(&evaluated, &schedule, params);

        for (candidate_ref, duration_seconds, _score) in &chosen {
            let tag = classify_tag(candidate_ref, &schedule, &inputs.rules, &rule_state);
            commit_candidate(
                &mut schedule,
                &mut counts,
                &mut sky_coverage_areas,
                inputs,
                candidate_ref,
                *duration_seconds,
                clock,
                tag,
            )?;

            if let Some(tracker) = &mut rule_state.focus_corner_tracker {
                for pv in &candidate_ref.pointings {
                    tracker.record(crate::rules::SkyCorner::containing(pv.azel.az), candidate_ref.observing_start);
                }
            }

            if tag == ScanTag::Calibrator {
                rule_state.calibrator_scans_committed_this_block += 1;
                if let Some(cal) = &inputs.rules.calibrator {
                    if rule_state.calibrator_scans_committed_this_block >= cal.min_calibrator_scans {
                        rule_state.in_calibrator_block = false;
                        rule_state.last_calibrator_block_end = Some(clock);
                        rule_state.scans_since_last_calibrator_block = 0;
                    }
                }
            } else {
                rule_state.scans_since_last_calibrator_block += 1;
            }
        }

        clock = next_clock(&schedule, clock);
    }

    if params.fillin_during_selection {
        run_fillin_pass(&mut schedule, &mut counts, &mut sky_coverage_areas, inputs)?;
    }

    Ok(schedule)
}

fn total_observing_seconds(schedule: &Schedule) -> f64 {
    (0..schedule.stations.len())
        .map(|s| schedule.total_observing_seconds(s))
        .fold(0.0, f64::max)
}

fn idle_seconds(schedule: &Schedule, station: StationIndex, clock: Epoch) -> f64 {
    match schedule.stations.get(station).and_then(|s| s.state.last_scan_end) {
        Some(last_end) if clock >= last_end => (clock - last_end).to_seconds(),
        Some(_) => 0.0,
        None => (clock - schedule.session_start).to_seconds().max(0.0),
    }
}

/// Select the single best candidate by score, breaking ties per
/// [`tie_break_key`], unless subnetting is enabled and an admissible
/// disjoint pair beats the best single candidate's combined contribution,
/// per spec.md §4.8/§4.11.
fn select_candidates<'a>(
    evaluated: &'a [(Candidate, f64, f64)],
    schedule: &Schedule,
    params: &ResolvedParameters,
) -> Vec<(&'a Candidate, f64, f64)> {
    if params.subnetting.enabled && evaluated.len() >= 2 {
        let scored: Vec<ScoredCandidate> = evaluated
            .iter()
            .map(|(c, _, score)| ScoredCandidate {
                candidate: c.clone(),
                score: *score,
            })
            .collect();
        let angular_separation = |a: &Candidate, b: &Candidate| {
            schedule.sources[a.source]
                .radec
                .separation(&schedule.sources[b.source].radec)
        };
        if let Some(pair) = subnetting::best_subnetting_pair(
            &scored,
            angular_separation,
            params.subnetting.min_angle_deg.to_radians(),
            params.default_min_stations,
            params.subnetting.min_participating_stations,
            schedule.stations.len(),
        ) {
            let duration_a = evaluated
                .iter()
                .find(|(c, _, _)| c.source == pair.first.candidate.source)
                .map(|(_, d, _)| *d)
                .unwrap_or(params.min_scan_seconds);
            let duration_b = evaluated
                .iter()
                .find(|(c, _, _)| c.source == pair.second.candidate.source)
                .map(|(_, d, _)| *d)
                .unwrap_or(params.min_scan_seconds);
            // The pair's sub-candidates are newly constructed by the
            // subnetting solver, so they cannot be returned by reference
            // into `evaluated`; fall through to the best single candidate
            // when the caller needs a borrowed slice is infeasible here,
            // so re-derive by leaking neither: instead pick the best of
            // the two originals directly (spec.md §4.8's pair still
            // shares each original candidate's source).
            let best_single = best_single_candidate(evaluated);
            let pair_score = pair.combined_score;
            if pair_score > best_single.2 {
                let a_original = evaluated
                    .iter()
                    .find(|(c, _, _)| c.source == pair.first.candidate.source)
                    .map(|(c, _, _)| c)
                    .unwrap();
                let b_original = evaluated
                    .iter()
                    .find(|(c, _, _)| c.source == pair.second.candidate.source)
                    .map(|(c, _, _)| c)
                    .unwrap();
                return vec![(a_original, duration_a, pair.first.score), (b_original, duration_b, pair.second.score)];
            }
        }
    }

    vec![best_single_candidate(evaluated)]
}

fn best_single_candidate<'a>(evaluated: &'a [(Candidate, f64, f64)]) -> (&'a Candidate, f64, f64) {
    evaluated
        .iter()
        .map(|(c, d, s)| (c, *d, *s))
        .max_by(|a, b| {
            a.2.partial_cmp(&b.2)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.0.observing_start.cmp(&a.0.observing_start))
        })
        .expect("evaluated is non-empty")
}

/// Solve the combined observing duration for `candidate`, across every
/// band and every baseline among its participating stations, per spec.md
/// §4.4. Each station's hour angle is approximated using its own local
/// sidereal time, which the caller's per-baseline (u, v) projection
/// treats as the baseline's common hour angle (a standard short-baseline
/// approximation; see DESIGN.md).
fn solve_duration(candidate: &Candidate, schedule: &Schedule, inputs: &PlannerInputs) -> Result<f64, SchedulerError> {
    let source = &schedule.sources[candidate.source];
    let mut taus = Vec::new();

    for band in &inputs.bands {
        let Some(band_mode) = inputs.mode.band(band) else {
            continue;
        };
        let Some(flux_model) = source.flux_model(band) else {
            continue;
        };
        let wavelength_m = SPEED_OF_LIGHT_M_PER_S / band_mode.centre_frequency_hz;
        let observing_rate_hz = inputs.mode.observing_rate_hz(band).unwrap_or(0.0);
        let efficiency = inputs.mode.efficiency();

        for i in 0..candidate.pointings.len() {
            for j in (i + 1)..candidate.pointings.len() {
                let pv_a = candidate.pointings[i];
                let pv_b = candidate.pointings[j];
                let station_a = &schedule.stations[pv_a.station];
                let station_b = &schedule.stations[pv_b.station];

                let baseline_id = BaselineId::new(pv_a.station, pv_b.station);
                let baseline = inputs.baselines.get(&baseline_id);
                if baseline.map(|b| b.ignore).unwrap_or(false) {
                    continue;
                }
                let min_snr = baseline.and_then(|b| b.min_snr.get(band)).copied().unwrap_or(0.0);
                if min_snr <= 0.0 {
                    continue;
                }

                let lst_a = crate::time::lst_radians(candidate.observing_start, station_a.position.to_geodetic().longitude);
                let ha = source.radec.to_hadec(lst_a).ha;
                let dec = source.radec.dec;
                let dx = station_b.position.x - station_a.position.x;
                let dy = station_b.position.y - station_a.position.y;
                let dz = station_b.position.z - station_a.position.z;
                let (u_m, v_m) = project_uv(dx, dy, dz, ha, dec);
                let flux_jy = flux_model.flux_at_uv(u_m / wavelength_m, v_m / wavelength_m);

                let sefd_a = station_a
                    .equipment
                    .get(band)
                    .map(|e| duration::elevation_corrected_sefd(e.sefd, pv_a.azel.el))
                    .unwrap_or(0.0);
                let sefd_b = station_b
                    .equipment
                    .get(band)
                    .map(|e| duration::elevation_corrected_sefd(e.sefd, pv_b.azel.el))
                    .unwrap_or(0.0);

                let input = BaselineDurationInput {
                    min_snr,
                    flux_jy,
                    observing_rate_hz,
                    digitisation_efficiency: efficiency,
                    sefd_1_jy: sefd_a,
                    sefd_2_jy: sefd_b,
                };
                if let Some(tau) = duration::required_duration_seconds(&input) {
                    taus.push(tau);
                }
            }
        }
    }

    duration::combine_scan_duration(&taus, inputs.params.min_scan_seconds, inputs.params.max_scan_seconds)
        .map_err(SchedulerError::from)
}

/// Commit one candidate into the schedule: recompute each participating
/// station's per-station timing (slew, field-system, preob, postob), build
/// the [`Scan`] and its [`Observation`]s, update station/source state, and
/// record the pointing in the relevant sky-coverage area, per spec.md
/// §4.11.
#[allow(clippy::too_many_arguments)]
fn commit_candidate(
    schedule: &mut Schedule,
    counts: &mut ObservationCounts,
    sky_coverage_areas: &mut [SkyCoverageArea],
    inputs: &PlannerInputs,
    candidate: &Candidate,
    duration_seconds: f64,
    clock: Epoch,
    tag: ScanTag,
) -> Result<(), SchedulerError> {
    let candidate_params = inputs.params.candidate_params();
    let mut station_times = Vec::new();

    // Fast-mode candidates were scored against a precomputed `AzElGrid` with
    // no live Sun check (spec.md §4.3/§9); re-derive each pointing
    // rigorously before it is actually committed, so a candidate that only
    // looked admissible under the grid's approximation never ends up in the
    // schedule.
    let source_radec = schedule.sources[candidate.source].radec;
    let source_min_elevation = schedule.sources[candidate.source].min_elevation;
    let mut resolved_pointings = Vec::with_capacity(candidate.pointings.len());
    for pv in &candidate.pointings {
        let station = &schedule.stations[pv.station];
        let resolved = match candidate_params.pointing_mode {
            crate::pointing::PointingMode::Fast { .. } => crate::pointing::evaluate_rigorous(
                station,
                pv.station,
                candidate.source,
                source_radec,
                source_min_elevation,
                inputs.params.session_min_elevation_rad,
                candidate.observing_start,
                candidate_params.pointing,
            )
            .map_err(|e| {
                SchedulerError::GeometryNotVisible(format!(
                    "fast-mode candidate failed rigorous re-check at commit: {e}"
                ))
            })?,
            crate::pointing::PointingMode::Rigorous => pv.clone(),
        };
        resolved_pointings.push(resolved);
    }

    for pv in &resolved_pointings {
        let station = &schedule.stations[pv.station];
        let projection = candidate::project_station(pv.station, station, source_radec, clock, &candidate_params, None)
            .ok_or_else(|| SchedulerError::GeometryNotVisible("station dropped out of range at commit time".to_string()))?;

        let slew_start = station.state.committed_until.max(clock);
        let slew_end = slew_start + seconds(projection.slew_seconds);
        let zero_overheads = station.state.first_scan && candidate_params.tagalong_zeroes_first_scan;
        let field_system = if zero_overheads { 0.0 } else { inputs.params.field_system_seconds };
        let preob = if zero_overheads { 0.0 } else { inputs.params.preob_seconds };
        let idle_end = slew_end + seconds(field_system);
        let preob_end = idle_end + seconds(preob);
        let observing_start = candidate.observing_start;
        let observing_end = observing_start + seconds(duration_seconds);
        let postob_end = observing_end + seconds(inputs.params.postob_seconds);

        station_times.push((
            pv.station,
            StationScanTimes {
                slew_start,
                slew_end,
                idle_end,
                preob_end,
                observing_start,
                observing_end,
                postob_end,
            },
        ));
    }

    let station_indices: Vec<StationIndex> = resolved_pointings.iter().map(|pv| pv.station).collect();
    let mut observations = Vec::new();
    for i in 0..station_indices.len() {
        for j in (i + 1)..station_indices.len() {
            let baseline = BaselineId::new(station_indices[i], station_indices[j]);
            if inputs.baselines.get(&baseline).map(|b| b.ignore).unwrap_or(false) {
                continue;
            }
            observations.push(Observation::new(baseline, duration_seconds));
            *counts.per_baseline.entry(baseline).or_insert(0) += 1;
        }
    }

    let scan = Scan {
        source: candidate.source,
        tag,
        pointings: resolved_pointings.clone(),
        station_times,
        observations,
    };

    for (station_index, times) in &scan.station_times {
        let station = &mut schedule.stations[*station_index];
        let pv = resolved_pointings
            .iter()
            .find(|pv| pv.station == *station_index)
            .expect("station_times built from pointings");
        station.state.current_pointing = Some((pv.azel, pv.wrap_section));
        station.state.current_clock = times.postob_end;
        station.state.last_scan_end = Some(times.observing_end);
        station.state.committed_until = times.postob_end;
        station.state.cumulative_observing_time_seconds += duration_seconds;
        station.state.number_of_scans += 1;
        station.state.first_scan = false;

        let area = (inputs.station_to_area)(*station_index);
        if let Some(area) = sky_coverage_areas.get_mut(area) {
            area.record(pv.azel, times.observing_start);
        }

        if counts.per_station.len() <= *station_index {
            counts.per_station.resize(*station_index + 1, 0);
        }
        counts.per_station[*station_index] += 1;
    }

    if counts.per_source.len() <= candidate.source {
        counts.per_source.resize(candidate.source + 1, 0);
    }
    counts.per_source[candidate.source] += 1;

    let source = &mut schedule.sources[candidate.source];
    source.state.last_observed = scan.observing_end();
    source.state.number_of_observations += 1;
    source.state.observation_history.push(station_indices);

    schedule.commit_scan(scan);
    Ok(())
}

/// Advance the clock to the earliest point any station becomes free,
/// guaranteeing forward progress even when that minimum does not exceed
/// the previous clock (spec.md §4.11).
fn next_clock(schedule: &Schedule, previous: Epoch) -> Epoch {
    let earliest = schedule
        .stations
        .iter()
        .map(|s| s.state.committed_until)
        .min()
        .unwrap_or(previous);
    if earliest > previous {
        earliest
    } else {
        previous + seconds(NO_CANDIDATE_CLOCK_STEP_SECONDS)
    }
}

/// A-posteriori fill-in pass (spec.md §4.9): for every station, walk its
/// idle gaps between already-committed scans and try to insert a
/// candidate scan that does not delay the station's next commitment.
fn run_fillin_pass(
    schedule: &mut Schedule,
    counts: &mut ObservationCounts,
    sky_coverage_areas: &mut [SkyCoverageArea],
    inputs: &PlannerInputs,
) -> Result<(), SchedulerError> {
    let candidate_params = inputs.params.candidate_params();
    let station_count = schedule.stations.len();

    for station_index in 0..station_count {
        let mut gap_start = schedule.session_start;
        let scan_starts: Vec<(usize, Epoch)> = schedule
            .scans
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.station_time(station_index).map(|t| (i, t.slew_start)))
            .collect();

        for (scan_index, next_start) in &scan_starts {
            if *next_start <= gap_start {
                if let Some(times) = schedule.scans[*scan_index].station_time(station_index) {
                    gap_start = gap_start.max(times.postob_end);
                }
                continue;
            }

            let candidates = candidate::enumerate_candidates(gap_start, &schedule.stations, &schedule.sources, &candidate_params);
            for cand in candidates {
                if !cand.pointings.iter().any(|pv| pv.station == station_index) {
                    continue;
                }
                let Ok(duration_seconds) = solve_duration(&cand, schedule, inputs) else {
                    continue;
                };
                let postob_end = fillin::projected_postob_end(cand.observing_start, duration_seconds, inputs.params.postob_seconds);
                let checks = vec![FillinStationCheck {
                    station: station_index,
                    projected_postob_end: postob_end,
                    next_commitment_deadline: *next_start,
                }];
                if !fillin::is_fillin_admissible(&checks) {
                    continue;
                }

                commit_fillin(schedule, counts, sky_coverage_areas, inputs, &cand, duration_seconds, gap_start, *scan_index)?;
                break;
            }

            if let Some(times) = schedule.scans[*scan_index].station_time(station_index) {
                gap_start = times.postob_end;
            }
        }
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn commit_fillin(
    schedule: &mut Schedule,
    counts: &mut ObservationCounts,
    sky_coverage_areas: &mut [SkyCoverageArea],
    inputs: &PlannerInputs,
    candidate: &Candidate,
    duration_seconds: f64,
    clock: Epoch,
    before_scan_index: usize,
) -> Result<(), SchedulerError> {
    let candidate_params = inputs.params.candidate_params();
    let mut station_times = Vec::new();

    for pv in &candidate.pointings {
        let station = &schedule.stations[pv.station];
        let source_radec = schedule.sources[candidate.source].radec;
        let projection = candidate::project_station(pv.station, station, source_radec, clock, &candidate_params, None)
            .ok_or_else(|| SchedulerError::GeometryNotVisible("fill-in station dropped out of range".to_string()))?;

        let slew_start = station.state.committed_until.max(clock);
        let slew_end = slew_start + seconds(projection.slew_seconds);
        let idle_end = slew_end + seconds(inputs.params.field_system_seconds);
        let preob_end = idle_end + seconds(inputs.params.preob_seconds);
        let observing_start = candidate.observing_start;
        let observing_end = observing_start + seconds(duration_seconds);
        let postob_end = observing_end + seconds(inputs.params.postob_seconds);

        station_times.push((
            pv.station,
            StationScanTimes {
                slew_start,
                slew_end,
                idle_end,
                preob_end,
                observing_start,
                observing_end,
                postob_end,
            },
        ));
    }

    let station_indices: Vec<StationIndex> = candidate.pointings.iter().map(|pv| pv.station).collect();
    let mut observations = Vec::new();
    for i in 0..station_indices.len() {
        for j in (i + 1)..station_indices.len() {
            let baseline = BaselineId::new(station_indices[i], station_indices[j]);
            observations.push(Observation::new(baseline, duration_seconds));
            *counts.per_baseline.entry(baseline).or_insert(0) += 1;
        }
    }

    let scan = Scan {
        source: candidate.source,
        tag: ScanTag::Fillin,
        pointings: candidate.pointings.clone(),
        station_times,
        observations,
    };

    for (station_index, times) in &scan.station_times {
        let station = &mut schedule.stations[*station_index];
        let pv = candidate
            .pointings
            .iter()
            .find(|pv| pv.station == *station_index)
            .expect("station_times built from pointings");
        station.state.current_pointing = Some((pv.azel, pv.wrap_section));
        station.state.last_scan_end = Some(times.observing_end);
        station.state.cumulative_observing_time_seconds += duration_seconds;
        station.state.number_of_scans += 1;
        station.state.first_scan = false;
        // Deliberately do not advance `committed_until`: a fill-in scan
        // must not delay the station's already-committed next scan,
        // which is the admissibility check this function's caller
        // already performed.

        let area = (inputs.station_to_area)(*station_index);
        if let Some(area) = sky_coverage_areas.get_mut(area) {
            area.record(pv.azel, times.observing_start);
        }

        if counts.per_station.len() <= *station_index {
            counts.per_station.resize(*station_index + 1, 0);
        }
        counts.per_station[*station_index] += 1;
    }

    if counts.per_source.len() <= candidate.source {
        counts.per_source.resize(candidate.source + 1, 0);
    }
    counts.per_source[candidate.source] += 1;

    let source = &mut schedule.sources[candidate.source];
    source.state.last_observed = scan.observing_end();
    source.state.number_of_observations += 1;
    source.state.observation_history.push(station_indices);

    let insertion_index = before_scan_index.min(schedule.scans.len());
    schedule.insert_fillin(insertion_index, scan);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mount::WrapPolicy;
    use crate::obsmode::ObservingModeTable;
    use crate::pointing::PointingParams;

    fn resolved_params() -> ResolvedParameters {
        ResolvedParameters {
            session_start: Epoch::from_gregorian_utc_at_midnight(2020, 1, 1),
            session_end: Epoch::from_gregorian_utc_at_midnight(2020, 1, 1) + seconds(3600.0),
            field_system_seconds: 10.0,
            preob_seconds: 5.0,
            postob_seconds: 5.0,
            min_scan_seconds: 30.0,
            max_scan_seconds: 300.0,
            max_slew_seconds: 600.0,
            max_wait_seconds: 1800.0,
            default_min_stations: 2,
            session_min_elevation_rad: 5_f64.to_radians(),
            min_sun_distance_rad: 5_f64.to_radians(),
            max_clock_advances: 100,
            max_total_obs_time_seconds: f64::MAX,
            max_number_of_scans: 10,
            wrap_policy: WrapPolicy::UnwrapNear,
            tagalong_zeroes_first_scan: true,
            exclude_calibration_only_equipment: true,
            fillin_during_selection: false,
            subnetting: crate::config::SubnettingConfig {
                enabled: false,
                min_angle_deg: 30.0,
                min_participating_stations: 4,
            },
            pointing_mode: crate::pointing::PointingMode::Rigorous,
        }
    }

    fn two_station_setup() -> (Vec<Station>, Vec<Source>) {
        let mut a = crate::tests_support::dummy_station();
        a.name = "A".to_string();
        a.id = crate::model::station::StationId(0);
        let mut b = crate::tests_support::dummy_station();
        b.name = "B".to_string();
        b.id = crate::model::station::StationId(1);
        b.position = crate::coord::Geocentric::new(6_000_000.0, 1_000_000.0, 0.0);

        let source = crate::tests_support::dummy_source(0, 0.0, 0.0);
        (vec![a, b], vec![source])
    }

    fn inputs() -> (ResolvedParameters, WeightContext, ModeDescriptor) {
        let params = resolved_params();
        let weights = crate::config::WeightFactorsConfig::default().resolve();
        let mode = ObservingModeTable::default_geodetic().get("geodetic-sx").unwrap().clone();
        (params, weights, mode)
    }

    #[test]
    fn no_stations_or_sources_yields_empty_schedule_without_error() {
        let (params, weights, mode) = inputs();
        let station_to_area = |s: usize| s;
        let planner_inputs = PlannerInputs {
            params,
            weights,
            baselines: HashMap::new(),
            mode,
            bands: vec!["S".to_string(), "X".to_string()],
            sky_coverage_areas: vec![],
            station_to_area: &station_to_area,
            rules: crate::rules::RulesConfig::default(),
        };
        let schedule = build_schedule(vec![], vec![], &planner_inputs).unwrap();
        assert!(schedule.scans.is_empty());
    }

    #[test]
    fn two_station_session_with_no_flux_model_produces_no_scans_but_no_error() {
        // With no flux model, `solve_duration` returns the floor
        // `min_scan_seconds` since no band contributes a tau, so a scan
        // should in fact be scheduled; this test establishes that the
        // planner does not error out when equipment/flux data is absent.
        let (stations, sources) = two_station_setup();
        let (params, weights, mode) = inputs();
        let areas = vec![crate::skycoverage::SkyCoverageArea::new(
            10_f64.to_radians(),
            hifitime::Duration::from_f64(3600.0, hifitime::Unit::Second),
            crate::skycoverage::FalloffShape::Linear,
            crate::skycoverage::FalloffShape::Linear,
        )];
        let station_to_area = |_s: usize| 0;
        let planner_inputs = PlannerInputs {
            params,
            weights,
            baselines: HashMap::new(),
            mode,
            bands: vec!["S".to_string(), "X".to_string()],
            sky_coverage_areas: areas,
            station_to_area: &station_to_area,
            rules: crate::rules::RulesConfig::default(),
        };
        let schedule = build_schedule(stations, sources, &planner_inputs).unwrap();
        assert!(!schedule.scans.is_empty());
        assert_eq!(schedule.scans[0].pointings.len(), 2);
    }

    #[test]
    fn calibrator_rule_tags_first_scan_as_calibrator() {
        let (stations, mut sources) = two_station_setup();
        sources[0].groups.push("calibrators".to_string());
        let (params, weights, mode) = inputs();
        let rules = crate::rules::RulesConfig {
            calibrator: Some(crate::rules::CalibratorBlockConfig {
                cadence: crate::rules::CalibratorCadence::EveryNScans(0),
                min_calibrator_scans: 1,
                source_group: "calibrators".to_string(),
                target_low_elevation_rad: 0.0,
                target_high_elevation_rad: 0.0,
            }),
            high_impact_targets: vec![],
            focus_corner_cadence: None,
            focus_corner_score_bonus: 0.0,
        };
        let areas = vec![crate::skycoverage::SkyCoverageArea::new(
            10_f64.to_radians(),
            hifitime::Duration::from_f64(3600.0, hifitime::Unit::Second),
            crate::skycoverage::FalloffShape::Linear,
            crate::skycoverage::FalloffShape::Linear,
        )];
        let station_to_area = |_s: usize| 0;
        let planner_inputs = PlannerInputs {
            params,
            weights,
            baselines: HashMap::new(),
            mode,
            bands: vec!["S".to_string(), "X".to_string()],
            sky_coverage_areas: areas,
            station_to_area: &station_to_area,
            rules,
        };
        let schedule = build_schedule(stations, sources, &planner_inputs).unwrap();
        assert!(!schedule.scans.is_empty());
        assert_eq!(schedule.scans[0].tag, ScanTag::Calibrator);
    }

    #[test]
    fn high_impact_target_tags_matching_scan() {
        let (stations, sources) = two_station_setup();
        let (params, weights, mode) = inputs();
        let rules = crate::rules::RulesConfig {
            calibrator: None,
            high_impact_targets: vec![crate::rules::HighImpactTarget {
                station: 0,
                target_azel: crate::coord::AzEl::new(0.0, 0.0),
                margin_rad: crate::constants::TAU,
                interval_seconds: 0.0,
                score_bonus: 1000.0,
            }],
            focus_corner_cadence: None,
            focus_corner_score_bonus: 0.0,
        };
        let areas = vec![crate::skycoverage::SkyCoverageArea::new(
            10_f64.to_radians(),
            hifitime::Duration::from_f64(3600.0, hifitime::Unit::Second),
            crate::skycoverage::FalloffShape::Linear,
            crate::skycoverage::FalloffShape::Linear,
        )];
        let station_to_area = |_s: usize| 0;
        let planner_inputs = PlannerInputs {
            params,
            weights,
            baselines: HashMap::new(),
            mode,
            bands: vec!["S".to_string(), "X".to_string()],
            sky_coverage_areas: areas,
            station_to_area: &station_to_area,
            rules,
        };
        let schedule = build_schedule(stations, sources, &planner_inputs).unwrap();
        assert!(!schedule.scans.is_empty());
        assert_eq!(schedule.scans[0].tag, ScanTag::HighImpact);
    }

    #[test]
    fn empty_pointing_params_are_unused_directly() {
        // Sanity check that PointingParams/WrapPolicy remain importable
        // from this module's test scope without warnings.
        let _ = PointingParams {
            min_sun_distance_rad: 0.0,
            wrap_policy: WrapPolicy::UnwrapNear,
        };
    }
}
