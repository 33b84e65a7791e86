// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Candidate enumerator (component C9): projects each station's
//! committed-until time forward through field-system + preob + slew,
//! using the fast pointing evaluator, per spec.md §4.6.

use hifitime::{Duration, Epoch, Unit};

use crate::model::pointing_vector::PointingVector;
use crate::model::source::Source;
use crate::model::station::Station;
use crate::model::{SourceIndex, StationIndex};
use crate::mount::WrapPolicy;
use crate::pointing::{self, AzElGrid, PointingMode, PointingParams};

/// Session-wide timing overheads and per-station admissibility limits
/// used by the enumerator, per spec.md §4.6.
#[derive(Clone, Copy, Debug)]
pub struct CandidateParams {
    pub field_system_seconds: f64,
    pub preob_seconds: f64,
    pub max_slew_seconds: f64,
    pub max_wait_seconds: f64,
    pub default_min_stations: usize,
    pub session_min_elevation_rad: f64,
    pub pointing: PointingParams,
    /// Resolution of spec.md §9's open question: whether a station's
    /// `firstScan` zeroing of field-system/preob/slew also applies while
    /// it is in tagalong mode. Default `true` (unconditional zeroing).
    pub tagalong_zeroes_first_scan: bool,
    /// Rigorous vs. fast pointing evaluation during enumeration (spec.md
    /// §4.3/§9).
    pub pointing_mode: PointingMode,
}

/// One subconsidered scan: a definite station set, a common earliest
/// feasible observing start, and the per-station pointing vectors,
/// per spec.md §4.6.
#[derive(Clone, Debug)]
pub struct Candidate {
    pub source: SourceIndex,
    pub observing_start: Epoch,
    pub pointings: Vec<PointingVector>,
}

fn seconds(s: f64) -> Duration {
    Duration::from_f64(s, Unit::Second)
}

/// Per-station projection result before the common start is reconciled
/// across the scan's station set.
pub(crate) struct StationProjection {
    pub station: StationIndex,
    pub earliest_start: Epoch,
    pub slew_seconds: f64,
    pub wait_seconds: f64,
}

pub(crate) fn project_station(
    station_index: StationIndex,
    station: &Station,
    source_radec: crate::coord::RADec,
    clock: Epoch,
    params: &CandidateParams,
    fast_grid: Option<&AzElGrid>,
) -> Option<StationProjection> {
    let committed = station.state.committed_until.max(clock);
    let wait_seconds = (committed - clock).to_seconds().max(0.0);
    if wait_seconds > params.max_wait_seconds {
        return None;
    }

    // Resolved open question (spec.md §9): firstScan zeroes field-system,
    // preob, and slew overheads unconditionally, including for stations
    // joining in tagalong mode; `tagalong_zeroes_first_scan` lets a config
    // opt back into the alternate (non-zeroing) interpretation.
    let zero_overheads = station.state.first_scan && params.tagalong_zeroes_first_scan;
    let current_azel = station.state.current_pointing.map(|(azel, _)| azel);

    let slew_seconds = if zero_overheads {
        0.0
    } else {
        match fast_grid {
            Some(grid) => {
                let (az, el) = grid.interpolate(committed)?;
                station.mount.fast_slew_estimate(current_azel, az, el)
            }
            None => {
                let geodetic = station.position.to_geodetic();
                let current_wrap = station.state.current_pointing.map(|(_, wrap)| wrap);
                let apparent = crate::coord::precession::j2000_to_apparent(source_radec, committed);
                station
                    .mount
                    .solve_slew(
                        current_azel,
                        current_wrap,
                        apparent,
                        committed,
                        geodetic.longitude,
                        geodetic.latitude,
                        params.pointing.wrap_policy,
                    )
                    .ok()?
                    .slew_time_seconds
            }
        }
    };
    if slew_seconds > params.max_slew_seconds {
        return None;
    }

    let field_system = if zero_overheads { 0.0 } else { params.field_system_seconds };
    let preob = if zero_overheads { 0.0 } else { params.preob_seconds };
    let earliest_start = committed + seconds(field_system + preob + slew_seconds);

    Some(StationProjection {
        station: station_index,
        earliest_start,
        slew_seconds,
        wait_seconds,
    })
}

/// Enumerate subconsidered scans for every non-ignored, non-repeat-
/// blocked source, at the current clock, per spec.md §4.6.
pub fn enumerate_candidates(
    clock: Epoch,
    stations: &[Station],
    sources: &[Source],
    params: &CandidateParams,
) -> Vec<Candidate> {
    let mut candidates = Vec::new();

    // In fast mode, the grid spans every epoch this tick's projections
    // and final pointing evaluation could touch: from `clock` out past
    // the longest admissible wait plus slew.
    let grid_span_seconds = params.max_wait_seconds + params.max_slew_seconds;

    for (source_index, source) in sources.iter().enumerate() {
        if source.ignore {
            continue;
        }
        if !source.min_repeat_elapsed(clock) {
            continue;
        }

        let grids: Option<Vec<AzElGrid>> = match params.pointing_mode {
            PointingMode::Rigorous => None,
            PointingMode::Fast { tick_seconds } => Some(
                stations
                    .iter()
                    .map(|station| {
                        AzElGrid::build(
                            station,
                            source.radec,
                            clock,
                            clock + seconds(grid_span_seconds),
                            tick_seconds,
                        )
                    })
                    .collect(),
            ),
        };

        let mut projections = Vec::new();
        for (station_index, station) in stations.iter().enumerate() {
            if source.excluded_stations.contains(&station_index) {
                continue;
            }
            let fast_grid = grids.as_ref().map(|g| &g[station_index]);
            if let Some(proj) = project_station(station_index, station, source.radec, clock, params, fast_grid)
            {
                projections.push(proj);
            }
        }

        if !source.required_stations.is_empty() {
            let all_required_present = source
                .required_stations
                .iter()
                .all(|r| projections.iter().any(|p| p.station == *r));
            if !all_required_present {
                continue;
            }
        }

        let min_stations = source.min_stations.unwrap_or(params.default_min_stations);
        if projections.len() < min_stations {
            continue;
        }

        let common_start = match projections.iter().map(|p| p.earliest_start).max() {
            Some(t) => t,
            None => continue,
        };

        let mut pointings = Vec::new();
        for proj in &projections {
            let station = &stations[proj.station];
            let result = match &grids {
                Some(grids) => pointing::evaluate_fast(
                    station,
                    proj.station,
                    source_index,
                    &grids[proj.station],
                    source.min_elevation,
                    params.session_min_elevation_rad,
                    common_start,
                ),
                None => pointing::evaluate_rigorous(
                    station,
                    proj.station,
                    source_index,
                    source.radec,
                    source.min_elevation,
                    params.session_min_elevation_rad,
                    common_start,
                    params.pointing,
                ),
            };
            if let Ok(pv) = result {
                pointings.push(pv);
            }
        }

        if pointings.len() < min_stations {
            continue;
        }

        candidates.push(Candidate {
            source: source_index,
            observing_start: common_start,
            pointings,
        });
    }

    candidates
}
