// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! End-to-end seed scenarios (spec.md §8): each test builds a complete
//! schedule through the public [`vlbisched::planner::build_schedule`]
//! entry point from a small hand-built station/source network, exercising
//! the planner as an external caller would rather than via crate-internal
//! fixtures.

use std::collections::HashMap;

use hifitime::{Duration, Epoch, Unit};

use vlbisched::config::{ResolvedParameters, SubnettingConfig, WeightFactorsConfig};
use vlbisched::coord::{Geocentric, Geodetic, RADec};
use vlbisched::horizon::HorizonMask;
use vlbisched::model::baseline::BaselineId;
use vlbisched::model::source::{Source, SourceId, SourceState};
use vlbisched::model::station::{BandEquipment, Station, StationId, StationState};
use vlbisched::model::StationIndex;
use vlbisched::mount::{AxisLimits, Mount, MountType, WrapPolicy};
use vlbisched::obsmode::ObservingModeTable;
use vlbisched::planner::{build_schedule, PlannerInputs};
use vlbisched::rules::RulesConfig;
use vlbisched::skycoverage::{FalloffShape, SkyCoverageArea};

fn seconds(s: f64) -> Duration {
    Duration::from_f64(s, Unit::Second)
}

fn session_start() -> Epoch {
    Epoch::from_gregorian_utc_at_midnight(2020, 1, 1) + seconds(12.0 * 3600.0)
}

/// A station position at the given geodetic latitude/longitude (degrees),
/// at the WGS84 ellipsoid surface.
fn geodetic_position(lat_deg: f64, lon_deg: f64) -> Geocentric {
    Geodetic {
        latitude: lat_deg.to_radians(),
        longitude: lon_deg.to_radians(),
        height: 0.0,
    }
    .to_geocentric()
}

/// An unobstructed AzEl station at the given geocentric position.
fn open_station(id: u32, name: &str, position: Geocentric) -> Station {
    Station {
        id: StationId(id),
        name: name.to_string(),
        one_letter_code: name.chars().next().unwrap_or('X'),
        two_letter_code: name.chars().take(2).collect(),
        position,
        mount: Mount {
            mount_type: MountType::AzEl,
            axis1: AxisLimits {
                max_rate_rad_per_s: 1_f64.to_radians() * 60.0,
                overhead_seconds: 5.0,
                min_rad: -1000_f64.to_radians(),
                max_rad: 1000_f64.to_radians(),
            },
            axis2: AxisLimits {
                max_rate_rad_per_s: 1_f64.to_radians() * 60.0,
                overhead_seconds: 5.0,
                min_rad: 0.0,
                max_rad: std::f64::consts::FRAC_PI_2,
            },
            wrap_sections: vec![],
        },
        horizon_mask: HorizonMask::Step { bins: vec![(0.0, 0.0)] },
        equipment: {
            let mut m = HashMap::new();
            m.insert(
                "S".to_string(),
                BandEquipment { sefd: 500.0, calibration_only: false },
            );
            m.insert(
                "X".to_string(),
                BandEquipment { sefd: 500.0, calibration_only: false },
            );
            m
        },
        min_elevation: None,
        state: StationState {
            current_pointing: None,
            current_clock: session_start(),
            last_scan_end: None,
            committed_until: session_start(),
            cumulative_observing_time_seconds: 0.0,
            number_of_scans: 0,
            first_scan: true,
        },
    }
}

/// A masked station rejecting everything below the given elevation.
fn masked_station(id: u32, name: &str, position: Geocentric, min_elevation_deg: f64) -> Station {
    let mut station = open_station(id, name, position);
    station.horizon_mask = HorizonMask::Step { bins: vec![(0.0, min_elevation_deg.to_radians())] };
    station
}

fn source(id: u32, name: &str, ra_deg: f64, dec_deg: f64) -> Source {
    Source {
        id: SourceId(id),
        name: name.to_string(),
        radec: RADec::new_degrees(ra_deg, dec_deg),
        flux_models: Vec::new(),
        min_elevation: None,
        min_stations: None,
        excluded_stations: Vec::new(),
        required_stations: Vec::new(),
        min_repeat: seconds(0.0),
        ignore: false,
        focus_factor: None,
        groups: Vec::new(),
        state: SourceState { last_observed: None, number_of_observations: 0, observation_history: Vec::new() },
    }
}

fn base_params(session_minutes: f64) -> ResolvedParameters {
    ResolvedParameters {
        session_start: session_start(),
        session_end: session_start() + seconds(session_minutes * 60.0),
        field_system_seconds: 5.0,
        preob_seconds: 5.0,
        postob_seconds: 0.0,
        min_scan_seconds: 60.0,
        max_scan_seconds: 60.0,
        max_slew_seconds: 600.0,
        max_wait_seconds: 1800.0,
        default_min_stations: 2,
        session_min_elevation_rad: 0_f64.to_radians(),
        min_sun_distance_rad: 0_f64.to_radians(),
        max_clock_advances: 10_000,
        max_total_obs_time_seconds: f64::MAX,
        max_number_of_scans: 10_000,
        wrap_policy: WrapPolicy::UnwrapNear,
        tagalong_zeroes_first_scan: true,
        exclude_calibration_only_equipment: true,
        fillin_during_selection: false,
        subnetting: SubnettingConfig { enabled: false, min_angle_deg: 30.0, min_participating_stations: 4 },
        pointing_mode: vlbisched::pointing::PointingMode::Rigorous,
    }
}

fn default_areas() -> Vec<SkyCoverageArea> {
    vec![SkyCoverageArea::new(10_f64.to_radians(), seconds(3600.0), FalloffShape::Linear, FalloffShape::Linear)]
}

/// Scenario 1: two stations, one source, fixed 60-second scans for one
/// hour. At least 30 scans should be committed and the schedule must not
/// run past the session end.
///
/// Station latitude 55N and source declination +60 deg are chosen so the
/// source is circumpolar (never sets: lat + dec - 90 = 25 deg > 0) at
/// both stations for the whole session, regardless of the session's
/// starting sidereal time.
#[test]
fn two_station_one_source_produces_many_fixed_duration_scans() {
    let a = open_station(0, "A", geodetic_position(55.0, 0.0));
    let b = open_station(1, "B", geodetic_position(55.0, 90.0));
    let src = source(0, "SRC", 0.0, 60.0);

    let params = base_params(60.0);
    let weights = WeightFactorsConfig::default().resolve();
    let mode = ObservingModeTable::default_geodetic().get("geodetic-sx").unwrap().clone();
    let station_to_area = |_s: usize| 0;

    let inputs = PlannerInputs {
        params,
        weights,
        baselines: HashMap::new(),
        mode,
        bands: vec!["S".to_string(), "X".to_string()],
        sky_coverage_areas: default_areas(),
        station_to_area: &station_to_area,
        rules: RulesConfig::default(),
    };

    let schedule = build_schedule(vec![a, b], vec![src], &inputs).expect("schedule should build");

    assert!(schedule.scans.len() >= 30, "expected at least 30 scans, got {}", schedule.scans.len());
    let last_end = schedule
        .scans
        .iter()
        .flat_map(|s| s.pointings.iter().map(|p| p.epoch))
        .max()
        .expect("at least one scan");
    assert!(last_end <= schedule.session_end);
}

/// Scenario 2: a horizon mask requiring el >= 85 degrees rejects every
/// candidate. Station latitude 55N and source declination +40 deg cap the
/// source's transit elevation at 90 - |55 - 40| = 75 deg, below the mask's
/// 85 deg cutoff at every hour angle, so zero scans are committed and the
/// build still returns `Ok`.
#[test]
fn restrictive_horizon_mask_yields_zero_scans() {
    let station = masked_station(0, "A", geodetic_position(55.0, 0.0), 85.0);
    let src = source(0, "SRC", 0.0, 40.0);

    let params = base_params(60.0);
    let weights = WeightFactorsConfig::default().resolve();
    let mode = ObservingModeTable::default_geodetic().get("geodetic-sx").unwrap().clone();
    let station_to_area = |_s: usize| 0;

    let inputs = PlannerInputs {
        params,
        weights,
        baselines: HashMap::new(),
        mode,
        bands: vec!["S".to_string(), "X".to_string()],
        sky_coverage_areas: default_areas(),
        station_to_area: &station_to_area,
        rules: RulesConfig::default(),
    };

    let schedule = build_schedule(vec![station], vec![src], &inputs).expect("build should not error");
    assert!(schedule.scans.is_empty());
}

/// Boundary: zero sources terminates immediately with an empty schedule.
#[test]
fn zero_sources_terminates_with_empty_schedule() {
    let station = open_station(0, "A", Geocentric::new(6_378_137.0, 0.0, 0.0));

    let params = base_params(60.0);
    let weights = WeightFactorsConfig::default().resolve();
    let mode = ObservingModeTable::default_geodetic().get("geodetic-sx").unwrap().clone();
    let station_to_area = |_s: usize| 0;

    let inputs = PlannerInputs {
        params,
        weights,
        baselines: HashMap::new(),
        mode,
        bands: vec!["S".to_string(), "X".to_string()],
        sky_coverage_areas: default_areas(),
        station_to_area: &station_to_area,
        rules: RulesConfig::default(),
    };

    let schedule = build_schedule(vec![station], vec![], &inputs).expect("empty source list should not error");
    assert!(schedule.scans.is_empty());
}

/// Boundary: a station with every source ignored is never committed.
#[test]
fn station_with_all_sources_ignored_is_never_committed() {
    let a = open_station(0, "A", Geocentric::new(6_378_137.0, 0.0, 0.0));
    let b = open_station(1, "B", Geocentric::new(0.0, 6_378_137.0, 0.0));
    let mut src = source(0, "SRC", 0.0, 0.0);
    src.ignore = true;

    let params = base_params(30.0);
    let weights = WeightFactorsConfig::default().resolve();
    let mode = ObservingModeTable::default_geodetic().get("geodetic-sx").unwrap().clone();
    let station_to_area = |_s: usize| 0;

    let inputs = PlannerInputs {
        params,
        weights,
        baselines: HashMap::new(),
        mode,
        bands: vec!["S".to_string(), "X".to_string()],
        sky_coverage_areas: default_areas(),
        station_to_area: &station_to_area,
        rules: RulesConfig::default(),
    };

    let schedule = build_schedule(vec![a, b], vec![src], &inputs).expect("build should not error");
    assert_eq!(schedule.stations[0].state.number_of_scans, 0);
    assert_eq!(schedule.stations[1].state.number_of_scans, 0);
}

/// Scenario 4: six stations and two sources separated by 60 degrees on
/// the sky, subnetting enabled with a permissive minimum angle. At least
/// one committed scan should involve every station (a subnetting pair
/// spanning the network).
///
/// Both sources sit at declination +60 deg (circumpolar at every 55N
/// station: lat + dec - 90 = 25 deg > 0) 180 degrees apart in right
/// ascension, which puts them 60 degrees apart on the sky (spherical law
/// of cosines: cos(sep) = sin^2(dec) - cos^2(dec) = -cos(2*dec) = 0.5 for
/// dec = 60 deg) — comfortably past the 30 degree minimum separation, and
/// visible from every station for the whole session. Each source
/// explicitly excludes the other source's three-station group, so the
/// two candidates the planner enumerates are always disjoint and the
/// subnetting solver has an unambiguous admissible pair to find.
#[test]
fn subnetting_with_six_stations_two_far_apart_sources() {
    let stations = vec![
        open_station(0, "A", geodetic_position(55.0, 0.0)),
        open_station(1, "B", geodetic_position(55.0, 60.0)),
        open_station(2, "C", geodetic_position(55.0, 120.0)),
        open_station(3, "D", geodetic_position(55.0, 180.0)),
        open_station(4, "E", geodetic_position(55.0, 240.0)),
        open_station(5, "F", geodetic_position(55.0, 300.0)),
    ];
    let mut north = source(0, "N", 0.0, 60.0);
    north.excluded_stations = vec![3, 4, 5];
    let mut south = source(1, "S", 180.0, 60.0);
    south.excluded_stations = vec![0, 1, 2];
    let sources = vec![north, south];

    let mut params = base_params(120.0);
    params.default_min_stations = 3;
    params.subnetting = SubnettingConfig { enabled: true, min_angle_deg: 30.0, min_participating_stations: 6 };
    let weights = WeightFactorsConfig::default().resolve();
    let mode = ObservingModeTable::default_geodetic().get("geodetic-sx").unwrap().clone();
    let station_to_area = |_s: usize| 0;

    let inputs = PlannerInputs {
        params,
        weights,
        baselines: HashMap::new(),
        mode,
        bands: vec!["S".to_string(), "X".to_string()],
        sky_coverage_areas: default_areas(),
        station_to_area: &station_to_area,
        rules: RulesConfig::default(),
    };

    let schedule = build_schedule(stations, sources, &inputs).expect("schedule should build");
    assert!(!schedule.scans.is_empty());

    // Subnetting commits each half of an admissible pair as its own Scan,
    // both sharing the same observing_start; look for two disjoint-station
    // scans at the same epoch whose stations cover the whole network.
    let found_pair = schedule.scans.iter().enumerate().any(|(i, s1)| {
        schedule.scans.iter().skip(i + 1).any(|s2| {
            s1.observing_start().is_some()
                && s1.observing_start() == s2.observing_start()
                && s1.stations().all(|st| !s2.stations().any(|o| o == st))
                && s1.pointings.len() + s2.pointings.len() == 6
        })
    });
    assert!(found_pair, "expected a subnetting pair of scans together spanning all six stations");
}

/// Scenario 3: cable-wrap disambiguation holds across a built schedule,
/// not just in an isolated `Mount::solve_slew` call. A station with
/// overlapping wrap sections tracking a near-pole source (fast azimuth
/// motion near transit) must keep picking the unwrapped axis-1 candidate
/// nearest its own previous pointing, so consecutive scans never jump by
/// a full wrap even though the source's raw (mod 2*pi) azimuth does.
#[test]
fn cable_wrap_disambiguation_holds_across_consecutive_scans() {
    let mut station = open_station(0, "A", geodetic_position(80.0, 0.0));
    station.mount.axis1 = AxisLimits {
        max_rate_rad_per_s: 10_f64.to_radians(),
        overhead_seconds: 1.0,
        min_rad: (-540_f64).to_radians(),
        max_rad: 540_f64.to_radians(),
    };
    station.mount.wrap_sections = vec![
        (
            vlbisched::mount::CableWrapSection::CounterClockwise,
            AxisLimits {
                max_rate_rad_per_s: 10_f64.to_radians(),
                overhead_seconds: 1.0,
                min_rad: (-540_f64).to_radians(),
                max_rad: 180_f64.to_radians(),
            },
        ),
        (
            vlbisched::mount::CableWrapSection::Clockwise,
            AxisLimits {
                max_rate_rad_per_s: 10_f64.to_radians(),
                overhead_seconds: 1.0,
                min_rad: (-180_f64).to_radians(),
                max_rad: 540_f64.to_radians(),
            },
        ),
    ];

    let mut src = source(0, "SRC", 0.0, 85.0);
    src.min_stations = Some(1);

    let mut params = base_params(180.0);
    params.default_min_stations = 1;
    params.max_slew_seconds = 3600.0;
    let weights = WeightFactorsConfig::default().resolve();
    let mode = ObservingModeTable::default_geodetic().get("geodetic-sx").unwrap().clone();
    let station_to_area = |_s: usize| 0;

    let inputs = PlannerInputs {
        params,
        weights,
        baselines: HashMap::new(),
        mode,
        bands: vec!["S".to_string(), "X".to_string()],
        sky_coverage_areas: default_areas(),
        station_to_area: &station_to_area,
        rules: RulesConfig::default(),
    };

    let schedule = build_schedule(vec![station], vec![src], &inputs).expect("schedule should build");
    assert!(schedule.scans.len() >= 2, "need multiple scans to compare consecutive pointings");

    for pair in schedule.scans.windows(2) {
        let a = pair[0].pointings[0].unwrapped_axis1;
        let b = pair[1].pointings[0].unwrapped_axis1;
        assert!(
            (a - b).abs() < 300_f64.to_radians(),
            "consecutive scans jumped by nearly a full wrap instead of disambiguating against the previous pointing: {} -> {}",
            a,
            b
        );
    }
}

/// Scenario 5: a fill-in scan gets inserted into a station's otherwise
/// idle window ahead of its first regular commitment, without delaying
/// that commitment.
#[test]
fn fillin_pass_inserts_a_scan_ahead_of_first_commitment() {
    let a = open_station(0, "A", geodetic_position(55.0, 0.0));
    let b = open_station(1, "B", geodetic_position(55.0, 120.0));
    let c = open_station(2, "C", geodetic_position(55.0, 240.0));

    let mut main_source = source(0, "MAIN", 0.0, 60.0);
    main_source.excluded_stations = vec![1];
    main_source.min_repeat = seconds(24.0 * 3600.0);

    let mut filler_source = source(1, "FILLER", 180.0, 60.0);
    filler_source.excluded_stations = vec![0, 2];
    filler_source.min_stations = Some(1);

    let mut params = base_params(20.0);
    params.fillin_during_selection = true;
    let weights = WeightFactorsConfig::default().resolve();
    let mode = ObservingModeTable::default_geodetic().get("geodetic-sx").unwrap().clone();
    let station_to_area = |_s: usize| 0;

    let inputs = PlannerInputs {
        params,
        weights,
        baselines: HashMap::new(),
        mode,
        bands: vec!["S".to_string(), "X".to_string()],
        sky_coverage_areas: default_areas(),
        station_to_area: &station_to_area,
        rules: RulesConfig::default(),
    };

    let schedule =
        build_schedule(vec![a, b, c], vec![main_source, filler_source], &inputs).expect("schedule should build");

    let b_scan_count = schedule.scans.iter().filter(|s| s.stations().any(|st| st == 1)).count();
    assert!(b_scan_count >= 2, "expected B's first regular commitment plus at least one fill-in scan ahead of it, got {b_scan_count}");
    assert!(
        schedule.scans.iter().any(|s| s.tag == vlbisched::model::scan::ScanTag::Fillin),
        "expected at least one scan tagged as a fill-in"
    );
}

/// Scenario 6: multi-schedule grid determinism. Each grid point in the
/// multi-schedule driver rebuilds a schedule independently (potentially
/// on a different thread); the same weight-factor vector run through
/// `build_schedule` twice must produce identical schedules.
#[test]
fn identical_weight_vectors_produce_identical_schedules() {
    let build = || {
        let a = open_station(0, "A", geodetic_position(55.0, 0.0));
        let b = open_station(1, "B", geodetic_position(55.0, 90.0));
        let src = source(0, "SRC", 0.0, 60.0);

        let params = base_params(60.0);
        let mut weight_factors = WeightFactorsConfig::default();
        weight_factors.apply_axis("sky_coverage", 2.0);
        weight_factors.apply_axis("idle_time", 0.5);
        let weights = weight_factors.resolve();
        let mode = ObservingModeTable::default_geodetic().get("geodetic-sx").unwrap().clone();
        let station_to_area = |_s: usize| 0;

        let inputs = PlannerInputs {
            params,
            weights,
            baselines: HashMap::new(),
            mode,
            bands: vec!["S".to_string(), "X".to_string()],
            sky_coverage_areas: default_areas(),
            station_to_area: &station_to_area,
            rules: RulesConfig::default(),
        };
        build_schedule(vec![a, b], vec![src], &inputs).expect("schedule should build")
    };

    let first = build();
    let second = build();

    assert_eq!(first.scans.len(), second.scans.len());
    let first_starts: Vec<_> = first.scans.iter().filter_map(|s| s.observing_start()).collect();
    let second_starts: Vec<_> = second.scans.iter().filter_map(|s| s.observing_start()).collect();
    assert_eq!(first_starts, second_starts);

    let first_total: f64 = (0..first.stations.len()).map(|i| first.total_observing_seconds(i)).sum();
    let second_total: f64 = (0..second.stations.len()).map(|i| second.total_observing_seconds(i)).sum();
    approx::assert_abs_diff_eq!(first_total, second_total, epsilon = 1e-9);
}

/// Derived baselines for a small network are unordered and symmetric.
#[test]
fn baseline_id_construction_is_order_independent() {
    let a: StationIndex = 0;
    let b: StationIndex = 1;
    assert_eq!(BaselineId::new(a, b), BaselineId::new(b, a));
}
