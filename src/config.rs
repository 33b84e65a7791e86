// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Configuration model (ambient component A3): in-memory parameter-group
//! and weight-factor types, `serde`-deserialized from TOML, standing in
//! for the out-of-scope XML configuration reader. A thin adapter (any
//! code populating [`SessionConfig`] by hand) can stand in for a real XML
//! reader without touching anything downstream.

use std::collections::HashMap;

use hifitime::Epoch;
use serde::{Deserialize, Serialize};

use crate::candidate::CandidateParams;
use crate::error::SchedulerError;
use crate::model::baseline::{Baseline, BaselineId};
use crate::model::source::Source;
use crate::model::station::Station;
use crate::mount::WrapPolicy;
use crate::pointing::{PointingMode, PointingParams};
use crate::quality::{GroupBaselineCondition, HardConditions, QualityWeights};
use crate::rules::{CalibratorCadence, HighImpactTarget, RulesConfig};
use crate::skycoverage::FalloffShape;

/// A per-station-pair override on baseline `min_snr`/ignore/weight, as
/// loaded from configuration (spec.md §3's "Baseline... carries per-band
/// minimum-SNR overrides and an ignore flag", grounded in
/// `Misc/MultiScheduling.h`'s per-baseline axis maps).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BaselineOverrideToml {
    pub station_a: String,
    pub station_b: String,
    #[serde(default)]
    pub min_snr: HashMap<String, f64>,
    #[serde(default)]
    pub ignore: bool,
    #[serde(default = "default_baseline_weight")]
    pub weight: f64,
}

fn default_baseline_weight() -> f64 {
    1.0
}

/// Mirrors [`WrapPolicy`] for (de)serialization; a bare string tag or a
/// tagged section name, per spec.md §9's "CCW"/"N"/"CW" parse-time
/// mapping.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WrapPolicyConfig {
    UnwrapNear,
    UnwrapClockwise,
    UnwrapNeutral,
    UnwrapCounterClockwise,
}

impl WrapPolicyConfig {
    pub fn resolve(&self) -> WrapPolicy {
        use crate::mount::CableWrapSection;
        match self {
            WrapPolicyConfig::UnwrapNear => WrapPolicy::UnwrapNear,
            WrapPolicyConfig::UnwrapClockwise => {
                WrapPolicy::UnwrapInSection(CableWrapSection::Clockwise)
            }
            WrapPolicyConfig::UnwrapNeutral => WrapPolicy::UnwrapInSection(CableWrapSection::Neutral),
            WrapPolicyConfig::UnwrapCounterClockwise => {
                WrapPolicy::UnwrapInSection(CableWrapSection::CounterClockwise)
            }
        }
    }
}

impl Default for WrapPolicyConfig {
    fn default() -> Self {
        Self::UnwrapNear
    }
}

/// Mirrors [`PointingMode`] for (de)serialization; `fast` carries its
/// own tick resolution.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum PointingModeConfig {
    Rigorous,
    Fast {
        #[serde(default = "default_fast_grid_tick_seconds")]
        tick_seconds: f64,
    },
}

fn default_fast_grid_tick_seconds() -> f64 {
    30.0
}

impl Default for PointingModeConfig {
    fn default() -> Self {
        Self::Rigorous
    }
}

impl PointingModeConfig {
    pub fn resolve(&self) -> PointingMode {
        match self {
            PointingModeConfig::Rigorous => PointingMode::Rigorous,
            PointingModeConfig::Fast { tick_seconds } => PointingMode::Fast { tick_seconds: *tick_seconds },
        }
    }
}

/// Mirrors [`FalloffShape`] for (de)serialization.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FalloffShapeConfig {
    Linear,
    Cosine,
    Constant,
}

impl FalloffShapeConfig {
    pub fn resolve(&self) -> FalloffShape {
        match self {
            FalloffShapeConfig::Linear => FalloffShape::Linear,
            FalloffShapeConfig::Cosine => FalloffShape::Cosine,
            FalloffShapeConfig::Constant => FalloffShape::Constant,
        }
    }
}

/// The nine scorer weights plus supporting ramp/interval knobs, as
/// loaded from configuration (spec.md §4.7). Angles are specified in
/// degrees in the configuration file for readability and converted to
/// radians at resolution time.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightFactorsConfig {
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
    pub declination_start_weight_deg: f64,
    pub declination_full_weight_deg: f64,
    pub low_elevation_start_weight_deg: f64,
    pub low_elevation_full_weight_deg: f64,
}

impl Default for WeightFactorsConfig {
    fn default() -> Self {
        Self {
            sky_coverage: 1.0,
            n_obs: 1.0,
            duration: 1.0,
            average_source: 1.0,
            average_station: 1.0,
            average_baseline: 1.0,
            idle_time: 1.0,
            low_declination: 1.0,
            low_elevation: 1.0,
            idle_time_interval_seconds: 600.0,
            declination_start_weight_deg: 30.0,
            declination_full_weight_deg: 60.0,
            low_elevation_start_weight_deg: 20.0,
            low_elevation_full_weight_deg: 10.0,
        }
    }
}

impl WeightFactorsConfig {
    /// Set the named field to `value` if `name` matches one of this
    /// struct's fields, returning whether it matched. Used by the
    /// multi-schedule driver (spec.md §4.12) to apply a generic
    /// [`crate::multisched::ParameterVector`] axis onto the weight
    /// factors without the driver itself knowing their names.
    pub fn apply_axis(&mut self, name: &str, value: f64) -> bool {
        match name {
            "sky_coverage" => self.sky_coverage = value,
            "n_obs" => self.n_obs = value,
            "duration" => self.duration = value,
            "average_source" => self.average_source = value,
            "average_station" => self.average_station = value,
            "average_baseline" => self.average_baseline = value,
            "idle_time" => self.idle_time = value,
            "low_declination" => self.low_declination = value,
            "low_elevation" => self.low_elevation = value,
            "idle_time_interval_seconds" => self.idle_time_interval_seconds = value,
            "declination_start_weight_deg" => self.declination_start_weight_deg = value,
            "declination_full_weight_deg" => self.declination_full_weight_deg = value,
            "low_elevation_start_weight_deg" => self.low_elevation_start_weight_deg = value,
            "low_elevation_full_weight_deg" => self.low_elevation_full_weight_deg = value,
            _ => return false,
        }
        true
    }

    pub fn resolve(&self) -> crate::scorer::WeightContext {
        let mut weights = crate::scorer::WeightContext {
            sky_coverage: self.sky_coverage,
            n_obs: self.n_obs,
            duration: self.duration,
            average_source: self.average_source,
            average_station: self.average_station,
            average_baseline: self.average_baseline,
            idle_time: self.idle_time,
            low_declination: self.low_declination,
            low_elevation: self.low_elevation,
            idle_time_interval_seconds: self.idle_time_interval_seconds,
            declination_start_weight_rad: self.declination_start_weight_deg.to_radians(),
            declination_full_weight_rad: self.declination_full_weight_deg.to_radians(),
            low_elevation_start_weight_rad: self.low_elevation_start_weight_deg.to_radians(),
            low_elevation_full_weight_rad: self.low_elevation_full_weight_deg.to_radians(),
        };
        weights.normalise();
        weights
    }
}

/// Sky-coverage tracker configuration (spec.md §4.5).
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SkyCoverageConfig {
    pub influence_distance_deg: f64,
    pub influence_interval_seconds: f64,
    pub distance_falloff: FalloffShapeConfig,
    pub time_falloff: FalloffShapeConfig,
}

impl Default for SkyCoverageConfig {
    fn default() -> Self {
        Self {
            influence_distance_deg: 30.0,
            influence_interval_seconds: 3600.0,
            distance_falloff: FalloffShapeConfig::Linear,
            time_falloff: FalloffShapeConfig::Linear,
        }
    }
}

impl SkyCoverageConfig {
    /// Build a single fresh [`crate::skycoverage::SkyCoverageArea`] from
    /// this configuration. Callers needing one area per twin-telescope
    /// group (spec.md §4.5) build one per group from the same config.
    pub fn build_area(&self) -> crate::skycoverage::SkyCoverageArea {
        crate::skycoverage::SkyCoverageArea::new(
            self.influence_distance_deg.to_radians(),
            hifitime::Duration::from_f64(self.influence_interval_seconds, hifitime::Unit::Second),
            self.distance_falloff.resolve(),
            self.time_falloff.resolve(),
        )
    }
}

/// Subnetting-solver configuration (spec.md §4.8).
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct SubnettingConfig {
    pub enabled: bool,
    pub min_angle_deg: f64,
    pub min_participating_stations: usize,
}

impl Default for SubnettingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            min_angle_deg: 30.0,
            min_participating_stations: 4,
        }
    }
}

/// Calibrator-block configuration (spec.md §4.10), as loaded from TOML.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CalibratorBlockToml {
    pub cadence_seconds: Option<f64>,
    pub every_n_scans: Option<usize>,
    pub min_calibrator_scans: usize,
    pub source_group: String,
    #[serde(default = "default_calibrator_low_elevation_deg")]
    pub target_low_elevation_deg: f64,
    #[serde(default = "default_calibrator_high_elevation_deg")]
    pub target_high_elevation_deg: f64,
}

fn default_calibrator_low_elevation_deg() -> f64 {
    20.0
}
fn default_calibrator_high_elevation_deg() -> f64 {
    80.0
}

impl CalibratorBlockToml {
    pub fn resolve(&self) -> crate::rules::CalibratorBlockConfig {
        let cadence = match (self.cadence_seconds, self.every_n_scans) {
            (Some(s), _) => CalibratorCadence::Interval(hifitime::Duration::from_f64(
                s,
                hifitime::Unit::Second,
            )),
            (None, Some(n)) => CalibratorCadence::EveryNScans(n),
            (None, None) => CalibratorCadence::EveryNScans(usize::MAX),
        };
        crate::rules::CalibratorBlockConfig {
            cadence,
            min_calibrator_scans: self.min_calibrator_scans,
            source_group: self.source_group.clone(),
            target_low_elevation_rad: self.target_low_elevation_deg.to_radians(),
            target_high_elevation_rad: self.target_high_elevation_deg.to_radians(),
        }
    }
}

/// One monitored high-impact station (spec.md §4.10), as loaded from
/// TOML: the station is named, not indexed, and resolved against the
/// built station array.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HighImpactTargetToml {
    pub station_name: String,
    pub target_az_deg: f64,
    pub target_el_deg: f64,
    pub margin_deg: f64,
    pub interval_seconds: f64,
    pub score_bonus: f64,
}

impl HighImpactTargetToml {
    pub fn resolve(&self, stations: &[Station]) -> Option<HighImpactTarget> {
        let station = stations.iter().position(|s| s.name == self.station_name)?;
        Some(HighImpactTarget {
            station,
            target_azel: crate::coord::AzEl::new(self.target_az_deg.to_radians(), self.target_el_deg.to_radians()),
            margin_rad: self.margin_deg.to_radians(),
            interval_seconds: self.interval_seconds,
            score_bonus: self.score_bonus,
        })
    }
}

/// Focus-corner cadence configuration (spec.md §4.10), as loaded from
/// TOML.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct FocusCornerToml {
    pub cadence_seconds: f64,
    pub score_bonus: f64,
}

/// Figure-of-merit weights (spec.md §4.13), as loaded from TOML.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityWeightsToml {
    pub total_observations: f64,
    pub mean_sky_coverage: f64,
    pub station_balance: f64,
    pub low_declination_fraction: f64,
    pub repeat_completion: f64,
}

impl Default for QualityWeightsToml {
    fn default() -> Self {
        let w = QualityWeights::default();
        Self {
            total_observations: w.total_observations,
            mean_sky_coverage: w.mean_sky_coverage,
            station_balance: w.station_balance,
            low_declination_fraction: w.low_declination_fraction,
            repeat_completion: w.repeat_completion,
        }
    }
}

impl QualityWeightsToml {
    pub fn resolve(&self) -> QualityWeights {
        QualityWeights {
            total_observations: self.total_observations,
            mean_sky_coverage: self.mean_sky_coverage,
            station_balance: self.station_balance,
            low_declination_fraction: self.low_declination_fraction,
            repeat_completion: self.repeat_completion,
        }
    }
}

/// A named group's minimum-baselines hard condition (spec.md §4.13), as
/// loaded from TOML: source membership is given by name and resolved
/// against the built source array.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GroupBaselineConditionToml {
    pub group_name: String,
    pub source_names: Vec<String>,
    pub min_baselines: usize,
}

/// Hard conditions a schedule must satisfy, per spec.md §4.13.
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct HardConditionsToml {
    #[serde(default)]
    pub min_scans: usize,
    #[serde(default)]
    pub groups: Vec<GroupBaselineConditionToml>,
    /// The retry budget for the "gentle source reduction" pass
    /// (`maxNumberOfIterations`, spec.md §4.13).
    #[serde(default = "default_max_reduction_iterations")]
    pub max_number_of_iterations: usize,
    /// Number of least-observed sources disabled per retry.
    #[serde(default = "default_reduction_batch_size")]
    pub reduction_batch_size: usize,
}

fn default_max_reduction_iterations() -> usize {
    0
}
fn default_reduction_batch_size() -> usize {
    1
}

impl HardConditionsToml {
    pub fn resolve(&self, sources: &[Source]) -> HardConditions {
        let name_to_index: HashMap<&str, usize> =
            sources.iter().enumerate().map(|(i, s)| (s.name.as_str(), i)).collect();
        HardConditions {
            min_scans: self.min_scans,
            groups: self
                .groups
                .iter()
                .map(|g| GroupBaselineCondition {
                    group_name: g.group_name.clone(),
                    source_indices: g
                        .source_names
                        .iter()
                        .filter_map(|n| name_to_index.get(n.as_str()).copied())
                        .collect(),
                    min_baselines: g.min_baselines,
                })
                .collect(),
        }
    }
}

/// The complete set of resolved, dense session parameters consumed by
/// the planner (spec.md §9's "fully dense parameter record").
#[derive(Clone, Copy, Debug)]
pub struct ResolvedParameters {
    pub session_start: Epoch,
    pub session_end: Epoch,
    pub field_system_seconds: f64,
    pub preob_seconds: f64,
    pub postob_seconds: f64,
    pub min_scan_seconds: f64,
    pub max_scan_seconds: f64,
    pub max_slew_seconds: f64,
    pub max_wait_seconds: f64,
    pub default_min_stations: usize,
    pub session_min_elevation_rad: f64,
    pub min_sun_distance_rad: f64,
    pub max_clock_advances: usize,
    pub max_total_obs_time_seconds: f64,
    pub max_number_of_scans: usize,
    pub wrap_policy: WrapPolicy,

    /// Resolution of spec.md §9's `firstScan`/tagalong open question:
    /// whether field-system/preob/slew zeroing applies unconditionally,
    /// including while a station is in tagalong mode. Default `true`.
    pub tagalong_zeroes_first_scan: bool,
    /// Resolution of spec.md §9's equipment "C" flag open question:
    /// whether calibration-only equipment is excluded from candidate
    /// scans. Default `true` (excluded).
    pub exclude_calibration_only_equipment: bool,

    pub fillin_during_selection: bool,
    pub subnetting: SubnettingConfig,
    /// Rigorous vs. fast pointing evaluation during candidate enumeration
    /// (spec.md §4.3/§9).
    pub pointing_mode: PointingMode,
}

impl ResolvedParameters {
    pub fn candidate_params(&self) -> CandidateParams {
        CandidateParams {
            field_system_seconds: self.field_system_seconds,
            preob_seconds: self.preob_seconds,
            max_slew_seconds: self.max_slew_seconds,
            max_wait_seconds: self.max_wait_seconds,
            default_min_stations: self.default_min_stations,
            session_min_elevation_rad: self.session_min_elevation_rad,
            pointing: PointingParams {
                min_sun_distance_rad: self.min_sun_distance_rad,
                wrap_policy: self.wrap_policy,
            },
            tagalong_zeroes_first_scan: self.tagalong_zeroes_first_scan,
            pointing_mode: self.pointing_mode,
        }
    }
}

/// Top-level session configuration, as loaded from a TOML file. All
/// timing/angle fields use human-friendly units (seconds, degrees,
/// ISO-8601 timestamps); [`SessionConfig::resolve`] converts these into
/// the dense [`ResolvedParameters`] record.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionConfig {
    pub session_start: String,
    pub session_end: String,

    #[serde(default = "default_field_system_seconds")]
    pub field_system_seconds: f64,
    #[serde(default = "default_preob_seconds")]
    pub preob_seconds: f64,
    #[serde(default = "default_postob_seconds")]
    pub postob_seconds: f64,
    #[serde(default = "default_min_scan_seconds")]
    pub min_scan_seconds: f64,
    #[serde(default = "default_max_scan_seconds")]
    pub max_scan_seconds: f64,
    #[serde(default = "default_max_slew_seconds")]
    pub max_slew_seconds: f64,
    #[serde(default = "default_max_wait_seconds")]
    pub max_wait_seconds: f64,
    #[serde(default = "default_min_stations")]
    pub default_min_stations: usize,
    #[serde(default = "default_min_elevation_deg")]
    pub session_min_elevation_deg: f64,
    #[serde(default = "default_min_sun_distance_deg")]
    pub min_sun_distance_deg: f64,
    #[serde(default = "default_max_clock_advances")]
    pub max_clock_advances: usize,
    #[serde(default = "default_max_total_obs_time_seconds")]
    pub max_total_obs_time_seconds: f64,
    #[serde(default = "default_max_number_of_scans")]
    pub max_number_of_scans: usize,
    #[serde(default)]
    pub wrap_policy: WrapPolicyConfig,
    #[serde(default = "default_true")]
    pub tagalong_zeroes_first_scan: bool,
    #[serde(default = "default_true")]
    pub exclude_calibration_only_equipment: bool,
    #[serde(default)]
    pub fillin_during_selection: bool,
    #[serde(default)]
    pub subnetting: SubnettingConfig,
    #[serde(default)]
    pub pointing_mode: PointingModeConfig,
    #[serde(default)]
    pub weight_factors: WeightFactorsConfig,
    #[serde(default)]
    pub sky_coverage: SkyCoverageConfig,
    pub calibrator_block: Option<CalibratorBlockToml>,
    #[serde(default)]
    pub high_impact_targets: Vec<HighImpactTargetToml>,
    pub focus_corner: Option<FocusCornerToml>,
    pub multi_schedule: Option<crate::multisched::MultiScheduleConfig>,
    #[serde(default)]
    pub baselines: Vec<BaselineOverrideToml>,

    /// Name of the catalog's [`crate::obsmode::ModeDescriptor`] this
    /// session observes with.
    #[serde(default = "default_observing_mode_name")]
    pub observing_mode_name: String,

    #[serde(default)]
    pub quality_weights: QualityWeightsToml,
    #[serde(default)]
    pub hard_conditions: HardConditionsToml,

    /// `logSeverityConsole`/`logSeverityFile` of spec.md §6's CLI
    /// surface.
    #[serde(default = "default_log_severity")]
    pub log_severity_console: String,
    #[serde(default = "default_log_severity")]
    pub log_severity_file: String,
}

fn default_field_system_seconds() -> f64 {
    20.0
}
fn default_preob_seconds() -> f64 {
    10.0
}
fn default_postob_seconds() -> f64 {
    10.0
}
fn default_min_scan_seconds() -> f64 {
    30.0
}
fn default_max_scan_seconds() -> f64 {
    600.0
}
fn default_max_slew_seconds() -> f64 {
    300.0
}
fn default_max_wait_seconds() -> f64 {
    900.0
}
fn default_min_stations() -> usize {
    2
}
fn default_min_elevation_deg() -> f64 {
    5.0
}
fn default_min_sun_distance_deg() -> f64 {
    15.0
}
fn default_max_clock_advances() -> usize {
    crate::constants::DEFAULT_MAX_CLOCK_ADVANCES
}
fn default_max_total_obs_time_seconds() -> f64 {
    f64::MAX
}
fn default_max_number_of_scans() -> usize {
    usize::MAX
}
fn default_true() -> bool {
    true
}
fn default_log_severity() -> String {
    "info".to_string()
}
fn default_observing_mode_name() -> String {
    "geodetic-sx".to_string()
}

/// Parse an ISO-8601-ish `YYYY-MM-DDTHH:MM:SS` UTC timestamp into an
/// [`Epoch`]. This is the minimal parser the configuration layer needs;
/// a full calendar parser is out of scope (the XML reader that would
/// supply these values is itself out of scope, per spec.md §1).
fn parse_timestamp(s: &str) -> Result<Epoch, SchedulerError> {
    let s = s.trim().trim_end_matches('Z');
    let (date, time) = s
        .split_once('T')
        .or_else(|| s.split_once(' '))
        .ok_or_else(|| SchedulerError::Configuration(format!("invalid timestamp: {s}")))?;
    let date_parts: Vec<&str> = date.split('-').collect();
    let time_parts: Vec<&str> = time.split(':').collect();
    if date_parts.len() != 3 || time_parts.len() < 2 {
        return Err(SchedulerError::Configuration(format!(
            "invalid timestamp: {s}"
        )));
    }
    let year: i32 = date_parts[0]
        .parse()
        .map_err(|_| SchedulerError::Configuration(format!("invalid year in {s}")))?;
    let month: u8 = date_parts[1]
        .parse()
        .map_err(|_| SchedulerError::Configuration(format!("invalid month in {s}")))?;
    let day: u8 = date_parts[2]
        .parse()
        .map_err(|_| SchedulerError::Configuration(format!("invalid day in {s}")))?;
    let hour: u8 = time_parts[0]
        .parse()
        .map_err(|_| SchedulerError::Configuration(format!("invalid hour in {s}")))?;
    let minute: u8 = time_parts[1]
        .parse()
        .map_err(|_| SchedulerError::Configuration(format!("invalid minute in {s}")))?;
    let second: u8 = if time_parts.len() > 2 {
        time_parts[2]
            .split('.')
            .next()
            .unwrap_or("0")
            .parse()
            .map_err(|_| SchedulerError::Configuration(format!("invalid second in {s}")))?
    } else {
        0
    };
    Ok(Epoch::from_gregorian_utc(
        year, month, day, hour, minute, second, 0,
    ))
}

impl SessionConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, SchedulerError> {
        toml::from_str(s).map_err(SchedulerError::from)
    }

    pub fn resolve(&self) -> Result<ResolvedParameters, SchedulerError> {
        Ok(ResolvedParameters {
            session_start: parse_timestamp(&self.session_start)?,
            session_end: parse_timestamp(&self.session_end)?,
            field_system_seconds: self.field_system_seconds,
            preob_seconds: self.preob_seconds,
            postob_seconds: self.postob_seconds,
            min_scan_seconds: self.min_scan_seconds,
            max_scan_seconds: self.max_scan_seconds,
            max_slew_seconds: self.max_slew_seconds,
            max_wait_seconds: self.max_wait_seconds,
            default_min_stations: self.default_min_stations,
            session_min_elevation_rad: self.session_min_elevation_deg.to_radians(),
            min_sun_distance_rad: self.min_sun_distance_deg.to_radians(),
            max_clock_advances: self.max_clock_advances,
            max_total_obs_time_seconds: self.max_total_obs_time_seconds,
            max_number_of_scans: self.max_number_of_scans,
            wrap_policy: self.wrap_policy.resolve(),
            tagalong_zeroes_first_scan: self.tagalong_zeroes_first_scan,
            exclude_calibration_only_equipment: self.exclude_calibration_only_equipment,
            fillin_during_selection: self.fillin_during_selection,
            subnetting: self.subnetting,
            pointing_mode: self.pointing_mode.resolve(),
        })
    }

    /// Resolve the calibrator-block, high-impact-target, and focus-corner
    /// configuration (spec.md §4.10) into the aggregate the planner
    /// consumes. High-impact targets naming an unresolvable station are
    /// silently skipped, matching [`Self::resolve_baselines`].
    pub fn resolve_rules(&self, stations: &[Station]) -> RulesConfig {
        RulesConfig {
            calibrator: self.calibrator_block.as_ref().map(|c| c.resolve()),
            high_impact_targets: self
                .high_impact_targets
                .iter()
                .filter_map(|t| t.resolve(stations))
                .collect(),
            focus_corner_cadence: self
                .focus_corner
                .as_ref()
                .map(|f| hifitime::Duration::from_f64(f.cadence_seconds, hifitime::Unit::Second)),
            focus_corner_score_bonus: self.focus_corner.as_ref().map(|f| f.score_bonus).unwrap_or(0.0),
        }
    }

    /// Resolve the `[[baselines]]` overrides into a [`BaselineId`]-keyed
    /// map, given the already-built station array (so station names can
    /// be turned into indices). Baselines with unresolvable station
    /// names are silently skipped; the planner falls back to a default
    /// [`Baseline`] for any pair with no override.
    pub fn resolve_baselines(&self, stations: &[Station]) -> HashMap<BaselineId, Baseline> {
        let name_to_index: HashMap<&str, usize> = stations
            .iter()
            .enumerate()
            .map(|(i, s)| (s.name.as_str(), i))
            .collect();
        let mut map = HashMap::new();
        for entry in &self.baselines {
            let (Some(&a), Some(&b)) = (
                name_to_index.get(entry.station_a.as_str()),
                name_to_index.get(entry.station_b.as_str()),
            ) else {
                continue;
            };
            let id = BaselineId::new(a, b);
            map.insert(
                id,
                Baseline {
                    id: Some(id),
                    min_snr: entry.min_snr.clone(),
                    ignore: entry.ignore,
                    weight: entry.weight,
                },
            );
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_timestamp_roundtrips_known_epoch() {
        let epoch = parse_timestamp("2020-01-01T12:00:00").unwrap();
        let expected = Epoch::from_gregorian_utc(2020, 1, 1, 12, 0, 0, 0);
        assert_eq!(epoch, expected);
    }

    #[test]
    fn weight_factors_resolve_sums_to_one() {
        let config = WeightFactorsConfig::default();
        let weights = config.resolve();
        let sum = weights.sky_coverage
            + weights.n_obs
            + weights.duration
            + weights.average_source
            + weights.average_station
            + weights.average_baseline
            + weights.idle_time
            + weights.low_declination
            + weights.low_elevation;
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn minimal_toml_parses_with_defaults() {
        let toml_str = r#"
            session_start = "2020-01-01T12:00:00"
            session_end = "2020-01-01T13:00:00"
        "#;
        let config = SessionConfig::from_toml_str(toml_str).unwrap();
        assert_eq!(config.default_min_stations, 2);
        let resolved = config.resolve().unwrap();
        assert_eq!(resolved.default_min_stations, 2);
    }
}
