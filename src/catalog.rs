// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Catalog model (ambient component A4): static station/source/observing-
//! mode descriptions, as `serde`-deserialized from TOML, standing in for
//! the out-of-scope external catalog readers (antenna database, source
//! list, mode table).
//!
//! Follows the same two-layer pattern as [`crate::config`]: a `*Toml` wire
//! struct close to the file format, with a `.resolve()` that converts it
//! into a plain descriptor. Descriptors are turned into the flat
//! [`crate::model::Station`]/[`crate::model::Source`] arrays the planner
//! consumes by [`InMemoryCatalog::build_stations`]/`build_sources`, which
//! is also where name-based cross-references (excluded/required stations)
//! are resolved into indices.

use std::collections::HashMap;

use hifitime::Epoch;
use serde::{Deserialize, Serialize};

use crate::coord::{Geocentric, RADec};
use crate::error::SchedulerError;
use crate::flux::{FluxModel, GaussianComponent, PowerLawKnot};
use crate::horizon::HorizonMask;
use crate::model::source::{Source, SourceId, SourceState};
use crate::model::station::{BandEquipment, Station, StationId, StationState};
use crate::model::StationIndex;
use crate::mount::{AxisLimits, CableWrapSection, Mount, MountType};
use crate::obsmode::{BandMode, ModeDescriptor, ObservingModeTable};

/// Static catalog description of a station (spec.md §3/§6).
#[derive(Clone, Debug)]
pub struct StationDescriptor {
    pub id: StationId,
    pub name: String,
    pub one_letter_code: char,
    pub two_letter_code: String,
    pub position: Geocentric,
    pub mount: Mount,
    pub horizon_mask: HorizonMask,
    pub equipment: HashMap<String, BandEquipment>,
    pub min_elevation: Option<f64>,
}

/// Static catalog description of a source (spec.md §3/§6).
#[derive(Clone, Debug)]
pub struct SourceDescriptor {
    pub id: SourceId,
    pub name: String,
    pub radec: RADec,
    pub flux_models: Vec<(String, FluxModel)>,
    pub min_elevation: Option<f64>,
    pub min_stations: Option<usize>,
    pub excluded_station_names: Vec<String>,
    pub required_station_names: Vec<String>,
    pub min_repeat_seconds: f64,
    pub ignore: bool,
    pub focus_factor: Option<f64>,
    pub groups: Vec<String>,
}

/// Lookup surface for station descriptors.
pub trait StationCatalog {
    fn stations(&self) -> &[StationDescriptor];
}

/// Lookup surface for source descriptors.
pub trait SourceCatalog {
    fn sources(&self) -> &[SourceDescriptor];
}

/// Lookup surface for observing modes, keyed by name.
pub trait ObservingModeCatalog {
    fn observing_mode(&self, name: &str) -> Option<&ModeDescriptor>;
}

/// Lookup surface for per-station horizon masks (normally just a
/// passthrough onto [`StationCatalog`]; kept separate since the original
/// catalog reader treats horizon masks as an independently-loadable file).
pub trait HorizonMaskCatalog {
    fn horizon_mask(&self, station_id: StationId) -> Option<&HorizonMask>;
}

/// A catalog held entirely in memory, populated from TOML via
/// [`CatalogToml::resolve`] or assembled by hand in tests.
#[derive(Clone, Debug, Default)]
pub struct InMemoryCatalog {
    pub stations: Vec<StationDescriptor>,
    pub sources: Vec<SourceDescriptor>,
    pub modes: ObservingModeTable,
}

impl StationCatalog for InMemoryCatalog {
    fn stations(&self) -> &[StationDescriptor] {
        &self.stations
    }
}

impl SourceCatalog for InMemoryCatalog {
    fn sources(&self) -> &[SourceDescriptor] {
        &self.sources
    }
}

impl ObservingModeCatalog for InMemoryCatalog {
    fn observing_mode(&self, name: &str) -> Option<&ModeDescriptor> {
        self.modes.get(name)
    }
}

impl HorizonMaskCatalog for InMemoryCatalog {
    fn horizon_mask(&self, station_id: StationId) -> Option<&HorizonMask> {
        self.stations
            .iter()
            .find(|s| s.id == station_id)
            .map(|s| &s.horizon_mask)
    }
}

impl InMemoryCatalog {
    /// Build the flat, index-referencing [`Station`] array the planner
    /// consumes, per spec.md §9's arena-plus-index design. Each station's
    /// mutable state is freshly reset at `session_start`.
    pub fn build_stations(
        &self,
        exclude_calibration_only_equipment: bool,
        session_start: Epoch,
    ) -> Vec<Station> {
        self.stations
            .iter()
            .map(|d| {
                let mut equipment = d.equipment.clone();
                if exclude_calibration_only_equipment {
                    equipment.retain(|_, e| !e.calibration_only);
                }
                Station {
                    id: d.id,
                    name: d.name.clone(),
                    one_letter_code: d.one_letter_code,
                    two_letter_code: d.two_letter_code.clone(),
                    position: d.position,
                    mount: d.mount.clone(),
                    horizon_mask: d.horizon_mask.clone(),
                    equipment,
                    min_elevation: d.min_elevation,
                    state: StationState {
                        current_pointing: None,
                        current_clock: session_start,
                        last_scan_end: None,
                        committed_until: session_start,
                        cumulative_observing_time_seconds: 0.0,
                        number_of_scans: 0,
                        first_scan: true,
                    },
                }
            })
            .collect()
    }

    /// Build the flat [`Source`] array, resolving `excluded_station_names`
    /// and `required_station_names` against the station array produced by
    /// [`Self::build_stations`] (names not found in the station array are
    /// dropped, matching a catalog that references a station excluded by
    /// `exclude_calibration_only_equipment`-adjacent filtering upstream).
    pub fn build_sources(&self, stations: &[Station]) -> Vec<Source> {
        let name_to_index: HashMap<&str, StationIndex> = stations
            .iter()
            .enumerate()
            .map(|(i, s)| (s.name.as_str(), i))
            .collect();
        let resolve = |names: &[String]| -> Vec<StationIndex> {
            names
                .iter()
                .filter_map(|n| name_to_index.get(n.as_str()).copied())
                .collect()
        };
        self.sources
            .iter()
            .map(|d| Source {
                id: d.id,
                name: d.name.clone(),
                radec: d.radec,
                flux_models: d.flux_models.clone(),
                min_elevation: d.min_elevation,
                min_stations: d.min_stations,
                excluded_stations: resolve(&d.excluded_station_names),
                required_stations: resolve(&d.required_station_names),
                min_repeat: hifitime::Duration::from_f64(d.min_repeat_seconds, hifitime::Unit::Second),
                ignore: d.ignore,
                focus_factor: d.focus_factor,
                groups: d.groups.clone(),
                state: SourceState::default(),
            })
            .collect()
    }
}

/// (De)serializable axis-limit pair, angles in degrees.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AxisLimitsToml {
    pub max_rate_deg_per_s: f64,
    pub overhead_seconds: f64,
    pub min_deg: f64,
    pub max_deg: f64,
}

impl AxisLimitsToml {
    pub fn resolve(&self) -> AxisLimits {
        AxisLimits {
            max_rate_rad_per_s: self.max_rate_deg_per_s.to_radians(),
            overhead_seconds: self.overhead_seconds,
            min_rad: self.min_deg.to_radians(),
            max_rad: self.max_deg.to_radians(),
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MountTypeToml {
    AzEl,
    EqHaDec,
    Xy,
}

impl MountTypeToml {
    pub fn resolve(&self) -> MountType {
        match self {
            MountTypeToml::AzEl => MountType::AzEl,
            MountTypeToml::EqHaDec => MountType::EqHaDec,
            MountTypeToml::Xy => MountType::XY,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CableWrapSectionToml {
    Clockwise,
    Neutral,
    CounterClockwise,
}

impl CableWrapSectionToml {
    pub fn resolve(&self) -> CableWrapSection {
        match self {
            CableWrapSectionToml::Clockwise => CableWrapSection::Clockwise,
            CableWrapSectionToml::Neutral => CableWrapSection::Neutral,
            CableWrapSectionToml::CounterClockwise => CableWrapSection::CounterClockwise,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WrapSectionToml {
    pub section: CableWrapSectionToml,
    pub limits: AxisLimitsToml,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MountToml {
    pub mount_type: MountTypeToml,
    pub axis1: AxisLimitsToml,
    pub axis2: AxisLimitsToml,
    #[serde(default)]
    pub wrap_sections: Vec<WrapSectionToml>,
}

impl MountToml {
    pub fn resolve(&self) -> Mount {
        Mount {
            mount_type: self.mount_type.resolve(),
            axis1: self.axis1.resolve(),
            axis2: self.axis2.resolve(),
            wrap_sections: self
                .wrap_sections
                .iter()
                .map(|w| (w.section.resolve(), w.limits.resolve()))
                .collect(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BandEquipmentToml {
    pub sefd_jy: f64,
    #[serde(default)]
    pub calibration_only: bool,
}

impl BandEquipmentToml {
    pub fn resolve(&self) -> BandEquipment {
        BandEquipment {
            sefd: self.sefd_jy,
            calibration_only: self.calibration_only,
        }
    }
}

/// A horizon mask as loaded from TOML: exactly one of the two
/// representations (spec.md §4.2) must carry entries.
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct HorizonMaskToml {
    #[serde(default)]
    pub line_points_deg: Vec<(f64, f64)>,
    #[serde(default)]
    pub step_bins_deg: Vec<(f64, f64)>,
}

impl HorizonMaskToml {
    pub fn resolve(&self) -> HorizonMask {
        if !self.step_bins_deg.is_empty() {
            HorizonMask::Step {
                bins: self
                    .step_bins_deg
                    .iter()
                    .map(|&(az, el)| (az.to_radians(), el.to_radians()))
                    .collect(),
            }
        } else {
            HorizonMask::Line {
                points: self
                    .line_points_deg
                    .iter()
                    .map(|&(az, el)| (az.to_radians(), el.to_radians()))
                    .collect(),
            }
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StationToml {
    pub id: u32,
    pub name: String,
    pub one_letter_code: char,
    pub two_letter_code: String,
    pub x_m: f64,
    pub y_m: f64,
    pub z_m: f64,
    pub mount: MountToml,
    #[serde(default)]
    pub equipment: HashMap<String, BandEquipmentToml>,
    #[serde(default)]
    pub horizon_mask: HorizonMaskToml,
    pub min_elevation_deg: Option<f64>,
}

impl StationToml {
    pub fn resolve(&self) -> StationDescriptor {
        StationDescriptor {
            id: StationId(self.id),
            name: self.name.clone(),
            one_letter_code: self.one_letter_code,
            two_letter_code: self.two_letter_code.clone(),
            position: Geocentric::new(self.x_m, self.y_m, self.z_m),
            mount: self.mount.resolve(),
            horizon_mask: self.horizon_mask.resolve(),
            equipment: self
                .equipment
                .iter()
                .map(|(band, e)| (band.clone(), e.resolve()))
                .collect(),
            min_elevation: self.min_elevation_deg.map(f64::to_radians),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FluxComponentToml {
    pub flux_jy: f64,
    pub major_mas: f64,
    pub minor_mas: f64,
    pub position_angle_deg: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PowerLawKnotToml {
    pub baseline_klambda: f64,
    pub flux_jy: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FluxModelToml {
    PowerLaw { knots: Vec<PowerLawKnotToml> },
    Gaussian { components: Vec<FluxComponentToml> },
}

impl FluxModelToml {
    pub fn resolve(&self) -> FluxModel {
        match self {
            FluxModelToml::PowerLaw { knots } => FluxModel::PowerLaw {
                knots: knots
                    .iter()
                    .map(|k| PowerLawKnot {
                        baseline_klambda: k.baseline_klambda,
                        flux_jy: k.flux_jy,
                    })
                    .collect(),
            },
            FluxModelToml::Gaussian { components } => FluxModel::Gaussian {
                components: components
                    .iter()
                    .map(|c| GaussianComponent {
                        flux_jy: c.flux_jy,
                        major_mas: c.major_mas,
                        minor_mas: c.minor_mas,
                        position_angle_deg: c.position_angle_deg,
                    })
                    .collect(),
            },
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SourceToml {
    pub id: u32,
    pub name: String,
    pub ra_deg: f64,
    pub dec_deg: f64,
    #[serde(default)]
    pub flux_models: HashMap<String, FluxModelToml>,
    pub min_elevation_deg: Option<f64>,
    pub min_stations: Option<usize>,
    #[serde(default)]
    pub excluded_stations: Vec<String>,
    #[serde(default)]
    pub required_stations: Vec<String>,
    #[serde(default)]
    pub min_repeat_seconds: f64,
    #[serde(default)]
    pub ignore: bool,
    pub focus_factor: Option<f64>,
    /// Named source groups this source belongs to (spec.md §4.10's
    /// calibrator-block `source_group` membership).
    #[serde(default)]
    pub groups: Vec<String>,
}

impl SourceToml {
    pub fn resolve(&self) -> SourceDescriptor {
        SourceDescriptor {
            id: SourceId(self.id),
            name: self.name.clone(),
            radec: RADec::new_degrees(self.ra_deg, self.dec_deg),
            flux_models: self
                .flux_models
                .iter()
                .map(|(band, m)| (band.clone(), m.resolve()))
                .collect(),
            min_elevation: self.min_elevation_deg.map(f64::to_radians),
            min_stations: self.min_stations,
            excluded_station_names: self.excluded_stations.clone(),
            required_station_names: self.required_stations.clone(),
            min_repeat_seconds: self.min_repeat_seconds,
            ignore: self.ignore,
            focus_factor: self.focus_factor,
            groups: self.groups.clone(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BandModeToml {
    pub name: String,
    pub centre_frequency_hz: f64,
    pub bandwidth_hz: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModeToml {
    pub name: String,
    pub sample_rate_msps: f64,
    pub bit_depth: u8,
    pub bands: Vec<BandModeToml>,
    pub digitisation_efficiency: Option<f64>,
}

impl ModeToml {
    pub fn resolve(&self) -> ModeDescriptor {
        ModeDescriptor {
            name: self.name.clone(),
            sample_rate_msps: self.sample_rate_msps,
            bit_depth: self.bit_depth,
            bands: self
                .bands
                .iter()
                .map(|b| BandMode {
                    name: b.name.clone(),
                    centre_frequency_hz: b.centre_frequency_hz,
                    bandwidth_hz: b.bandwidth_hz,
                })
                .collect(),
            digitisation_efficiency: self.digitisation_efficiency,
        }
    }
}

/// Top-level catalog file, as loaded from TOML.
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct CatalogToml {
    #[serde(default)]
    pub stations: Vec<StationToml>,
    #[serde(default)]
    pub sources: Vec<SourceToml>,
    #[serde(default)]
    pub modes: Vec<ModeToml>,
}

impl CatalogToml {
    pub fn from_toml_str(s: &str) -> Result<Self, SchedulerError> {
        toml::from_str(s).map_err(SchedulerError::from)
    }

    /// Resolve into an [`InMemoryCatalog`]. When no modes are listed, the
    /// built-in S/X dual-band default (spec.md §6) is used.
    pub fn resolve(&self) -> InMemoryCatalog {
        let modes = if self.modes.is_empty() {
            ObservingModeTable::default_geodetic()
        } else {
            let mut table = ObservingModeTable::new();
            for m in &self.modes {
                table.insert(m.resolve());
            }
            table
        };
        InMemoryCatalog {
            stations: self.stations.iter().map(StationToml::resolve).collect(),
            sources: self.sources.iter().map(SourceToml::resolve).collect(),
            modes,
        }
    }
}
