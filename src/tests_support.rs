// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Shared fixtures for unit tests across modules. Not compiled into
//! release builds.

use std::collections::HashMap;

use hifitime::Epoch;

use crate::coord::Geocentric;
use crate::horizon::HorizonMask;
use crate::model::source::{Source, SourceId, SourceState};
use crate::model::station::{Station, StationId, StationState};
use crate::mount::{AxisLimits, Mount, MountType};

/// A minimal AzEl-mounted station at the geocentre with no horizon
/// obstruction, for tests that don't care about the specific geometry.
pub fn dummy_station() -> Station {
    Station {
        id: StationId(0),
        name: "Test".to_string(),
        one_letter_code: 'T',
        two_letter_code: "Tt".to_string(),
        position: Geocentric::new(6_000_000.0, 0.0, 0.0),
        mount: Mount {
            mount_type: MountType::AzEl,
            axis1: AxisLimits {
                max_rate_rad_per_s: 1.0,
                overhead_seconds: 5.0,
                min_rad: -1000_f64.to_radians(),
                max_rad: 1000_f64.to_radians(),
            },
            axis2: AxisLimits {
                max_rate_rad_per_s: 1.0,
                overhead_seconds: 5.0,
                min_rad: 0.0,
                max_rad: crate::constants::FRAC_PI_2,
            },
            wrap_sections: vec![],
        },
        horizon_mask: HorizonMask::Step {
            bins: vec![(0.0, 0.0)],
        },
        equipment: HashMap::new(),
        min_elevation: None,
        state: StationState {
            current_pointing: None,
            current_clock: Epoch::from_gregorian_utc_at_midnight(2020, 1, 1),
            last_scan_end: None,
            committed_until: Epoch::from_gregorian_utc_at_midnight(2020, 1, 1),
            cumulative_observing_time_seconds: 0.0,
            number_of_scans: 0,
            first_scan: true,
        },
    }
}

/// A minimal source with no flux model and no state history.
pub fn dummy_source(id: u32, ra_deg: f64, dec_deg: f64) -> Source {
    Source {
        id: SourceId(id),
        name: format!("src{id}"),
        radec: crate::coord::RADec::new_degrees(ra_deg, dec_deg),
        flux_models: Vec::new(),
        min_elevation: None,
        min_stations: None,
        excluded_stations: Vec::new(),
        required_stations: Vec::new(),
        min_repeat: hifitime::Duration::from_f64(0.0, hifitime::Unit::Second),
        ignore: false,
        focus_factor: None,
        groups: Vec::new(),
        state: SourceState {
            last_observed: None,
            number_of_observations: 0,
            observation_history: Vec::new(),
        },
    }
}
