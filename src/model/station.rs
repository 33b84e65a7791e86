// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Station identity, static descriptors, and per-build mutable state.

use hifitime::Epoch;
use std::collections::HashMap;

use crate::coord::{AzEl, Geocentric};
use crate::horizon::HorizonMask;
use crate::mount::{CableWrapSection, Mount};

/// A station's catalog identity: a stable integer id plus the human-readable
/// names carried by spec.md §3 ("long name, one-letter and two-letter
/// codes").
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StationId(pub u32);

/// Per-band receiver equipment (spec.md §3's "reception equipment keyed by
/// band").
#[derive(Clone, Debug)]
pub struct BandEquipment {
    /// System equivalent flux density \[Jy\].
    pub sefd: f64,
    /// The equipment catalog's "C" (calibration-only) flag, spec.md §9's
    /// open question. See [`crate::config::ResolvedParameters`] for how the
    /// exclusion behaviour is made configurable.
    pub calibration_only: bool,
}

/// Static (catalog) description of a station plus its per-build mutable
/// state, per spec.md §3.
#[derive(Clone, Debug)]
pub struct Station {
    pub id: StationId,
    pub name: String,
    pub one_letter_code: char,
    pub two_letter_code: String,

    pub position: Geocentric,
    pub mount: Mount,
    pub horizon_mask: HorizonMask,
    pub equipment: HashMap<String, BandEquipment>,

    /// Station-level minimum elevation override (spec.md §4.3); falls back
    /// to the session default when `None`.
    pub min_elevation: Option<f64>,

    pub state: StationState,
}

/// Mutable, per-build state reset between multi-schedule runs (spec.md §3).
#[derive(Clone, Debug)]
pub struct StationState {
    /// Current pointing: a reachable (az, el) plus the cable-wrap section
    /// the primary axis is currently unwrapped into.
    pub current_pointing: Option<(AzEl, CableWrapSection)>,
    pub current_clock: Epoch,
    pub last_scan_end: Option<Epoch>,
    pub committed_until: Epoch,
    pub cumulative_observing_time_seconds: f64,
    pub number_of_scans: usize,
    pub first_scan: bool,
}

impl Station {
    /// Reset the mutable state fields to the start of a fresh schedule
    /// build, per spec.md §3's lifecycle note. `session_start` becomes the
    /// initial clock, last-scan-end, and committed-until time.
    pub fn reset_state(&mut self, session_start: Epoch) {
        self.state = StationState {
            current_pointing: None,
            current_clock: session_start,
            last_scan_end: None,
            committed_until: session_start,
            cumulative_observing_time_seconds: 0.0,
            number_of_scans: 0,
            first_scan: true,
        };
    }

    /// The effective minimum elevation (radians) for this station.
    pub fn effective_min_elevation(&self, session_default: f64) -> f64 {
        self.min_elevation.unwrap_or(session_default)
    }
}
