// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Source identity, static descriptors, and per-build mutable state.

use hifitime::Epoch;

use crate::coord::RADec;
use crate::flux::FluxModel;
use crate::model::StationIndex;

/// A source's catalog identity, spec.md §3.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceId(pub u32);

/// Static (catalog) description of a source plus its per-build mutable
/// state, per spec.md §3.
#[derive(Clone, Debug)]
pub struct Source {
    pub id: SourceId,
    pub name: String,
    /// Apparent J2000 right ascension/declination.
    pub radec: RADec,
    /// Per-band flux-density model.
    pub flux_models: Vec<(String, FluxModel)>,

    /// Source-specific elevation override (spec.md §4.3).
    pub min_elevation: Option<f64>,
    /// Minimum number of participating stations override (spec.md §4.6).
    pub min_stations: Option<usize>,
    /// Stations excluded from candidate scans of this source.
    pub excluded_stations: Vec<StationIndex>,
    /// Stations required to be present for any candidate scan of this
    /// source; an empty list means no requirement.
    pub required_stations: Vec<StationIndex>,
    /// Minimum time between repeated observations (spec.md §4.6/§8).
    pub min_repeat: hifitime::Duration,
    /// Whether this source is ignored entirely (never scheduled).
    pub ignore: bool,
    /// The "focus bonus" flag and multiplicative factor, spec.md §3/§4.7.
    pub focus_factor: Option<f64>,
    /// Named source groups this source belongs to (spec.md §4.10's
    /// calibrator-block `source_group` membership).
    pub groups: Vec<String>,

    pub state: SourceState,
}

/// Mutable, per-build state, reset between multi-schedule runs.
#[derive(Clone, Debug, Default)]
pub struct SourceState {
    pub last_observed: Option<Epoch>,
    pub number_of_observations: usize,
    /// Ordered history of which stations observed this source, one entry
    /// per scan in which the source participated.
    pub observation_history: Vec<Vec<StationIndex>>,
}

impl Source {
    pub fn reset_state(&mut self) {
        self.state = SourceState::default();
    }

    /// Flux model for the given band, if the catalog has one.
    pub fn flux_model(&self, band: &str) -> Option<&FluxModel> {
        self.flux_models
            .iter()
            .find(|(b, _)| b == band)
            .map(|(_, m)| m)
    }

    /// Whether enough time has elapsed since the last observation of this
    /// source (spec.md §8's `minRepeat` invariant).
    pub fn min_repeat_elapsed(&self, now: Epoch) -> bool {
        match self.state.last_observed {
            None => true,
            Some(last) => (now - last) >= self.min_repeat,
        }
    }
}
