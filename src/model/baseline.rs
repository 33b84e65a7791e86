// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Baselines: unordered station pairs, derived rather than catalog data
//! (spec.md §3).

use crate::model::StationIndex;

/// An unordered pair of station indices. Construction always orders the
/// pair canonically (lower index first) so that `BaselineId(a, b) ==
/// BaselineId(b, a)` constructions compare equal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BaselineId(pub StationIndex, pub StationIndex);

impl BaselineId {
    pub fn new(a: StationIndex, b: StationIndex) -> Self {
        if a <= b {
            Self(a, b)
        } else {
            Self(b, a)
        }
    }

    pub fn contains(&self, station: StationIndex) -> bool {
        self.0 == station || self.1 == station
    }
}

/// Per-band minimum-SNR overrides and the "ignore this baseline" flag
/// (spec.md §3).
#[derive(Clone, Debug, Default)]
pub struct Baseline {
    pub id: Option<BaselineId>,
    pub min_snr: std::collections::HashMap<String, f64>,
    pub ignore: bool,
    /// Weight factor override (spec.md §4.12's per-baseline multi-schedule
    /// axis).
    pub weight: f64,
}

impl Baseline {
    pub fn new(id: BaselineId) -> Self {
        Self {
            id: Some(id),
            min_snr: std::collections::HashMap::new(),
            ignore: false,
            weight: 1.0,
        }
    }
}
