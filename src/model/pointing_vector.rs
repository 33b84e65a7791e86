// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use hifitime::Epoch;

use crate::coord::{AzEl, HADec};
use crate::model::{SourceIndex, StationIndex};
use crate::mount::CableWrapSection;

/// A single station's pointing at a single source and epoch (spec.md §3).
/// Mutable only during construction by the pointing evaluator (C6); once
/// placed in a [`crate::model::Scan`] it is treated as immutable.
#[derive(Clone, Copy, Debug)]
pub struct PointingVector {
    pub station: StationIndex,
    pub source: SourceIndex,
    pub epoch: Epoch,
    pub azel: AzEl,
    pub hadec: Option<HADec>,
    /// The cable-wrap section the primary axis was unwrapped into to reach
    /// this pointing.
    pub wrap_section: CableWrapSection,
    /// Unwrapped primary-axis angle (radians), consistent with
    /// `wrap_section`'s limits (spec.md §8's invariant).
    pub unwrapped_axis1: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mount::CableWrapSection;

    #[test]
    fn pointing_vector_is_copy() {
        let pv = PointingVector {
            station: 0,
            source: 0,
            epoch: Epoch::from_gregorian_utc_at_midnight(2020, 1, 1),
            azel: AzEl::new(0.0, 0.0),
            hadec: None,
            wrap_section: CableWrapSection::Neutral,
            unwrapped_axis1: 0.0,
        };
        let _copy = pv;
        let _also_fine = pv;
    }
}
