// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::model::baseline::BaselineId;

/// One baseline's contribution inside one scan (spec.md §3). Holds the
/// negotiated observing duration for that pair, which the scan-duration
/// solver (C7) derives per-baseline before the scan's overall duration is
/// taken as the maximum across all of its observations.
#[derive(Clone, Copy, Debug)]
pub struct Observation {
    pub baseline: BaselineId,
    /// Negotiated observing duration \[seconds\] for this baseline.
    pub duration_seconds: f64,
}

impl Observation {
    pub fn new(baseline: BaselineId, duration_seconds: f64) -> Self {
        Self {
            baseline,
            duration_seconds,
        }
    }
}
