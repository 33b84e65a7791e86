// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use hifitime::Epoch;

use crate::model::{observation::Observation, pointing_vector::PointingVector, SourceIndex, StationIndex};

/// The category of a committed scan (spec.md §3).
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
pub enum ScanTag {
    Standard,
    Fillin,
    Calibrator,
    HighImpact,
    AstrometricCorner,
}

/// Per-station bracketing times around the shared observing interval
/// (spec.md §3).
#[derive(Clone, Copy, Debug)]
pub struct StationScanTimes {
    pub slew_start: Epoch,
    pub slew_end: Epoch,
    pub idle_end: Epoch,
    pub preob_end: Epoch,
    pub observing_start: Epoch,
    pub observing_end: Epoch,
    pub postob_end: Epoch,
}

/// An ordered collection of [`PointingVector`]s at a single source,
/// together with the per-baseline [`Observation`]s negotiated for it
/// (spec.md §3).
#[derive(Clone, Debug)]
pub struct Scan {
    pub source: SourceIndex,
    pub tag: ScanTag,
    pub pointings: Vec<PointingVector>,
    /// Per-station timing, indexed in parallel with `pointings`.
    pub station_times: Vec<(StationIndex, StationScanTimes)>,
    pub observations: Vec<Observation>,
}

impl Scan {
    /// The scan's overall observing start: the maximum, over participating
    /// stations, of each station's end-of-pre-observation time (spec.md
    /// §3's invariant).
    pub fn observing_start(&self) -> Option<Epoch> {
        self.station_times
            .iter()
            .map(|(_, t)| t.observing_start)
            .max()
    }

    /// The scan's overall observing end: the maximum observing-end across
    /// participating stations (the point at which every station, including
    /// any that stopped early under station-specific early-stop, has
    /// finished).
    pub fn observing_end(&self) -> Option<Epoch> {
        self.station_times
            .iter()
            .map(|(_, t)| t.observing_end)
            .max()
    }

    pub fn stations(&self) -> impl Iterator<Item = StationIndex> + '_ {
        self.pointings.iter().map(|pv| pv.station)
    }

    pub fn station_time(&self, station: StationIndex) -> Option<&StationScanTimes> {
        self.station_times
            .iter()
            .find(|(s, _)| *s == station)
            .map(|(_, t)| t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::AzEl;
    use crate::mount::CableWrapSection;

    fn pv(station: StationIndex) -> PointingVector {
        PointingVector {
            station,
            source: 0,
            epoch: Epoch::from_gregorian_utc_at_midnight(2020, 1, 1),
            azel: AzEl::new(0.0, 0.0),
            hadec: None,
            wrap_section: CableWrapSection::Neutral,
            unwrapped_axis1: 0.0,
        }
    }

    fn times(offset_seconds: f64) -> StationScanTimes {
        let base = Epoch::from_gregorian_utc_at_midnight(2020, 1, 1);
        let d = hifitime::Duration::from_f64(offset_seconds, hifitime::Unit::Second);
        StationScanTimes {
            slew_start: base,
            slew_end: base + d,
            idle_end: base + d,
            preob_end: base + d,
            observing_start: base + d,
            observing_end: base + d + hifitime::Duration::from_f64(60.0, hifitime::Unit::Second),
            postob_end: base + d + hifitime::Duration::from_f64(65.0, hifitime::Unit::Second),
        }
    }

    #[test]
    fn observing_start_is_max_over_stations() {
        let scan = Scan {
            source: 0,
            tag: ScanTag::Standard,
            pointings: vec![pv(0), pv(1)],
            station_times: vec![(0, times(0.0)), (1, times(5.0))],
            observations: vec![],
        };
        assert_eq!(scan.observing_start(), Some(times(5.0).observing_start));
    }
}
