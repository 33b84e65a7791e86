// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Fill-in inserter (component C12): admits candidate scans whose
//! commitment does not delay a station's next already-accepted scan,
//! per spec.md §4.9.

use hifitime::{Duration, Epoch, Unit};

use crate::model::StationIndex;

/// The fill-in admissibility test's per-station inputs, per spec.md §4.9.
#[derive(Clone, Copy, Debug)]
pub struct FillinStationCheck {
    pub station: StationIndex,
    /// When this fill-in's slew+preob+observing+postob chain would end,
    /// for this station.
    pub projected_postob_end: Epoch,
    /// The start of this station's next already-committed scan's slew,
    /// minus the slew time that scan requires from the fill-in's
    /// pointing (i.e. the latest the fill-in may finish).
    pub next_commitment_deadline: Epoch,
}

/// Whether every participating station's fill-in chain completes before
/// its next-commitment deadline, per spec.md §4.9.
pub fn is_fillin_admissible(checks: &[FillinStationCheck]) -> bool {
    checks
        .iter()
        .all(|c| c.projected_postob_end <= c.next_commitment_deadline)
}

fn seconds(s: f64) -> Duration {
    Duration::from_f64(s, Unit::Second)
}

/// Compute the projected postob-end for a station given the fill-in's
/// observing start, observing duration, and postob overhead.
pub fn projected_postob_end(observing_start: Epoch, observing_seconds: f64, postob_seconds: f64) -> Epoch {
    observing_start + seconds(observing_seconds + postob_seconds)
}

/// Find the first gap (by index into the committed scan list) into which
/// a fill-in scan beginning at `candidate_start` may be inserted without
/// disturbing ordering, for the *a posteriori* insertion mode of
/// spec.md §4.9. `scan_starts` must be sorted ascending.
pub fn find_insertion_index(scan_starts: &[Epoch], candidate_start: Epoch) -> usize {
    scan_starts
        .iter()
        .position(|&start| start > candidate_start)
        .unwrap_or(scan_starts.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn epoch(offset_seconds: f64) -> Epoch {
        Epoch::from_gregorian_utc_at_midnight(2020, 1, 1) + seconds(offset_seconds)
    }

    #[test]
    fn admissible_when_finishing_before_deadline() {
        let checks = vec![FillinStationCheck {
            station: 0,
            projected_postob_end: epoch(100.0),
            next_commitment_deadline: epoch(150.0),
        }];
        assert!(is_fillin_admissible(&checks));
    }

    #[test]
    fn inadmissible_when_finishing_after_deadline() {
        let checks = vec![FillinStationCheck {
            station: 0,
            projected_postob_end: epoch(200.0),
            next_commitment_deadline: epoch(150.0),
        }];
        assert!(!is_fillin_admissible(&checks));
    }

    #[test]
    fn insertion_index_finds_first_later_scan() {
        let starts = vec![epoch(0.0), epoch(100.0), epoch(200.0)];
        assert_eq!(find_insertion_index(&starts, epoch(50.0)), 1);
        assert_eq!(find_insertion_index(&starts, epoch(250.0)), 3);
    }
}
