// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Calibrator / high-impact / focus-corner rules (component C14), per
//! spec.md §4.10.

use hifitime::{Duration, Epoch};

use crate::coord::AzEl;
use crate::model::StationIndex;

/// How often a calibrator block fires: a fixed wall-clock cadence, or
/// every N scans.
#[derive(Clone, Copy, Debug)]
pub enum CalibratorCadence {
    Interval(Duration),
    EveryNScans(usize),
}

/// Calibrator-block configuration, per spec.md §4.10.
#[derive(Clone, Debug)]
pub struct CalibratorBlockConfig {
    pub cadence: CalibratorCadence,
    pub min_calibrator_scans: usize,
    pub source_group: String,
    /// Target low/high-elevation pair the block's scans are ranked
    /// against via [`calibrator_elevation_pair_cost`].
    pub target_low_elevation_rad: f64,
    pub target_high_elevation_rad: f64,
}

/// Whether a calibrator block should fire now, given the time or scan
/// count since the last block.
pub fn calibrator_block_due(
    config: &CalibratorBlockConfig,
    now: Epoch,
    last_block_end: Option<Epoch>,
    scans_since_last_block: usize,
) -> bool {
    match config.cadence {
        CalibratorCadence::Interval(interval) => match last_block_end {
            None => true,
            Some(last) => now >= last + interval,
        },
        CalibratorCadence::EveryNScans(n) => scans_since_last_block >= n,
    }
}

/// Rank two candidate calibrator scans by how close to an ideal
/// low/high-elevation pair they sit at both ends of the network, per
/// spec.md §4.10: "targets elevation pairs (low-el, high-el)". Lower is
/// better.
pub fn calibrator_elevation_pair_cost(
    low_end_elevation_rad: f64,
    high_end_elevation_rad: f64,
    target_low_rad: f64,
    target_high_rad: f64,
) -> f64 {
    (low_end_elevation_rad - target_low_rad).abs() + (high_end_elevation_rad - target_high_rad).abs()
}

/// One high-impact station being monitored, per spec.md §4.10.
#[derive(Clone, Copy, Debug)]
pub struct HighImpactTarget {
    pub station: StationIndex,
    pub target_azel: AzEl,
    pub margin_rad: f64,
    pub interval_seconds: f64,
    /// Score bonus applied to a candidate scan that keeps this station
    /// within `margin_rad` of `target_azel`, per spec.md §4.10.
    pub score_bonus: f64,
}

/// Whether `projected_azel` (the station's az/el `interval_seconds` from
/// now) lies within `margin_rad` of the high-impact target, per spec.md
/// §4.10. When true, the planner should raise the score of scans
/// including this station.
pub fn high_impact_triggered(target: &HighImpactTarget, projected_azel: AzEl) -> bool {
    target.target_azel.separation(&projected_azel) <= target.margin_rad
}

/// The four geometric corners of the mutually visible sky the
/// focus-corner rule cycles through, per spec.md §4.10.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
pub enum SkyCorner {
    NorthEast,
    NorthWest,
    SouthEast,
    SouthWest,
}

impl SkyCorner {
    /// The nominal azimuth (radians, from North through East) at the
    /// centre of this corner's quadrant.
    pub fn nominal_azimuth_rad(&self) -> f64 {
        match self {
            SkyCorner::NorthEast => crate::constants::FRAC_PI_2 / 2.0,
            SkyCorner::NorthWest => crate::constants::TAU - crate::constants::FRAC_PI_2 / 2.0,
            SkyCorner::SouthEast => crate::constants::PI - crate::constants::FRAC_PI_2 / 2.0,
            SkyCorner::SouthWest => crate::constants::PI + crate::constants::FRAC_PI_2 / 2.0,
        }
    }

    /// Which corner a given azimuth (radians) falls within.
    pub fn containing(az_rad: f64) -> Self {
        let az = crate::time::normalise_radians(az_rad);
        if az < crate::constants::FRAC_PI_2 {
            SkyCorner::NorthEast
        } else if az < crate::constants::PI {
            SkyCorner::SouthEast
        } else if az < crate::constants::PI + crate::constants::FRAC_PI_2 {
            SkyCorner::SouthWest
        } else {
            SkyCorner::NorthWest
        }
    }
}

/// Focus-corner rule state: the cadence at which each corner must be
/// observed, and when each was last observed.
#[derive(Clone, Debug)]
pub struct FocusCornerTracker {
    pub cadence: Duration,
    last_observed: std::collections::HashMap<String, Epoch>,
}

impl FocusCornerTracker {
    pub fn new(cadence: Duration) -> Self {
        Self {
            cadence,
            last_observed: std::collections::HashMap::new(),
        }
    }

    pub fn record(&mut self, corner: SkyCorner, now: Epoch) {
        self.last_observed.insert(corner.to_string(), now);
    }

    /// Whether `corner` is overdue for observation at `now`, per spec.md
    /// §4.10's configured cadence.
    pub fn is_overdue(&self, corner: SkyCorner, now: Epoch) -> bool {
        match self.last_observed.get(&corner.to_string()) {
            None => true,
            Some(&last) => now >= last + self.cadence,
        }
    }
}

/// Everything the planner needs from C14 in one place: the calibrator-
/// block configuration (if enabled), the high-impact stations being
/// monitored, and the focus-corner cadence/bonus (if enabled). Threaded
/// into the planner via `PlannerInputs` (spec.md §4.11).
#[derive(Clone, Debug, Default)]
pub struct RulesConfig {
    pub calibrator: Option<CalibratorBlockConfig>,
    pub high_impact_targets: Vec<HighImpactTarget>,
    pub focus_corner_cadence: Option<Duration>,
    pub focus_corner_score_bonus: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calibrator_config(cadence: CalibratorCadence) -> CalibratorBlockConfig {
        CalibratorBlockConfig {
            cadence,
            min_calibrator_scans: 2,
            source_group: "calibrators".to_string(),
            target_low_elevation_rad: 20_f64.to_radians(),
            target_high_elevation_rad: 80_f64.to_radians(),
        }
    }

    #[test]
    fn calibrator_due_immediately_without_prior_block() {
        let config = calibrator_config(CalibratorCadence::Interval(hifitime::Duration::from_f64(
            3600.0,
            hifitime::Unit::Second,
        )));
        let now = Epoch::from_gregorian_utc_at_midnight(2020, 1, 1);
        assert!(calibrator_block_due(&config, now, None, 0));
    }

    #[test]
    fn calibrator_due_by_scan_count() {
        let config = calibrator_config(CalibratorCadence::EveryNScans(10));
        let now = Epoch::from_gregorian_utc_at_midnight(2020, 1, 1);
        assert!(!calibrator_block_due(&config, now, None, 5));
        assert!(calibrator_block_due(&config, now, None, 10));
    }

    #[test]
    fn corner_containment_matches_quadrants() {
        assert_eq!(SkyCorner::containing(10_f64.to_radians()), SkyCorner::NorthEast);
        assert_eq!(SkyCorner::containing(100_f64.to_radians()), SkyCorner::SouthEast);
        assert_eq!(SkyCorner::containing(200_f64.to_radians()), SkyCorner::SouthWest);
        assert_eq!(SkyCorner::containing(350_f64.to_radians()), SkyCorner::NorthWest);
    }

    #[test]
    fn focus_corner_overdue_until_recorded() {
        let mut tracker = FocusCornerTracker::new(hifitime::Duration::from_f64(
            3600.0,
            hifitime::Unit::Second,
        ));
        let t0 = Epoch::from_gregorian_utc_at_midnight(2020, 1, 1);
        assert!(tracker.is_overdue(SkyCorner::NorthEast, t0));
        tracker.record(SkyCorner::NorthEast, t0);
        assert!(!tracker.is_overdue(SkyCorner::NorthEast, t0));
    }
}
