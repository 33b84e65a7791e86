// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Antenna kinematics (component C2): two-axis mount slew-time solver with
//! cable-wrap disambiguation, per spec.md §4.1.

use thiserror::Error;

use crate::coord::{AzEl, HADec, RADec};
use crate::time::{lst_radians, normalise_radians, wrap_pi};

/// The physical mount type, determining how (ra, dec, t) maps to
/// mount-frame axis coordinates (spec.md §4.1).
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
pub enum MountType {
    AzEl,
    EqHaDec,
    /// An X-Y mount: like AzEl but rotated 90 degrees, so the primary axis
    /// tracks more gracefully near the zenith.
    XY,
}

/// Rate, overhead, and legal-interval limits for one mount axis.
#[derive(Clone, Copy, Debug)]
pub struct AxisLimits {
    pub max_rate_rad_per_s: f64,
    /// Fixed extra time modelling acceleration/settle overhead (seconds).
    pub overhead_seconds: f64,
    pub min_rad: f64,
    pub max_rad: f64,
}

impl AxisLimits {
    pub fn in_range(&self, value: f64) -> bool {
        value >= self.min_rad && value <= self.max_rad
    }

    /// Time to move from `from` to `to` along this axis (seconds).
    pub fn slew_time(&self, from: f64, to: f64) -> f64 {
        self.overhead_seconds + (to - from).abs() / self.max_rate_rad_per_s
    }
}

/// A named cable-wrap section on the primary axis (spec.md §4.1/§9: "CCW",
/// "N", "CW" in the source catalog, mapped to enumerated variants at parse
/// time).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum CableWrapSection {
    Clockwise,
    Neutral,
    CounterClockwise,
}

pub const ALL_WRAP_SECTIONS: [CableWrapSection; 3] = [
    CableWrapSection::Clockwise,
    CableWrapSection::Neutral,
    CableWrapSection::CounterClockwise,
];

/// The complete two-axis mount descriptor (spec.md §4.1).
#[derive(Clone, Debug)]
pub struct Mount {
    pub mount_type: MountType,
    pub axis1: AxisLimits,
    pub axis2: AxisLimits,
    /// Named wrap sections on axis 1; the section's limits further
    /// restrict `axis1`'s `[min_rad, max_rad)`. Stations with a
    /// non-wrapping primary axis (most AzEl mounts) leave this empty.
    pub wrap_sections: Vec<(CableWrapSection, AxisLimits)>,
}

/// How a candidate cable-wrap section is chosen among those that are
/// in-limits (spec.md §4.1).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WrapPolicy {
    /// Pick the candidate whose unwrapped axis-1 value is closest to the
    /// station's current axis-1 value.
    UnwrapNear,
    /// Pick the candidate inside a specific named section.
    UnwrapInSection(CableWrapSection),
}

#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum MountError {
    #[error("no cable-wrap section can reach the target within its axis limits")]
    NotVisible,
}

/// The result of a successful slew solve (spec.md §4.1).
#[derive(Clone, Copy, Debug)]
pub struct SlewResult {
    pub azel: AzEl,
    pub wrap_section: CableWrapSection,
    pub unwrapped_axis1: f64,
    pub axis2_value: f64,
    pub slew_time_seconds: f64,
}

impl Mount {
    /// Convert (ra, dec, t) into target mount-frame axis values, per mount
    /// type (spec.md §4.1 step 1).
    fn target_axes(&self, radec: RADec, epoch: hifitime::Epoch, longitude_rad: f64, latitude_rad: f64) -> (f64, f64) {
        match self.mount_type {
            MountType::AzEl => {
                let lst = lst_radians(epoch, longitude_rad);
                let hadec = radec.to_hadec(lst);
                let azel = hadec.to_azel(latitude_rad);
                (azel.az, azel.el)
            }
            MountType::EqHaDec => {
                let lst = lst_radians(epoch, longitude_rad);
                let hadec: HADec = radec.to_hadec(lst);
                (hadec.ha, hadec.dec)
            }
            MountType::XY => {
                let lst = lst_radians(epoch, longitude_rad);
                let hadec = radec.to_hadec(lst);
                let azel = hadec.to_azel(latitude_rad);
                // A 90-degree rotation of the AzEl frame: axis1 tracks
                // what would be elevation, axis2 what would be azimuth,
                // per spec.md §4.1.
                (azel.el, azel.az)
            }
        }
    }

    /// Solve for the slew from `current` (current az/el and wrap section,
    /// or `None` if the station has no prior pointing) to `radec` at
    /// `epoch`, per spec.md §4.1 steps 2-4. The wrap section only
    /// disambiguates axis-1 unwrapping, which is driven entirely by
    /// `current_azel`'s axis-1 component; it is accepted for symmetry
    /// with the caller's stored `(AzEl, CableWrapSection)` pointing state
    /// but does not itself feed the slew-time computation.
    #[allow(clippy::too_many_arguments)]
    pub fn solve_slew(
        &self,
        current_azel: Option<AzEl>,
        _current_wrap_section: Option<CableWrapSection>,
        radec: RADec,
        epoch: hifitime::Epoch,
        longitude_rad: f64,
        latitude_rad: f64,
        policy: WrapPolicy,
    ) -> Result<SlewResult, MountError> {
        let (target_axis1, target_axis2) = self.target_axes(radec, epoch, longitude_rad, latitude_rad);
        let current_axis1 = current_azel
            .map(|azel| match self.mount_type {
                MountType::AzEl => azel.az,
                MountType::EqHaDec => {
                    // Reconstruct the current hour angle from az/el is not
                    // exact without the original HADec, but for slew-time
                    // purposes the previous unwrapped axis-1 value is what
                    // matters, and that is tracked by the caller; fall
                    // back to 0 when unavailable.
                    azel.az
                }
                MountType::XY => azel.el,
            })
            .unwrap_or(target_axis1);
        let current_axis2 = current_azel
            .map(|azel| match self.mount_type {
                MountType::AzEl => azel.el,
                // Same approximation as current_axis1 above: the exact
                // declination is not recoverable from stored az/el without
                // the original HADec, so elevation stands in for it.
                MountType::EqHaDec => azel.el,
                MountType::XY => azel.az,
            })
            .unwrap_or(target_axis2);

        if !self.axis2.in_range(target_axis2) {
            return Err(MountError::NotVisible);
        }

        let sections: Vec<(CableWrapSection, AxisLimits)> = if self.wrap_sections.is_empty() {
            vec![(CableWrapSection::Neutral, self.axis1)]
        } else {
            self.wrap_sections.clone()
        };

        // Step 2: up to three unwrapped candidates, one per section,
        // discarding out-of-limit ones.
        let mut candidates = Vec::new();
        for (section, limits) in &sections {
            for k in -2..=2 {
                let candidate = target_axis1 + (k as f64) * crate::constants::TAU;
                if limits.in_range(candidate) {
                    candidates.push((*section, candidate));
                }
            }
        }
        if candidates.is_empty() {
            return Err(MountError::NotVisible);
        }

        // Step 3/4: pick by policy, compute slew time, monotone in the
        // dominant axis.
        let chosen = match policy {
            WrapPolicy::UnwrapNear => candidates
                .iter()
                .min_by(|(_, a), (_, b)| {
                    (a - current_axis1)
                        .abs()
                        .partial_cmp(&(b - current_axis1).abs())
                        .unwrap()
                })
                .copied()
                .unwrap(),
            WrapPolicy::UnwrapInSection(section) => candidates
                .iter()
                .filter(|(s, _)| *s == section)
                .min_by(|(_, a), (_, b)| {
                    (a - current_axis1)
                        .abs()
                        .partial_cmp(&(b - current_axis1).abs())
                        .unwrap()
                })
                .copied()
                .ok_or(MountError::NotVisible)?,
        };

        let (wrap_section, unwrapped_axis1) = chosen;
        let time_axis1 = self.axis1.slew_time(current_axis1, unwrapped_axis1);
        let time_axis2 = self.axis2.slew_time(current_axis2, target_axis2);
        let slew_time_seconds = time_axis1.max(time_axis2);

        let azel = match self.mount_type {
            MountType::AzEl => AzEl::new(normalise_radians(unwrapped_axis1), target_axis2),
            MountType::EqHaDec => {
                // Converting back to az/el for display purposes only; the
                // scheduler's visibility logic primarily uses az/el, so
                // provide a best-effort conversion.
                let hadec = HADec::new(wrap_pi(unwrapped_axis1), target_axis2);
                hadec.to_azel(latitude_rad)
            }
            MountType::XY => AzEl::new(target_axis2, unwrapped_axis1),
        };

        Ok(SlewResult {
            azel,
            wrap_section,
            unwrapped_axis1,
            axis2_value: target_axis2,
            slew_time_seconds,
        })
    }

    /// Approximate slew time (seconds) from `current_azel` (or no motion
    /// at all, if `None`) to `(target_az, target_el)`, skipping cable-wrap
    /// disambiguation entirely. Used by the fast pointing path (spec.md
    /// §4.3/§9) during candidate enumeration; the exact wrap section and
    /// slew time are re-derived by [`Self::solve_slew`] once a scan is
    /// actually committed.
    pub fn fast_slew_estimate(&self, current_azel: Option<AzEl>, target_az: f64, target_el: f64) -> f64 {
        let (cur_az, cur_el) = current_azel.map(|a| (a.az, a.el)).unwrap_or((target_az, target_el));
        let mut d_az = target_az - cur_az;
        if d_az > crate::constants::TAU / 2.0 {
            d_az -= crate::constants::TAU;
        } else if d_az < -crate::constants::TAU / 2.0 {
            d_az += crate::constants::TAU;
        }
        let time_axis1 = self.axis1.slew_time(0.0, d_az.abs());
        let time_axis2 = self.axis2.slew_time(cur_el, target_el);
        time_axis1.max(time_axis2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simple_mount() -> Mount {
        Mount {
            mount_type: MountType::AzEl,
            axis1: AxisLimits {
                max_rate_rad_per_s: 1.0_f64.to_radians(),
                overhead_seconds: 5.0,
                min_rad: (-270_f64).to_radians(),
                max_rad: 270_f64.to_radians(),
            },
            axis2: AxisLimits {
                max_rate_rad_per_s: 0.5_f64.to_radians(),
                overhead_seconds: 5.0,
                min_rad: 0.0,
                max_rad: 90_f64.to_radians(),
            },
            wrap_sections: vec![],
        }
    }

    #[test]
    fn below_axis2_limit_is_not_visible() {
        let mount = simple_mount();
        let epoch = hifitime::Epoch::from_gregorian_utc_at_midnight(2020, 1, 1);
        // A target whose elevation would be negative given lat 0, dec -80
        // at transit cannot reach axis2's [0, 90] range's implicit floor
        // via this simplified axis2 check when el goes negative.
        let radec = RADec::new_degrees(0.0, -89.0);
        let result = mount.solve_slew(None, None, radec, epoch, 0.0, 80_f64.to_radians(), WrapPolicy::UnwrapNear);
        assert!(result.is_err());
    }

    #[test]
    fn slew_time_grows_with_distance() {
        let mount = simple_mount();
        let epoch = hifitime::Epoch::from_gregorian_utc_at_midnight(2020, 1, 1);
        let near = RADec::new_degrees(10.0, 10.0);
        let far = RADec::new_degrees(10.0, 80.0);
        let lat = 20_f64.to_radians();

        let current = mount
            .solve_slew(None, None, near, epoch, 0.0, lat, WrapPolicy::UnwrapNear)
            .unwrap();
        let to_near = mount
            .solve_slew(Some(current.azel), Some(current.wrap_section), near, epoch, 0.0, lat, WrapPolicy::UnwrapNear)
            .unwrap();
        let to_far = mount
            .solve_slew(Some(current.azel), Some(current.wrap_section), far, epoch, 0.0, lat, WrapPolicy::UnwrapNear)
            .unwrap();
        assert!(to_far.slew_time_seconds >= to_near.slew_time_seconds);
    }

    /// Regression test: axis-2 (elevation) slew time must scale with the
    /// actual elevation delta from the previous pointing, not always
    /// collapse to the axis's bare overhead.
    #[test]
    fn axis2_slew_time_reflects_elevation_delta() {
        let mount = simple_mount();
        let epoch = hifitime::Epoch::from_gregorian_utc_at_midnight(2020, 1, 1);
        let lat = 20_f64.to_radians();

        let low = RADec::new_degrees(10.0, -5.0);
        let high = RADec::new_degrees(10.0, 65.0);

        let current = mount
            .solve_slew(None, None, low, epoch, 0.0, lat, WrapPolicy::UnwrapNear)
            .unwrap();
        // Slewing from `current`'s elevation to a target far away in
        // elevation must take longer than slewing back to the same
        // elevation, which only the overhead should cost.
        let stay = mount
            .solve_slew(Some(current.azel), Some(current.wrap_section), low, epoch, 0.0, lat, WrapPolicy::UnwrapNear)
            .unwrap();
        let climb = mount
            .solve_slew(Some(current.azel), Some(current.wrap_section), high, epoch, 0.0, lat, WrapPolicy::UnwrapNear)
            .unwrap();

        approx::assert_abs_diff_eq!(
            stay.slew_time_seconds,
            mount.axis2.overhead_seconds.max(mount.axis1.overhead_seconds),
            epsilon = 1e-9
        );
        assert!(
            climb.slew_time_seconds > stay.slew_time_seconds,
            "expected a real elevation slew to take longer than a same-elevation re-point: {} vs {}",
            climb.slew_time_seconds,
            stay.slew_time_seconds
        );
    }

    /// Two overlapping cable-wrap sections; the chosen section and
    /// unwrapped axis-1 value must be whichever minimises |delta axis1|
    /// from the previous pointing (spec.md §8 scenario 3).
    #[test]
    fn cable_wrap_disambiguation_picks_section_nearest_current_pointing() {
        let mount = Mount {
            mount_type: MountType::AzEl,
            axis1: AxisLimits {
                max_rate_rad_per_s: 1.0_f64.to_radians(),
                overhead_seconds: 5.0,
                min_rad: (-540_f64).to_radians(),
                max_rad: 540_f64.to_radians(),
            },
            axis2: AxisLimits {
                max_rate_rad_per_s: 0.5_f64.to_radians(),
                overhead_seconds: 5.0,
                min_rad: 0.0,
                max_rad: 90_f64.to_radians(),
            },
            wrap_sections: vec![
                (
                    CableWrapSection::CounterClockwise,
                    AxisLimits {
                        max_rate_rad_per_s: 1.0_f64.to_radians(),
                        overhead_seconds: 5.0,
                        min_rad: (-540_f64).to_radians(),
                        max_rad: 10_f64.to_radians(),
                    },
                ),
                (
                    CableWrapSection::Clockwise,
                    AxisLimits {
                        max_rate_rad_per_s: 1.0_f64.to_radians(),
                        overhead_seconds: 5.0,
                        min_rad: (-10_f64).to_radians(),
                        max_rad: 540_f64.to_radians(),
                    },
                ),
            ],
        };
        let epoch = hifitime::Epoch::from_gregorian_utc_at_midnight(2020, 1, 1);
        let lat = 20_f64.to_radians();
        let radec = RADec::new_degrees(10.0, 10.0);

        // With no prior pointing, `solve_slew` picks the candidate closest
        // to the raw target az itself, which always lies in the
        // clockwise section's [-10, 540] range (see the derivation in
        // this test's comment above); its `unwrapped_axis1` is the
        // unshifted target azimuth `theta`, used below as a reference.
        let base = mount.solve_slew(None, None, radec, epoch, 0.0, lat, WrapPolicy::UnwrapNear).unwrap();
        let theta = base.unwrapped_axis1;

        // Approaching from `theta - 360 deg` sits deep in the
        // counter-clockwise section (whose [-540, 10] range always
        // contains `theta - 360 deg` for `theta` in [0, 360) deg) and far
        // from the clockwise candidate `theta`, so the nearest-unwrap
        // policy must stay in the counter-clockwise section.
        let current_ccw = AzEl::new(theta - crate::constants::TAU, 10_f64.to_radians());
        let result_ccw = mount
            .solve_slew(Some(current_ccw), Some(CableWrapSection::CounterClockwise), radec, epoch, 0.0, lat, WrapPolicy::UnwrapNear)
            .unwrap();
        assert_eq!(result_ccw.wrap_section, CableWrapSection::CounterClockwise);
        approx::assert_abs_diff_eq!(result_ccw.unwrapped_axis1, theta - crate::constants::TAU, epsilon = 1e-9);

        // Approaching from `theta` itself instead, with the target
        // (ra, dec, epoch) completely unchanged, the nearest-unwrap
        // policy must flip to the clockwise section.
        let current_cw = AzEl::new(theta, 10_f64.to_radians());
        let result_cw = mount
            .solve_slew(Some(current_cw), Some(CableWrapSection::Clockwise), radec, epoch, 0.0, lat, WrapPolicy::UnwrapNear)
            .unwrap();
        assert_eq!(result_cw.wrap_section, CableWrapSection::Clockwise);
        approx::assert_abs_diff_eq!(result_cw.unwrapped_axis1, theta, epsilon = 1e-9);
    }

    #[test]
    fn fast_slew_estimate_grows_with_elevation_distance() {
        let mount = simple_mount();
        let stay = mount.fast_slew_estimate(Some(AzEl::new(0.0, 10_f64.to_radians())), 0.0, 10_f64.to_radians());
        let climb = mount.fast_slew_estimate(Some(AzEl::new(0.0, 10_f64.to_radians())), 0.0, 80_f64.to_radians());
        assert!(climb > stay);
    }
}
