// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Horizon mask (component C3): per-station elevation-as-function-of-azimuth
//! cutoff, per spec.md §4.2.

use crate::time::normalise_radians;

/// Two supported mask representations (spec.md §4.2).
#[derive(Clone, Debug)]
pub enum HorizonMask {
    /// Elevation samples at listed azimuths, linearly interpolated.
    /// `points` must be sorted by azimuth and cover `[0, 2*pi)`.
    Line { points: Vec<(f64, f64)> },
    /// Constant elevation over each azimuth bin. `bins` holds
    /// (bin-start-azimuth, elevation) pairs, sorted by azimuth; the bin
    /// extends to the next entry's azimuth (wrapping).
    Step { bins: Vec<(f64, f64)> },
}

impl HorizonMask {
    /// The mask's minimum elevation at `az` (radians).
    pub fn min_elevation(&self, az: f64) -> f64 {
        let az = normalise_radians(az);
        match self {
            HorizonMask::Line { points } => interpolate_line(points, az),
            HorizonMask::Step { bins } => step_lookup(bins, az),
        }
    }

    /// Whether `(az, el)` is above the mask. On ties (el exactly equal to
    /// the mask value) visibility is true, per spec.md §4.2.
    pub fn visible(&self, az: f64, el: f64) -> bool {
        el >= self.min_elevation(az)
    }
}

fn interpolate_line(points: &[(f64, f64)], az: f64) -> f64 {
    if points.is_empty() {
        return 0.0;
    }
    if points.len() == 1 {
        return points[0].1;
    }
    // Find the bracketing pair, wrapping around 2*pi.
    for window in points.windows(2) {
        let (az0, el0) = window[0];
        let (az1, el1) = window[1];
        if az0 <= az && az <= az1 {
            let frac = if (az1 - az0).abs() < 1e-12 {
                0.0
            } else {
                (az - az0) / (az1 - az0)
            };
            return el0 + frac * (el1 - el0);
        }
    }
    // Wrap-around segment: last point to first point (+ 2*pi).
    let (az_last, el_last) = *points.last().unwrap();
    let (az_first, el_first) = points[0];
    let az1 = az_first + crate::constants::TAU;
    let frac = if (az1 - az_last).abs() < 1e-12 {
        0.0
    } else {
        (az - az_last) / (az1 - az_last)
    };
    el_last + frac * (el_first - el_last)
}

fn step_lookup(bins: &[(f64, f64)], az: f64) -> f64 {
    if bins.is_empty() {
        return 0.0;
    }
    let mut chosen = bins[0].1;
    for &(bin_az, el) in bins {
        if bin_az <= az {
            chosen = el;
        }
    }
    chosen
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn line_mask_interpolates() {
        let mask = HorizonMask::Line {
            points: vec![(0.0, 0.0), (crate::constants::FRAC_PI_2, 10_f64.to_radians())],
        };
        let mid = crate::constants::FRAC_PI_2 / 2.0;
        assert_abs_diff_eq!(mask.min_elevation(mid), 5_f64.to_radians(), epsilon = 1e-9);
    }

    #[test]
    fn step_mask_is_constant_per_bin() {
        let mask = HorizonMask::Step {
            bins: vec![(0.0, 5_f64.to_radians()), (crate::constants::PI, 10_f64.to_radians())],
        };
        assert_abs_diff_eq!(mask.min_elevation(0.1), 5_f64.to_radians(), epsilon = 1e-9);
        assert_abs_diff_eq!(
            mask.min_elevation(crate::constants::PI + 0.1),
            10_f64.to_radians(),
            epsilon = 1e-9
        );
    }

    #[test]
    fn visible_is_true_on_tie() {
        let mask = HorizonMask::Step {
            bins: vec![(0.0, 10_f64.to_radians())],
        };
        assert!(mask.visible(0.0, 10_f64.to_radians()));
    }

    #[test]
    fn visible_is_false_below_mask() {
        let mask = HorizonMask::Step {
            bins: vec![(0.0, 10_f64.to_radians())],
        };
        assert!(!mask.visible(0.0, 9_f64.to_radians()));
    }
}
