// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Time and Earth-rotation primitives (component C1).
//!
//! MJD/UT conversions are delegated to [`hifitime`]; sidereal time and Earth
//! rotation angle follow the standard IAU low-precision polynomials, which
//! are adequate given spec.md's geometric-plus-elevation approximation
//! non-goal for atmospheric delay (sidereal time itself is not an
//! atmospheric quantity, but the same "good enough for scheduling" standard
//! applies).

use hifitime::{Epoch, Unit};

use crate::constants::{DAYS_PER_JULIAN_CENTURY, MJD_J2000, PI, TAU};

/// Modified Julian Date (UTC) of an epoch.
pub fn mjd_utc(epoch: Epoch) -> f64 {
    epoch.as_mjd_utc(Unit::Day)
}

/// Build an [Epoch] from a Modified Julian Date (UTC).
pub fn epoch_from_mjd_utc(mjd: f64) -> Epoch {
    Epoch::from_mjd_utc(mjd)
}

/// Julian centuries of UT1 elapsed since J2000.0.
///
/// Using UTC in place of UT1 here introduces a sub-second error, well inside
/// scheduling tolerances.
pub fn julian_centuries_j2000(epoch: Epoch) -> f64 {
    (mjd_utc(epoch) - MJD_J2000) / DAYS_PER_JULIAN_CENTURY
}

/// Greenwich Mean Sidereal Time, in radians, via the IAU 1982 polynomial
/// (Meeus, *Astronomical Algorithms*, eq. 12.4).
pub fn gmst_radians(epoch: Epoch) -> f64 {
    let jd = mjd_utc(epoch) + 2_400_000.5;
    let t = (jd - 2_451_545.0) / DAYS_PER_JULIAN_CENTURY;

    // Degrees.
    let gmst_deg = 280.460_618_37
        + 360.985_647_366_29 * (jd - 2_451_545.0)
        + 0.000_387_933 * t * t
        - t * t * t / 38_710_000.0;

    normalise_radians(gmst_deg.to_radians())
}

/// Local (mean) sidereal time at a given geographic longitude (radians,
/// east-positive), in radians.
pub fn lst_radians(epoch: Epoch, longitude_rad: f64) -> f64 {
    normalise_radians(gmst_radians(epoch) + longitude_rad)
}

/// Earth Rotation Angle (IAU 2000 definition), in radians.
pub fn earth_rotation_angle(epoch: Epoch) -> f64 {
    let jd = mjd_utc(epoch) + 2_400_000.5;
    let du = jd - 2_451_545.0;
    let frac_day = du.rem_euclid(1.0);
    let era_turns = frac_day + 0.779_057_273_264_0 + 0.002_737_811_911_354_48 * du;
    normalise_radians(era_turns * TAU)
}

/// Wrap an angle (radians) into `[0, 2*pi)`.
pub fn normalise_radians(a: f64) -> f64 {
    let mut x = a % TAU;
    if x < 0.0 {
        x += TAU;
    }
    x
}

/// Wrap an angle (radians) into `[-pi, pi)`.
pub fn wrap_pi(a: f64) -> f64 {
    let mut x = normalise_radians(a + PI) - PI;
    if x < -PI {
        x += TAU;
    }
    x
}
