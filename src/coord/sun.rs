// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Low-precision Sun position, used by the pointing evaluator's
//! `SunTooClose` rejection (C6).

use hifitime::Epoch;

use super::radec::RADec;
use crate::time::julian_centuries_j2000;

/// Apparent geocentric RA/Dec of the Sun, via the standard low-precision
/// series (Meeus, *Astronomical Algorithms*, ch. 25), accurate to about
/// 0.01 degrees -- ample for a minimum-sun-distance rejection test.
pub fn sun_radec(epoch: Epoch) -> RADec {
    let t = julian_centuries_j2000(epoch);

    let l0 = crate::time::normalise_radians((280.466_46 + 36000.769_83 * t).to_radians());
    let m = crate::time::normalise_radians((357.529_11 + 35999.050_29 * t).to_radians());

    let c = ((1.914_602 - 0.004_817 * t) * m.sin()
        + 0.019_993 * (2.0 * m).sin()
        + 0.000_29 * (3.0 * m).sin())
    .to_radians();

    let true_longitude = l0 + c;
    let omega = (125.04 - 1934.136 * t).to_radians();
    let apparent_longitude = true_longitude - (0.005_69_f64).to_radians()
        - (0.004_78_f64).to_radians() * omega.sin();

    let eps0 = (23.439_29 - 0.013_004_2 * t).to_radians();
    let eps = eps0 + (0.002_56_f64).to_radians() * omega.cos();

    let sin_lambda = apparent_longitude.sin();
    let ra = apparent_longitude
        .cos()
        .atan2(sin_lambda * eps.cos())
        .rem_euclid(crate::constants::TAU);
    let dec = (eps.sin() * sin_lambda).clamp(-1.0, 1.0).asin();

    RADec::new(ra, dec)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sun_is_within_ecliptic_band() {
        let epoch = Epoch::from_gregorian_utc_at_midnight(2020, 1, 1);
        let sun = sun_radec(epoch);
        // The Sun's declination can never exceed the obliquity of the
        // ecliptic (about 23.44 degrees).
        assert!(sun.dec.abs() <= 23.5_f64.to_radians());
    }

    #[test]
    fn sun_moves_over_a_month() {
        let a = sun_radec(Epoch::from_gregorian_utc_at_midnight(2020, 1, 1));
        let b = sun_radec(Epoch::from_gregorian_utc_at_midnight(2020, 2, 1));
        assert!(a.separation(&b) > 10_f64.to_radians());
    }
}
