// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use super::hadec::HADec;

/// A Right Ascension / Declination pair, apparent or J2000 depending on
/// context. All units are in radians.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RADec {
    /// Right ascension \[radians\]
    pub ra: f64,
    /// Declination \[radians\]
    pub dec: f64,
}

impl RADec {
    /// Make a new `RADec` struct from values in radians.
    pub fn new(ra: f64, dec: f64) -> Self {
        Self { ra, dec }
    }

    /// Make a new `RADec` struct from values in degrees.
    pub fn new_degrees(ra: f64, dec: f64) -> Self {
        Self::new(ra.to_radians(), dec.to_radians())
    }

    /// Given a local sidereal time (radians), make a new [`HADec`] from this
    /// `RADec`.
    pub fn to_hadec(&self, lst: f64) -> HADec {
        HADec {
            ha: crate::time::wrap_pi(lst - self.ra),
            dec: self.dec,
        }
    }

    /// Given a local sidereal time (radians), make a new `RADec` from a
    /// [`HADec`].
    pub fn from_hadec(hadec: &HADec, lst: f64) -> Self {
        Self {
            ra: crate::time::normalise_radians(lst - hadec.ha),
            dec: hadec.dec,
        }
    }

    /// Angular distance between two sets of coordinates (radians).
    ///
    /// Uses ERFA's `eraSeps`, the haversine-safe great-circle separation
    /// formula.
    pub fn separation(&self, b: &Self) -> f64 {
        unsafe { erfa_sys::eraSeps(self.ra, self.dec, b.ra, b.dec) }
    }
}

impl std::fmt::Display for RADec {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "({}°, {}°)", self.ra.to_degrees(), self.dec.to_degrees())
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn hadec_roundtrip() {
        let radec = RADec::new_degrees(62.0, -27.5);
        let lst = 1.234_f64;
        let hadec = radec.to_hadec(lst);
        let back = RADec::from_hadec(&hadec, lst);
        assert_abs_diff_eq!(back.ra, radec.ra, epsilon = 1e-12);
        assert_abs_diff_eq!(back.dec, radec.dec, epsilon = 1e-12);
    }

    #[test]
    fn separation_zero_for_identical_coords() {
        let a = RADec::new_degrees(10.0, 20.0);
        assert_abs_diff_eq!(a.separation(&a), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn separation_quarter_turn() {
        let a = RADec::new_degrees(0.0, 0.0);
        let b = RADec::new_degrees(90.0, 0.0);
        assert_abs_diff_eq!(a.separation(&b), crate::constants::FRAC_PI_2, epsilon = 1e-9);
    }
}
