// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Precession-nutation, applied by the rigorous pointing evaluator (C6) to
//! turn a catalog J2000 [`RADec`] into an apparent-of-date `RADec`.
//!
//! The precession angles follow the IAU 1976 (Lieske) series; nutation is
//! approximated by its single dominant term (the 18.6-year lunar-node
//! term). This is the "geometric-plus-elevation approximation" spec.md
//! allows in place of a full numerical model, documented in DESIGN.md.

use hifitime::Epoch;

use super::radec::RADec;
use crate::time::julian_centuries_j2000;

/// Apply precession (IAU 1976) and a single-term nutation approximation to
/// convert a J2000 mean place into an apparent place at `epoch`.
pub fn j2000_to_apparent(radec: RADec, epoch: Epoch) -> RADec {
    let t = julian_centuries_j2000(epoch);

    // IAU 1976 precession angles (arcseconds -> radians).
    let arcsec = std::f64::consts::PI / (180.0 * 3600.0);
    let zeta = (2306.2181 * t + 0.30188 * t * t + 0.017998 * t * t * t) * arcsec;
    let z = (2306.2181 * t + 1.09468 * t * t + 0.018203 * t * t * t) * arcsec;
    let theta = (2004.3109 * t - 0.42665 * t * t - 0.041833 * t * t * t) * arcsec;

    let precessed = precess(radec, zeta, z, theta);
    nutate_single_term(precessed, t)
}

/// Rotate `radec` by the three precession angles (standard rigorous
/// rotation-matrix form, e.g. Meeus eq. 21.4).
fn precess(radec: RADec, zeta: f64, z: f64, theta: f64) -> RADec {
    let (sin_dec, cos_dec) = radec.dec.sin_cos();
    let (sin_ra_zeta, cos_ra_zeta) = (radec.ra + zeta).sin_cos();
    let (sin_theta, cos_theta) = theta.sin_cos();

    let a = cos_dec * sin_ra_zeta;
    let b = cos_theta * cos_dec * cos_ra_zeta - sin_theta * sin_dec;
    let c = sin_theta * cos_dec * cos_ra_zeta + cos_theta * sin_dec;

    let ra = a.atan2(b) + z;
    let dec = c.clamp(-1.0, 1.0).asin();

    RADec::new(crate::time::normalise_radians(ra), dec)
}

/// Shift right ascension and declination by the dominant (18.6-year)
/// nutation term only.
fn nutate_single_term(radec: RADec, t: f64) -> RADec {
    let arcsec = std::f64::consts::PI / (180.0 * 3600.0);
    // Mean longitude of the ascending node of the Moon (degrees), Meeus eq. 22.
    let omega_deg = 125.044_52 - 1934.136_261 * t;
    let omega = omega_deg.to_radians();
    let eps0 = (23.439_291 - 0.013_004_2 * t).to_radians();

    let dpsi = -17.20 * arcsec * omega.sin();
    let deps = 9.20 * arcsec * omega.cos();

    let d_ra = dpsi * (eps0.cos() + eps0.sin() * radec.ra.sin() * radec.dec.tan())
        - radec.ra.cos() * radec.dec.tan() * deps;
    let d_dec = dpsi * eps0.sin() * radec.ra.cos() + radec.ra.sin() * deps;

    RADec::new(
        crate::time::normalise_radians(radec.ra + d_ra),
        radec.dec + d_dec,
    )
}
