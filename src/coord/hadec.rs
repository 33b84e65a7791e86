// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use super::azel::AzEl;
use super::radec::RADec;

/// Hour-angle / declination pair, in radians.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HADec {
    /// Hour angle \[radians\]
    pub ha: f64,
    /// Declination \[radians\]
    pub dec: f64,
}

impl HADec {
    pub fn new(ha: f64, dec: f64) -> Self {
        Self { ha, dec }
    }

    /// Convert to a [`RADec`] given a local sidereal time (radians).
    pub fn to_radec(&self, lst: f64) -> RADec {
        RADec::from_hadec(self, lst)
    }

    /// Convert to horizontal (az/el) coordinates given the station's
    /// geodetic latitude (radians).
    ///
    /// Standard spherical-astronomy transformation (Meeus, *Astronomical
    /// Algorithms*, eq. 13.5/13.6); azimuth is returned from North, through
    /// East, per VLBI convention (Meeus' own azimuth is from South).
    pub fn to_azel(&self, latitude_rad: f64) -> AzEl {
        let (sin_ha, cos_ha) = self.ha.sin_cos();
        let (sin_dec, cos_dec) = self.dec.sin_cos();
        let (sin_lat, cos_lat) = latitude_rad.sin_cos();

        let sin_el = sin_dec * sin_lat + cos_dec * cos_lat * cos_ha;
        let el = sin_el.clamp(-1.0, 1.0).asin();

        let az_from_south = sin_ha.atan2(cos_ha * sin_lat - (sin_dec / cos_dec) * cos_lat);
        let az = crate::time::normalise_radians(az_from_south + crate::constants::PI);

        AzEl { az, el }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn zenith_is_max_elevation() {
        // At latitude 45, hour angle 0, dec 45: object is at zenith.
        let lat = 45_f64.to_radians();
        let hadec = HADec::new(0.0, 45_f64.to_radians());
        let azel = hadec.to_azel(lat);
        assert_abs_diff_eq!(azel.el, crate::constants::FRAC_PI_2, epsilon = 1e-9);
    }

    #[test]
    fn equator_at_transit_culminates_at_complement_of_latitude() {
        let lat = 20_f64.to_radians();
        let hadec = HADec::new(0.0, 0.0);
        let azel = hadec.to_azel(lat);
        assert_abs_diff_eq!(
            azel.el,
            crate::constants::FRAC_PI_2 - lat,
            epsilon = 1e-9
        );
    }
}
