// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Geocentric (ECEF) and geodetic station positions.

/// WGS84 semi-major axis, metres.
const WGS84_A: f64 = 6_378_137.0;
/// WGS84 flattening.
const WGS84_F: f64 = 1.0 / 298.257_223_563;

/// A station position in Earth-centred, Earth-fixed Cartesian coordinates
/// (metres), as supplied by [`crate::catalog::StationDescriptor`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Geocentric {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Geodetic latitude/longitude/height, derived from [`Geocentric`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Geodetic {
    /// Geodetic latitude \[radians\]
    pub latitude: f64,
    /// Longitude \[radians\], east-positive
    pub longitude: f64,
    /// Height above the WGS84 ellipsoid \[metres\]
    pub height: f64,
}

impl Geocentric {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Convert to geodetic coordinates using Bowring's iterative method,
    /// which converges to sub-millimetre accuracy in a handful of
    /// iterations for any terrestrial station.
    pub fn to_geodetic(&self) -> Geodetic {
        let e2 = WGS84_F * (2.0 - WGS84_F);
        let p = (self.x * self.x + self.y * self.y).sqrt();
        let longitude = self.y.atan2(self.x);

        let mut lat = (self.z / (p * (1.0 - e2))).atan();
        for _ in 0..5 {
            let sin_lat = lat.sin();
            let n = WGS84_A / (1.0 - e2 * sin_lat * sin_lat).sqrt();
            lat = ((self.z + e2 * n * sin_lat) / p).atan();
        }
        let sin_lat = lat.sin();
        let n = WGS84_A / (1.0 - e2 * sin_lat * sin_lat).sqrt();
        let height = if lat.cos().abs() > 1e-12 {
            p / lat.cos() - n
        } else {
            self.z.abs() - n * (1.0 - e2)
        };

        Geodetic {
            latitude: lat,
            longitude,
            height,
        }
    }
}

impl Geodetic {
    /// Convert back to geocentric Cartesian coordinates.
    pub fn to_geocentric(&self) -> Geocentric {
        let e2 = WGS84_F * (2.0 - WGS84_F);
        let sin_lat = self.latitude.sin();
        let n = WGS84_A / (1.0 - e2 * sin_lat * sin_lat).sqrt();
        let x = (n + self.height) * self.latitude.cos() * self.longitude.cos();
        let y = (n + self.height) * self.latitude.cos() * self.longitude.sin();
        let z = (n * (1.0 - e2) + self.height) * sin_lat;
        Geocentric { x, y, z }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn roundtrip_geodetic_geocentric() {
        let geodetic = Geodetic {
            latitude: 48.2_f64.to_radians(),
            longitude: 16.3_f64.to_radians(),
            height: 250.0,
        };
        let geocentric = geodetic.to_geocentric();
        let back = geocentric.to_geodetic();
        assert_abs_diff_eq!(back.latitude, geodetic.latitude, epsilon = 1e-9);
        assert_abs_diff_eq!(back.longitude, geodetic.longitude, epsilon = 1e-9);
        assert_abs_diff_eq!(back.height, geodetic.height, epsilon = 1e-4);
    }

    #[test]
    fn equator_prime_meridian_is_on_x_axis() {
        let geodetic = Geodetic {
            latitude: 0.0,
            longitude: 0.0,
            height: 0.0,
        };
        let geocentric = geodetic.to_geocentric();
        assert_abs_diff_eq!(geocentric.x, WGS84_A, epsilon = 1e-6);
        assert_abs_diff_eq!(geocentric.y, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(geocentric.z, 0.0, epsilon = 1e-6);
    }
}
