// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/// Horizontal coordinates: azimuth (from North, through East) and
/// elevation. All units are in radians.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AzEl {
    /// Azimuth \[radians\], `[0, 2*pi)`, measured from North through East.
    pub az: f64,
    /// Elevation \[radians\] above the horizon.
    pub el: f64,
}

impl AzEl {
    pub fn new(az: f64, el: f64) -> Self {
        Self { az, el }
    }

    pub fn new_degrees(az: f64, el: f64) -> Self {
        Self::new(az.to_radians(), el.to_radians())
    }

    /// Great-circle angular distance to another direction on the sky,
    /// treating az/el as a spherical coordinate pair.
    pub fn separation(&self, other: &Self) -> f64 {
        let (s1, c1) = self.el.sin_cos();
        let (s2, c2) = other.el.sin_cos();
        let d_az = self.az - other.az;
        let cos_d = (s1 * s2 + c1 * c2 * d_az.cos()).clamp(-1.0, 1.0);
        cos_d.acos()
    }
}
