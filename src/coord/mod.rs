// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Astronomical coordinate primitives (component C1): apparent equatorial
//! coordinates, hour-angle/declination, horizontal (az/el) coordinates,
//! geodetic/geocentric station positions, precession-nutation, and Sun
//! position.

pub mod azel;
pub mod geodetic;
pub mod hadec;
pub mod precession;
pub mod radec;
pub mod sun;

pub use azel::AzEl;
pub use geodetic::{Geocentric, Geodetic};
pub use hadec::HADec;
pub use radec::RADec;
