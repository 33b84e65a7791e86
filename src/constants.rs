// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Useful constants.

All constants *must* be double precision. The scheduler should do as many
calculations as possible in double precision before converting to a lower
precision, if it is ever required.
 */

pub use std::f64::consts::{FRAC_PI_2, PI, TAU};

/// Seconds in a mean sidereal day.
pub const SECONDS_PER_SIDEREAL_DAY: f64 = 86164.090_530_832_88;

/// Seconds in a solar day.
pub const SECONDS_PER_DAY: f64 = 86400.0;

/// MJD of the J2000.0 epoch.
pub const MJD_J2000: f64 = 51544.5;

/// Julian days per Julian century.
pub const DAYS_PER_JULIAN_CENTURY: f64 = 36525.0;

/// Default minimum angular distance (radians) a source must be from the Sun
/// to be observable. 15 degrees is a typical VLBI geodetic default.
pub const DEFAULT_MIN_SUN_DISTANCE: f64 = 15.0 * PI / 180.0;

/// Default minimum elevation (radians) below which no station may observe.
pub const DEFAULT_MIN_ELEVATION: f64 = 5.0 * PI / 180.0;

/// Default digitisation efficiency used by the scan-duration solver when an
/// observing mode does not override it.
pub const DEFAULT_DIGITISATION_EFFICIENCY: f64 = 0.98;

/// Default maximum number of clock advances the greedy planner will attempt
/// before declaring `NoFeasibleScan` fatal.
pub const DEFAULT_MAX_CLOCK_ADVANCES: usize = 10_000;

/// Tick used to build the lazy az/el lookup tables (seconds), per spec.md §9.
pub const AZEL_GRID_TICK_SECONDS: f64 = 60.0;
