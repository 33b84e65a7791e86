// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Pointing evaluator (component C6): (station, source, time) -> az/el/ha,
//! applying the mount (C2) and horizon mask (C3), per spec.md §4.3.

use hifitime::Epoch;
use thiserror::Error;

use crate::coord::{precession::j2000_to_apparent, sun::sun_radec, RADec};
use crate::model::pointing_vector::PointingVector;
use crate::model::station::Station;
use crate::model::{SourceIndex, StationIndex};
use crate::mount::{MountError, WrapPolicy};

#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum PointingError {
    #[error("source is below the station's minimum elevation or horizon mask")]
    BelowHorizon,
    #[error("source is within the minimum allowed distance of the Sun")]
    SunTooClose,
    #[error("source is below its own source-specific minimum elevation")]
    SourceSpecificElevation,
    #[error("no cable-wrap section can reach the target")]
    CableWrapUnreachable,
}

impl From<MountError> for PointingError {
    fn from(_: MountError) -> Self {
        PointingError::CableWrapUnreachable
    }
}

/// Session-wide pointing parameters that do not vary per station/source.
#[derive(Clone, Copy, Debug)]
pub struct PointingParams {
    pub min_sun_distance_rad: f64,
    pub wrap_policy: WrapPolicy,
}

/// Which pointing evaluation chain the candidate enumerator (C9) uses,
/// per spec.md §4.3/§9's rigorous/fast split.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointingMode {
    /// Full precession-nutation chain plus a live Sun check, recomputed
    /// at every candidate tick.
    Rigorous,
    /// A precomputed [`AzElGrid`], sampled every `tick_seconds` and
    /// interpolated per candidate tick; skips the live Sun check.
    Fast { tick_seconds: f64 },
}

/// Evaluate a station's pointing at a source and epoch, in "rigorous" mode:
/// the full precession-nutation + Earth-rotation chain plus a live Sun
/// check (spec.md §4.3).
pub fn evaluate_rigorous(
    station: &Station,
    station_index: StationIndex,
    source_index: SourceIndex,
    source_radec_j2000: RADec,
    source_min_elevation: Option<f64>,
    session_min_elevation: f64,
    epoch: Epoch,
    params: PointingParams,
) -> Result<PointingVector, PointingError> {
    let geodetic = station.position.to_geodetic();
    let apparent = j2000_to_apparent(source_radec_j2000, epoch);

    let sun = sun_radec(epoch);
    if apparent.separation(&sun) < params.min_sun_distance_rad {
        return Err(PointingError::SunTooClose);
    }

    let current_azel = station.state.current_pointing.map(|(azel, _)| azel);
    let current_wrap = station.state.current_pointing.map(|(_, wrap)| wrap);

    let slew = station.mount.solve_slew(
        current_azel,
        current_wrap,
        apparent,
        epoch,
        geodetic.longitude,
        geodetic.latitude,
        params.wrap_policy,
    )?;

    let min_el = source_min_elevation
        .unwrap_or(station.effective_min_elevation(session_min_elevation));
    if slew.azel.el < min_el {
        return Err(if source_min_elevation.is_some() {
            PointingError::SourceSpecificElevation
        } else {
            PointingError::BelowHorizon
        });
    }
    if !station.horizon_mask.visible(slew.azel.az, slew.azel.el) {
        return Err(PointingError::BelowHorizon);
    }

    Ok(PointingVector {
        station: station_index,
        source: source_index,
        epoch,
        azel: slew.azel,
        hadec: None,
        wrap_section: slew.wrap_section,
        unwrapped_axis1: slew.unwrapped_axis1,
    })
}

/// A precomputed per-station, per-source az/el grid sampled every
/// [`crate::constants::AZEL_GRID_TICK_SECONDS`], used by the candidate
/// enumerator (C9) in place of repeated trigonometric evaluation (spec.md
/// §9's "lazy az/el tables"). Rigorous recomputation only happens once a
/// candidate scan is accepted.
#[derive(Clone, Debug)]
pub struct AzElGrid {
    pub session_start: Epoch,
    pub tick_seconds: f64,
    /// One entry per tick, holding (az, el) in radians.
    pub samples: Vec<(f64, f64)>,
}

impl AzElGrid {
    pub fn build(
        station: &Station,
        source_radec_j2000: RADec,
        session_start: Epoch,
        session_end: Epoch,
        tick_seconds: f64,
    ) -> Self {
        let geodetic = station.position.to_geodetic();
        let apparent = j2000_to_apparent(source_radec_j2000, session_start);
        let span_seconds = (session_end - session_start).to_seconds();
        let n_ticks = (span_seconds / tick_seconds).ceil() as usize + 1;

        let mut samples = Vec::with_capacity(n_ticks);
        for i in 0..n_ticks {
            let t = session_start
                + hifitime::Duration::from_f64(i as f64 * tick_seconds, hifitime::Unit::Second);
            let lst = crate::time::lst_radians(t, geodetic.longitude);
            let hadec = apparent.to_hadec(lst);
            let azel = hadec.to_azel(geodetic.latitude);
            samples.push((azel.az, azel.el));
        }
        Self {
            session_start,
            tick_seconds,
            samples,
        }
    }

    /// Linearly interpolate the az/el at an arbitrary epoch within the
    /// session (fast mode, spec.md §4.3).
    pub fn interpolate(&self, epoch: Epoch) -> Option<(f64, f64)> {
        if self.samples.is_empty() {
            return None;
        }
        let offset = (epoch - self.session_start).to_seconds();
        if offset < 0.0 {
            return Some(self.samples[0]);
        }
        let idx = (offset / self.tick_seconds).floor() as usize;
        if idx + 1 >= self.samples.len() {
            return self.samples.last().copied();
        }
        let frac = (offset - idx as f64 * self.tick_seconds) / self.tick_seconds;
        let (az0, el0) = self.samples[idx];
        let (az1, el1) = self.samples[idx + 1];
        // Azimuth can wrap through 0/2pi; interpolate via the shorter arc.
        let mut d_az = az1 - az0;
        if d_az > crate::constants::PI {
            d_az -= crate::constants::TAU;
        } else if d_az < -crate::constants::PI {
            d_az += crate::constants::TAU;
        }
        let az = crate::time::normalise_radians(az0 + frac * d_az);
        let el = el0 + frac * (el1 - el0);
        Some((az, el))
    }
}

/// Evaluate a station's pointing at a source and epoch using a
/// precomputed `grid`, in "fast" mode (spec.md §4.3/§9): no live Sun
/// check, and the cable-wrap section is carried over from the station's
/// last committed pointing rather than re-derived, since the exact
/// section only matters once a scan is actually committed (at which
/// point `evaluate_rigorous` is used to re-derive it precisely).
pub fn evaluate_fast(
    station: &Station,
    station_index: StationIndex,
    source_index: SourceIndex,
    grid: &AzElGrid,
    source_min_elevation: Option<f64>,
    session_min_elevation: f64,
    epoch: Epoch,
) -> Result<PointingVector, PointingError> {
    let (az, el) = grid.interpolate(epoch).ok_or(PointingError::BelowHorizon)?;

    let min_el = source_min_elevation.unwrap_or(station.effective_min_elevation(session_min_elevation));
    if el < min_el {
        return Err(if source_min_elevation.is_some() {
            PointingError::SourceSpecificElevation
        } else {
            PointingError::BelowHorizon
        });
    }
    if !station.horizon_mask.visible(az, el) {
        return Err(PointingError::BelowHorizon);
    }

    let wrap_section = station
        .state
        .current_pointing
        .map(|(_, w)| w)
        .unwrap_or(crate::mount::CableWrapSection::Neutral);

    Ok(PointingVector {
        station: station_index,
        source: source_index,
        epoch,
        azel: crate::coord::AzEl::new(az, el),
        hadec: None,
        wrap_section,
        unwrapped_axis1: az,
    })
}
