// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Scan-duration solver (component C7): per-baseline SNR-based duration,
//! per spec.md §4.4.

use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum DurationError {
    #[error("computed scan duration exceeds the configured maximum")]
    InsufficientFlux,
    #[error("source cannot reach its minimum SNR on any baseline in this mode")]
    SnrUnreachable,
}

/// Per-band minimum-SNR requirement and source-flux sample for one
/// baseline, prepared by the candidate enumerator before calling
/// [`required_duration_seconds`].
#[derive(Clone, Copy, Debug)]
pub struct BaselineDurationInput {
    pub min_snr: f64,
    /// Band-specific source flux toward this baseline (Jy), already
    /// projected onto (u, v) by the caller.
    pub flux_jy: f64,
    pub observing_rate_hz: f64,
    pub digitisation_efficiency: f64,
    pub sefd_1_jy: f64,
    pub sefd_2_jy: f64,
}

/// Required integration time (seconds) for one baseline/band pair to
/// reach `min_snr`, per spec.md §4.4's tau(b,k) formula. Returns `None`
/// when `min_snr` is zero or the flux is non-positive (no constraint).
pub fn required_duration_seconds(input: &BaselineDurationInput) -> Option<f64> {
    if input.min_snr <= 0.0 || input.flux_jy <= 0.0 {
        return None;
    }
    let sefd_product = input.sefd_1_jy * input.sefd_2_jy;
    if sefd_product <= 0.0 || input.observing_rate_hz <= 0.0 {
        return None;
    }
    let inner = input.observing_rate_hz * input.flux_jy * input.flux_jy / sefd_product;
    if inner <= 0.0 {
        return None;
    }
    let sensitivity = input.digitisation_efficiency * inner.sqrt();
    if sensitivity <= 0.0 {
        return None;
    }
    let tau = input.min_snr / sensitivity;
    Some(tau * tau)
}

/// Elevation-corrected SEFD, applying the `1/sin(el)` correction of
/// spec.md §4.4.
pub fn elevation_corrected_sefd(sefd_jy: f64, elevation_rad: f64) -> f64 {
    let sin_el = elevation_rad.sin().max(1e-6);
    sefd_jy / sin_el
}

/// Combine the per-baseline/per-band required durations for one candidate
/// scan into its common observing duration, per spec.md §4.4: the
/// maximum tau over all baselines and bands, clipped to
/// `[min_scan, max_scan]`. `taus` holds one entry per (baseline, band)
/// pair that was constrained (i.e. [`required_duration_seconds`] returned
/// `Some`); pairs with `min_snr <= 0` or non-positive flux are omitted by
/// the caller before this is invoked.
///
/// Returns [`DurationError::InsufficientFlux`] if any tau exceeds
/// `max_scan_seconds`.
pub fn combine_scan_duration(
    taus: &[f64],
    min_scan_seconds: f64,
    max_scan_seconds: f64,
) -> Result<f64, DurationError> {
    let mut max_tau = min_scan_seconds;
    for &tau in taus {
        if tau > max_scan_seconds {
            return Err(DurationError::InsufficientFlux);
        }
        if tau > max_tau {
            max_tau = tau;
        }
    }
    Ok(max_tau.clamp(min_scan_seconds, max_scan_seconds))
}

/// Whether a station may stop its observation earlier than the scan's
/// common duration (station-specific early-stop), per spec.md §4.4's
/// tie-break note: permitted only when `force_same_duration` is false and
/// every one of the station's baselines has already crossed its SNR
/// threshold by `elapsed_seconds`.
pub fn station_may_stop_early(
    force_same_duration: bool,
    elapsed_seconds: f64,
    station_baseline_taus: &[f64],
) -> bool {
    if force_same_duration {
        return false;
    }
    station_baseline_taus
        .iter()
        .all(|&tau| elapsed_seconds >= tau)
}
