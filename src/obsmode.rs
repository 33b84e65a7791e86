// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Observing-mode table (component C4): per-baseline, per-band data rate
//! and SNR-equivalent bandwidth (spec.md §4.4/§6). The data-rate
//! calculation itself is out of scope (consumed as a lookup); this module
//! owns the table's shape and a small built-in default.

use std::collections::HashMap;

use crate::constants::DEFAULT_DIGITISATION_EFFICIENCY;

/// One recorded band within an observing mode (spec.md §6's
/// `ModeDescriptor`).
#[derive(Clone, Debug)]
pub struct BandMode {
    pub name: String,
    pub centre_frequency_hz: f64,
    pub bandwidth_hz: f64,
}

/// A full observing mode: sample rate, per-channel bit depth, and bands
/// (spec.md §6).
#[derive(Clone, Debug)]
pub struct ModeDescriptor {
    pub name: String,
    pub sample_rate_msps: f64,
    pub bit_depth: u8,
    pub bands: Vec<BandMode>,
    /// Digitisation efficiency (spec.md §4.4's eta); defaults to
    /// [`DEFAULT_DIGITISATION_EFFICIENCY`] when not given explicitly.
    pub digitisation_efficiency: Option<f64>,
}

impl ModeDescriptor {
    pub fn efficiency(&self) -> f64 {
        self.digitisation_efficiency
            .unwrap_or(DEFAULT_DIGITISATION_EFFICIENCY)
    }

    pub fn band(&self, name: &str) -> Option<&BandMode> {
        self.bands.iter().find(|b| b.name == name)
    }

    /// The observing rate for `band`, in Hz, i.e. `Delta nu(k)` of spec.md
    /// §4.4: twice the recorded bandwidth times the number of bits sampled
    /// per Nyquist sample (a standard VLBI data-rate convention).
    pub fn observing_rate_hz(&self, band: &str) -> Option<f64> {
        self.band(band)
            .map(|b| 2.0 * b.bandwidth_hz * self.bit_depth as f64)
    }
}

/// The observing-mode catalog (spec.md §6's `getObservingMode`).
#[derive(Clone, Debug, Default)]
pub struct ObservingModeTable {
    modes: HashMap<String, ModeDescriptor>,
}

impl ObservingModeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, mode: ModeDescriptor) {
        self.modes.insert(mode.name.clone(), mode);
    }

    pub fn get(&self, name: &str) -> Option<&ModeDescriptor> {
        self.modes.get(name)
    }

    /// A small built-in default mode (8 Gbps-class dual-band geodetic VLBI
    /// setup: S/X band), used when no override table is supplied.
    pub fn default_geodetic() -> Self {
        let mut table = Self::new();
        table.insert(ModeDescriptor {
            name: "geodetic-sx".to_string(),
            sample_rate_msps: 32.0,
            bit_depth: 2,
            bands: vec![
                BandMode {
                    name: "S".to_string(),
                    centre_frequency_hz: 2.3e9,
                    bandwidth_hz: 32e6,
                },
                BandMode {
                    name: "X".to_string(),
                    centre_frequency_hz: 8.4e9,
                    bandwidth_hz: 32e6,
                },
            ],
            digitisation_efficiency: None,
        });
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_geodetic_has_s_and_x_bands() {
        let table = ObservingModeTable::default_geodetic();
        let mode = table.get("geodetic-sx").unwrap();
        assert!(mode.band("S").is_some());
        assert!(mode.band("X").is_some());
        assert!(mode.observing_rate_hz("S").unwrap() > 0.0);
    }

    #[test]
    fn unknown_band_is_none() {
        let table = ObservingModeTable::default_geodetic();
        let mode = table.get("geodetic-sx").unwrap();
        assert!(mode.band("K").is_none());
    }
}
