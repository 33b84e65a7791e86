// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Error type for all scheduler-related errors. This should be the
//! *only* error enum that is publicly visible.

use thiserror::Error;

use crate::duration::DurationError;
use crate::model::setup_tree::SetupTreeError;
use crate::mount::MountError;
use crate::pointing::PointingError;

/// The *only* publicly visible error from this crate. Variants are
/// classified fatal/local per spec.md §7: `Configuration`,
/// `CatalogInconsistency`, and `NoFeasibleScan` abort the whole build;
/// the rest are only ever logged and counted inside the planner (C13)
/// and never escape it.
#[derive(Error, Debug)]
pub enum SchedulerError {
    /// A parameter group or setup tree node references an unknown member,
    /// two siblings overlap in both time and member set, or a required
    /// parameter is missing. Fatal.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A station's mount type is unrecognised, a band is referenced in a
    /// mode but absent from the catalog, or a source required by the
    /// setup tree is not in the source catalog. Fatal.
    #[error("catalog inconsistency: {0}")]
    CatalogInconsistency(String),

    /// A source is below the horizon, behind the mask, or too close to
    /// the Sun. Local: the offending station or candidate is dropped.
    #[error("geometry not visible: {0}")]
    GeometryNotVisible(String),

    /// No cable-wrap section reaches the target within its axis limits.
    /// Local: the offending station is dropped.
    #[error("cable-wrap unreachable: {0}")]
    CableWrapUnreachable(String),

    /// The computed scan duration exceeds the configured maximum. Local:
    /// the offending source is dropped for this candidate round.
    #[error("insufficient flux: {0}")]
    InsufficientFlux(String),

    /// A source/mode combination cannot reach its minimum SNR on any
    /// baseline. The source is marked unschedulable for this build.
    #[error("SNR unreachable: {0}")]
    SnrUnreachable(String),

    /// No candidate was found at the current clock after exhausting the
    /// configured number of clock advances. Recoverable while advances
    /// remain; fatal once exhausted.
    #[error("no feasible scan found: {0}")]
    NoFeasibleScan(String),

    /// A generic error that can't be clarified further, e.g. I/O or TOML
    /// parsing failures.
    #[error("{0}")]
    Generic(String),
}

impl From<SetupTreeError> for SchedulerError {
    fn from(e: SetupTreeError) -> Self {
        Self::Configuration(e.to_string())
    }
}

impl From<MountError> for SchedulerError {
    fn from(e: MountError) -> Self {
        match e {
            MountError::NotVisible => Self::CableWrapUnreachable(e.to_string()),
        }
    }
}

impl From<PointingError> for SchedulerError {
    fn from(e: PointingError) -> Self {
        Self::GeometryNotVisible(e.to_string())
    }
}

impl From<DurationError> for SchedulerError {
    fn from(e: DurationError) -> Self {
        match e {
            DurationError::InsufficientFlux => Self::InsufficientFlux(e.to_string()),
            DurationError::SnrUnreachable => Self::SnrUnreachable(e.to_string()),
        }
    }
}

impl From<std::io::Error> for SchedulerError {
    fn from(e: std::io::Error) -> Self {
        Self::Generic(e.to_string())
    }
}

impl From<toml::de::Error> for SchedulerError {
    fn from(e: toml::de::Error) -> Self {
        Self::Configuration(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mount_error_classified_as_cable_wrap_unreachable() {
        let err: SchedulerError = MountError::NotVisible.into();
        assert!(matches!(err, SchedulerError::CableWrapUnreachable(_)));
    }

    #[test]
    fn duration_error_variants_classify_distinctly() {
        let insufficient: SchedulerError = DurationError::InsufficientFlux.into();
        let unreachable: SchedulerError = DurationError::SnrUnreachable.into();
        assert!(matches!(insufficient, SchedulerError::InsufficientFlux(_)));
        assert!(matches!(unreachable, SchedulerError::SnrUnreachable(_)));
    }
}
