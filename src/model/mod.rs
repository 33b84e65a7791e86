// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The core data model (spec.md §3): Station, Source, Baseline,
//! PointingVector, Observation, Scan, Schedule, and the ParameterSetup
//! tree.
//!
//! Station, Source, and Scan live in flat arrays and refer to each other by
//! integer index, per spec.md §9's arena-plus-index design note: no object
//! owns another, so the planner can mutate one without a borrow-checker
//! fight against the others.

pub mod baseline;
pub mod observation;
pub mod pointing_vector;
pub mod scan;
pub mod schedule;
pub mod setup_tree;
pub mod source;
pub mod station;

pub use baseline::{Baseline, BaselineId};
pub use observation::Observation;
pub use pointing_vector::PointingVector;
pub use scan::{Scan, ScanTag};
pub use schedule::Schedule;
pub use source::{Source, SourceId};
pub use station::{Station, StationId};

/// Index of a [`Station`] in the schedule's flat station array.
pub type StationIndex = usize;
/// Index of a [`Source`] in the schedule's flat source array.
pub type SourceIndex = usize;
/// Index of a [`Scan`] in the schedule's flat scan array.
pub type ScanIndex = usize;
