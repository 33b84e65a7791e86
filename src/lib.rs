// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! An offline batch scheduler for Very Long Baseline Interferometry
//! (VLBI) geodetic/astrometric sessions.
//!
//! Given a fixed time window, a fixed set of radio telescopes, and a
//! fixed catalog of candidate radio sources, [`planner::build_schedule`]
//! produces an ordered list of scans that maximises a user-tunable
//! objective (component C10, [`scorer`]) while respecting per-station
//! mechanical, electrical, and operational constraints (components
//! C1-C6, [`coord`]/[`mount`]/[`horizon`]/[`pointing`]). [`multisched`]
//! runs the planner many times over a parameter-vector space and
//! [`quality`] scores the resulting schedules to keep the best.
//!
//! See `SPEC_FULL.md` for the full component inventory and data model.

pub mod candidate;
pub mod catalog;
pub mod config;
pub(crate) mod constants;
pub mod coord;
pub mod duration;
pub mod error;
pub mod fillin;
pub mod flux;
pub mod horizon;
pub mod logging;
pub mod model;
pub mod mount;
pub mod multisched;
pub mod obsmode;
pub mod planner;
pub mod pointing;
pub mod quality;
pub mod rules;
pub mod scorer;
pub mod skycoverage;
pub mod stats;
pub mod subnetting;
#[cfg(test)]
pub(crate) mod tests_support;
pub mod time;

// Re-exports.
pub use error::SchedulerError;
pub use model::schedule::Schedule;
