// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Statistics / summary output (ambient component A6): the per-schedule
//! "statistics line" and multi-schedule summary of spec.md §6, grounded
//! in `Misc/MultiScheduling.cpp`'s comma-separated per-build reporting
//! style.

use crate::model::schedule::Schedule;
use crate::multisched::ParameterVector;

/// One schedule's statistics line: the parameter vector that produced it
/// plus the figure-of-merit components, in the teacher's comma-separated
/// reporting style (spec.md §6).
#[derive(Clone, Debug)]
pub struct ScheduleStatistics {
    pub parameter_vector: ParameterVector,
    pub number_of_scans: usize,
    pub number_of_observations: usize,
    pub score: f64,
}

impl ScheduleStatistics {
    pub fn new(parameter_vector: ParameterVector, schedule: &Schedule, score: f64) -> Self {
        Self {
            parameter_vector,
            number_of_scans: schedule.scans.len(),
            number_of_observations: schedule.scans.iter().map(|s| s.observations.len()).sum(),
            score,
        }
    }

    /// Render as a single comma-separated line: every parameter-vector
    /// axis (in key order, since [`ParameterVector`] is a `BTreeMap`, so
    /// the column order is stable across lines) followed by the score
    /// components.
    pub fn to_csv_line(&self) -> String {
        let mut fields: Vec<String> = self
            .parameter_vector
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect();
        fields.push(format!("scans={}", self.number_of_scans));
        fields.push(format!("observations={}", self.number_of_observations));
        fields.push(format!("score={}", self.score));
        fields.join(",")
    }
}

/// Aggregates one [`ScheduleStatistics`] line per attempted build plus
/// the index of the winning attempt, per spec.md §6's "multi-schedule
/// summary".
#[derive(Clone, Debug, Default)]
pub struct MultiScheduleSummary {
    pub lines: Vec<ScheduleStatistics>,
}

impl MultiScheduleSummary {
    pub fn push(&mut self, stats: ScheduleStatistics) {
        self.lines.push(stats);
    }

    /// The index (into [`Self::lines`], not the original parameter-vector
    /// list) of the best-scoring attempt, if any were recorded.
    pub fn best_index(&self) -> Option<usize> {
        self.lines
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.score.partial_cmp(&b.1.score).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(i, _)| i)
    }

    /// Render the full summary: one statistics line per attempt, per
    /// spec.md §6.
    pub fn to_csv(&self) -> String {
        self.lines
            .iter()
            .map(ScheduleStatistics::to_csv_line)
            .collect::<Vec<_>>()
            .join("\n")
    }
}
