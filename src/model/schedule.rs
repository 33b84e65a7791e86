// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use hifitime::Epoch;

use crate::model::{scan::Scan, source::Source, station::Station};

/// The sequence of committed scans in strict observing-start order,
/// together with the final mutable station/source state at session end
/// (spec.md §3).
#[derive(Clone, Debug)]
pub struct Schedule {
    pub session_start: Epoch,
    pub session_end: Epoch,
    pub stations: Vec<Station>,
    pub sources: Vec<Source>,
    pub scans: Vec<Scan>,
    /// The scalar figure of merit, filled in by C16 after the build
    /// completes.
    pub score: Option<f64>,
}

impl Schedule {
    pub fn new(session_start: Epoch, session_end: Epoch, stations: Vec<Station>, sources: Vec<Source>) -> Self {
        Self {
            session_start,
            session_end,
            stations,
            sources,
            scans: Vec::new(),
            score: None,
        }
    }

    /// Append a committed scan, maintaining the strict observing-start
    /// ordering invariant of spec.md §3 ("appended monotonically").
    pub fn commit_scan(&mut self, scan: Scan) {
        debug_assert!(
            self.scans
                .last()
                .and_then(Scan::observing_start)
                .zip(scan.observing_start())
                .map(|(prev, new)| prev <= new)
                .unwrap_or(true),
            "scans must commit in non-decreasing observing-start order"
        );
        self.scans.push(scan);
    }

    /// Insert a fill-in scan at `index` without disturbing the relative
    /// order of already-committed scans (spec.md §3: "inserts but never
    /// reorders committed scans' times").
    pub fn insert_fillin(&mut self, index: usize, scan: Scan) {
        self.scans.insert(index.min(self.scans.len()), scan);
    }

    pub fn total_observing_seconds(&self, station: usize) -> f64 {
        self.scans
            .iter()
            .filter_map(|s| s.station_time(station))
            .map(|t| (t.observing_end - t.observing_start).to_seconds())
            .sum()
    }

    pub fn number_of_scans_for_station(&self, station: usize) -> usize {
        self.scans
            .iter()
            .filter(|s| s.stations().any(|st| st == station))
            .count()
    }
}
