// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Subnetting solver (component C11): splits a pair of candidates whose
//! sources are far enough apart on the sky into disjoint-station scans
//! observed simultaneously, per spec.md §4.8.

use crate::candidate::Candidate;
use crate::model::StationIndex;

/// A scored candidate plus its computed sub-score, as produced by C10 and
/// consumed here.
#[derive(Clone, Debug)]
pub struct ScoredCandidate {
    pub candidate: Candidate,
    pub score: f64,
}

/// An admissible subnetting pair: two disjoint-station sub-scans and
/// their combined, rescaled score.
#[derive(Clone, Debug)]
pub struct SubnettingPair {
    pub first: ScoredCandidate,
    pub second: ScoredCandidate,
    pub combined_score: f64,
}

/// Find the best admissible subnetting pair among `candidates`, per
/// spec.md §4.8. `angular_separation` gives the sky separation (radians)
/// between two candidates' sources; `min_stations` is the per-source
/// minimum station-count requirement.
pub fn best_subnetting_pair(
    candidates: &[ScoredCandidate],
    angular_separation: impl Fn(&Candidate, &Candidate) -> f64,
    min_angle_rad: f64,
    min_stations: usize,
    min_participating_stations: usize,
    network_size: usize,
) -> Option<SubnettingPair> {
    let mut best: Option<SubnettingPair> = None;

    for i in 0..candidates.len() {
        for j in (i + 1)..candidates.len() {
            let a = &candidates[i];
            let b = &candidates[j];
            if angular_separation(&a.candidate, &b.candidate) < min_angle_rad {
                continue;
            }

            let a_stations: Vec<StationIndex> =
                a.candidate.pointings.iter().map(|pv| pv.station).collect();
            let b_stations: Vec<StationIndex> = b
                .candidate
                .pointings
                .iter()
                .map(|pv| pv.station)
                .filter(|s| !a_stations.contains(s))
                .collect();

            if a_stations.len() < min_stations || b_stations.len() < min_stations {
                continue;
            }
            let total_participating = a_stations.len() + b_stations.len();
            if total_participating < min_participating_stations {
                continue;
            }

            let a_share = a_stations.len() as f64 / network_size.max(1) as f64;
            let b_share = b_stations.len() as f64 / network_size.max(1) as f64;
            let combined_score = a.score * a_share + b.score * b_share;

            let candidate_a = Candidate {
                source: a.candidate.source,
                observing_start: a.candidate.observing_start,
                pointings: a
                    .candidate
                    .pointings
                    .iter()
                    .filter(|pv| a_stations.contains(&pv.station))
                    .copied()
                    .collect(),
            };
            let candidate_b = Candidate {
                source: b.candidate.source,
                observing_start: b.candidate.observing_start,
                pointings: b
                    .candidate
                    .pointings
                    .iter()
                    .filter(|pv| b_stations.contains(&pv.station))
                    .copied()
                    .collect(),
            };

            let pair = SubnettingPair {
                first: ScoredCandidate {
                    candidate: candidate_a,
                    score: a.score * a_share,
                },
                second: ScoredCandidate {
                    candidate: candidate_b,
                    score: b.score * b_share,
                },
                combined_score,
            };

            if best.as_ref().map(|p| combined_score > p.combined_score).unwrap_or(true) {
                best = Some(pair);
            }
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use hifitime::Epoch;

    fn candidate(source: usize, stations: &[StationIndex]) -> Candidate {
        let epoch = Epoch::from_gregorian_utc_at_midnight(2020, 1, 1);
        Candidate {
            source,
            observing_start: epoch,
            pointings: stations
                .iter()
                .map(|&s| crate::model::pointing_vector::PointingVector {
                    station: s,
                    source,
                    epoch,
                    azel: crate::coord::AzEl::new(0.0, 0.5),
                    hadec: None,
                    wrap_section: crate::mount::CableWrapSection::Neutral,
                    unwrapped_axis1: 0.0,
                })
                .collect(),
        }
    }

    #[test]
    fn no_pair_admissible_when_angle_too_small() {
        let candidates = vec![
            ScoredCandidate {
                candidate: candidate(0, &[0, 1, 2]),
                score: 0.8,
            },
            ScoredCandidate {
                candidate: candidate(1, &[3, 4, 5]),
                score: 0.7,
            },
        ];
        let result = best_subnetting_pair(
            &candidates,
            |_, _| 10_f64.to_radians(),
            30_f64.to_radians(),
            2,
            4,
            6,
        );
        assert!(result.is_none());
    }

    #[test]
    fn disjoint_stations_form_admissible_pair() {
        let candidates = vec![
            ScoredCandidate {
                candidate: candidate(0, &[0, 1, 2]),
                score: 0.8,
            },
            ScoredCandidate {
                candidate: candidate(1, &[3, 4, 5]),
                score: 0.7,
            },
        ];
        let result = best_subnetting_pair(
            &candidates,
            |_, _| 90_f64.to_radians(),
            30_f64.to_radians(),
            2,
            4,
            6,
        );
        assert!(result.is_some());
        let pair = result.unwrap();
        assert_eq!(pair.first.candidate.pointings.len(), 3);
        assert_eq!(pair.second.candidate.pointings.len(), 3);
    }
}
