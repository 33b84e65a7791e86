// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Sky-coverage tracker (component C8): per-area rolling record of
//! recently observed sky directions, producing a novelty score, per
//! spec.md §4.5.

use hifitime::Epoch;

use crate::coord::AzEl;

/// Selectable falloff shapes for the novelty penalty, per spec.md §4.5:
/// each goes from 1 at zero separation/elapsed-time to 0 at the
/// configured influence distance/interval.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
pub enum FalloffShape {
    Linear,
    Cosine,
    Constant,
}

impl FalloffShape {
    /// Evaluate the falloff at `x` given the influence scale
    /// (distance or interval); `x` and `scale` must share units.
    fn evaluate(&self, x: f64, scale: f64) -> f64 {
        if scale <= 0.0 {
            return if x <= 0.0 { 1.0 } else { 0.0 };
        }
        let frac = (x / scale).clamp(0.0, 1.0);
        match self {
            FalloffShape::Linear => 1.0 - frac,
            FalloffShape::Cosine => 0.5 * (1.0 + (std::f64::consts::PI * frac).cos()),
            FalloffShape::Constant => {
                if x < scale {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}

/// One recorded pointing kept by a sky-coverage area.
#[derive(Clone, Copy, Debug)]
struct RecentPointing {
    azel: AzEl,
    epoch: Epoch,
}

/// A sky-coverage area: one or more stations (twin telescopes within a
/// configurable distance share an area, spec.md §4.5) sharing one rolling
/// record of recent pointings.
#[derive(Clone, Debug)]
pub struct SkyCoverageArea {
    pub influence_distance_rad: f64,
    pub influence_interval: hifitime::Duration,
    pub distance_falloff: FalloffShape,
    pub time_falloff: FalloffShape,
    recent: Vec<RecentPointing>,
}

impl SkyCoverageArea {
    pub fn new(
        influence_distance_rad: f64,
        influence_interval: hifitime::Duration,
        distance_falloff: FalloffShape,
        time_falloff: FalloffShape,
    ) -> Self {
        Self {
            influence_distance_rad,
            influence_interval,
            distance_falloff,
            time_falloff,
            recent: Vec::new(),
        }
    }

    /// Drop recorded pointings older than `influence_interval` relative
    /// to `now`.
    fn prune(&mut self, now: Epoch) {
        let interval = self.influence_interval;
        self.recent
            .retain(|p| now >= p.epoch && (now - p.epoch) <= interval);
    }

    /// Record a new pointing at `azel`/`now`, pruning stale entries.
    pub fn record(&mut self, azel: AzEl, now: Epoch) {
        self.prune(now);
        self.recent.push(RecentPointing { azel, epoch: now });
    }

    /// Novelty score (spec.md §4.5) of a candidate direction `d` at time
    /// `t`: `1 - max over kept points p of f_dist(angle) * f_time(elapsed)`.
    /// Score is in `[0, 1]`.
    pub fn novelty(&self, d: AzEl, t: Epoch) -> f64 {
        let mut max_penalty = 0.0_f64;
        for p in &self.recent {
            if t < p.epoch {
                continue;
            }
            let elapsed = (t - p.epoch).to_seconds();
            let interval = self.influence_interval.to_seconds();
            let angle = d.separation(&p.azel);
            let penalty = self.distance_falloff.evaluate(angle, self.influence_distance_rad)
                * self.time_falloff.evaluate(elapsed, interval);
            if penalty > max_penalty {
                max_penalty = penalty;
            }
        }
        (1.0 - max_penalty).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn interval(seconds: f64) -> hifitime::Duration {
        hifitime::Duration::from_f64(seconds, hifitime::Unit::Second)
    }

    #[test]
    fn novelty_is_one_with_no_history() {
        let area = SkyCoverageArea::new(
            10_f64.to_radians(),
            interval(3600.0),
            FalloffShape::Linear,
            FalloffShape::Linear,
        );
        let t = Epoch::from_gregorian_utc_at_midnight(2020, 1, 1);
        assert_abs_diff_eq!(area.novelty(AzEl::new(0.0, 0.0), t), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn novelty_drops_right_after_observing_same_direction() {
        let mut area = SkyCoverageArea::new(
            10_f64.to_radians(),
            interval(3600.0),
            FalloffShape::Linear,
            FalloffShape::Linear,
        );
        let t0 = Epoch::from_gregorian_utc_at_midnight(2020, 1, 1);
        let d = AzEl::new_degrees(45.0, 30.0);
        area.record(d, t0);
        assert_abs_diff_eq!(area.novelty(d, t0), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn novelty_recovers_over_time() {
        let mut area = SkyCoverageArea::new(
            10_f64.to_radians(),
            interval(3600.0),
            FalloffShape::Linear,
            FalloffShape::Linear,
        );
        let t0 = Epoch::from_gregorian_utc_at_midnight(2020, 1, 1);
        let d = AzEl::new_degrees(45.0, 30.0);
        area.record(d, t0);
        let later = t0 + interval(3600.0);
        assert!(area.novelty(d, later) > area.novelty(d, t0));
    }

    #[test]
    fn novelty_is_high_for_far_direction() {
        let mut area = SkyCoverageArea::new(
            10_f64.to_radians(),
            interval(3600.0),
            FalloffShape::Linear,
            FalloffShape::Linear,
        );
        let t0 = Epoch::from_gregorian_utc_at_midnight(2020, 1, 1);
        area.record(AzEl::new_degrees(0.0, 30.0), t0);
        let far = AzEl::new_degrees(180.0, 30.0);
        assert_abs_diff_eq!(area.novelty(far, t0), 1.0, epsilon = 1e-9);
    }
}
