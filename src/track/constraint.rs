use serde::{Deserialize, Serialize};

use crate::sim::{Float3, Marble};

use super::spline::Spline;

/// Distance a body may exceed the allowed radius before it is clamped.
const CLAMP_SLACK: f32 = 1e-4;
/// Coarse samples either side of the previous hint that are searched first.
const HINT_WINDOW: usize = 8;
const REFINE_ITERATIONS: usize = 32;
const INV_PHI: f32 = 0.618_034;

/// How a body's curve parameter is estimated each step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressSearch {
    /// Coarse scan over samples, then golden-section refinement.
    #[default]
    Nearest,
    /// Invert height along a monotonically descending track.
    Height,
}

/// Result of a curve parameter search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Nearest {
    pub t: f32,
    pub point: Float3,
    pub distance: f32,
}

/// Keeps bodies within `radius` of a curve without any collision geometry.
#[derive(Debug, Clone)]
pub struct PipeConstraint {
    spline: Spline,
    radius: f32,
    bounce: f32,
    search: ProgressSearch,
    sample_ts: Vec<f32>,
    sample_points: Vec<Float3>,
    descending: bool,
}

impl PipeConstraint {
    pub fn new(spline: Spline, radius: f32, samples: usize) -> Self {
        let samples = samples.max(2);
        let sample_ts: Vec<f32> = (0..samples)
            .map(|i| i as f32 / (samples - 1) as f32)
            .collect();
        let sample_points: Vec<Float3> = sample_ts.iter().map(|&t| spline.point_at(t)).collect();
        let descending = sample_points.windows(2).all(|w| w[1].y < w[0].y);

        Self {
            spline,
            radius,
            bounce: 0.0,
            search: ProgressSearch::Nearest,
            sample_ts,
            sample_points,
            descending,
        }
    }

    /// Fraction of outward velocity re-added inward on contact.
    pub fn with_bounce(mut self, bounce: f32) -> Self {
        self.bounce = bounce.max(0.0).min(1.0);
        self
    }

    pub fn with_search(mut self, search: ProgressSearch) -> Self {
        if search == ProgressSearch::Height && !self.descending {
            log::warn!("height progress needs a strictly descending track; using nearest-point search");
        }
        self.search = search;
        self
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn spline(&self) -> &Spline {
        &self.spline
    }

    /// Estimates the curve parameter for `position` with the configured strategy.
    pub fn locate(&self, position: Float3, hint: Option<f32>) -> Nearest {
        match self.search {
            ProgressSearch::Height if self.descending => self.by_height(position),
            _ => self.nearest(position, hint),
        }
    }

    /// Nearest point on the curve to `position`.
    ///
    /// With a hint only the neighbouring samples are scanned, unless the best
    /// of those is outside the pipe, in which case every sample is scanned.
    pub fn nearest(&self, position: Float3, hint: Option<f32>) -> Nearest {
        let count = self.sample_points.len();
        let mut best = None;

        if let Some(hint) = hint {
            let center = (hint.clamp(0.0, 1.0) * (count - 1) as f32).round() as usize;
            let lo = center.saturating_sub(HINT_WINDOW);
            let hi = (center + HINT_WINDOW).min(count - 1);
            let (index, dist_sq) = self.closest_sample(position, lo, hi);
            if dist_sq <= self.radius * self.radius {
                best = Some(index);
            }
        }

        let index = best.unwrap_or_else(|| self.closest_sample(position, 0, count - 1).0);
        let lo = self.sample_ts[index.saturating_sub(1)];
        let hi = self.sample_ts[(index + 1).min(count - 1)];
        self.refine(position, lo, hi)
    }

    fn closest_sample(&self, position: Float3, lo: usize, hi: usize) -> (usize, f32) {
        let mut best = (lo, f32::MAX);
        for i in lo..=hi {
            let d = (self.sample_points[i] - position).magnitude_squared();
            if d < best.1 {
                best = (i, d);
            }
        }
        best
    }

    /// Golden-section search for the minimum distance on `[lo, hi]`.
    fn refine(&self, position: Float3, mut lo: f32, mut hi: f32) -> Nearest {
        let dist_sq = |t: f32| (self.spline.point_at(t) - position).magnitude_squared();

        let mut a = hi - (hi - lo) * INV_PHI;
        let mut b = lo + (hi - lo) * INV_PHI;
        let mut fa = dist_sq(a);
        let mut fb = dist_sq(b);
        for _ in 0..REFINE_ITERATIONS {
            if fa < fb {
                hi = b;
                b = a;
                fb = fa;
                a = hi - (hi - lo) * INV_PHI;
                fa = dist_sq(a);
            } else {
                lo = a;
                a = b;
                fa = fb;
                b = lo + (hi - lo) * INV_PHI;
                fb = dist_sq(b);
            }
        }

        let t = (lo + hi) * 0.5;
        let point = self.spline.point_at(t);
        Nearest {
            t,
            point,
            distance: point.distance(position),
        }
    }

    fn by_height(&self, position: Float3) -> Nearest {
        let points = &self.sample_points;
        let last = points.len() - 1;
        // First sample at or below the body.
        let upper = points.partition_point(|p| p.y > position.y);

        let t = if upper == 0 {
            0.0
        } else if upper > last {
            1.0
        } else {
            let (a, b) = (points[upper - 1], points[upper]);
            let frac = (a.y - position.y) / (a.y - b.y);
            let (ta, tb) = (self.sample_ts[upper - 1], self.sample_ts[upper]);
            ta + (tb - ta) * frac
        };

        let point = self.spline.point_at(t);
        Nearest {
            t,
            point,
            distance: point.distance(position),
        }
    }

    /// Pushes a body that strayed outside the pipe back onto the boundary.
    ///
    /// The outward velocity component is removed and `bounce` of it re-added
    /// inward. Returns whether the body was clamped. The located parameter is
    /// stored as the body's hint for the next step.
    pub fn enforce(&self, marble: &mut Marble) -> bool {
        let found = self.locate(marble.position, marble.progress_hint);
        marble.progress_hint = Some(found.t);

        let allowed = (self.radius - marble.radius).max(0.0);
        if found.distance <= allowed + CLAMP_SLACK {
            return false;
        }

        let outward = (marble.position - found.point) * (1.0 / found.distance);
        marble.position = found.point + outward * allowed;

        let vn = marble.velocity.dot(outward);
        if vn > 0.0 {
            marble.velocity -= outward * (vn * (1.0 + self.bounce));
        }
        log::trace!(
            "marble {} clamped at t={:.4} ({:.3} > {:.3})",
            marble.id,
            found.t,
            found.distance,
            allowed
        );
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn scenario_constraint() -> PipeConstraint {
        let spline = Spline::new(vec![
            Float3::new(0.0, 10.0, 0.0),
            Float3::new(0.0, 5.0, -10.0),
            Float3::new(0.0, 0.0, 0.0),
        ])
        .unwrap();
        PipeConstraint::new(spline, 3.0, 128)
    }

    #[test]
    fn nearest_finds_point_on_curve() {
        let constraint = scenario_constraint();
        let on_curve = constraint.spline().point_at(0.37);
        let found = constraint.nearest(on_curve, None);
        assert_relative_eq!(found.t, 0.37, epsilon = 1e-3);
        assert_relative_eq!(found.distance, 0.0, epsilon = 1e-3);
    }

    #[test]
    fn body_on_curve_is_never_clamped() {
        let constraint = scenario_constraint();
        for i in 0..=20 {
            let t = i as f32 / 20.0;
            let point = constraint.spline().point_at(t);
            let mut marble = Marble::new(0, point, 0.3).with_velocity(Float3::new(1.0, -2.0, 0.5));
            let before = marble.clone();
            assert!(!constraint.enforce(&mut marble));
            assert_eq!(marble.position, before.position);
            assert_eq!(marble.velocity, before.velocity);
        }
    }

    #[test]
    fn strayed_body_is_clamped_to_boundary() {
        let constraint = scenario_constraint();
        let center = constraint.spline().point_at(0.5);
        let start = center + Float3::new(2.9, 0.0, 0.0);
        let mut marble = Marble::new(1, start, 0.3).with_velocity(Float3::new(5.0, -3.0, 1.0));

        assert!(constraint.enforce(&mut marble));

        assert_relative_eq!(marble.position.distance(center), 2.7, epsilon = 1e-3);
        assert_relative_eq!(marble.position.x, 2.7, epsilon = 1e-3);
        // Outward (+x) component is gone, the rest untouched.
        assert_relative_eq!(marble.velocity.x, 0.0, epsilon = 1e-3);
        assert_relative_eq!(marble.velocity.y, -3.0, epsilon = 1e-3);
        assert_relative_eq!(marble.velocity.z, 1.0, epsilon = 1e-3);
    }

    #[test]
    fn clamping_is_idempotent() {
        let constraint = scenario_constraint();
        let center = constraint.spline().point_at(0.3);
        let mut marble = Marble::new(2, center + Float3::new(-4.0, 0.0, 0.0), 0.3)
            .with_velocity(Float3::new(-2.0, 0.0, 0.0));

        assert!(constraint.enforce(&mut marble));
        let once = marble.clone();
        assert!(!constraint.enforce(&mut marble));
        assert_eq!(marble.position, once.position);
        assert_eq!(marble.velocity, once.velocity);
    }

    #[test]
    fn inward_motion_is_kept() {
        let constraint = scenario_constraint();
        let center = constraint.spline().point_at(0.6);
        let mut marble = Marble::new(3, center + Float3::new(3.5, 0.0, 0.0), 0.3)
            .with_velocity(Float3::new(-1.0, 0.0, 0.0));

        assert!(constraint.enforce(&mut marble));
        assert_relative_eq!(marble.velocity.x, -1.0, epsilon = 1e-5);
    }

    #[test]
    fn bounce_reflects_a_fraction_inward() {
        let constraint = scenario_constraint().with_bounce(0.5);
        let center = constraint.spline().point_at(0.5);
        let mut marble = Marble::new(4, center + Float3::new(3.0, 0.0, 0.0), 0.3)
            .with_velocity(Float3::new(4.0, 0.0, 0.0));

        constraint.enforce(&mut marble);
        assert_relative_eq!(marble.velocity.x, -2.0, epsilon = 1e-3);
    }

    #[test]
    fn enforce_records_progress_hint() {
        let constraint = scenario_constraint();
        let point = constraint.spline().point_at(0.8);
        let mut marble = Marble::new(5, point, 0.3);
        constraint.enforce(&mut marble);
        assert_relative_eq!(marble.progress_hint.unwrap(), 0.8, epsilon = 1e-3);
    }

    #[test]
    fn hinted_search_agrees_with_full_search() {
        let constraint = scenario_constraint();
        let position = constraint.spline().point_at(0.42) + Float3::new(1.0, 0.0, 0.0);
        let full = constraint.nearest(position, None);
        let hinted = constraint.nearest(position, Some(0.4));
        assert_relative_eq!(full.t, hinted.t, epsilon = 1e-3);
    }

    #[test]
    fn stale_hint_falls_back_to_full_scan() {
        let constraint = scenario_constraint();
        let position = constraint.spline().point_at(0.9);
        let found = constraint.nearest(position, Some(0.1));
        assert_relative_eq!(found.t, 0.9, epsilon = 1e-3);
    }

    #[test]
    fn height_search_inverts_descending_track() {
        let constraint = scenario_constraint().with_search(ProgressSearch::Height);
        let target = constraint.spline().point_at(0.25);
        let found = constraint.locate(target, None);
        assert_relative_eq!(found.t, 0.25, epsilon = 1e-2);
    }

    #[test]
    fn height_search_falls_back_when_track_climbs() {
        let spline = Spline::new(vec![
            Float3::new(0.0, 0.0, 0.0),
            Float3::new(0.0, 5.0, -10.0),
            Float3::new(0.0, 0.0, -20.0),
        ])
        .unwrap();
        let constraint =
            PipeConstraint::new(spline, 2.0, 64).with_search(ProgressSearch::Height);
        let target = constraint.spline().point_at(0.75);
        let found = constraint.locate(target, None);
        assert_relative_eq!(found.t, 0.75, epsilon = 1e-3);
    }
}
