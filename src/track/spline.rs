use crate::sim::{Float3, Frame};

use super::error::TrackError;

/// Arc-length table resolution, per control-point segment.
const DIVISIONS_PER_SEGMENT: usize = 64;

/// Knot spacing below this is treated as coincident.
const MIN_KNOT_SPACING: f32 = 1e-4;

/// A resampled point along the spline with its orientation frame.
/// C-compatible layout for FFI.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SplinePoint {
    pub arc: f32,
    pub t: f32,
    pub position: Float3,
    pub frame: Frame,
    /// Bank angle applied to `frame`, in radians.
    pub bank: f32,
}

impl SplinePoint {
    pub const fn new(arc: f32, t: f32, position: Float3, frame: Frame, bank: f32) -> Self {
        Self {
            arc,
            t,
            position,
            frame,
            bank,
        }
    }

    pub const DEFAULT: Self = Self::new(0.0, 0.0, Float3::ZERO, Frame::DEFAULT, 0.0);
}

impl Default for SplinePoint {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Cubic coefficients of one Catmull-Rom segment: `c0 + c1 w + c2 w^2 + c3 w^3`.
#[derive(Debug, Clone, Copy)]
struct Cubic {
    c0: Float3,
    c1: Float3,
    c2: Float3,
    c3: Float3,
}

impl Cubic {
    /// Centripetal (alpha = 0.5) segment from `p1` to `p2`.
    fn centripetal(p0: Float3, p1: Float3, p2: Float3, p3: Float3) -> Self {
        let mut dt0 = p0.distance(p1).sqrt();
        let mut dt1 = p1.distance(p2).sqrt();
        let mut dt2 = p2.distance(p3).sqrt();

        if dt1 < MIN_KNOT_SPACING {
            dt1 = 1.0;
        }
        if dt0 < MIN_KNOT_SPACING {
            dt0 = dt1;
        }
        if dt2 < MIN_KNOT_SPACING {
            dt2 = dt1;
        }

        let m1 = ((p1 - p0) * (1.0 / dt0) - (p2 - p0) * (1.0 / (dt0 + dt1))
            + (p2 - p1) * (1.0 / dt1))
            * dt1;
        let m2 = ((p2 - p1) * (1.0 / dt1) - (p3 - p1) * (1.0 / (dt1 + dt2))
            + (p3 - p2) * (1.0 / dt2))
            * dt1;

        Self {
            c0: p1,
            c1: m1,
            c2: p1 * -3.0 + p2 * 3.0 - m1 * 2.0 - m2,
            c3: p1 * 2.0 - p2 * 2.0 + m1 + m2,
        }
    }

    fn point(&self, w: f32) -> Float3 {
        self.c0 + self.c1 * w + self.c2 * (w * w) + self.c3 * (w * w * w)
    }

    fn derivative(&self, w: f32) -> Float3 {
        self.c1 + self.c2 * (2.0 * w) + self.c3 * (3.0 * w * w)
    }
}

/// Centripetal Catmull-Rom curve through a control polyline.
///
/// The public parameter `t` is arc-length normalized: `t = 0.5` is halfway
/// along the curve by distance, not by control point index.
#[derive(Debug, Clone)]
pub struct Spline {
    control_points: Vec<Float3>,
    segments: Vec<Cubic>,
    /// Cumulative arc length at raw parameter `i / divisions`.
    arc_lengths: Vec<f32>,
}

impl Spline {
    pub fn new(control_points: Vec<Float3>) -> Result<Self, TrackError> {
        if control_points.len() < 2 {
            return Err(TrackError::TooFewPoints {
                found: control_points.len(),
            });
        }
        if let Some(index) = control_points.iter().position(|p| !p.is_finite()) {
            return Err(TrackError::NonFinitePoint { index });
        }

        let n = control_points.len();
        let segments: Vec<Cubic> = (0..n - 1)
            .map(|i| {
                let p1 = control_points[i];
                let p2 = control_points[i + 1];
                let p0 = if i > 0 {
                    control_points[i - 1]
                } else {
                    p1 * 2.0 - p2
                };
                let p3 = if i + 2 < n {
                    control_points[i + 2]
                } else {
                    p2 * 2.0 - p1
                };
                Cubic::centripetal(p0, p1, p2, p3)
            })
            .collect();

        let mut spline = Self {
            control_points,
            segments,
            arc_lengths: Vec::new(),
        };
        spline.arc_lengths = spline.build_arc_table();

        if spline.length() <= f32::EPSILON {
            return Err(TrackError::DegenerateCurve);
        }
        Ok(spline)
    }

    fn build_arc_table(&self) -> Vec<f32> {
        let divisions = self.segments.len() * DIVISIONS_PER_SEGMENT;
        let mut table = Vec::with_capacity(divisions + 1);
        let mut total = 0.0;
        let mut prev = self.raw_point(0.0);
        table.push(0.0);
        for i in 1..=divisions {
            let point = self.raw_point(i as f32 / divisions as f32);
            total += point.distance(prev);
            table.push(total);
            prev = point;
        }
        table
    }

    /// Segment index and local weight for a raw (control-point uniform) parameter.
    fn locate(&self, u: f32) -> (usize, f32) {
        let count = self.segments.len();
        let p = u.clamp(0.0, 1.0) * count as f32;
        let index = p.floor() as usize;
        if index >= count {
            (count - 1, 1.0)
        } else {
            (index, p - index as f32)
        }
    }

    fn raw_point(&self, u: f32) -> Float3 {
        let (index, w) = self.locate(u);
        self.segments[index].point(w)
    }

    fn raw_derivative(&self, u: f32) -> Float3 {
        let (index, w) = self.locate(u);
        self.segments[index].derivative(w)
    }

    /// Maps arc-normalized `t` to the raw parameter via the arc-length table.
    fn raw_param(&self, t: f32) -> f32 {
        let divisions = self.arc_lengths.len() - 1;
        let target = t.clamp(0.0, 1.0) * self.length();

        let upper = self.arc_lengths.partition_point(|&arc| arc <= target);
        let lo = upper.saturating_sub(1).min(divisions - 1);

        let seg_start = self.arc_lengths[lo];
        let seg_len = self.arc_lengths[lo + 1] - seg_start;
        let frac = if seg_len > 0.0 {
            ((target - seg_start) / seg_len).clamp(0.0, 1.0)
        } else {
            0.0
        };
        (lo as f32 + frac) / divisions as f32
    }

    pub fn control_points(&self) -> &[Float3] {
        &self.control_points
    }

    pub fn length(&self) -> f32 {
        self.arc_lengths.last().copied().unwrap_or(0.0)
    }

    pub fn point_at(&self, t: f32) -> Float3 {
        self.raw_point(self.raw_param(t))
    }

    /// Unit tangent at `t`.
    pub fn tangent_at(&self, t: f32) -> Float3 {
        let u = self.raw_param(t);
        let derivative = self.raw_derivative(u);
        if derivative.magnitude() > 1e-6 {
            return derivative.normalize();
        }

        // Stationary point of the cubic: fall back to a finite difference.
        let h = 1.0 / (self.arc_lengths.len() - 1) as f32;
        let ahead = self.raw_point((u + h).min(1.0));
        let behind = self.raw_point((u - h).max(0.0));
        (ahead - behind).normalize()
    }

    pub fn arc_at(&self, t: f32) -> f32 {
        t.clamp(0.0, 1.0) * self.length()
    }

    pub fn t_at_arc(&self, arc: f32) -> f32 {
        (arc / self.length()).clamp(0.0, 1.0)
    }
}
