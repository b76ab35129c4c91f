use serde::{Deserialize, Serialize};

use crate::sim::{Curvature, Float3, Frame};

use super::error::{ensure_positive, TrackError};
use super::spline::{Spline, SplinePoint};

/// Bank the cross-section into turns in proportion to curvature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Banking {
    /// Radians of bank per unit of lateral tangent change.
    pub factor: f32,
    pub max_angle: f32,
    /// Half-width of the tangent finite difference, in meters of arc.
    pub epsilon: f32,
}

impl Banking {
    pub fn validate(&self) -> Result<(), TrackError> {
        if !self.factor.is_finite() {
            return Err(TrackError::InvalidParameter {
                name: "banking.factor",
                value: self.factor,
            });
        }
        if !(self.max_angle.is_finite() && self.max_angle >= 0.0) {
            return Err(TrackError::InvalidParameter {
                name: "banking.max_angle",
                value: self.max_angle,
            });
        }
        ensure_positive("banking.epsilon", self.epsilon)?;
        Ok(())
    }
}

impl Default for Banking {
    fn default() -> Self {
        Self {
            factor: 3.0,
            max_angle: 0.6,
            epsilon: 0.5,
        }
    }
}

/// Walks a spline and produces parallel-transported (optionally banked) frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameBuilder {
    samples: usize,
    up: Float3,
    /// Per-meter pull of the normal back toward `up`; 0 is pure parallel transport.
    up_bias: f32,
    banking: Option<Banking>,
}

impl FrameBuilder {
    pub fn new(samples: usize) -> Self {
        Self {
            samples: samples.max(2),
            up: Float3::UP,
            up_bias: 0.0,
            banking: None,
        }
    }

    /// Sample count giving roughly `resolution` meters between frames.
    pub fn with_resolution(length: f32, resolution: f32) -> Self {
        Self::new(((length / resolution).ceil() as usize).saturating_add(1))
    }

    pub fn with_up(mut self, up: Float3) -> Self {
        self.up = up;
        self
    }

    /// Counteracts the twist pure transport accumulates on helices.
    ///
    /// The pull fades out as the tangent approaches vertical and whenever the
    /// track is upside down, so loops and drops still transport freely.
    pub fn with_up_bias(mut self, up_bias: f32) -> Self {
        self.up_bias = up_bias.max(0.0);
        self
    }

    pub fn with_banking(mut self, banking: Option<Banking>) -> Self {
        self.banking = banking;
        self
    }

    pub fn samples(&self) -> usize {
        self.samples
    }

    pub fn build(&self, spline: &Spline) -> Vec<SplinePoint> {
        let mut result = Vec::with_capacity(self.samples);
        let mut transported: Option<Frame> = None;
        let last = (self.samples - 1) as f32;
        let step = spline.length() / last;

        for i in 0..self.samples {
            let t = i as f32 / last;
            let tangent = spline.tangent_at(t);

            // The unbanked frame is what propagates, so banking never accumulates.
            let frame = match transported {
                None => Frame::from_tangent(tangent, self.up),
                Some(prev) => self.relax_toward_up(prev.transport(tangent), step),
            };
            transported = Some(frame);

            let bank = self.bank_angle(spline, t, frame);
            result.push(SplinePoint::new(
                spline.arc_at(t),
                t,
                spline.point_at(t),
                frame.banked(bank),
                bank,
            ));
        }

        result
    }

    fn relax_toward_up(&self, frame: Frame, step: f32) -> Frame {
        if self.up_bias <= 0.0 {
            return frame;
        }
        let target = self.up.reject(frame.tangent);
        let horizontal = target.magnitude();
        if horizontal < 1e-4 {
            return frame;
        }
        let target = target * (1.0 / horizontal);
        let alignment = frame.normal.dot(target).max(0.0);
        let weight = (1.0 - (-self.up_bias * step).exp()) * horizontal * alignment;
        if weight <= 0.0 {
            return frame;
        }
        let normal = frame.normal.lerp(target, weight);
        Frame::new(frame.tangent, normal, frame.binormal).reorthonormalize()
    }

    fn bank_angle(&self, spline: &Spline, t: f32, frame: Frame) -> f32 {
        let Some(banking) = self.banking else {
            return 0.0;
        };
        let dt = banking.epsilon / spline.length();
        let before = spline.tangent_at(t - dt);
        let after = spline.tangent_at(t + dt);
        Curvature::from_tangents(before, after, frame).bank_angle(banking.factor, banking.max_angle)
    }
}

/// Resamples a spline into frames spaced roughly `resolution` meters apart.
pub fn resample(spline: &Spline, resolution: f32) -> Vec<SplinePoint> {
    FrameBuilder::with_resolution(spline.length(), resolution).build(spline)
}
