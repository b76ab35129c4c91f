use super::frame::Frame;
use super::math::Float3;
use super::physics;

/// Local bend of the curve, measured from the tangent change across a sample.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Curvature {
    /// Tangent change projected onto the frame binormal (positive turns right).
    pub lateral: f32,
    /// Tangent change projected onto the frame normal (positive bends toward the floor's up side).
    pub vertical: f32,
    pub total_angle: f32,
}

impl Curvature {
    pub const fn new(lateral: f32, vertical: f32, total_angle: f32) -> Self {
        Self {
            lateral,
            vertical,
            total_angle,
        }
    }

    /// Finite-difference curvature from the tangents before and after `frame`.
    pub fn from_tangents(before: Float3, after: Float3, frame: Frame) -> Self {
        let before = before.normalize();
        let after = after.normalize();
        let diff = after - before;
        if diff.magnitude() < physics::EPSILON {
            return Self::ZERO;
        }

        let total_angle = before.dot(after).clamp(-1.0, 1.0).acos();
        Self::new(diff.dot(frame.binormal), diff.dot(frame.normal), total_angle)
    }

    /// Bank angle for this bend: `factor * lateral`, clamped to `±max_angle`.
    pub fn bank_angle(&self, factor: f32, max_angle: f32) -> f32 {
        let max_angle = max_angle.abs();
        if max_angle.is_nan() {
            return 0.0;
        }
        (self.lateral * factor).clamp(-max_angle, max_angle)
    }

    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);
}

impl Default for Curvature {
    fn default() -> Self {
        Self::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::Quaternion;
    use approx::assert_relative_eq;

    const TOLERANCE: f32 = 1e-5;

    #[test]
    fn nan_max_angle_gives_no_bank() {
        let curvature = Curvature::new(0.3, 0.0, 0.3);
        assert_eq!(curvature.bank_angle(2.0, f32::NAN), 0.0);
    }

    #[test]
    fn zero_has_zero_angles() {
        let zero = Curvature::ZERO;
        assert_relative_eq!(zero.lateral, 0.0, epsilon = TOLERANCE);
        assert_relative_eq!(zero.vertical, 0.0, epsilon = TOLERANCE);
        assert_relative_eq!(zero.total_angle, 0.0, epsilon = TOLERANCE);
    }

    #[test]
    fn straight_line_has_zero_curvature() {
        let frame = Frame::DEFAULT;
        let curvature = Curvature::from_tangents(frame.tangent, frame.tangent, frame);
        assert_eq!(curvature, Curvature::ZERO);
    }

    #[test]
    fn right_turn_is_positive_lateral() {
        let frame = Frame::DEFAULT;
        let yaw = Quaternion::from_axis_angle(Float3::UP, 0.1);
        let before = yaw.mul_vec(frame.tangent);
        let after = yaw.conjugate().mul_vec(frame.tangent);
        let curvature = Curvature::from_tangents(before, after, frame);

        assert!(curvature.lateral > 0.0);
        assert_relative_eq!(curvature.vertical, 0.0, epsilon = TOLERANCE);
        assert_relative_eq!(curvature.total_angle, 0.2, epsilon = 1e-4);
    }

    #[test]
    fn crest_is_negative_vertical() {
        let frame = Frame::DEFAULT;
        let before = Float3::new(0.0, 0.1, -1.0);
        let after = Float3::new(0.0, -0.1, -1.0);
        let curvature = Curvature::from_tangents(before, after, frame);

        assert!(curvature.vertical < 0.0);
        assert_relative_eq!(curvature.lateral, 0.0, epsilon = TOLERANCE);
    }

    #[test]
    fn bank_angle_is_scaled_and_clamped() {
        let gentle = Curvature::new(0.1, 0.0, 0.1);
        assert_relative_eq!(gentle.bank_angle(2.0, 1.0), 0.2, epsilon = TOLERANCE);

        let sharp = Curvature::new(-0.9, 0.0, 0.9);
        assert_relative_eq!(sharp.bank_angle(2.0, 0.5), -0.5, epsilon = TOLERANCE);
    }
}
