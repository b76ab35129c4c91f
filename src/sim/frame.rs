use super::math::{Float3, Matrix3, Quaternion};

/// Projections shorter than this are treated as degenerate.
const DEGENERATE_LENGTH: f32 = 1e-4;

/// Orthonormal coordinate frame along the track.
///
/// Represents a right-handed coordinate system with three orthogonal unit vectors:
/// - `tangent`: Forward direction of travel
/// - `normal`: Track "up", the side the floor faces
/// - `binormal`: Rightward direction (`tangent x normal`)
///
/// C-compatible layout for FFI.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Frame {
    pub tangent: Float3,
    pub normal: Float3,
    pub binormal: Float3,
}

impl Frame {
    pub const fn new(tangent: Float3, normal: Float3, binormal: Float3) -> Self {
        Self {
            tangent,
            normal,
            binormal,
        }
    }

    /// Builds the first frame of a curve from its tangent and a reference up vector.
    ///
    /// If `up` is (nearly) parallel to the tangent, the world X axis and then the
    /// world Z axis are used as the reference instead.
    pub fn from_tangent(tangent: Float3, up: Float3) -> Self {
        let t = tangent.normalize();
        let n = perpendicular(t, &[up, Float3::RIGHT, Float3::FORWARD]);
        Self::new(t, n, t.cross(n).normalize())
    }

    /// Parallel-transports this frame onto a new tangent.
    ///
    /// The previous normal is projected onto the plane perpendicular to
    /// `next_tangent`, so the frame turns by the minimal rotation and never
    /// flips when the tangent passes through vertical.
    pub fn transport(self, next_tangent: Float3) -> Self {
        let t = next_tangent.normalize();
        let n = perpendicular(t, &[self.normal, -self.tangent, Float3::RIGHT, Float3::FORWARD]);
        Self::new(t, n, t.cross(n).normalize())
    }

    /// Re-orthonormalizes the frame using the Gram-Schmidt process.
    ///
    /// Preserves the tangent exactly, orthogonalizes the normal to it,
    /// then recomputes the binormal as tangent x normal.
    /// This corrects accumulated floating-point drift in frame vectors.
    pub fn reorthonormalize(self) -> Self {
        let t = self.tangent.normalize();
        let n = self.normal.reject(t).normalize();
        let b = t.cross(n).normalize();
        Self::new(t, n, b)
    }

    /// Rolls the normal/binormal pair about the tangent.
    ///
    /// A positive angle tilts the normal toward the binormal.
    pub fn banked(self, angle: f32) -> Self {
        if angle == 0.0 {
            return self;
        }
        let (sin, cos) = angle.sin_cos();
        let n = (self.normal * cos + self.binormal * sin).normalize();
        let b = self.tangent.cross(n).normalize();
        Self::new(self.tangent, n, b)
    }

    /// Rotation mapping local x to `normal`, local y to `binormal` and local z to `tangent`.
    pub fn to_quaternion(self) -> Quaternion {
        Quaternion::from_rotation_matrix(&self.basis())
    }

    pub fn basis(self) -> Matrix3 {
        Matrix3::from_columns(self.normal, self.binormal, self.tangent)
    }

    /// Angle between this frame's normal and another's, in radians.
    pub fn normal_angle(self, other: Frame) -> f32 {
        self.normal.dot(other.normal).clamp(-1.0, 1.0).acos()
    }

    pub const DEFAULT: Self = Self::new(Float3::BACK, Float3::UP, Float3::RIGHT);
}

impl Default for Frame {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// First candidate whose projection onto the plane perpendicular to `t` is usable.
fn perpendicular(t: Float3, candidates: &[Float3]) -> Float3 {
    for &candidate in candidates {
        let projected = candidate.reject(t);
        if projected.magnitude() > DEGENERATE_LENGTH {
            return projected.normalize();
        }
    }
    // `t` cannot be parallel to both world X and Z, so this is only hit for a zero tangent.
    Float3::UP
}
