use super::math::Float3;

pub const G: f32 = 9.82;
pub const HZ: f32 = 60.0;
pub const DT: f32 = 1.0 / HZ;
pub const EPSILON: f32 = 1.192_093e-7;
pub const MAX_SUBSTEPS: u32 = 8;

/// Scales `velocity` down to `max_speed` if it is faster, keeping its direction.
pub fn cap_speed(velocity: Float3, max_speed: f32) -> Float3 {
    let speed = velocity.magnitude();
    if speed <= max_speed || speed < EPSILON {
        return velocity;
    }
    velocity * (max_speed / speed)
}

/// Resolves velocity against a contact surface with outward `normal`.
///
/// Only the component moving into the surface is touched: it is removed and
/// `restitution` of it is re-added pointing away from the surface.
pub fn reflect_inward(velocity: Float3, normal: Float3, restitution: f32) -> Float3 {
    let vn = velocity.dot(normal);
    if vn >= 0.0 {
        return velocity;
    }
    velocity - normal * (vn * (1.0 + restitution))
}

/// Minimum wall thickness so a body at `max_speed` cannot cross the wall in one step.
pub fn min_wall_thickness(max_speed: f32, dt: f32) -> f32 {
    max_speed * dt
}
