use serde::{Deserialize, Serialize};

use super::math::Float3;
use super::physics;

/// Tuning for the marble stepper.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsParams {
    pub gravity: Float3,
    /// Fixed step per rendered frame, in seconds.
    pub fixed_dt: f32,
    /// Sub-steps per fixed step (1..=8).
    pub substeps: u32,
    pub max_speed: f32,
    /// Bounce against track geometry.
    pub restitution: f32,
    /// Bounce between marbles.
    pub marble_restitution: f32,
    /// Coulomb coefficient: tangential velocity lost per unit of normal impulse.
    pub friction: f32,
    /// Velocity fraction lost per second.
    pub linear_damping: f32,
}

impl PhysicsParams {
    pub fn substep_dt(&self) -> f32 {
        self.fixed_dt / self.substeps() as f32
    }

    pub fn substeps(&self) -> u32 {
        self.substeps.clamp(1, physics::MAX_SUBSTEPS)
    }
}

impl Default for PhysicsParams {
    fn default() -> Self {
        Self {
            gravity: Float3::new(0.0, -physics::G, 0.0),
            fixed_dt: physics::DT,
            substeps: 3,
            max_speed: 50.0,
            restitution: 0.2,
            marble_restitution: 0.9,
            friction: 0.01,
            linear_damping: 0.05,
        }
    }
}
