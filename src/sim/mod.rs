//! Math primitives, track frames and marble bodies.
//!
//! This module has no dependencies on the rest of the crate.

mod body;
mod curvature;
mod frame;
mod math;
mod params;

pub mod physics;

pub use body::{Elimination, Marble, MarbleState, MarbleStatus};
pub use curvature::Curvature;
pub use frame::Frame;
pub use math::{Float3, Matrix3, Quaternion};
pub use params::PhysicsParams;
pub use physics::{cap_speed, min_wall_thickness, reflect_inward, DT, EPSILON, G, HZ};
