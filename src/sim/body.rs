use super::math::{Float3, Quaternion};

/// Why a marble left the race early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Elimination {
    Fell,
    Stalled,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MarbleStatus {
    Racing,
    /// Race time at which the finish volume was reached.
    Finished { time: f32 },
    Eliminated(Elimination),
}

impl MarbleStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, MarbleStatus::Racing)
    }

    /// Compact code for FFI hosts: 0 racing, 1 finished, 2 fell, 3 stalled.
    pub fn code(&self) -> u8 {
        match self {
            MarbleStatus::Racing => 0,
            MarbleStatus::Finished { .. } => 1,
            MarbleStatus::Eliminated(Elimination::Fell) => 2,
            MarbleStatus::Eliminated(Elimination::Stalled) => 3,
        }
    }
}

/// A simulated sphere. Owned and mutated by the world every sub-step.
#[derive(Debug, Clone, PartialEq)]
pub struct Marble {
    pub id: u32,
    pub position: Float3,
    pub velocity: Float3,
    pub orientation: Quaternion,
    pub angular_velocity: Float3,
    pub radius: f32,
    pub status: MarbleStatus,
    /// Curve parameter found by the last nearest-point search.
    pub progress_hint: Option<f32>,
    /// Position the stall timer is measured from.
    pub stall_anchor: Float3,
    pub stall_timer: f32,
}

impl Marble {
    pub fn new(id: u32, position: Float3, radius: f32) -> Self {
        Self {
            id,
            position,
            velocity: Float3::ZERO,
            orientation: Quaternion::IDENTITY,
            angular_velocity: Float3::ZERO,
            radius,
            status: MarbleStatus::Racing,
            progress_hint: None,
            stall_anchor: position,
            stall_timer: 0.0,
        }
    }

    pub fn with_velocity(mut self, velocity: Float3) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn is_racing(&self) -> bool {
        self.status == MarbleStatus::Racing
    }

    pub fn speed(&self) -> f32 {
        self.velocity.magnitude()
    }

    pub fn state(&self) -> MarbleState {
        MarbleState {
            id: self.id,
            position: self.position,
            orientation: self.orientation,
            radius: self.radius,
            status: self.status.code(),
        }
    }
}

/// Render-facing snapshot of a marble.
/// C-compatible layout for FFI.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MarbleState {
    pub id: u32,
    pub position: Float3,
    pub orientation: Quaternion,
    pub radius: f32,
    pub status: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_marble_is_racing_at_rest() {
        let marble = Marble::new(7, Float3::new(0.0, 10.0, 0.0), 0.2);
        assert!(marble.is_racing());
        assert_eq!(marble.speed(), 0.0);
        assert_eq!(marble.stall_anchor, marble.position);
        assert_eq!(marble.progress_hint, None);
    }

    #[test]
    fn status_codes_are_distinct() {
        let codes = [
            MarbleStatus::Racing.code(),
            MarbleStatus::Finished { time: 1.0 }.code(),
            MarbleStatus::Eliminated(Elimination::Fell).code(),
            MarbleStatus::Eliminated(Elimination::Stalled).code(),
        ];
        assert_eq!(codes, [0, 1, 2, 3]);
    }

    #[test]
    fn only_racing_is_not_terminal() {
        assert!(!MarbleStatus::Racing.is_terminal());
        assert!(MarbleStatus::Finished { time: 3.0 }.is_terminal());
        assert!(MarbleStatus::Eliminated(Elimination::Fell).is_terminal());
    }

    #[test]
    fn state_mirrors_marble() {
        let marble = Marble::new(3, Float3::new(1.0, 2.0, 3.0), 0.3);
        let state = marble.state();
        assert_eq!(state.id, 3);
        assert_eq!(state.position, marble.position);
        assert_eq!(state.status, 0);
    }
}
