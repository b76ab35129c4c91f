use serde::{Deserialize, Serialize};

use crate::sim::{Elimination, Float3, Marble, MarbleStatus};
use crate::track::Track;

/// Thresholds deciding when a marble finishes or drops out.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RaceRules {
    /// Center of the finish sphere; the track end when unset.
    pub finish_center: Option<Float3>,
    pub finish_radius: f32,
    /// How far below the lowest track point a marble counts as fallen.
    pub fall_margin: f32,
    /// Seconds a marble may stay within `stall_distance` of one spot.
    pub stall_timeout: f32,
    pub stall_distance: f32,
}

impl Default for RaceRules {
    fn default() -> Self {
        Self {
            finish_center: None,
            finish_radius: 2.0,
            fall_margin: 5.0,
            stall_timeout: 5.0,
            stall_distance: 0.05,
        }
    }
}

impl RaceRules {
    /// Fixes the track-relative thresholds against a built track.
    pub fn resolve(&self, track: &Track) -> Judge {
        Judge {
            finish_center: self.finish_center.unwrap_or_else(|| track.end_position()),
            finish_radius: self.finish_radius.max(0.0),
            fall_height: track.lowest_point() - self.fall_margin,
            stall_timeout: self.stall_timeout,
            stall_distance: self.stall_distance,
        }
    }
}

/// Applies race status transitions to marbles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Judge {
    pub finish_center: Float3,
    pub finish_radius: f32,
    pub fall_height: f32,
    pub stall_timeout: f32,
    pub stall_distance: f32,
}

impl Judge {
    /// Updates `marble` after it advanced by `dt`, at race time `time`.
    ///
    /// Returns the new status when a transition happened. Finished and
    /// eliminated marbles are left untouched.
    pub fn update(&self, marble: &mut Marble, time: f32, dt: f32) -> Option<MarbleStatus> {
        if marble.status.is_terminal() {
            return None;
        }

        let status = if marble.position.distance(self.finish_center) <= self.finish_radius {
            MarbleStatus::Finished { time }
        } else if marble.position.y < self.fall_height {
            MarbleStatus::Eliminated(Elimination::Fell)
        } else if self.stalled(marble, dt) {
            MarbleStatus::Eliminated(Elimination::Stalled)
        } else {
            return None;
        };

        marble.status = status;
        Some(status)
    }

    fn stalled(&self, marble: &mut Marble, dt: f32) -> bool {
        if marble.position.distance(marble.stall_anchor) >= self.stall_distance {
            marble.stall_anchor = marble.position;
            marble.stall_timer = 0.0;
            return false;
        }
        marble.stall_timer += dt;
        self.stall_timeout > 0.0 && marble.stall_timer >= self.stall_timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn judge() -> Judge {
        Judge {
            finish_center: Float3::new(0.0, 0.0, -50.0),
            finish_radius: 2.0,
            fall_height: -10.0,
            stall_timeout: 1.0,
            stall_distance: 0.05,
        }
    }

    #[test]
    fn reaching_the_finish_sphere_finishes() {
        let mut marble = Marble::new(0, Float3::new(0.0, 1.0, -49.0), 0.2);
        let status = judge().update(&mut marble, 12.5, 1.0 / 60.0);
        assert_eq!(status, Some(MarbleStatus::Finished { time: 12.5 }));
        assert_eq!(marble.status, MarbleStatus::Finished { time: 12.5 });
    }

    #[test]
    fn falling_below_threshold_eliminates() {
        let mut marble = Marble::new(0, Float3::new(0.0, -11.0, 0.0), 0.2);
        judge().update(&mut marble, 3.0, 1.0 / 60.0);
        assert_eq!(marble.status, MarbleStatus::Eliminated(Elimination::Fell));
    }

    #[test]
    fn resting_marble_stalls_after_timeout() {
        let judge = judge();
        let mut marble = Marble::new(0, Float3::new(0.0, 5.0, 0.0), 0.2);
        let dt = 0.1;
        let mut time = 0.0;
        for _ in 0..9 {
            time += dt;
            assert_eq!(judge.update(&mut marble, time, dt), None);
        }
        time += dt;
        judge.update(&mut marble, time, dt);
        judge.update(&mut marble, time + dt, dt);
        assert_eq!(marble.status, MarbleStatus::Eliminated(Elimination::Stalled));
    }

    #[test]
    fn moving_marble_resets_stall_timer() {
        let judge = judge();
        let mut marble = Marble::new(0, Float3::new(0.0, 5.0, 0.0), 0.2);
        for i in 0..100 {
            marble.position.z -= 0.1;
            judge.update(&mut marble, i as f32 * 0.1, 0.1);
        }
        assert!(marble.is_racing());
        assert_eq!(marble.stall_timer, 0.0);
    }

    #[test]
    fn terminal_status_never_changes() {
        let judge = judge();
        let mut marble = Marble::new(0, Float3::new(0.0, 1.0, -50.0), 0.2);
        judge.update(&mut marble, 4.0, 0.1);
        marble.position = Float3::new(0.0, -100.0, 0.0);
        assert_eq!(judge.update(&mut marble, 5.0, 0.1), None);
        assert_eq!(marble.status, MarbleStatus::Finished { time: 4.0 });
    }
}
