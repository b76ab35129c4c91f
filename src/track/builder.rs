use serde::{Deserialize, Serialize};

use crate::sim::{min_wall_thickness, Float3};

use super::collider::{self, ColliderSegment};
use super::constraint::{PipeConstraint, ProgressSearch};
use super::error::{ensure_positive, TrackError};
use super::frames::{Banking, FrameBuilder};
use super::pieces::{self, Piece};
use super::section::CrossSection;
use super::spline::{Spline, SplinePoint};

const MIN_OVERLAP: f32 = 1.0;
const MAX_OVERLAP: f32 = 1.5;
/// Finest frame spacing, in meters.
const MIN_RESOLUTION: f32 = 0.01;
const MAX_FRAMES: f32 = 1.0e6;

/// Everything needed to generate one track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackConfig {
    pub start: Float3,
    /// Initial horizontal direction of travel.
    pub heading: Float3,
    pub pieces: Vec<Piece>,
    /// Meters between frames.
    pub resolution: f32,
    pub up: Float3,
    /// Per-meter pull of frames back toward `up`; 0 is pure parallel transport.
    pub up_bias: f32,
    pub cross_section: CrossSection,
    pub banking: Option<Banking>,
    /// Segment length multiplier so adjacent boxes overlap.
    pub overlap: f32,
    pub progress: ProgressSearch,
    /// Bounce off the analytic pipe wall.
    pub bounce: f32,
    /// Analytic radius enforced on top of solid geometry, if any.
    pub guard_radius: Option<f32>,
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self {
            start: Float3::new(0.0, 30.0, 0.0),
            heading: Float3::BACK,
            pieces: vec![Piece::Slide {
                length: 60.0,
                drop: 25.0,
                sway: 6.0,
                waves: 2.0,
                samples: 24,
            }],
            resolution: 0.5,
            up: Float3::UP,
            up_bias: 1.0,
            cross_section: CrossSection::default(),
            banking: None,
            overlap: 1.08,
            progress: ProgressSearch::Nearest,
            bounce: 0.0,
            guard_radius: None,
        }
    }
}

impl TrackConfig {
    pub fn validate(&self) -> Result<(), TrackError> {
        ensure_positive("resolution", self.resolution)?;
        if self.resolution < MIN_RESOLUTION {
            return Err(TrackError::InvalidParameter {
                name: "resolution",
                value: self.resolution,
            });
        }
        if !(MIN_OVERLAP..=MAX_OVERLAP).contains(&self.overlap) {
            return Err(TrackError::InvalidParameter {
                name: "overlap",
                value: self.overlap,
            });
        }
        if self.up.magnitude() < 1e-4 {
            return Err(TrackError::InvalidParameter {
                name: "up",
                value: 0.0,
            });
        }
        for (name, vector) in [("start", self.start), ("heading", self.heading), ("up", self.up)] {
            if !vector.is_finite() {
                return Err(TrackError::InvalidParameter {
                    name,
                    value: f32::NAN,
                });
            }
        }
        if !(self.up_bias.is_finite() && self.up_bias >= 0.0) {
            return Err(TrackError::InvalidParameter {
                name: "up_bias",
                value: self.up_bias,
            });
        }
        if !(0.0..=1.0).contains(&self.bounce) {
            return Err(TrackError::InvalidParameter {
                name: "bounce",
                value: self.bounce,
            });
        }
        if let Some(radius) = self.guard_radius {
            ensure_positive("guard_radius", radius)?;
        }
        if let Some(banking) = &self.banking {
            banking.validate()?;
        }
        self.cross_section.validate()
    }
}

/// A generated track: curve, frames and the collision description derived from them.
#[derive(Debug, Clone)]
pub struct Track {
    spline: Spline,
    frames: Vec<SplinePoint>,
    colliders: Vec<ColliderSegment>,
    constraint: Option<PipeConstraint>,
    cross_section: CrossSection,
}

impl Track {
    pub fn build(config: &TrackConfig) -> Result<Self, TrackError> {
        config.validate()?;
        let points = pieces::chain(config.start, config.heading, &config.pieces)?;
        Self::from_points(points, config)
    }

    /// Builds from an explicit control polyline, ignoring `config.pieces`.
    pub fn from_points(points: Vec<Float3>, config: &TrackConfig) -> Result<Self, TrackError> {
        config.validate()?;
        let spline = Spline::new(points)?;
        if spline.length() / config.resolution > MAX_FRAMES {
            return Err(TrackError::InvalidParameter {
                name: "resolution",
                value: config.resolution,
            });
        }

        let frames = FrameBuilder::with_resolution(spline.length(), config.resolution)
            .with_up(config.up.normalize())
            .with_up_bias(config.up_bias)
            .with_banking(config.banking)
            .build(&spline);

        let colliders = collider::emit(&frames, &config.cross_section, config.overlap);

        let constraint_radius = match config.cross_section {
            CrossSection::Pipe { radius } => Some(radius),
            _ => config.guard_radius,
        };
        let constraint = constraint_radius.map(|radius| {
            PipeConstraint::new(spline.clone(), radius, frames.len())
                .with_bounce(config.bounce)
                .with_search(config.progress)
        });

        let track = Self {
            spline,
            frames,
            colliders,
            constraint,
            cross_section: config.cross_section,
        };

        log::info!(
            "built track: {:.1} m, {} frames, {} colliders, {}",
            track.length(),
            track.frames.len(),
            track.colliders.len(),
            if track.constraint.is_some() {
                "analytic pipe"
            } else {
                "no pipe constraint"
            }
        );
        log::debug!(
            "control points: {}, max bank: {:.3} rad",
            track.spline.control_points().len(),
            track.max_bank()
        );

        Ok(track)
    }

    pub fn spline(&self) -> &Spline {
        &self.spline
    }

    pub fn frames(&self) -> &[SplinePoint] {
        &self.frames
    }

    pub fn colliders(&self) -> &[ColliderSegment] {
        &self.colliders
    }

    pub fn constraint(&self) -> Option<&PipeConstraint> {
        self.constraint.as_ref()
    }

    pub fn cross_section(&self) -> &CrossSection {
        &self.cross_section
    }

    pub fn length(&self) -> f32 {
        self.spline.length()
    }

    pub fn max_bank(&self) -> f32 {
        self.frames.iter().map(|p| p.bank.abs()).fold(0.0, f32::max)
    }

    pub fn start_frame(&self) -> &SplinePoint {
        &self.frames[0]
    }

    pub fn start_position(&self) -> Float3 {
        self.start_frame().position
    }

    pub fn end_position(&self) -> Float3 {
        self.spline.point_at(1.0)
    }

    /// Lowest point of the track surface.
    pub fn lowest_point(&self) -> f32 {
        self.frames
            .iter()
            .map(|p| p.position.y - self.cross_section.half_width())
            .fold(f32::MAX, f32::min)
    }

    /// Where a marble of `radius` is dropped, before any jitter.
    pub fn spawn_position(&self, radius: f32, drop_height: f32) -> Float3 {
        let start = self.start_frame();
        start.position + start.frame.normal * (self.cross_section.rest_offset(radius) + drop_height)
    }

    /// Thinnest solid wall when it is thin enough for a body at `max_speed`
    /// to cross it within one step of `dt`.
    pub fn tunneling_hazard(&self, max_speed: f32, dt: f32) -> Option<f32> {
        let thickness = self.cross_section.wall_thickness()?;
        (thickness < min_wall_thickness(max_speed, dt)).then_some(thickness)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::collider::SegmentKind;
    use approx::assert_relative_eq;

    fn channel_config() -> TrackConfig {
        TrackConfig {
            pieces: vec![Piece::Straight {
                length: 20.0,
                drop: 5.0,
            }],
            cross_section: CrossSection::Channel {
                width: 3.0,
                floor_thickness: 1.5,
                wall_height: 1.0,
                wall_thickness: 0.3,
                rail: None,
            },
            resolution: 1.0,
            ..Default::default()
        }
    }

    #[test]
    fn default_config_builds_a_pipe() {
        let track = Track::build(&TrackConfig::default()).unwrap();
        assert!(track.constraint().is_some());
        assert!(track.colliders().is_empty());
        assert!(track.length() > 60.0);
    }

    #[test]
    fn channel_builds_boxes_without_constraint() {
        let track = Track::build(&channel_config()).unwrap();
        assert!(track.constraint().is_none());
        let frames = track.frames().len();
        assert_eq!(track.colliders().len(), (frames - 1) * 3);
        assert!(track
            .colliders()
            .iter()
            .any(|c| c.kind == SegmentKind::LeftWall));
    }

    #[test]
    fn guard_radius_adds_constraint_to_boxes() {
        let config = TrackConfig {
            guard_radius: Some(2.5),
            ..channel_config()
        };
        let track = Track::build(&config).unwrap();
        assert_relative_eq!(track.constraint().unwrap().radius(), 2.5);
        assert!(!track.colliders().is_empty());
    }

    #[test]
    fn no_pieces_is_too_few_points() {
        let config = TrackConfig {
            pieces: vec![],
            ..Default::default()
        };
        assert_eq!(
            Track::build(&config).unwrap_err(),
            TrackError::TooFewPoints { found: 1 }
        );
    }

    #[test]
    fn tiny_resolution_is_rejected() {
        let config = TrackConfig {
            resolution: 1e-30,
            ..Default::default()
        };
        assert!(matches!(
            Track::build(&config),
            Err(TrackError::InvalidParameter { name: "resolution", .. })
        ));
    }

    #[test]
    fn too_many_frames_are_rejected() {
        let points = vec![Float3::ZERO, Float3::new(0.0, 0.0, -1.0e5)];
        let config = TrackConfig {
            resolution: 0.05,
            ..Default::default()
        };
        assert!(matches!(
            Track::from_points(points, &config),
            Err(TrackError::InvalidParameter { name: "resolution", .. })
        ));
    }

    #[test]
    fn nan_banking_is_rejected_before_building() {
        let config = TrackConfig {
            banking: Some(Banking {
                max_angle: f32::NAN,
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(matches!(
            Track::build(&config),
            Err(TrackError::InvalidParameter { name: "banking.max_angle", .. })
        ));
    }

    #[test]
    fn bounce_outside_unit_range_is_rejected() {
        for bounce in [f32::NAN, -0.1, 1.5] {
            let config = TrackConfig {
                bounce,
                ..Default::default()
            };
            assert!(config.validate().is_err(), "{bounce}");
        }
    }

    #[test]
    fn overlap_out_of_range_is_rejected() {
        let config = TrackConfig {
            overlap: 2.0,
            ..Default::default()
        };
        assert!(matches!(
            Track::build(&config),
            Err(TrackError::InvalidParameter { name: "overlap", .. })
        ));
    }

    #[test]
    fn spawn_rests_above_channel_floor() {
        let track = Track::build(&channel_config()).unwrap();
        let spawn = track.spawn_position(0.2, 0.5);
        let start = track.start_frame();
        let height = (spawn - start.position).dot(start.frame.normal);
        assert_relative_eq!(height, 0.7, epsilon = 1e-4);
    }

    #[test]
    fn thin_walls_are_a_tunneling_hazard() {
        let track = Track::build(&channel_config()).unwrap();
        assert_eq!(track.tunneling_hazard(50.0, 1.0 / 60.0), Some(0.3));
        assert_eq!(track.tunneling_hazard(10.0, 1.0 / 60.0), None);
    }

    #[test]
    fn config_round_trips_through_toml() {
        let config = channel_config();
        let text = toml::to_string(&config).unwrap();
        let parsed: TrackConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }
}
