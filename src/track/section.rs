use serde::{Deserialize, Serialize};

use super::error::{ensure_positive, TrackError};

/// Rails sitting on top of both channel walls.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rail {
    pub height: f32,
    pub thickness: f32,
}

/// Cross-section swept along the track frames.
///
/// For `Channel` the curve runs along the top of the floor; for `Cage` and
/// `Pipe` it is the tube axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CrossSection {
    /// Open U-channel: floor plus two side walls.
    Channel {
        width: f32,
        floor_thickness: f32,
        wall_height: f32,
        wall_thickness: f32,
        #[serde(default)]
        rail: Option<Rail>,
    },
    /// Closed tube approximated by `sides` boxes around each ring.
    Cage {
        sides: u32,
        radius: f32,
        wall_thickness: f32,
    },
    /// Tube with no geometry; marbles are held in analytically.
    Pipe { radius: f32 },
}

impl CrossSection {
    pub fn validate(&self) -> Result<(), TrackError> {
        match *self {
            CrossSection::Channel {
                width,
                floor_thickness,
                wall_height,
                wall_thickness,
                rail,
            } => {
                ensure_positive("width", width)?;
                ensure_positive("floor_thickness", floor_thickness)?;
                ensure_positive("wall_height", wall_height)?;
                ensure_positive("wall_thickness", wall_thickness)?;
                if let Some(rail) = rail {
                    ensure_positive("rail.height", rail.height)?;
                    ensure_positive("rail.thickness", rail.thickness)?;
                }
            }
            CrossSection::Cage {
                sides,
                radius,
                wall_thickness,
            } => {
                if sides < 3 {
                    return Err(TrackError::InvalidParameter {
                        name: "sides",
                        value: sides as f32,
                    });
                }
                ensure_positive("radius", radius)?;
                ensure_positive("wall_thickness", wall_thickness)?;
            }
            CrossSection::Pipe { radius } => {
                ensure_positive("radius", radius)?;
            }
        }
        Ok(())
    }

    /// Thinnest solid wall, or `None` when walls are analytic.
    pub fn wall_thickness(&self) -> Option<f32> {
        match *self {
            CrossSection::Channel {
                floor_thickness,
                wall_thickness,
                ..
            } => Some(floor_thickness.min(wall_thickness)),
            CrossSection::Cage { wall_thickness, .. } => Some(wall_thickness),
            CrossSection::Pipe { .. } => None,
        }
    }

    /// Free lateral room either side of the curve.
    pub fn half_width(&self) -> f32 {
        match *self {
            CrossSection::Channel { width, .. } => width * 0.5,
            CrossSection::Cage { radius, .. } | CrossSection::Pipe { radius } => radius,
        }
    }

    /// Distance along the frame normal at which a marble of `radius` rests.
    pub fn rest_offset(&self, radius: f32) -> f32 {
        match self {
            CrossSection::Channel { .. } => radius,
            CrossSection::Cage { .. } | CrossSection::Pipe { .. } => 0.0,
        }
    }
}

impl Default for CrossSection {
    fn default() -> Self {
        CrossSection::Pipe { radius: 3.5 }
    }
}
