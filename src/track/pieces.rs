//! Parametric track pieces.
//!
//! Each piece expands into control points starting where the previous piece
//! ended, heading in the previous piece's horizontal direction of travel.

use std::f32::consts::PI;

use serde::{Deserialize, Serialize};

use crate::sim::Float3;

use super::error::{ensure_positive, TrackError};

/// Points closer than this to their predecessor are dropped.
const DUPLICATE_DISTANCE: f32 = 1e-4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Piece {
    /// Offsets from the piece start, in world axes.
    Points { points: Vec<Float3> },
    /// Straight run of `length` meters along the heading, descending `drop`.
    Straight { length: f32, drop: f32 },
    /// Vertical loop with a sideways shift so the exit clears the entry.
    Loop {
        diameter: f32,
        lateral_shift: f32,
        samples: u32,
    },
    /// Descending helix.
    Corkscrew {
        height: f32,
        radius: f32,
        turns: f32,
        samples: u32,
    },
    /// Helix whose radius shrinks from `radius_start` to `radius_end`.
    Funnel {
        radius_start: f32,
        radius_end: f32,
        height: f32,
        turns: f32,
        samples: u32,
    },
    /// Weaving descent, like a water slide.
    Slide {
        length: f32,
        drop: f32,
        sway: f32,
        waves: f32,
        samples: u32,
    },
}

impl Piece {
    /// Control points after `start`, not including it.
    pub fn points(&self, start: Float3, heading: Float3) -> Result<Vec<Float3>, TrackError> {
        let up = Float3::UP;
        let right = heading.cross(up).normalize();

        let points = match self {
            Piece::Points { points } => points.iter().map(|&offset| start + offset).collect(),
            Piece::Straight { length, drop } => {
                ensure_positive("straight.length", *length)?;
                vec![start + heading * *length - up * *drop]
            }
            Piece::Loop {
                diameter,
                lateral_shift,
                samples,
            } => {
                let radius = ensure_positive("loop.diameter", *diameter)? * 0.5;
                let samples = ensure_samples(*samples)?;
                let center = start + up * radius;
                (1..=samples)
                    .map(|i| {
                        let s = i as f32 / samples as f32;
                        let angle = s * 2.0 * PI;
                        center + heading * (angle.sin() * radius) - up * (angle.cos() * radius)
                            + right * (s * lateral_shift)
                    })
                    .collect()
            }
            Piece::Corkscrew {
                height,
                radius,
                turns,
                samples,
            } => {
                ensure_positive("corkscrew.radius", *radius)?;
                ensure_positive("corkscrew.turns", *turns)?;
                spiral(start, heading, right, *radius, *radius, *height, *turns, *samples)?
            }
            Piece::Funnel {
                radius_start,
                radius_end,
                height,
                turns,
                samples,
            } => {
                ensure_positive("funnel.radius_start", *radius_start)?;
                ensure_positive("funnel.radius_end", *radius_end)?;
                ensure_positive("funnel.turns", *turns)?;
                spiral(
                    start,
                    heading,
                    right,
                    *radius_start,
                    *radius_end,
                    *height,
                    *turns,
                    *samples,
                )?
            }
            Piece::Slide {
                length,
                drop,
                sway,
                waves,
                samples,
            } => {
                ensure_positive("slide.length", *length)?;
                let samples = ensure_samples(*samples)?;
                (1..=samples)
                    .map(|i| {
                        let s = i as f32 / samples as f32;
                        let weave = (s * waves * 2.0 * PI).sin() * sway;
                        start + heading * (s * length) + right * weave - up * (s * drop)
                    })
                    .collect()
            }
        };

        Ok(points)
    }
}

fn ensure_samples(samples: u32) -> Result<u32, TrackError> {
    if samples == 0 {
        return Err(TrackError::InvalidParameter {
            name: "samples",
            value: 0.0,
        });
    }
    Ok(samples)
}

/// Spiral around a vertical axis `radius_start` to the left of `start`.
#[allow(clippy::too_many_arguments)]
fn spiral(
    start: Float3,
    heading: Float3,
    right: Float3,
    radius_start: f32,
    radius_end: f32,
    height: f32,
    turns: f32,
    samples: u32,
) -> Result<Vec<Float3>, TrackError> {
    let samples = ensure_samples(samples)?;
    let axis = start - right * radius_start;
    Ok((1..=samples)
        .map(|i| {
            let s = i as f32 / samples as f32;
            let angle = s * turns * 2.0 * PI;
            let radius = radius_start + (radius_end - radius_start) * s;
            axis + right * (angle.cos() * radius) + heading * (angle.sin() * radius)
                - Float3::UP * (s * height)
        })
        .collect())
}

/// Expands pieces into one control polyline.
pub fn chain(start: Float3, heading: Float3, pieces: &[Piece]) -> Result<Vec<Float3>, TrackError> {
    let mut heading = flatten(heading).unwrap_or(Float3::BACK);
    let mut points = vec![start];

    for piece in pieces {
        let piece_start = points[points.len() - 1];
        for point in piece.points(piece_start, heading)? {
            if point.distance(points[points.len() - 1]) > DUPLICATE_DISTANCE {
                points.push(point);
            }
        }

        if let [.., a, b] = points.as_slice() {
            if let Some(h) = flatten(*b - *a) {
                heading = h;
            }
        }
    }

    Ok(points)
}

/// Horizontal unit direction, or `None` for (near) vertical input.
fn flatten(direction: Float3) -> Option<Float3> {
    let flat = Float3::new(direction.x, 0.0, direction.z);
    if flat.magnitude() < 1e-4 {
        None
    } else {
        Some(flat.normalize())
    }
}
