use std::f32::consts::PI;

use crate::sim::{Float3, Frame, Matrix3, Quaternion};

use super::section::CrossSection;
use super::spline::SplinePoint;

/// Chords shorter than this produce no segment.
const MIN_CHORD: f32 = 1e-5;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    Floor = 0,
    LeftWall = 1,
    RightWall = 2,
    Rail = 3,
    Slat = 4,
}

/// A static box collider placed between two adjacent frames.
///
/// Local axes: x along the frame normal (or ring radial for slats),
/// y along the binormal, z along the tangent.
/// C-compatible layout for FFI.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColliderSegment {
    pub position: Float3,
    pub rotation: Quaternion,
    pub half_extents: Float3,
    pub kind: SegmentKind,
    /// Index of the frame pair this segment was emitted for.
    pub ring: u32,
}

impl ColliderSegment {
    fn new(frame: Frame, position: Float3, half_extents: Float3, kind: SegmentKind, ring: u32) -> Self {
        Self {
            position,
            rotation: frame.to_quaternion(),
            half_extents,
            kind,
            ring,
        }
    }

    pub fn basis(&self) -> Matrix3 {
        Matrix3::from_quaternion(self.rotation)
    }

    /// Radius of a sphere around `position` enclosing the box.
    pub fn bounding_radius(&self) -> f32 {
        self.half_extents.magnitude()
    }

    /// World-space point expressed in the box's local axes.
    pub fn to_local(&self, point: Float3) -> Float3 {
        self.basis().transpose().multiply_vector(point - self.position)
    }

    pub fn to_world(&self, local: Float3) -> Float3 {
        self.position + self.basis().multiply_vector(local)
    }

    /// Closest point on or inside the box to `point`.
    pub fn closest_point(&self, point: Float3) -> Float3 {
        let local = self.to_local(point);
        let h = self.half_extents;
        let clamped = Float3::new(
            local.x.clamp(-h.x, h.x),
            local.y.clamp(-h.y, h.y),
            local.z.clamp(-h.z, h.z),
        );
        self.to_world(clamped)
    }
}

/// Emits box colliders for every adjacent frame pair.
///
/// Each segment is oriented by the pair's midpoint frame and stretched to
/// `chord * overlap` so neighbouring segments overlap instead of leaving seams.
/// `Pipe` sections emit nothing.
pub fn emit(frames: &[SplinePoint], section: &CrossSection, overlap: f32) -> Vec<ColliderSegment> {
    let mut result = Vec::new();

    for (ring, pair) in frames.windows(2).enumerate() {
        let (a, b) = (&pair[0], &pair[1]);
        let chord = b.position - a.position;
        let chord_len = chord.magnitude();
        if chord_len < MIN_CHORD {
            continue;
        }

        let mid = a.position.lerp(b.position, 0.5);
        let normal = a.frame.normal.lerp(b.frame.normal, 0.5);
        let frame = Frame::new(chord * (1.0 / chord_len), normal, Float3::ZERO).reorthonormalize();
        let half_len = chord_len * overlap * 0.5;

        emit_ring(&mut result, section, frame, mid, half_len, ring as u32);
    }

    result
}

fn emit_ring(
    out: &mut Vec<ColliderSegment>,
    section: &CrossSection,
    frame: Frame,
    mid: Float3,
    half_len: f32,
    ring: u32,
) {
    match *section {
        CrossSection::Channel {
            width,
            floor_thickness,
            wall_height,
            wall_thickness,
            rail,
        } => {
            let floor_center = mid - frame.normal * (floor_thickness * 0.5);
            out.push(ColliderSegment::new(
                frame,
                floor_center,
                Float3::new(floor_thickness * 0.5, width * 0.5 + wall_thickness, half_len),
                SegmentKind::Floor,
                ring,
            ));

            let lateral = width * 0.5 + wall_thickness * 0.5;
            let wall_half = Float3::new(wall_height * 0.5, wall_thickness * 0.5, half_len);
            for (side, kind) in [(-1.0, SegmentKind::LeftWall), (1.0, SegmentKind::RightWall)] {
                let base = mid + frame.binormal * (side * lateral);
                out.push(ColliderSegment::new(
                    frame,
                    base + frame.normal * (wall_height * 0.5),
                    wall_half,
                    kind,
                    ring,
                ));
                if let Some(rail) = rail {
                    out.push(ColliderSegment::new(
                        frame,
                        base + frame.normal * (wall_height + rail.height * 0.5),
                        Float3::new(rail.height * 0.5, rail.thickness * 0.5, half_len),
                        SegmentKind::Rail,
                        ring,
                    ));
                }
            }
        }
        CrossSection::Cage {
            sides,
            radius,
            wall_thickness,
        } => {
            // Slats span the outer polygon so adjacent slats meet without gaps.
            let half_span = (radius + wall_thickness) * (PI / sides as f32).tan();
            let half_extents = Float3::new(wall_thickness * 0.5, half_span, half_len);
            for k in 0..sides {
                let angle = k as f32 / sides as f32 * 2.0 * PI;
                let (sin, cos) = angle.sin_cos();
                let radial = frame.normal * cos + frame.binormal * sin;
                let slat_frame = Frame::new(frame.tangent, radial, frame.tangent.cross(radial));
                out.push(ColliderSegment::new(
                    slat_frame,
                    mid + radial * (radius + wall_thickness * 0.5),
                    half_extents,
                    SegmentKind::Slat,
                    ring,
                ));
            }
        }
        CrossSection::Pipe { .. } => {}
    }
}
