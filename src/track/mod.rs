//! Track generation: curve, frames, cross-sections and collision.
//!
//! A [`TrackConfig`] is expanded into control points by [`pieces`], sampled
//! by a centripetal Catmull-Rom [`Spline`], given rotation-minimizing frames
//! by [`FrameBuilder`], and finally turned into static [`ColliderSegment`]s
//! and/or an analytic [`PipeConstraint`].

mod builder;
mod collider;
mod constraint;
mod error;
mod frames;
mod pieces;
mod section;
mod spline;

pub use builder::{Track, TrackConfig};
pub use collider::{emit, ColliderSegment, SegmentKind};
pub use constraint::{Nearest, PipeConstraint, ProgressSearch};
pub use error::TrackError;
pub use frames::{resample, Banking, FrameBuilder};
pub use pieces::{chain, Piece};
pub use section::{CrossSection, Rail};
pub use spline::{Spline, SplinePoint};
