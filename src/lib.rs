//! marblerun - procedural marble-run tracks and race simulation.
//!
//! # Architecture
//!
//! Layered modules with inward-only dependencies:
//!
//! - **sim**: Math primitives (Float3, Quaternion, Frame), physics constants, marbles
//! - **track**: Curve sampling, frames, cross-sections, colliders, pipe constraint
//! - **race**: Status transitions and standings
//! - **world**: Simulation context and the sphere stepper
//! - **config**: TOML run configuration and presets
//! - **ffi**: C FFI bindings
//!
//! # Usage
//!
//! ```no_run
//! use marblerun::{config::Preset, world::World};
//! use rand::SeedableRng;
//!
//! let mut world = World::from_config(&Preset::Pipe.config()).unwrap();
//! world.spawn(&mut rand::rngs::StdRng::seed_from_u64(1));
//! world.run_until(30.0);
//! ```
//!
//! For C/C#/Unity, link the cdylib and use `mr_*` FFI functions.

pub mod config;
pub mod race;
pub mod sim;
pub mod track;
pub mod world;

#[cfg(feature = "ffi")]
pub mod ffi;

// Re-export commonly used types at crate root
pub use config::{ConfigError, Preset, RunConfig};
pub use sim::{Float3, Frame, Marble, MarbleStatus, Quaternion};
pub use track::{Track, TrackConfig, TrackError};
pub use world::World;
