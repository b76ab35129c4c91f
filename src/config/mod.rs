//! TOML run configuration and built-in presets.

mod preset;

pub use preset::Preset;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::race::RaceRules;
use crate::sim::{physics, PhysicsParams};
use crate::track::{TrackConfig, TrackError};
use crate::world::SpawnConfig;

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(toml::de::Error),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "Cannot read {}: {source}", path.display())
            }
            ConfigError::Parse(err) => write!(f, "Invalid TOML: {err}"),
            ConfigError::Invalid(reason) => write!(f, "Invalid configuration: {reason}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Parse(err) => Some(err),
            ConfigError::Invalid(_) => None,
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Parse(err)
    }
}

impl From<TrackError> for ConfigError {
    fn from(err: TrackError) -> Self {
        ConfigError::Invalid(err.to_string())
    }
}

/// Everything needed to build a world: track, physics, race rules and spawning.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub track: TrackConfig,
    pub physics: PhysicsParams,
    pub race: RaceRules,
    pub spawn: SpawnConfig,
}

impl RunConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: RunConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("loaded run config from {}", path.display());
        Self::from_toml_str(&text)
    }

    /// Checks values that would otherwise be clamped or produce a broken world.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.track.validate()?;

        let params = &self.physics;
        if !(params.fixed_dt > 0.0 && params.fixed_dt.is_finite()) {
            return Err(invalid("physics.fixed_dt must be positive"));
        }
        if !(1..=physics::MAX_SUBSTEPS).contains(&params.substeps) {
            return Err(ConfigError::Invalid(format!(
                "physics.substeps must be between 1 and {}, got {}",
                physics::MAX_SUBSTEPS,
                params.substeps
            )));
        }
        if !(params.max_speed > 0.0) {
            return Err(invalid("physics.max_speed must be positive"));
        }
        if !params.gravity.is_finite() {
            return Err(invalid("physics.gravity must be finite"));
        }
        ensure_unit("physics.restitution", params.restitution)?;
        ensure_unit("physics.marble_restitution", params.marble_restitution)?;
        ensure_non_negative("physics.friction", params.friction)?;
        ensure_non_negative("physics.linear_damping", params.linear_damping)?;

        let radius = self.spawn.marble_radius;
        if !(radius > 0.0) {
            return Err(invalid("spawn.marble_radius must be positive"));
        }
        let room = self.track.cross_section.half_width();
        let room = self.track.guard_radius.map_or(room, |guard| guard.min(room));
        if radius >= room {
            return Err(ConfigError::Invalid(format!(
                "marble radius {radius} does not fit a track {room} wide"
            )));
        }

        let race = &self.race;
        if !(race.finish_radius > 0.0 && race.finish_radius.is_finite()) {
            return Err(invalid("race.finish_radius must be positive"));
        }
        if race.finish_center.is_some_and(|center| !center.is_finite()) {
            return Err(invalid("race.finish_center must be finite"));
        }
        if !(race.stall_timeout > 0.0 && race.stall_timeout.is_finite()) {
            return Err(invalid("race.stall_timeout must be positive"));
        }
        ensure_non_negative("race.fall_margin", race.fall_margin)?;
        ensure_non_negative("race.stall_distance", race.stall_distance)?;

        let spawn = &self.spawn;
        ensure_non_negative("spawn.jitter", spawn.jitter)?;
        ensure_non_negative("spawn.drop_height", spawn.drop_height)?;
        if !spawn.initial_speed.is_finite() {
            return Err(invalid("spawn.initial_speed must be finite"));
        }
        Ok(())
    }
}

fn invalid(reason: &str) -> ConfigError {
    ConfigError::Invalid(reason.to_string())
}

fn ensure_unit(name: &str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!("{name} must be between 0 and 1, got {value}")))
    }
}

fn ensure_non_negative(name: &str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!("{name} must be finite and non-negative, got {value}")))
    }
}
