use std::str::FromStr;

use crate::sim::Float3;
use crate::track::{Banking, CrossSection, Piece, ProgressSearch, Rail, TrackConfig};

use super::{ConfigError, RunConfig};

/// Built-in tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// Open channel with a loop and a corkscrew.
    Luge,
    /// Banked channel spiralling down with rails on the walls.
    Helix,
    /// Wide analytic tube, weaving downhill.
    Pipe,
    /// Slatted tube funnel, guarded by an analytic radius.
    Cage,
    /// Long descending water slide with height-based progress.
    Slide,
}

impl Preset {
    pub const ALL: [Preset; 5] = [
        Preset::Luge,
        Preset::Helix,
        Preset::Pipe,
        Preset::Cage,
        Preset::Slide,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Preset::Luge => "luge",
            Preset::Helix => "helix",
            Preset::Pipe => "pipe",
            Preset::Cage => "cage",
            Preset::Slide => "slide",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Preset::Luge => "open channel with a loop and a corkscrew",
            Preset::Helix => "banked, railed channel spiralling down",
            Preset::Pipe => "analytic tube weaving downhill",
            Preset::Cage => "slatted tube funnel with an analytic guard",
            Preset::Slide => "long water slide with height-based progress",
        }
    }

    pub fn config(self) -> RunConfig {
        let track = match self {
            Preset::Luge => TrackConfig {
                start: Float3::new(0.0, 40.0, 0.0),
                pieces: vec![
                    Piece::Straight {
                        length: 12.0,
                        drop: 4.0,
                    },
                    Piece::Loop {
                        diameter: 10.0,
                        lateral_shift: 4.5,
                        samples: 64,
                    },
                    Piece::Straight {
                        length: 8.0,
                        drop: 2.0,
                    },
                    Piece::Corkscrew {
                        height: 20.0,
                        radius: 5.0,
                        turns: 2.0,
                        samples: 120,
                    },
                    Piece::Straight {
                        length: 10.0,
                        drop: 1.0,
                    },
                ],
                cross_section: channel(None),
                ..Default::default()
            },
            Preset::Helix => TrackConfig {
                start: Float3::new(0.0, 45.0, 0.0),
                pieces: vec![
                    Piece::Straight {
                        length: 6.0,
                        drop: 1.5,
                    },
                    Piece::Corkscrew {
                        height: 30.0,
                        radius: 8.0,
                        turns: 3.0,
                        samples: 180,
                    },
                ],
                cross_section: channel(Some(Rail {
                    height: 0.4,
                    thickness: 0.5,
                })),
                banking: Some(Banking::default()),
                ..Default::default()
            },
            Preset::Pipe => TrackConfig {
                start: Float3::new(0.0, 35.0, 0.0),
                pieces: vec![
                    Piece::Slide {
                        length: 40.0,
                        drop: 15.0,
                        sway: 8.0,
                        waves: 1.5,
                        samples: 32,
                    },
                    Piece::Funnel {
                        radius_start: 10.0,
                        radius_end: 6.0,
                        height: 12.0,
                        turns: 1.5,
                        samples: 90,
                    },
                ],
                cross_section: CrossSection::Pipe { radius: 3.5 },
                bounce: 0.1,
                ..Default::default()
            },
            Preset::Cage => TrackConfig {
                start: Float3::new(0.0, 30.0, 0.0),
                pieces: vec![Piece::Funnel {
                    radius_start: 9.0,
                    radius_end: 3.0,
                    height: 24.0,
                    turns: 2.5,
                    samples: 150,
                }],
                cross_section: CrossSection::Cage {
                    sides: 12,
                    radius: 1.2,
                    wall_thickness: 0.6,
                },
                guard_radius: Some(1.2),
                ..Default::default()
            },
            Preset::Slide => TrackConfig {
                start: Float3::new(0.0, 40.0, 0.0),
                pieces: vec![Piece::Slide {
                    length: 90.0,
                    drop: 32.0,
                    sway: 6.0,
                    waves: 3.0,
                    samples: 48,
                }],
                cross_section: CrossSection::Pipe { radius: 2.5 },
                progress: ProgressSearch::Height,
                ..Default::default()
            },
        };

        RunConfig {
            track,
            ..Default::default()
        }
    }
}

fn channel(rail: Option<Rail>) -> CrossSection {
    CrossSection::Channel {
        width: 3.0,
        floor_thickness: 1.5,
        wall_height: 1.0,
        wall_thickness: 0.5,
        rail,
    }
}

impl FromStr for Preset {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Preset::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                let names: Vec<_> = Preset::ALL.iter().map(|p| p.name()).collect();
                ConfigError::Invalid(format!(
                    "unknown preset '{s}', expected one of: {}",
                    names.join(", ")
                ))
            })
    }
}

impl std::fmt::Display for Preset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
