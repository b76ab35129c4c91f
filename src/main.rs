use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;

use marblerun::config::{Preset, RunConfig};
use marblerun::sim::Elimination;
use marblerun::track::{SegmentKind, Track};
use marblerun::world::World;

#[derive(Parser)]
#[command(
    name = "marblerun",
    about = "Procedural marble-run tracks and races",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Simulate a race and print the standings
    Race {
        #[command(flatten)]
        source: Source,
        /// Number of marbles to drop
        #[arg(long, default_value_t = 8)]
        marbles: u32,
        /// Maximum race time in seconds
        #[arg(long, default_value_t = 60.0)]
        seconds: f32,
        /// Seed for spawn jitter
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
    /// Build a track and print a summary
    Inspect {
        #[command(flatten)]
        source: Source,
    },
    /// List built-in presets
    Presets,
}

#[derive(Args)]
struct Source {
    /// TOML run configuration
    #[arg(long, conflicts_with = "preset")]
    config: Option<PathBuf>,
    /// Built-in preset name
    #[arg(long)]
    preset: Option<String>,
}

impl Source {
    fn load(&self) -> Result<RunConfig> {
        match (&self.config, &self.preset) {
            (Some(path), _) => RunConfig::load(path)
                .with_context(|| format!("loading config {}", path.display())),
            (None, Some(name)) => Ok(name.parse::<Preset>()?.config()),
            (None, None) => Ok(Preset::Luge.config()),
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Command::Race {
            source,
            marbles,
            seconds,
            seed,
        } => race(&source.load()?, marbles, seconds, seed),
        Command::Inspect { source } => inspect(&source.load()?),
        Command::Presets => {
            for preset in Preset::ALL {
                println!("{:<8} {}", preset.name(), preset.description());
            }
            Ok(())
        }
    }
}

fn race(config: &RunConfig, marbles: u32, seconds: f32, seed: u64) -> Result<()> {
    let mut world = World::from_config(config).context("building world")?;
    let mut rng = StdRng::seed_from_u64(seed);

    // Release marbles one frame apart so they do not spawn inside each other.
    for _ in 0..marbles {
        world.spawn(&mut rng);
        world.step(config.physics.fixed_dt);
    }
    world.run_until(seconds);

    let standings = world.standings();
    println!("Finished ({}):", standings.finished_count());
    for (place, &(id, time)) in standings.finishers().iter().enumerate() {
        println!("  {:>2}. marble {:<3} {:>7.2}s", place + 1, id, time);
    }

    if standings.eliminated_count() > 0 {
        println!("Eliminated ({}):", standings.eliminated_count());
        for &(id, reason) in standings.eliminated() {
            let reason = match reason {
                Elimination::Fell => "fell",
                Elimination::Stalled => "stalled",
            };
            println!("      marble {:<3} {}", id, reason);
        }
    }

    let racing = world.racing_count();
    if racing > 0 {
        println!("Still racing after {:.1}s: {}", world.time(), racing);
    }
    Ok(())
}

fn inspect(config: &RunConfig) -> Result<()> {
    let track = Track::build(&config.track).context("building track")?;

    println!("length       {:.2} m", track.length());
    println!("frames       {}", track.frames().len());
    println!("colliders    {}", track.colliders().len());
    for kind in [
        SegmentKind::Floor,
        SegmentKind::LeftWall,
        SegmentKind::RightWall,
        SegmentKind::Rail,
        SegmentKind::Slat,
    ] {
        let count = track.colliders().iter().filter(|c| c.kind == kind).count();
        if count > 0 {
            println!("  {:<10} {}", format!("{kind:?}"), count);
        }
    }
    match track.constraint() {
        Some(constraint) => println!("pipe radius  {:.2} m", constraint.radius()),
        None => println!("pipe radius  -"),
    }
    println!("max bank     {:.1} deg", track.max_bank().to_degrees());
    println!(
        "height       {:.2} m -> {:.2} m",
        track.start_position().y,
        track.end_position().y
    );

    let dt = config.physics.substep_dt();
    if let Some(thickness) = track.tunneling_hazard(config.physics.max_speed, dt) {
        println!(
            "warning      walls {:.2} m thick, {:.2} m needed at {:.0} m/s",
            thickness,
            config.physics.max_speed * dt,
            config.physics.max_speed
        );
    }
    Ok(())
}
