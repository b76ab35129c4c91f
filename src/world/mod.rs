//! Simulation context.
//!
//! A [`World`] owns one track, its marbles and the race clock. Each call to
//! [`World::step`] runs a fixed number of sub-steps; after every sub-step the
//! pipe constraint, the speed cap and the race judge are applied.

mod spawn;
mod stepper;

pub use spawn::SpawnConfig;
pub use stepper::{SphereStepper, Stepper};

use rand::Rng;

use crate::config::{ConfigError, RunConfig};
use crate::race::{Judge, RaceRules, Standings};
use crate::sim::{cap_speed, Marble, MarbleState, PhysicsParams};
use crate::track::Track;

pub struct World<S: Stepper = SphereStepper> {
    track: Track,
    params: PhysicsParams,
    rules: RaceRules,
    judge: Judge,
    spawn: SpawnConfig,
    stepper: S,
    marbles: Vec<Marble>,
    standings: Standings,
    time: f32,
    next_id: u32,
}

impl World<SphereStepper> {
    pub fn new(track: Track, params: PhysicsParams, rules: RaceRules, spawn: SpawnConfig) -> Self {
        Self::with_stepper(track, params, rules, spawn, SphereStepper::new())
    }

    /// Builds the track described by `config` and an empty world around it.
    pub fn from_config(config: &RunConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let track = Track::build(&config.track)?;
        Ok(Self::new(track, config.physics, config.race, config.spawn))
    }
}

impl<S: Stepper> World<S> {
    pub fn with_stepper(
        track: Track,
        params: PhysicsParams,
        rules: RaceRules,
        spawn: SpawnConfig,
        stepper: S,
    ) -> Self {
        if let Some(thickness) = track.tunneling_hazard(params.max_speed, params.substep_dt()) {
            log::warn!(
                "walls {:.3} m thick can be tunneled at {:.1} m/s with a {:.4} s sub-step; \
                 use thicker walls, more sub-steps or a lower max speed",
                thickness,
                params.max_speed,
                params.substep_dt()
            );
        }

        let judge = rules.resolve(&track);
        Self {
            track,
            params,
            rules,
            judge,
            spawn,
            stepper,
            marbles: Vec::new(),
            standings: Standings::new(),
            time: 0.0,
            next_id: 0,
        }
    }

    /// Drops a new marble at the track start. Returns its id.
    pub fn spawn<R: Rng + ?Sized>(&mut self, rng: &mut R) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        let marble = self.spawn.place(id, &self.track, rng);
        log::debug!("spawned marble {} at {:?}", id, marble.position);
        self.marbles.push(marble);
        id
    }

    /// Adds an already placed marble, replacing its id. Returns the id.
    pub fn insert(&mut self, mut marble: Marble) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        marble.id = id;
        self.marbles.push(marble);
        id
    }

    /// Advances the simulation by `frame_dt` seconds.
    pub fn step(&mut self, frame_dt: f32) {
        if !(frame_dt > 0.0 && frame_dt.is_finite()) {
            return;
        }

        let substeps = self.params.substeps();
        let dt = frame_dt / substeps as f32;

        for _ in 0..substeps {
            self.stepper
                .step(&mut self.marbles, self.track.colliders(), &self.params, dt);

            for marble in self.marbles.iter_mut().filter(|m| m.is_racing()) {
                if let Some(constraint) = self.track.constraint() {
                    constraint.enforce(marble);
                }
                marble.velocity = cap_speed(marble.velocity, self.params.max_speed);
            }

            self.time += dt;
            for marble in &mut self.marbles {
                if let Some(status) = self.judge.update(marble, self.time, dt) {
                    log::debug!("marble {} is now {:?} at {:.2}s", marble.id, status, self.time);
                    self.standings.record(marble.id, status);
                }
            }
        }
    }

    /// Steps at the fixed rate until every marble is done or `max_time` is reached.
    pub fn run_until(&mut self, max_time: f32) -> &Standings {
        while self.time < max_time && !self.is_finished() {
            self.step(self.params.fixed_dt);
        }
        log::info!(
            "race stopped at {:.2}s: {} finished, {} eliminated, {} still racing",
            self.time,
            self.standings.finished_count(),
            self.standings.eliminated_count(),
            self.racing_count()
        );
        &self.standings
    }

    /// Removes all marbles and restarts the clock.
    pub fn reset(&mut self) {
        self.marbles.clear();
        self.standings.clear();
        self.time = 0.0;
        self.next_id = 0;
    }

    pub fn snapshot(&self) -> Vec<MarbleState> {
        self.marbles.iter().map(Marble::state).collect()
    }

    /// True once at least one marble exists and none is still racing.
    pub fn is_finished(&self) -> bool {
        !self.marbles.is_empty() && self.marbles.iter().all(|m| m.status.is_terminal())
    }

    pub fn racing_count(&self) -> usize {
        self.marbles.iter().filter(|m| m.is_racing()).count()
    }

    pub fn marbles(&self) -> &[Marble] {
        &self.marbles
    }

    pub fn track(&self) -> &Track {
        &self.track
    }

    pub fn params(&self) -> &PhysicsParams {
        &self.params
    }

    pub fn rules(&self) -> &RaceRules {
        &self.rules
    }

    pub fn judge(&self) -> &Judge {
        &self.judge
    }

    pub fn standings(&self) -> &Standings {
        &self.standings
    }

    pub fn stepper(&self) -> &S {
        &self.stepper
    }

    /// Race time in seconds.
    pub fn time(&self) -> f32 {
        self.time
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{Float3, MarbleStatus};
    use crate::track::{CrossSection, Piece, TrackConfig};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn pipe_world() -> World {
        let track = Track::build(&TrackConfig {
            start: Float3::new(0.0, 12.0, 0.0),
            pieces: vec![Piece::Straight {
                length: 20.0,
                drop: 10.0,
            }],
            cross_section: CrossSection::Pipe { radius: 1.0 },
            ..Default::default()
        })
        .unwrap();
        World::new(
            track,
            PhysicsParams::default(),
            RaceRules::default(),
            SpawnConfig::default(),
        )
    }

    fn channel_world() -> World {
        let track = Track::build(&TrackConfig {
            start: Float3::new(0.0, 10.0, 0.0),
            pieces: vec![Piece::Straight {
                length: 20.0,
                drop: 5.0,
            }],
            cross_section: CrossSection::Channel {
                width: 2.0,
                floor_thickness: 1.0,
                wall_height: 1.0,
                wall_thickness: 1.0,
                rail: None,
            },
            ..Default::default()
        })
        .unwrap();
        World::new(
            track,
            PhysicsParams::default(),
            RaceRules::default(),
            SpawnConfig::default(),
        )
    }

    #[test]
    fn marbles_stay_inside_the_pipe() {
        let mut world = pipe_world();
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..4 {
            world.spawn(&mut rng);
        }

        let constraint = world.track().constraint().unwrap().clone();
        for _ in 0..240 {
            world.step(world.params().fixed_dt);
            for marble in world.marbles().iter().filter(|m| m.is_racing()) {
                let found = constraint.nearest(marble.position, None);
                assert!(found.distance <= constraint.radius() - marble.radius + 1e-3);
            }
        }
    }

    /// Throws every racing marble sideways out of the pipe, recording what it saw first.
    #[derive(Default)]
    struct Kicker {
        seen: Vec<(Float3, f32)>,
    }

    impl Stepper for Kicker {
        fn step(
            &mut self,
            marbles: &mut [Marble],
            _colliders: &[crate::track::ColliderSegment],
            _params: &PhysicsParams,
            _dt: f32,
        ) {
            for marble in marbles.iter_mut().filter(|m| m.is_racing()) {
                self.seen.push((marble.position, marble.speed()));
                marble.position += Float3::RIGHT * 5.0;
                marble.velocity = Float3::RIGHT * 100.0;
            }
        }
    }

    #[test]
    fn constraint_and_cap_run_after_every_substep() {
        let source = pipe_world();
        let track = source.track().clone();
        let constraint = track.constraint().unwrap().clone();
        let params = PhysicsParams {
            substeps: 4,
            ..Default::default()
        };
        let mut world = World::with_stepper(
            track,
            params,
            RaceRules::default(),
            SpawnConfig::default(),
            Kicker::default(),
        );
        let start = world.track().start_position();
        world.insert(Marble::new(0, start, 0.2));

        world.step(params.fixed_dt);

        let seen = &world.stepper().seen;
        assert_eq!(seen.len(), 4);
        for &(position, speed) in &seen[1..] {
            let found = constraint.nearest(position, None);
            assert!(found.distance <= constraint.radius() - 0.2 + 1e-3);
            assert!(speed <= params.max_speed + 1e-3);
        }
    }

    #[test]
    fn speed_never_exceeds_cap() {
        let mut world = pipe_world();
        let marble = Marble::new(0, world.track().start_position(), 0.2)
            .with_velocity(Float3::new(0.0, -48.0, -64.0));
        world.insert(marble);

        world.step(world.params().fixed_dt);
        assert!(world.marbles()[0].speed() <= 50.0 + 1e-3);
    }

    #[test]
    fn marble_finishes_a_pipe_run() {
        let mut world = pipe_world();
        world.spawn(&mut StdRng::seed_from_u64(11));

        let standings = world.run_until(15.0);
        assert_eq!(standings.finish_order().collect::<Vec<_>>(), vec![0]);
        assert!(world.is_finished());
        assert!(matches!(world.marbles()[0].status, MarbleStatus::Finished { .. }));
    }

    #[test]
    fn marble_rolls_down_a_channel() {
        let mut world = channel_world();
        let start = world.track().start_position();
        world.spawn(&mut StdRng::seed_from_u64(5));

        for _ in 0..120 {
            world.step(world.params().fixed_dt);
        }

        let marble = &world.marbles()[0];
        assert!(marble.is_racing());
        assert!(marble.position.z < start.z - 1.0);
        assert!(marble.position.y > world.track().lowest_point());
        assert!(marble.angular_velocity.magnitude() > 0.0);
    }

    #[test]
    fn reset_clears_marbles_and_clock() {
        let mut world = pipe_world();
        world.spawn(&mut StdRng::seed_from_u64(1));
        world.step(0.1);
        world.reset();

        assert!(world.marbles().is_empty());
        assert_eq!(world.time(), 0.0);
        assert_eq!(world.standings(), &Standings::new());
        assert_eq!(world.spawn(&mut StdRng::seed_from_u64(1)), 0);
    }

    #[test]
    fn snapshot_reports_every_marble() {
        let mut world = pipe_world();
        let mut rng = StdRng::seed_from_u64(2);
        world.spawn(&mut rng);
        world.spawn(&mut rng);

        let snapshot = world.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[1].id, 1);
        assert_eq!(snapshot[0].status, 0);
    }

    #[test]
    fn non_positive_step_is_ignored() {
        let mut world = pipe_world();
        world.spawn(&mut StdRng::seed_from_u64(1));
        let before = world.marbles()[0].clone();
        world.step(0.0);
        world.step(f32::NAN);
        assert_eq!(world.marbles()[0], before);
        assert_eq!(world.time(), 0.0);
    }
}
