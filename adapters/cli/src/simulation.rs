use std::{fmt, time::Duration};

use horde_director_core::{
    Command, CrescendoConfig, DirectorState, Event, PlayerSnapshot, RemovalCause, SessionOpening,
    SpecialKind, Species, Stimulus, COMBAT_RADIUS,
};
use horde_director_system_pacing::{Director, DirectorFrame};
use horde_director_world::{self as world, query, World};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::arena;

const GAMEPLAY_SALT: u64 = 0x6a3e_91c7;
const WALK_SPEED: f32 = 1.5;
const HIT_RATE: f32 = 0.4;
const KILL_RATE: f32 = 0.6;
const INCAPACITATE_CHANCE: f64 = 0.02;
const DESPAWN_DISTANCE: f32 = 220.0;
const SAFE_ROOM_STAY: Duration = Duration::from_secs(15);

/// Timeline of the scripted session.
#[derive(Clone, Debug)]
pub(crate) struct Script {
    /// Total simulated time.
    pub(crate) duration: Duration,
    /// Fixed tick length.
    pub(crate) tick: Duration,
    /// When to start the crescendo, if ever.
    pub(crate) crescendo_at: Option<Duration>,
    /// Sequence used for the crescendo.
    pub(crate) crescendo: CrescendoConfig,
    /// When the survivors reach the safe area, if ever.
    pub(crate) safe_room_at: Option<Duration>,
    /// Seed for the arena and the stand-in gameplay.
    pub(crate) seed: u64,
}

/// Aggregated outcome of a session.
#[derive(Debug, Default)]
pub(crate) struct Summary {
    transitions: Vec<(Duration, DirectorState, DirectorState, f32)>,
    time_in_state: [Duration; 7],
    commons: u32,
    specials: [u32; SpecialKind::COUNT],
    bosses: u32,
    rejected: u32,
    killed: u32,
    expired: u32,
    peak_intensity: f32,
    final_state: Option<DirectorState>,
}

/// Drives the world and the director through a scripted session.
pub(crate) struct Simulation {
    world: World,
    director: Director,
    rng: ChaCha8Rng,
    clock: Duration,
    summary: Summary,
}

impl Simulation {
    /// Builds the arena and opens the session.
    pub(crate) fn new(director: Director, seed: u64) -> Self {
        let mut simulation = Self {
            world: World::new(),
            director,
            rng: ChaCha8Rng::seed_from_u64(seed ^ GAMEPLAY_SALT),
            clock: Duration::ZERO,
            summary: Summary::default(),
        };
        for command in arena::generate(seed) {
            simulation.submit(command);
        }
        info!(
            markers = query::spawn_markers(&simulation.world).len(),
            occluders = query::occluders(&simulation.world).len(),
            "arena generated"
        );
        simulation
    }

    /// Runs the script to completion and returns the summary.
    pub(crate) fn run(mut self, script: &Script) -> Summary {
        self.submit(Command::StartSession {
            opening: SessionOpening::Relax,
        });

        let safe_room_exit = script.safe_room_at.map(|at| at + SAFE_ROOM_STAY);
        while self.clock < script.duration {
            let before = self.clock;
            let now = before + script.tick;
            self.clock = now;
            let crossed = |at: Option<Duration>| at.is_some_and(|at| before < at && at <= now);

            if crossed(script.crescendo_at) {
                self.submit(Command::StartCrescendo {
                    config: script.crescendo.clone(),
                });
            }
            if crossed(script.safe_room_at) {
                self.submit(Command::EnterSafeArea);
            }
            if crossed(safe_room_exit) {
                self.submit(Command::ExitSafeArea);
            }

            self.walk(script.tick);
            self.submit(Command::Tick { dt: script.tick });
            self.play(script.tick);

            let state = self.director.state();
            self.summary.time_in_state[state_index(state)] += script.tick;
        }

        self.submit(Command::EndSession);
        self.summary.final_state = Some(self.director.state());
        self.summary
    }

    fn walk(&mut self, dt: Duration) {
        if self.director.state() == DirectorState::SafeRoom {
            return;
        }
        let players: Vec<PlayerSnapshot> =
            query::players(&self.world).iter().copied().collect();
        for mut player in players {
            player.position += player.forward * WALK_SPEED * dt.as_secs_f32();
            self.submit(Command::PlacePlayer { player });
        }
    }

    /// Stand-in gameplay: nearby enemies hurt the survivors and get shot,
    /// distant ones despawn.
    fn play(&mut self, dt: Duration) {
        let seconds = dt.as_secs_f32();
        let players = query::players(&self.world);
        let mut commands = Vec::new();

        for actor in query::actors(&self.world) {
            let nearest = players
                .iter()
                .map(|player| player.position.distance(actor.position))
                .fold(f32::INFINITY, f32::min);

            if nearest > DESPAWN_DISTANCE {
                commands.push(Command::RemoveActor {
                    actor: actor.id,
                    cause: RemovalCause::Expired,
                });
                continue;
            }
            if nearest > COMBAT_RADIUS {
                continue;
            }
            if self.rng.gen::<f32>() < HIT_RATE * seconds {
                let amount = self.rng.gen_range(2.0..10.0);
                commands.push(Command::ReportStimulus {
                    stimulus: Stimulus::DamageTaken { amount },
                });
                if self.rng.gen_bool(INCAPACITATE_CHANCE) {
                    commands.push(Command::ReportStimulus {
                        stimulus: Stimulus::Incapacitated,
                    });
                }
            }
            if self.rng.gen::<f32>() < KILL_RATE * seconds {
                commands.push(Command::RemoveActor {
                    actor: actor.id,
                    cause: RemovalCause::Killed,
                });
                commands.push(Command::ReportStimulus {
                    stimulus: Stimulus::NearbyKill,
                });
            }
        }

        for command in commands {
            self.submit(command);
        }
    }

    fn submit(&mut self, command: Command) {
        let mut events = Vec::new();
        world::apply(&mut self.world, command, &mut events);
        self.pump(events);
    }

    fn pump(&mut self, mut events: Vec<Event>) {
        while !events.is_empty() {
            let mut sightings = Vec::new();
            for event in &events {
                if let Event::ActorSpawned {
                    species: Species::Special(_) | Species::Boss,
                    ..
                } = event
                {
                    sightings.push(Command::ReportStimulus {
                        stimulus: Stimulus::SpecialSighted,
                    });
                }
                self.summary.record_world(event);
            }

            let players = query::players(&self.world);
            let frame = DirectorFrame {
                players: &players,
                spawn_markers: query::spawn_markers(&self.world),
                in_combat: query::combat_engaged(&self.world, COMBAT_RADIUS),
            };
            let mut commands = Vec::new();
            let mut notifications = Vec::new();
            self.director.handle(
                &events,
                &frame,
                |from, to| query::is_occluded(&self.world, from, to),
                &mut commands,
                &mut notifications,
            );
            for notification in &notifications {
                self.summary.record_director(self.clock, notification);
            }

            events.clear();
            for command in commands.into_iter().chain(sightings) {
                world::apply(&mut self.world, command, &mut events);
            }
        }
    }
}

impl Summary {
    fn record_world(&mut self, event: &Event) {
        match event {
            Event::ActorSpawned { species, .. } => match species {
                Species::Common => self.commons += 1,
                Species::Special(kind) => self.specials[kind.index()] += 1,
                Species::Boss => self.bosses += 1,
            },
            Event::SpawnRejected { .. } => self.rejected += 1,
            Event::ActorRemoved { cause, .. } => match cause {
                RemovalCause::Killed => self.killed += 1,
                RemovalCause::Expired => self.expired += 1,
            },
            _ => {}
        }
    }

    fn record_director(&mut self, clock: Duration, event: &Event) {
        match event {
            Event::DirectorStateChanged {
                from,
                to,
                intensity,
            } => {
                debug!(at = clock.as_secs_f32(), %from, %to, intensity, "transition");
                self.transitions.push((clock, *from, *to, *intensity));
            }
            Event::IntensityChanged { value, .. } => {
                self.peak_intensity = self.peak_intensity.max(*value);
            }
            _ => {}
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "transitions:")?;
        for (at, from, to, intensity) in &self.transitions {
            writeln!(
                f,
                "  {:>8.2}s  {from} -> {to} (intensity {intensity:.1})",
                at.as_secs_f32()
            )?;
        }

        writeln!(f, "time in state:")?;
        for state in ALL_STATES {
            let spent = self.time_in_state[state_index(state)];
            if !spent.is_zero() {
                writeln!(f, "  {state:<13} {:>8.2}s", spent.as_secs_f32())?;
            }
        }

        writeln!(f, "spawned:")?;
        writeln!(f, "  common        {}", self.commons)?;
        for kind in SpecialKind::ALL {
            let label = format!("{kind:?}").to_lowercase();
            writeln!(f, "  {label:<13} {}", self.specials[kind.index()])?;
        }
        writeln!(f, "  boss          {}", self.bosses)?;
        writeln!(f, "rejected spawns: {}", self.rejected)?;
        writeln!(f, "removed: {} killed, {} expired", self.killed, self.expired)?;
        writeln!(f, "peak intensity: {:.1}", self.peak_intensity)?;
        match self.final_state {
            Some(state) => write!(f, "final state: {state}"),
            None => write!(f, "final state: unknown"),
        }
    }
}

const ALL_STATES: [DirectorState; 7] = [
    DirectorState::Idle,
    DirectorState::BuildUp,
    DirectorState::SustainPeak,
    DirectorState::PeakFade,
    DirectorState::Relax,
    DirectorState::Crescendo,
    DirectorState::SafeRoom,
];

fn state_index(state: DirectorState) -> usize {
    match state {
        DirectorState::Idle => 0,
        DirectorState::BuildUp => 1,
        DirectorState::SustainPeak => 2,
        DirectorState::PeakFade => 3,
        DirectorState::Relax => 4,
        DirectorState::Crescendo => 5,
        DirectorState::SafeRoom => 6,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use horde_director_system_pacing::DirectorConfig;

    fn script(seed: u64) -> Script {
        Script {
            duration: Duration::from_secs(240),
            tick: Duration::from_millis(100),
            crescendo_at: Some(Duration::from_secs(60)),
            crescendo: CrescendoConfig::default(),
            safe_room_at: Some(Duration::from_secs(200)),
            seed,
        }
    }

    fn run(seed: u64) -> Summary {
        let director = Director::new(DirectorConfig {
            seed,
            ..DirectorConfig::default()
        })
        .expect("default config");
        Simulation::new(director, seed).run(&script(seed))
    }

    #[test]
    fn scripted_session_visits_the_overrides() {
        let summary = run(4);
        let entered: Vec<DirectorState> =
            summary.transitions.iter().map(|entry| entry.2).collect();
        assert!(entered.contains(&DirectorState::Crescendo));
        assert!(entered.contains(&DirectorState::SafeRoom));
        assert_eq!(summary.final_state, Some(DirectorState::Idle));
        assert!(summary.commons > 0, "crescendo waves should place commons");
    }

    #[test]
    fn identical_seeds_print_identical_summaries() {
        assert_eq!(run(12).to_string(), run(12).to_string());
    }
}
