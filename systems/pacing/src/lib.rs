#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Director state machine that paces hostile spawns around player stress.
//!
//! The [`Director`] consumes the events broadcast by the world, folds them
//! into its intensity tracker, population gate and crescendo scheduler, and
//! responds with [`Command::SpawnActor`] requests plus notification events.
//! One director exists per session; nothing is global.

mod config;

use std::time::Duration;

use horde_director_core::{
    duration_from_secs, Command, CrescendoConfig, DirectorSnapshot, DirectorState, Event,
    PlayerView, SessionOpening, SpawnPoint, SpecialKind, Species, Vec3,
};
use horde_director_system_crescendo::{CrescendoRequest, CrescendoScheduler};
use horde_director_system_intensity::IntensityTracker;
use horde_director_system_population::PopulationGate;
use horde_director_system_spawn_selection::SpawnPointSelector;
use rand::{seq::SliceRandom, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

pub use config::{ConfigError, DirectorConfig, PacingConfig};

const PACING_STREAM: u64 = 1;
const POPULATION_STREAM: u64 = 2;
const SELECTION_STREAM: u64 = 3;
const CRESCENDO_STREAM: u64 = 4;

/// Immutable per-tick inputs the director reads from the world.
#[derive(Clone, Copy, Debug)]
pub struct DirectorFrame<'a> {
    /// Connected players sorted by identifier.
    pub players: &'a PlayerView,
    /// Static spawn markers of the map.
    pub spawn_markers: &'a [SpawnPoint],
    /// Whether any hostile actor is within combat range of any player.
    pub in_combat: bool,
}

#[derive(Clone, Copy, Debug)]
struct FrozenPacing {
    state: DirectorState,
    timer: Duration,
}

/// Per-session pacing director.
#[derive(Debug)]
pub struct Director {
    pacing: PacingConfig,
    intensity: IntensityTracker,
    population: PopulationGate,
    selector: SpawnPointSelector,
    crescendo: CrescendoScheduler,
    rng: ChaCha8Rng,
    state: DirectorState,
    state_timer: Duration,
    frozen: Option<FrozenPacing>,
}

impl Director {
    /// Creates an idle director from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the configuration is inconsistent.
    pub fn new(config: DirectorConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let profile = *config.difficulty.profile(config.tier);
        info!(
            tier = ?config.tier,
            seed = config.seed,
            special_cap = profile.special_cap,
            "director created"
        );
        Ok(Self {
            pacing: config.pacing,
            intensity: IntensityTracker::new(config.intensity),
            population: PopulationGate::new(
                config.population,
                profile,
                stream_seed(config.seed, POPULATION_STREAM),
            ),
            selector: SpawnPointSelector::new(
                config.selection,
                stream_seed(config.seed, SELECTION_STREAM),
            ),
            crescendo: CrescendoScheduler::new(stream_seed(config.seed, CRESCENDO_STREAM)),
            rng: ChaCha8Rng::seed_from_u64(stream_seed(config.seed, PACING_STREAM)),
            state: DirectorState::Idle,
            state_timer: Duration::ZERO,
            frozen: None,
        })
    }

    /// Consumes world events and emits spawn commands and notifications.
    ///
    /// Lifecycle events and stimuli are applied in arrival order, then decay
    /// for the accumulated time, then at most one pacing transition, and
    /// finally spawning. Stimuli observed while idle are dropped. `is_occluded(from, to)` answers whether geometry
    /// blocks the segment between two points.
    pub fn handle<F>(
        &mut self,
        events: &[Event],
        frame: &DirectorFrame<'_>,
        is_occluded: F,
        out_commands: &mut Vec<Command>,
        out_events: &mut Vec<Event>,
    ) where
        F: Fn(Vec3, Vec3) -> bool,
    {
        let mut dt = Duration::ZERO;
        for event in events {
            match event {
                Event::TimeAdvanced { dt: step } => dt = dt.saturating_add(*step),
                Event::StimulusObserved { stimulus } => {
                    if self.state != DirectorState::Idle {
                        let delta = self.intensity.add(*stimulus);
                        self.publish_intensity(delta, out_events);
                    }
                }
                Event::SessionStarted { opening } => self.start_session(*opening, out_events),
                Event::SessionEnded => self.end_session(out_events),
                Event::SafeAreaEntered => self.enter_safe_room(out_events),
                Event::SafeAreaExited => self.exit_safe_room(out_events),
                Event::CrescendoRequested { config } => {
                    self.start_crescendo(config.clone(), out_events);
                }
                Event::CrescendoCancelled => self.cancel_crescendo(out_events),
                Event::SpawnRejected {
                    species, reason, ..
                } => {
                    debug!(?species, ?reason, "spawn rejected; releasing population slot");
                    self.population.record_death_or_expiry(*species);
                }
                Event::ActorRemoved { species, .. } => {
                    self.population.record_death_or_expiry(*species);
                }
                _ => {}
            }
        }

        if self.state == DirectorState::Idle {
            return;
        }

        let delta = self.intensity.decay(dt, frame.in_combat);
        self.publish_intensity(delta, out_events);

        self.selector.advance(dt);
        let requests = self.advance_state(dt, out_events);

        if self.state.permits_spawning() || !requests.is_empty() {
            let _ = self.selector.refresh_if_due(frame.spawn_markers);
        }
        if self.state.permits_spawning() {
            self.population.advance(dt);
            self.spawn_paced(frame.players, &is_occluded, out_commands);
        }
        for request in requests {
            self.fulfil_crescendo(request, frame.players, &is_occluded, out_commands);
        }
    }

    /// Publishes the read-only facts of the director.
    #[must_use]
    pub fn snapshot(&self) -> DirectorSnapshot {
        DirectorSnapshot {
            state: self.state,
            intensity: self.intensity.value(),
        }
    }

    /// Active pacing state.
    #[must_use]
    pub fn state(&self) -> DirectorState {
        self.state
    }

    /// Time left on the timer of the active state.
    #[must_use]
    pub fn state_timer(&self) -> Duration {
        self.state_timer
    }

    /// Population counters and cooldowns.
    #[must_use]
    pub fn population(&self) -> &PopulationGate {
        &self.population
    }

    /// Crescendo scheduler.
    #[must_use]
    pub fn crescendo(&self) -> &CrescendoScheduler {
        &self.crescendo
    }

    fn advance_state(&mut self, dt: Duration, out_events: &mut Vec<Event>) -> Vec<CrescendoRequest> {
        let intensity = self.intensity.value();
        let threshold = self.pacing.peak_threshold;
        match self.state {
            DirectorState::Idle | DirectorState::SafeRoom => {}
            DirectorState::BuildUp => {
                if intensity >= threshold {
                    let timer = self.pacing.sustain_peak.sample(&mut self.rng, 1.0);
                    self.transition(DirectorState::SustainPeak, timer, out_events);
                }
            }
            DirectorState::SustainPeak => {
                self.state_timer = self.state_timer.saturating_sub(dt);
                if self.state_timer.is_zero() {
                    self.transition(DirectorState::PeakFade, Duration::ZERO, out_events);
                }
            }
            DirectorState::PeakFade => {
                if intensity < threshold / 2.0 {
                    let timer = self.relax_timer();
                    self.transition(DirectorState::Relax, timer, out_events);
                }
            }
            DirectorState::Relax => {
                self.state_timer = self.state_timer.saturating_sub(dt);
                if self.state_timer.is_zero() {
                    self.transition(DirectorState::BuildUp, Duration::ZERO, out_events);
                }
            }
            DirectorState::Crescendo => {
                let tick = self.crescendo.tick(dt);
                if tick.completed {
                    self.resume_after_crescendo(out_events);
                }
                return tick.requests;
            }
        }
        Vec::new()
    }

    fn start_session(&mut self, opening: SessionOpening, out_events: &mut Vec<Event>) {
        if self.state != DirectorState::Idle {
            debug!(state = %self.state, "session already running; start ignored");
            return;
        }
        info!(?opening, "session started");
        self.population.restart_timers();
        self.selector.invalidate();
        let timer = match opening {
            SessionOpening::Relax => self.relax_timer(),
            SessionOpening::BuildUp => Duration::ZERO,
        };
        self.transition(opening.state(), timer, out_events);
    }

    fn end_session(&mut self, out_events: &mut Vec<Event>) {
        if self.state == DirectorState::Idle {
            return;
        }
        info!(state = %self.state, "session ended");
        let _ = self.crescendo.cancel();
        self.frozen = None;
        let delta = self.intensity.reset();
        self.publish_intensity(delta, out_events);
        self.transition(DirectorState::Idle, Duration::ZERO, out_events);
    }

    fn enter_safe_room(&mut self, out_events: &mut Vec<Event>) {
        if matches!(self.state, DirectorState::Idle | DirectorState::SafeRoom) {
            debug!(state = %self.state, "safe area arrival ignored");
            return;
        }
        let _ = self.crescendo.cancel();
        self.frozen = None;
        let delta = self.intensity.reset();
        self.publish_intensity(delta, out_events);
        self.transition(DirectorState::SafeRoom, Duration::ZERO, out_events);
    }

    fn exit_safe_room(&mut self, out_events: &mut Vec<Event>) {
        if self.state != DirectorState::SafeRoom {
            debug!(state = %self.state, "safe area exit ignored");
            return;
        }
        let grace = duration_from_secs(self.pacing.safe_room_grace_secs);
        self.transition(DirectorState::Relax, grace, out_events);
    }

    fn start_crescendo(&mut self, config: CrescendoConfig, out_events: &mut Vec<Event>) {
        if self.state == DirectorState::SafeRoom {
            warn!("crescendo ignored inside a safe area");
            return;
        }
        if let Err(error) = self.crescendo.start(config) {
            warn!(%error, state = %self.state, "crescendo start rejected");
            return;
        }
        self.frozen = self.state.is_pacing().then_some(FrozenPacing {
            state: self.state,
            timer: self.state_timer,
        });
        self.transition(DirectorState::Crescendo, Duration::ZERO, out_events);
    }

    fn cancel_crescendo(&mut self, out_events: &mut Vec<Event>) {
        if !self.crescendo.cancel() {
            debug!("no crescendo running; cancel ignored");
            return;
        }
        self.frozen = None;
        let timer = self.relax_timer();
        self.transition(DirectorState::Relax, timer, out_events);
    }

    fn resume_after_crescendo(&mut self, out_events: &mut Vec<Event>) {
        match self.frozen.take() {
            Some(frozen) => self.transition(frozen.state, frozen.timer, out_events),
            None => {
                let timer = self.relax_timer();
                self.transition(DirectorState::Relax, timer, out_events);
            }
        }
    }

    fn spawn_paced<F>(&mut self, players: &PlayerView, is_occluded: &F, out: &mut Vec<Command>)
    where
        F: Fn(Vec3, Vec3) -> bool,
    {
        if self.population.can_spawn_common_wave() {
            let size = self.population.next_wave_size();
            if self.spawn_at_points(Species::Common, size, players, is_occluded, out) == 0 {
                debug!(size, "no hidden common spawn points; deferring wave");
                self.population.defer_common_wave();
            } else {
                self.population.record_common_wave();
            }
        }

        for kind in SpecialKind::ALL {
            if !self.population.can_spawn_special(kind) {
                continue;
            }
            if self.spawn_at_points(Species::Special(kind), 1, players, is_occluded, out) == 0 {
                debug!(?kind, "no hidden special spawn point; deferring");
                self.population.defer_special(kind);
            }
        }
    }

    fn fulfil_crescendo<F>(
        &mut self,
        request: CrescendoRequest,
        players: &PlayerView,
        is_occluded: &F,
        out: &mut Vec<Command>,
    ) where
        F: Fn(Vec3, Vec3) -> bool,
    {
        match request {
            CrescendoRequest::CommonWave { wave, size } => {
                let size = size.min(self.population.common_headroom());
                let placed = self.spawn_at_points(Species::Common, size, players, is_occluded, out);
                debug!(wave, requested = size, placed, "crescendo wave fulfilled");
            }
            CrescendoRequest::Special { wave } => {
                let eligible: Vec<SpecialKind> = SpecialKind::ALL
                    .into_iter()
                    .filter(|kind| self.population.has_special_capacity(*kind))
                    .collect();
                let Some(kind) = eligible.choose(&mut self.rng).copied() else {
                    debug!(wave, "special population full; crescendo special skipped");
                    return;
                };
                let placed =
                    self.spawn_at_points(Species::Special(kind), 1, players, is_occluded, out);
                debug!(wave, ?kind, placed, "crescendo special fulfilled");
            }
            CrescendoRequest::Boss { wave } => {
                if !self.population.can_spawn_boss() {
                    warn!(wave, "boss population full; crescendo boss skipped");
                    return;
                }
                if self.spawn_at_points(Species::Boss, 1, players, is_occluded, out) == 0 {
                    warn!(wave, "no hidden spawn point for the crescendo boss");
                }
            }
        }
    }

    fn spawn_at_points<F>(
        &mut self,
        species: Species,
        count: u32,
        players: &PlayerView,
        is_occluded: &F,
        out: &mut Vec<Command>,
    ) -> u32
    where
        F: Fn(Vec3, Vec3) -> bool,
    {
        if count == 0 {
            return 0;
        }
        let points = self.selector.get_valid_points(
            species.spawn_category(),
            count as usize,
            players,
            is_occluded,
        );

        let mut placed = 0;
        for position in points {
            if !self.population.record_spawn(species) {
                break;
            }
            out.push(Command::SpawnActor { species, position });
            placed += 1;
        }
        placed
    }

    fn relax_timer(&mut self) -> Duration {
        self.pacing.relax.sample(&mut self.rng, 1.0)
    }

    fn publish_intensity(&self, delta: f32, out_events: &mut Vec<Event>) {
        if delta != 0.0 {
            out_events.push(Event::IntensityChanged {
                delta,
                value: self.intensity.value(),
            });
        }
    }

    fn transition(&mut self, to: DirectorState, timer: Duration, out_events: &mut Vec<Event>) {
        let from = self.state;
        self.state = to;
        self.state_timer = timer;
        if from == to {
            return;
        }
        let intensity = self.intensity.value();
        debug!(
            %from,
            %to,
            intensity,
            timer_secs = timer.as_secs_f32(),
            "director state changed"
        );
        out_events.push(Event::DirectorStateChanged {
            from,
            to,
            intensity,
        });
    }
}

fn stream_seed(seed: u64, stream: u64) -> u64 {
    seed ^ stream.wrapping_mul(0x9e37_79b9_7f4a_7c15)
}
