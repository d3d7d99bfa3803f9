#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the horde director.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. The director consumes event streams, queries
//! immutable snapshots, and responds exclusively with new command batches and
//! notification events.

use std::{fmt, str::FromStr, time::Duration};

pub use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum number of players that may take part in a session.
pub const MAX_PLAYERS: usize = 4;

/// Radius around each player inside which a hostile actor counts as combat.
pub const COMBAT_RADIUS: f32 = 30.0;

/// Upper bound of the intensity scale.
pub const INTENSITY_MAX: f32 = 100.0;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Inserts or replaces the snapshot describing a connected player.
    PlacePlayer {
        /// Latest state reported for the player.
        player: PlayerSnapshot,
    },
    /// Disconnects a player from the session.
    RemovePlayer {
        /// Identifier of the departing player.
        player: PlayerId,
    },
    /// Registers a static map marker that may host future spawns.
    RegisterSpawnMarker {
        /// Marker position and category.
        point: SpawnPoint,
    },
    /// Places a piece of geometry that blocks sightlines.
    PlaceOccluder {
        /// Box blocking line of sight.
        occluder: Occluder,
    },
    /// Requests that the actor collaborator create a new hostile actor.
    SpawnActor {
        /// Archetype to create.
        species: Species,
        /// World position the actor should appear at.
        position: Vec3,
    },
    /// Removes a live actor from the world.
    RemoveActor {
        /// Identifier of the actor leaving the world.
        actor: ActorId,
        /// Why the actor left.
        cause: RemovalCause,
    },
    /// Relays a gameplay stimulus that affects player stress.
    ReportStimulus {
        /// Stimulus observed by gameplay code.
        stimulus: Stimulus,
    },
    /// Kicks the director out of idle when a play session begins.
    StartSession {
        /// Pacing state the session opens with.
        opening: SessionOpening,
    },
    /// Returns the director to idle when a play session ends.
    EndSession,
    /// Signals that the survivors reached a safe area.
    EnterSafeArea,
    /// Signals that the survivors left the safe area.
    ExitSafeArea,
    /// Starts a scripted crescendo event.
    StartCrescendo {
        /// Description of the scripted sequence.
        config: CrescendoConfig,
    },
    /// Aborts the running crescendo event, if any.
    CancelCrescendo,
}

/// Events broadcast by the world and the director after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that a player snapshot was stored.
    PlayerUpdated {
        /// Identifier of the updated player.
        player: PlayerId,
    },
    /// Confirms that a player left the session.
    PlayerRemoved {
        /// Identifier of the departed player.
        player: PlayerId,
    },
    /// Confirms that an actor was created.
    ActorSpawned {
        /// Handle allocated by the world.
        actor: ActorId,
        /// Archetype of the new actor.
        species: Species,
        /// Position the actor occupies.
        position: Vec3,
    },
    /// Reports that an actor could not be created.
    SpawnRejected {
        /// Archetype that was requested.
        species: Species,
        /// Position that was requested.
        position: Vec3,
        /// Specific reason for the rejection.
        reason: SpawnRejection,
    },
    /// Confirms that an actor left the world.
    ActorRemoved {
        /// Identifier of the removed actor.
        actor: ActorId,
        /// Archetype of the removed actor.
        species: Species,
        /// Why the actor left.
        cause: RemovalCause,
    },
    /// Relays a stimulus reported by gameplay code.
    StimulusObserved {
        /// Stimulus that occurred.
        stimulus: Stimulus,
    },
    /// Announces that a play session began.
    SessionStarted {
        /// Pacing state requested for the opening.
        opening: SessionOpening,
    },
    /// Announces that the play session ended.
    SessionEnded,
    /// Announces that survivors entered a safe area.
    SafeAreaEntered,
    /// Announces that survivors left the safe area.
    SafeAreaExited,
    /// Announces that a scripted crescendo was requested.
    CrescendoRequested {
        /// Description of the scripted sequence.
        config: CrescendoConfig,
    },
    /// Announces that the running crescendo was aborted externally.
    CrescendoCancelled,
    /// Published by the director whenever the pacing state changes.
    DirectorStateChanged {
        /// State that was active before the transition.
        from: DirectorState,
        /// State that became active.
        to: DirectorState,
        /// Intensity at the moment of the transition.
        intensity: f32,
    },
    /// Published by the director whenever intensity moves.
    IntensityChanged {
        /// Signed change that was applied after clamping.
        delta: f32,
        /// Intensity after the change.
        value: f32,
    },
}

/// Unique identifier assigned to a connected player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlayerId(u32);

impl PlayerId {
    /// Creates a new player identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Handle allocated by the actor collaborator for a live actor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorId(u32);

impl ActorId {
    /// Creates a new actor handle with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the handle.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Special-enemy archetypes governed by individual cooldowns and caps.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecialKind {
    /// Pouncing ambusher.
    Stalker,
    /// Long-range restrainer.
    Grappler,
    /// Slow enemy that bursts into attractant.
    Bloater,
    /// Area-denial acid thrower.
    Spitter,
    /// Heavy enemy that rams and pins survivors.
    Charger,
}

impl SpecialKind {
    /// Number of special archetypes.
    pub const COUNT: usize = 5;

    /// Every special archetype in a stable order.
    pub const ALL: [SpecialKind; Self::COUNT] = [
        SpecialKind::Stalker,
        SpecialKind::Grappler,
        SpecialKind::Bloater,
        SpecialKind::Spitter,
        SpecialKind::Charger,
    ];

    /// Dense index of the archetype inside [`SpecialKind::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Stalker => 0,
            Self::Grappler => 1,
            Self::Bloater => 2,
            Self::Spitter => 3,
            Self::Charger => 4,
        }
    }
}

/// Archetype of a hostile actor the director may request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Species {
    /// Horde member spawned in waves.
    Common,
    /// One of the special archetypes.
    Special(SpecialKind),
    /// Boss-tier enemy reserved for scripted waves.
    Boss,
}

impl Species {
    /// Spawn point category the species is placed on.
    ///
    /// Bosses share the special markers because they need the same buffer.
    #[must_use]
    pub const fn spawn_category(self) -> SpawnCategory {
        match self {
            Self::Common => SpawnCategory::Common,
            Self::Special(_) | Self::Boss => SpawnCategory::Special,
        }
    }
}

/// Category tag attached to each spawn marker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpawnCategory {
    /// Markers used for horde waves.
    Common,
    /// Markers used for special and boss enemies.
    Special,
    /// Markers used for idle wanderers.
    Ambient,
}

/// Static candidate location for spawning.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpawnPoint {
    position: Vec3,
    category: SpawnCategory,
}

impl SpawnPoint {
    /// Creates a spawn point at the provided position.
    #[must_use]
    pub const fn new(position: Vec3, category: SpawnCategory) -> Self {
        Self { position, category }
    }

    /// World position of the marker.
    #[must_use]
    pub const fn position(&self) -> Vec3 {
        self.position
    }

    /// Category tag of the marker.
    #[must_use]
    pub const fn category(&self) -> SpawnCategory {
        self.category
    }
}

/// Axis-aligned box that blocks line of sight.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Occluder {
    min: Vec3,
    max: Vec3,
}

impl Occluder {
    /// Creates a box spanning the two provided corners in any order.
    #[must_use]
    pub fn from_corners(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Corner with the smallest coordinates.
    #[must_use]
    pub const fn min(&self) -> Vec3 {
        self.min
    }

    /// Corner with the largest coordinates.
    #[must_use]
    pub const fn max(&self) -> Vec3 {
        self.max
    }
}

/// Gameplay stimuli that raise player stress.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Stimulus {
    /// A player lost health.
    DamageTaken {
        /// Raw damage received.
        amount: f32,
    },
    /// A player was incapacitated.
    Incapacitated,
    /// An enemy died close to a player.
    NearbyKill,
    /// A player spotted a special enemy.
    SpecialSighted,
    /// A teammate went down.
    TeammateDowned,
    /// Stimulus kind introduced by gameplay code that carries no gain yet.
    Unmapped {
        /// Opaque identifier chosen by the reporter.
        code: u32,
    },
}

/// Why an actor left the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RemovalCause {
    /// The actor was killed.
    Killed,
    /// The actor despawned on its own.
    Expired,
}

/// Reasons the actor collaborator may refuse a spawn request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SpawnRejection {
    /// The collaborator has no room for another actor.
    ActorLimit,
    /// The requested position was not a finite coordinate.
    InvalidPosition,
}

/// Incapacitation state of a player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlayerStatus {
    /// Player is up and fighting.
    Alive,
    /// Player is down and awaiting revival.
    Incapacitated,
}

/// Immutable representation of a player's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayerSnapshot {
    /// Unique identifier of the player.
    pub id: PlayerId,
    /// World position of the player.
    pub position: Vec3,
    /// Direction the player is facing.
    pub forward: Vec3,
    /// Whether the player is up or incapacitated.
    pub status: PlayerStatus,
    /// Whether the player is covered in attractant. Spawn placement ignores it.
    pub biled: bool,
}

impl PlayerSnapshot {
    /// Creates a snapshot for a healthy, unmarked player.
    #[must_use]
    pub const fn alive(id: PlayerId, position: Vec3, forward: Vec3) -> Self {
        Self {
            id,
            position,
            forward,
            status: PlayerStatus::Alive,
            biled: false,
        }
    }
}

/// Read-only snapshot describing all connected players.
#[derive(Clone, Debug, Default)]
pub struct PlayerView {
    snapshots: Vec<PlayerSnapshot>,
}

impl PlayerView {
    /// Creates a new player view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<PlayerSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured player snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &PlayerSnapshot> {
        self.snapshots.iter()
    }

    /// Number of connected players.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether no player is connected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

/// Macro-phase of the director.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DirectorState {
    /// No session is running.
    Idle,
    /// Threat is ramping up; full spawning.
    BuildUp,
    /// Intensity peaked; spawning continues briefly.
    SustainPeak,
    /// Waiting for intensity to fall; no spawning.
    PeakFade,
    /// Breather between peaks; no spawning.
    Relax,
    /// Scripted waves override normal pacing.
    Crescendo,
    /// Survivors are in a safe area; no spawning.
    SafeRoom,
}

impl DirectorState {
    /// Reports whether the state belongs to the automatic pacing cycle.
    #[must_use]
    pub const fn is_pacing(self) -> bool {
        matches!(
            self,
            Self::BuildUp | Self::SustainPeak | Self::PeakFade | Self::Relax
        )
    }

    /// Reports whether normal spawning is attempted in the state.
    #[must_use]
    pub const fn permits_spawning(self) -> bool {
        matches!(self, Self::BuildUp | Self::SustainPeak)
    }
}

impl fmt::Display for DirectorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Idle => "idle",
            Self::BuildUp => "build-up",
            Self::SustainPeak => "sustain-peak",
            Self::PeakFade => "peak-fade",
            Self::Relax => "relax",
            Self::Crescendo => "crescendo",
            Self::SafeRoom => "safe-room",
        };
        f.write_str(label)
    }
}

/// Pacing state a session opens with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SessionOpening {
    /// Open with a breather.
    Relax,
    /// Open with spawning enabled.
    BuildUp,
}

impl SessionOpening {
    /// Director state matching the opening.
    #[must_use]
    pub const fn state(self) -> DirectorState {
        match self {
            Self::Relax => DirectorState::Relax,
            Self::BuildUp => DirectorState::BuildUp,
        }
    }
}

/// Read-only facts the director publishes after every tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DirectorSnapshot {
    /// Active pacing state.
    pub state: DirectorState,
    /// Current intensity in `[0, 100]`.
    pub intensity: f32,
}

/// Difficulty tiers selectable for a session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DifficultyTier {
    /// Relaxed population and long intervals.
    Easy,
    /// Baseline tuning.
    #[default]
    Normal,
    /// Denser population and shorter intervals.
    Advanced,
    /// Densest population and shortest intervals.
    Expert,
}

impl DifficultyTier {
    /// Every tier from easiest to hardest.
    pub const ALL: [Self; 4] = [Self::Easy, Self::Normal, Self::Advanced, Self::Expert];
}

/// Error produced when parsing an unknown difficulty label.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unknown difficulty tier '{0}' (expected easy, normal, advanced or expert)")]
pub struct UnknownDifficulty(String);

impl FromStr for DifficultyTier {
    type Err = UnknownDifficulty;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Self::Easy),
            "normal" => Ok(Self::Normal),
            "advanced" => Ok(Self::Advanced),
            "expert" => Ok(Self::Expert),
            _ => Err(UnknownDifficulty(value.to_owned())),
        }
    }
}

/// Multipliers and caps applied for a single difficulty tier.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifficultyProfile {
    /// Scales the number of commons allowed alive at once.
    pub population: f32,
    /// Scales every cooldown interval; lower means faster spawning.
    pub interval: f32,
    /// Scales the size of common waves.
    pub wave_size: f32,
    /// Maximum number of special enemies alive at once across all kinds.
    pub special_cap: u32,
}

impl Default for DifficultyProfile {
    fn default() -> Self {
        Self {
            population: 1.0,
            interval: 1.0,
            wave_size: 1.0,
            special_cap: 4,
        }
    }
}

/// Read-only difficulty configuration supplied by the surrounding game.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifficultyTable {
    /// Profile applied on [`DifficultyTier::Easy`].
    pub easy: DifficultyProfile,
    /// Profile applied on [`DifficultyTier::Normal`].
    pub normal: DifficultyProfile,
    /// Profile applied on [`DifficultyTier::Advanced`].
    pub advanced: DifficultyProfile,
    /// Profile applied on [`DifficultyTier::Expert`].
    pub expert: DifficultyProfile,
}

impl Default for DifficultyTable {
    fn default() -> Self {
        // Harder tiers trade a tighter special cap for denser hordes and faster cooldowns.
        Self {
            easy: DifficultyProfile {
                population: 0.75,
                interval: 1.25,
                wave_size: 0.75,
                special_cap: 4,
            },
            normal: DifficultyProfile::default(),
            advanced: DifficultyProfile {
                population: 1.25,
                interval: 0.85,
                wave_size: 1.25,
                special_cap: 3,
            },
            expert: DifficultyProfile {
                population: 1.5,
                interval: 0.7,
                wave_size: 1.5,
                special_cap: 3,
            },
        }
    }
}

impl DifficultyTable {
    /// Profile configured for the provided tier.
    #[must_use]
    pub const fn profile(&self, tier: DifficultyTier) -> &DifficultyProfile {
        match tier {
            DifficultyTier::Easy => &self.easy,
            DifficultyTier::Normal => &self.normal,
            DifficultyTier::Advanced => &self.advanced,
            DifficultyTier::Expert => &self.expert,
        }
    }
}

/// Inclusive range of seconds used for randomised timers.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SecondsRange {
    /// Shortest duration in seconds.
    pub min: f32,
    /// Longest duration in seconds.
    pub max: f32,
}

impl SecondsRange {
    /// Creates a new range of seconds.
    #[must_use]
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Reports whether both bounds are non-negative, ordered and no longer
    /// than [`MAX_TIMER_SECS`].
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.min >= 0.0 && self.min <= self.max && self.max <= MAX_TIMER_SECS
    }

    /// Draws a duration uniformly from the range after applying `scale`.
    ///
    /// Degenerate or inverted ranges collapse onto the lower bound so that
    /// sampling never panics on unvalidated input.
    pub fn sample<R: Rng>(&self, rng: &mut R, scale: f32) -> Duration {
        let min = duration_from_secs(self.min * scale);
        let max = duration_from_secs(self.max * scale);
        if max <= min {
            return min;
        }
        rng.gen_range(min..=max)
    }
}

/// Longest timer, in seconds, any configuration may request.
pub const MAX_TIMER_SECS: f32 = 1.0e9;

/// Longest timer any configuration may request.
pub const MAX_TIMER: Duration = Duration::from_secs(1_000_000_000);

/// Converts seconds into a [`Duration`], mapping negative and non-finite input
/// to zero and clamping anything longer onto [`MAX_TIMER`].
#[must_use]
pub fn duration_from_secs(secs: f32) -> Duration {
    if !(secs.is_finite() && secs > 0.0) {
        Duration::ZERO
    } else if secs >= MAX_TIMER_SECS {
        MAX_TIMER
    } else {
        Duration::try_from_secs_f32(secs).unwrap_or(MAX_TIMER)
    }
}

/// Immutable description of a scripted crescendo sequence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CrescendoConfig {
    /// Total length of the event in seconds.
    pub duration_secs: f32,
    /// Number of waves fired during the event.
    pub wave_count: u32,
    /// Smallest common wave.
    pub wave_size_min: u32,
    /// Largest common wave.
    pub wave_size_max: u32,
    /// Seconds between consecutive waves; wave `k` fires at `k * interval`.
    pub wave_interval_secs: f32,
    /// One-based wave indices that also request a special enemy.
    #[serde(default)]
    pub special_waves: Vec<u32>,
    /// One-based wave index that requests the boss, if any.
    #[serde(default)]
    pub boss_wave: Option<u32>,
}

impl CrescendoConfig {
    /// Total length of the event.
    #[must_use]
    pub fn duration(&self) -> Duration {
        duration_from_secs(self.duration_secs)
    }

    /// Time between consecutive waves.
    #[must_use]
    pub fn wave_interval(&self) -> Duration {
        duration_from_secs(self.wave_interval_secs)
    }

    /// Reports whether the provided one-based wave requests a special enemy.
    #[must_use]
    pub fn is_special_wave(&self, wave: u32) -> bool {
        self.special_waves.contains(&wave)
    }
}

impl Default for CrescendoConfig {
    fn default() -> Self {
        Self {
            duration_secs: 180.0,
            wave_count: 5,
            wave_size_min: 8,
            wave_size_max: 14,
            wave_interval_secs: 30.0,
            special_waves: vec![2, 5],
            boss_wave: Some(4),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn special_kind_indices_are_dense() {
        for (expected, kind) in SpecialKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), expected);
        }
    }

    #[test]
    fn bosses_use_special_markers() {
        assert_eq!(Species::Boss.spawn_category(), SpawnCategory::Special);
        assert_eq!(
            Species::Special(SpecialKind::Charger).spawn_category(),
            SpawnCategory::Special
        );
        assert_eq!(Species::Common.spawn_category(), SpawnCategory::Common);
    }

    #[test]
    fn player_view_orders_by_identifier() {
        let view = PlayerView::from_snapshots(vec![
            PlayerSnapshot::alive(PlayerId::new(3), Vec3::ZERO, Vec3::X),
            PlayerSnapshot::alive(PlayerId::new(1), Vec3::ZERO, Vec3::X),
        ]);
        let ids: Vec<u32> = view.iter().map(|player| player.id.get()).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn seconds_range_samples_within_scaled_bounds() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let range = SecondsRange::new(30.0, 45.0);
        for _ in 0..64 {
            let sample = range.sample(&mut rng, 0.5);
            assert!(sample >= Duration::from_secs_f32(15.0));
            assert!(sample <= Duration::from_secs_f32(22.5));
        }
    }

    #[test]
    fn inverted_range_collapses_to_lower_bound() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let range = SecondsRange::new(5.0, 3.0);
        assert!(!range.is_valid());
        assert_eq!(range.sample(&mut rng, 1.0), Duration::from_secs(5));
    }

    #[test]
    fn negative_seconds_become_zero() {
        assert_eq!(duration_from_secs(-3.0), Duration::ZERO);
        assert_eq!(duration_from_secs(f32::NAN), Duration::ZERO);
    }

    #[test]
    fn huge_seconds_clamp_to_the_longest_timer() {
        assert_eq!(duration_from_secs(1.0e30), MAX_TIMER);
        assert_eq!(duration_from_secs(f32::MAX), MAX_TIMER);

        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let range = SecondsRange::new(30.0, 1.0e30);
        assert!(!range.is_valid());
        for _ in 0..16 {
            let sample = range.sample(&mut rng, 2.0);
            assert!(sample >= Duration::from_secs(60));
            assert!(sample <= MAX_TIMER);
        }
    }

    #[test]
    fn difficulty_tiers_parse_case_insensitively() {
        assert_eq!("Expert".parse::<DifficultyTier>(), Ok(DifficultyTier::Expert));
        assert!("nightmare".parse::<DifficultyTier>().is_err());
    }

    #[test]
    fn harder_tiers_tighten_the_special_cap() {
        let table = DifficultyTable::default();
        assert!(
            table.profile(DifficultyTier::Expert).special_cap
                <= table.profile(DifficultyTier::Normal).special_cap
        );
    }

    #[test]
    fn crescendo_config_reads_from_toml() {
        let config: CrescendoConfig = toml::from_str(
            "duration_secs = 90.0\nwave_count = 3\nwave_size_min = 4\nwave_size_max = 6\nwave_interval_secs = 20.0\nspecial_waves = [2]\n",
        )
        .expect("crescendo config parses");
        assert_eq!(config.wave_count, 3);
        assert!(config.is_special_wave(2));
        assert_eq!(config.boss_wave, None);
        assert_eq!(config.wave_interval(), Duration::from_secs(20));
    }
}
