#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Population and cooldown gating for director spawns.
//!
//! The gate answers "may species X spawn now?" by combining per-species caps,
//! a global special cap taken from the difficulty profile, and randomised
//! cooldowns. It never fails: a denied request is an ordinary outcome that the
//! director retries on a later tick.

use std::time::Duration;

use horde_director_core::{
    duration_from_secs, DifficultyProfile, SecondsRange, SpecialKind, Species,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Inclusive range of whole counts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountRange {
    /// Smallest count.
    pub min: u32,
    /// Largest count.
    pub max: u32,
}

impl CountRange {
    /// Creates a new inclusive count range.
    #[must_use]
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }
}

/// Cap and cooldown window for one special archetype.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpecialTuning {
    /// Maximum number of instances alive at once.
    pub cap: u32,
    /// Cooldown drawn after each successful spawn.
    pub cooldown: SecondsRange,
}

impl Default for SpecialTuning {
    fn default() -> Self {
        Self {
            cap: 1,
            cooldown: SecondsRange::new(20.0, 30.0),
        }
    }
}

/// Tuning for every special archetype, keyed by name in configuration files.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecialTable {
    /// Tuning for [`SpecialKind::Stalker`].
    pub stalker: SpecialTuning,
    /// Tuning for [`SpecialKind::Grappler`].
    pub grappler: SpecialTuning,
    /// Tuning for [`SpecialKind::Bloater`].
    pub bloater: SpecialTuning,
    /// Tuning for [`SpecialKind::Spitter`].
    pub spitter: SpecialTuning,
    /// Tuning for [`SpecialKind::Charger`].
    pub charger: SpecialTuning,
}

impl Default for SpecialTable {
    fn default() -> Self {
        Self {
            stalker: SpecialTuning::default(),
            grappler: SpecialTuning {
                cap: 1,
                cooldown: SecondsRange::new(25.0, 35.0),
            },
            bloater: SpecialTuning::default(),
            spitter: SpecialTuning {
                cap: 1,
                cooldown: SecondsRange::new(30.0, 40.0),
            },
            charger: SpecialTuning {
                cap: 1,
                cooldown: SecondsRange::new(30.0, 45.0),
            },
        }
    }
}

impl SpecialTable {
    /// Tuning configured for the provided archetype.
    #[must_use]
    pub const fn tuning(&self, kind: SpecialKind) -> &SpecialTuning {
        match kind {
            SpecialKind::Stalker => &self.stalker,
            SpecialKind::Grappler => &self.grappler,
            SpecialKind::Bloater => &self.bloater,
            SpecialKind::Spitter => &self.spitter,
            SpecialKind::Charger => &self.charger,
        }
    }

    /// Overrides the tuning of one archetype.
    pub fn set(&mut self, kind: SpecialKind, tuning: SpecialTuning) {
        match kind {
            SpecialKind::Stalker => self.stalker = tuning,
            SpecialKind::Grappler => self.grappler = tuning,
            SpecialKind::Bloater => self.bloater = tuning,
            SpecialKind::Spitter => self.spitter = tuning,
            SpecialKind::Charger => self.charger = tuning,
        }
    }
}

/// Configuration parameters required to construct the population gate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationConfig {
    /// Cooldown drawn after each common wave, before difficulty scaling.
    pub common_wave_interval: SecondsRange,
    /// Size of a common wave, before difficulty scaling.
    pub common_wave_size: CountRange,
    /// Commons allowed alive at once, before difficulty scaling.
    pub common_cap: u32,
    /// Bosses allowed alive at once.
    pub boss_cap: u32,
    /// Per-archetype caps and cooldowns.
    pub specials: SpecialTable,
    /// Back-off applied when a permitted spawn found nowhere to go.
    pub retry_delay_secs: f32,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            common_wave_interval: SecondsRange::new(30.0, 60.0),
            common_wave_size: CountRange::new(10, 20),
            common_cap: 30,
            boss_cap: 1,
            specials: SpecialTable::default(),
            retry_delay_secs: 1.0,
        }
    }
}

/// Cooldown and population counters for one special archetype.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpeciesSlot {
    cooldown: Duration,
    active: u32,
    cap: u32,
}

impl SpeciesSlot {
    /// Time left before the archetype becomes eligible again.
    #[must_use]
    pub const fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Instances currently alive.
    #[must_use]
    pub const fn active(&self) -> u32 {
        self.active
    }

    /// Maximum instances alive at once.
    #[must_use]
    pub const fn cap(&self) -> u32 {
        self.cap
    }
}

/// Tracks live populations and cooldowns for every species.
#[derive(Debug)]
pub struct PopulationGate {
    config: PopulationConfig,
    profile: DifficultyProfile,
    rng: ChaCha8Rng,
    common_cooldown: Duration,
    common_active: u32,
    boss_active: u32,
    slots: [SpeciesSlot; SpecialKind::COUNT],
}

impl PopulationGate {
    /// Creates a gate with freshly drawn cooldowns.
    #[must_use]
    pub fn new(config: PopulationConfig, profile: DifficultyProfile, rng_seed: u64) -> Self {
        let slots = SpecialKind::ALL.map(|kind| SpeciesSlot {
            cooldown: Duration::ZERO,
            active: 0,
            cap: config.specials.tuning(kind).cap,
        });
        let mut gate = Self {
            config,
            profile,
            rng: ChaCha8Rng::seed_from_u64(rng_seed),
            common_cooldown: Duration::ZERO,
            common_active: 0,
            boss_active: 0,
            slots,
        };
        gate.restart_timers();
        gate
    }

    /// Redraws every cooldown, as at the start of a session.
    pub fn restart_timers(&mut self) {
        self.record_common_wave();
        for kind in SpecialKind::ALL {
            self.restart_special_cooldown(kind);
        }
    }

    /// Counts down every cooldown by `dt`.
    pub fn advance(&mut self, dt: Duration) {
        self.common_cooldown = self.common_cooldown.saturating_sub(dt);
        for slot in &mut self.slots {
            slot.cooldown = slot.cooldown.saturating_sub(dt);
        }
    }

    /// Reports whether a common wave may be launched now.
    #[must_use]
    pub fn can_spawn_common_wave(&self) -> bool {
        self.common_cooldown.is_zero() && self.common_headroom() > 0
    }

    /// Number of additional commons the population cap allows.
    #[must_use]
    pub fn common_headroom(&self) -> u32 {
        self.common_cap().saturating_sub(self.common_active)
    }

    /// Commons allowed alive at once after difficulty scaling.
    #[must_use]
    pub fn common_cap(&self) -> u32 {
        scale_count(self.config.common_cap, self.profile.population)
    }

    /// Draws the size of the next common wave, limited by population headroom.
    pub fn next_wave_size(&mut self) -> u32 {
        let range = self.config.common_wave_size;
        let drawn = if range.max > range.min {
            self.rng.gen_range(range.min..=range.max)
        } else {
            range.min
        };
        scale_count(drawn, self.profile.wave_size)
            .max(1)
            .min(self.common_headroom())
    }

    /// Restarts the common wave timer with a freshly drawn interval.
    pub fn record_common_wave(&mut self) {
        self.common_cooldown = self
            .config
            .common_wave_interval
            .sample(&mut self.rng, self.profile.interval);
    }

    /// Delays the next common wave by the retry back-off.
    pub fn defer_common_wave(&mut self) {
        self.common_cooldown = self.retry_delay();
    }

    /// Reports whether `kind` may spawn now.
    ///
    /// Requires the archetype to be under its own cap, the global special
    /// population to be under the difficulty cap, and the cooldown to have
    /// elapsed.
    #[must_use]
    pub fn can_spawn_special(&self, kind: SpecialKind) -> bool {
        self.has_special_capacity(kind) && self.slots[kind.index()].cooldown.is_zero()
    }

    /// Reports whether both caps leave room for `kind`, ignoring its cooldown.
    #[must_use]
    pub fn has_special_capacity(&self, kind: SpecialKind) -> bool {
        let slot = &self.slots[kind.index()];
        slot.active < slot.cap && self.active_specials() < self.special_cap()
    }

    /// Reports whether another boss may be created.
    #[must_use]
    pub fn can_spawn_boss(&self) -> bool {
        self.boss_active < self.config.boss_cap
    }

    /// Delays the next attempt for `kind` by the retry back-off.
    pub fn defer_special(&mut self, kind: SpecialKind) {
        self.slots[kind.index()].cooldown = self.retry_delay();
    }

    /// Records that `species` was requested.
    ///
    /// Special spawns restart the archetype's cooldown. Returns `false`, leaving
    /// the counters untouched, when the request would exceed a cap.
    pub fn record_spawn(&mut self, species: Species) -> bool {
        match species {
            Species::Common => {
                if self.common_headroom() == 0 {
                    warn!(active = self.common_active, "common population already at cap");
                    return false;
                }
                self.common_active += 1;
            }
            Species::Special(kind) => {
                if !self.has_special_capacity(kind) {
                    warn!(?kind, "special population already at cap");
                    return false;
                }
                self.slots[kind.index()].active += 1;
                self.restart_special_cooldown(kind);
            }
            Species::Boss => {
                if !self.can_spawn_boss() {
                    warn!(active = self.boss_active, "boss population already at cap");
                    return false;
                }
                self.boss_active += 1;
            }
        }
        true
    }

    /// Records that an instance of `species` died or despawned.
    ///
    /// Counters clamp at zero so duplicate notifications are harmless.
    pub fn record_death_or_expiry(&mut self, species: Species) {
        match species {
            Species::Common => self.common_active = self.common_active.saturating_sub(1),
            Species::Special(kind) => {
                let slot = &mut self.slots[kind.index()];
                slot.active = slot.active.saturating_sub(1);
            }
            Species::Boss => self.boss_active = self.boss_active.saturating_sub(1),
        }
    }

    /// Instances of `species` currently alive.
    #[must_use]
    pub fn active(&self, species: Species) -> u32 {
        match species {
            Species::Common => self.common_active,
            Species::Special(kind) => self.slots[kind.index()].active,
            Species::Boss => self.boss_active,
        }
    }

    /// Special enemies alive across every archetype.
    #[must_use]
    pub fn active_specials(&self) -> u32 {
        self.slots.iter().map(|slot| slot.active).sum()
    }

    /// Global special cap of the active difficulty.
    #[must_use]
    pub const fn special_cap(&self) -> u32 {
        self.profile.special_cap
    }

    /// Counters for one special archetype.
    #[must_use]
    pub fn special_slot(&self, kind: SpecialKind) -> SpeciesSlot {
        self.slots[kind.index()]
    }

    /// Counters for every special archetype, indexed by [`SpecialKind::index`].
    #[must_use]
    pub const fn special_slots(&self) -> &[SpeciesSlot; SpecialKind::COUNT] {
        &self.slots
    }

    /// Time left before the next common wave.
    #[must_use]
    pub const fn common_cooldown(&self) -> Duration {
        self.common_cooldown
    }

    fn restart_special_cooldown(&mut self, kind: SpecialKind) {
        let window = self.config.specials.tuning(kind).cooldown;
        self.slots[kind.index()].cooldown = window.sample(&mut self.rng, self.profile.interval);
    }

    fn retry_delay(&self) -> Duration {
        duration_from_secs(self.config.retry_delay_secs)
    }
}

fn scale_count(count: u32, multiplier: f32) -> u32 {
    if !multiplier.is_finite() || multiplier <= 0.0 {
        return 0;
    }
    let scaled = (count as f32 * multiplier).round();
    if scaled >= u32::MAX as f32 {
        u32::MAX
    } else {
        scaled as u32
    }
}
