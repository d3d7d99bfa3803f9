#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Intensity tracking for the horde director.
//!
//! Intensity is a single scalar in `[0, 100]` approximating how stressed the
//! survivors are. Gameplay stimuli push it up, quiet time lets it decay, and a
//! safe area wipes it entirely.

use std::time::Duration;

use horde_director_core::{Stimulus, INTENSITY_MAX};
use serde::{Deserialize, Serialize};

/// Gains and decay rate applied by the tracker.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntensityConfig {
    /// Intensity gained per point of raw damage taken.
    pub damage_scale: f32,
    /// Flat gain when a player is incapacitated.
    pub incapacitated_gain: f32,
    /// Flat gain when an enemy dies close to a player.
    pub nearby_kill_gain: f32,
    /// Flat gain when a special enemy is spotted.
    pub special_sighted_gain: f32,
    /// Flat gain when a teammate goes down.
    pub teammate_downed_gain: f32,
    /// Intensity lost per second while out of combat.
    pub decay_per_second: f32,
}

impl Default for IntensityConfig {
    fn default() -> Self {
        Self {
            damage_scale: 0.5,
            incapacitated_gain: 15.0,
            nearby_kill_gain: 3.0,
            special_sighted_gain: 5.0,
            teammate_downed_gain: 10.0,
            decay_per_second: 5.0,
        }
    }
}

impl IntensityConfig {
    /// Raw gain a stimulus contributes before clamping.
    ///
    /// Unmapped stimuli and non-positive damage contribute nothing.
    #[must_use]
    pub fn gain(&self, stimulus: Stimulus) -> f32 {
        match stimulus {
            Stimulus::DamageTaken { amount } => {
                if amount.is_finite() && amount > 0.0 {
                    amount * self.damage_scale
                } else {
                    0.0
                }
            }
            Stimulus::Incapacitated => self.incapacitated_gain,
            Stimulus::NearbyKill => self.nearby_kill_gain,
            Stimulus::SpecialSighted => self.special_sighted_gain,
            Stimulus::TeammateDowned => self.teammate_downed_gain,
            Stimulus::Unmapped { .. } => 0.0,
        }
    }

    /// Reports whether every gain and the decay rate are finite and non-negative.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        [
            self.damage_scale,
            self.incapacitated_gain,
            self.nearby_kill_gain,
            self.special_sighted_gain,
            self.teammate_downed_gain,
            self.decay_per_second,
        ]
        .iter()
        .all(|value| value.is_finite() && *value >= 0.0)
    }
}

/// Clamped accumulator of player stress.
#[derive(Clone, Debug)]
pub struct IntensityTracker {
    config: IntensityConfig,
    value: f32,
}

impl IntensityTracker {
    /// Creates a tracker starting at zero intensity.
    #[must_use]
    pub fn new(config: IntensityConfig) -> Self {
        Self { config, value: 0.0 }
    }

    /// Current intensity in `[0, 100]`.
    #[must_use]
    pub fn value(&self) -> f32 {
        self.value
    }

    /// Configuration the tracker was built with.
    #[must_use]
    pub fn config(&self) -> &IntensityConfig {
        &self.config
    }

    /// Applies the gain associated with `stimulus` and returns the clamped delta.
    pub fn add(&mut self, stimulus: Stimulus) -> f32 {
        let gain = self.config.gain(stimulus);
        self.shift(gain)
    }

    /// Decays intensity for `dt` unless the survivors are in combat.
    ///
    /// Returns the applied (non-positive) delta.
    pub fn decay(&mut self, dt: Duration, in_combat: bool) -> f32 {
        if in_combat || dt.is_zero() {
            return 0.0;
        }
        let loss = self.config.decay_per_second * dt.as_secs_f32();
        self.shift(-loss)
    }

    /// Drops intensity straight to zero and returns the applied delta.
    pub fn reset(&mut self) -> f32 {
        let delta = -self.value;
        self.value = 0.0;
        delta
    }

    fn shift(&mut self, delta: f32) -> f32 {
        if !delta.is_finite() || delta == 0.0 {
            return 0.0;
        }
        let before = self.value;
        self.value = (self.value + delta).clamp(0.0, INTENSITY_MAX);
        self.value - before
    }
}
