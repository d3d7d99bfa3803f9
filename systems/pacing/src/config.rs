use horde_director_core::{
    DifficultyTable, DifficultyTier, SecondsRange, SpecialKind, INTENSITY_MAX, MAX_TIMER_SECS,
};
use horde_director_system_intensity::IntensityConfig;
use horde_director_system_population::PopulationConfig;
use horde_director_system_spawn_selection::SelectionConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Thresholds and timers of the pacing cycle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    /// Intensity at which build-up tips over into a peak.
    pub peak_threshold: f32,
    /// How long spawning continues after the peak is reached.
    pub sustain_peak: SecondsRange,
    /// Length of the breather between peaks.
    pub relax: SecondsRange,
    /// Breather granted after leaving a safe area.
    pub safe_room_grace_secs: f32,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            peak_threshold: 70.0,
            sustain_peak: SecondsRange::new(3.0, 5.0),
            relax: SecondsRange::new(30.0, 45.0),
            safe_room_grace_secs: 10.0,
        }
    }
}

/// Complete tuning of one director session.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectorConfig {
    /// Pacing thresholds and timers.
    pub pacing: PacingConfig,
    /// Stimulus gains and decay.
    pub intensity: IntensityConfig,
    /// Population caps, wave sizes and cooldowns.
    pub population: PopulationConfig,
    /// Spawn point filtering.
    pub selection: SelectionConfig,
    /// Per-tier difficulty profiles.
    pub difficulty: DifficultyTable,
    /// Tier the session is played on.
    pub tier: DifficultyTier,
    /// Seed every random stream of the session is derived from.
    pub seed: u64,
}

/// Problems detected while validating a [`DirectorConfig`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    /// Peak threshold outside `(0, 100]`.
    #[error("peak threshold must lie in (0, {max}], got {value}")]
    PeakThreshold {
        /// Offending threshold.
        value: f32,
        /// Upper bound of the intensity scale.
        max: f32,
    },
    /// A timer window is negative, inverted or longer than the timer ceiling.
    #[error("{name} window {min}..={max} must be non-negative, ordered and at most 1e9 seconds")]
    InvalidWindow {
        /// Name of the offending setting.
        name: &'static str,
        /// Configured lower bound.
        min: f32,
        /// Configured upper bound.
        max: f32,
    },
    /// A special archetype has an unusable cooldown window.
    #[error("cooldown window of {kind:?} must be non-negative, ordered and at most 1e9 seconds")]
    SpecialCooldown {
        /// Offending archetype.
        kind: SpecialKind,
    },
    /// A single duration setting is negative or longer than the timer ceiling.
    #[error("{name} must be between 0 and 1e9 seconds, got {value}")]
    InvalidSeconds {
        /// Name of the offending setting.
        name: &'static str,
        /// Configured value.
        value: f32,
    },
    /// The common wave size range is inverted.
    #[error("common wave size {min}..={max} is inverted")]
    WaveSize {
        /// Configured lower bound.
        min: u32,
        /// Configured upper bound.
        max: u32,
    },
    /// Intensity gains or decay are negative or non-finite.
    #[error("intensity gains and decay must be finite and non-negative")]
    IntensityGains,
    /// Selection distances or the behind bias are out of range.
    #[error("selection distances must be finite and non-negative, behind fraction within [0, 1]")]
    Selection,
    /// A difficulty multiplier is zero, negative or non-finite.
    #[error("difficulty multipliers for {tier:?} must be finite and positive")]
    Difficulty {
        /// Offending tier.
        tier: DifficultyTier,
    },
}

impl DirectorConfig {
    /// Checks every tuning value for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] encountered.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let threshold = self.pacing.peak_threshold;
        if !(threshold.is_finite() && threshold > 0.0 && threshold <= INTENSITY_MAX) {
            return Err(ConfigError::PeakThreshold {
                value: threshold,
                max: INTENSITY_MAX,
            });
        }
        check_window("sustain_peak", self.pacing.sustain_peak)?;
        check_window("relax", self.pacing.relax)?;
        check_seconds("safe_room_grace_secs", self.pacing.safe_room_grace_secs)?;

        if !self.intensity.is_valid() {
            return Err(ConfigError::IntensityGains);
        }

        let population = &self.population;
        check_window("common_wave_interval", population.common_wave_interval)?;
        if population.common_wave_size.min > population.common_wave_size.max {
            return Err(ConfigError::WaveSize {
                min: population.common_wave_size.min,
                max: population.common_wave_size.max,
            });
        }
        for kind in SpecialKind::ALL {
            if !population.specials.tuning(kind).cooldown.is_valid() {
                return Err(ConfigError::SpecialCooldown { kind });
            }
        }
        check_seconds("retry_delay_secs", population.retry_delay_secs)?;

        if !self.selection.is_valid() {
            return Err(ConfigError::Selection);
        }

        for tier in DifficultyTier::ALL {
            let profile = self.difficulty.profile(tier);
            let positive = |value: f32| value.is_finite() && value > 0.0;
            if !(positive(profile.population)
                && positive(profile.interval)
                && positive(profile.wave_size))
            {
                return Err(ConfigError::Difficulty { tier });
            }
        }
        Ok(())
    }
}

fn check_window(name: &'static str, window: SecondsRange) -> Result<(), ConfigError> {
    if window.is_valid() {
        Ok(())
    } else {
        Err(ConfigError::InvalidWindow {
            name,
            min: window.min,
            max: window.max,
        })
    }
}

fn check_seconds(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=MAX_TIMER_SECS).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidSeconds { name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(DirectorConfig::default().validate(), Ok(()));
    }

    #[test]
    fn inverted_relax_window_is_reported_by_name() {
        let config = DirectorConfig {
            pacing: PacingConfig {
                relax: SecondsRange::new(45.0, 30.0),
                ..PacingConfig::default()
            },
            ..DirectorConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidWindow {
                name: "relax",
                min: 45.0,
                max: 30.0,
            })
        );
    }

    #[test]
    fn timers_beyond_the_ceiling_are_refused() {
        let config = DirectorConfig {
            pacing: PacingConfig {
                relax: SecondsRange::new(30.0, 1.0e30),
                ..PacingConfig::default()
            },
            ..DirectorConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidWindow { name: "relax", .. })
        ));

        let config = DirectorConfig {
            pacing: PacingConfig {
                safe_room_grace_secs: f32::INFINITY,
                ..PacingConfig::default()
            },
            ..DirectorConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidSeconds {
                name: "safe_room_grace_secs",
                ..
            })
        ));
    }

    #[test]
    fn zero_threshold_is_rejected() {
        let mut config = DirectorConfig::default();
        config.pacing.peak_threshold = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::PeakThreshold { .. })
        ));
    }

    #[test]
    fn non_positive_difficulty_multiplier_is_rejected() {
        let mut config = DirectorConfig::default();
        config.difficulty.expert.interval = 0.0;
        assert_eq!(
            config.validate(),
            Err(ConfigError::Difficulty {
                tier: DifficultyTier::Expert
            })
        );
    }
}
