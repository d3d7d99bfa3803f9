#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Scripted crescendo sequencing.
//!
//! A crescendo is a fixed schedule of escalating waves that overrides the
//! director's automatic pacing for its duration. The scheduler only decides
//! *when* each wave fires and what it asks for; the director fulfils the
//! requests through the usual population and placement checks.

use std::time::Duration;

use horde_director_core::{CrescendoConfig, MAX_TIMER_SECS};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use thiserror::Error;
use tracing::{debug, info};

/// Reasons a crescendo cannot be started.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CrescendoError {
    /// Another crescendo is still running.
    #[error("a crescendo is already running")]
    AlreadyRunning,
    /// The supplied sequence cannot be scheduled.
    #[error("invalid crescendo config: {0}")]
    InvalidConfig(&'static str),
}

/// Spawn request produced when a crescendo wave fires.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CrescendoRequest {
    /// Spawn a wave of common enemies.
    CommonWave {
        /// One-based wave index.
        wave: u32,
        /// Number of enemies requested.
        size: u32,
    },
    /// Spawn one special enemy of any archetype.
    Special {
        /// One-based wave index.
        wave: u32,
    },
    /// Spawn the boss.
    Boss {
        /// One-based wave index.
        wave: u32,
    },
}

/// Outcome of advancing the scheduler by one tick.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CrescendoTick {
    /// Requests from every wave that fired during the tick, in wave order.
    pub requests: Vec<CrescendoRequest>,
    /// Whether the sequence ended during the tick.
    pub completed: bool,
}

/// Read-only view of a running crescendo.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CrescendoProgress {
    /// Time since the crescendo started.
    pub elapsed: Duration,
    /// Number of waves fired so far.
    pub waves_fired: u32,
    /// Whether the boss has already been requested.
    pub boss_requested: bool,
}

#[derive(Debug)]
struct CrescendoRuntime {
    config: CrescendoConfig,
    duration: Duration,
    interval: Duration,
    progress: CrescendoProgress,
}

/// Runs at most one crescendo at a time.
#[derive(Debug)]
pub struct CrescendoScheduler {
    rng: ChaCha8Rng,
    runtime: Option<CrescendoRuntime>,
}

impl CrescendoScheduler {
    /// Creates an idle scheduler whose wave sizes come from the seeded stream.
    #[must_use]
    pub fn new(rng_seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(rng_seed),
            runtime: None,
        }
    }

    /// Starts a new crescendo.
    ///
    /// # Errors
    ///
    /// Returns [`CrescendoError::AlreadyRunning`] while a crescendo is active
    /// and [`CrescendoError::InvalidConfig`] when the interval or duration is
    /// zero or too long, or the wave size range is inverted.
    pub fn start(&mut self, config: CrescendoConfig) -> Result<(), CrescendoError> {
        if self.runtime.is_some() {
            return Err(CrescendoError::AlreadyRunning);
        }
        validate(&config)?;

        info!(
            duration_secs = config.duration_secs,
            waves = config.wave_count,
            boss_wave = ?config.boss_wave,
            "crescendo started"
        );
        self.runtime = Some(CrescendoRuntime {
            duration: config.duration(),
            interval: config.wave_interval(),
            config,
            progress: CrescendoProgress {
                elapsed: Duration::ZERO,
                waves_fired: 0,
                boss_requested: false,
            },
        });
        Ok(())
    }

    /// Advances the running crescendo, firing every wave that became due.
    ///
    /// Ticking an idle scheduler is a no-op.
    pub fn tick(&mut self, dt: Duration) -> CrescendoTick {
        let mut outcome = CrescendoTick::default();
        let Some(runtime) = self.runtime.as_mut() else {
            return outcome;
        };

        runtime.progress.elapsed = runtime.progress.elapsed.saturating_add(dt);
        while runtime.progress.waves_fired < runtime.config.wave_count {
            let wave = runtime.progress.waves_fired + 1;
            if runtime.progress.elapsed < runtime.interval.saturating_mul(wave) {
                break;
            }
            runtime.progress.waves_fired = wave;
            fire_wave(runtime, wave, &mut self.rng, &mut outcome.requests);
        }

        if runtime.progress.elapsed >= runtime.duration {
            info!(
                waves_fired = runtime.progress.waves_fired,
                "crescendo completed"
            );
            outcome.completed = true;
            self.runtime = None;
        }
        outcome
    }

    /// Discards the running crescendo. Returns whether one was running.
    pub fn cancel(&mut self) -> bool {
        let cancelled = self.runtime.take().is_some();
        if cancelled {
            info!("crescendo cancelled");
        }
        cancelled
    }

    /// Reports whether a crescendo is active.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.runtime.is_some()
    }

    /// Progress of the running crescendo, if any.
    #[must_use]
    pub fn progress(&self) -> Option<CrescendoProgress> {
        self.runtime.as_ref().map(|runtime| runtime.progress)
    }
}

fn validate(config: &CrescendoConfig) -> Result<(), CrescendoError> {
    if config.duration_secs > MAX_TIMER_SECS || config.wave_interval_secs > MAX_TIMER_SECS {
        return Err(CrescendoError::InvalidConfig(
            "timer exceeds the longest supported duration",
        ));
    }
    if config.wave_interval().is_zero() {
        return Err(CrescendoError::InvalidConfig("wave interval must be positive"));
    }
    if config.duration().is_zero() {
        return Err(CrescendoError::InvalidConfig("duration must be positive"));
    }
    if config.wave_size_min > config.wave_size_max {
        return Err(CrescendoError::InvalidConfig(
            "minimum wave size exceeds maximum",
        ));
    }
    Ok(())
}

fn fire_wave(
    runtime: &mut CrescendoRuntime,
    wave: u32,
    rng: &mut ChaCha8Rng,
    requests: &mut Vec<CrescendoRequest>,
) {
    let size = rng.gen_range(runtime.config.wave_size_min..=runtime.config.wave_size_max);
    debug!(wave, size, "crescendo wave fired");
    requests.push(CrescendoRequest::CommonWave { wave, size });

    if runtime.config.is_special_wave(wave) {
        requests.push(CrescendoRequest::Special { wave });
    }
    if runtime.config.boss_wave == Some(wave) && !runtime.progress.boss_requested {
        runtime.progress.boss_requested = true;
        requests.push(CrescendoRequest::Boss { wave });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_interval_is_rejected() {
        let config = CrescendoConfig {
            wave_interval_secs: 0.0,
            ..CrescendoConfig::default()
        };
        assert_eq!(
            validate(&config),
            Err(CrescendoError::InvalidConfig("wave interval must be positive"))
        );
    }

    #[test]
    fn oversized_timers_are_rejected() {
        let config = CrescendoConfig {
            duration_secs: 1.0e30,
            ..CrescendoConfig::default()
        };
        assert_eq!(
            validate(&config),
            Err(CrescendoError::InvalidConfig(
                "timer exceeds the longest supported duration"
            ))
        );
    }

    #[test]
    fn inverted_wave_sizes_are_rejected() {
        let config = CrescendoConfig {
            wave_size_min: 10,
            wave_size_max: 2,
            ..CrescendoConfig::default()
        };
        assert!(validate(&config).is_err());
    }

    #[test]
    fn default_config_is_valid() {
        assert_eq!(validate(&CrescendoConfig::default()), Ok(()));
    }
}
