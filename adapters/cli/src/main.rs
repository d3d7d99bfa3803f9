#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a scripted headless horde director session.

mod arena;
mod simulation;

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{bail, Context, Result};
use clap::Parser;
use horde_director_core::{duration_from_secs, CrescendoConfig, DifficultyTier};
use horde_director_system_pacing::{Director, DirectorConfig};
use serde::Deserialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::simulation::{Script, Simulation};

/// Command-line arguments accepted by the horde director binary.
#[derive(Debug, Parser)]
#[command(
    name = "horde-director",
    about = "Runs a scripted headless session of the horde director"
)]
struct CliArgs {
    /// TOML file with `[director]` and `[crescendo]` tables.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Difficulty tier (easy, normal, advanced, expert); overrides the file.
    #[arg(long)]
    difficulty: Option<DifficultyTier>,
    /// Seed for the director and the generated arena; overrides the file.
    #[arg(long)]
    seed: Option<u64>,
    /// Simulated session length in seconds.
    #[arg(long, value_name = "SECS", default_value_t = 300.0)]
    duration: f32,
    /// Fixed simulation rate.
    #[arg(long, default_value_t = 10)]
    tick_hz: u32,
    /// Start the crescendo this many seconds into the session.
    #[arg(long, value_name = "SECS")]
    crescendo_at: Option<f32>,
    /// Reach the safe area this many seconds into the session.
    #[arg(long, value_name = "SECS")]
    safe_room_at: Option<f32>,
}

/// Layout of the optional configuration file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ScenarioFile {
    director: DirectorConfig,
    crescendo: CrescendoConfig,
}

/// Entry point for the horde director command-line interface.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = CliArgs::parse();
    if args.tick_hz == 0 {
        bail!("--tick-hz must be positive");
    }
    if !(args.duration.is_finite() && args.duration > 0.0) {
        bail!("--duration must be a positive number of seconds");
    }

    let scenario = load_scenario(args.config.as_deref())?;
    let mut config = scenario.director;
    if let Some(tier) = args.difficulty {
        config.tier = tier;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }

    let script = Script {
        duration: duration_from_secs(args.duration),
        tick: Duration::from_secs(1) / args.tick_hz,
        crescendo_at: args.crescendo_at.map(duration_from_secs),
        crescendo: scenario.crescendo,
        safe_room_at: args.safe_room_at.map(duration_from_secs),
        seed: config.seed,
    };
    info!(
        tier = ?config.tier,
        seed = config.seed,
        duration_secs = args.duration,
        tick_hz = args.tick_hz,
        "starting session"
    );

    let director = Director::new(config).context("invalid director configuration")?;
    let summary = Simulation::new(director, script.seed).run(&script);
    println!("{summary}");
    Ok(())
}

fn load_scenario(path: Option<&Path>) -> Result<ScenarioFile> {
    let Some(path) = path else {
        return Ok(ScenarioFile::default());
    };
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    toml::from_str(&contents)
        .with_context(|| format!("failed to parse config file {}", path.display()))
}
