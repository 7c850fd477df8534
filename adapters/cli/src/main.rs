#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays the Sparta arena headlessly.

mod config;
mod simulation;

use std::{path::PathBuf, time::Duration};

use anyhow::{ensure, Context, Result};
use clap::Parser;
use log::info;

use crate::simulation::Simulation;

/// Runs the Sparta arena campaign without a renderer and prints a summary.
#[derive(Debug, Parser)]
#[command(name = "sparta", version, about)]
struct Args {
    /// Game file to load instead of the bundled campaign.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Seed for the spawn volume; defaults to the game file's seed.
    #[arg(long)]
    seed: Option<u64>,
    /// Simulated seconds after which the run stops.
    #[arg(long, default_value_t = 600.0)]
    max_seconds: f32,
    /// Length of a simulated frame in milliseconds.
    #[arg(long, default_value_t = 16)]
    tick_ms: u64,
    /// Leaves the character idle instead of steering it automatically.
    #[arg(long)]
    no_pilot: bool,
}

/// Entry point for the Sparta command-line interface.
fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    ensure!(args.tick_ms > 0, "--tick-ms must be positive");
    let limit = Duration::try_from_secs_f32(args.max_seconds)
        .context("--max-seconds must be a non-negative number")?;
    let tick = Duration::from_millis(args.tick_ms);

    let game = config::load(args.config.as_deref())?;
    let seed = args.seed.unwrap_or(game.seed);
    info!("starting run with seed {seed}");

    let mut simulation = Simulation::new(game, seed, !args.no_pilot);
    simulation.start()?;
    while !simulation.is_finished() && simulation.elapsed() < limit {
        simulation.step(tick);
    }

    println!("{}", simulation.summary());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn arguments_are_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn parses_flags() {
        let args = Args::try_parse_from([
            "sparta",
            "--seed",
            "9",
            "--max-seconds",
            "12.5",
            "--tick-ms",
            "50",
            "--no-pilot",
        ])
        .expect("valid flags");

        assert_eq!(args.seed, Some(9));
        assert_eq!(args.max_seconds, 12.5);
        assert_eq!(args.tick_ms, 50);
        assert!(args.no_pilot);
        assert!(args.config.is_none());
    }
}
