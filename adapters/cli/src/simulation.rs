//! Headless game loop wiring the world to the gameplay systems.

use std::{fmt, time::Duration};

use anyhow::{Context, Result};
use log::{debug, info};
use sparta_core::{Command, Event, Session};
use sparta_system_pilot::Pilot;
use sparta_system_progression::{Collaborators, GameOverReason, Progression};
use sparta_system_spawning::SpawnVolume;
use sparta_world::{self as world, query, World};

use crate::config::Game;

/// How a run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Outcome {
    /// The game ended for the provided reason.
    GameOver(GameOverReason),
    /// The time limit elapsed first.
    TimeLimit,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GameOver(GameOverReason::CampaignComplete) => f.write_str("campaign complete"),
            Self::GameOver(GameOverReason::PlayerDied) => f.write_str("player died"),
            Self::GameOver(GameOverReason::LevelUnavailable) => f.write_str("level unavailable"),
            Self::TimeLimit => f.write_str("time limit reached"),
        }
    }
}

/// Statistics reported at the end of a run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Summary {
    pub(crate) levels_cleared: u32,
    pub(crate) waves_cleared: u32,
    pub(crate) score: u32,
    pub(crate) coins_collected: u32,
    pub(crate) mines_detonated: u32,
    pub(crate) damage_taken: f32,
    pub(crate) elapsed: Duration,
    pub(crate) outcome: Outcome,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "outcome:         {}", self.outcome)?;
        writeln!(f, "levels cleared:  {}", self.levels_cleared)?;
        writeln!(f, "waves cleared:   {}", self.waves_cleared)?;
        writeln!(f, "score:           {}", self.score)?;
        writeln!(f, "coins collected: {}", self.coins_collected)?;
        writeln!(f, "mines detonated: {}", self.mines_detonated)?;
        writeln!(f, "damage taken:    {:.0}", self.damage_taken)?;
        write!(f, "elapsed:         {:.1}s", self.elapsed.as_secs_f32())
    }
}

#[derive(Debug, Default)]
struct Tally {
    coins_collected: u32,
    mines_detonated: u32,
    damage_taken: f32,
}

impl Tally {
    fn record(&mut self, event: &Event) {
        match event {
            Event::ItemCollected { kind, .. } if kind.is_coin() => self.coins_collected += 1,
            Event::MineDetonated { .. } => self.mines_detonated += 1,
            Event::PlayerDamaged { amount, health } => {
                self.damage_taken += amount;
                debug!("player damaged by {amount:.0}, {health:.0} left");
            }
            Event::MessageShown { text, .. } => info!("{text}"),
            _ => {}
        }
    }
}

/// Owns the world, the session and every system of a headless run.
#[derive(Debug)]
pub(crate) struct Simulation {
    world: World,
    session: Session,
    spawn_volume: SpawnVolume,
    progression: Progression,
    pilot: Option<Pilot>,
    elapsed: Duration,
    tally: Tally,
}

impl Simulation {
    pub(crate) fn new(game: Game, seed: u64, with_pilot: bool) -> Self {
        let waves_per_level = game.waves_per_level();
        Self {
            world: World::new(game.world),
            session: Session::new(),
            spawn_volume: SpawnVolume::new(game.spawn_box, game.spawn_tables, waves_per_level, seed),
            progression: Progression::new(game.progression),
            pilot: with_pilot.then(|| Pilot::new(game.pilot)),
            elapsed: Duration::ZERO,
            tally: Tally::default(),
        }
    }

    /// Opens the session's current level.
    pub(crate) fn start(&mut self) -> Result<()> {
        let open = self
            .progression
            .open_current_level(&self.session)
            .context("cannot open the first level")?;
        self.pump(vec![open]);
        Ok(())
    }

    /// Advances the simulation by one frame.
    pub(crate) fn step(&mut self, dt: Duration) {
        self.elapsed = self.elapsed.saturating_add(dt);
        self.pump(vec![Command::Tick { dt }]);
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.progression.game_over_reason().is_some()
    }

    pub(crate) fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub(crate) fn summary(&self) -> Summary {
        let max_levels = self.progression.config().waves().max_levels();
        Summary {
            levels_cleared: self.session.current_level_index().min(max_levels),
            waves_cleared: self.progression.waves_cleared(),
            score: self.session.total_score(),
            coins_collected: self.tally.coins_collected,
            mines_detonated: self.tally.mines_detonated,
            damage_taken: self.tally.damage_taken,
            elapsed: self.elapsed,
            outcome: self
                .progression
                .game_over_reason()
                .map_or(Outcome::TimeLimit, Outcome::GameOver),
        }
    }

    /// Applies commands and feeds the resulting events to the systems until
    /// no system has anything left to say.
    fn pump(&mut self, initial: Vec<Command>) {
        let mut pending = initial;
        while !pending.is_empty() {
            let mut events = Vec::new();
            for command in pending.drain(..) {
                world::apply(&mut self.world, command, &mut events);
            }
            for event in &events {
                self.tally.record(event);
            }

            let mut collaborators = Collaborators {
                session: Some(&mut self.session),
                spawn_volume: Some(&mut self.spawn_volume),
                surfaces: query::surfaces(&self.world),
            };
            self.progression
                .handle(&events, &mut collaborators, &mut pending);

            if let Some(pilot) = self.pilot.as_mut() {
                pilot.handle(
                    &events,
                    &query::player(&self.world),
                    &query::item_view(&self.world),
                    &mut pending,
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{parse, DEFAULT_GAME};

    const TICK: Duration = Duration::from_millis(100);

    fn run(seed: u64, with_pilot: bool, seconds: u32) -> Summary {
        let game = parse(DEFAULT_GAME).expect("bundled game is valid");
        let mut simulation = Simulation::new(game, seed, with_pilot);
        simulation.start().expect("first level opens");
        for _ in 0..seconds * 10 {
            if simulation.is_finished() {
                break;
            }
            simulation.step(TICK);
        }
        simulation.summary()
    }

    #[test]
    fn idle_player_clears_level_on_timeouts() {
        let summary = run(1, false, 80);

        assert_eq!(summary.levels_cleared, 1);
        assert_eq!(summary.waves_cleared, 3);
        assert_eq!(summary.score, 0);
        assert_eq!(summary.outcome, Outcome::TimeLimit);
    }

    #[test]
    fn pilot_collects_coins() {
        let summary = run(7, true, 30);

        assert!(summary.coins_collected > 0);
        assert!(summary.score > 0);
    }

    #[test]
    fn equal_seeds_replay_identically() {
        assert_eq!(run(42, true, 120), run(42, true, 120));
    }

    #[test]
    fn summary_lists_outcome_first() {
        let summary = run(3, false, 1);
        let rendered = summary.to_string();

        assert!(rendered.starts_with("outcome:         time limit reached"));
        assert!(rendered.ends_with("elapsed:         1.0s"));
    }
}
