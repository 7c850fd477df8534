#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Wave and level progression system.
//!
//! The controller starts a level whenever the world reports a loaded map,
//! runs the level's waves one after another and decides when a wave, a level
//! or the whole game is over. A wave ends early once every coin spawned for
//! it has been collected, or when its time limit runs out. Clearing the last
//! wave of a level moves the session to the next map.

use std::time::Duration;

use log::{debug, error, info, warn};
use sparta_core::{
    Command, Event, Fired, HudSnapshot, MessageColor, Scheduler, Screen, Session, SurfaceView,
    TimerHandle, WaveLookupError, WaveTable,
};
use sparta_system_spawning::SpawnVolume;
use thiserror::Error;

const WAVE_STARTED_MESSAGE: Duration = Duration::from_secs(3);
const LEVEL_COMPLETE_MESSAGE: Duration = Duration::from_secs(3);
const WAVE_COMPLETE_MESSAGE: Duration = Duration::from_secs(2);
const GAME_OVER_MESSAGE: Duration = Duration::from_secs(5);

/// Configuration parameters required to construct the progression system.
#[derive(Clone, Debug, PartialEq)]
pub struct ProgressionConfig {
    waves: WaveTable,
    level_maps: Vec<String>,
    inter_wave_delay: Duration,
    hud_interval: Duration,
}

impl ProgressionConfig {
    /// Creates a configuration with a two second pause between waves and a
    /// HUD refresh every tenth of a second.
    #[must_use]
    pub fn new(waves: WaveTable, level_maps: Vec<String>) -> Self {
        Self {
            waves,
            level_maps,
            inter_wave_delay: Duration::from_secs(2),
            hud_interval: Duration::from_millis(100),
        }
    }

    /// Overrides the pause between a completed wave and the next one.
    #[must_use]
    pub fn with_inter_wave_delay(mut self, delay: Duration) -> Self {
        self.inter_wave_delay = delay;
        self
    }

    /// Overrides the HUD refresh cadence.
    #[must_use]
    pub fn with_hud_interval(mut self, interval: Duration) -> Self {
        self.hud_interval = interval;
        self
    }

    /// Wave definitions of the campaign.
    #[must_use]
    pub const fn waves(&self) -> &WaveTable {
        &self.waves
    }

    /// Map loaded for the provided level index.
    #[must_use]
    pub fn level_map(&self, level: u32) -> Option<&str> {
        let index = usize::try_from(level).ok()?;
        self.level_maps.get(index).map(String::as_str)
    }

    /// Pause between a completed wave and the next one.
    #[must_use]
    pub const fn inter_wave_delay(&self) -> Duration {
        self.inter_wave_delay
    }

    /// HUD refresh cadence.
    #[must_use]
    pub const fn hud_interval(&self) -> Duration {
        self.hud_interval
    }
}

/// Lifecycle phase of the controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// No level has been started yet.
    Idle,
    /// A level is being set up.
    LevelStarting,
    /// A wave is running.
    WaveActive,
    /// The last wave finished and the next one is pending.
    WaveCompleting,
    /// Every wave of the level finished; the next map was requested.
    LevelEnding,
    /// The game ended. Terminal.
    GameOver,
}

/// Reason the game ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GameOverReason {
    /// Every level of the campaign was cleared.
    CampaignComplete,
    /// The character died.
    PlayerDied,
    /// The next level could not be loaded.
    LevelUnavailable,
}

/// Coin counters of the running wave.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WaveProgress {
    spawned: u32,
    collected: u32,
}

impl WaveProgress {
    /// Coins spawned for the wave.
    #[must_use]
    pub const fn spawned(&self) -> u32 {
        self.spawned
    }

    /// Coins collected since the wave started.
    #[must_use]
    pub const fn collected(&self) -> u32 {
        self.collected
    }

    /// Reports whether every spawned coin has been collected.
    #[must_use]
    pub const fn is_cleared(&self) -> bool {
        self.spawned > 0 && self.collected >= self.spawned
    }
}

/// Errors raised while advancing through the campaign.
#[derive(Debug, Error)]
pub enum ProgressionError {
    /// The wave table has no definition for the requested wave.
    #[error(transparent)]
    WaveUnavailable(#[from] WaveLookupError),
    /// No map is configured for the requested level.
    #[error("no map configured for level index {level}")]
    MapMissing {
        /// Level index without a map.
        level: u32,
    },
    /// No session was supplied.
    #[error("no session available")]
    SessionMissing,
}

/// Collaborators the controller borrows while handling a batch of events.
#[derive(Debug)]
pub struct Collaborators<'a> {
    /// Cross-level session state.
    pub session: Option<&'a mut Session>,
    /// Spawn volume of the loaded level.
    pub spawn_volume: Option<&'a mut SpawnVolume>,
    /// Supporting surfaces of the loaded level.
    pub surfaces: SurfaceView<'a>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ProgressionTimer {
    WaveTimeout,
    NextWave,
    HudRefresh,
}

/// Pure system that drives waves, levels and the end of the game.
#[derive(Debug)]
pub struct Progression {
    config: ProgressionConfig,
    phase: Phase,
    level_index: u32,
    wave_index: u32,
    progress: WaveProgress,
    timers: Scheduler<ProgressionTimer>,
    wave_timer: Option<TimerHandle>,
    next_wave_timer: Option<TimerHandle>,
    waves_cleared: u32,
    game_over_reason: Option<GameOverReason>,
}

impl Progression {
    /// Creates a new progression system using the supplied configuration.
    #[must_use]
    pub fn new(config: ProgressionConfig) -> Self {
        Self {
            config,
            phase: Phase::Idle,
            level_index: 0,
            wave_index: 0,
            progress: WaveProgress::default(),
            timers: Scheduler::new(),
            wave_timer: None,
            next_wave_timer: None,
            waves_cleared: 0,
            game_over_reason: None,
        }
    }

    /// Configuration the controller runs with.
    #[must_use]
    pub const fn config(&self) -> &ProgressionConfig {
        &self.config
    }

    /// Current lifecycle phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Zero-based index of the running level.
    #[must_use]
    pub const fn level_index(&self) -> u32 {
        self.level_index
    }

    /// Zero-based index of the running wave.
    #[must_use]
    pub const fn wave_index(&self) -> u32 {
        self.wave_index
    }

    /// Coin counters of the running wave.
    #[must_use]
    pub const fn progress(&self) -> WaveProgress {
        self.progress
    }

    /// Number of waves completed over the whole run.
    #[must_use]
    pub const fn waves_cleared(&self) -> u32 {
        self.waves_cleared
    }

    /// Why the game ended, once it has.
    #[must_use]
    pub const fn game_over_reason(&self) -> Option<GameOverReason> {
        self.game_over_reason
    }

    /// Time left before the running wave times out.
    #[must_use]
    pub fn remaining_wave_time(&self) -> Option<Duration> {
        self.wave_timer
            .and_then(|handle| self.timers.remaining(handle))
    }

    /// Command that loads the map of the session's current level.
    pub fn open_current_level(&self, session: &Session) -> Result<Command, ProgressionError> {
        let level = session.current_level_index();
        let map = self
            .config
            .level_map(level)
            .ok_or(ProgressionError::MapMissing { level })?;
        Ok(Command::LoadLevel {
            map: map.to_owned(),
        })
    }

    /// Consumes world events and emits the commands that advance the campaign.
    pub fn handle(
        &mut self,
        events: &[Event],
        collaborators: &mut Collaborators<'_>,
        out: &mut Vec<Command>,
    ) {
        for event in events {
            if self.phase == Phase::GameOver {
                return;
            }

            match event {
                Event::LevelLoaded { map } => {
                    info!("map `{map}` loaded");
                    self.begin_play(collaborators, out);
                }
                Event::LevelLoadRejected { map } => {
                    error!("map `{map}` could not be loaded");
                    self.on_game_over(GameOverReason::LevelUnavailable, out);
                }
                Event::TimeAdvanced { dt } => self.advance(*dt, collaborators, out),
                Event::ItemCollected { kind, value, .. } if kind.is_coin() => {
                    if let Some(session) = collaborators.session.as_deref_mut() {
                        session.add_to_score(*value);
                    }
                    self.on_coin_collected(collaborators, out);
                }
                Event::PlayerDied => self.on_game_over(GameOverReason::PlayerDied, out),
                _ => {}
            }
        }
    }

    /// Starts the freshly loaded level and the periodic HUD refresh.
    pub fn begin_play(&mut self, collaborators: &mut Collaborators<'_>, out: &mut Vec<Command>) {
        if self.phase == Phase::GameOver {
            return;
        }

        self.timers.clear();
        self.wave_timer = None;
        self.next_wave_timer = None;
        let _ = self
            .timers
            .schedule_repeating(self.config.hud_interval, ProgressionTimer::HudRefresh);
        self.start_level(collaborators, out);
    }

    /// Shows the HUD and starts the first wave of the session's current level.
    pub fn start_level(&mut self, collaborators: &mut Collaborators<'_>, out: &mut Vec<Command>) {
        if self.phase == Phase::GameOver {
            return;
        }

        self.phase = Phase::LevelStarting;
        out.push(Command::ShowScreen {
            screen: Screen::Hud,
        });

        match collaborators.session.as_deref() {
            Some(session) => self.level_index = session.current_level_index(),
            None => error!(
                "{}; staying on level {}",
                ProgressionError::SessionMissing,
                self.level_index + 1
            ),
        }
        self.wave_index = 0;

        if let Err(error) = self.start_wave(collaborators, out) {
            error!("cannot start level {}: {error}", self.level_index + 1);
        }
    }

    /// Spawns the running wave's items and arms its time limit.
    ///
    /// Fails without spawning anything when no definition exists for the wave.
    pub fn start_wave(
        &mut self,
        collaborators: &mut Collaborators<'_>,
        out: &mut Vec<Command>,
    ) -> Result<(), ProgressionError> {
        if self.phase == Phase::GameOver {
            return Ok(());
        }

        self.progress = WaveProgress::default();
        let wave = self
            .config
            .waves
            .wave(self.level_index, self.wave_index)?;

        let level_number = self.level_index + 1;
        let wave_number = self.wave_index + 1;
        out.push(Command::ShowMessage {
            text: format!("Level {level_number} - Wave {wave_number} started!"),
            duration: WAVE_STARTED_MESSAGE,
            color: MessageColor::Yellow,
        });
        info!(
            "level {level_number} wave {wave_number}: {} items, {:.1}s",
            wave.item_count(),
            wave.duration().as_secs_f32()
        );

        match collaborators.spawn_volume.as_deref_mut() {
            Some(volume) => {
                if let Err(error) = volume.set_current_table_index(self.level_index, self.wave_index)
                {
                    warn!("{error}");
                }
                for _ in 0..wave.item_count() {
                    let spawned = volume.spawn_random_item(collaborators.surfaces, out);
                    if spawned.is_some_and(|kind| kind.is_coin()) {
                        self.progress.spawned += 1;
                    }
                }
            }
            None => warn!("no spawn volume in the level; wave starts empty"),
        }

        self.cancel_wave_timer();
        self.wave_timer = Some(
            self.timers
                .schedule(wave.duration(), ProgressionTimer::WaveTimeout),
        );
        self.phase = Phase::WaveActive;
        self.update_hud(collaborators, out);

        info!(
            "level {level_number} wave {wave_number} started with {} coins",
            self.progress.spawned
        );
        Ok(())
    }

    /// Counts a collected coin and completes the wave once all are collected.
    pub fn on_coin_collected(
        &mut self,
        collaborators: &mut Collaborators<'_>,
        out: &mut Vec<Command>,
    ) {
        if self.phase == Phase::GameOver {
            return;
        }

        self.progress.collected += 1;
        debug!(
            "coin collected: {} / {}",
            self.progress.collected, self.progress.spawned
        );
        if self.phase == Phase::WaveActive && self.progress.is_cleared() {
            info!("all coins collected in wave {}", self.wave_index + 1);
            self.check_wave_completion(collaborators, out);
        }
    }

    /// Completes the running wave because its time limit elapsed.
    pub fn on_wave_time_up(&mut self, collaborators: &mut Collaborators<'_>, out: &mut Vec<Command>) {
        info!("wave {} time is up", self.wave_index + 1);
        self.check_wave_completion(collaborators, out);
    }

    /// Completes the running wave and moves on to the next wave or level.
    ///
    /// Only the first call for a running wave has an effect.
    pub fn check_wave_completion(
        &mut self,
        collaborators: &mut Collaborators<'_>,
        out: &mut Vec<Command>,
    ) {
        self.cancel_wave_timer();
        if self.phase != Phase::WaveActive {
            return;
        }

        self.waves_cleared += 1;
        self.wave_index += 1;
        if self.wave_index >= self.config.waves.waves_per_level() {
            info!("level {} completed", self.level_index + 1);
            out.push(Command::ShowMessage {
                text: format!("Level {} complete!", self.level_index + 1),
                duration: LEVEL_COMPLETE_MESSAGE,
                color: MessageColor::Green,
            });
            if let Err(error) = self.end_level(collaborators, out) {
                error!("{error}");
            }
        } else {
            info!("wave {} completed", self.wave_index);
            out.push(Command::ShowMessage {
                text: format!("Wave {} complete! Next wave incoming...", self.wave_index),
                duration: WAVE_COMPLETE_MESSAGE,
                color: MessageColor::Cyan,
            });
            self.phase = Phase::WaveCompleting;
            self.next_wave_timer = Some(
                self.timers
                    .schedule(self.config.inter_wave_delay, ProgressionTimer::NextWave),
            );
        }
    }

    /// Moves the session to the next level and requests its map.
    ///
    /// Clearing the last level, or a level without a map, ends the game.
    pub fn end_level(
        &mut self,
        collaborators: &mut Collaborators<'_>,
        out: &mut Vec<Command>,
    ) -> Result<(), ProgressionError> {
        if self.phase == Phase::GameOver {
            return Ok(());
        }
        self.phase = Phase::LevelEnding;

        let session = collaborators
            .session
            .as_deref_mut()
            .ok_or(ProgressionError::SessionMissing)?;
        let next = session.current_level_index().saturating_add(1);
        session.set_current_level_index(next);
        info!("moving to level index {next}");

        if next >= self.config.waves.max_levels() {
            info!("all levels completed");
            self.on_game_over(GameOverReason::CampaignComplete, out);
            return Ok(());
        }

        match self.config.level_map(next) {
            Some(map) => {
                info!("opening map `{map}`");
                out.push(Command::LoadLevel {
                    map: map.to_owned(),
                });
                Ok(())
            }
            None => {
                self.on_game_over(GameOverReason::LevelUnavailable, out);
                Err(ProgressionError::MapMissing { level: next })
            }
        }
    }

    /// Ends the game: stops every timer, pauses play and shows the end screen.
    ///
    /// Later calls have no effect.
    pub fn on_game_over(&mut self, reason: GameOverReason, out: &mut Vec<Command>) {
        if self.phase == Phase::GameOver {
            return;
        }

        info!("game over: {reason:?}");
        self.timers.clear();
        self.wave_timer = None;
        self.next_wave_timer = None;
        self.phase = Phase::GameOver;
        self.game_over_reason = Some(reason);

        out.push(Command::ShowMessage {
            text: "Game Over!".to_owned(),
            duration: GAME_OVER_MESSAGE,
            color: MessageColor::Red,
        });
        out.push(Command::SetPaused { paused: true });
        out.push(Command::ShowScreen {
            screen: Screen::MainMenu { restart: true },
        });
    }

    /// Pushes remaining time, score and level/wave numbers to the HUD.
    pub fn update_hud(&self, collaborators: &Collaborators<'_>, out: &mut Vec<Command>) {
        let last_wave = self.config.waves.waves_per_level().saturating_sub(1);
        out.push(Command::UpdateHud {
            hud: HudSnapshot {
                remaining: self.remaining_wave_time().unwrap_or(Duration::ZERO),
                score: collaborators.session.as_deref().map(Session::total_score),
                level_index: self.level_index,
                wave_index: self.wave_index.min(last_wave),
            },
        });
    }

    fn advance(&mut self, dt: Duration, collaborators: &mut Collaborators<'_>, out: &mut Vec<Command>) {
        let mut fired = Vec::new();
        self.timers.advance(dt, &mut fired);

        for Fired { handle, payload } in fired {
            if self.phase == Phase::GameOver {
                return;
            }

            match payload {
                ProgressionTimer::WaveTimeout => {
                    if self.wave_timer != Some(handle) {
                        continue;
                    }
                    self.wave_timer = None;
                    self.on_wave_time_up(collaborators, out);
                }
                ProgressionTimer::NextWave => {
                    if self.next_wave_timer != Some(handle) || self.phase != Phase::WaveCompleting {
                        continue;
                    }
                    self.next_wave_timer = None;
                    if let Err(error) = self.start_wave(collaborators, out) {
                        error!("cannot start wave {}: {error}", self.wave_index + 1);
                    }
                }
                ProgressionTimer::HudRefresh => self.update_hud(collaborators, out),
            }
        }
    }

    fn cancel_wave_timer(&mut self) {
        if let Some(handle) = self.wave_timer.take() {
            let _ = self.timers.cancel(handle);
        }
    }
}
