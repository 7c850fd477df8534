#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Sparta arena.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative level world, and pure systems. Adapters and systems submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! for systems to react to deterministically. Systems consume event streams,
//! query immutable snapshots, and respond exclusively with new command
//! batches.

mod scheduler;

use std::time::Duration;

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use scheduler::{Fired, Scheduler, TimerHandle};

/// Tag carried by the playable character. Mines only damage tagged actors.
pub const PLAYER_TAG: &str = "Player";

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Replaces the running level with the map registered under `map`.
    LoadLevel {
        /// Name of the map to open.
        map: String,
    },
    /// Spawns an item of the provided kind at a fixed position.
    SpawnItem {
        /// Kind of item to create.
        kind: ItemKind,
        /// World-space location of the new item.
        position: Vec3,
    },
    /// Removes an item without activating it.
    DespawnItem {
        /// Identifier of the item to remove.
        item: ItemId,
    },
    /// Feeds one frame of movement input relative to the control yaw.
    MovePlayer {
        /// Forward axis input in `[-1, 1]`.
        forward: f32,
        /// Right axis input in `[-1, 1]`.
        right: f32,
    },
    /// Rotates the control view of the character.
    Look {
        /// Yaw delta in degrees.
        yaw_degrees: f32,
        /// Pitch delta in degrees.
        pitch_degrees: f32,
    },
    /// Starts or stops a jump.
    SetJumping {
        /// Whether the jump input is held.
        active: bool,
    },
    /// Starts or stops sprinting.
    SetSprinting {
        /// Whether the sprint input is held.
        active: bool,
    },
    /// Applies damage to the character.
    DamagePlayer {
        /// Amount of health removed.
        amount: f32,
    },
    /// Restores health to the character.
    HealPlayer {
        /// Amount of health restored.
        amount: f32,
    },
    /// Pauses or resumes gameplay.
    SetPaused {
        /// Requested pause state.
        paused: bool,
    },
    /// Switches the active UI screen.
    ShowScreen {
        /// Screen to display.
        screen: Screen,
    },
    /// Displays a transient on-screen message.
    ShowMessage {
        /// Text shown to the player.
        text: String,
        /// How long the message remains visible.
        duration: Duration,
        /// Colour the message is rendered with.
        color: MessageColor,
    },
    /// Replaces the HUD contents.
    UpdateHud {
        /// Latest HUD projection.
        hud: HudSnapshot,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that a map finished loading and gameplay may begin.
    LevelLoaded {
        /// Name of the loaded map.
        map: String,
    },
    /// Reports that no map is registered under the requested name.
    LevelLoadRejected {
        /// Name that failed to resolve.
        map: String,
    },
    /// Confirms that an item was created.
    ItemSpawned {
        /// Identifier assigned to the item.
        item: ItemId,
        /// Kind of the new item.
        kind: ItemKind,
        /// Location the item was placed at.
        position: Vec3,
    },
    /// Reports that the character picked up an item.
    ItemCollected {
        /// Identifier of the collected item.
        item: ItemId,
        /// Kind of the collected item.
        kind: ItemKind,
        /// Points awarded by the pickup.
        value: u32,
    },
    /// Reports that a delayed-effect item was armed by the character.
    ItemTriggered {
        /// Identifier of the armed item.
        item: ItemId,
        /// Kind of the armed item.
        kind: ItemKind,
    },
    /// Reports that a mine exploded.
    MineDetonated {
        /// Identifier of the exploded mine.
        item: ItemId,
        /// Center of the explosion.
        position: Vec3,
        /// Whether the character was inside the explosion radius.
        player_hit: bool,
    },
    /// Confirms that an item left the world.
    ItemDestroyed {
        /// Identifier of the removed item.
        item: ItemId,
    },
    /// Confirms that a transient effect started playing.
    EffectSpawned {
        /// Identifier assigned to the effect.
        effect: EffectId,
        /// Kind of effect.
        kind: EffectKind,
        /// Location the effect plays at.
        position: Vec3,
    },
    /// Confirms that a transient effect finished and was cleaned up.
    EffectExpired {
        /// Identifier of the finished effect.
        effect: EffectId,
    },
    /// Reports damage taken by the character.
    PlayerDamaged {
        /// Damage applied.
        amount: f32,
        /// Health remaining after the damage.
        health: f32,
    },
    /// Reports health restored to the character.
    PlayerHealed {
        /// Health restored.
        amount: f32,
        /// Health after healing.
        health: f32,
    },
    /// Reports that the character's health reached zero.
    PlayerDied,
    /// Announces a new pause state.
    PauseChanged {
        /// Pause state after processing the command.
        paused: bool,
    },
    /// Announces a new active UI screen.
    ScreenChanged {
        /// Screen that became active.
        screen: Screen,
    },
    /// Announces that an on-screen message became visible.
    MessageShown {
        /// Text of the message.
        text: String,
        /// Colour of the message.
        color: MessageColor,
    },
}

/// Unique identifier assigned to a spawned item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(u32);

impl ItemId {
    /// Creates a new item identifier with the provided numeric value.
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

/// Unique identifier assigned to a transient effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EffectId(u32);

impl EffectId {
    /// Creates a new effect identifier with the provided numeric value.
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

/// Kinds of items the spawn volume may place into a level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    /// Generic pickup that only plays effects and disappears.
    Pickup,
    /// Low-value coin.
    SmallCoin,
    /// High-value coin.
    BigCoin,
    /// Pickup that restores health.
    Healing,
    /// Hazard that explodes a few seconds after being touched.
    Mine,
}

impl ItemKind {
    /// Reports whether the kind counts toward a wave's collectible total.
    #[must_use]
    pub const fn is_coin(self) -> bool {
        matches!(self, Self::SmallCoin | Self::BigCoin)
    }

    /// Human-readable name used in logs.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pickup => "pickup",
            Self::SmallCoin => "small coin",
            Self::BigCoin => "big coin",
            Self::Healing => "healing",
            Self::Mine => "mine",
        }
    }
}

/// Kinds of transient presentation effects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EffectKind {
    /// Particles played when an item is picked up.
    PickupParticle,
    /// Sound played when an item is picked up.
    PickupSound,
    /// Particles played when a mine explodes.
    ExplosionParticle,
    /// Sound played when a mine explodes.
    ExplosionSound,
}

/// Screens the UI collaborator can display.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Screen {
    /// In-game heads-up display.
    Hud,
    /// Main menu, optionally offering a restart after the game ended.
    MainMenu {
        /// Whether the menu is shown after a finished game.
        restart: bool,
    },
}

/// Colours used for transient on-screen messages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MessageColor {
    /// Wave announcements.
    Yellow,
    /// Level completion.
    Green,
    /// Wave completion.
    Cyan,
    /// Game over.
    Red,
}

/// Read-side projection pushed to the HUD widget.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HudSnapshot {
    /// Time left in the running wave.
    pub remaining: Duration,
    /// Session score, absent when no session is available.
    pub score: Option<u32>,
    /// Zero-based level index.
    pub level_index: u32,
    /// Zero-based wave index.
    pub wave_index: u32,
}

impl HudSnapshot {
    /// Formats the remaining wave time, e.g. `Time: 12.3`.
    #[must_use]
    pub fn time_text(&self) -> String {
        format!("Time: {:.1}", self.remaining.as_secs_f32())
    }

    /// Formats the session score, e.g. `Score: 40`.
    #[must_use]
    pub fn score_text(&self) -> Option<String> {
        self.score.map(|score| format!("Score: {score}"))
    }

    /// Formats the one-based level and wave numbers, e.g. `Level: 1 - Wave: 2`.
    #[must_use]
    pub fn level_text(&self) -> String {
        format!(
            "Level: {} - Wave: {}",
            self.level_index + 1,
            self.wave_index + 1
        )
    }
}

/// Colour band of the character's overhead health bar.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HealthBand {
    /// More than 60% health.
    Healthy,
    /// More than 30% health.
    Wounded,
    /// 30% health or less.
    Critical,
}

impl HealthBand {
    /// Classifies a health fraction in `[0, 1]`.
    #[must_use]
    pub fn from_fraction(fraction: f32) -> Self {
        if fraction > 0.6 {
            Self::Healthy
        } else if fraction > 0.3 {
            Self::Wounded
        } else {
            Self::Critical
        }
    }
}

/// Immutable representation of the character used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayerSnapshot {
    /// World-space location of the character.
    pub position: Vec3,
    /// Control yaw in degrees.
    pub yaw_degrees: f32,
    /// Control pitch in degrees.
    pub pitch_degrees: f32,
    /// Current health.
    pub health: f32,
    /// Maximum health.
    pub max_health: f32,
    /// Whether the sprint input is held.
    pub sprinting: bool,
    /// Whether the jump input is held.
    pub jumping: bool,
}

impl PlayerSnapshot {
    /// Current health as a fraction of maximum health.
    #[must_use]
    pub fn health_fraction(&self) -> f32 {
        if self.max_health <= 0.0 {
            return 0.0;
        }
        (self.health / self.max_health).clamp(0.0, 1.0)
    }

    /// Colour band for the overhead health bar.
    #[must_use]
    pub fn health_band(&self) -> HealthBand {
        HealthBand::from_fraction(self.health_fraction())
    }

    /// Overhead health text, e.g. `75 / 100`.
    #[must_use]
    pub fn overhead_text(&self) -> String {
        format!("{:.0} / {:.0}", self.health, self.max_health)
    }

    /// Reports whether the character still has health left.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }
}

/// Immutable representation of a single item used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ItemSnapshot {
    /// Identifier assigned to the item.
    pub id: ItemId,
    /// Kind of the item.
    pub kind: ItemKind,
    /// World-space location of the item.
    pub position: Vec3,
    /// Whether a delayed effect is counting down.
    pub armed: bool,
}

/// Read-only snapshot describing all items within the level.
#[derive(Clone, Debug, Default)]
pub struct ItemView {
    snapshots: Vec<ItemSnapshot>,
}

impl ItemView {
    /// Creates a new item view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<ItemSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured item snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &ItemSnapshot> {
        self.snapshots.iter()
    }

    /// Number of captured items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

/// Horizontal, axis-aligned supporting surface.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Surface {
    center: Vec3,
    half_extent: Vec2,
}

impl Surface {
    /// Creates a surface at `center.z` spanning `half_extent` around the center.
    #[must_use]
    pub fn new(center: Vec3, half_extent: Vec2) -> Self {
        Self {
            center,
            half_extent: half_extent.abs(),
        }
    }

    /// Center of the surface.
    #[must_use]
    pub const fn center(&self) -> Vec3 {
        self.center
    }

    /// Half extent along the x and y axes.
    #[must_use]
    pub const fn half_extent(&self) -> Vec2 {
        self.half_extent
    }

    /// Height of the surface.
    #[must_use]
    pub const fn height(&self) -> f32 {
        self.center.z
    }

    fn contains_xy(&self, point: Vec3) -> bool {
        (point.x - self.center.x).abs() <= self.half_extent.x
            && (point.y - self.center.y).abs() <= self.half_extent.y
    }
}

/// Read-only view over the level's supporting surfaces.
#[derive(Clone, Copy, Debug)]
pub struct SurfaceView<'a> {
    surfaces: &'a [Surface],
}

impl<'a> SurfaceView<'a> {
    /// Captures a new surface view backed by the provided slice.
    #[must_use]
    pub const fn new(surfaces: &'a [Surface]) -> Self {
        Self { surfaces }
    }

    /// View without any surface; every trace misses.
    #[must_use]
    pub const fn empty() -> Self {
        Self { surfaces: &[] }
    }

    /// Iterator over all surfaces.
    pub fn iter(&self) -> impl Iterator<Item = &'a Surface> + 'a {
        self.surfaces.iter()
    }

    /// Traces the segment from `start` to `end` and returns the first hit point.
    ///
    /// Segments parallel to the surfaces never hit.
    #[must_use]
    pub fn line_trace(&self, start: Vec3, end: Vec3) -> Option<Vec3> {
        let rise = start.z - end.z;
        if rise == 0.0 {
            return None;
        }

        self.surfaces
            .iter()
            .filter_map(|surface| {
                let t = (start.z - surface.height()) / rise;
                if !(0.0..=1.0).contains(&t) {
                    return None;
                }
                let point = Vec3::new(
                    start.x + (end.x - start.x) * t,
                    start.y + (end.y - start.y) * t,
                    surface.height(),
                );
                surface.contains_xy(point).then_some((t, point))
            })
            .min_by(|(left, _), (right, _)| left.total_cmp(right))
            .map(|(_, point)| point)
    }
}

/// Spawn budget and time limit of a single wave.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WaveDefinition {
    item_count: u32,
    duration: Duration,
}

impl WaveDefinition {
    /// Creates a wave that spawns `item_count` items and lasts `duration`.
    #[must_use]
    pub const fn new(item_count: u32, duration: Duration) -> Self {
        Self {
            item_count,
            duration,
        }
    }

    /// Number of spawn attempts made when the wave starts.
    #[must_use]
    pub const fn item_count(&self) -> u32 {
        self.item_count
    }

    /// Time limit of the wave.
    #[must_use]
    pub const fn duration(&self) -> Duration {
        self.duration
    }
}

/// Reasons a wave definition lookup may fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum WaveLookupError {
    /// The level or wave index lies outside the configured campaign.
    #[error("wave {wave} of level {level} is outside the configured campaign")]
    OutOfRange {
        /// Requested level index.
        level: u32,
        /// Requested wave index.
        wave: u32,
    },
    /// The flat index is valid but no definition was configured for it.
    #[error("invalid wave definition index {index}")]
    MissingDefinition {
        /// Flat index that failed to resolve.
        index: usize,
    },
}

/// Wave definitions for every level laid out level-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WaveTable {
    waves: Vec<WaveDefinition>,
    waves_per_level: u32,
    max_levels: u32,
}

impl WaveTable {
    /// Creates a table from level-major definitions.
    #[must_use]
    pub fn new(waves: Vec<WaveDefinition>, waves_per_level: u32, max_levels: u32) -> Self {
        Self {
            waves,
            waves_per_level,
            max_levels,
        }
    }

    /// Three levels of three waves with a growing spawn budget and shrinking time limit.
    #[must_use]
    pub fn default_campaign() -> Self {
        let wave = |items, secs| WaveDefinition::new(items, Duration::from_secs(secs));
        Self::new(
            vec![
                wave(20, 30),
                wave(30, 25),
                wave(40, 20),
                wave(30, 25),
                wave(40, 20),
                wave(50, 18),
                wave(40, 20),
                wave(50, 18),
                wave(60, 15),
            ],
            3,
            3,
        )
    }

    /// Number of waves each level runs through.
    #[must_use]
    pub const fn waves_per_level(&self) -> u32 {
        self.waves_per_level
    }

    /// Number of levels in the campaign.
    #[must_use]
    pub const fn max_levels(&self) -> u32 {
        self.max_levels
    }

    /// Number of configured definitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.waves.len()
    }

    /// Reports whether no definition is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.waves.is_empty()
    }

    /// Maps `(level, wave)` to its level-major position.
    ///
    /// Returns `None` when either index is outside the campaign bounds.
    #[must_use]
    pub fn flat_index(&self, level: u32, wave: u32) -> Option<usize> {
        flat_index(level, wave, self.waves_per_level, self.max_levels)
    }

    /// Resolves the definition for `(level, wave)`.
    pub fn wave(&self, level: u32, wave: u32) -> Result<WaveDefinition, WaveLookupError> {
        let index = self
            .flat_index(level, wave)
            .ok_or(WaveLookupError::OutOfRange { level, wave })?;
        self.waves
            .get(index)
            .copied()
            .ok_or(WaveLookupError::MissingDefinition { index })
    }
}

/// Level-major index of `(level, wave)` or `None` when out of bounds.
#[must_use]
pub fn flat_index(level: u32, wave: u32, waves_per_level: u32, max_levels: u32) -> Option<usize> {
    if wave >= waves_per_level || level >= max_levels {
        return None;
    }
    let level = usize::try_from(level).ok()?;
    let wave = usize::try_from(wave).ok()?;
    let width = usize::try_from(waves_per_level).ok()?;
    level.checked_mul(width)?.checked_add(wave)
}

/// Single weighted row of a spawn table.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpawnTableEntry {
    kind: ItemKind,
    weight: f32,
}

impl SpawnTableEntry {
    /// Creates a row that spawns `kind` with relative `weight`.
    #[must_use]
    pub const fn new(kind: ItemKind, weight: f32) -> Self {
        Self { kind, weight }
    }

    /// Kind spawned when the row is selected.
    #[must_use]
    pub const fn kind(&self) -> ItemKind {
        self.kind
    }

    /// Relative selection weight.
    #[must_use]
    pub const fn weight(&self) -> f32 {
        self.weight
    }
}

/// Reasons a spawn table may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum SpawnTableError {
    /// A row carries a negative or non-finite weight.
    #[error("spawn weight {weight} for {kind:?} must be finite and non-negative")]
    InvalidWeight {
        /// Kind of the offending row.
        kind: ItemKind,
        /// Offending weight.
        weight: f32,
    },
    /// The row weights add up to more than an `f32` can hold.
    #[error("spawn weights add up to more than {}", f32::MAX)]
    WeightOverflow,
}

/// Ordered, immutable set of weighted spawn rows.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SpawnTable {
    entries: Vec<SpawnTableEntry>,
    total_weight: f32,
}

impl SpawnTable {
    /// Validates the rows and captures their total weight.
    pub fn new(entries: Vec<SpawnTableEntry>) -> Result<Self, SpawnTableError> {
        let mut total_weight = 0.0;
        for entry in &entries {
            if !entry.weight.is_finite() || entry.weight < 0.0 {
                return Err(SpawnTableError::InvalidWeight {
                    kind: entry.kind,
                    weight: entry.weight,
                });
            }
            total_weight += entry.weight;
        }
        if !total_weight.is_finite() {
            return Err(SpawnTableError::WeightOverflow);
        }
        Ok(Self {
            entries,
            total_weight,
        })
    }

    /// Rows in table order.
    #[must_use]
    pub fn entries(&self) -> &[SpawnTableEntry] {
        &self.entries
    }

    /// Sum of all row weights.
    #[must_use]
    pub const fn total_weight(&self) -> f32 {
        self.total_weight
    }

    /// Reports whether the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Cross-level state that outlives a single level.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Session {
    total_score: u32,
    current_level_index: u32,
}

impl Session {
    /// Creates a fresh session at level zero with no score.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            total_score: 0,
            current_level_index: 0,
        }
    }

    /// Score accumulated over the whole session.
    #[must_use]
    pub const fn total_score(&self) -> u32 {
        self.total_score
    }

    /// Adds `amount` points to the session score.
    pub fn add_to_score(&mut self, amount: u32) {
        self.total_score = self.total_score.saturating_add(amount);
    }

    /// Level the session is currently playing.
    #[must_use]
    pub const fn current_level_index(&self) -> u32 {
        self.current_level_index
    }

    /// Records the level the session moves to.
    pub fn set_current_level_index(&mut self, index: u32) {
        self.current_level_index = index;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_index_is_unique_and_in_range() {
        let table = WaveTable::default_campaign();
        let mut seen = Vec::new();
        for level in 0..table.max_levels() {
            for wave in 0..table.waves_per_level() {
                let index = table.flat_index(level, wave).expect("valid pair");
                assert!(index < table.len());
                assert!(!seen.contains(&index), "index {index} reused");
                seen.push(index);
            }
        }
        assert_eq!(seen.len(), table.len());
    }

    #[test]
    fn flat_index_rejects_out_of_range_pairs() {
        let table = WaveTable::default_campaign();
        assert_eq!(table.flat_index(0, 3), None);
        assert_eq!(table.flat_index(3, 0), None);
        assert_eq!(
            table.wave(3, 0),
            Err(WaveLookupError::OutOfRange { level: 3, wave: 0 })
        );
    }

    #[test]
    fn short_table_reports_missing_definition() {
        let table = WaveTable::new(vec![WaveDefinition::new(5, Duration::from_secs(10))], 3, 3);
        assert!(table.wave(0, 0).is_ok());
        assert_eq!(
            table.wave(1, 2),
            Err(WaveLookupError::MissingDefinition { index: 5 })
        );
    }

    #[test]
    fn default_campaign_matches_shipped_budget() {
        let table = WaveTable::default_campaign();
        let last = table.wave(2, 2).expect("final wave");
        assert_eq!(last.item_count(), 60);
        assert_eq!(last.duration(), Duration::from_secs(15));
    }

    #[test]
    fn spawn_table_rejects_overflowing_total() {
        let result = SpawnTable::new(vec![
            SpawnTableEntry::new(ItemKind::SmallCoin, f32::MAX),
            SpawnTableEntry::new(ItemKind::BigCoin, f32::MAX),
            SpawnTableEntry::new(ItemKind::Mine, 1.0),
        ]);
        assert_eq!(result, Err(SpawnTableError::WeightOverflow));
    }

    #[test]
    fn spawn_table_rejects_negative_weights() {
        let result = SpawnTable::new(vec![
            SpawnTableEntry::new(ItemKind::SmallCoin, 3.0),
            SpawnTableEntry::new(ItemKind::Mine, -1.0),
        ]);
        assert_eq!(
            result,
            Err(SpawnTableError::InvalidWeight {
                kind: ItemKind::Mine,
                weight: -1.0,
            })
        );
    }

    #[test]
    fn spawn_table_sums_weights() {
        let table = SpawnTable::new(vec![
            SpawnTableEntry::new(ItemKind::SmallCoin, 10.0),
            SpawnTableEntry::new(ItemKind::BigCoin, 20.0),
            SpawnTableEntry::new(ItemKind::Mine, 70.0),
        ])
        .expect("valid table");
        assert!((table.total_weight() - 100.0).abs() < f32::EPSILON);
    }

    #[test]
    fn spawn_entries_deserialize_from_toml() {
        #[derive(Deserialize)]
        struct Rows {
            rows: Vec<SpawnTableEntry>,
        }

        let rows: Rows = toml::from_str(
            r#"
            rows = [
                { kind = "SmallCoin", weight = 60.0 },
                { kind = "Mine", weight = 15.5 },
            ]
            "#,
        )
        .expect("parse rows");
        assert_eq!(rows.rows[1], SpawnTableEntry::new(ItemKind::Mine, 15.5));
    }

    #[test]
    fn only_coins_are_collectibles() {
        assert!(ItemKind::SmallCoin.is_coin());
        assert!(ItemKind::BigCoin.is_coin());
        assert!(!ItemKind::Mine.is_coin());
        assert!(!ItemKind::Healing.is_coin());
        assert!(!ItemKind::Pickup.is_coin());
    }

    #[test]
    fn line_trace_returns_nearest_surface() {
        let surfaces = [
            Surface::new(Vec3::new(0.0, 0.0, 0.0), Vec2::splat(100.0)),
            Surface::new(Vec3::new(0.0, 0.0, 40.0), Vec2::splat(10.0)),
        ];
        let view = SurfaceView::new(&surfaces);

        let hit = view.line_trace(Vec3::new(5.0, 5.0, 500.0), Vec3::new(5.0, 5.0, -500.0));
        assert_eq!(hit, Some(Vec3::new(5.0, 5.0, 40.0)));

        let wide = view.line_trace(Vec3::new(50.0, 0.0, 500.0), Vec3::new(50.0, 0.0, -500.0));
        assert_eq!(wide, Some(Vec3::new(50.0, 0.0, 0.0)));

        let miss = view.line_trace(Vec3::new(500.0, 0.0, 500.0), Vec3::new(500.0, 0.0, -500.0));
        assert_eq!(miss, None);
    }

    #[test]
    fn hud_texts_use_one_based_numbers() {
        let hud = HudSnapshot {
            remaining: Duration::from_millis(12_340),
            score: Some(40),
            level_index: 0,
            wave_index: 1,
        };
        assert_eq!(hud.time_text(), "Time: 12.3");
        assert_eq!(hud.score_text().as_deref(), Some("Score: 40"));
        assert_eq!(hud.level_text(), "Level: 1 - Wave: 2");
    }

    #[test]
    fn health_bands_follow_thresholds() {
        assert_eq!(HealthBand::from_fraction(0.61), HealthBand::Healthy);
        assert_eq!(HealthBand::from_fraction(0.6), HealthBand::Wounded);
        assert_eq!(HealthBand::from_fraction(0.31), HealthBand::Wounded);
        assert_eq!(HealthBand::from_fraction(0.3), HealthBand::Critical);
    }

    #[test]
    fn session_score_saturates() {
        let mut session = Session::new();
        session.add_to_score(u32::MAX - 1);
        session.add_to_score(10);
        assert_eq!(session.total_score(), u32::MAX);
    }
}
