//! Game file describing the campaign, its maps and the gameplay tuning.

use std::{collections::HashSet, fs, path::Path, time::Duration};

use anyhow::{bail, ensure, Context, Result};
use glam::Vec3;
use log::warn;
use serde::Deserialize;
use sparta_core::{SpawnTable, SpawnTableEntry, Surface, WaveDefinition, WaveTable};
use sparta_system_pilot::PilotConfig;
use sparta_system_progression::ProgressionConfig;
use sparta_system_spawning::SpawnBox;
use sparta_world::{CharacterTuning, ItemTuning, LevelLayout, WorldConfig};

const SUPPORTED_VERSION: u32 = 1;

/// Campaign shipped with the binary.
pub(crate) const DEFAULT_GAME: &str = include_str!("../assets/sparta.toml");

/// Fully validated game description.
#[derive(Clone, Debug)]
pub(crate) struct Game {
    pub(crate) seed: u64,
    pub(crate) world: WorldConfig,
    pub(crate) progression: ProgressionConfig,
    pub(crate) spawn_box: SpawnBox,
    pub(crate) spawn_tables: Vec<SpawnTable>,
    pub(crate) pilot: PilotConfig,
}

impl Game {
    pub(crate) fn waves_per_level(&self) -> u32 {
        self.progression.waves().waves_per_level()
    }
}

/// Loads the game file at `path`, or the bundled campaign when absent.
pub(crate) fn load(path: Option<&Path>) -> Result<Game> {
    match path {
        Some(path) => {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("failed to read game file at {}", path.display()))?;
            parse(&contents).with_context(|| format!("invalid game file {}", path.display()))
        }
        None => parse(DEFAULT_GAME).context("invalid bundled game file"),
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct GameFile {
    version: u32,
    #[serde(default)]
    seed: u64,
    progression: ProgressionSection,
    spawn_box: SpawnBoxSection,
    waves: Vec<WaveRow>,
    spawn_tables: Vec<SpawnTableRow>,
    levels: Vec<LevelRow>,
    #[serde(default)]
    items: ItemSection,
    #[serde(default)]
    character: CharacterSection,
    #[serde(default)]
    pilot: PilotSection,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProgressionSection {
    waves_per_level: u32,
    max_levels: u32,
    #[serde(default = "default_inter_wave_delay_ms")]
    inter_wave_delay_ms: u64,
    #[serde(default = "default_hud_interval_ms")]
    hud_interval_ms: u64,
}

fn default_inter_wave_delay_ms() -> u64 {
    2_000
}

fn default_hud_interval_ms() -> u64 {
    100
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SpawnBoxSection {
    center: Vec3,
    half_extent: Vec3,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct WaveRow {
    items: u32,
    duration_secs: f32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SpawnTableRow {
    entries: Vec<SpawnTableEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct LevelRow {
    map: String,
    player_start: Vec3,
    surfaces: Vec<Surface>,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ItemSection {
    small_coin_points: u32,
    big_coin_points: u32,
    healing_amount: f32,
    pickup_radius: f32,
    mine_delay_ms: u64,
    mine_radius: f32,
    mine_damage: f32,
    effect_lifetime_ms: u64,
    spin_degrees_per_second: f32,
}

impl Default for ItemSection {
    fn default() -> Self {
        let tuning = ItemTuning::default();
        Self {
            small_coin_points: tuning.small_coin_points,
            big_coin_points: tuning.big_coin_points,
            healing_amount: tuning.healing_amount,
            pickup_radius: tuning.pickup_radius,
            mine_delay_ms: millis(tuning.mine_delay),
            mine_radius: tuning.mine_radius,
            mine_damage: tuning.mine_damage,
            effect_lifetime_ms: millis(tuning.effect_lifetime),
            spin_degrees_per_second: tuning.spin_degrees_per_second,
        }
    }
}

impl From<ItemSection> for ItemTuning {
    fn from(section: ItemSection) -> Self {
        Self {
            small_coin_points: section.small_coin_points,
            big_coin_points: section.big_coin_points,
            healing_amount: section.healing_amount,
            pickup_radius: section.pickup_radius,
            mine_delay: Duration::from_millis(section.mine_delay_ms),
            mine_radius: section.mine_radius,
            mine_damage: section.mine_damage,
            effect_lifetime: Duration::from_millis(section.effect_lifetime_ms),
            spin_degrees_per_second: section.spin_degrees_per_second,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct CharacterSection {
    max_health: f32,
    normal_speed: f32,
    sprint_multiplier: f32,
    collision_radius: f32,
    capsule_half_height: f32,
}

impl Default for CharacterSection {
    fn default() -> Self {
        let tuning = CharacterTuning::default();
        Self {
            max_health: tuning.max_health,
            normal_speed: tuning.normal_speed,
            sprint_multiplier: tuning.sprint_multiplier,
            collision_radius: tuning.collision_radius,
            capsule_half_height: tuning.capsule_half_height,
        }
    }
}

impl From<CharacterSection> for CharacterTuning {
    fn from(section: CharacterSection) -> Self {
        Self {
            max_health: section.max_health,
            normal_speed: section.normal_speed,
            sprint_multiplier: section.sprint_multiplier,
            collision_radius: section.collision_radius,
            capsule_half_height: section.capsule_half_height,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct PilotSection {
    mine_clearance: f32,
    sprint_distance: f32,
}

impl Default for PilotSection {
    fn default() -> Self {
        let config = PilotConfig::default();
        Self {
            mine_clearance: config.mine_clearance,
            sprint_distance: config.sprint_distance,
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Parses and validates a game file.
pub(crate) fn parse(contents: &str) -> Result<Game> {
    let file: GameFile = toml::from_str(contents).context("failed to parse game file toml")?;
    ensure!(
        file.version == SUPPORTED_VERSION,
        "unsupported game file version {}; expected {}",
        file.version,
        SUPPORTED_VERSION
    );

    let section = &file.progression;
    ensure!(
        section.waves_per_level > 0 && section.max_levels > 0,
        "a campaign needs at least one level with one wave"
    );
    let slots = section
        .waves_per_level
        .checked_mul(section.max_levels)
        .and_then(|slots| usize::try_from(slots).ok())
        .context("campaign is too large")?;
    ensure!(
        file.waves.len() == slots,
        "expected {slots} waves ({} levels x {} waves), found {}",
        section.max_levels,
        section.waves_per_level,
        file.waves.len()
    );
    ensure!(
        file.spawn_tables.len() == slots,
        "expected {slots} spawn tables, found {}",
        file.spawn_tables.len()
    );
    ensure!(
        section.hud_interval_ms > 0,
        "hud_interval_ms must be positive"
    );

    let mut waves = Vec::with_capacity(slots);
    for (index, row) in file.waves.iter().enumerate() {
        let duration = Duration::try_from_secs_f32(row.duration_secs)
            .with_context(|| format!("wave {index} has an invalid duration"))?;
        ensure!(!duration.is_zero(), "wave {index} must last longer than zero");
        waves.push(WaveDefinition::new(row.items, duration));
    }

    let mut spawn_tables = Vec::with_capacity(slots);
    for (index, row) in file.spawn_tables.into_iter().enumerate() {
        let table = SpawnTable::new(row.entries)
            .with_context(|| format!("spawn table {index} is invalid"))?;
        if table.total_weight() <= 0.0 {
            warn!("spawn table {index} carries no weight; its waves spawn nothing");
        }
        spawn_tables.push(table);
    }

    let mut maps = HashSet::new();
    let mut levels = Vec::with_capacity(file.levels.len());
    for row in file.levels {
        if !maps.insert(row.map.clone()) {
            bail!("map `{}` is declared twice", row.map);
        }
        let surfaces = row
            .surfaces
            .iter()
            .map(|surface| Surface::new(surface.center(), surface.half_extent()))
            .collect();
        levels.push(LevelLayout::new(row.map, surfaces, row.player_start));
    }
    let max_levels = usize::try_from(section.max_levels).context("campaign is too large")?;
    if levels.len() < max_levels {
        warn!(
            "only {} of {} levels have a map; the campaign ends early",
            levels.len(),
            max_levels
        );
    }

    let level_maps = levels.iter().map(|level| level.map.clone()).collect();
    let progression = ProgressionConfig::new(
        WaveTable::new(waves, section.waves_per_level, section.max_levels),
        level_maps,
    )
    .with_inter_wave_delay(Duration::from_millis(section.inter_wave_delay_ms))
    .with_hud_interval(Duration::from_millis(section.hud_interval_ms));

    Ok(Game {
        seed: file.seed,
        world: WorldConfig {
            levels,
            items: file.items.into(),
            character: file.character.into(),
        },
        progression,
        spawn_box: SpawnBox::new(file.spawn_box.center, file.spawn_box.half_extent),
        spawn_tables,
        pilot: PilotConfig {
            mine_clearance: file.pilot.mine_clearance,
            sprint_distance: file.pilot.sprint_distance,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_game_parses() {
        let game = parse(DEFAULT_GAME).expect("bundled game is valid");

        assert_eq!(game.waves_per_level(), 3);
        assert_eq!(game.progression.waves().max_levels(), 3);
        assert_eq!(game.spawn_tables.len(), 9);
        assert_eq!(game.progression.level_map(0), Some("BasicLevel"));
        assert_eq!(game.progression.level_map(2), Some("AdvancedLevel"));
        assert_eq!(game.progression.inter_wave_delay(), Duration::from_secs(2));
        assert_eq!(
            game.progression.waves().wave(2, 2).expect("wave exists"),
            WaveDefinition::new(60, Duration::from_secs(15))
        );
        assert_eq!(game.world.items, ItemTuning::default());
        assert_eq!(game.world.character, CharacterTuning::default());
        assert_eq!(game.pilot, PilotConfig::default());
        assert!(game
            .spawn_tables
            .iter()
            .all(|table| table.total_weight() > 0.0));
    }

    #[test]
    fn rejects_unknown_version() {
        let contents = DEFAULT_GAME.replacen("version = 1", "version = 7", 1);
        let error = parse(&contents).expect_err("version must be checked");
        assert!(format!("{error:#}").contains("unsupported game file version 7"));
    }

    #[test]
    fn rejects_negative_weights() {
        let contents = DEFAULT_GAME.replacen("weight = 60.0", "weight = -1.0", 1);
        let error = parse(&contents).expect_err("weights must be checked");
        assert!(format!("{error:#}").contains("spawn table 0 is invalid"));
    }

    #[test]
    fn rejects_missing_waves() {
        let contents = DEFAULT_GAME.replacen("max_levels = 3", "max_levels = 4", 1);
        let error = parse(&contents).expect_err("wave count must match");
        assert!(format!("{error:#}").contains("expected 12 waves"));
    }

    #[test]
    fn tuning_sections_are_optional() {
        let start = DEFAULT_GAME.find("[items]").expect("items section");
        let game = parse(&DEFAULT_GAME[..start]).expect("tuning falls back to defaults");

        assert_eq!(game.world.items, ItemTuning::default());
        assert_eq!(game.world.character, CharacterTuning::default());
    }
}
