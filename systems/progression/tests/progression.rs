use std::time::Duration;

use glam::{Vec2, Vec3};
use sparta_core::{
    Command, Event, ItemKind, MessageColor, Screen, Session, SpawnTable, SpawnTableEntry, Surface,
    WaveDefinition, WaveTable,
};
use sparta_system_progression::{
    Collaborators, GameOverReason, Phase, Progression, ProgressionConfig,
};
use sparta_system_spawning::{SpawnBox, SpawnVolume};
use sparta_world::{self as world, query, LevelLayout, World, WorldConfig};

const TICK: Duration = Duration::from_millis(100);
const MAPS: [&str; 3] = ["Basic", "Intermediate", "Advanced"];
const PLAYER_START: Vec3 = Vec3::new(0.0, 0.0, 90.0);

/// Spawn point right under the character; every item is touched on the next tick.
const NEAR: Vec3 = Vec3::new(0.0, 0.0, 100.0);
/// Spawn point out of the character's reach.
const FAR: Vec3 = Vec3::new(3_000.0, 0.0, 100.0);

struct Harness {
    world: World,
    progression: Progression,
    session: Session,
    volume: SpawnVolume,
    issued: Vec<Command>,
    events: Vec<Event>,
}

impl Harness {
    fn new(config: ProgressionConfig, spawn_at: Vec3, kind: ItemKind) -> Self {
        let levels = MAPS
            .iter()
            .map(|map| {
                LevelLayout::new(
                    *map,
                    vec![Surface::new(Vec3::ZERO, Vec2::splat(5_000.0))],
                    PLAYER_START,
                )
            })
            .collect();
        let table = SpawnTable::new(vec![SpawnTableEntry::new(kind, 1.0)]).expect("valid weights");
        let tables = (0..9).map(|_| table.clone()).collect();

        Self {
            world: World::new(WorldConfig::new(levels)),
            progression: Progression::new(config),
            session: Session::new(),
            volume: SpawnVolume::new(SpawnBox::new(spawn_at, Vec3::ZERO), tables, 3, 1),
            issued: Vec::new(),
            events: Vec::new(),
        }
    }

    fn start(&mut self) {
        let open = self
            .progression
            .open_current_level(&self.session)
            .expect("map configured");
        self.run(vec![open]);
    }

    fn tick(&mut self) {
        self.run(vec![Command::Tick { dt: TICK }]);
    }

    fn tick_for(&mut self, ticks: u32) {
        for _ in 0..ticks {
            self.tick();
        }
    }

    fn run(&mut self, initial: Vec<Command>) {
        let mut pending = initial;
        while !pending.is_empty() {
            let mut events = Vec::new();
            for command in pending.drain(..) {
                self.issued.push(command.clone());
                world::apply(&mut self.world, command, &mut events);
            }
            self.events.extend(events.iter().cloned());

            let mut collaborators = Collaborators {
                session: Some(&mut self.session),
                spawn_volume: Some(&mut self.volume),
                surfaces: query::surfaces(&self.world),
            };
            self.progression
                .handle(&events, &mut collaborators, &mut pending);
        }
    }

    fn load_requests(&self) -> Vec<&str> {
        self.issued
            .iter()
            .filter_map(|command| match command {
                Command::LoadLevel { map } => Some(map.as_str()),
                _ => None,
            })
            .collect()
    }

    fn messages(&self, color: MessageColor) -> Vec<&str> {
        self.issued
            .iter()
            .filter_map(|command| match command {
                Command::ShowMessage {
                    text, color: shown, ..
                } if *shown == color => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

fn two_coin_campaign() -> WaveTable {
    WaveTable::new(
        vec![WaveDefinition::new(2, Duration::from_secs(10)); 9],
        3,
        3,
    )
}

fn config() -> ProgressionConfig {
    ProgressionConfig::new(
        two_coin_campaign(),
        MAPS.iter().map(|map| (*map).to_owned()).collect(),
    )
}

#[test]
fn level_load_starts_first_wave() {
    let mut harness = Harness::new(config(), FAR, ItemKind::SmallCoin);
    harness.start();

    assert_eq!(harness.progression.phase(), Phase::WaveActive);
    assert_eq!(harness.progression.progress().spawned(), 2);
    assert_eq!(query::item_view(&harness.world).len(), 2);
    assert_eq!(query::screen(&harness.world), Screen::Hud);
    assert_eq!(
        harness.messages(MessageColor::Yellow),
        vec!["Level 1 - Wave 1 started!"]
    );
    assert_eq!(
        harness.progression.remaining_wave_time(),
        Some(Duration::from_secs(10))
    );
}

#[test]
fn collecting_every_coin_completes_wave_and_cancels_timer() {
    let mut harness = Harness::new(config(), NEAR, ItemKind::SmallCoin);
    harness.start();
    harness.tick();

    assert_eq!(harness.session.total_score(), 20);
    assert_eq!(harness.progression.wave_index(), 1);
    assert_eq!(harness.progression.phase(), Phase::WaveCompleting);
    assert_eq!(harness.progression.remaining_wave_time(), None);
    assert_eq!(
        harness.messages(MessageColor::Cyan),
        vec!["Wave 1 complete! Next wave incoming..."]
    );

    harness.tick_for(19);
    assert_eq!(harness.progression.phase(), Phase::WaveCompleting);
    harness.tick();
    assert_eq!(harness.progression.phase(), Phase::WaveActive);
    assert_eq!(
        harness.messages(MessageColor::Yellow),
        vec!["Level 1 - Wave 1 started!", "Level 1 - Wave 2 started!"]
    );
}

#[test]
fn stale_timeout_does_not_advance_again() {
    let config = config().with_inter_wave_delay(Duration::from_secs(60));
    let mut harness = Harness::new(config, NEAR, ItemKind::SmallCoin);
    harness.start();
    harness.tick();
    assert_eq!(harness.progression.waves_cleared(), 1);

    // Well past the ten second wave limit.
    harness.tick_for(150);

    assert_eq!(harness.progression.waves_cleared(), 1);
    assert_eq!(harness.progression.wave_index(), 1);
    assert_eq!(harness.progression.phase(), Phase::WaveCompleting);
}

#[test]
fn wave_without_coins_completes_on_timeout() {
    let mut harness = Harness::new(config(), NEAR, ItemKind::Pickup);
    harness.start();
    assert_eq!(harness.progression.progress().spawned(), 0);

    harness.tick_for(99);
    assert_eq!(harness.progression.wave_index(), 0);
    assert_eq!(harness.progression.phase(), Phase::WaveActive);
    assert!(query::item_view(&harness.world).is_empty());

    harness.tick();
    assert_eq!(harness.progression.wave_index(), 1);
    assert_eq!(harness.progression.phase(), Phase::WaveCompleting);
}

#[test]
fn hud_tracks_remaining_time() {
    let mut harness = Harness::new(config(), FAR, ItemKind::SmallCoin);
    harness.start();
    harness.tick_for(10);

    let hud = query::hud(&harness.world).expect("hud refreshed");
    assert_eq!(hud.time_text(), "Time: 9.0");
    assert_eq!(hud.score_text().as_deref(), Some("Score: 0"));
    assert_eq!(hud.level_text(), "Level: 1 - Wave: 1");
}

#[test]
fn clearing_three_waves_loads_next_level() {
    let mut harness = Harness::new(config(), NEAR, ItemKind::BigCoin);
    harness.start();

    for _ in 0..200 {
        if harness.session.current_level_index() == 1 {
            break;
        }
        harness.tick();
    }

    assert_eq!(harness.session.current_level_index(), 1);
    assert_eq!(harness.load_requests(), vec!["Basic", "Intermediate"]);
    assert_eq!(query::map(&harness.world), Some("Intermediate"));
    assert_eq!(harness.progression.level_index(), 1);
    assert_eq!(harness.progression.wave_index(), 0);
    assert_eq!(harness.progression.phase(), Phase::WaveActive);
    assert_eq!(harness.progression.waves_cleared(), 3);
    assert_eq!(harness.session.total_score(), 300);
    assert_eq!(
        harness.messages(MessageColor::Green),
        vec!["Level 1 complete!"]
    );
}

#[test]
fn clearing_last_level_ends_game_without_loading() {
    let mut harness = Harness::new(config(), NEAR, ItemKind::SmallCoin);
    harness.session.set_current_level_index(2);
    harness.start();

    for _ in 0..200 {
        if harness.progression.phase() == Phase::GameOver {
            break;
        }
        harness.tick();
    }

    assert_eq!(
        harness.progression.game_over_reason(),
        Some(GameOverReason::CampaignComplete)
    );
    assert_eq!(harness.session.current_level_index(), 3);
    assert_eq!(harness.load_requests(), vec!["Advanced"]);
    assert!(query::is_paused(&harness.world));
    assert_eq!(
        query::screen(&harness.world),
        Screen::MainMenu { restart: true }
    );
    assert_eq!(harness.messages(MessageColor::Red), vec!["Game Over!"]);

    let issued = harness.issued.len();
    harness.tick_for(50);
    assert_eq!(harness.issued.len(), issued + 50, "only ticks are issued");
}

#[test]
fn missing_map_ends_game() {
    let config = ProgressionConfig::new(two_coin_campaign(), vec!["Basic".to_owned()]);
    let mut harness = Harness::new(config, NEAR, ItemKind::SmallCoin);
    harness.start();

    for _ in 0..200 {
        if harness.progression.phase() == Phase::GameOver {
            break;
        }
        harness.tick();
    }

    assert_eq!(
        harness.progression.game_over_reason(),
        Some(GameOverReason::LevelUnavailable)
    );
    assert_eq!(harness.load_requests(), vec!["Basic"]);
}

#[test]
fn rejected_map_ends_game() {
    let config = ProgressionConfig::new(
        two_coin_campaign(),
        vec!["Basic".to_owned(), "Unknown".to_owned()],
    );
    let mut harness = Harness::new(config, NEAR, ItemKind::SmallCoin);
    harness.start();

    for _ in 0..200 {
        if harness.progression.phase() == Phase::GameOver {
            break;
        }
        harness.tick();
    }

    assert_eq!(
        harness.progression.game_over_reason(),
        Some(GameOverReason::LevelUnavailable)
    );
    assert!(harness
        .events
        .contains(&Event::LevelLoadRejected {
            map: "Unknown".to_owned()
        }));
    assert_eq!(query::map(&harness.world), Some("Basic"));
}

#[test]
fn player_death_ends_game_once() {
    let mut harness = Harness::new(config(), FAR, ItemKind::SmallCoin);
    harness.start();
    harness.run(vec![Command::DamagePlayer { amount: 150.0 }]);

    assert_eq!(harness.progression.phase(), Phase::GameOver);
    assert_eq!(
        harness.progression.game_over_reason(),
        Some(GameOverReason::PlayerDied)
    );
    assert!(query::is_paused(&harness.world));

    let mut out = Vec::new();
    harness
        .progression
        .on_game_over(GameOverReason::CampaignComplete, &mut out);
    assert!(out.is_empty());

    let mut collaborators = Collaborators {
        session: Some(&mut harness.session),
        spawn_volume: Some(&mut harness.volume),
        surfaces: query::surfaces(&harness.world),
    };
    harness.progression.handle(
        &[
            Event::LevelLoaded {
                map: "Basic".to_owned(),
            },
            Event::TimeAdvanced {
                dt: Duration::from_secs(30),
            },
        ],
        &mut collaborators,
        &mut out,
    );
    assert!(out.is_empty());
    assert_eq!(
        harness.progression.game_over_reason(),
        Some(GameOverReason::PlayerDied)
    );
}

#[test]
fn mine_explosion_damages_player_once() {
    let mut harness = Harness::new(config(), NEAR, ItemKind::Mine);
    harness.start();
    assert_eq!(harness.progression.progress().spawned(), 0);

    harness.tick_for(51);

    let damage: Vec<f32> = harness
        .events
        .iter()
        .filter_map(|event| match event {
            Event::PlayerDamaged { amount, .. } => Some(*amount),
            _ => None,
        })
        .collect();
    assert_eq!(damage, vec![30.0, 30.0]);
    assert_eq!(query::player(&harness.world).health, 40.0);
    assert!(query::item_view(&harness.world).is_empty());
}
