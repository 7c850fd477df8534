#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative level state management for the Sparta arena.
//!
//! The world stands in for the engine services the gameplay systems rely on:
//! spawning items at a pose, overlap checks against the character, downward
//! traces against the level's surfaces, deferred one-shot timers, on-screen
//! messages, the HUD widget, pausing and loading maps by name.

mod character;
mod items;

use std::time::Duration;

use glam::Vec3;
use log::{debug, info, warn};
use sparta_core::{
    Command, EffectId, EffectKind, Event, Fired, HudSnapshot, ItemId, ItemKind, MessageColor,
    Scheduler, Screen, Surface, SurfaceView, PLAYER_TAG,
};

pub use character::CharacterTuning;
pub use items::ItemTuning;

use character::Character;
use items::{Activation, Effect, Item, ItemState, EXPLOSION_EFFECTS, PICKUP_EFFECTS};

/// Reach of the downward probe that keeps the character on the highest surface below it.
const GROUND_PROBE: f32 = 10_000.0;

/// Static description of a map that can be loaded by name.
#[derive(Clone, Debug, PartialEq)]
pub struct LevelLayout {
    /// Name used by `Command::LoadLevel`.
    pub map: String,
    /// Supporting surfaces used for ground traces.
    pub surfaces: Vec<Surface>,
    /// Location the character spawns at.
    pub player_start: Vec3,
}

impl LevelLayout {
    /// Creates a layout registered under `map`.
    #[must_use]
    pub fn new(map: impl Into<String>, surfaces: Vec<Surface>, player_start: Vec3) -> Self {
        Self {
            map: map.into(),
            surfaces,
            player_start,
        }
    }
}

/// Configuration required to construct the world.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WorldConfig {
    /// Maps that can be loaded.
    pub levels: Vec<LevelLayout>,
    /// Item gameplay parameters.
    pub items: ItemTuning,
    /// Character movement and health parameters.
    pub character: CharacterTuning,
}

impl WorldConfig {
    /// Creates a configuration with default tuning for the provided maps.
    #[must_use]
    pub fn new(levels: Vec<LevelLayout>) -> Self {
        Self {
            levels,
            ..Self::default()
        }
    }
}

/// Transient on-screen message.
#[derive(Clone, Debug, PartialEq)]
pub struct ScreenMessage {
    /// Text shown to the player.
    pub text: String,
    /// Colour of the message.
    pub color: MessageColor,
    /// Time left before the message disappears.
    pub remaining: Duration,
}

#[derive(Clone, Copy, Debug)]
enum WorldTimer {
    MineDetonation(ItemId),
    EffectExpiry(EffectId),
}

#[derive(Debug)]
struct UiState {
    screen: Screen,
    paused: bool,
    hud: Option<HudSnapshot>,
    messages: Vec<ScreenMessage>,
}

impl UiState {
    fn new() -> Self {
        Self {
            screen: Screen::MainMenu { restart: false },
            paused: false,
            hud: None,
            messages: Vec::new(),
        }
    }

    fn expire_messages(&mut self, dt: Duration) {
        for message in &mut self.messages {
            message.remaining = message.remaining.saturating_sub(dt);
        }
        self.messages.retain(|message| !message.remaining.is_zero());
    }
}

/// Represents the authoritative state of the running level.
#[derive(Debug)]
pub struct World {
    config: WorldConfig,
    map: Option<String>,
    surfaces: Vec<Surface>,
    player: Character,
    items: Vec<Item>,
    effects: Vec<Effect>,
    timers: Scheduler<WorldTimer>,
    next_item_id: u32,
    next_effect_id: u32,
    ui: UiState,
}

impl World {
    /// Creates an empty world. No map is loaded until `Command::LoadLevel`.
    #[must_use]
    pub fn new(config: WorldConfig) -> Self {
        let player = Character::spawn(Vec3::ZERO, config.character);
        Self {
            config,
            map: None,
            surfaces: Vec::new(),
            player,
            items: Vec::new(),
            effects: Vec::new(),
            timers: Scheduler::new(),
            next_item_id: 0,
            next_effect_id: 0,
            ui: UiState::new(),
        }
    }

    fn load_level(&mut self, map: String, out_events: &mut Vec<Event>) {
        let Some(layout) = self
            .config
            .levels
            .iter()
            .find(|layout| layout.map == map)
            .cloned()
        else {
            warn!("no map registered under `{map}`");
            out_events.push(Event::LevelLoadRejected { map });
            return;
        };

        info!("loading map `{map}`");
        self.items.clear();
        self.effects.clear();
        self.timers.clear();
        self.surfaces = layout.surfaces;
        self.player = Character::spawn(layout.player_start, self.config.character);
        self.ui.paused = false;
        self.ui.hud = None;
        self.map = Some(map.clone());
        out_events.push(Event::LevelLoaded { map });
    }

    fn tick(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        self.ui.expire_messages(dt);
        if self.ui.paused {
            return;
        }

        out_events.push(Event::TimeAdvanced { dt });

        self.player.integrate(dt);
        self.ground_player();
        let spin = self.config.items.spin_degrees_per_second;
        for item in &mut self.items {
            item.spin(dt, spin);
        }
        self.resolve_overlaps(out_events);

        let mut fired: Vec<Fired<WorldTimer>> = Vec::new();
        self.timers.advance(dt, &mut fired);
        for Fired { payload, .. } in fired {
            match payload {
                WorldTimer::MineDetonation(item) => self.detonate(item, out_events),
                WorldTimer::EffectExpiry(effect) => self.expire_effect(effect, out_events),
            }
        }
    }

    fn ground_player(&mut self) {
        let position = self.player.position();
        let start = position + Vec3::Z * GROUND_PROBE;
        let end = position - Vec3::Z * GROUND_PROBE;
        if let Some(hit) = SurfaceView::new(&self.surfaces).line_trace(start, end) {
            self.player.stand_on(hit.z);
        }
    }

    fn resolve_overlaps(&mut self, out_events: &mut Vec<Event>) {
        if !self.player.is_alive() {
            return;
        }

        let reach = self.config.items.pickup_radius + self.player.collision_radius();
        let origin = self.player.position();
        let touched: Vec<ItemId> = self
            .items
            .iter()
            .filter(|item| item.position.distance(origin) <= reach)
            .map(|item| item.id)
            .collect();

        for item in touched {
            self.activate_item(item, out_events);
        }
    }

    fn activate_item(&mut self, id: ItemId, out_events: &mut Vec<Event>) {
        let Some(index) = self.item_index(id) else {
            return;
        };
        let tuning = self.config.items;
        let Some(activation) = self.items[index].activation(&tuning) else {
            return;
        };
        let kind = self.items[index].kind;
        let position = self.items[index].position;

        match activation {
            Activation::Collect { value } => {
                out_events.push(Event::ItemCollected {
                    item: id,
                    kind,
                    value,
                });
                self.consume_item(id, position, out_events);
            }
            Activation::Heal { amount } => {
                let health = self.player.add_health(amount);
                out_events.push(Event::PlayerHealed { amount, health });
                out_events.push(Event::ItemCollected {
                    item: id,
                    kind,
                    value: 0,
                });
                self.consume_item(id, position, out_events);
            }
            Activation::Consume => {
                out_events.push(Event::ItemCollected {
                    item: id,
                    kind,
                    value: 0,
                });
                self.consume_item(id, position, out_events);
            }
            Activation::Arm => {
                let detonation = self
                    .timers
                    .schedule(tuning.mine_delay, WorldTimer::MineDetonation(id));
                self.items[index].state = ItemState::Armed { detonation };
                debug!("{} {} armed", kind.label(), id.get());
                out_events.push(Event::ItemTriggered { item: id, kind });
            }
        }
    }

    fn consume_item(&mut self, id: ItemId, position: Vec3, out_events: &mut Vec<Event>) {
        for kind in PICKUP_EFFECTS {
            self.spawn_effect(kind, position, out_events);
        }
        self.destroy_item(id, out_events);
    }

    fn detonate(&mut self, id: ItemId, out_events: &mut Vec<Event>) {
        // The mine may have been removed while its countdown was pending.
        let Some(index) = self.item_index(id) else {
            return;
        };
        let position = self.items[index].position;
        let reach = self.config.items.mine_radius + self.player.collision_radius();
        let player_hit = self.player.has_tag(PLAYER_TAG)
            && self.player.position().distance(position) <= reach;

        out_events.push(Event::MineDetonated {
            item: id,
            position,
            player_hit,
        });
        if player_hit {
            self.damage_player(self.config.items.mine_damage, out_events);
        }
        for kind in EXPLOSION_EFFECTS {
            self.spawn_effect(kind, position, out_events);
        }
        self.destroy_item(id, out_events);
    }

    fn damage_player(&mut self, amount: f32, out_events: &mut Vec<Event>) {
        let Some(outcome) = self.player.take_damage(amount) else {
            return;
        };
        out_events.push(Event::PlayerDamaged {
            amount,
            health: outcome.health,
        });
        if outcome.died {
            info!("player died");
            out_events.push(Event::PlayerDied);
        }
    }

    fn spawn_item(&mut self, kind: ItemKind, position: Vec3, out_events: &mut Vec<Event>) {
        let id = ItemId::new(self.next_item_id);
        self.next_item_id = self.next_item_id.wrapping_add(1);
        self.items.push(Item::new(id, kind, position));
        out_events.push(Event::ItemSpawned {
            item: id,
            kind,
            position,
        });
    }

    fn destroy_item(&mut self, id: ItemId, out_events: &mut Vec<Event>) {
        if let Some(index) = self.item_index(id) {
            let item = self.items.remove(index);
            if let ItemState::Armed { detonation } = item.state {
                let _ = self.timers.cancel(detonation);
            }
            out_events.push(Event::ItemDestroyed { item: id });
        }
    }

    fn spawn_effect(&mut self, kind: EffectKind, position: Vec3, out_events: &mut Vec<Event>) {
        let id = EffectId::new(self.next_effect_id);
        self.next_effect_id = self.next_effect_id.wrapping_add(1);
        self.effects.push(Effect { id, kind });
        let _ = self.timers.schedule(
            self.config.items.effect_lifetime,
            WorldTimer::EffectExpiry(id),
        );
        out_events.push(Event::EffectSpawned {
            effect: id,
            kind,
            position,
        });
    }

    fn expire_effect(&mut self, id: EffectId, out_events: &mut Vec<Event>) {
        // Only clean up effects that are still alive.
        if let Some(index) = self.effects.iter().position(|effect| effect.id == id) {
            let _ = self.effects.remove(index);
            out_events.push(Event::EffectExpired { effect: id });
        }
    }

    fn item_index(&self, id: ItemId) -> Option<usize> {
        self.items.iter().position(|item| item.id == id)
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => world.tick(dt, out_events),
        Command::LoadLevel { map } => world.load_level(map, out_events),
        Command::SpawnItem { kind, position } => world.spawn_item(kind, position, out_events),
        Command::DespawnItem { item } => world.destroy_item(item, out_events),
        Command::MovePlayer { forward, right } => world.player.set_move_input(forward, right),
        Command::Look {
            yaw_degrees,
            pitch_degrees,
        } => world.player.look(yaw_degrees, pitch_degrees),
        Command::SetJumping { active } => world.player.set_jumping(active),
        Command::SetSprinting { active } => world.player.set_sprinting(active),
        Command::DamagePlayer { amount } => world.damage_player(amount, out_events),
        Command::HealPlayer { amount } => {
            let health = world.player.add_health(amount);
            out_events.push(Event::PlayerHealed { amount, health });
        }
        Command::SetPaused { paused } => {
            world.ui.paused = paused;
            out_events.push(Event::PauseChanged { paused });
        }
        Command::ShowScreen { screen } => {
            world.ui.screen = screen;
            out_events.push(Event::ScreenChanged { screen });
        }
        Command::ShowMessage {
            text,
            duration,
            color,
        } => {
            world.ui.messages.push(ScreenMessage {
                text: text.clone(),
                color,
                remaining: duration,
            });
            out_events.push(Event::MessageShown { text, color });
        }
        Command::UpdateHud { hud } => world.ui.hud = Some(hud),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use sparta_core::{
        EffectId, EffectKind, HudSnapshot, ItemSnapshot, ItemView, PlayerSnapshot, Screen,
        SurfaceView,
    };

    use super::{ItemTuning, ScreenMessage, World};

    /// Name of the loaded map, if any.
    #[must_use]
    pub fn map(world: &World) -> Option<&str> {
        world.map.as_deref()
    }

    /// Snapshot of the playable character.
    #[must_use]
    pub fn player(world: &World) -> PlayerSnapshot {
        world.player.snapshot()
    }

    /// Captures a read-only view of the items in the level.
    #[must_use]
    pub fn item_view(world: &World) -> ItemView {
        ItemView::from_snapshots(world.items.iter().map(|item| item.snapshot()).collect())
    }

    /// Snapshot of a single item, if it still exists.
    #[must_use]
    pub fn item(world: &World, id: sparta_core::ItemId) -> Option<ItemSnapshot> {
        world
            .items
            .iter()
            .find(|item| item.id == id)
            .map(|item| item.snapshot())
    }

    /// Read-only view of the supporting surfaces used by ground traces.
    #[must_use]
    pub fn surfaces(world: &World) -> SurfaceView<'_> {
        SurfaceView::new(&world.surfaces)
    }

    /// Effects that are still playing, in spawn order.
    #[must_use]
    pub fn effects(world: &World) -> Vec<(EffectId, EffectKind)> {
        world
            .effects
            .iter()
            .map(|effect| (effect.id, effect.kind))
            .collect()
    }

    /// Item gameplay parameters the world was configured with.
    #[must_use]
    pub fn item_tuning(world: &World) -> &ItemTuning {
        &world.config.items
    }

    /// Reports whether gameplay is paused.
    #[must_use]
    pub fn is_paused(world: &World) -> bool {
        world.ui.paused
    }

    /// Screen currently shown by the UI.
    #[must_use]
    pub fn screen(world: &World) -> Screen {
        world.ui.screen
    }

    /// Last HUD projection pushed since the level loaded.
    #[must_use]
    pub fn hud(world: &World) -> Option<HudSnapshot> {
        world.ui.hud
    }

    /// On-screen messages that are still visible.
    #[must_use]
    pub fn messages(world: &World) -> &[ScreenMessage] {
        &world.ui.messages
    }
}
