#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic autopilot that plays the character in headless runs.
//!
//! Every simulated frame the pilot turns toward the nearest worthwhile item
//! and walks to it. Items lying inside the blast of an armed mine are left
//! alone, and the pilot runs away from any armed mine it stands next to.

use glam::{Vec2, Vec3};
use sparta_core::{Command, Event, ItemKind, ItemSnapshot, ItemView, PlayerSnapshot};

/// Tuning of the autopilot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PilotConfig {
    /// Planar distance around an armed mine the pilot keeps clear of.
    pub mine_clearance: f32,
    /// Targets farther than this are approached sprinting.
    pub sprint_distance: f32,
}

impl Default for PilotConfig {
    fn default() -> Self {
        Self {
            mine_clearance: 342.0,
            sprint_distance: 800.0,
        }
    }
}

/// Pure system that reacts to world events and emits character input.
#[derive(Debug)]
pub struct Pilot {
    config: PilotConfig,
    sprinting: bool,
}

impl Pilot {
    /// Creates a new pilot with the provided tuning.
    #[must_use]
    pub fn new(config: PilotConfig) -> Self {
        Self {
            config,
            sprinting: false,
        }
    }

    /// Consumes world events and immutable views to emit input commands.
    pub fn handle(
        &mut self,
        events: &[Event],
        player: &PlayerSnapshot,
        items: &ItemView,
        out: &mut Vec<Command>,
    ) {
        if !events
            .iter()
            .any(|event| matches!(event, Event::TimeAdvanced { .. }))
        {
            return;
        }

        if !player.is_alive() {
            self.set_sprinting(false, out);
            return;
        }

        let origin = planar(player.position);
        let heading = match self.nearest_threat(origin, items) {
            Some(mine) => {
                self.set_sprinting(true, out);
                origin - planar(mine.position)
            }
            None => {
                let Some(target) = self.select_target(origin, player, items) else {
                    self.set_sprinting(false, out);
                    return;
                };
                let offset = planar(target.position) - origin;
                self.set_sprinting(offset.length() > self.config.sprint_distance, out);
                offset
            }
        };

        // Standing right on top of the point: keep the current facing.
        if heading.length_squared() > f32::EPSILON {
            let desired = heading.y.atan2(heading.x).to_degrees();
            out.push(Command::Look {
                yaw_degrees: wrap_degrees(desired - player.yaw_degrees),
                pitch_degrees: 0.0,
            });
        }
        out.push(Command::MovePlayer {
            forward: 1.0,
            right: 0.0,
        });
    }

    fn nearest_threat<'a>(&self, origin: Vec2, items: &'a ItemView) -> Option<&'a ItemSnapshot> {
        items
            .iter()
            .filter(|item| item.kind == ItemKind::Mine && item.armed)
            .map(|item| (origin.distance(planar(item.position)), item))
            .filter(|(distance, _)| *distance < self.config.mine_clearance)
            .min_by(|(left, _), (right, _)| left.total_cmp(right))
            .map(|(_, item)| item)
    }

    fn select_target<'a>(
        &self,
        origin: Vec2,
        player: &PlayerSnapshot,
        items: &'a ItemView,
    ) -> Option<&'a ItemSnapshot> {
        let hurt = player.health < player.max_health;
        items
            .iter()
            .filter(|item| match item.kind {
                ItemKind::SmallCoin | ItemKind::BigCoin | ItemKind::Pickup => true,
                ItemKind::Healing => hurt,
                ItemKind::Mine => false,
            })
            .filter(|item| !self.is_threatened(planar(item.position), items))
            .map(|item| (origin.distance(planar(item.position)), item))
            .min_by(|(left, _), (right, _)| left.total_cmp(right))
            .map(|(_, item)| item)
    }

    fn is_threatened(&self, point: Vec2, items: &ItemView) -> bool {
        items.iter().any(|item| {
            item.kind == ItemKind::Mine
                && item.armed
                && point.distance(planar(item.position)) < self.config.mine_clearance
        })
    }

    fn set_sprinting(&mut self, active: bool, out: &mut Vec<Command>) {
        if self.sprinting != active {
            self.sprinting = active;
            out.push(Command::SetSprinting { active });
        }
    }
}

impl Default for Pilot {
    fn default() -> Self {
        Self::new(PilotConfig::default())
    }
}

fn planar(position: Vec3) -> Vec2 {
    position.truncate()
}

/// Wraps an angle into `(-180, 180]` degrees.
fn wrap_degrees(degrees: f32) -> f32 {
    let wrapped = degrees.rem_euclid(360.0);
    if wrapped > 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}
