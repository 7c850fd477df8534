//! Playable character state: movement input, control rotation and health.

use std::time::Duration;

use glam::{Vec2, Vec3};
use sparta_core::{PlayerSnapshot, PLAYER_TAG};

const PITCH_LIMIT_DEGREES: f32 = 89.0;

/// Movement and health parameters of the playable character.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CharacterTuning {
    /// Health the character spawns with and can be healed up to.
    pub max_health: f32,
    /// Walking speed in units per second.
    pub normal_speed: f32,
    /// Factor applied to the walking speed while sprinting.
    pub sprint_multiplier: f32,
    /// Radius of the character's collision capsule.
    pub collision_radius: f32,
    /// Distance between the capsule's center and the ground it stands on.
    pub capsule_half_height: f32,
}

impl Default for CharacterTuning {
    fn default() -> Self {
        Self {
            max_health: 100.0,
            normal_speed: 600.0,
            sprint_multiplier: 1.5,
            collision_radius: 42.0,
            capsule_half_height: 90.0,
        }
    }
}

/// Result of applying damage to the character.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct DamageOutcome {
    /// Health remaining after the hit.
    pub(crate) health: f32,
    /// Set only by the hit that brought health to zero.
    pub(crate) died: bool,
}

#[derive(Clone, Debug)]
pub(crate) struct Character {
    position: Vec3,
    yaw_degrees: f32,
    pitch_degrees: f32,
    health: f32,
    move_input: Vec2,
    sprinting: bool,
    jumping: bool,
    dead: bool,
    tags: Vec<&'static str>,
    tuning: CharacterTuning,
}

impl Character {
    pub(crate) fn spawn(position: Vec3, tuning: CharacterTuning) -> Self {
        Self {
            position,
            yaw_degrees: 0.0,
            pitch_degrees: 0.0,
            health: tuning.max_health,
            move_input: Vec2::ZERO,
            sprinting: false,
            jumping: false,
            dead: false,
            tags: vec![PLAYER_TAG],
            tuning,
        }
    }

    pub(crate) fn position(&self) -> Vec3 {
        self.position
    }

    pub(crate) fn collision_radius(&self) -> f32 {
        self.tuning.collision_radius
    }

    pub(crate) fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|candidate| *candidate == tag)
    }

    pub(crate) fn is_alive(&self) -> bool {
        !self.dead
    }

    pub(crate) fn set_move_input(&mut self, forward: f32, right: f32) {
        self.move_input = Vec2::new(forward.clamp(-1.0, 1.0), right.clamp(-1.0, 1.0));
    }

    pub(crate) fn look(&mut self, yaw_degrees: f32, pitch_degrees: f32) {
        self.yaw_degrees = (self.yaw_degrees + yaw_degrees).rem_euclid(360.0);
        self.pitch_degrees =
            (self.pitch_degrees + pitch_degrees).clamp(-PITCH_LIMIT_DEGREES, PITCH_LIMIT_DEGREES);
    }

    pub(crate) fn set_sprinting(&mut self, active: bool) {
        self.sprinting = active;
    }

    pub(crate) fn set_jumping(&mut self, active: bool) {
        self.jumping = active;
    }

    pub(crate) fn max_walk_speed(&self) -> f32 {
        if self.sprinting {
            self.tuning.normal_speed * self.tuning.sprint_multiplier
        } else {
            self.tuning.normal_speed
        }
    }

    /// Consumes the pending move input, moving along the control yaw.
    pub(crate) fn integrate(&mut self, dt: Duration) {
        let input = std::mem::take(&mut self.move_input);
        if self.dead || input == Vec2::ZERO {
            return;
        }

        let yaw = self.yaw_degrees.to_radians();
        let forward = Vec3::new(yaw.cos(), yaw.sin(), 0.0);
        let right = Vec3::new(-yaw.sin(), yaw.cos(), 0.0);
        let direction = (forward * input.x + right * input.y).clamp_length_max(1.0);
        self.position += direction * self.max_walk_speed() * dt.as_secs_f32();
    }

    /// Places the capsule on top of the ground at `height`.
    pub(crate) fn stand_on(&mut self, height: f32) {
        self.position.z = height + self.tuning.capsule_half_height;
    }

    /// Applies damage. Returns `None` once the character is already dead.
    pub(crate) fn take_damage(&mut self, amount: f32) -> Option<DamageOutcome> {
        if self.dead {
            return None;
        }
        self.health = (self.health - amount).clamp(0.0, self.tuning.max_health);
        let died = self.health <= 0.0;
        self.dead = died;
        Some(DamageOutcome {
            health: self.health,
            died,
        })
    }

    /// Restores health up to the maximum and returns the new health.
    pub(crate) fn add_health(&mut self, amount: f32) -> f32 {
        if !self.dead {
            self.health = (self.health + amount).clamp(0.0, self.tuning.max_health);
        }
        self.health
    }

    pub(crate) fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            position: self.position,
            yaw_degrees: self.yaw_degrees,
            pitch_degrees: self.pitch_degrees,
            health: self.health,
            max_health: self.tuning.max_health,
            sprinting: self.sprinting,
            jumping: self.jumping,
        }
    }
}
