//! Item records and their per-kind activation rules.

use std::time::Duration;

use glam::Vec3;
use sparta_core::{EffectId, EffectKind, ItemId, ItemKind, ItemSnapshot, TimerHandle};

/// Gameplay parameters of every item kind.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ItemTuning {
    /// Points awarded by a small coin.
    pub small_coin_points: u32,
    /// Points awarded by a big coin.
    pub big_coin_points: u32,
    /// Health restored by a healing pickup.
    pub healing_amount: f32,
    /// Radius of an item's pickup sphere.
    pub pickup_radius: f32,
    /// Time between arming a mine and its explosion.
    pub mine_delay: Duration,
    /// Radius of a mine's explosion sphere.
    pub mine_radius: f32,
    /// Damage dealt by a mine to a player inside the explosion sphere.
    pub mine_damage: f32,
    /// Lifetime of pickup and explosion effects.
    pub effect_lifetime: Duration,
    /// Presentation spin applied to coins, in degrees per second.
    pub spin_degrees_per_second: f32,
}

impl Default for ItemTuning {
    fn default() -> Self {
        Self {
            small_coin_points: 10,
            big_coin_points: 50,
            healing_amount: 20.0,
            pickup_radius: 50.0,
            mine_delay: Duration::from_secs(5),
            mine_radius: 300.0,
            mine_damage: 30.0,
            effect_lifetime: Duration::from_secs(2),
            spin_degrees_per_second: 90.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ItemState {
    Idle,
    Armed { detonation: TimerHandle },
}

/// What touching an item does.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Activation {
    /// Award points, then disappear.
    Collect { value: u32 },
    /// Restore health, then disappear.
    Heal { amount: f32 },
    /// Play effects, then disappear.
    Consume,
    /// Start the detonation countdown.
    Arm,
}

#[derive(Clone, Debug)]
pub(crate) struct Item {
    pub(crate) id: ItemId,
    pub(crate) kind: ItemKind,
    pub(crate) position: Vec3,
    pub(crate) yaw_degrees: f32,
    pub(crate) state: ItemState,
}

impl Item {
    pub(crate) fn new(id: ItemId, kind: ItemKind, position: Vec3) -> Self {
        Self {
            id,
            kind,
            position,
            yaw_degrees: 0.0,
            state: ItemState::Idle,
        }
    }

    /// Resolves the activation for this item, `None` when touching it does nothing.
    pub(crate) fn activation(&self, tuning: &ItemTuning) -> Option<Activation> {
        match self.kind {
            ItemKind::Pickup => Some(Activation::Consume),
            ItemKind::SmallCoin => Some(Activation::Collect {
                value: tuning.small_coin_points,
            }),
            ItemKind::BigCoin => Some(Activation::Collect {
                value: tuning.big_coin_points,
            }),
            ItemKind::Healing => Some(Activation::Heal {
                amount: tuning.healing_amount,
            }),
            ItemKind::Mine => match self.state {
                ItemState::Idle => Some(Activation::Arm),
                ItemState::Armed { .. } => None,
            },
        }
    }

    pub(crate) fn spin(&mut self, dt: Duration, degrees_per_second: f32) {
        if self.kind.is_coin() {
            self.yaw_degrees =
                (self.yaw_degrees + degrees_per_second * dt.as_secs_f32()).rem_euclid(360.0);
        }
    }

    pub(crate) fn snapshot(&self) -> ItemSnapshot {
        ItemSnapshot {
            id: self.id,
            kind: self.kind,
            position: self.position,
            armed: matches!(self.state, ItemState::Armed { .. }),
        }
    }
}

/// Transient particle or sound instance.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Effect {
    pub(crate) id: EffectId,
    pub(crate) kind: EffectKind,
}

/// Effects played when an item is picked up.
pub(crate) const PICKUP_EFFECTS: [EffectKind; 2] =
    [EffectKind::PickupParticle, EffectKind::PickupSound];

/// Effects played when a mine explodes.
pub(crate) const EXPLOSION_EFFECTS: [EffectKind; 2] =
    [EffectKind::ExplosionParticle, EffectKind::ExplosionSound];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coins_award_configured_points() {
        let tuning = ItemTuning::default();
        let small = Item::new(ItemId::new(1), ItemKind::SmallCoin, Vec3::ZERO);
        let big = Item::new(ItemId::new(2), ItemKind::BigCoin, Vec3::ZERO);

        assert_eq!(
            small.activation(&tuning),
            Some(Activation::Collect { value: 10 })
        );
        assert_eq!(
            big.activation(&tuning),
            Some(Activation::Collect { value: 50 })
        );
    }

    #[test]
    fn armed_mine_ignores_further_touches() {
        let tuning = ItemTuning::default();
        let mut mine = Item::new(ItemId::new(3), ItemKind::Mine, Vec3::ZERO);
        assert_eq!(mine.activation(&tuning), Some(Activation::Arm));

        let mut scheduler = sparta_core::Scheduler::new();
        mine.state = ItemState::Armed {
            detonation: scheduler.schedule(tuning.mine_delay, ()),
        };
        assert_eq!(mine.activation(&tuning), None);
        assert!(mine.snapshot().armed);
    }

    #[test]
    fn only_coins_spin() {
        let mut coin = Item::new(ItemId::new(4), ItemKind::BigCoin, Vec3::ZERO);
        let mut mine = Item::new(ItemId::new(5), ItemKind::Mine, Vec3::ZERO);
        coin.spin(Duration::from_secs(5), 90.0);
        mine.spin(Duration::from_secs(5), 90.0);

        assert!((coin.yaw_degrees - 90.0).abs() < 1e-3);
        assert_eq!(mine.yaw_degrees, 0.0);
    }
}
