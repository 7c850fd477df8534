#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Weighted item spawn volume.
//!
//! The volume picks an item kind from the spawn table of the active
//! `(level, wave)` slot, picks a uniformly random point inside its box,
//! snaps the point onto the ground below and emits a spawn command.

use glam::Vec3;
use log::debug;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sparta_core::{Command, ItemKind, SpawnTable, SurfaceView};
use thiserror::Error;

/// Height above the sampled point where the ground trace starts.
const TRACE_UP: f32 = 500.0;
/// Depth below the sampled point where the ground trace ends.
const TRACE_DOWN: f32 = 1_000.0;
/// Clearance kept between the ground hit and the spawned item.
const GROUND_CLEARANCE: f32 = 50.0;

/// Axis-aligned box items are spawned in.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpawnBox {
    center: Vec3,
    half_extent: Vec3,
}

impl SpawnBox {
    /// Creates a box spanning `half_extent` in every direction around `center`.
    #[must_use]
    pub fn new(center: Vec3, half_extent: Vec3) -> Self {
        Self {
            center,
            half_extent: half_extent.abs(),
        }
    }

    /// Center of the box.
    #[must_use]
    pub const fn center(&self) -> Vec3 {
        self.center
    }

    /// Half extent along each axis.
    #[must_use]
    pub const fn half_extent(&self) -> Vec3 {
        self.half_extent
    }

    /// Reports whether `point` lies inside the box, borders included.
    #[must_use]
    pub fn contains(&self, point: Vec3) -> bool {
        let offset = (point - self.center).abs();
        offset.cmple(self.half_extent).all()
    }
}

/// Errors raised while selecting the active spawn table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum SpawnVolumeError {
    /// No spawn table is configured for the requested slot.
    #[error("no spawn table for level {level} wave {wave} (slot {slot:?})")]
    MissingTable {
        /// Requested level index.
        level: u32,
        /// Requested wave index.
        wave: u32,
        /// Flat slot the pair maps to, when representable.
        slot: Option<usize>,
    },
}

/// Spawns randomly chosen items at random grounded points inside a box.
#[derive(Debug)]
pub struct SpawnVolume {
    bounds: SpawnBox,
    tables: Vec<SpawnTable>,
    waves_per_level: u32,
    current: Option<usize>,
    rng: ChaCha8Rng,
}

impl SpawnVolume {
    /// Creates a volume with one table per `(level, wave)` slot, laid out level-major.
    ///
    /// No table is active until [`SpawnVolume::set_current_table_index`] is called.
    #[must_use]
    pub fn new(bounds: SpawnBox, tables: Vec<SpawnTable>, waves_per_level: u32, seed: u64) -> Self {
        Self {
            bounds,
            tables,
            waves_per_level,
            current: None,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Box the volume spawns in.
    #[must_use]
    pub const fn bounds(&self) -> SpawnBox {
        self.bounds
    }

    /// Flat slot of the active spawn table, if any.
    #[must_use]
    pub const fn current_table_index(&self) -> Option<usize> {
        self.current
    }

    /// Activates the spawn table configured for `(level, wave)`.
    ///
    /// A missing slot clears the active table so later draws yield nothing.
    pub fn set_current_table_index(&mut self, level: u32, wave: u32) -> Result<(), SpawnVolumeError> {
        let slot = self.slot(level, wave);
        match slot.filter(|slot| *slot < self.tables.len()) {
            Some(slot) => {
                self.current = Some(slot);
                Ok(())
            }
            None => {
                self.current = None;
                Err(SpawnVolumeError::MissingTable { level, wave, slot })
            }
        }
    }

    /// Samples a point uniformly inside the box and snaps it onto the ground below.
    ///
    /// Points with no surface under them stay where they were sampled.
    pub fn random_point_in_volume(&mut self, surfaces: SurfaceView<'_>) -> Vec3 {
        let point = self.sample_point();
        ground_point(surfaces, point).unwrap_or(point)
    }

    fn sample_point(&mut self) -> Vec3 {
        let unit = Vec3::new(
            self.rng.gen::<f32>(),
            self.rng.gen::<f32>(),
            self.rng.gen::<f32>(),
        );
        let min = self.bounds.center - self.bounds.half_extent;
        min + unit * self.bounds.half_extent * 2.0
    }

    /// Draws an item kind from the active table, `None` when it carries no weight.
    pub fn random_item(&mut self) -> Option<ItemKind> {
        let table = self.tables.get(self.current?)?;
        let total = table.total_weight();
        if total <= 0.0 {
            return None;
        }

        let draw = self.rng.gen::<f32>() * total;
        let mut cumulative = 0.0;
        let mut last = None;
        for entry in table.entries().iter().filter(|entry| entry.weight() > 0.0) {
            cumulative += entry.weight();
            last = Some(entry.kind());
            if draw < cumulative {
                return last;
            }
        }
        // Rounding may leave the draw just above the final sum.
        last
    }

    /// Spawns one random item on the ground below a random point.
    ///
    /// Returns the spawned kind so callers can count collectibles.
    pub fn spawn_random_item(
        &mut self,
        surfaces: SurfaceView<'_>,
        out: &mut Vec<Command>,
    ) -> Option<ItemKind> {
        let kind = self.random_item()?;
        let position = self.random_point_in_volume(surfaces);
        self.spawn_item(kind, position, out);
        Some(kind)
    }

    /// Emits the command spawning `kind` at `position`.
    pub fn spawn_item(&self, kind: ItemKind, position: Vec3, out: &mut Vec<Command>) {
        debug!(
            "spawning {} at ({:.0}, {:.0}, {:.0})",
            kind.label(),
            position.x,
            position.y,
            position.z
        );
        out.push(Command::SpawnItem { kind, position });
    }

    fn slot(&self, level: u32, wave: u32) -> Option<usize> {
        if wave >= self.waves_per_level {
            return None;
        }
        let width = usize::try_from(self.waves_per_level).ok()?;
        let level = usize::try_from(level).ok()?;
        let wave = usize::try_from(wave).ok()?;
        level.checked_mul(width)?.checked_add(wave)
    }
}

/// Traces straight down through `point` and lifts the hit clear of the ground.
fn ground_point(surfaces: SurfaceView<'_>, point: Vec3) -> Option<Vec3> {
    let start = point + Vec3::Z * TRACE_UP;
    let end = point - Vec3::Z * TRACE_DOWN;
    surfaces
        .line_trace(start, end)
        .map(|hit| hit + Vec3::Z * GROUND_CLEARANCE)
}
