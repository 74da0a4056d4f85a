//! Pooled turret state.

use std::time::Duration;

use glam::Vec3;
use grid_defence_core::{CellCoord, TowerId};
use grid_defence_pool::{DespawnHandle, Poolable, SpawnWithContext};
use serde::{Deserialize, Serialize};

use crate::projectile::{ProjectileDefinition, ProjectileSpawn};

/// Authoring data for a turret kind.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TurretDefinition {
    /// Targeting radius in world units.
    pub range: f32,
    /// Time between two shots, in milliseconds.
    pub fire_interval_ms: u64,
    /// Height of the muzzle above the turret's cell.
    pub muzzle_height: f32,
    /// Projectile fired by the turret.
    pub projectile: ProjectileDefinition,
}

impl Default for TurretDefinition {
    fn default() -> Self {
        Self {
            range: 3.0,
            fire_interval_ms: 800,
            muzzle_height: 0.5,
            projectile: ProjectileDefinition::default(),
        }
    }
}

/// Context applied when a turret is built on a tower cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TurretSpawn {
    /// Tower the turret is mounted on.
    pub tower: TowerId,
    /// Cell the tower occupies.
    pub cell: CellCoord,
    /// World position of the cell centre.
    pub position: Vec3,
    /// Kind of turret to build.
    pub definition: TurretDefinition,
}

/// Turret mounted on a tower.
#[derive(Clone, Debug, Default)]
pub struct Turret {
    handle: Option<DespawnHandle>,
    tower: Option<TowerId>,
    cell: Option<CellCoord>,
    position: Vec3,
    definition: TurretDefinition,
    cooldown: Duration,
}

impl Turret {
    /// Handle used to return the turret to its pool.
    #[must_use]
    pub fn handle(&self) -> Option<DespawnHandle> {
        self.handle
    }

    /// Tower the turret is mounted on.
    #[must_use]
    pub fn tower(&self) -> Option<TowerId> {
        self.tower
    }

    /// Cell the turret stands on.
    #[must_use]
    pub fn cell(&self) -> Option<CellCoord> {
        self.cell
    }

    /// World position of the turret base.
    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Counts the fire cooldown down and fires at the nearest target in range.
    ///
    /// Returns the projectile to spawn when the turret fired.
    pub fn tick(
        &mut self,
        dt: Duration,
        targets: impl IntoIterator<Item = Vec3>,
    ) -> Option<ProjectileSpawn> {
        self.cooldown = self.cooldown.saturating_sub(dt);
        if !self.cooldown.is_zero() {
            return None;
        }

        let muzzle = self.position + Vec3::Y * self.definition.muzzle_height;
        let range_squared = self.definition.range * self.definition.range;
        let target = targets
            .into_iter()
            .map(|target| (target, target.distance_squared(self.position)))
            .filter(|(_, distance)| *distance <= range_squared)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(target, _)| target)?;

        self.cooldown = Duration::from_millis(self.definition.fire_interval_ms);
        Some(ProjectileSpawn {
            position: muzzle,
            direction: target - muzzle,
            definition: self.definition.projectile,
        })
    }
}

impl Poolable for Turret {
    fn bind(&mut self, handle: DespawnHandle) {
        self.handle = Some(handle);
    }

    fn reset(&mut self) {
        self.tower = None;
        self.cell = None;
        self.position = Vec3::ZERO;
        self.cooldown = Duration::ZERO;
    }
}

impl SpawnWithContext for Turret {
    type Context = TurretSpawn;

    fn apply_context(&mut self, context: &TurretSpawn) {
        self.tower = Some(context.tower);
        self.cell = Some(context.cell);
        self.position = context.position;
        self.definition = context.definition;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grid_defence_pool::Pool;

    fn spawn_turret(pool: &mut Pool<Turret>) -> grid_defence_pool::PoolKey {
        pool.spawn(&TurretSpawn {
            tower: TowerId::new(0),
            cell: CellCoord::new(2, 1),
            position: Vec3::new(2.5, 0.0, 1.5),
            definition: TurretDefinition::default(),
        })
    }

    #[test]
    fn turret_fires_at_nearest_target_in_range() {
        let mut pool = Pool::new(Turret::default);
        pool.initialize(1);
        let key = spawn_turret(&mut pool);
        let turret = pool.get_mut(key).expect("spawned");

        let shot = turret
            .tick(
                Duration::from_millis(16),
                [Vec3::new(9.0, 0.0, 9.0), Vec3::new(2.5, 0.0, 3.5), Vec3::new(2.5, 0.0, 2.5)],
            )
            .expect("target in range");

        assert_eq!(shot.position, Vec3::new(2.5, 0.5, 1.5));
        assert_eq!(shot.direction, Vec3::new(0.0, -0.5, 1.0));
    }

    #[test]
    fn turret_waits_for_cooldown_between_shots() {
        let mut pool = Pool::new(Turret::default);
        pool.initialize(1);
        let key = spawn_turret(&mut pool);
        let turret = pool.get_mut(key).expect("spawned");
        let target = [Vec3::new(3.0, 0.0, 1.5)];

        assert!(turret.tick(Duration::ZERO, target).is_some());
        assert!(turret.tick(Duration::from_millis(400), target).is_none());
        assert!(turret.tick(Duration::from_millis(400), target).is_some());
    }

    #[test]
    fn turret_ignores_targets_out_of_range() {
        let mut turret = Turret::default();
        assert!(turret
            .tick(Duration::from_millis(16), [Vec3::new(10.0, 0.0, 0.0)])
            .is_none());
    }

    #[test]
    fn despawned_turret_forgets_its_tower() {
        let mut pool = Pool::new(Turret::default);
        pool.initialize(1);
        let key = spawn_turret(&mut pool);
        pool.despawn(key).expect("despawn");

        let again = pool.acquire();
        let turret = pool.get(again).expect("acquired");
        assert_eq!(turret.tower(), None);
        assert_eq!(turret.cell(), None);
    }
}
