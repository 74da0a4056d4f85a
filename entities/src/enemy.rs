//! Pooled enemy state.

use std::time::Duration;

use glam::Vec3;
use grid_defence_core::CellCoord;
use grid_defence_pool::{DespawnHandle, Poolable, SpawnWithContext};
use serde::{Deserialize, Serialize};

/// Authoring data shared by enemies of one kind.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyDefinition {
    /// Travel speed in world units per second.
    pub speed: f32,
    /// Minimum time between two path requests, in milliseconds.
    pub repath_cooldown_ms: u64,
}

impl Default for EnemyDefinition {
    fn default() -> Self {
        Self {
            speed: 2.0,
            repath_cooldown_ms: 250,
        }
    }
}

impl EnemyDefinition {
    /// Repath cooldown as a duration.
    #[must_use]
    pub fn repath_cooldown(&self) -> Duration {
        Duration::from_millis(self.repath_cooldown_ms)
    }
}

/// Context applied when an enemy leaves a spawn cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemySpawn {
    /// World position the enemy appears at.
    pub position: Vec3,
    /// Kind of enemy to spawn.
    pub definition: EnemyDefinition,
}

/// Enemy walking from a spawn cell towards the closest goal.
#[derive(Clone, Debug, Default)]
pub struct Enemy {
    handle: Option<DespawnHandle>,
    definition: EnemyDefinition,
    position: Vec3,
    cell: Option<CellCoord>,
    path: Vec<Vec3>,
    next_waypoint: usize,
    needs_path: bool,
    repath_cooldown: Duration,
}

impl Enemy {
    /// Handle used to return the enemy to its pool.
    #[must_use]
    pub fn handle(&self) -> Option<DespawnHandle> {
        self.handle
    }

    /// Current world position.
    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Moves the enemy to `position`.
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    /// Travel speed in world units per second.
    #[must_use]
    pub fn speed(&self) -> f32 {
        self.definition.speed
    }

    /// Cell the enemy is recorded on, if any.
    #[must_use]
    pub fn cell(&self) -> Option<CellCoord> {
        self.cell
    }

    /// Records the enemy on `cell` and returns the previous cell.
    pub fn set_cell(&mut self, cell: Option<CellCoord>) -> Option<CellCoord> {
        std::mem::replace(&mut self.cell, cell)
    }

    /// Waypoints of the current path.
    #[must_use]
    pub fn path(&self) -> &[Vec3] {
        &self.path
    }

    /// Waypoint the enemy is heading towards.
    #[must_use]
    pub fn next_waypoint(&self) -> Option<Vec3> {
        self.path.get(self.next_waypoint).copied()
    }

    /// Marks the current waypoint as reached.
    pub fn advance_waypoint(&mut self) {
        self.next_waypoint = (self.next_waypoint + 1).min(self.path.len());
    }

    /// Reports whether every waypoint was reached.
    #[must_use]
    pub fn finished_path(&self) -> bool {
        !self.path.is_empty() && self.next_waypoint >= self.path.len()
    }

    /// Replaces the path and starts the repath cooldown.
    pub fn assign_path(&mut self, waypoints: &[Vec3]) {
        self.path.clear();
        self.path.extend_from_slice(waypoints);
        self.next_waypoint = 0;
        self.needs_path = false;
        self.repath_cooldown = self.definition.repath_cooldown();
    }

    /// Flags the current path as stale.
    pub fn invalidate_path(&mut self) {
        self.needs_path = true;
    }

    /// Reports whether a new path should be requested.
    #[must_use]
    pub fn needs_path(&self) -> bool {
        self.needs_path || self.path.is_empty()
    }

    /// Counts the repath cooldown down by `dt`.
    pub fn cool_down(&mut self, dt: Duration) {
        self.repath_cooldown = self.repath_cooldown.saturating_sub(dt);
    }

    /// Reports whether the repath cooldown elapsed.
    #[must_use]
    pub fn can_repath(&self) -> bool {
        self.repath_cooldown.is_zero()
    }

    /// Restarts the repath cooldown without touching the path.
    pub fn restart_cooldown(&mut self) {
        self.repath_cooldown = self.definition.repath_cooldown();
    }
}

impl Poolable for Enemy {
    fn bind(&mut self, handle: DespawnHandle) {
        self.handle = Some(handle);
    }

    fn reset(&mut self) {
        self.position = Vec3::ZERO;
        self.cell = None;
        self.path.clear();
        self.next_waypoint = 0;
        self.needs_path = false;
        self.repath_cooldown = Duration::ZERO;
    }
}

impl SpawnWithContext for Enemy {
    type Context = EnemySpawn;

    fn apply_context(&mut self, context: &EnemySpawn) {
        self.definition = context.definition;
        self.position = context.position;
        self.needs_path = true;
    }
}
