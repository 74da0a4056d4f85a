#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic movement system that routes enemies along grid paths.
//!
//! Each tick every active enemy walks towards its next waypoint at its own
//! speed. Enemies without a path, or whose path went stale after a
//! `PathsInvalidated` event, ask the grid for a new route once their repath
//! cooldown elapses.

use std::time::Duration;

use glam::Vec3;
use grid_defence_core::{CellCoord, Event};
use grid_defence_entities::{Enemy, EnemyPool};
use grid_defence_pool::PoolKey;
use grid_defence_world::Grid;
use tracing::debug;

/// Configuration parameters required to construct the movement system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    arrival_tolerance: f32,
}

impl Config {
    /// Creates a configuration with the distance below which a waypoint
    /// counts as reached.
    #[must_use]
    pub const fn new(arrival_tolerance: f32) -> Self {
        Self { arrival_tolerance }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(1e-4)
    }
}

/// Result of moving a single enemy for one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MovementOutcome {
    /// The enemy crossed into a different cell.
    Moved {
        /// Enemy that moved.
        enemy: PoolKey,
        /// Cell the enemy left, if it was on the grid.
        from: Option<CellCoord>,
        /// Cell the enemy entered, if it is on the grid.
        to: Option<CellCoord>,
    },
    /// The enemy reached the final waypoint of its path.
    ReachedGoal {
        /// Enemy that arrived.
        enemy: PoolKey,
        /// Cell the enemy is recorded on.
        cell: Option<CellCoord>,
    },
    /// No goal is reachable from the enemy's position.
    Stranded {
        /// Enemy without a route.
        enemy: PoolKey,
    },
}

/// Pure system that advances enemies along their paths.
#[derive(Debug, Default)]
pub struct Movement {
    config: Config,
    waypoints: Vec<Vec3>,
}

impl Movement {
    /// Creates a new movement system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            waypoints: Vec::new(),
        }
    }

    /// Consumes world events, moves active enemies and reports what happened.
    pub fn handle(
        &mut self,
        events: &[Event],
        grid: &Grid,
        enemies: &mut EnemyPool,
        out: &mut Vec<MovementOutcome>,
    ) {
        let mut dt = Duration::ZERO;
        let mut invalidated = false;
        for event in events {
            match event {
                Event::TimeAdvanced { dt: step } => dt = dt.saturating_add(*step),
                Event::PathsInvalidated => invalidated = true,
                _ => {}
            }
        }

        for key in enemies.active_keys() {
            let Some(enemy) = enemies.get_mut(key) else {
                continue;
            };

            if invalidated {
                enemy.invalidate_path();
            }
            if dt.is_zero() {
                continue;
            }

            enemy.cool_down(dt);
            if enemy.needs_path() && enemy.can_repath() && !self.repath(grid, enemy) {
                debug!(slot = key.slot(), "enemy has no route to a goal");
                out.push(MovementOutcome::Stranded { enemy: key });
                continue;
            }

            let budget = enemy.speed() * dt.as_secs_f32();
            self.advance(enemy, budget);

            let cell = grid.world_to_grid(enemy.position());
            if cell != enemy.cell() {
                let from = enemy.set_cell(cell);
                out.push(MovementOutcome::Moved {
                    enemy: key,
                    from,
                    to: cell,
                });
            }

            if enemy.finished_path() {
                out.push(MovementOutcome::ReachedGoal {
                    enemy: key,
                    cell: enemy.cell(),
                });
            }
        }
    }

    fn repath(&mut self, grid: &Grid, enemy: &mut Enemy) -> bool {
        let found = grid.try_build_path_to_closest_goal(enemy.position(), &mut self.waypoints);
        enemy.assign_path(&self.waypoints);
        found
    }

    fn advance(&self, enemy: &mut Enemy, mut budget: f32) {
        while let Some(waypoint) = enemy.next_waypoint() {
            let offset = waypoint - enemy.position();
            let distance = offset.length();
            if distance <= budget + self.config.arrival_tolerance {
                enemy.set_position(waypoint);
                enemy.advance_waypoint();
                budget = (budget - distance).max(0.0);
                continue;
            }
            if budget > 0.0 {
                enemy.set_position(enemy.position() + offset / distance * budget);
            }
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grid_defence_entities::{EnemyDefinition, EnemySpawn};
    use grid_defence_pool::Pool;

    #[test]
    fn advance_carries_leftover_distance_past_waypoints() {
        let movement = Movement::default();
        let mut pool = Pool::new(Enemy::default);
        let key = pool.spawn(&EnemySpawn {
            position: Vec3::ZERO,
            definition: EnemyDefinition::default(),
        });
        let enemy = pool.get_mut(key).expect("spawned");
        enemy.assign_path(&[Vec3::ZERO, Vec3::X, Vec3::new(1.0, 0.0, 1.0)]);

        movement.advance(enemy, 1.5);

        assert_eq!(enemy.position(), Vec3::new(1.0, 0.0, 0.5));
        assert_eq!(enemy.next_waypoint(), Some(Vec3::new(1.0, 0.0, 1.0)));
    }
}
