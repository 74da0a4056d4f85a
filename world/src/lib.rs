#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Grid Defence.
//!
//! The world owns the navigation [`Grid`] and the towers standing on it.
//! Placement and occupancy commands mutate the grid's state bitmasks through
//! [`apply`]; movement consumers read paths through the [`query`] module.

mod grid;
mod layout;
mod node;
mod pathfinding;
mod priority_queue;
mod towers;

pub use grid::{Adjacency, CellDescription, Grid, GridDescription, GridError};
pub use layout::{CostOverride, LayoutError, LevelLayout};
pub use node::{GridEdge, GridNode, TopologyError};
pub use pathfinding::{DijkstraInfo, PathError};
pub use priority_queue::{PriorityQueue, QueueError, QueueMode};

use grid_defence_core::{
    CellCoord, Command, Event, NodeState, PlacementError, RemovalError, TowerId,
};
use tracing::{debug, warn};

use crate::towers::TowerRegistry;

/// Flags that influence routing; changing any of them invalidates paths.
const PATH_FLAGS: NodeState = NodeState::WALKABLE.union(NodeState::IS_ENEMY_GOAL);

/// Represents the authoritative Grid Defence world state.
#[derive(Debug)]
pub struct World {
    grid: Grid,
    towers: TowerRegistry,
    enemy_counts: Vec<u16>,
    tick_index: u64,
}

impl World {
    /// Creates a world around an already built grid.
    #[must_use]
    pub fn new(grid: Grid) -> Self {
        let node_count = grid.node_count();
        Self {
            grid,
            towers: TowerRegistry::new(),
            enemy_counts: vec![0; node_count],
            tick_index: 0,
        }
    }

    /// Builds the grid described by `layout` and wraps it in a world.
    pub fn from_layout(layout: &LevelLayout) -> Result<Self, WorldError> {
        let description = layout.to_description()?;
        let grid = Grid::new(description)?;
        Ok(Self::new(grid))
    }

    fn place_tower(&mut self, cell: CellCoord, out_events: &mut Vec<Event>) {
        let Some(state) = self.grid.state(cell) else {
            out_events.push(Event::TowerPlacementRejected {
                cell,
                reason: PlacementError::OutOfBounds,
            });
            return;
        };

        let reason = if state.contains(NodeState::HAS_TOWER) {
            Some(PlacementError::Occupied)
        } else if !state.contains(NodeState::BUILDABLE) {
            Some(PlacementError::NotBuildable)
        } else {
            None
        };
        if let Some(reason) = reason {
            debug!(%cell, ?reason, "tower placement rejected");
            out_events.push(Event::TowerPlacementRejected { cell, reason });
            return;
        }

        let mut displaced = NodeState::BUILDABLE;
        if state.contains(NodeState::WALKABLE) {
            displaced |= NodeState::WALKABLE;
        }

        let updated = self
            .grid
            .set_tower_state(cell, true)
            .and_then(|()| self.grid.set_state(cell, displaced, false));
        let Ok(updated) = updated else {
            return;
        };

        let tower = self.towers.insert(cell, displaced);
        out_events.push(Event::TowerPlaced { tower, cell });
        out_events.push(Event::CellStateChanged {
            cell,
            state: updated,
        });
        if displaced.contains(NodeState::WALKABLE) {
            out_events.push(Event::PathsInvalidated);
        }
    }

    fn remove_tower(&mut self, tower: TowerId, out_events: &mut Vec<Event>) {
        let Some(removed) = self.towers.remove(tower) else {
            out_events.push(Event::TowerRemovalRejected {
                tower,
                reason: RemovalError::MissingTower,
            });
            return;
        };

        let cell = removed.cell;
        let updated = self
            .grid
            .set_tower_state(cell, false)
            .and_then(|()| self.grid.set_state(cell, removed.displaced, true));
        let Ok(updated) = updated else {
            return;
        };

        out_events.push(Event::TowerRemoved { tower, cell });
        out_events.push(Event::CellStateChanged {
            cell,
            state: updated,
        });
        if removed.displaced.contains(NodeState::WALKABLE) {
            out_events.push(Event::PathsInvalidated);
        }
    }

    fn track_enemy(&mut self, from: Option<CellCoord>, to: Option<CellCoord>) {
        if let Some(cell) = from {
            self.adjust_enemy_count(cell, false);
        }
        if let Some(cell) = to {
            self.adjust_enemy_count(cell, true);
        }
    }

    fn adjust_enemy_count(&mut self, cell: CellCoord, entered: bool) {
        let Some(id) = self.grid.index_of(cell) else {
            warn!(%cell, "enemy occupancy change outside the grid");
            return;
        };

        let count = &mut self.enemy_counts[id.index()];
        *count = if entered {
            count.saturating_add(1)
        } else {
            count.saturating_sub(1)
        };
        let occupied = *count > 0;
        let _ = self.grid.set_state(cell, NodeState::HAS_ENEMY, occupied);
    }
}

/// Errors raised while constructing a world from authoring data.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// The layout could not be converted into a grid description.
    #[error(transparent)]
    Layout(#[from] LayoutError),
    /// The grid description was rejected.
    #[error(transparent)]
    Grid(#[from] GridError),
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => {
            world.tick_index = world.tick_index.saturating_add(1);
            out_events.push(Event::TimeAdvanced { dt });
        }
        Command::PlaceTower { cell } => world.place_tower(cell, out_events),
        Command::RemoveTower { tower } => world.remove_tower(tower, out_events),
        Command::SpawnEnemy { spawner } => {
            let is_spawn = world
                .grid
                .node(spawner)
                .is_some_and(|node| node.is(NodeState::IS_ENEMY_SPAWN));
            if is_spawn {
                out_events.push(Event::EnemySpawnApproved {
                    spawner,
                    position: world.grid.grid_to_world(spawner),
                });
            } else {
                warn!(%spawner, "spawn requested from a cell that is not a spawn point");
                out_events.push(Event::EnemySpawnRejected { spawner });
            }
        }
        Command::SetCellState { cell, flag, value } => {
            let Ok(state) = world.grid.set_state(cell, flag, value) else {
                return;
            };
            out_events.push(Event::CellStateChanged { cell, state });
            if flag.intersects(PATH_FLAGS) {
                out_events.push(Event::PathsInvalidated);
            }
        }
        Command::TrackEnemy { from, to } => world.track_enemy(from, to),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use glam::Vec3;
    use grid_defence_core::{CellCoord, TowerId};

    use super::{Grid, World};

    /// Provides read-only access to the navigation grid.
    #[must_use]
    pub fn grid(world: &World) -> &Grid {
        &world.grid
    }

    /// Number of ticks the world has processed.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Reports whether a tower may be placed on `cell`.
    #[must_use]
    pub fn is_buildable(world: &World, cell: CellCoord) -> bool {
        world.grid.is_buildable(cell)
    }

    /// Tower standing on `cell`, if any.
    #[must_use]
    pub fn tower_at(world: &World, cell: CellCoord) -> Option<TowerId> {
        world.towers.at(cell)
    }

    /// Towers and their cells in identifier order.
    #[must_use]
    pub fn towers(world: &World) -> Vec<(TowerId, CellCoord)> {
        world
            .towers
            .iter()
            .map(|tower| (tower.id, tower.cell))
            .collect()
    }

    /// Cells enemies may spawn from.
    #[must_use]
    pub fn enemy_spawn_coords(world: &World) -> &[CellCoord] {
        world.grid.enemy_spawn_coords()
    }

    /// Number of enemies currently tracked on `cell`.
    #[must_use]
    pub fn enemy_count(world: &World, cell: CellCoord) -> u16 {
        world
            .grid
            .index_of(cell)
            .and_then(|id| world.enemy_counts.get(id.index()).copied())
            .unwrap_or(0)
    }

    /// Path from `position` to the closest reachable goal.
    ///
    /// See [`Grid::try_build_path_to_closest_goal`].
    pub fn try_build_path_to_closest_goal(
        world: &World,
        position: Vec3,
        out: &mut Vec<Vec3>,
    ) -> bool {
        world.grid.try_build_path_to_closest_goal(position, out)
    }
}
