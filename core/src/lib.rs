#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Grid Defence engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Systems emit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values that systems and
//! the composition root react to deterministically.

use std::{fmt, num::NonZeroU32, time::Duration};

use bitflags::bitflags;
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests placement of a tower on the provided cell.
    PlaceTower {
        /// Cell the tower should occupy.
        cell: CellCoord,
    },
    /// Requests removal of an existing tower from the world.
    RemoveTower {
        /// Identifier of the tower targeted for removal.
        tower: TowerId,
    },
    /// Requests that an enemy be emitted from the provided spawn cell.
    SpawnEnemy {
        /// Spawn cell the enemy should leave from.
        spawner: CellCoord,
    },
    /// Sets or clears a single state flag on a cell.
    SetCellState {
        /// Cell whose state should change.
        cell: CellCoord,
        /// Flags to set or clear.
        flag: NodeState,
        /// Whether the flags should be set (`true`) or cleared (`false`).
        value: bool,
    },
    /// Moves an enemy occupancy marker between cells.
    TrackEnemy {
        /// Cell the enemy left, if any.
        from: Option<CellCoord>,
        /// Cell the enemy entered, if any.
        to: Option<CellCoord>,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that a tower was placed into the world.
    TowerPlaced {
        /// Identifier assigned to the tower by the world.
        tower: TowerId,
        /// Cell occupied by the tower.
        cell: CellCoord,
    },
    /// Confirms that a tower was removed from the world.
    TowerRemoved {
        /// Identifier of the tower that was removed.
        tower: TowerId,
        /// Cell previously occupied by the tower.
        cell: CellCoord,
    },
    /// Reports that a tower placement request was rejected.
    TowerPlacementRejected {
        /// Cell provided in the placement request.
        cell: CellCoord,
        /// Specific reason the placement failed.
        reason: PlacementError,
    },
    /// Reports that a tower removal request was rejected.
    TowerRemovalRejected {
        /// Identifier of the tower targeted for removal.
        tower: TowerId,
        /// Specific reason the removal failed.
        reason: RemovalError,
    },
    /// Announces that walkability changed and cached paths are stale.
    PathsInvalidated,
    /// Confirms that an enemy may leave the provided spawn cell.
    EnemySpawnApproved {
        /// Spawn cell the enemy leaves from.
        spawner: CellCoord,
        /// World position of the spawn cell.
        position: Vec3,
    },
    /// Reports that an enemy spawn request named a cell that cannot spawn.
    EnemySpawnRejected {
        /// Cell provided in the spawn request.
        spawner: CellCoord,
    },
    /// Reports the resulting state of a cell after a state mutation.
    CellStateChanged {
        /// Cell whose state changed.
        cell: CellCoord,
        /// Full state of the cell after the mutation.
        state: NodeState,
    },
}

/// Location of a single grid cell expressed as `x` and `z` coordinates.
///
/// The grid lies on the horizontal plane of the world, so the second axis is
/// named after the world's depth axis rather than a screen row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    x: u32,
    z: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(x: u32, z: u32) -> Self {
        Self { x, z }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn x(&self) -> u32 {
        self.x
    }

    /// Zero-based depth index of the cell.
    #[must_use]
    pub const fn z(&self) -> u32 {
        self.z
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.x().abs_diff(other.x()) + self.z().abs_diff(other.z())
    }
}

impl fmt::Display for CellCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

/// Flattened index of a node inside the grid's node array.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(u32);

impl NodeId {
    /// Creates a new node identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Index of the node inside a dense slice.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Identifier of an edge stored inside the grid's edge arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(u32);

impl EdgeId {
    /// Creates a new edge identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a tower.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TowerId(u32);

impl TowerId {
    /// Creates a new tower identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the tower identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

bitflags! {
    /// Bitmask of the semantic roles a grid cell currently holds.
    ///
    /// A cell may hold several roles at once, for example a walkable goal
    /// cell, so roles are combined with `|` rather than modelled as variants.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct NodeState: u8 {
        /// Enemies may path through the cell.
        const WALKABLE = 1 << 0;
        /// A tower may be placed on the cell.
        const BUILDABLE = 1 << 1;
        /// A tower currently stands on the cell.
        const HAS_TOWER = 1 << 2;
        /// At least one enemy currently occupies the cell.
        const HAS_ENEMY = 1 << 3;
        /// The cell is a valid path destination.
        const IS_ENEMY_GOAL = 1 << 4;
        /// Enemies enter the grid from this cell.
        const IS_ENEMY_SPAWN = 1 << 5;
    }
}

/// Strictly positive traversal cost attached to an edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeWeight(NonZeroU32);

impl EdgeWeight {
    /// Unit weight used when no explicit cost is configured.
    pub const ONE: Self = match NonZeroU32::new(1) {
        Some(value) => Self(value),
        None => unreachable!(),
    };

    /// Creates a weight, returning `None` for zero.
    #[must_use]
    pub const fn new(value: u32) -> Option<Self> {
        match NonZeroU32::new(value) {
            Some(value) => Some(Self(value)),
            None => None,
        }
    }

    /// Retrieves the numeric weight.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0.get()
    }
}

impl Default for EdgeWeight {
    fn default() -> Self {
        Self::ONE
    }
}

/// Reasons a tower placement request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlacementError {
    /// The requested cell lies outside the configured grid bounds.
    OutOfBounds,
    /// The requested cell is not flagged as buildable.
    NotBuildable,
    /// A tower already stands on the requested cell.
    Occupied,
}

/// Reasons a tower removal request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RemovalError {
    /// No tower with the provided identifier exists.
    MissingTower,
}
