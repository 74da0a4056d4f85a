//! Level layout authoring format.
//!
//! A level is described in TOML with one string per grid row:
//!
//! ```toml
//! cell_size = 1.0
//! origin = [0.0, 0.0, 0.0]
//! diagonal = false
//! map = [
//!     "S...#",
//!     "#_#.G",
//! ]
//!
//! [[costs]]
//! x = 3
//! z = 0
//! cost = 4
//! ```
//!
//! | Glyph | Flags |
//! |---|---|
//! | `.` | walkable, buildable |
//! | `_` | walkable |
//! | `B` | buildable |
//! | `#` | none |
//! | `S` | walkable, enemy spawn |
//! | `G` | walkable, enemy goal |

use glam::Vec3;
use grid_defence_core::{CellCoord, EdgeWeight, NodeState};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::grid::{Adjacency, CellDescription, GridDescription};

/// Errors raised while turning a layout into a grid description.
#[derive(Debug, Error)]
pub enum LayoutError {
    /// The TOML document could not be parsed.
    #[error("could not parse level layout: {0}")]
    Parse(#[from] toml::de::Error),
    /// The map contains no cells.
    #[error("level map is empty")]
    Empty,
    /// A map row differs in length from the first row.
    #[error("map row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        /// Zero-based row index.
        row: usize,
        /// Cells in the first row.
        expected: usize,
        /// Cells in the offending row.
        found: usize,
    },
    /// A map glyph has no meaning.
    #[error("unknown glyph '{glyph}' at {cell}")]
    UnknownGlyph {
        /// Offending character.
        glyph: char,
        /// Cell the character describes.
        cell: CellCoord,
    },
    /// A cost override names a cell outside the map.
    #[error("cost override at {0} lies outside the map")]
    CostOutOfBounds(CellCoord),
    /// A cost override is zero.
    #[error("cost override at {0} must be positive")]
    ZeroCost(CellCoord),
    /// The cell size is not a positive finite number.
    #[error("cell size must be positive, got {0}")]
    InvalidCellSize(f32),
}

/// Entry cost override for a single cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostOverride {
    /// Column of the cell.
    pub x: u32,
    /// Depth row of the cell.
    pub z: u32,
    /// Cost of entering the cell.
    pub cost: u32,
}

/// Serialisable level layout.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelLayout {
    /// Side length of a single cell in world units.
    #[serde(default = "default_cell_size")]
    pub cell_size: f32,
    /// World position of the grid's minimum corner.
    #[serde(default)]
    pub origin: [f32; 3],
    /// Enables eight-way movement.
    #[serde(default)]
    pub diagonal: bool,
    /// One string per row, one glyph per cell.
    pub map: Vec<String>,
    /// Optional per-cell entry costs.
    #[serde(default)]
    pub costs: Vec<CostOverride>,
}

fn default_cell_size() -> f32 {
    1.0
}

impl LevelLayout {
    /// Parses a layout from TOML source.
    pub fn from_toml_str(source: &str) -> Result<Self, LayoutError> {
        Ok(toml::from_str(source)?)
    }

    /// Validates the layout and converts it into a grid description.
    pub fn to_description(&self) -> Result<GridDescription, LayoutError> {
        if !(self.cell_size.is_finite() && self.cell_size > 0.0) {
            return Err(LayoutError::InvalidCellSize(self.cell_size));
        }

        let expected = self.map.first().map_or(0, |row| row.chars().count());
        if expected == 0 {
            return Err(LayoutError::Empty);
        }

        let mut cells = Vec::with_capacity(expected * self.map.len());
        for (z, row) in self.map.iter().enumerate() {
            let found = row.chars().count();
            if found != expected {
                return Err(LayoutError::RaggedRow {
                    row: z,
                    expected,
                    found,
                });
            }

            for (x, glyph) in row.chars().enumerate() {
                let cell = CellCoord::new(x as u32, z as u32);
                let state = state_for(glyph).ok_or(LayoutError::UnknownGlyph { glyph, cell })?;
                cells.push(CellDescription::new(state));
            }
        }

        let mut description = GridDescription {
            columns: expected as u32,
            rows: self.map.len() as u32,
            cell_size: self.cell_size,
            origin: Vec3::from_array(self.origin),
            adjacency: if self.diagonal {
                Adjacency::Octile
            } else {
                Adjacency::Cardinal
            },
            cells,
        };

        for cost in &self.costs {
            let cell = CellCoord::new(cost.x, cost.z);
            let weight = EdgeWeight::new(cost.cost).ok_or(LayoutError::ZeroCost(cell))?;
            let target = description
                .cell_mut(cell)
                .ok_or(LayoutError::CostOutOfBounds(cell))?;
            target.cost = weight;
        }

        Ok(description)
    }
}

fn state_for(glyph: char) -> Option<NodeState> {
    let state = match glyph {
        '.' => NodeState::WALKABLE | NodeState::BUILDABLE,
        '_' => NodeState::WALKABLE,
        'B' => NodeState::BUILDABLE,
        '#' => NodeState::empty(),
        'S' => NodeState::WALKABLE | NodeState::IS_ENEMY_SPAWN,
        'G' => NodeState::WALKABLE | NodeState::IS_ENEMY_GOAL,
        _ => return None,
    };
    Some(state)
}
