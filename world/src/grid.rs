//! Spatial grid that owns every navigation node and edge.

use glam::Vec3;
use grid_defence_core::{CellCoord, EdgeId, EdgeWeight, NodeId, NodeState};
use thiserror::Error;
use tracing::{error, warn};

use crate::node::{GridEdge, GridNode, TopologyError};

/// Cardinal edges scale by this factor when diagonal movement is enabled.
pub(crate) const CARDINAL_SCALE: u32 = 10;
/// Diagonal edges scale by this factor when diagonal movement is enabled.
pub(crate) const DIAGONAL_SCALE: u32 = 14;

/// Failures reported by cell-addressed grid operations.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum GridError {
    /// The grid description declares no cells.
    #[error("grid must contain at least one cell")]
    Empty,
    /// The number of cell descriptions does not match the dimensions.
    #[error("expected {expected} cell descriptions, found {found}")]
    CellCountMismatch {
        /// Cells implied by `columns * rows`.
        expected: usize,
        /// Cells actually supplied.
        found: usize,
    },
    /// The cell lies outside the grid.
    #[error("cell {0} lies outside the grid")]
    OutOfBounds(CellCoord),
}

/// Neighbourhood used when deriving edges from spatial adjacency.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Adjacency {
    /// Four-way connectivity.
    #[default]
    Cardinal,
    /// Eight-way connectivity; diagonal moves cost roughly √2 of a cardinal one.
    Octile,
}

/// Initial description of a single cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellDescription {
    /// State flags the cell starts with.
    pub state: NodeState,
    /// Cost of entering the cell.
    pub cost: EdgeWeight,
}

impl CellDescription {
    /// Describes a cell with the provided flags and unit cost.
    #[must_use]
    pub const fn new(state: NodeState) -> Self {
        Self {
            state,
            cost: EdgeWeight::ONE,
        }
    }
}

/// Static level description consumed once when the grid is built.
#[derive(Clone, Debug, PartialEq)]
pub struct GridDescription {
    /// Number of cells along the x axis.
    pub columns: u32,
    /// Number of cells along the z axis.
    pub rows: u32,
    /// Side length of a single cell in world units.
    pub cell_size: f32,
    /// World position of the grid's minimum corner.
    pub origin: Vec3,
    /// Neighbourhood used to derive edges.
    pub adjacency: Adjacency,
    /// Row-major cell descriptions, `columns * rows` entries long.
    pub cells: Vec<CellDescription>,
}

impl GridDescription {
    /// Uniform grid where every cell starts with `state` and unit cost.
    #[must_use]
    pub fn uniform(columns: u32, rows: u32, cell_size: f32, state: NodeState) -> Self {
        let count = usize::try_from(u64::from(columns) * u64::from(rows)).unwrap_or(0);
        Self {
            columns,
            rows,
            cell_size,
            origin: Vec3::ZERO,
            adjacency: Adjacency::Cardinal,
            cells: vec![CellDescription::new(state); count],
        }
    }

    /// Mutable access to the description of `cell`, if it lies inside the grid.
    pub fn cell_mut(&mut self, cell: CellCoord) -> Option<&mut CellDescription> {
        if cell.x() >= self.columns || cell.z() >= self.rows {
            return None;
        }
        let index = flatten(self.columns, cell)?;
        self.cells.get_mut(index)
    }
}

/// Navigation grid: dense node array plus an arena of weighted edges.
#[derive(Clone, Debug)]
pub struct Grid {
    columns: u32,
    rows: u32,
    cell_size: f32,
    origin: Vec3,
    adjacency: Adjacency,
    nodes: Vec<GridNode>,
    edges: Vec<Option<GridEdge>>,
    vacant_edges: Vec<EdgeId>,
    spawn_coords: Vec<CellCoord>,
}

impl Grid {
    /// Builds the grid and derives edges from spatial adjacency.
    ///
    /// Every pair of neighbouring cells is joined by one edge whose weight is
    /// the larger of the two cells' entry costs, so traversal stays symmetric.
    pub fn new(description: GridDescription) -> Result<Self, GridError> {
        let GridDescription {
            columns,
            rows,
            cell_size,
            origin,
            adjacency,
            cells,
        } = description;

        let expected = usize::try_from(u64::from(columns) * u64::from(rows)).unwrap_or(0);
        if expected == 0 {
            return Err(GridError::Empty);
        }
        if cells.len() != expected {
            return Err(GridError::CellCountMismatch {
                expected,
                found: cells.len(),
            });
        }

        let mut grid = Self {
            columns,
            rows,
            cell_size,
            origin,
            adjacency,
            nodes: Vec::with_capacity(expected),
            edges: Vec::new(),
            vacant_edges: Vec::new(),
            spawn_coords: Vec::new(),
        };

        for z in 0..rows {
            for x in 0..columns {
                let cell = CellCoord::new(x, z);
                let id = NodeId::new(grid.nodes.len() as u32);
                let state = cells[id.index()].state;
                let position = grid.grid_to_world(cell);
                grid.nodes.push(GridNode::new(id, cell, position, state));
            }
        }

        for z in 0..rows {
            for x in 0..columns {
                let from = CellCoord::new(x, z);
                for &(dx, dz, diagonal) in forward_offsets(adjacency) {
                    let Some(to) = offset(from, dx, dz, columns, rows) else {
                        continue;
                    };
                    let (Some(a), Some(b)) = (grid.index_of(from), grid.index_of(to)) else {
                        continue;
                    };
                    let cost = cells[a.index()].cost.max(cells[b.index()].cost).get();
                    let scaled = match (adjacency, diagonal) {
                        (Adjacency::Cardinal, _) => cost,
                        (Adjacency::Octile, false) => cost.saturating_mul(CARDINAL_SCALE),
                        (Adjacency::Octile, true) => cost.saturating_mul(DIAGONAL_SCALE),
                    };
                    let weight = EdgeWeight::new(scaled).unwrap_or(EdgeWeight::ONE);
                    // Fresh cells never share an edge yet, so this cannot collide.
                    let _ = grid.add_edge(a, b, weight);
                }
            }
        }

        grid.refresh_spawn_coords();
        Ok(grid)
    }

    /// Number of cells along the x axis.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of cells along the z axis.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Side length of a single cell in world units.
    #[must_use]
    pub const fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Neighbourhood the grid was built with.
    #[must_use]
    pub const fn adjacency(&self) -> Adjacency {
        self.adjacency
    }

    /// Every node in flattened order.
    #[must_use]
    pub fn nodes(&self) -> &[GridNode] {
        &self.nodes
    }

    /// Number of nodes in the grid.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of live edges in the grid.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.iter().flatten().count()
    }

    /// Reports whether `cell` lies inside the grid.
    #[must_use]
    pub const fn is_within_bounds(&self, cell: CellCoord) -> bool {
        cell.x() < self.columns && cell.z() < self.rows
    }

    /// Flattened index of `cell`, if it lies inside the grid.
    #[must_use]
    pub fn index_of(&self, cell: CellCoord) -> Option<NodeId> {
        if !self.is_within_bounds(cell) {
            return None;
        }
        flatten(self.columns, cell).map(|index| NodeId::new(index as u32))
    }

    /// Node stored at `cell`.
    #[must_use]
    pub fn node(&self, cell: CellCoord) -> Option<&GridNode> {
        self.index_of(cell).and_then(|id| self.node_by_id(id))
    }

    /// Node stored under `id`.
    #[must_use]
    pub fn node_by_id(&self, id: NodeId) -> Option<&GridNode> {
        self.nodes.get(id.index())
    }

    /// Edge stored under `id`, if it has not been removed.
    #[must_use]
    pub fn edge(&self, id: EdgeId) -> Option<&GridEdge> {
        self.edges.get(id.get() as usize).and_then(Option::as_ref)
    }

    /// State bitmask of `cell`.
    #[must_use]
    pub fn state(&self, cell: CellCoord) -> Option<NodeState> {
        self.node(cell).map(GridNode::state)
    }

    /// Reports whether a tower may be placed on `cell`.
    #[must_use]
    pub fn is_buildable(&self, cell: CellCoord) -> bool {
        self.node(cell)
            .is_some_and(|node| node.is(NodeState::BUILDABLE) && !node.is(NodeState::HAS_TOWER))
    }

    /// Reports whether enemies may traverse `cell`.
    #[must_use]
    pub fn is_walkable(&self, cell: CellCoord) -> bool {
        self.node(cell).is_some_and(|node| node.is(NodeState::WALKABLE))
    }

    /// Sets or clears `flag` on `cell` and returns the resulting state.
    pub fn set_state(
        &mut self,
        cell: CellCoord,
        flag: NodeState,
        value: bool,
    ) -> Result<NodeState, GridError> {
        let Some(id) = self.index_of(cell) else {
            warn!(%cell, ?flag, "state change requested outside the grid");
            return Err(GridError::OutOfBounds(cell));
        };

        let node = &mut self.nodes[id.index()];
        node.set_state(flag, value);
        let state = node.state();

        if flag.contains(NodeState::IS_ENEMY_SPAWN) {
            self.refresh_spawn_coords();
        }
        Ok(state)
    }

    /// Flips the `HAS_TOWER` flag of `cell`.
    ///
    /// Walkability and buildability are left to the caller; the world's
    /// placement handling clears them alongside this flag.
    pub fn set_tower_state(&mut self, cell: CellCoord, occupied: bool) -> Result<(), GridError> {
        self.set_state(cell, NodeState::HAS_TOWER, occupied).map(|_| ())
    }

    /// World position of the center of `cell`.
    #[must_use]
    pub fn grid_to_world(&self, cell: CellCoord) -> Vec3 {
        self.origin
            + Vec3::new(
                (cell.x() as f32 + 0.5) * self.cell_size,
                0.0,
                (cell.z() as f32 + 0.5) * self.cell_size,
            )
    }

    /// Cell containing `position`, if it lies over the grid.
    #[must_use]
    pub fn world_to_grid(&self, position: Vec3) -> Option<CellCoord> {
        if self.cell_size <= 0.0 {
            return None;
        }
        let local = (position - self.origin) / self.cell_size;
        if local.x < 0.0 || local.z < 0.0 {
            return None;
        }
        let cell = CellCoord::new(local.x.floor() as u32, local.z.floor() as u32);
        self.is_within_bounds(cell).then_some(cell)
    }

    /// Node whose center lies closest to `position`; the lowest index wins ties.
    #[must_use]
    pub fn nearest_node(&self, position: Vec3) -> Option<NodeId> {
        let mut best: Option<(f32, NodeId)> = None;
        for node in &self.nodes {
            let distance = node.position().distance_squared(position);
            match best {
                Some((best_distance, _)) if distance >= best_distance => {}
                _ => best = Some((distance, node.id())),
            }
        }
        best.map(|(_, id)| id)
    }

    /// Cells flagged as enemy spawn points, in flattened order.
    #[must_use]
    pub fn enemy_spawn_coords(&self) -> &[CellCoord] {
        &self.spawn_coords
    }

    /// Cells flagged as enemy goals, in flattened order.
    #[must_use]
    pub fn goal_coords(&self) -> Vec<CellCoord> {
        self.nodes
            .iter()
            .filter(|node| node.is(NodeState::IS_ENEMY_GOAL))
            .map(GridNode::cell)
            .collect()
    }

    /// Connects `a` and `b` with an edge of the given weight.
    ///
    /// Slots freed by [`Grid::remove_edge`] are reused before the edge arena
    /// grows.
    ///
    /// Missing endpoints, self loops and duplicate connections are logged and
    /// rejected without touching the graph.
    pub fn add_edge(
        &mut self,
        a: NodeId,
        b: NodeId,
        weight: EdgeWeight,
    ) -> Result<EdgeId, TopologyError> {
        let result = self.try_add_edge(a, b, weight);
        if let Err(reason) = &result {
            error!(?a, ?b, %reason, "rejected edge creation");
        }
        result
    }

    fn try_add_edge(
        &mut self,
        a: NodeId,
        b: NodeId,
        weight: EdgeWeight,
    ) -> Result<EdgeId, TopologyError> {
        for node in [a, b] {
            if self.node_by_id(node).is_none() {
                return Err(TopologyError::MissingNode(node));
            }
        }
        let edge = GridEdge::new(a, b, weight)?;
        if self.edge_between(a, b).is_some() {
            return Err(TopologyError::DuplicateEdge(a, b));
        }

        let id = match self.vacant_edges.pop() {
            Some(id) => {
                self.edges[id.get() as usize] = Some(edge);
                id
            }
            None => {
                self.edges.push(Some(edge));
                EdgeId::new(self.edges.len() as u32 - 1)
            }
        };
        self.nodes[a.index()].attach(id);
        self.nodes[b.index()].attach(id);
        Ok(id)
    }

    /// Removes the edge joining `a` and `b` from both endpoints.
    ///
    /// Removing a connection that does not exist is logged and reported.
    pub fn remove_edge(&mut self, a: NodeId, b: NodeId) -> Result<GridEdge, TopologyError> {
        let Some(id) = self.edge_between(a, b) else {
            let reason = TopologyError::MissingEdge(a, b);
            error!(?a, ?b, %reason, "rejected edge removal");
            return Err(reason);
        };

        let edge = self.edges[id.get() as usize]
            .take()
            .ok_or(TopologyError::MissingEdge(a, b))?;
        for endpoint in edge.endpoints() {
            self.nodes[endpoint.index()].detach(id);
        }
        self.vacant_edges.push(id);
        Ok(edge)
    }

    /// Edge joining `a` and `b`, if any.
    #[must_use]
    pub fn edge_between(&self, a: NodeId, b: NodeId) -> Option<EdgeId> {
        let node = self.node_by_id(a)?;
        node.edges()
            .iter()
            .copied()
            .find(|id| self.edge(*id).is_some_and(|edge| edge.connects(a, b)))
    }

    /// Neighbours of `node` with the weight of the connecting edge.
    pub fn neighbors(&self, node: NodeId) -> impl Iterator<Item = (NodeId, EdgeWeight)> + '_ {
        self.node_by_id(node)
            .map(GridNode::edges)
            .unwrap_or_default()
            .iter()
            .filter_map(move |id| {
                let edge = self.edge(*id)?;
                Some((edge.opposite(node)?, edge.weight()))
            })
    }

    fn refresh_spawn_coords(&mut self) {
        self.spawn_coords = self
            .nodes
            .iter()
            .filter(|node| node.is(NodeState::IS_ENEMY_SPAWN))
            .map(GridNode::cell)
            .collect();
    }
}

fn flatten(columns: u32, cell: CellCoord) -> Option<usize> {
    let x = usize::try_from(cell.x()).ok()?;
    let z = usize::try_from(cell.z()).ok()?;
    let width = usize::try_from(columns).ok()?;
    z.checked_mul(width)?.checked_add(x)
}

fn forward_offsets(adjacency: Adjacency) -> &'static [(i64, i64, bool)] {
    match adjacency {
        Adjacency::Cardinal => &[(1, 0, false), (0, 1, false)],
        Adjacency::Octile => &[(1, 0, false), (0, 1, false), (1, 1, true), (-1, 1, true)],
    }
}

fn offset(cell: CellCoord, dx: i64, dz: i64, columns: u32, rows: u32) -> Option<CellCoord> {
    let x = i64::from(cell.x()) + dx;
    let z = i64::from(cell.z()) + dz;
    if x < 0 || z < 0 || x >= i64::from(columns) || z >= i64::from(rows) {
        return None;
    }
    Some(CellCoord::new(x as u32, z as u32))
}
