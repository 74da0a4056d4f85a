//! Vertex and edge representation of the navigation graph.

use glam::Vec3;
use grid_defence_core::{CellCoord, EdgeId, EdgeWeight, NodeId, NodeState};
use thiserror::Error;
use tracing::error;

/// Rejected mutations of the grid's topology.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum TopologyError {
    /// The referenced node does not exist in the grid.
    #[error("node {0:?} does not exist")]
    MissingNode(NodeId),
    /// An edge was requested from a node to itself.
    #[error("cannot connect node {0:?} to itself")]
    SelfLoop(NodeId),
    /// An edge already connects the two nodes.
    #[error("an edge already exists between {0:?} and {1:?}")]
    DuplicateEdge(NodeId, NodeId),
    /// No edge connects the two nodes.
    #[error("no edge exists between {0:?} and {1:?}")]
    MissingEdge(NodeId, NodeId),
}

/// Single addressable cell of the grid.
#[derive(Clone, Debug)]
pub struct GridNode {
    id: NodeId,
    cell: CellCoord,
    position: Vec3,
    state: NodeState,
    edges: Vec<EdgeId>,
}

impl GridNode {
    pub(crate) fn new(id: NodeId, cell: CellCoord, position: Vec3, state: NodeState) -> Self {
        Self {
            id,
            cell,
            position,
            state,
            edges: Vec::new(),
        }
    }

    /// Flattened index of the node.
    #[must_use]
    pub const fn id(&self) -> NodeId {
        self.id
    }

    /// Grid coordinate of the node.
    #[must_use]
    pub const fn cell(&self) -> CellCoord {
        self.cell
    }

    /// World position of the node's center.
    #[must_use]
    pub const fn position(&self) -> Vec3 {
        self.position
    }

    /// Full state bitmask of the node.
    #[must_use]
    pub const fn state(&self) -> NodeState {
        self.state
    }

    /// Reports whether every flag in `flag` is set on the node.
    #[must_use]
    pub const fn is(&self, flag: NodeState) -> bool {
        self.state.contains(flag)
    }

    /// Incident edges in insertion order.
    #[must_use]
    pub fn edges(&self) -> &[EdgeId] {
        &self.edges
    }

    pub(crate) fn set_state(&mut self, flag: NodeState, value: bool) {
        self.state.set(flag, value);
    }

    pub(crate) fn attach(&mut self, edge: EdgeId) {
        self.edges.push(edge);
    }

    pub(crate) fn detach(&mut self, edge: EdgeId) {
        self.edges.retain(|candidate| *candidate != edge);
    }
}

/// Weighted undirected connection between two distinct nodes.
///
/// The grid's edge arena owns every edge; both endpoints refer to it by
/// [`EdgeId`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridEdge {
    endpoints: [NodeId; 2],
    weight: EdgeWeight,
}

impl GridEdge {
    pub(crate) fn new(a: NodeId, b: NodeId, weight: EdgeWeight) -> Result<Self, TopologyError> {
        if a == b {
            return Err(TopologyError::SelfLoop(a));
        }

        Ok(Self {
            endpoints: [a, b],
            weight,
        })
    }

    /// The two endpoints in creation order.
    #[must_use]
    pub const fn endpoints(&self) -> [NodeId; 2] {
        self.endpoints
    }

    /// Traversal cost of the edge.
    #[must_use]
    pub const fn weight(&self) -> EdgeWeight {
        self.weight
    }

    /// Reports whether the edge joins `a` and `b`, in either direction.
    #[must_use]
    pub fn connects(&self, a: NodeId, b: NodeId) -> bool {
        let [first, second] = self.endpoints;
        (first == a && second == b) || (first == b && second == a)
    }

    /// Returns whichever endpoint is not `node`.
    ///
    /// Asking from a node the edge does not touch is a caller bug; it is
    /// logged and yields `None`.
    #[must_use]
    pub fn opposite(&self, node: NodeId) -> Option<NodeId> {
        let [first, second] = self.endpoints;
        if node == first {
            Some(second)
        } else if node == second {
            Some(first)
        } else {
            error!(?node, endpoints = ?self.endpoints, "node is not an endpoint of this edge");
            None
        }
    }
}
