//! Single-source shortest-path search over the grid's weighted edges.

use glam::Vec3;
use grid_defence_core::{CellCoord, NodeId, NodeState};
use thiserror::Error;
use tracing::{debug, error};

use crate::{
    grid::Grid,
    node::GridNode,
    priority_queue::{PriorityQueue, QueueError},
};

const UNREACHED: u32 = u32::MAX;
/// Largest distance that still orders correctly inside a frontier key.
const KEYED_DISTANCE_LIMIT: u32 = i32::MAX as u32;

/// Failures that abort a path search before it starts.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum PathError {
    /// The start node does not exist in the grid.
    #[error("start node {0:?} does not exist")]
    UnknownStart(NodeId),
    /// The frontier queue rejected an operation.
    #[error("frontier queue failed: {0}")]
    Frontier(#[from] QueueError),
}

/// Distance and predecessor tables produced by an exhaustive search.
///
/// A single table answers path queries to any node from the same start, so
/// callers routing several consumers from one spawn cell can share it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DijkstraInfo {
    start: NodeId,
    distances: Vec<u32>,
    predecessors: Vec<Option<NodeId>>,
}

impl DijkstraInfo {
    fn unreached(start: NodeId, node_count: usize) -> Self {
        Self {
            start,
            distances: vec![UNREACHED; node_count],
            predecessors: vec![None; node_count],
        }
    }

    /// Node the search started from.
    #[must_use]
    pub const fn start(&self) -> NodeId {
        self.start
    }

    /// Shortest known distance from the start to `node`.
    #[must_use]
    pub fn distance(&self, node: NodeId) -> Option<u32> {
        self.distances
            .get(node.index())
            .copied()
            .filter(|distance| *distance != UNREACHED)
    }

    /// Reports whether `node` can be reached from the start.
    #[must_use]
    pub fn is_reachable(&self, node: NodeId) -> bool {
        self.distance(node).is_some()
    }

    /// Node preceding `node` on its shortest path.
    #[must_use]
    pub fn predecessor(&self, node: NodeId) -> Option<NodeId> {
        self.predecessors.get(node.index()).copied().flatten()
    }

    /// Nodes from the start to `target` in travel order; empty when unreachable.
    #[must_use]
    pub fn path_to(&self, target: NodeId) -> Vec<NodeId> {
        if !self.is_reachable(target) {
            return Vec::new();
        }

        let mut path = vec![target];
        let mut current = target;
        while current != self.start {
            let Some(previous) = self.predecessor(current) else {
                return Vec::new();
            };
            path.push(previous);
            current = previous;
        }
        path.reverse();
        path
    }

    /// Reachable goal node with the smallest distance; lowest index wins ties.
    #[must_use]
    pub fn closest_goal(&self, grid: &Grid) -> Option<NodeId> {
        grid.nodes()
            .iter()
            .filter(|node| node.is(NodeState::IS_ENEMY_GOAL))
            .filter_map(|node| self.distance(node.id()).map(|distance| (distance, node.id())))
            .min()
            .map(|(_, id)| id)
    }
}

impl Grid {
    /// Runs the search from `start` to exhaustion.
    pub fn dijkstra(&self, start: NodeId) -> Result<DijkstraInfo, PathError> {
        self.search(start, false).map(|(info, _)| info)
    }

    /// Nodes on the shortest path from `start` to the nearest reachable goal.
    ///
    /// The search stops as soon as the first goal node is settled. An empty
    /// vector means no goal is reachable, which is an ordinary outcome.
    pub fn shortest_path_to_closest_goal(&self, start: NodeId) -> Result<Vec<NodeId>, PathError> {
        let (info, goal) = self.search(start, true)?;
        Ok(goal.map(|goal| info.path_to(goal)).unwrap_or_default())
    }

    /// Fills `out` with the world positions of the path from the node nearest
    /// to `position` to the closest reachable goal.
    ///
    /// `out` is cleared first and left empty when no goal is reachable; the
    /// return value reports whether a path was produced.
    pub fn try_build_path_to_closest_goal(&self, position: Vec3, out: &mut Vec<Vec3>) -> bool {
        out.clear();

        let Some(start) = self.nearest_node(position) else {
            return false;
        };

        match self.shortest_path_to_closest_goal(start) {
            Ok(path) => {
                out.extend(
                    path.iter()
                        .filter_map(|id| self.node_by_id(*id))
                        .map(GridNode::position),
                );
                debug!(?start, waypoints = out.len(), "built path to closest goal");
                !out.is_empty()
            }
            Err(reason) => {
                error!(?start, %reason, "path search failed");
                false
            }
        }
    }

    /// Sum of edge weights along `path`, or `None` if two consecutive nodes
    /// are not connected.
    #[must_use]
    pub fn path_cost(&self, path: &[NodeId]) -> Option<u32> {
        path.windows(2).try_fold(0_u32, |total, pair| {
            let edge = self.edge(self.edge_between(pair[0], pair[1])?)?;
            Some(total.saturating_add(edge.weight().get()))
        })
    }

    fn search(
        &self,
        start: NodeId,
        stop_at_goal: bool,
    ) -> Result<(DijkstraInfo, Option<NodeId>), PathError> {
        let node_count = self.node_count();
        if self.node_by_id(start).is_none() {
            error!(?start, node_count, "path search started outside the grid");
            return Err(PathError::UnknownStart(start));
        }

        let mut info = DijkstraInfo::unreached(start, node_count);
        let mut settled = vec![false; node_count];
        let mut frontier = PriorityQueue::by_priority(node_count);

        info.distances[start.index()] = 0;
        frontier.enqueue_with_priority(start, frontier_key(0, start))?;

        while !frontier.is_empty() {
            let current = frontier.dequeue_min()?;
            settled[current.index()] = true;

            if stop_at_goal && self.nodes()[current.index()].is(NodeState::IS_ENEMY_GOAL) {
                return Ok((info, Some(current)));
            }

            let base = info.distances[current.index()];
            for (neighbor, weight) in self.neighbors(current) {
                if settled[neighbor.index()] || !self.can_traverse(current, neighbor) {
                    continue;
                }

                let candidate = base.saturating_add(weight.get());
                let previous = info.distances[neighbor.index()];
                if candidate >= previous {
                    continue;
                }

                info.distances[neighbor.index()] = candidate;
                info.predecessors[neighbor.index()] = Some(current);

                let key = frontier_key(candidate, neighbor);
                if previous == UNREACHED {
                    frontier.enqueue_with_priority(neighbor, key)?;
                } else {
                    let _ = frontier.decrease_priority(&neighbor, key)?;
                }
            }
        }

        Ok((info, None))
    }

    /// Only walkable nodes may be entered; diagonal steps additionally need
    /// both orthogonal cells walkable so paths never cut blocked corners.
    fn can_traverse(&self, from: NodeId, to: NodeId) -> bool {
        let (Some(from), Some(to)) = (self.node_by_id(from), self.node_by_id(to)) else {
            return false;
        };
        if !to.is(NodeState::WALKABLE) {
            return false;
        }

        let (a, b) = (from.cell(), to.cell());
        if a.x() == b.x() || a.z() == b.z() {
            return true;
        }

        let corner_one = CellCoord::new(a.x(), b.z());
        let corner_two = CellCoord::new(b.x(), a.z());
        self.is_walkable(corner_one) && self.is_walkable(corner_two)
    }
}

/// Orders the frontier by distance, then by node index.
fn frontier_key(distance: u32, node: NodeId) -> i64 {
    (i64::from(distance.min(KEYED_DISTANCE_LIMIT)) << 32) | i64::from(node.get())
}
