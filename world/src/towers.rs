//! Authoritative tower state management utilities.

use std::collections::BTreeMap;

use grid_defence_core::{CellCoord, NodeState, TowerId};

/// Snapshot of a tower stored inside the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct TowerState {
    /// Identifier allocated by the world for the tower.
    pub(crate) id: TowerId,
    /// Cell occupied by the tower.
    pub(crate) cell: CellCoord,
    /// Flags the tower cleared from its cell and restores on removal.
    pub(crate) displaced: NodeState,
}

/// Registry that stores towers and manages identifier allocation.
#[derive(Debug)]
pub(crate) struct TowerRegistry {
    entries: BTreeMap<TowerId, TowerState>,
    next_tower_id: TowerId,
}

impl TowerRegistry {
    /// Creates an empty tower registry with a reset identifier counter.
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_tower_id: TowerId::new(0),
        }
    }

    /// Stores a new tower and returns its identifier.
    pub(crate) fn insert(&mut self, cell: CellCoord, displaced: NodeState) -> TowerId {
        let id = self.next_tower_id;
        self.next_tower_id = TowerId::new(id.get().saturating_add(1));
        let _ = self.entries.insert(
            id,
            TowerState {
                id,
                cell,
                displaced,
            },
        );
        id
    }

    /// Removes the tower with the provided identifier.
    pub(crate) fn remove(&mut self, id: TowerId) -> Option<TowerState> {
        self.entries.remove(&id)
    }

    /// Tower standing on `cell`, if any.
    pub(crate) fn at(&self, cell: CellCoord) -> Option<TowerId> {
        self.entries
            .values()
            .find(|tower| tower.cell == cell)
            .map(|tower| tower.id)
    }

    /// Towers in identifier order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &TowerState> {
        self.entries.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_allocates_sequential_identifiers() {
        let mut registry = TowerRegistry::new();
        let first = registry.insert(CellCoord::new(0, 0), NodeState::BUILDABLE);
        let second = registry.insert(CellCoord::new(1, 0), NodeState::BUILDABLE);

        assert_eq!(first, TowerId::new(0));
        assert_eq!(second, TowerId::new(1));
        assert_eq!(registry.at(CellCoord::new(1, 0)), Some(second));
    }

    #[test]
    fn removal_returns_displaced_flags() {
        let mut registry = TowerRegistry::new();
        let displaced = NodeState::WALKABLE | NodeState::BUILDABLE;
        let id = registry.insert(CellCoord::new(2, 3), displaced);

        let removed = registry.remove(id).expect("tower exists");

        assert_eq!(removed.displaced, displaced);
        assert!(registry.remove(id).is_none());
        assert!(registry.at(CellCoord::new(2, 3)).is_none());
        assert_eq!(registry.iter().count(), 0);
    }
}
