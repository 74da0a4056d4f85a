#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure placement system responsible for emitting tower placement and removal commands.

use grid_defence_core::{CellCoord, Command, Event, PlacementError, TowerId};

/// Placement preview for the hovered cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlacementPreview {
    /// Cell the tower would occupy.
    pub cell: CellCoord,
    /// Indicates whether a tower may be placed on the cell.
    pub placeable: bool,
}

impl PlacementPreview {
    /// Creates a new placement preview descriptor.
    #[must_use]
    pub const fn new(cell: CellCoord, placeable: bool) -> Self {
        Self { cell, placeable }
    }
}

/// Input snapshot distilled from adapter-provided frame input data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlacementInput {
    /// Indicates whether the player confirmed a placement on this frame.
    pub confirm_action: bool,
    /// Indicates whether the player requested tower removal on this frame.
    pub remove_action: bool,
    /// Cell currently hovered by the cursor.
    pub cursor_cell: Option<CellCoord>,
}

impl PlacementInput {
    /// Creates a new input descriptor with explicit field values.
    #[must_use]
    pub const fn new(
        confirm_action: bool,
        remove_action: bool,
        cursor_cell: Option<CellCoord>,
    ) -> Self {
        Self {
            confirm_action,
            remove_action,
            cursor_cell,
        }
    }
}

/// System that translates cursor input into placement commands.
#[derive(Debug, Clone, Default)]
pub struct Placement {
    last_rejection: Option<(CellCoord, PlacementError)>,
}

impl Placement {
    /// Creates a new placement system instance.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            last_rejection: None,
        }
    }

    /// Builds the preview for the hovered cell.
    ///
    /// The `is_buildable` closure should mirror the world's
    /// `query::is_buildable` helper.
    pub fn preview<F>(&self, input: PlacementInput, mut is_buildable: F) -> Option<PlacementPreview>
    where
        F: FnMut(CellCoord) -> bool,
    {
        let cell = input.cursor_cell?;
        Some(PlacementPreview::new(cell, is_buildable(cell)))
    }

    /// Most recent placement rejection reported by the world.
    #[must_use]
    pub fn last_rejection(&self) -> Option<(CellCoord, PlacementError)> {
        self.last_rejection
    }

    /// Consumes world events and adapter-derived input to emit placement commands.
    ///
    /// The closures should mirror the semantics of the world's
    /// `query::is_buildable` and `query::tower_at` helpers.
    pub fn handle<B, T>(
        &mut self,
        events: &[Event],
        input: PlacementInput,
        is_buildable: B,
        mut tower_at: T,
        out: &mut Vec<Command>,
    ) where
        B: FnMut(CellCoord) -> bool,
        T: FnMut(CellCoord) -> Option<TowerId>,
    {
        for event in events {
            match event {
                Event::TowerPlacementRejected { cell, reason } => {
                    self.last_rejection = Some((*cell, *reason));
                }
                Event::TowerPlaced { .. } => self.last_rejection = None,
                _ => {}
            }
        }

        if input.confirm_action {
            if let Some(preview) = self.preview(input, is_buildable) {
                if preview.placeable {
                    out.push(Command::PlaceTower { cell: preview.cell });
                }
            }
        }

        if input.remove_action {
            if let Some(tower) = input.cursor_cell.and_then(&mut tower_at) {
                out.push(Command::RemoveTower { tower });
            }
        }
    }
}
