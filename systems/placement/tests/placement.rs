use grid_defence_core::{CellCoord, Command, Event, PlacementError, TowerId};
use grid_defence_system_placement::{Placement, PlacementInput, PlacementPreview};
use grid_defence_world::{self as world, query, LevelLayout, World};

fn confirm_at(cell: CellCoord) -> PlacementInput {
    PlacementInput {
        confirm_action: true,
        cursor_cell: Some(cell),
        ..PlacementInput::default()
    }
}

#[test]
fn confirm_emits_place_command_on_buildable_cell() {
    let mut placement = Placement::new();
    let mut commands = Vec::new();

    placement.handle(
        &[],
        confirm_at(CellCoord::new(2, 2)),
        |_| true,
        |_| None,
        &mut commands,
    );

    assert_eq!(
        commands,
        vec![Command::PlaceTower {
            cell: CellCoord::new(2, 2)
        }],
        "placement should emit a command when confirming a buildable cell",
    );
}

#[test]
fn confirm_ignored_on_unbuildable_cell() {
    let mut placement = Placement::new();
    let mut commands = Vec::new();

    placement.handle(
        &[],
        confirm_at(CellCoord::new(2, 2)),
        |_| false,
        |_| None,
        &mut commands,
    );

    assert!(commands.is_empty(), "unbuildable cell must not emit commands");
}

#[test]
fn confirm_without_cursor_emits_nothing() {
    let mut placement = Placement::new();
    let mut commands = Vec::new();

    placement.handle(
        &[],
        PlacementInput::new(true, true, None),
        |_| true,
        |_| Some(TowerId::new(1)),
        &mut commands,
    );

    assert!(commands.is_empty());
}

#[test]
fn remove_emits_command_for_hovered_tower() {
    let mut placement = Placement::new();
    let mut commands = Vec::new();
    let hovered = CellCoord::new(4, 1);

    placement.handle(
        &[],
        PlacementInput::new(false, true, Some(hovered)),
        |_| true,
        |cell| (cell == hovered).then_some(TowerId::new(3)),
        &mut commands,
    );

    assert_eq!(
        commands,
        vec![Command::RemoveTower {
            tower: TowerId::new(3)
        }]
    );
}

#[test]
fn preview_reflects_buildability() {
    let placement = Placement::new();
    let input = PlacementInput::new(false, false, Some(CellCoord::new(1, 1)));

    assert_eq!(
        placement.preview(input, |_| false),
        Some(PlacementPreview::new(CellCoord::new(1, 1), false))
    );
    assert_eq!(placement.preview(PlacementInput::default(), |_| true), None);
}

#[test]
fn rejections_are_remembered_until_next_placement() {
    let mut placement = Placement::new();
    let mut commands = Vec::new();
    let cell = CellCoord::new(0, 0);

    placement.handle(
        &[Event::TowerPlacementRejected {
            cell,
            reason: PlacementError::Occupied,
        }],
        PlacementInput::default(),
        |_| true,
        |_| None,
        &mut commands,
    );
    assert_eq!(
        placement.last_rejection(),
        Some((cell, PlacementError::Occupied))
    );

    placement.handle(
        &[Event::TowerPlaced {
            tower: TowerId::new(0),
            cell,
        }],
        PlacementInput::default(),
        |_| true,
        |_| None,
        &mut commands,
    );
    assert_eq!(placement.last_rejection(), None);
}

#[test]
fn placement_round_trip_through_world() {
    let layout = LevelLayout::from_toml_str(r#"map = ["S.#", "..G"]"#).expect("valid layout");
    let mut world = World::from_layout(&layout).expect("valid world");
    let mut placement = Placement::new();
    let cell = CellCoord::new(1, 0);
    let mut commands = Vec::new();
    let mut events = Vec::new();

    placement.handle(
        &[],
        confirm_at(cell),
        |cell| query::is_buildable(&world, cell),
        |cell| query::tower_at(&world, cell),
        &mut commands,
    );
    for command in commands.drain(..) {
        world::apply(&mut world, command, &mut events);
    }
    assert!(query::tower_at(&world, cell).is_some());
    assert!(!query::is_buildable(&world, cell));

    placement.handle(
        &events,
        PlacementInput::new(false, true, Some(cell)),
        |cell| query::is_buildable(&world, cell),
        |cell| query::tower_at(&world, cell),
        &mut commands,
    );
    events.clear();
    for command in commands.drain(..) {
        world::apply(&mut world, command, &mut events);
    }

    assert!(query::tower_at(&world, cell).is_none());
    assert!(query::is_buildable(&world, cell));
    assert!(events.contains(&Event::PathsInvalidated));
}
