use std::time::Duration;

use grid_defence_core::{CellCoord, Command, Event, NodeState};
use grid_defence_entities::{Enemy, EnemyDefinition, EnemyPool, EnemySpawn};
use grid_defence_pool::{Pool, PoolKey};
use grid_defence_system_movement::{Movement, MovementOutcome};
use grid_defence_world::{self as world, query, LevelLayout, World};

fn world_from(map: &str) -> World {
    let layout = LevelLayout::from_toml_str(map).expect("valid layout");
    World::from_layout(&layout).expect("valid world")
}

fn spawn_enemy(world: &World, enemies: &mut EnemyPool, cell: CellCoord) -> PoolKey {
    enemies.spawn(&EnemySpawn {
        position: query::grid(world).grid_to_world(cell),
        definition: EnemyDefinition {
            speed: 2.0,
            repath_cooldown_ms: 250,
        },
    })
}

fn tick(world: &mut World, dt: Duration) -> Vec<Event> {
    let mut events = Vec::new();
    world::apply(world, Command::Tick { dt }, &mut events);
    events
}

#[test]
fn enemy_walks_corridor_to_goal() {
    let mut world = world_from(r#"map = ["S___G"]"#);
    let mut enemies: EnemyPool = Pool::new(Enemy::default);
    enemies.initialize(4);
    let enemy = spawn_enemy(&world, &mut enemies, CellCoord::new(0, 0));
    let mut movement = Movement::default();
    let mut outcomes = Vec::new();

    let events = tick(&mut world, Duration::from_secs(1));
    movement.handle(&events, query::grid(&world), &mut enemies, &mut outcomes);
    assert_eq!(
        outcomes,
        vec![MovementOutcome::Moved {
            enemy,
            from: None,
            to: Some(CellCoord::new(2, 0)),
        }],
        "enemy should cover two cells in one second",
    );

    outcomes.clear();
    let events = tick(&mut world, Duration::from_secs(1));
    movement.handle(&events, query::grid(&world), &mut enemies, &mut outcomes);
    assert_eq!(
        outcomes,
        vec![
            MovementOutcome::Moved {
                enemy,
                from: Some(CellCoord::new(2, 0)),
                to: Some(CellCoord::new(4, 0)),
            },
            MovementOutcome::ReachedGoal {
                enemy,
                cell: Some(CellCoord::new(4, 0)),
            },
        ]
    );
}

#[test]
fn enemy_without_route_is_stranded() {
    let mut world = world_from(r#"map = ["S#G"]"#);
    let mut enemies: EnemyPool = Pool::new(Enemy::default);
    let enemy = spawn_enemy(&world, &mut enemies, CellCoord::new(0, 0));
    let mut movement = Movement::default();
    let mut outcomes = Vec::new();

    let events = tick(&mut world, Duration::from_millis(100));
    movement.handle(&events, query::grid(&world), &mut enemies, &mut outcomes);

    assert_eq!(outcomes, vec![MovementOutcome::Stranded { enemy }]);
    let stranded = enemies.get(enemy).expect("still active");
    assert!(stranded.path().is_empty());
    let spawn = query::grid(&world).grid_to_world(CellCoord::new(0, 0));
    assert_eq!(stranded.position(), spawn);
}

#[test]
fn stranded_enemy_retries_after_cooldown() {
    let mut world = world_from(r#"map = ["S#G", "___"]"#);
    let mut enemies: EnemyPool = Pool::new(Enemy::default);
    let enemy = spawn_enemy(&world, &mut enemies, CellCoord::new(0, 0));
    let mut movement = Movement::default();
    let mut outcomes = Vec::new();

    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::SetCellState {
            cell: CellCoord::new(0, 1),
            flag: NodeState::WALKABLE,
            value: false,
        },
        &mut events,
    );
    events.extend(tick(&mut world, Duration::from_millis(100)));
    movement.handle(&events, query::grid(&world), &mut enemies, &mut outcomes);
    assert!(matches!(outcomes[..], [MovementOutcome::Stranded { .. }]));

    events.clear();
    world::apply(
        &mut world,
        Command::SetCellState {
            cell: CellCoord::new(0, 1),
            flag: NodeState::WALKABLE,
            value: true,
        },
        &mut events,
    );
    outcomes.clear();
    events.extend(tick(&mut world, Duration::from_millis(100)));
    movement.handle(&events, query::grid(&world), &mut enemies, &mut outcomes);
    assert!(
        enemies.get(enemy).is_some_and(|enemy| enemy.path().is_empty()),
        "cooldown still running",
    );

    outcomes.clear();
    let events = tick(&mut world, Duration::from_millis(200));
    movement.handle(&events, query::grid(&world), &mut enemies, &mut outcomes);
    assert!(
        !outcomes
            .iter()
            .any(|outcome| matches!(outcome, MovementOutcome::Stranded { .. })),
        "route exists once the cell reopens",
    );
    assert!(enemies
        .get(enemy)
        .is_some_and(|enemy| !enemy.path().is_empty()));
}

#[test]
fn placed_tower_triggers_detour() {
    let mut world = world_from(r#"map = ["S...G", "....."]"#);
    let mut enemies: EnemyPool = Pool::new(Enemy::default);
    let enemy = spawn_enemy(&world, &mut enemies, CellCoord::new(0, 0));
    let mut movement = Movement::default();
    let mut outcomes = Vec::new();

    let events = tick(&mut world, Duration::from_millis(500));
    movement.handle(&events, query::grid(&world), &mut enemies, &mut outcomes);
    let blocked = query::grid(&world).grid_to_world(CellCoord::new(3, 0));
    assert!(enemies
        .get(enemy)
        .is_some_and(|enemy| enemy.path().contains(&blocked)));

    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::PlaceTower {
            cell: CellCoord::new(3, 0),
        },
        &mut events,
    );
    assert!(events.contains(&Event::PathsInvalidated));
    events.extend(tick(&mut world, Duration::from_millis(500)));
    movement.handle(&events, query::grid(&world), &mut enemies, &mut outcomes);

    let rerouted = enemies.get(enemy).expect("still active");
    assert!(!rerouted.path().is_empty());
    assert!(!rerouted.path().contains(&blocked));
    assert_eq!(
        rerouted.path().last(),
        Some(&query::grid(&world).grid_to_world(CellCoord::new(4, 0)))
    );
}

#[test]
fn events_without_time_do_not_move_enemies() {
    let world = world_from(r#"map = ["S___G"]"#);
    let mut enemies: EnemyPool = Pool::new(Enemy::default);
    let enemy = spawn_enemy(&world, &mut enemies, CellCoord::new(0, 0));
    let mut movement = Movement::default();
    let mut outcomes = Vec::new();

    movement.handle(
        &[Event::PathsInvalidated],
        query::grid(&world),
        &mut enemies,
        &mut outcomes,
    );

    assert!(outcomes.is_empty());
    assert!(enemies.get(enemy).is_some_and(Enemy::needs_path));
}
