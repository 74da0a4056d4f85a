use std::{path::Path, time::Duration};

use grid_defence_cli::{Scenario, Simulation};
use grid_defence_core::{CellCoord, NodeState, TowerId};
use grid_defence_world::query;

const TICK: Duration = Duration::from_millis(100);

fn corridor(extra: &str) -> Scenario {
    let source = format!(
        r#"
        pool_size = 2
        {extra}

        [level]
        map = ["S___G", "BBBBB"]

        [enemy]
        speed = 2.0

        [spawning]
        interval_ms = 500
        budget = 3
        "#
    );
    Scenario::from_toml_str(&source).expect("valid scenario")
}

fn run(simulation: &mut Simulation, ticks: usize) {
    for _ in 0..ticks {
        simulation.step(TICK);
    }
}

#[test]
fn enemies_walk_to_goal_and_return_to_pool() {
    let mut simulation = Simulation::new(&corridor("")).expect("valid simulation");

    run(&mut simulation, 50);

    let stats = simulation.stats();
    assert_eq!(stats.ticks, 50);
    assert_eq!(stats.spawned, 3);
    assert_eq!(stats.arrived, 3, "every enemy should reach the goal");
    assert_eq!(stats.stranded, 0);
    assert_eq!(simulation.enemies().active_len(), 0);
    assert_eq!(
        simulation.enemies().len(),
        3,
        "pool grows only to the peak number of concurrent enemies",
    );
    for x in 0..5 {
        let cell = CellCoord::new(x, 0);
        assert_eq!(query::enemy_count(simulation.world(), cell), 0);
        assert!(query::grid(simulation.world())
            .state(cell)
            .is_some_and(|state| !state.contains(NodeState::HAS_ENEMY)));
    }
}

#[test]
fn towers_mount_turrets_that_fire() {
    let mut scenario = corridor("towers = [[2, 1]]");
    scenario.turret.range = 1.5;
    let mut simulation = Simulation::new(&scenario).expect("valid simulation");

    run(&mut simulation, 1);
    let turret = simulation
        .turret_for(TowerId::new(0))
        .expect("turret mounted on the first tower");
    assert!(simulation.turrets().is_active(turret));

    run(&mut simulation, 40);
    assert!(simulation.stats().shots > 0, "turret should fire at passing enemies");
}

#[test]
fn removing_a_tower_returns_its_turret() {
    let mut simulation = Simulation::new(&corridor("towers = [[1, 1]]")).expect("valid simulation");
    run(&mut simulation, 1);
    let turret = simulation.turret_for(TowerId::new(0)).expect("mounted");

    simulation.request_removal(CellCoord::new(1, 1));
    run(&mut simulation, 1);

    assert_eq!(simulation.turret_for(TowerId::new(0)), None);
    assert!(!simulation.turrets().is_active(turret));
    assert_eq!(simulation.turrets().active_len(), 0);
    assert!(query::is_buildable(simulation.world(), CellCoord::new(1, 1)));
}

#[test]
fn duplicate_requests_in_one_tick_are_rejected_by_the_world() {
    let mut simulation = Simulation::new(&corridor("")).expect("valid simulation");

    simulation.request_tower(CellCoord::new(3, 1));
    simulation.request_tower(CellCoord::new(3, 1));
    run(&mut simulation, 1);

    assert_eq!(simulation.stats().rejected_placements, 1);
    assert_eq!(query::towers(simulation.world()).len(), 1);
}

#[test]
fn unbuildable_request_after_a_queued_one_is_reported() {
    let mut simulation = Simulation::new(&corridor("")).expect("valid simulation");

    assert!(simulation.request_tower(CellCoord::new(1, 1)));
    assert!(!simulation.request_tower(CellCoord::new(1, 0)));
    run(&mut simulation, 1);

    assert_eq!(
        query::towers(simulation.world()),
        vec![(TowerId::new(0), CellCoord::new(1, 1))]
    );
    assert_eq!(simulation.stats().rejected_placements, 0);
}

#[test]
fn blocking_tower_reroutes_enemies() {
    let source = r#"
        [level]
        map = ["S...G", "....."]

        [enemy]
        speed = 2.0
        repath_cooldown_ms = 100

        [spawning]
        interval_ms = 400
        budget = 4
    "#;
    let scenario = Scenario::from_toml_str(source).expect("valid scenario");
    let mut simulation = Simulation::new(&scenario).expect("valid simulation");

    run(&mut simulation, 6);
    simulation.request_tower(CellCoord::new(2, 0));
    run(&mut simulation, 60);

    let stats = simulation.stats();
    assert_eq!(query::towers(simulation.world()).len(), 1);
    assert_eq!(stats.spawned, 4);
    assert_eq!(stats.arrived, 4, "enemies should detour around the tower");
}

#[test]
fn bundled_level_runs() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../levels/switchback.toml");
    let scenario = Scenario::load(&path).expect("bundled scenario loads");
    let mut simulation = Simulation::new(&scenario).expect("valid simulation");

    run(&mut simulation, 200);

    let stats = simulation.stats();
    assert!(stats.spawned > 0);
    assert!(stats.arrived > 0);
    assert_eq!(stats.stranded, 0);
    assert_eq!(query::towers(simulation.world()).len(), 1);
}
