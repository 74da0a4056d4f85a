//! Composition root wiring the world, pools and systems together.

use std::{collections::BTreeMap, time::Duration};

use anyhow::{Context, Result};
use glam::Vec3;
use grid_defence_core::{CellCoord, Command, Event, TowerId};
use grid_defence_entities::{
    Enemy, EnemyDefinition, EnemyPool, EnemySpawn, ProjectilePool, Turret, TurretDefinition,
    TurretPool, TurretSpawn,
};
use grid_defence_pool::{Pool, PoolKey};
use grid_defence_system_movement::{Movement, MovementOutcome};
use grid_defence_system_placement::{Placement, PlacementInput};
use grid_defence_system_spawning::Spawning;
use grid_defence_world::{self as world, query, World};
use tracing::{debug, warn};

use crate::scenario::Scenario;

/// Running totals reported at the end of a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SimulationStats {
    /// Ticks simulated.
    pub ticks: u64,
    /// Enemies that entered the level.
    pub spawned: u32,
    /// Enemies that reached a goal.
    pub arrived: u32,
    /// Path requests that found no reachable goal.
    pub stranded: u32,
    /// Projectiles fired by turrets.
    pub shots: u32,
    /// Projectiles returned to their pool.
    pub projectiles_expired: u32,
    /// Tower placements the world refused.
    pub rejected_placements: u32,
}

/// Headless tower-defence simulation.
#[derive(Debug)]
pub struct Simulation {
    world: World,
    enemies: EnemyPool,
    turrets: TurretPool,
    projectiles: ProjectilePool,
    placement: Placement,
    spawning: Spawning,
    movement: Movement,
    turret_by_tower: BTreeMap<TowerId, PoolKey>,
    enemy_definition: EnemyDefinition,
    turret_definition: TurretDefinition,
    pending: Vec<Command>,
    stats: SimulationStats,
}

impl Simulation {
    /// Builds the world and pools described by `scenario`.
    pub fn new(scenario: &Scenario) -> Result<Self> {
        let world = World::from_layout(&scenario.level).context("failed to build level")?;

        let mut enemies = Pool::new(Enemy::default);
        enemies.initialize(scenario.pool_size);
        let mut turrets = Pool::new(Turret::default);
        turrets.initialize(scenario.pool_size);

        let mut simulation = Self {
            world,
            enemies,
            turrets,
            projectiles: ProjectilePool::new(scenario.pool_size),
            placement: Placement::new(),
            spawning: Spawning::new(scenario.spawning.config()),
            movement: Movement::default(),
            turret_by_tower: BTreeMap::new(),
            enemy_definition: scenario.enemy,
            turret_definition: scenario.turret,
            pending: Vec::new(),
            stats: SimulationStats::default(),
        };
        for cell in scenario.tower_cells() {
            let _ = simulation.request_tower(cell);
        }
        Ok(simulation)
    }

    /// Queues a tower placement on `cell` for the next tick.
    ///
    /// Returns `false` when the cell is not buildable and nothing was queued.
    pub fn request_tower(&mut self, cell: CellCoord) -> bool {
        let world = &self.world;
        let queued = self.pending.len();
        self.placement.handle(
            &[],
            PlacementInput::new(true, false, Some(cell)),
            |cell| query::is_buildable(world, cell),
            |cell| query::tower_at(world, cell),
            &mut self.pending,
        );
        let accepted = self.pending.len() > queued;
        if !accepted {
            warn!(%cell, "tower request ignored, cell is not buildable");
        }
        accepted
    }

    /// Queues removal of the tower standing on `cell` for the next tick.
    pub fn request_removal(&mut self, cell: CellCoord) {
        let world = &self.world;
        self.placement.handle(
            &[],
            PlacementInput::new(false, true, Some(cell)),
            |cell| query::is_buildable(world, cell),
            |cell| query::tower_at(world, cell),
            &mut self.pending,
        );
    }

    /// Advances the simulation by `dt`.
    pub fn step(&mut self, dt: Duration) {
        let mut commands = std::mem::take(&mut self.pending);
        commands.push(Command::Tick { dt });
        let mut events = self.apply_all(commands);

        let mut spawn_commands = Vec::new();
        self.spawning.handle(
            &events,
            query::enemy_spawn_coords(&self.world),
            &mut spawn_commands,
        );
        events.extend(self.apply_all(spawn_commands));

        let world = &self.world;
        let mut ignored = Vec::new();
        self.placement.handle(
            &events,
            PlacementInput::default(),
            |cell| query::is_buildable(world, cell),
            |cell| query::tower_at(world, cell),
            &mut ignored,
        );

        let mut outcomes = Vec::new();
        self.movement.handle(
            &events,
            query::grid(&self.world),
            &mut self.enemies,
            &mut outcomes,
        );
        self.resolve_movement(outcomes);

        self.fire_turrets(dt);
        let expired = self.projectiles.tick(dt);
        self.stats.projectiles_expired = self
            .stats
            .projectiles_expired
            .saturating_add(expired as u32);
        self.stats.ticks += 1;
    }

    /// Running totals.
    #[must_use]
    pub fn stats(&self) -> SimulationStats {
        self.stats
    }

    /// Authoritative world state.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Enemy pool.
    #[must_use]
    pub fn enemies(&self) -> &EnemyPool {
        &self.enemies
    }

    /// Turret pool.
    #[must_use]
    pub fn turrets(&self) -> &TurretPool {
        &self.turrets
    }

    /// Turret mounted on `tower`, if any.
    #[must_use]
    pub fn turret_for(&self, tower: TowerId) -> Option<PoolKey> {
        self.turret_by_tower.get(&tower).copied()
    }

    fn apply_all(&mut self, commands: Vec<Command>) -> Vec<Event> {
        let mut events = Vec::new();
        for command in commands {
            world::apply(&mut self.world, command, &mut events);
        }
        for event in &events {
            self.route(event);
        }
        events
    }

    fn route(&mut self, event: &Event) {
        match *event {
            Event::TowerPlaced { tower, cell } => {
                let position = query::grid(&self.world).grid_to_world(cell);
                let turret = self.turrets.spawn(&TurretSpawn {
                    tower,
                    cell,
                    position,
                    definition: self.turret_definition,
                });
                let _ = self.turret_by_tower.insert(tower, turret);
                debug!(%cell, tower = tower.get(), "turret mounted");
            }
            Event::TowerRemoved { tower, cell } => {
                if let Some(turret) = self.turret_by_tower.remove(&tower) {
                    if let Err(error) = self.turrets.despawn(turret) {
                        warn!(%cell, %error, "failed to return turret to its pool");
                    }
                }
            }
            Event::TowerPlacementRejected { cell, reason } => {
                warn!(%cell, ?reason, "tower placement rejected");
                self.stats.rejected_placements += 1;
            }
            Event::EnemySpawnApproved { position, .. } => {
                let _ = self.enemies.spawn(&EnemySpawn {
                    position,
                    definition: self.enemy_definition,
                });
                self.stats.spawned += 1;
            }
            _ => {}
        }
    }

    fn resolve_movement(&mut self, outcomes: Vec<MovementOutcome>) {
        let mut tracking = Vec::new();
        for outcome in outcomes {
            match outcome {
                MovementOutcome::Moved { from, to, .. } => {
                    tracking.push(Command::TrackEnemy { from, to });
                }
                MovementOutcome::ReachedGoal { enemy, cell } => {
                    match self.enemies.despawn(enemy) {
                        Ok(()) => {
                            self.stats.arrived += 1;
                            tracking.push(Command::TrackEnemy {
                                from: cell,
                                to: None,
                            });
                        }
                        Err(error) => warn!(%error, "arrived enemy was already despawned"),
                    }
                }
                MovementOutcome::Stranded { .. } => self.stats.stranded += 1,
            }
        }
        let _ = self.apply_all(tracking);
    }

    fn fire_turrets(&mut self, dt: Duration) {
        let targets: Vec<Vec3> = self
            .enemies
            .iter_active()
            .map(|(_, enemy)| enemy.position())
            .collect();

        for key in self.turrets.active_keys() {
            let Some(turret) = self.turrets.get_mut(key) else {
                continue;
            };
            if let Some(shot) = turret.tick(dt, targets.iter().copied()) {
                let _ = self.projectiles.fire(&shot);
                self.stats.shots += 1;
            }
        }
    }
}
