#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pooled simulation entities.
//!
//! Enemies, turrets and projectiles are recycled through
//! [`grid_defence_pool::Pool`]. Each type is spawned from a context value
//! carrying its position and authoring definition.

mod enemy;
mod projectile;
mod turret;

pub use enemy::{Enemy, EnemyDefinition, EnemySpawn};
pub use projectile::{Projectile, ProjectileDefinition, ProjectilePool, ProjectileSpawn};
pub use turret::{Turret, TurretDefinition, TurretSpawn};

use grid_defence_pool::Pool;

/// Pool of enemies.
pub type EnemyPool = Pool<Enemy>;

/// Pool of turrets.
pub type TurretPool = Pool<Turret>;
