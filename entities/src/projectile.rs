//! Pooled projectiles and their self-despawning pool.

use std::time::Duration;

use glam::Vec3;
use grid_defence_pool::{
    DespawnHandle, DespawnTimers, Pool, PoolError, PoolKey, Poolable, SpawnWithContext,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Authoring data for a projectile kind.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileDefinition {
    /// Flight speed in world units per second.
    pub speed: f32,
    /// Time before the projectile returns to its pool, in milliseconds.
    pub lifetime_ms: u64,
}

impl Default for ProjectileDefinition {
    fn default() -> Self {
        Self {
            speed: 8.0,
            lifetime_ms: 1_000,
        }
    }
}

impl ProjectileDefinition {
    /// Lifetime as a duration.
    #[must_use]
    pub fn lifetime(&self) -> Duration {
        Duration::from_millis(self.lifetime_ms)
    }
}

/// Context applied when a projectile is fired.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectileSpawn {
    /// Muzzle position.
    pub position: Vec3,
    /// Direction of flight; normalised on spawn.
    pub direction: Vec3,
    /// Kind of projectile to fire.
    pub definition: ProjectileDefinition,
}

/// Projectile travelling in a straight line.
#[derive(Clone, Debug, Default)]
pub struct Projectile {
    handle: Option<DespawnHandle>,
    position: Vec3,
    velocity: Vec3,
    lifetime: Duration,
}

impl Projectile {
    /// Handle used to return the projectile to its pool.
    #[must_use]
    pub fn handle(&self) -> Option<DespawnHandle> {
        self.handle
    }

    /// Current world position.
    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Velocity in world units per second.
    #[must_use]
    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    /// Total lifetime the projectile was fired with.
    #[must_use]
    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    fn step(&mut self, dt: Duration) {
        self.position += self.velocity * dt.as_secs_f32();
    }
}

impl Poolable for Projectile {
    fn bind(&mut self, handle: DespawnHandle) {
        self.handle = Some(handle);
    }

    fn reset(&mut self) {
        self.position = Vec3::ZERO;
        self.velocity = Vec3::ZERO;
        self.lifetime = Duration::ZERO;
    }
}

impl SpawnWithContext for Projectile {
    type Context = ProjectileSpawn;

    fn apply_context(&mut self, context: &ProjectileSpawn) {
        self.position = context.position;
        self.velocity = context.direction.normalize_or_zero() * context.definition.speed;
        self.lifetime = context.definition.lifetime();
    }
}

/// Projectile pool that despawns projectiles once their lifetime elapses.
#[derive(Debug)]
pub struct ProjectilePool {
    pool: Pool<Projectile>,
    timers: DespawnTimers,
}

impl ProjectilePool {
    /// Creates a pool pre-populated with `size` projectiles.
    #[must_use]
    pub fn new(size: usize) -> Self {
        let mut pool = Pool::new(Projectile::default);
        pool.initialize(size);
        Self {
            pool,
            timers: DespawnTimers::new(),
        }
    }

    /// Spawns a projectile and schedules its automatic despawn.
    pub fn fire(&mut self, context: &ProjectileSpawn) -> PoolKey {
        let key = self.pool.spawn(context);
        self.timers.schedule(key, context.definition.lifetime());
        key
    }

    /// Moves every active projectile and despawns the expired ones.
    ///
    /// Returns the number of projectiles returned to the pool.
    pub fn tick(&mut self, dt: Duration) -> usize {
        for key in self.pool.active_keys() {
            if let Some(projectile) = self.pool.get_mut(key) {
                projectile.step(dt);
            }
        }

        let mut returned = 0;
        for key in self.timers.advance(dt) {
            match self.pool.despawn(key) {
                Ok(()) => returned += 1,
                Err(error) => warn!(%error, "projectile timer outlived its projectile"),
            }
        }
        returned
    }

    /// Returns a projectile early, for example on impact.
    pub fn despawn(&mut self, key: PoolKey) -> Result<(), PoolError> {
        let _ = self.timers.cancel(key);
        self.pool.despawn(key)
    }

    /// Projectile behind `key`, if it is current.
    #[must_use]
    pub fn get(&self, key: PoolKey) -> Option<&Projectile> {
        self.pool.get(key)
    }

    /// Active projectiles and their keys.
    pub fn iter_active(&self) -> impl Iterator<Item = (PoolKey, &Projectile)> + '_ {
        self.pool.iter_active()
    }

    /// Number of projectiles in flight.
    #[must_use]
    pub fn active_len(&self) -> usize {
        self.pool.active_len()
    }

    /// Number of projectiles the pool has created.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pool.len()
    }

    /// Reports whether the pool has created no projectiles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }
}
