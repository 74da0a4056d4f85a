//! Scenario files bundling a level with entity and spawning settings.

use std::{fs, path::Path, time::Duration};

use anyhow::{Context, Result};
use grid_defence_core::CellCoord;
use grid_defence_entities::{EnemyDefinition, TurretDefinition};
use grid_defence_system_spawning::Config as SpawningConfig;
use grid_defence_world::LevelLayout;
use serde::{Deserialize, Serialize};

/// Spawn cadence settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnSettings {
    /// Time between two spawns, in milliseconds.
    pub interval_ms: u64,
    /// Seed for spawner selection.
    pub seed: u64,
    /// Total number of enemies to spawn; unlimited when absent.
    pub budget: Option<u32>,
}

impl Default for SpawnSettings {
    fn default() -> Self {
        Self {
            interval_ms: 1_000,
            seed: 0x4d59_5df4_d0f3_3173,
            budget: None,
        }
    }
}

impl SpawnSettings {
    /// Spawning system configuration derived from the settings.
    #[must_use]
    pub fn config(&self) -> SpawningConfig {
        let config = SpawningConfig::new(Duration::from_millis(self.interval_ms), self.seed);
        match self.budget {
            Some(budget) => config.with_budget(budget),
            None => config,
        }
    }
}

/// Complete description of a headless run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Level the run takes place on.
    pub level: LevelLayout,
    /// Enemy kind spawned by the level.
    #[serde(default)]
    pub enemy: EnemyDefinition,
    /// Turret kind mounted on every tower.
    #[serde(default)]
    pub turret: TurretDefinition,
    /// Spawn cadence.
    #[serde(default)]
    pub spawning: SpawnSettings,
    /// Instances pre-created per pool.
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
    /// Towers placed before the first tick, as `[x, z]` pairs.
    #[serde(default)]
    pub towers: Vec<[u32; 2]>,
}

fn default_pool_size() -> usize {
    16
}

impl Scenario {
    /// Parses a scenario from TOML source.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        toml::from_str(source).context("failed to parse scenario")
    }

    /// Reads and parses the scenario at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario at {}", path.display()))?;
        Self::from_toml_str(&contents)
            .with_context(|| format!("invalid scenario at {}", path.display()))
    }

    /// Towers placed before the first tick.
    pub fn tower_cells(&self) -> impl Iterator<Item = CellCoord> + '_ {
        self.towers.iter().map(|[x, z]| CellCoord::new(*x, *z))
    }
}
