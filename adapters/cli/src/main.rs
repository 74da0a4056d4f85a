#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a Grid Defence scenario headlessly.

use std::{path::PathBuf, str::FromStr, time::Duration};

use anyhow::{bail, Context, Result};
use clap::Parser;
use grid_defence_cli::{Scenario, Simulation};
use grid_defence_core::CellCoord;
use grid_defence_world::query;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Command-line options for a headless run.
#[derive(Debug, Parser)]
#[command(name = "grid-defence", about = "Runs a Grid Defence scenario headlessly")]
struct Args {
    /// Scenario TOML file describing the level.
    #[arg(long)]
    level: PathBuf,
    /// Number of ticks to simulate.
    #[arg(long, default_value_t = 600)]
    ticks: u64,
    /// Simulated milliseconds per tick.
    #[arg(long, default_value_t = 16)]
    tick_ms: u64,
    /// Overrides the scenario's spawn interval.
    #[arg(long)]
    spawn_interval_ms: Option<u64>,
    /// Overrides the scenario's spawn seed.
    #[arg(long)]
    seed: Option<u64>,
    /// Overrides the scenario's pool size.
    #[arg(long)]
    pool_size: Option<usize>,
    /// Places a tower before the first tick; repeatable.
    #[arg(long = "tower", value_name = "X,Z")]
    towers: Vec<TowerArg>,
}

#[derive(Clone, Copy, Debug)]
struct TowerArg(CellCoord);

impl FromStr for TowerArg {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        let Some((x, z)) = value.split_once(',') else {
            bail!("expected `x,z`, got `{value}`");
        };
        let x = x.trim().parse().with_context(|| format!("invalid x in `{value}`"))?;
        let z = z.trim().parse().with_context(|| format!("invalid z in `{value}`"))?;
        Ok(Self(CellCoord::new(x, z)))
    }
}

/// Entry point for the Grid Defence command-line interface.
fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();
    let mut scenario = Scenario::load(&args.level)?;
    if let Some(interval_ms) = args.spawn_interval_ms {
        scenario.spawning.interval_ms = interval_ms;
    }
    if let Some(seed) = args.seed {
        scenario.spawning.seed = seed;
    }
    if let Some(pool_size) = args.pool_size {
        scenario.pool_size = pool_size;
    }

    let mut simulation = Simulation::new(&scenario)?;
    for TowerArg(cell) in &args.towers {
        let _ = simulation.request_tower(*cell);
    }

    let dt = Duration::from_millis(args.tick_ms);
    for _ in 0..args.ticks {
        simulation.step(dt);
    }

    let stats = simulation.stats();
    info!(
        ticks = stats.ticks,
        spawned = stats.spawned,
        arrived = stats.arrived,
        stranded = stats.stranded,
        shots = stats.shots,
        towers = query::towers(simulation.world()).len(),
        enemies_in_pool = simulation.enemies().len(),
        "simulation finished"
    );
    Ok(())
}
