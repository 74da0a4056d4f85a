#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless adapter that runs Grid Defence scenarios.
//!
//! The [`Simulation`] is the composition root: it owns the world, the entity
//! pools and every system, and routes world events between them each tick.

mod scenario;
mod simulation;

pub use scenario::{Scenario, SpawnSettings};
pub use simulation::{Simulation, SimulationStats};
