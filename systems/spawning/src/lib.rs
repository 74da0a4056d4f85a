#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic spawning system responsible for emitting enemy spawn commands.

use std::time::Duration;

use grid_defence_core::{CellCoord, Command, Event};

const RNG_MULTIPLIER: u64 = 6_364_136_223_846_793_005;
const RNG_INCREMENT: u64 = 1;

/// Configuration parameters required to construct the spawning system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    spawn_interval: Duration,
    rng_seed: u64,
    budget: Option<u32>,
}

impl Config {
    /// Creates a new configuration using the provided spawn cadence and seed.
    #[must_use]
    pub const fn new(spawn_interval: Duration, rng_seed: u64) -> Self {
        Self {
            spawn_interval,
            rng_seed,
            budget: None,
        }
    }

    /// Caps the total number of spawn commands the system emits.
    #[must_use]
    pub const fn with_budget(mut self, budget: u32) -> Self {
        self.budget = Some(budget);
        self
    }
}

/// Pure system that deterministically emits spawn commands.
#[derive(Debug)]
pub struct Spawning {
    spawn_interval: Duration,
    accumulator: Duration,
    rng_state: u64,
    remaining: Option<u32>,
    emitted: u32,
}

impl Spawning {
    /// Creates a new spawning system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            spawn_interval: config.spawn_interval,
            accumulator: Duration::ZERO,
            rng_state: config.rng_seed,
            remaining: config.budget,
            emitted: 0,
        }
    }

    /// Number of spawn commands emitted so far.
    #[must_use]
    pub fn emitted(&self) -> u32 {
        self.emitted
    }

    /// Reports whether the spawn budget is used up.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.remaining == Some(0)
    }

    /// Consumes events and the world's spawn cells to emit spawn commands.
    pub fn handle(&mut self, events: &[Event], spawners: &[CellCoord], out: &mut Vec<Command>) {
        if self.spawn_interval.is_zero() || spawners.is_empty() || self.is_exhausted() {
            return;
        }

        let mut accumulated = Duration::ZERO;
        for event in events {
            if let Event::TimeAdvanced { dt } = event {
                accumulated = accumulated.saturating_add(*dt);
            }
        }

        if accumulated.is_zero() {
            return;
        }

        self.accumulator = self.accumulator.saturating_add(accumulated);
        let spawn_attempts = self.resolve_spawn_attempts();

        for _ in 0..spawn_attempts {
            if !self.consume_budget() {
                self.accumulator = Duration::ZERO;
                break;
            }
            let spawner = self.select_spawner(spawners);
            out.push(Command::SpawnEnemy { spawner });
            self.emitted = self.emitted.saturating_add(1);
        }
    }

    fn resolve_spawn_attempts(&mut self) -> usize {
        if self.spawn_interval.is_zero() {
            return 0;
        }

        let mut attempts = 0;
        while self.accumulator >= self.spawn_interval {
            self.accumulator -= self.spawn_interval;
            attempts += 1;
        }
        attempts
    }

    fn consume_budget(&mut self) -> bool {
        match &mut self.remaining {
            None => true,
            Some(0) => false,
            Some(remaining) => {
                *remaining -= 1;
                true
            }
        }
    }

    fn select_spawner(&mut self, spawners: &[CellCoord]) -> CellCoord {
        debug_assert!(!spawners.is_empty(), "select_spawner requires spawners");
        let value = self.advance_rng();
        let index = (value % spawners.len() as u64) as usize;
        spawners[index]
    }

    fn advance_rng(&mut self) -> u64 {
        self.rng_state = self
            .rng_state
            .wrapping_mul(RNG_MULTIPLIER)
            .wrapping_add(RNG_INCREMENT);
        self.rng_state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_spawn_attempts_without_interval() {
        let mut spawning = Spawning::new(Config::new(Duration::ZERO, 1));
        spawning.accumulator = Duration::from_secs(10);
        assert_eq!(spawning.resolve_spawn_attempts(), 0);
    }

    #[test]
    fn budget_counts_down_to_zero() {
        let mut spawning = Spawning::new(Config::new(Duration::from_secs(1), 1).with_budget(2));
        assert!(spawning.consume_budget());
        assert!(spawning.consume_budget());
        assert!(!spawning.consume_budget());
        assert!(spawning.is_exhausted());
    }
}
