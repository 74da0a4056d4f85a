//! Tick-driven despawn timers.

use std::time::Duration;

use crate::PoolKey;

#[derive(Clone, Copy, Debug)]
struct Timer {
    key: PoolKey,
    remaining: Duration,
}

/// Countdown entries that return pooled instances after a fixed lifetime.
///
/// The owner advances the timers once per tick and despawns whatever expired.
#[derive(Clone, Debug, Default)]
pub struct DespawnTimers {
    entries: Vec<Timer>,
}

impl DespawnTimers {
    /// Creates an empty timer set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `key` to expire after `lifetime`, replacing an earlier entry.
    pub fn schedule(&mut self, key: PoolKey, lifetime: Duration) {
        let _ = self.cancel(key);
        self.entries.push(Timer {
            key,
            remaining: lifetime,
        });
    }

    /// Drops the timer for `key`. Returns whether one existed.
    pub fn cancel(&mut self, key: PoolKey) -> bool {
        let before = self.entries.len();
        self.entries.retain(|timer| timer.key != key);
        self.entries.len() != before
    }

    /// Advances every timer by `dt` and returns the expired keys in
    /// scheduling order.
    pub fn advance(&mut self, dt: Duration) -> Vec<PoolKey> {
        let mut expired = Vec::new();
        self.entries.retain_mut(|timer| {
            timer.remaining = timer.remaining.saturating_sub(dt);
            if timer.remaining.is_zero() {
                expired.push(timer.key);
                false
            } else {
                true
            }
        });
        expired
    }

    /// Time left before `key` expires.
    #[must_use]
    pub fn remaining(&self, key: PoolKey) -> Option<Duration> {
        self.entries
            .iter()
            .find(|timer| timer.key == key)
            .map(|timer| timer.remaining)
    }

    /// Number of pending timers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Reports whether no timers are pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(slot: u32) -> PoolKey {
        PoolKey {
            slot,
            generation: 0,
        }
    }

    #[test]
    fn expired_keys_follow_scheduling_order() {
        let mut timers = DespawnTimers::new();
        timers.schedule(key(2), Duration::from_millis(100));
        timers.schedule(key(0), Duration::from_millis(50));
        timers.schedule(key(1), Duration::from_millis(300));

        assert!(timers.advance(Duration::from_millis(40)).is_empty());
        assert_eq!(timers.advance(Duration::from_millis(60)), vec![key(2), key(0)]);
        assert_eq!(timers.len(), 1);
        assert_eq!(timers.remaining(key(1)), Some(Duration::from_millis(200)));
    }

    #[test]
    fn rescheduling_replaces_previous_entry() {
        let mut timers = DespawnTimers::new();
        timers.schedule(key(0), Duration::from_millis(10));
        timers.schedule(key(0), Duration::from_millis(500));

        assert!(timers.advance(Duration::from_millis(20)).is_empty());
        assert_eq!(timers.len(), 1);
    }

    #[test]
    fn cancelled_timers_never_fire() {
        let mut timers = DespawnTimers::new();
        timers.schedule(key(3), Duration::from_millis(10));

        assert!(timers.cancel(key(3)));
        assert!(!timers.cancel(key(3)));
        assert!(timers.advance(Duration::from_secs(1)).is_empty());
        assert!(timers.is_empty());
    }
}
