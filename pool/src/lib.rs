#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Generic object pool for reusable simulation entities.
//!
//! A [`Pool`] owns every instance it ever creates. Instances wait in a FIFO
//! free queue until [`Pool::acquire`] hands one out; the caller activates it
//! and eventually returns it through [`Pool::despawn`]. The pool never
//! shrinks, so a fixed set of identities is reused indefinitely.
//!
//! Keys are generational: every despawn bumps the slot's generation, which
//! turns any key still held by a previous owner stale.

mod timers;

pub use timers::DespawnTimers;

use std::{any, collections::VecDeque, fmt};

use thiserror::Error;
use tracing::debug;

/// Handle to a pooled instance issued by [`Pool::acquire`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PoolKey {
    slot: u32,
    generation: u32,
}

impl PoolKey {
    /// Index of the storage slot that holds the instance.
    #[must_use]
    pub const fn slot(&self) -> u32 {
        self.slot
    }

    /// Incarnation of the slot this key was issued for.
    #[must_use]
    pub const fn generation(&self) -> u32 {
        self.generation
    }
}

/// Permanent back-reference from an instance to its slot in the owning pool.
///
/// Bound exactly once when the pool creates the instance. Unlike a
/// [`PoolKey`] it survives despawns, so an instance can always ask its pool
/// to return it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DespawnHandle {
    slot: u32,
}

impl DespawnHandle {
    /// Index of the storage slot bound to the instance.
    #[must_use]
    pub const fn slot(&self) -> u32 {
        self.slot
    }
}

/// Lifecycle state of a pooled instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lifecycle {
    /// The instance is hidden and ignored by the simulation.
    Inactive,
    /// The instance participates in the simulation.
    Active,
}

/// Errors reported by pool operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum PoolError {
    /// The key or handle names a slot the pool never created.
    #[error("pool has no slot {0}")]
    UnknownSlot(u32),
    /// The key belongs to an earlier incarnation of its slot.
    #[error("key for slot {slot} is stale (generation {held}, current {current})")]
    StaleKey {
        /// Slot the key points at.
        slot: u32,
        /// Generation recorded in the key.
        held: u32,
        /// Generation the slot is currently at.
        current: u32,
    },
    /// The instance already waits in the free queue.
    #[error("slot {0} was already returned to the pool")]
    AlreadyInactive(u32),
    /// The instance is already active.
    #[error("slot {0} is already active")]
    AlreadyActive(u32),
}

/// Lifecycle hooks every pooled type implements.
pub trait Poolable {
    /// Receives the instance's despawn handle. Called once, right after
    /// creation.
    fn bind(&mut self, handle: DespawnHandle);

    /// Restores the canonical inactive state.
    fn reset(&mut self);

    /// Runs after the instance transitions to [`Lifecycle::Active`].
    fn on_activated(&mut self) {}

    /// Runs before an active instance is returned to the pool.
    fn on_about_to_deactivate(&mut self) {}
}

/// Pooled types that are configured from a context value when spawned.
pub trait SpawnWithContext: Poolable {
    /// Data applied to a freshly activated instance.
    type Context;

    /// Configures the instance from `context`.
    fn apply_context(&mut self, context: &Self::Context);
}

struct Slot<T> {
    instance: T,
    lifecycle: Lifecycle,
    generation: u32,
    queued: bool,
}

/// Queue-backed pool of reusable instances.
pub struct Pool<T> {
    slots: Vec<Slot<T>>,
    free: VecDeque<u32>,
    factory: Box<dyn FnMut() -> T>,
    initialized: bool,
}

impl<T: Poolable> Pool<T> {
    /// Creates an empty pool that builds instances with `factory`.
    pub fn new(factory: impl FnMut() -> T + 'static) -> Self {
        Self {
            slots: Vec::new(),
            free: VecDeque::new(),
            factory: Box::new(factory),
            initialized: false,
        }
    }

    /// Pre-creates `max(1, size)` inactive instances.
    ///
    /// Only the first call has an effect.
    pub fn initialize(&mut self, size: usize) {
        if self.initialized {
            return;
        }
        self.initialized = true;

        let size = size.max(1);
        self.slots.reserve(size);
        for _ in 0..size {
            let _ = self.grow();
        }
        debug!(pool = any::type_name::<T>(), size, "pool initialized");
    }

    /// Reports whether [`Pool::initialize`] has run.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Takes the next instance out of the free queue.
    ///
    /// The pool grows by one instance when the queue is empty. The returned
    /// instance is still [`Lifecycle::Inactive`]; call [`Pool::activate`]
    /// before configuring it.
    pub fn acquire(&mut self) -> PoolKey {
        let slot = match self.free.pop_front() {
            Some(slot) => slot,
            None => {
                let slot = self.grow();
                debug!(
                    pool = any::type_name::<T>(),
                    size = self.slots.len(),
                    "pool grew on demand"
                );
                let _ = self.free.pop_back();
                slot
            }
        };

        let entry = &mut self.slots[slot as usize];
        entry.queued = false;
        PoolKey {
            slot,
            generation: entry.generation,
        }
    }

    /// Transitions an acquired instance to [`Lifecycle::Active`].
    pub fn activate(&mut self, key: PoolKey) -> Result<(), PoolError> {
        let entry = self.checked_out(key)?;
        if entry.lifecycle == Lifecycle::Active {
            return Err(PoolError::AlreadyActive(key.slot));
        }
        entry.lifecycle = Lifecycle::Active;
        entry.instance.on_activated();
        Ok(())
    }

    /// Returns an instance to the free queue.
    ///
    /// Active instances are told they are about to deactivate, then every
    /// instance is reset before it re-enters the queue. Despawning the same
    /// incarnation twice is rejected and leaves the queue untouched.
    pub fn despawn(&mut self, key: PoolKey) -> Result<(), PoolError> {
        let _ = self.checked_out(key)?;
        self.release(key.slot);
        Ok(())
    }

    /// Returns the instance bound to `handle`, whichever incarnation holds it.
    pub fn despawn_handle(&mut self, handle: DespawnHandle) -> Result<(), PoolError> {
        let entry = self
            .slots
            .get(handle.slot as usize)
            .ok_or(PoolError::UnknownSlot(handle.slot))?;
        if entry.queued {
            return Err(PoolError::AlreadyInactive(handle.slot));
        }
        self.release(handle.slot);
        Ok(())
    }

    /// Current key of the instance bound to `handle`, if it is checked out.
    #[must_use]
    pub fn key_for(&self, handle: DespawnHandle) -> Option<PoolKey> {
        let entry = self.slots.get(handle.slot as usize)?;
        (!entry.queued).then_some(PoolKey {
            slot: handle.slot,
            generation: entry.generation,
        })
    }

    /// Instance behind `key`, if the key is current.
    #[must_use]
    pub fn get(&self, key: PoolKey) -> Option<&T> {
        self.slots
            .get(key.slot as usize)
            .filter(|entry| entry.generation == key.generation)
            .map(|entry| &entry.instance)
    }

    /// Mutable instance behind `key`, if the key is current.
    pub fn get_mut(&mut self, key: PoolKey) -> Option<&mut T> {
        self.slots
            .get_mut(key.slot as usize)
            .filter(|entry| entry.generation == key.generation)
            .map(|entry| &mut entry.instance)
    }

    /// Reports whether `key` names a current, active instance.
    #[must_use]
    pub fn is_active(&self, key: PoolKey) -> bool {
        self.slots.get(key.slot as usize).is_some_and(|entry| {
            entry.generation == key.generation && entry.lifecycle == Lifecycle::Active
        })
    }

    /// Keys of all active instances in slot order.
    #[must_use]
    pub fn active_keys(&self) -> Vec<PoolKey> {
        self.iter_active().map(|(key, _)| key).collect()
    }

    /// Active instances and their keys in slot order.
    pub fn iter_active(&self) -> impl Iterator<Item = (PoolKey, &T)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.lifecycle == Lifecycle::Active)
            .map(|(slot, entry)| {
                (
                    PoolKey {
                        slot: slot as u32,
                        generation: entry.generation,
                    },
                    &entry.instance,
                )
            })
    }

    /// Number of instances the pool has ever created.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Reports whether the pool has created no instances yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of instances waiting in the free queue.
    #[must_use]
    pub fn free_len(&self) -> usize {
        self.free.len()
    }

    /// Number of active instances.
    #[must_use]
    pub fn active_len(&self) -> usize {
        self.slots
            .iter()
            .filter(|entry| entry.lifecycle == Lifecycle::Active)
            .count()
    }

    fn grow(&mut self) -> u32 {
        let slot = self.slots.len() as u32;
        let mut instance = (self.factory)();
        instance.bind(DespawnHandle { slot });
        instance.reset();
        self.slots.push(Slot {
            instance,
            lifecycle: Lifecycle::Inactive,
            generation: 0,
            queued: true,
        });
        self.free.push_back(slot);
        slot
    }

    fn checked_out(&mut self, key: PoolKey) -> Result<&mut Slot<T>, PoolError> {
        let entry = self
            .slots
            .get_mut(key.slot as usize)
            .ok_or(PoolError::UnknownSlot(key.slot))?;
        if entry.generation != key.generation {
            return Err(PoolError::StaleKey {
                slot: key.slot,
                held: key.generation,
                current: entry.generation,
            });
        }
        if entry.queued {
            return Err(PoolError::AlreadyInactive(key.slot));
        }
        Ok(entry)
    }

    fn release(&mut self, slot: u32) {
        let entry = &mut self.slots[slot as usize];
        if entry.lifecycle == Lifecycle::Active {
            entry.instance.on_about_to_deactivate();
        }
        entry.instance.reset();
        entry.lifecycle = Lifecycle::Inactive;
        entry.generation = entry.generation.wrapping_add(1);
        entry.queued = true;
        self.free.push_back(slot);
    }
}

impl<T: SpawnWithContext> Pool<T> {
    /// Acquires an instance, activates it, then applies `context`.
    pub fn spawn(&mut self, context: &T::Context) -> PoolKey {
        let key = self.acquire();
        let entry = &mut self.slots[key.slot as usize];
        entry.lifecycle = Lifecycle::Active;
        entry.instance.on_activated();
        entry.instance.apply_context(context);
        key
    }
}

impl<T> fmt::Debug for Pool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("type", &any::type_name::<T>())
            .field("len", &self.slots.len())
            .field("free", &self.free.len())
            .field("initialized", &self.initialized)
            .finish()
    }
}
