//! Fixed-capacity binary min-heap with in-place priority decrease.
//!
//! The pathfinder relaxes tentative distances by lowering the priority of a
//! node that is already queued, so the heap exposes slot-level sifting instead
//! of relying on `std::collections::BinaryHeap`, which cannot reorder an
//! element after insertion.

use std::cmp::Ordering;

use thiserror::Error;

/// Ordering source selected when the queue is constructed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueueMode {
    /// Entries are ordered by the explicit priority given at enqueue time.
    ByPriority,
    /// Entries are ordered by the payload's own `Ord` implementation.
    ByValue,
}

/// Failures reported by [`PriorityQueue`] operations.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum QueueError {
    /// The queue already holds `capacity` entries.
    #[error("priority queue is full (capacity {capacity})")]
    Full {
        /// Fixed capacity of the queue.
        capacity: usize,
    },
    /// The queue holds no entries.
    #[error("priority queue is empty")]
    Empty,
    /// The operation does not apply to the queue's ordering mode.
    #[error("operation requires a queue ordered {expected:?}")]
    WrongMode {
        /// Mode the operation requires.
        expected: QueueMode,
    },
    /// The requested priority does not lower the current one.
    #[error("priority {requested} does not decrease current priority {current}")]
    PriorityNotDecreased {
        /// Priority currently stored for the entry.
        current: i64,
        /// Priority supplied by the caller.
        requested: i64,
    },
}

#[derive(Clone, Debug)]
struct Entry<T> {
    value: T,
    priority: i64,
}

/// Array-backed binary min-heap.
#[derive(Clone)]
pub struct PriorityQueue<T> {
    entries: Vec<Entry<T>>,
    capacity: usize,
    mode: QueueMode,
    compare: fn(&Entry<T>, &Entry<T>) -> Ordering,
}

impl<T> PriorityQueue<T> {
    /// Creates a queue ordered by explicit priorities.
    #[must_use]
    pub fn by_priority(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            capacity,
            mode: QueueMode::ByPriority,
            compare: compare_priorities::<T>,
        }
    }

    /// Ordering mode chosen at construction.
    #[must_use]
    pub const fn mode(&self) -> QueueMode {
        self.mode
    }

    /// Maximum number of entries the queue can hold.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of queued entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Reports whether the queue holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Minimum entry without removing it.
    #[must_use]
    pub fn peek(&self) -> Option<&T> {
        self.entries.first().map(|entry| &entry.value)
    }

    /// Drops every entry while keeping the allocation.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Inserts `value` ordered by `priority`.
    pub fn enqueue_with_priority(&mut self, value: T, priority: i64) -> Result<(), QueueError> {
        if self.mode != QueueMode::ByPriority {
            return Err(QueueError::WrongMode {
                expected: QueueMode::ByPriority,
            });
        }
        self.push(value, priority)
    }

    /// Removes and returns the minimum entry.
    pub fn dequeue_min(&mut self) -> Result<T, QueueError> {
        if self.entries.is_empty() {
            return Err(QueueError::Empty);
        }

        let last = self.entries.len() - 1;
        self.entries.swap(0, last);
        let entry = self.entries.pop().ok_or(QueueError::Empty)?;
        self.sift_down(0);
        Ok(entry.value)
    }

    fn push(&mut self, value: T, priority: i64) -> Result<(), QueueError> {
        if self.entries.len() >= self.capacity {
            return Err(QueueError::Full {
                capacity: self.capacity,
            });
        }

        self.entries.push(Entry { value, priority });
        self.sift_up(self.entries.len() - 1);
        Ok(())
    }

    fn less(&self, a: usize, b: usize) -> bool {
        (self.compare)(&self.entries[a], &self.entries[b]) == Ordering::Less
    }

    fn sift_up(&mut self, mut index: usize) {
        while index > 0 {
            let parent = (index - 1) / 2;
            if !self.less(index, parent) {
                break;
            }
            self.entries.swap(index, parent);
            index = parent;
        }
    }

    fn sift_down(&mut self, mut index: usize) {
        let len = self.entries.len();
        loop {
            let left = 2 * index + 1;
            let right = left + 1;
            let mut smallest = index;

            if left < len && self.less(left, smallest) {
                smallest = left;
            }
            if right < len && self.less(right, smallest) {
                smallest = right;
            }
            if smallest == index {
                break;
            }

            self.entries.swap(index, smallest);
            index = smallest;
        }
    }
}

impl<T: PartialEq> PriorityQueue<T> {
    /// Reports whether an entry equal to `target` is queued.
    #[must_use]
    pub fn contains(&self, target: &T) -> bool {
        self.entries.iter().any(|entry| entry.value == *target)
    }

    /// Lowers the priority of the first entry equal to `target`.
    ///
    /// Returns `Ok(false)` when no such entry is queued. A priority that is not
    /// strictly lower than the current one is rejected and leaves the heap
    /// untouched. Queues ordered by value report [`QueueError::WrongMode`].
    pub fn decrease_priority(&mut self, target: &T, priority: i64) -> Result<bool, QueueError> {
        if self.mode != QueueMode::ByPriority {
            return Err(QueueError::WrongMode {
                expected: QueueMode::ByPriority,
            });
        }

        let Some(index) = self.entries.iter().position(|entry| entry.value == *target) else {
            return Ok(false);
        };

        let current = self.entries[index].priority;
        if priority >= current {
            return Err(QueueError::PriorityNotDecreased {
                current,
                requested: priority,
            });
        }

        self.entries[index].priority = priority;
        self.sift_up(index);
        Ok(true)
    }
}

impl<T: Ord> PriorityQueue<T> {
    /// Creates a queue ordered by the payload's natural ordering.
    #[must_use]
    pub fn by_value(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            capacity,
            mode: QueueMode::ByValue,
            compare: compare_values::<T>,
        }
    }

    /// Inserts `value` ordered by its own `Ord` implementation.
    pub fn enqueue(&mut self, value: T) -> Result<(), QueueError> {
        if self.mode != QueueMode::ByValue {
            return Err(QueueError::WrongMode {
                expected: QueueMode::ByValue,
            });
        }
        self.push(value, 0)
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for PriorityQueue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PriorityQueue")
            .field("mode", &self.mode)
            .field("capacity", &self.capacity)
            .field("entries", &self.entries)
            .finish()
    }
}

fn compare_priorities<T>(a: &Entry<T>, b: &Entry<T>) -> Ordering {
    a.priority.cmp(&b.priority)
}

fn compare_values<T: Ord>(a: &Entry<T>, b: &Entry<T>) -> Ordering {
    a.value.cmp(&b.value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain<T>(queue: &mut PriorityQueue<T>) -> Vec<T> {
        let mut drained = Vec::new();
        while let Ok(value) = queue.dequeue_min() {
            drained.push(value);
        }
        drained
    }

    #[test]
    fn by_value_drains_in_sorted_order() {
        let mut queue = PriorityQueue::by_value(16);
        for value in [9, 3, 7, 1, 8, 2, 6, 4, 5, 0] {
            queue.enqueue(value).expect("within capacity");
        }

        assert_eq!(drain(&mut queue), (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn by_priority_ignores_payload_ordering() {
        let mut queue = PriorityQueue::by_priority(4);
        queue.enqueue_with_priority("far", 30).expect("room");
        queue.enqueue_with_priority("near", 10).expect("room");
        queue.enqueue_with_priority("middle", 20).expect("room");

        assert_eq!(queue.peek(), Some(&"near"));
        assert_eq!(drain(&mut queue), vec!["near", "middle", "far"]);
    }

    #[test]
    fn interleaved_operations_always_yield_minimum() {
        let mut queue = PriorityQueue::by_value(32);
        let mut mirror: Vec<u32> = Vec::new();
        let mut state: u32 = 0x9e37_79b9;

        for round in 0..200 {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            if round % 3 == 2 && !mirror.is_empty() {
                let expected = *mirror.iter().min().expect("non-empty");
                let popped = queue.dequeue_min().expect("non-empty queue");
                assert_eq!(popped, expected);
                let position = mirror.iter().position(|v| *v == expected).expect("present");
                let _ = mirror.swap_remove(position);
            } else if mirror.len() < queue.capacity() {
                let value = state % 1_000;
                queue.enqueue(value).expect("within capacity");
                mirror.push(value);
            }
        }

        mirror.sort_unstable();
        assert_eq!(drain(&mut queue), mirror);
    }

    #[test]
    fn enqueue_beyond_capacity_fails() {
        let mut queue = PriorityQueue::by_priority(1);
        queue.enqueue_with_priority('a', 1).expect("first fits");

        assert_eq!(
            queue.enqueue_with_priority('b', 0),
            Err(QueueError::Full { capacity: 1 })
        );
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn dequeue_on_empty_fails() {
        let mut queue: PriorityQueue<u8> = PriorityQueue::by_value(2);
        assert_eq!(queue.dequeue_min(), Err(QueueError::Empty));
        assert!(queue.peek().is_none());
    }

    #[test]
    fn enqueue_rejects_wrong_mode() {
        let mut by_value = PriorityQueue::by_value(2);
        assert_eq!(
            by_value.enqueue_with_priority(1_u8, 5),
            Err(QueueError::WrongMode {
                expected: QueueMode::ByPriority
            })
        );

        let mut by_priority = PriorityQueue::by_priority(2);
        assert_eq!(
            by_priority.enqueue(1_u8),
            Err(QueueError::WrongMode {
                expected: QueueMode::ByValue
            })
        );
    }

    #[test]
    fn decrease_priority_requires_priority_mode() {
        let mut queue = PriorityQueue::by_value(2);
        queue.enqueue(4_u8).expect("room");

        assert_eq!(
            queue.decrease_priority(&4, 1),
            Err(QueueError::WrongMode {
                expected: QueueMode::ByPriority
            })
        );
        assert_eq!(queue.peek(), Some(&4));
    }

    #[test]
    fn decrease_priority_moves_entry_to_front() {
        let mut queue = PriorityQueue::by_priority(8);
        for (value, priority) in [('a', 5), ('b', 6), ('c', 7), ('d', 8)] {
            queue.enqueue_with_priority(value, priority).expect("room");
        }

        assert_eq!(queue.decrease_priority(&'d', 1), Ok(true));

        assert_eq!(drain(&mut queue), vec!['d', 'a', 'b', 'c']);
    }

    #[test]
    fn decrease_priority_rejects_equal_or_higher_values() {
        let mut queue = PriorityQueue::by_priority(4);
        queue.enqueue_with_priority('a', 2).expect("room");
        queue.enqueue_with_priority('b', 3).expect("room");

        assert_eq!(
            queue.decrease_priority(&'b', 3),
            Err(QueueError::PriorityNotDecreased {
                current: 3,
                requested: 3
            })
        );
        assert_eq!(
            queue.decrease_priority(&'b', 9),
            Err(QueueError::PriorityNotDecreased {
                current: 3,
                requested: 9
            })
        );
        assert_eq!(drain(&mut queue), vec!['a', 'b']);
    }

    #[test]
    fn decrease_priority_reports_missing_target() {
        let mut queue = PriorityQueue::by_priority(2);
        queue.enqueue_with_priority(10_u32, 1).expect("room");

        assert_eq!(queue.decrease_priority(&11, 0), Ok(false));
        assert!(queue.contains(&10));
        assert!(!queue.contains(&11));
    }

    #[test]
    fn decrease_priority_uses_payload_equality() {
        #[derive(Debug)]
        struct Tagged {
            key: u32,
            label: &'static str,
        }

        impl PartialEq for Tagged {
            fn eq(&self, other: &Self) -> bool {
                self.key == other.key
            }
        }

        let mut queue = PriorityQueue::by_priority(4);
        queue
            .enqueue_with_priority(Tagged { key: 1, label: "one" }, 10)
            .expect("room");
        queue
            .enqueue_with_priority(Tagged { key: 2, label: "two" }, 5)
            .expect("room");

        let lookup = Tagged {
            key: 1,
            label: "lookup",
        };
        assert_eq!(queue.decrease_priority(&lookup, 1), Ok(true));
        assert_eq!(queue.dequeue_min().map(|t| t.label), Ok("one"));
    }
}
