//! Bounded FIFO replay buffer for relay events.

use std::collections::VecDeque;

use taskrelay_proto::RelayEvent;

/// Replay depth for newly connected clients.
pub const DEFAULT_REPLAY_CAPACITY: usize = 50;

/// Holds the most recent broadcast events, oldest first.
///
/// Pushing past capacity evicts the oldest entry. Events are never
/// removed on replay; the buffer only shrinks by eviction.
#[derive(Debug)]
pub struct ReplayBuffer {
    events: VecDeque<RelayEvent>,
    capacity: usize,
}

impl ReplayBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append an event, evicting the oldest when full.
    pub fn push(&mut self, event: RelayEvent) {
        if self.capacity == 0 {
            return;
        }
        if self.events.len() == self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    /// Iterate buffered events in broadcast order.
    pub fn iter(&self) -> impl Iterator<Item = &RelayEvent> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for ReplayBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_REPLAY_CAPACITY)
    }
}
