use std::collections::VecDeque;

use crate::types::Liquidation;

/// Fixed-capacity, most-recent-first store of decoded liquidations.
///
/// Arrival order is authoritative: retained elements keep insertion order
/// even when exchange timestamps arrive out of order. The buffer survives
/// reconnects and is reset only when the whole pipeline is restarted.
#[derive(Debug)]
pub struct RingBuffer {
    events: VecDeque<Liquidation>,
    capacity: usize,
}

impl RingBuffer {
    /// `capacity` must already be validated (`StreamConfig::validate`).
    pub fn new(capacity: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Prepend `event`; evict from the tail until the bound holds.
    pub fn insert(&mut self, event: Liquidation) {
        self.events.push_front(event);
        while self.events.len() > self.capacity {
            self.events.pop_back();
        }
    }

    /// Most-recent-first view. Index 0 is always the latest insertion.
    pub fn snapshot(&self) -> Vec<Liquidation> {
        self.events.iter().cloned().collect()
    }
}
