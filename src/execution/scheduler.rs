//! Execution scheduler - decides which eligible instances fill free slots

/// Slot policy for a bounded pool of concurrent job instances
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionScheduler {
    capacity: usize,
}

impl Default for ExecutionScheduler {
    fn default() -> Self {
        Self::new(1)
    }
}

impl ExecutionScheduler {
    /// Create a scheduler with `capacity` slots (at least one)
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Free slots given the number of in-flight instances
    pub fn available_slots(&self, running: usize) -> usize {
        self.capacity.saturating_sub(running)
    }

    /// Pick the next instances to dispatch
    ///
    /// `eligible` is in enumeration order; earlier instances win ties.
    pub fn next_instances(&self, eligible: &[usize], running: usize) -> Vec<usize> {
        eligible
            .iter()
            .copied()
            .take(self.available_slots(running))
            .collect()
    }
}
