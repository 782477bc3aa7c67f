use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Default number of (step, total) samples kept
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// One point of the total-vehicle time series
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistorySample {
    pub step: u64,
    pub total: usize,
}

/// Bounded FIFO of history samples; the oldest sample is evicted on overflow
#[derive(Clone, Debug)]
pub struct History {
    samples: VecDeque<HistorySample>,
    capacity: usize,
}

impl History {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, sample: HistorySample) {
        while self.samples.len() >= self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn latest(&self) -> Option<HistorySample> {
        self.samples.back().copied()
    }

    pub fn to_vec(&self) -> Vec<HistorySample> {
        self.samples.iter().copied().collect()
    }
}

/// Authoritative controller-side aggregate.
///
/// The step counter only moves forward, and only through [`advance_step`].
///
/// [`advance_step`]: AggregateState::advance_step
#[derive(Clone, Debug)]
pub struct AggregateState {
    step: u64,
    active: bool,
    history: History,
}

impl AggregateState {
    pub fn new(history_capacity: usize) -> Self {
        Self {
            step: 0,
            active: false,
            history: History::new(history_capacity),
        }
    }

    pub fn step(&self) -> u64 {
        self.step
    }

    /// Increment and return the global step counter
    pub fn advance_step(&mut self) -> u64 {
        self.step += 1;
        self.step
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn record_total(&mut self, step: u64, total: usize) {
        self.history.push(HistorySample { step, total });
    }

    pub fn history(&self) -> &History {
        &self.history
    }
}

impl Default for AggregateState {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}
