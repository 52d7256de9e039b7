use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::state::HistoryState;

/// Oldest-first run of captured states, bounded by `capacity`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryTimeline {
    capacity: usize,
    states: VecDeque<HistoryState>,
}

impl HistoryTimeline {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            states: VecDeque::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&HistoryState> {
        self.states.get(index)
    }

    pub fn latest(&self) -> Option<&HistoryState> {
        self.states.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryState> {
        self.states.iter()
    }

    /// Appends a state, evicting the oldest one once full.
    pub fn push(&mut self, state: HistoryState) -> Option<HistoryState> {
        let evicted = if self.states.len() >= self.capacity {
            self.states.pop_front()
        } else {
            None
        };
        self.states.push_back(state);
        evicted
    }

    /// Drops every state newer than `index`. Returns how many went.
    pub fn truncate_after(&mut self, index: usize) -> usize {
        let before = self.states.len();
        self.states.truncate(index + 1);
        before - self.states.len()
    }

    /// Drops `index` and everything older. Returns how many went.
    pub fn drain_through(&mut self, index: usize) -> usize {
        let end = (index + 1).min(self.states.len());
        self.states.drain(..end).count()
    }

    /// Shrinks or grows the bound, evicting the oldest states if needed.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        while self.states.len() > self.capacity {
            self.states.pop_front();
        }
    }
}
