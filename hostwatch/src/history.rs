//! Bounded most-recent-first buffer backing the log view.

use std::collections::VecDeque;

use crate::model::LogEntry;

pub const LOG_CAPACITY: usize = 10;

pub fn push_front_capped<T>(dq: &mut VecDeque<T>, v: T, cap: usize) {
    if cap == 0 {
        return;
    }
    while dq.len() >= cap {
        dq.pop_back();
    }
    dq.push_front(v);
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogBuffer {
    entries: VecDeque<LogEntry>,
    cap: usize,
}

impl LogBuffer {
    pub fn new(cap: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(cap),
            cap,
        }
    }

    // Newest first; the oldest entry falls off once full
    pub fn push(&mut self, entry: LogEntry) {
        push_front_capped(&mut self.entries, entry, self.cap);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.cap
    }

    pub fn latest(&self) -> Option<&LogEntry> {
        self.entries.front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new(LOG_CAPACITY)
    }
}
