//! Timer Queue
//!
//! Per-key expiry timers kept in a single deadline-ordered queue. Each key
//! owns at most one live handle; re-arming a key cancels its previous timer
//! so a stale deadline can never fire.

use std::collections::{BTreeMap, HashMap};

/// Identifies one armed timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerHandle {
    pub id: u64,
    pub deadline: u64,
}

#[derive(Debug, Default)]
pub struct TimerQueue {
    handles: HashMap<String, TimerHandle>,
    queue: BTreeMap<(u64, u64), String>,
    next_id: u64,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms a timer for `key`, replacing any timer it already had.
    pub fn arm(&mut self, key: &str, deadline: u64) -> TimerHandle {
        self.cancel(key);

        let handle = TimerHandle {
            id: self.next_id,
            deadline,
        };
        self.next_id += 1;
        self.queue.insert((deadline, handle.id), key.to_string());
        self.handles.insert(key.to_string(), handle);
        handle
    }

    /// Cancels the timer for `key`. Returns false if none was armed.
    pub fn cancel(&mut self, key: &str) -> bool {
        match self.handles.remove(key) {
            Some(handle) => {
                self.queue.remove(&(handle.deadline, handle.id));
                true
            }
            None => false,
        }
    }

    pub fn cancel_all(&mut self) {
        self.handles.clear();
        self.queue.clear();
    }

    pub fn handle(&self, key: &str) -> Option<TimerHandle> {
        self.handles.get(key).copied()
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.queue.keys().next().map(|(deadline, _)| *deadline)
    }

    /// Removes and returns the keys of every timer due at `now`.
    pub fn pop_due(&mut self, now: u64) -> Vec<String> {
        let mut due = Vec::new();
        while let Some(entry) = self.queue.first_entry() {
            if entry.key().0 > now {
                break;
            }
            let key = entry.remove();
            self.handles.remove(&key);
            due.push(key);
        }
        due
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
