//! Per-task notification memory.
//!
//! Remembers, for each task id, the last due slot a notification was sent
//! for. For a fixed id and slot a notification is allowed at most once until
//! the entry is forgotten or the slot changes.

use crate::scheduler::due::DueSlot;
use chrono::{DateTime, FixedOffset, Utc};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Map of task id to last notified slot.
#[derive(Debug, Clone, Default)]
pub struct NotificationDedup {
    notified: HashMap<String, DueSlot>,
}

impl NotificationDedup {
    /// Empty memory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a notification for `slot` is still owed.
    ///
    /// When the due instant is still in the future and a *different* slot
    /// is remembered, the task was rescheduled forward before its old slot
    /// fired; the stale entry is dropped first.
    pub fn should_notify(
        &mut self,
        task_id: &str,
        slot: &DueSlot,
        due_instant: DateTime<FixedOffset>,
        now: DateTime<Utc>,
    ) -> bool {
        self.discard_if_rescheduled(task_id, slot, due_instant, now);
        self.notified.get(task_id) != Some(slot)
    }

    /// Drop a remembered slot that no longer matches a future schedule.
    /// Returns `true` when an entry was dropped.
    pub fn discard_if_rescheduled(
        &mut self,
        task_id: &str,
        slot: &DueSlot,
        due_instant: DateTime<FixedOffset>,
        now: DateTime<Utc>,
    ) -> bool {
        if due_instant <= now {
            return false;
        }
        match self.notified.get(task_id) {
            Some(remembered) if remembered != slot => {
                debug!(task_id, old = %remembered, new = %slot, "task rescheduled, clearing notification memory");
                self.notified.remove(task_id);
                true
            }
            _ => false,
        }
    }

    /// Remember that `slot` was notified for `task_id`.
    pub fn record_notified(&mut self, task_id: &str, slot: DueSlot) {
        self.notified.insert(task_id.to_owned(), slot);
    }

    /// Forget a task. Returns `true` when an entry existed.
    pub fn forget(&mut self, task_id: &str) -> bool {
        self.notified.remove(task_id).is_some()
    }

    /// Forget every task not in `present`; returns the forgotten ids.
    pub fn retain_present(&mut self, present: &HashSet<&str>) -> Vec<String> {
        let stale: Vec<String> = self
            .notified
            .keys()
            .filter(|id| !present.contains(id.as_str()))
            .cloned()
            .collect();
        for id in &stale {
            self.notified.remove(id);
        }
        stale
    }

    /// Last slot notified for `task_id`.
    pub fn last_notified(&self, task_id: &str) -> Option<&DueSlot> {
        self.notified.get(task_id)
    }

    /// Number of remembered tasks.
    pub fn len(&self) -> usize {
        self.notified.len()
    }

    /// Whether nothing is remembered.
    pub fn is_empty(&self) -> bool {
        self.notified.is_empty()
    }
}
