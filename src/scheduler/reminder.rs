//! Reminder state: which tasks are due right now and which one is shown.
//!
//! Phases are recomputed every tick from the minute distance between the
//! task's due slot and the current slot, so a delayed tick still lands in the
//! right phase.

use crate::scheduler::due::DueSlot;
use crate::scheduler::tasks::Task;
use std::collections::HashSet;
use tracing::debug;

/// Where a task sits relative to its due slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderPhase {
    /// Due slot is still ahead.
    Scheduled,
    /// Due slot is the current minute.
    Due,
    /// Past due but inside the grace window.
    Cooling,
    /// Grace window elapsed; eligible for pruning.
    Expired,
}

impl ReminderPhase {
    /// Classify a task due at `due` when the clock reads `now`.
    pub fn classify(due: &DueSlot, now: &DueSlot, grace_minutes: i64) -> Self {
        let past_due = now.minutes_since(due);
        if past_due < 0 {
            Self::Scheduled
        } else if past_due == 0 {
            Self::Due
        } else if past_due < grace_minutes {
            Self::Cooling
        } else {
            Self::Expired
        }
    }
}

/// Tracks the set of currently due tasks plus the highlighted and dialog
/// references derived from it.
///
/// Several tasks may be due in the same minute. The most recently entered
/// one becomes active; when it leaves, the previous still-due task takes
/// over. A dismissed dialog stays closed for as long as its task is due.
#[derive(Debug, Clone, Default)]
pub struct ReminderTracker {
    due: Vec<Task>,
    active_task_id: Option<String>,
    due_task: Option<Task>,
    dismissed: HashSet<String>,
}

impl ReminderTracker {
    /// Empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Id of the highlighted task.
    pub fn active_task_id(&self) -> Option<&str> {
        self.active_task_id.as_deref()
    }

    /// Task driving the reminder dialog.
    pub fn due_task(&self) -> Option<&Task> {
        self.due_task.as_ref()
    }

    /// Ids of every task currently in its due minute, oldest entry first.
    pub fn due_ids(&self) -> impl Iterator<Item = &str> {
        self.due.iter().map(|task| task.id.as_str())
    }

    /// Whether `task_id` is currently due.
    pub fn is_due(&self, task_id: &str) -> bool {
        self.due.iter().any(|task| task.id == task_id)
    }

    /// Whether nothing is due.
    pub fn is_empty(&self) -> bool {
        self.due.is_empty()
    }

    /// Mark `task` as due. A task entering the set becomes the active one;
    /// a task already in the set only has its stored copy refreshed.
    ///
    /// Returns `true` when the task newly entered.
    pub fn enter_due(&mut self, task: &Task) -> bool {
        if let Some(existing) = self.due.iter_mut().find(|t| t.id == task.id) {
            *existing = task.clone();
            if let Some(shown) = self.due_task.as_mut().filter(|t| t.id == task.id) {
                *shown = task.clone();
            }
            return false;
        }

        debug!(task_id = %task.id, "task entered due window");
        self.dismissed.remove(&task.id);
        self.due.push(task.clone());
        self.active_task_id = Some(task.id.clone());
        self.due_task = Some(task.clone());
        true
    }

    /// Close the dialog for `task_id` and keep the highlight.
    /// Returns `true` when the dialog was showing that task.
    pub fn dismiss(&mut self, task_id: &str) -> bool {
        if self.due_task.as_ref().is_some_and(|t| t.id == task_id) {
            self.due_task = None;
            self.dismissed.insert(task_id.to_owned());
            return true;
        }
        false
    }

    /// Stop tracking `task_id`. Returns `true` when it was tracked.
    pub fn clear(&mut self, task_id: &str) -> bool {
        let before = self.due.len();
        self.due.retain(|task| task.id != task_id);
        let was_due = self.due.len() != before;
        self.dismissed.remove(task_id);

        if self.due_task.as_ref().is_some_and(|t| t.id == task_id) {
            self.due_task = None;
        }
        if self.active_task_id.as_deref() == Some(task_id) {
            self.active_task_id = None;
            self.due_task = None;
            if let Some(next) = self.due.last() {
                self.active_task_id = Some(next.id.clone());
                if !self.dismissed.contains(&next.id) {
                    self.due_task = Some(next.clone());
                }
            }
        }

        if was_due {
            debug!(task_id, "task left due window");
        }
        was_due
    }

    /// Stop tracking every task not in `present`; returns the cleared ids.
    pub fn retain_present(&mut self, present: &HashSet<&str>) -> Vec<String> {
        let stale: Vec<String> = self
            .due
            .iter()
            .filter(|task| !present.contains(task.id.as_str()))
            .map(|task| task.id.clone())
            .collect();
        for id in &stale {
            self.clear(id);
        }
        stale
    }
}
