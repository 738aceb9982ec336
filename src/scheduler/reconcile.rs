//! Dropping engine memory for tasks that left the task list.

use crate::scheduler::dedup::NotificationDedup;
use crate::scheduler::pruner::PruneLedger;
use crate::scheduler::reminder::ReminderTracker;
use crate::scheduler::tasks::Task;
use std::collections::HashSet;
use tracing::debug;

/// What a reconciliation pass removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Ids whose notification memory was dropped.
    pub forgotten: Vec<String>,
    /// Ids that were due and are no longer tracked.
    pub cleared: Vec<String>,
    /// Ids whose prune request was settled by their disappearance.
    pub settled: Vec<String>,
}

impl ReconcileReport {
    /// Whether nothing changed.
    pub fn is_empty(&self) -> bool {
        self.forgotten.is_empty() && self.cleared.is_empty() && self.settled.is_empty()
    }
}

/// Drop every per-task entry whose id is not in `tasks`.
pub fn reconcile(
    tasks: &[Task],
    dedup: &mut NotificationDedup,
    tracker: &mut ReminderTracker,
    ledger: &mut PruneLedger,
) -> ReconcileReport {
    let present: HashSet<&str> = tasks.iter().map(|task| task.id.as_str()).collect();
    let report = ReconcileReport {
        forgotten: dedup.retain_present(&present),
        cleared: tracker.retain_present(&present),
        settled: ledger.retain_present(&present),
    };
    if !report.is_empty() {
        debug!(
            forgotten = report.forgotten.len(),
            cleared = report.cleared.len(),
            settled = report.settled.len(),
            "reconciled engine state with task list"
        );
    }
    report
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::scheduler::due::DueTimeResolver;

    #[test]
    fn removes_state_for_missing_tasks_only() {
        let slot = DueTimeResolver::utc().resolve("2024-01-01 09:00").unwrap().slot;
        let t1 = Task::new("t1", "one", "2024-01-01 09:00");
        let t2 = Task::new("t2", "two", "2024-01-01 09:00");

        let mut dedup = NotificationDedup::new();
        let mut tracker = ReminderTracker::new();
        let mut ledger = PruneLedger::new();
        dedup.record_notified("t1", slot);
        dedup.record_notified("t2", slot);
        tracker.enter_due(&t1);
        tracker.enter_due(&t2);
        ledger.record_once("t3");

        let report = reconcile(&[t1], &mut dedup, &mut tracker, &mut ledger);

        assert_eq!(report.forgotten, vec!["t2".to_owned()]);
        assert_eq!(report.cleared, vec!["t2".to_owned()]);
        assert_eq!(report.settled, vec!["t3".to_owned()]);
        assert_eq!(tracker.active_task_id(), Some("t1"));
        assert!(dedup.last_notified("t1").is_some());
        assert!(ledger.is_empty());
    }

    #[test]
    fn same_snapshot_twice_changes_nothing() {
        let t1 = Task::new("t1", "one", "2024-01-01 09:00");
        let mut dedup = NotificationDedup::new();
        let mut tracker = ReminderTracker::new();
        let mut ledger = PruneLedger::new();
        tracker.enter_due(&t1);

        let tasks = vec![t1];
        assert!(reconcile(&tasks, &mut dedup, &mut tracker, &mut ledger).is_empty());
        assert!(reconcile(&tasks, &mut dedup, &mut tracker, &mut ledger).is_empty());
        assert_eq!(tracker.active_task_id(), Some("t1"));
    }
}
