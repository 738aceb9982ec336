//! The reminder engine: one synchronous pass over the task list per tick.
//!
//! The engine performs no I/O. Notifications go to a [`NotificationSink`]
//! and ids that need deleting are returned in the [`TickReport`] for the
//! caller to dispatch.

use crate::config::ReminderConfig;
use crate::error::Result;
use crate::notify::{Banner, BannerKind, NotificationSink};
use crate::scheduler::dedup::NotificationDedup;
use crate::scheduler::due::{DueTime, DueTimeResolver};
use crate::scheduler::pruner::PruneLedger;
use crate::scheduler::reconcile::{ReconcileReport, reconcile};
use crate::scheduler::reminder::{ReminderPhase, ReminderTracker};
use crate::scheduler::tasks::Task;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default grace window after a task's due minute.
pub const DEFAULT_GRACE_MINUTES: i64 = 5;

/// Title of system alerts raised for due tasks.
pub const REMINDER_ALERT_TITLE: &str = "Task reminder";

/// Outcome of one due-detection tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Tasks whose schedule resolved.
    pub evaluated: usize,
    /// Ids skipped because their schedule did not parse.
    pub unparseable: Vec<String>,
    /// Ids a notification was dispatched for.
    pub notified: Vec<String>,
    /// Ids that should now be deleted.
    pub pruned: Vec<String>,
}

/// Owns all per-task reminder memory.
#[derive(Debug, Clone)]
pub struct ReminderEngine {
    resolver: DueTimeResolver,
    grace_minutes: i64,
    banner_duration: Option<Duration>,
    dedup: NotificationDedup,
    tracker: ReminderTracker,
    ledger: PruneLedger,
}

impl ReminderEngine {
    /// Engine with the default grace window and no banner duration.
    pub fn new(resolver: DueTimeResolver) -> Self {
        Self {
            resolver,
            grace_minutes: DEFAULT_GRACE_MINUTES,
            banner_duration: None,
            dedup: NotificationDedup::new(),
            tracker: ReminderTracker::new(),
            ledger: PruneLedger::new(),
        }
    }

    /// Engine configured from the `[reminders]` section.
    ///
    /// # Errors
    ///
    /// Fails when the configured UTC offset is out of range.
    pub fn from_config(config: &ReminderConfig) -> Result<Self> {
        let resolver = DueTimeResolver::in_zone(config.zone()?);
        Ok(Self::new(resolver)
            .with_grace_minutes(i64::from(config.grace_minutes))
            .with_banner_duration(config.banner_duration()))
    }

    /// Override the grace window. Values below one minute are raised to one.
    #[must_use]
    pub fn with_grace_minutes(mut self, minutes: i64) -> Self {
        self.grace_minutes = minutes.max(1);
        self
    }

    /// Display duration for reminder banners.
    #[must_use]
    pub fn with_banner_duration(mut self, duration: Duration) -> Self {
        self.banner_duration = Some(duration);
        self
    }

    /// Resolver used for schedules.
    pub fn resolver(&self) -> &DueTimeResolver {
        &self.resolver
    }

    /// Highlighted task id.
    pub fn active_task_id(&self) -> Option<&str> {
        self.tracker.active_task_id()
    }

    /// Task shown in the reminder dialog.
    pub fn due_task(&self) -> Option<&Task> {
        self.tracker.due_task()
    }

    /// Every task currently in its due minute.
    pub fn due_task_ids(&self) -> Vec<String> {
        self.tracker.due_ids().map(str::to_owned).collect()
    }

    /// Notification memory, read-only.
    pub fn dedup(&self) -> &NotificationDedup {
        &self.dedup
    }

    /// Outstanding prune requests, read-only.
    pub fn prune_ledger(&self) -> &PruneLedger {
        &self.ledger
    }

    /// Close the reminder dialog for `task_id`; the highlight stays.
    pub fn dismiss(&mut self, task_id: &str) -> bool {
        self.tracker.dismiss(task_id)
    }

    /// A delete for `task_id` failed; allow a later tick to retry it.
    pub fn prune_failed(&mut self, task_id: &str) {
        self.ledger.release(task_id);
    }

    /// Drop memory for tasks missing from a fresh task list.
    pub fn reconcile(&mut self, tasks: &[Task]) -> ReconcileReport {
        reconcile(tasks, &mut self.dedup, &mut self.tracker, &mut self.ledger)
    }

    /// Classify every task against `now` and act on the result.
    pub fn tick(
        &mut self,
        tasks: &[Task],
        now: DateTime<Utc>,
        sink: &dyn NotificationSink,
    ) -> TickReport {
        let mut report = TickReport::default();
        if tasks.is_empty() {
            return report;
        }

        let now_slot = self.resolver.slot_of(now);
        for task in tasks {
            let due = match self.resolver.resolve(&task.date) {
                Ok(due) => due,
                Err(e) => {
                    warn!(task_id = %task.id, "skipping task: {e}");
                    report.unparseable.push(task.id.clone());
                    continue;
                }
            };
            report.evaluated += 1;

            let phase = ReminderPhase::classify(&due.slot, &now_slot, self.grace_minutes);
            debug!(task_id = %task.id, slot = %due.slot, ?phase, "evaluated task");
            match phase {
                ReminderPhase::Scheduled => {
                    self.dedup
                        .discard_if_rescheduled(&task.id, &due.slot, due.instant, now);
                    self.tracker.clear(&task.id);
                }
                ReminderPhase::Due => {
                    self.tracker.enter_due(task);
                    if self.dedup.should_notify(&task.id, &due.slot, due.instant, now) {
                        self.dispatch_reminder(task, &due, sink);
                        self.dedup.record_notified(&task.id, due.slot);
                        report.notified.push(task.id.clone());
                    }
                }
                ReminderPhase::Cooling => {
                    self.tracker.clear(&task.id);
                }
                ReminderPhase::Expired => {
                    self.tracker.clear(&task.id);
                    self.dedup.forget(&task.id);
                    if self.ledger.record_once(&task.id) {
                        info!(task_id = %task.id, slot = %due.slot, "task expired, pruning");
                        report.pruned.push(task.id.clone());
                    }
                }
            }
        }
        report
    }

    fn dispatch_reminder(&self, task: &Task, due: &DueTime, sink: &dyn NotificationSink) {
        let title = task.display_title();
        info!(task_id = %task.id, slot = %due.slot, "task due: {title}");

        let mut banner = Banner::new(BannerKind::Reminder, title.clone())
            .with_detail(format!("due {}", due.slot));
        if let Some(duration) = self.banner_duration {
            banner = banner.with_duration(duration);
        }
        sink.show_banner(banner);

        let tag = format!("{}@{}", task.id, due.slot);
        sink.notify(REMINDER_ALERT_TITLE, &title, &tag);
    }
}
