//! Task due detection and reminder lifecycle.
//!
//! [`ReminderEngine`] classifies every task on each tick and decides what to
//! notify and what to prune; [`Dashboard`] runs it on a timer next to the
//! task list and sensor refreshes.

pub mod dedup;
pub mod due;
pub mod engine;
pub mod pruner;
pub mod reconcile;
pub mod reminder;
pub mod runner;
pub mod tasks;

pub use dedup::NotificationDedup;
pub use due::{DueSlot, DueTime, DueTimeResolver, ResolverZone, ScheduleShape};
pub use engine::{ReminderEngine, TickReport};
pub use pruner::PruneLedger;
pub use reconcile::ReconcileReport;
pub use reminder::{ReminderPhase, ReminderTracker};
pub use runner::{Dashboard, DashboardHandle, DashboardSnapshot, PollingIntervals};
pub use tasks::{MAX_TITLE_CHARS, NewTask, Task};
