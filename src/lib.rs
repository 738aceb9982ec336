//! Duewatch: a task reminder dashboard.
//!
//! Polls a task backend and a sensor endpoint, raises a reminder exactly
//! once when a task reaches its due minute, and deletes tasks once their
//! grace window has passed.
//!
//! # Architecture
//!
//! - **Sources**: [`source::TaskSource`] and [`source::SensorSource`], backed
//!   by the `duewatch-backend` HTTP client
//! - **Engine**: [`scheduler::ReminderEngine`] resolves schedules, dedupes
//!   notifications, tracks the due task and picks tasks to prune
//! - **Loop**: [`scheduler::Dashboard`] drives the engine and both refreshes
//!   from a single tokio task and publishes [`scheduler::DashboardSnapshot`]s
//! - **Surfaces**: [`notify::NotificationSink`] receives banners and alerts

pub mod app_dirs;
pub mod clock;
pub mod config;
pub mod error;
pub mod logging;
pub mod notify;
pub mod scheduler;
pub mod sensors;
pub mod source;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::DashboardConfig;
pub use error::{DashboardError, Result};
pub use notify::{Banner, BannerKind, ChannelSink, LogSink, Notice, NotificationSink};
pub use scheduler::{Dashboard, DashboardHandle, DashboardSnapshot, ReminderEngine, Task};
pub use sensors::SensorReading;
pub use source::{BackendSource, SensorSource, TaskSource};
