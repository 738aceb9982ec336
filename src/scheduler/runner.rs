//! Dashboard background loop.
//!
//! One tokio task owns the task list, the latest sensor reading and the
//! [`ReminderEngine`]. Three fixed-interval timers drive it:
//!
//! - sensor refresh, first run at start
//! - task list refresh, first run at start and on every explicit request
//! - due detection, first run one period after start
//!
//! Network calls run in spawned tasks and report back over a completion
//! channel, so a slow backend never delays a due check. Every spawned task
//! checks the loop's [`CancellationToken`] before reporting; nothing lands
//! after [`DashboardHandle::shutdown`].

use crate::clock::{Clock, SystemClock};
use crate::config::PollingConfig;
use crate::error::{DashboardError, Result};
use crate::notify::{Banner, NotificationSink};
use crate::scheduler::engine::ReminderEngine;
use crate::scheduler::pruner;
use crate::scheduler::tasks::{NewTask, Task};
use crate::sensors::SensorReading;
use crate::source::{SensorSource, TaskSource};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Periods of the three dashboard timers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollingIntervals {
    /// Sensor refresh period.
    pub sensors: Duration,
    /// Task list refresh period.
    pub tasks: Duration,
    /// Due-detection period.
    pub due_check: Duration,
}

impl Default for PollingIntervals {
    fn default() -> Self {
        Self::from(&PollingConfig::default())
    }
}

impl From<&PollingConfig> for PollingIntervals {
    fn from(config: &PollingConfig) -> Self {
        Self {
            sensors: config.sensor_interval(),
            tasks: config.task_refresh_interval(),
            due_check: config.due_check_interval(),
        }
    }
}

/// Everything a surface needs to draw the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    /// Latest task list.
    pub tasks: Vec<Task>,
    /// Latest sensor reading; `None` until the first successful refresh.
    pub sensors: Option<SensorReading>,
    /// Highlighted task.
    pub active_task_id: Option<String>,
    /// Task shown in the reminder dialog.
    pub due_task: Option<Task>,
    /// Every task currently in its due minute.
    pub due_task_ids: Vec<String>,
    /// Why the last task list refresh failed; cleared by the next success.
    pub task_error: Option<String>,
    /// Why the last sensor refresh failed; cleared by the next success.
    pub sensor_error: Option<String>,
}

enum Command {
    Refresh,
    Dismiss(String),
    Create(NewTask, oneshot::Sender<Result<()>>),
    Delete(String, oneshot::Sender<Result<()>>),
}

enum Completion {
    Tasks(Result<Vec<Task>>),
    Sensors(Result<SensorReading>),
    Pruned {
        task_id: String,
        outcome: Result<()>,
    },
    Write {
        success: String,
        failure: String,
        outcome: Result<()>,
        reply: oneshot::Sender<Result<()>>,
    },
}

/// Builder for the dashboard loop.
pub struct Dashboard {
    task_source: Arc<dyn TaskSource>,
    sensor_source: Arc<dyn SensorSource>,
    sink: Arc<dyn NotificationSink>,
    clock: Arc<dyn Clock>,
    engine: ReminderEngine,
    intervals: PollingIntervals,
}

impl Dashboard {
    /// Create a dashboard with the wall clock and default intervals.
    pub fn new(
        task_source: Arc<dyn TaskSource>,
        sensor_source: Arc<dyn SensorSource>,
        sink: Arc<dyn NotificationSink>,
        engine: ReminderEngine,
    ) -> Self {
        Self {
            task_source,
            sensor_source,
            sink,
            clock: Arc::new(SystemClock),
            engine,
            intervals: PollingIntervals::default(),
        }
    }

    /// Use a different time source.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Override the timer periods.
    #[must_use]
    pub fn with_intervals(mut self, intervals: PollingIntervals) -> Self {
        self.intervals = intervals;
        self
    }

    /// Start the loop on the current tokio runtime.
    pub fn spawn(self) -> DashboardHandle {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(DashboardSnapshot::default());
        let cancel = CancellationToken::new();

        let state = LoopState {
            task_source: self.task_source,
            sensor_source: self.sensor_source,
            sink: self.sink,
            clock: self.clock,
            engine: self.engine,
            tasks: Vec::new(),
            sensors: None,
            task_error: None,
            sensor_error: None,
            tasks_in_flight: false,
            refresh_pending: false,
            sensors_in_flight: false,
            completion_tx,
            snapshot_tx,
            cancel: cancel.clone(),
        };
        let join = tokio::spawn(state.run(self.intervals, command_rx, completion_rx));

        DashboardHandle {
            commands: command_tx,
            snapshot: snapshot_rx,
            cancel,
            join,
        }
    }
}

/// Control surface of a running dashboard.
pub struct DashboardHandle {
    commands: mpsc::UnboundedSender<Command>,
    snapshot: watch::Receiver<DashboardSnapshot>,
    cancel: CancellationToken,
    join: JoinHandle<()>,
}

impl DashboardHandle {
    /// Ask for an immediate task list refresh.
    pub fn request_refresh(&self) -> Result<()> {
        self.send(Command::Refresh)
    }

    /// Close the reminder dialog for `task_id`; the highlight stays.
    pub fn dismiss_reminder(&self, task_id: impl Into<String>) -> Result<()> {
        self.send(Command::Dismiss(task_id.into()))
    }

    /// Create a task, show the outcome as a banner and refresh on success.
    ///
    /// # Errors
    ///
    /// The source's error, or [`DashboardError::Channel`] when the loop is gone.
    pub async fn create_task(&self, task: NewTask) -> Result<()> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(Command::Create(task, reply_tx))?;
        reply_rx
            .await
            .map_err(|_| DashboardError::Channel("dashboard stopped before replying".into()))?
    }

    /// Delete a task, show the outcome as a banner and refresh on success.
    ///
    /// # Errors
    ///
    /// The source's error, or [`DashboardError::Channel`] when the loop is gone.
    pub async fn delete_task(&self, task_id: impl Into<String>) -> Result<()> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(Command::Delete(task_id.into(), reply_tx))?;
        reply_rx
            .await
            .map_err(|_| DashboardError::Channel("dashboard stopped before replying".into()))?
    }

    /// Latest published state.
    pub fn snapshot(&self) -> DashboardSnapshot {
        self.snapshot.borrow().clone()
    }

    /// A receiver that wakes on every published change.
    pub fn subscribe(&self) -> watch::Receiver<DashboardSnapshot> {
        self.snapshot.clone()
    }

    /// Token cancelled when the loop stops.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Stop all timers and wait for the loop to exit.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.join.await {
            warn!("dashboard loop ended abnormally: {e}");
        }
    }

    fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| DashboardError::Channel("dashboard loop is not running".into()))
    }
}

struct LoopState {
    task_source: Arc<dyn TaskSource>,
    sensor_source: Arc<dyn SensorSource>,
    sink: Arc<dyn NotificationSink>,
    clock: Arc<dyn Clock>,
    engine: ReminderEngine,
    tasks: Vec<Task>,
    sensors: Option<SensorReading>,
    task_error: Option<String>,
    sensor_error: Option<String>,
    tasks_in_flight: bool,
    refresh_pending: bool,
    sensors_in_flight: bool,
    completion_tx: mpsc::UnboundedSender<Completion>,
    snapshot_tx: watch::Sender<DashboardSnapshot>,
    cancel: CancellationToken,
}

impl LoopState {
    async fn run(
        mut self,
        intervals: PollingIntervals,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut completions: mpsc::UnboundedReceiver<Completion>,
    ) {
        let mut sensor_timer = tokio::time::interval(intervals.sensors);
        let mut task_timer = tokio::time::interval(intervals.tasks);
        let mut due_timer =
            tokio::time::interval_at(Instant::now() + intervals.due_check, intervals.due_check);
        for timer in [&mut sensor_timer, &mut task_timer, &mut due_timer] {
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        }

        info!(
            sensors = ?intervals.sensors,
            tasks = ?intervals.tasks,
            due_check = ?intervals.due_check,
            "dashboard started"
        );

        let cancel = self.cancel.clone();
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("dashboard cancelled");
                    break;
                }
                _ = sensor_timer.tick() => self.start_sensor_refresh(),
                _ = task_timer.tick() => self.start_task_refresh(),
                _ = due_timer.tick() => self.check_due(),
                command = commands.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => {
                        debug!("all dashboard handles dropped");
                        break;
                    }
                },
                Some(done) = completions.recv() => self.handle_completion(done),
            }
        }

        self.cancel.cancel();
    }

    fn start_sensor_refresh(&mut self) {
        if self.sensors_in_flight {
            debug!("sensor refresh still running, skipping");
            return;
        }
        self.sensors_in_flight = true;
        let source = Arc::clone(&self.sensor_source);
        self.spawn_io(async move { Completion::Sensors(source.fetch_readings().await) });
    }

    fn start_task_refresh(&mut self) {
        if self.tasks_in_flight {
            self.refresh_pending = true;
            return;
        }
        self.tasks_in_flight = true;
        let source = Arc::clone(&self.task_source);
        self.spawn_io(async move { Completion::Tasks(source.list_tasks().await) });
    }

    fn check_due(&mut self) {
        let report = self
            .engine
            .tick(&self.tasks, self.clock.now(), self.sink.as_ref());
        for task_id in report.pruned {
            let source = Arc::clone(&self.task_source);
            self.spawn_io(async move {
                let outcome = pruner::prune(source.as_ref(), &task_id).await;
                Completion::Pruned { task_id, outcome }
            });
        }
        self.publish();
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Refresh => self.start_task_refresh(),
            Command::Dismiss(task_id) => {
                if self.engine.dismiss(&task_id) {
                    debug!(task_id, "reminder dismissed");
                    self.publish();
                }
            }
            Command::Create(task, reply) => {
                let source = Arc::clone(&self.task_source);
                self.spawn_io(async move {
                    let outcome = source.create_task(&task).await.map(|_| ());
                    Completion::Write {
                        success: format!("Task \"{}\" added", task.title()),
                        failure: "Could not add task".to_owned(),
                        outcome,
                        reply,
                    }
                });
            }
            Command::Delete(task_id, reply) => {
                let source = Arc::clone(&self.task_source);
                self.spawn_io(async move {
                    let outcome = source.delete_task(&task_id).await;
                    Completion::Write {
                        success: "Task deleted".to_owned(),
                        failure: format!("Could not delete task {task_id}"),
                        outcome,
                        reply,
                    }
                });
            }
        }
    }

    fn handle_completion(&mut self, done: Completion) {
        match done {
            Completion::Tasks(result) => {
                self.tasks_in_flight = false;
                match result {
                    Ok(tasks) => {
                        debug!(count = tasks.len(), "task list refreshed");
                        self.engine.reconcile(&tasks);
                        self.tasks = tasks;
                        self.task_error = None;
                    }
                    Err(e) => {
                        warn!("task refresh failed: {e}");
                        self.sink
                            .show_banner(Banner::error("Could not load tasks", e.to_string()));
                        self.task_error = Some(e.to_string());
                    }
                }
                self.publish();
                if std::mem::take(&mut self.refresh_pending) {
                    self.start_task_refresh();
                }
            }
            Completion::Sensors(result) => {
                self.sensors_in_flight = false;
                match result {
                    Ok(reading) => {
                        self.sensors = Some(reading);
                        self.sensor_error = None;
                    }
                    Err(e) => {
                        warn!("sensor refresh failed: {e}");
                        self.sink
                            .show_banner(Banner::error("Could not read sensors", e.to_string()));
                        self.sensor_error = Some(e.to_string());
                    }
                }
                self.publish();
            }
            Completion::Pruned { task_id, outcome } => {
                if outcome.is_err() {
                    self.engine.prune_failed(&task_id);
                }
            }
            Completion::Write {
                success,
                failure,
                outcome,
                reply,
            } => {
                match &outcome {
                    Ok(()) => {
                        info!("{success}");
                        self.sink.show_banner(Banner::success(success));
                        self.start_task_refresh();
                    }
                    Err(e) => {
                        warn!("{failure}: {e}");
                        self.sink.show_banner(Banner::error(failure, e.to_string()));
                    }
                }
                if reply.send(outcome).is_err() {
                    debug!("write caller went away before the reply");
                }
            }
        }
    }

    fn spawn_io<F>(&self, work: F)
    where
        F: std::future::Future<Output = Completion> + Send + 'static,
    {
        let tx = self.completion_tx.clone();
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            let done = work.await;
            deliver(&tx, &cancel, done);
        });
    }

    fn publish(&self) {
        let next = DashboardSnapshot {
            tasks: self.tasks.clone(),
            sensors: self.sensors,
            active_task_id: self.engine.active_task_id().map(str::to_owned),
            due_task: self.engine.due_task().cloned(),
            due_task_ids: self.engine.due_task_ids(),
            task_error: self.task_error.clone(),
            sensor_error: self.sensor_error.clone(),
        };
        self.snapshot_tx.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
    }
}

/// Hand a finished I/O result back to the loop. Returns `false` when the
/// dashboard stopped or its loop is gone.
fn deliver(
    tx: &mpsc::UnboundedSender<Completion>,
    cancel: &CancellationToken,
    done: Completion,
) -> bool {
    if cancel.is_cancelled() {
        debug!("dashboard stopped, dropping completion");
        return false;
    }
    if tx.send(done).is_err() {
        debug!("dashboard loop gone, dropping completion");
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::clock::ManualClock;
    use crate::notify::{ChannelSink, Notice};
    use crate::scheduler::due::DueTimeResolver;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::sync::Mutex;

    struct StaticSource {
        tasks: Mutex<Vec<Task>>,
        lists: Mutex<usize>,
    }

    impl StaticSource {
        fn new(tasks: Vec<Task>) -> Arc<Self> {
            Arc::new(Self {
                tasks: Mutex::new(tasks),
                lists: Mutex::new(0),
            })
        }
    }

    #[async_trait]
    impl TaskSource for StaticSource {
        async fn list_tasks(&self) -> Result<Vec<Task>> {
            *self.lists.lock().unwrap() += 1;
            Ok(self.tasks.lock().unwrap().clone())
        }
        async fn delete_task(&self, id: &str) -> Result<()> {
            self.tasks.lock().unwrap().retain(|t| t.id != id);
            Ok(())
        }
        async fn create_task(&self, task: &NewTask) -> Result<Option<Task>> {
            let created = Task::new("new", task.title(), task.date());
            self.tasks.lock().unwrap().push(created.clone());
            Ok(Some(created))
        }
        async fn update_task(&self, _task: &Task) -> Result<()> {
            Ok(())
        }
        async fn get_task(&self, _id: &str) -> Result<Option<Task>> {
            Ok(None)
        }
    }

    #[async_trait]
    impl SensorSource for StaticSource {
        async fn fetch_readings(&self) -> Result<SensorReading> {
            Ok(SensorReading {
                temperature: 20.0,
                ..SensorReading::default()
            })
        }
    }

    fn fast() -> PollingIntervals {
        PollingIntervals {
            sensors: Duration::from_millis(20),
            tasks: Duration::from_secs(60),
            due_check: Duration::from_millis(20),
        }
    }

    async fn wait_for<F>(rx: &mut watch::Receiver<DashboardSnapshot>, mut pred: F) -> DashboardSnapshot
    where
        F: FnMut(&DashboardSnapshot) -> bool,
    {
        tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                let current = rx.borrow_and_update().clone();
                if pred(&current) {
                    return current;
                }
                rx.changed().await.unwrap();
            }
        })
        .await
        .expect("snapshot condition not reached")
    }

    #[test]
    fn intervals_follow_polling_config() {
        let intervals = PollingIntervals::default();
        assert_eq!(intervals.sensors, Duration::from_secs(10));
        assert_eq!(intervals.tasks, Duration::from_secs(60));
        assert_eq!(intervals.due_check, Duration::from_secs(30));
    }

    #[test]
    fn snapshot_serializes_for_surfaces() {
        let snapshot = DashboardSnapshot {
            tasks: vec![Task::new("t1", "A", "2024-01-01 09:00")],
            active_task_id: Some("t1".to_owned()),
            task_error: Some("offline".to_owned()),
            ..DashboardSnapshot::default()
        };
        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(value["active_task_id"], "t1");
        assert_eq!(value["tasks"][0]["date"], "2024-01-01 09:00");
        assert_eq!(value["task_error"], "offline");
        assert!(value["sensors"].is_null());
    }

    #[tokio::test]
    async fn run_starts_and_loads_tasks_and_sensors() {
        let source = StaticSource::new(vec![Task::new("t1", "A", "2030-01-01 09:00")]);
        let (sink, _rx) = ChannelSink::new(false);
        let handle = Dashboard::new(
            source.clone(),
            source.clone(),
            Arc::new(sink),
            ReminderEngine::new(DueTimeResolver::utc()),
        )
        .with_intervals(fast())
        .spawn();

        let mut rx = handle.subscribe();
        let snap = wait_for(&mut rx, |s| !s.tasks.is_empty() && s.sensors.is_some()).await;
        assert_eq!(snap.tasks[0].id, "t1");
        assert_eq!(snap.sensors.unwrap().temperature, 20.0);

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn create_shows_banner_and_refreshes() {
        let source = StaticSource::new(Vec::new());
        let (sink, mut notices) = ChannelSink::new(false);
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap());
        let handle = Dashboard::new(
            source.clone(),
            source.clone(),
            Arc::new(sink),
            ReminderEngine::new(DueTimeResolver::utc()),
        )
        .with_clock(Arc::new(clock))
        .with_intervals(fast())
        .spawn();

        let task = NewTask::parse("Water plants", "2024-01-01 09:00", &DueTimeResolver::utc()).unwrap();
        handle.create_task(task).await.unwrap();

        let mut rx = handle.subscribe();
        let snap = wait_for(&mut rx, |s| s.tasks.iter().any(|t| t.id == "new")).await;
        assert_eq!(snap.tasks.len(), 1);

        let banner = tokio::time::timeout(Duration::from_secs(1), notices.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(banner, Notice::Banner(b) if b.message.contains("Water plants")));

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn commands_fail_after_shutdown() {
        let source = StaticSource::new(Vec::new());
        let (sink, _rx) = ChannelSink::new(false);
        let handle = Dashboard::new(
            source.clone(),
            source,
            Arc::new(sink),
            ReminderEngine::new(DueTimeResolver::utc()),
        )
        .spawn();
        let cancel = handle.cancel_token();
        let commands = handle.commands.clone();
        handle.shutdown().await;

        assert!(cancel.is_cancelled());
        assert!(commands.send(Command::Refresh).is_err());
    }

    #[test]
    fn completion_is_dropped_once_the_loop_is_gone() {
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        assert!(deliver(&tx, &cancel, Completion::Tasks(Ok(Vec::new()))));

        drop(rx);
        assert!(!deliver(&tx, &cancel, Completion::Tasks(Ok(Vec::new()))));

        let (tx, _rx) = mpsc::unbounded_channel();
        cancel.cancel();
        assert!(!deliver(&tx, &cancel, Completion::Tasks(Ok(Vec::new()))));
    }
}
