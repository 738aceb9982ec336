//! CLI binary for duewatch.

use clap::{Parser, Subcommand};
use duewatch::DashboardConfig;
use duewatch::clock::{Clock, SystemClock};
use duewatch::notify::{BannerKind, ChannelSink, Notice};
use duewatch::scheduler::{
    Dashboard, DashboardSnapshot, DueTimeResolver, NewTask, PollingIntervals, ReminderEngine,
    ReminderPhase,
};
use duewatch::source::{BackendSource, SensorSource, TaskSource};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Duewatch: task reminders and sensor readings from a task backend.
#[derive(Parser)]
#[command(name = "duewatch", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Option<Command>,
}

/// Available commands.
#[derive(Subcommand)]
enum Command {
    /// Run the dashboard until Ctrl+C, printing reminders and readings.
    Run,

    /// List tasks with their due slot and reminder phase.
    Tasks {
        /// Print the raw task list as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Create a task.
    Add {
        /// Title, at most 40 characters.
        title: String,
        /// Schedule, e.g. "2024-01-01 09:00".
        date: String,
    },

    /// Delete a task by id.
    Delete {
        /// Task id.
        id: String,
    },

    /// Print the current sensor reading.
    Sensors,

    /// Show how a schedule string resolves.
    Resolve {
        /// Schedule string.
        schedule: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let path = cli
        .config
        .clone()
        .unwrap_or_else(DashboardConfig::default_config_path);
    let config = if path.exists() {
        DashboardConfig::from_file(&path)?
    } else {
        DashboardConfig::default()
    };
    config.validate()?;

    let _log_guard = duewatch::logging::init_tracing(&config.logging);
    info!(config = %path.display(), "configuration loaded");

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => run_dashboard(config).await,
        Command::Tasks { json } => list_tasks(config, json).await,
        Command::Add { title, date } => add_task(config, &title, &date).await,
        Command::Delete { id } => delete_task(config, &id).await,
        Command::Sensors => show_sensors(config).await,
        Command::Resolve { schedule } => resolve(&config, &schedule),
    }
}

async fn run_dashboard(config: DashboardConfig) -> anyhow::Result<()> {
    println!("duewatch v{}", env!("CARGO_PKG_VERSION"));

    let source = Arc::new(BackendSource::new(config.backend.clone())?);
    let (sink, mut notices) = ChannelSink::new(config.reminders.system_alerts);
    let engine = ReminderEngine::from_config(&config.reminders)?;

    let handle = Dashboard::new(source.clone(), source, Arc::new(sink), engine)
        .with_intervals(PollingIntervals::from(&config.polling))
        .spawn();
    let cancel = handle.cancel_token();

    let cancel_clone = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("received Ctrl+C, shutting down...");
            cancel_clone.cancel();
        }
    });

    println!("\nWatching tasks. Press Ctrl+C to stop.\n");

    let mut snapshots = handle.subscribe();
    let mut shown = DashboardSnapshot::default();
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            Some(notice) = notices.recv() => print_notice(&notice),
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = snapshots.borrow_and_update().clone();
                print_changes(&shown, &current);
                shown = current;
            }
        }
    }

    handle.shutdown().await;
    Ok(())
}

fn print_notice(notice: &Notice) {
    match notice {
        Notice::Banner(banner) => {
            let label = match banner.kind {
                BannerKind::Info => "info",
                BannerKind::Success => "ok",
                BannerKind::Error => "error",
                BannerKind::Reminder => "REMINDER",
            };
            match &banner.detail {
                Some(detail) => println!("[{label}] {} ({detail})", banner.message),
                None => println!("[{label}] {}", banner.message),
            }
        }
        Notice::Alert { title, body, .. } => println!("[alert] {title}: {body}"),
    }
}

fn print_changes(previous: &DashboardSnapshot, current: &DashboardSnapshot) {
    if current.sensors != previous.sensors
        && let Some(reading) = &current.sensors
    {
        println!("sensors: {reading}");
    }
    if current.tasks.len() != previous.tasks.len() {
        println!("{} task(s) loaded", current.tasks.len());
    }
    if current.active_task_id != previous.active_task_id {
        match &current.active_task_id {
            Some(id) => println!("active task: {id}"),
            None => println!("no task due"),
        }
    }
}

async fn list_tasks(config: DashboardConfig, json: bool) -> anyhow::Result<()> {
    let source = BackendSource::new(config.backend.clone())?;
    let resolver = DueTimeResolver::in_zone(config.reminders.zone()?);
    let grace = i64::from(config.reminders.grace_minutes);
    let now = resolver.slot_of(SystemClock.now());

    let tasks = source.list_tasks().await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&tasks)?);
        return Ok(());
    }
    if tasks.is_empty() {
        println!("No tasks.");
        return Ok(());
    }
    for task in tasks {
        let (slot, phase) = match resolver.resolve(&task.date) {
            Ok(due) => (
                due.slot.key(),
                format!("{:?}", ReminderPhase::classify(&due.slot, &now, grace)),
            ),
            Err(_) => (task.date.clone(), "Unparseable".to_owned()),
        };
        let status = task.status.as_deref().unwrap_or("-");
        println!(
            "{:<8} {:<40} {:<16} {:<11} {status}",
            task.id,
            task.display_title(),
            slot,
            phase
        );
    }
    Ok(())
}

async fn add_task(config: DashboardConfig, title: &str, date: &str) -> anyhow::Result<()> {
    let source = BackendSource::new(config.backend.clone())?;
    let resolver = DueTimeResolver::in_zone(config.reminders.zone()?);
    let task = NewTask::parse(title, date, &resolver)?;

    match source.create_task(&task).await? {
        Some(created) => println!("Added task {} due {}", created.id, task.date()),
        None => println!("Added \"{}\" due {}", task.title(), task.date()),
    }
    Ok(())
}

async fn delete_task(config: DashboardConfig, id: &str) -> anyhow::Result<()> {
    let source = BackendSource::new(config.backend.clone())?;
    source.delete_task(id).await?;
    println!("Deleted task {id}");
    Ok(())
}

async fn show_sensors(config: DashboardConfig) -> anyhow::Result<()> {
    let source = BackendSource::new(config.backend.clone())?;
    let reading = source.fetch_readings().await?;
    println!("{reading}");
    Ok(())
}

fn resolve(config: &DashboardConfig, schedule: &str) -> anyhow::Result<()> {
    let resolver = DueTimeResolver::in_zone(config.reminders.zone()?);
    let (due, shape) = resolver.resolve_with_shape(schedule)?;
    println!("shape:   {shape:?}");
    println!("instant: {}", due.instant.to_rfc3339());
    println!("slot:    {}", due.slot);
    Ok(())
}
