//! Configuration types for the dashboard.

use crate::error::{DashboardError, Result};
use crate::scheduler::ResolverZone;
use chrono::FixedOffset;
use duewatch_backend::BackendConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level dashboard configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Task backend and sensor endpoint.
    pub backend: BackendConfig,
    /// Timer cadences.
    pub polling: PollingConfig,
    /// Reminder lifecycle settings.
    pub reminders: ReminderConfig,
    /// Log output.
    pub logging: LoggingConfig,
}

/// Fixed intervals for the three dashboard timers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    /// Sensor refresh interval in seconds. The first refresh runs at start.
    pub sensor_interval_secs: u64,
    /// Task list refresh interval in seconds. The first refresh runs at start.
    pub task_refresh_secs: u64,
    /// Due-detection tick interval in seconds.
    pub due_check_secs: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            sensor_interval_secs: 10,
            task_refresh_secs: 60,
            due_check_secs: 30,
        }
    }
}

impl PollingConfig {
    /// Sensor refresh interval.
    pub fn sensor_interval(&self) -> Duration {
        Duration::from_secs(self.sensor_interval_secs)
    }

    /// Task list refresh interval.
    pub fn task_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.task_refresh_secs)
    }

    /// Due-detection interval.
    pub fn due_check_interval(&self) -> Duration {
        Duration::from_secs(self.due_check_secs)
    }
}

/// Reminder lifecycle settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReminderConfig {
    /// Minutes after the due slot before a task is deleted.
    pub grace_minutes: u32,
    /// How long reminder banners stay visible, in milliseconds.
    pub banner_duration_ms: u64,
    /// Whether to raise a system-level alert in addition to the banner.
    pub system_alerts: bool,
    /// UTC offset used to read naive schedules and render due slots.
    /// `None` follows the host's local zone, daylight-saving changes included.
    pub utc_offset_minutes: Option<i32>,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            grace_minutes: 5,
            banner_duration_ms: 10_000,
            system_alerts: true,
            utc_offset_minutes: None,
        }
    }
}

impl ReminderConfig {
    /// Zone for reading schedules: the configured offset, or the host's
    /// local zone when none is set.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::Config`] when the offset is outside ±24h.
    pub fn zone(&self) -> Result<ResolverZone> {
        match self.utc_offset_minutes {
            Some(minutes) => FixedOffset::east_opt(minutes.saturating_mul(60))
                .map(ResolverZone::Fixed)
                .ok_or_else(|| {
                    DashboardError::Config(format!("utc_offset_minutes out of range: {minutes}"))
                }),
            None => Ok(ResolverZone::Local),
        }
    }

    /// Banner display duration.
    pub fn banner_duration(&self) -> Duration {
        Duration::from_millis(self.banner_duration_ms)
    }
}

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset (e.g. `"info"`,
    /// `"duewatch=debug"`).
    pub level: String,
    /// Also write daily-rotated log files.
    pub file: bool,
    /// Log directory override. `None` uses [`crate::app_dirs::logs_dir`].
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            file: false,
            directory: None,
        }
    }
}

impl DashboardConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| DashboardError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| DashboardError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> PathBuf {
        crate::app_dirs::config_file()
    }

    /// Check values that serde cannot.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::Config`] for zero intervals, a zero grace
    /// window, an out-of-range offset, or invalid backend settings.
    pub fn validate(&self) -> Result<()> {
        let polling = &self.polling;
        if polling.sensor_interval_secs == 0
            || polling.task_refresh_secs == 0
            || polling.due_check_secs == 0
        {
            return Err(DashboardError::Config(
                "polling intervals must be > 0".to_owned(),
            ));
        }
        if self.reminders.grace_minutes == 0 {
            return Err(DashboardError::Config(
                "reminders.grace_minutes must be > 0".to_owned(),
            ));
        }
        self.reminders.zone()?;
        self.backend
            .validate()
            .map_err(|e| DashboardError::Config(e.to_string()))
    }
}
