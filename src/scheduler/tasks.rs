//! Task definitions as seen by the dashboard.
//!
//! Tasks are owned by the backend and arrive as whole-list snapshots. The
//! engine keeps no mutable state on a [`Task`]; anything it remembers about
//! a task lives in its own maps keyed by [`Task::id`].

use crate::error::{DashboardError, Result};
use crate::scheduler::due::DueTimeResolver;
use duewatch_backend::TaskRecord;
use serde::{Deserialize, Serialize};

/// Longest title accepted when creating a task, in characters.
pub const MAX_TITLE_CHARS: usize = 40;

/// A user task with a schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Backend-assigned identifier, stable across refreshes.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Schedule string as stored by the backend.
    pub date: String,
    /// Optional free-form status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl Task {
    /// Create a task with no status.
    pub fn new(id: impl Into<String>, title: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            date: date.into(),
            status: None,
        }
    }

    /// Set the status.
    #[must_use]
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Title cut to [`MAX_TITLE_CHARS`]; backend rows may exceed the bound.
    pub fn display_title(&self) -> String {
        let trimmed = self.title.trim();
        if trimmed.chars().count() <= MAX_TITLE_CHARS {
            return trimmed.to_owned();
        }
        trimmed.chars().take(MAX_TITLE_CHARS).collect()
    }
}

impl From<TaskRecord> for Task {
    fn from(record: TaskRecord) -> Self {
        Self {
            id: record.id,
            title: record.title,
            date: record.date,
            status: record.status.filter(|s| !s.trim().is_empty()),
        }
    }
}

impl From<&Task> for TaskRecord {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id.clone(),
            title: task.title.clone(),
            date: task.date.clone(),
            status: task.status.clone(),
        }
    }
}

/// A validated request to create a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    title: String,
    date: String,
}

impl NewTask {
    /// Validate a title and schedule.
    ///
    /// The title is trimmed and must be 1..=[`MAX_TITLE_CHARS`] characters.
    /// The schedule must resolve; it is stored in canonical slot form.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::InvalidTask`] for a bad title, or
    /// [`DashboardError::DueTimeUnparseable`] for a bad schedule.
    pub fn parse(title: &str, date: &str, resolver: &DueTimeResolver) -> Result<Self> {
        let title = title.trim();
        if title.is_empty() {
            return Err(DashboardError::InvalidTask("title must not be empty".into()));
        }
        let chars = title.chars().count();
        if chars > MAX_TITLE_CHARS {
            return Err(DashboardError::InvalidTask(format!(
                "title is {chars} characters, limit is {MAX_TITLE_CHARS}"
            )));
        }
        let due = resolver.resolve(date)?;
        Ok(Self {
            title: title.to_owned(),
            date: due.slot.key(),
        })
    }

    /// Validated title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Canonical schedule string.
    pub fn date(&self) -> &str {
        &self.date
    }
}
