//! External collaborators the dashboard polls: the task store and the
//! sensor endpoint.
//!
//! The engine only sees these traits. [`BackendSource`] implements both on
//! top of [`duewatch_backend::BackendClient`].

use crate::error::{DashboardError, Result};
use crate::scheduler::tasks::{NewTask, Task};
use crate::sensors::SensorReading;
use async_trait::async_trait;
use duewatch_backend::{BackendClient, BackendConfig, BackendError, TaskRecord};

/// Store that owns the task list.
#[async_trait]
pub trait TaskSource: Send + Sync {
    /// Fetch the whole task list.
    ///
    /// # Errors
    ///
    /// [`DashboardError::Fetch`] when the list could not be retrieved.
    async fn list_tasks(&self) -> Result<Vec<Task>>;

    /// Delete a task by id.
    ///
    /// # Errors
    ///
    /// [`DashboardError::Delete`] when the store refused or was unreachable.
    async fn delete_task(&self, id: &str) -> Result<()>;

    /// Create a task. Returns the stored task when the store echoes it back.
    async fn create_task(&self, task: &NewTask) -> Result<Option<Task>>;

    /// Replace a task's title, schedule and status.
    async fn update_task(&self, task: &Task) -> Result<()>;

    /// Look up one task.
    async fn get_task(&self, id: &str) -> Result<Option<Task>>;
}

/// Endpoint producing sensor readings.
#[async_trait]
pub trait SensorSource: Send + Sync {
    /// Read all four channels.
    ///
    /// # Errors
    ///
    /// [`DashboardError::Fetch`] when the endpoint failed.
    async fn fetch_readings(&self) -> Result<SensorReading>;
}

/// [`TaskSource`] and [`SensorSource`] backed by the HTTP backend.
#[derive(Debug, Clone)]
pub struct BackendSource {
    client: BackendClient,
}

impl BackendSource {
    /// Build the HTTP client from `config`.
    ///
    /// # Errors
    ///
    /// [`DashboardError::Config`] when the backend settings are invalid.
    pub fn new(config: BackendConfig) -> Result<Self> {
        let client = BackendClient::new(config).map_err(|e| DashboardError::Config(e.to_string()))?;
        Ok(Self { client })
    }

    /// Wrap an existing client.
    pub fn from_client(client: BackendClient) -> Self {
        Self { client }
    }

    /// Underlying client, for backend queries the dashboard does not model.
    pub fn client(&self) -> &BackendClient {
        &self.client
    }

    /// Tasks scheduled between `start` and `end` (backend date strings).
    pub async fn tasks_by_date(&self, start: &str, end: &str) -> Result<Vec<Task>> {
        let records = self
            .client
            .tasks_by_date(start, end)
            .await
            .map_err(|e| DashboardError::Fetch(e.to_string()))?;
        Ok(records.into_iter().map(Task::from).collect())
    }

    /// Tasks with the given status.
    pub async fn tasks_by_status(&self, status: &str) -> Result<Vec<Task>> {
        let records = self
            .client
            .tasks_by_status(status)
            .await
            .map_err(|e| DashboardError::Fetch(e.to_string()))?;
        Ok(records.into_iter().map(Task::from).collect())
    }
}

/// The backend refusing a write is a validation problem; anything else is
/// a transport failure.
fn write_error(err: BackendError) -> DashboardError {
    match err {
        BackendError::Rejected(message) => DashboardError::InvalidTask(message),
        other => DashboardError::Fetch(other.to_string()),
    }
}

#[async_trait]
impl TaskSource for BackendSource {
    async fn list_tasks(&self) -> Result<Vec<Task>> {
        let records = self
            .client
            .list_tasks()
            .await
            .map_err(|e| DashboardError::Fetch(e.to_string()))?;
        Ok(records.into_iter().map(Task::from).collect())
    }

    async fn delete_task(&self, id: &str) -> Result<()> {
        self.client
            .delete_task(id)
            .await
            .map_err(|e| DashboardError::Delete(e.to_string()))
    }

    async fn create_task(&self, task: &NewTask) -> Result<Option<Task>> {
        let created = self
            .client
            .create_task(task.title(), task.date())
            .await
            .map_err(write_error)?;
        Ok(created.map(Task::from))
    }

    async fn update_task(&self, task: &Task) -> Result<()> {
        self.client
            .update_task(&TaskRecord::from(task))
            .await
            .map_err(write_error)
    }

    async fn get_task(&self, id: &str) -> Result<Option<Task>> {
        let record = self
            .client
            .get_task(id)
            .await
            .map_err(|e| DashboardError::Fetch(e.to_string()))?;
        Ok(record.map(Task::from))
    }
}

#[async_trait]
impl SensorSource for BackendSource {
    async fn fetch_readings(&self) -> Result<SensorReading> {
        let payload = self
            .client
            .fetch_sensors()
            .await
            .map_err(|e| DashboardError::Fetch(e.to_string()))?;
        Ok(SensorReading::from(payload))
    }
}
