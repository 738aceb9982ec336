//! Task backend and sensor endpoint client.

use crate::config::BackendConfig;
use crate::error::{BackendError, Result};
use crate::http::{build_client, read_body};
use crate::types::{
    parse_single_task, parse_task_list, rejection_message, CreateTaskBody, SensorPayload,
    TaskRecord, UpdateTaskBody,
};
use tracing::debug;
use url::Url;

/// Client for the spreadsheet-backed task store and the sensor endpoint.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    config: BackendConfig,
}

impl BackendClient {
    /// Validate `config` and build a client for it.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Config`] for invalid settings, or
    /// [`BackendError::Http`] if the HTTP client cannot be built.
    pub fn new(config: BackendConfig) -> Result<Self> {
        config.validate()?;
        let http = build_client(&config)?;
        Ok(Self { http, config })
    }

    /// The configuration this client was built with.
    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// Fetch every task.
    pub async fn list_tasks(&self) -> Result<Vec<TaskRecord>> {
        let url = self.exec_url(&[])?;
        debug!("listing tasks");
        let body = read_body(self.http.get(url).send().await?).await?;
        parse_task_list(&body)
    }

    /// Fetch a single task by id. `Ok(None)` when the backend has no such row.
    pub async fn get_task(&self, id: &str) -> Result<Option<TaskRecord>> {
        let url = self.exec_url(&[("getBy", "id"), ("id", id)])?;
        let body = read_body(self.http.get(url).send().await?).await?;
        parse_single_task(&body)
    }

    /// Fetch tasks whose schedule falls between `start` and `end`
    /// (inclusive, backend-defined string comparison).
    pub async fn tasks_by_date(&self, start: &str, end: &str) -> Result<Vec<TaskRecord>> {
        let url = self.exec_url(&[("getBy", "date"), ("start", start), ("end", end)])?;
        let body = read_body(self.http.get(url).send().await?).await?;
        parse_task_list(&body)
    }

    /// Fetch tasks with the given status.
    pub async fn tasks_by_status(&self, status: &str) -> Result<Vec<TaskRecord>> {
        let url = self.exec_url(&[("getBy", "status"), ("status", status)])?;
        let body = read_body(self.http.get(url).send().await?).await?;
        parse_task_list(&body)
    }

    /// Create a task. Returns the stored row when the backend echoes it.
    pub async fn create_task(&self, title: &str, date: &str) -> Result<Option<TaskRecord>> {
        let url = self.exec_url(&[("action", "post")])?;
        let response = self
            .http
            .post(url)
            .json(&CreateTaskBody { title, date })
            .send()
            .await?;
        let body = read_body(response).await?;
        if let Some(message) = rejection_message(&body) {
            return Err(BackendError::Rejected(message));
        }
        // The echo is informational; an unrecognised body still means success.
        Ok(parse_single_task(&body).unwrap_or(None))
    }

    /// Overwrite a task's title, schedule and status.
    pub async fn update_task(&self, task: &TaskRecord) -> Result<()> {
        let url = self.exec_url(&[("action", "put")])?;
        let payload = UpdateTaskBody {
            id: &task.id,
            title: &task.title,
            date: &task.date,
            status: task.status.as_deref().unwrap_or(""),
        };
        let body = read_body(self.http.post(url).json(&payload).send().await?).await?;
        match rejection_message(&body) {
            Some(message) => Err(BackendError::Rejected(message)),
            None => Ok(()),
        }
    }

    /// Delete a task by id.
    ///
    /// The backend expects a `text/plain` body holding `{"id": <number>}`;
    /// non-numeric ids are sent as strings.
    pub async fn delete_task(&self, id: &str) -> Result<()> {
        let url = self.exec_url(&[("action", "delete")])?;
        let payload = match id.trim().parse::<i64>() {
            Ok(numeric) => serde_json::json!({ "id": numeric }),
            Err(_) => serde_json::json!({ "id": id }),
        };
        let response = self
            .http
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "text/plain")
            .body(payload.to_string())
            .send()
            .await?;
        let body = read_body(response).await?;
        match rejection_message(&body) {
            Some(message) => Err(BackendError::Rejected(message)),
            None => Ok(()),
        }
    }

    /// Fetch the latest sensor readings.
    pub async fn fetch_sensors(&self) -> Result<SensorPayload> {
        let Some(sensor_url) = self.config.sensor_url.as_deref() else {
            return Err(BackendError::Config("sensor_url is not configured".into()));
        };
        let url = Url::parse(sensor_url.trim())
            .map_err(|e| BackendError::Config(format!("sensor_url is not a valid URL: {e}")))?;
        let body = read_body(self.http.get(url).send().await?).await?;
        serde_json::from_str(&body)
            .map_err(|e| BackendError::Parse(format!("sensor body is not a JSON object: {e}")))
    }

    fn exec_url(&self, query: &[(&str, &str)]) -> Result<Url> {
        let base = self.config.base_url.trim().trim_end_matches('/');
        let key = self.config.api_key.trim().trim_matches('/');
        let raw = if key.is_empty() {
            format!("{base}/exec")
        } else {
            format!("{base}/{key}/exec")
        };
        let mut url =
            Url::parse(&raw).map_err(|e| BackendError::Config(format!("invalid exec URL: {e}")))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query.iter().copied());
        }
        Ok(url)
    }
}
