//! Wire types exchanged with the task backend and the sensor endpoint.
//!
//! The backend is a loosely typed spreadsheet script: ids arrive as strings
//! or numbers, lists may or may not be wrapped in `{"data": [...]}`, and
//! sensor channels may be missing or carry numeric strings. Everything here
//! is deliberately lenient on input and strict on output.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A task row as stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    /// Backend-assigned identifier.
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    /// Display title.
    #[serde(default, deserialize_with = "string_or_number")]
    pub title: String,
    /// Schedule in whatever shape the backend stored it.
    #[serde(default, deserialize_with = "string_or_number")]
    pub date: String,
    /// Free-form status column. Checkbox and numeric cells are kept as text.
    #[serde(
        default,
        deserialize_with = "lenient_status",
        skip_serializing_if = "Option::is_none"
    )]
    pub status: Option<String>,
}

/// Body of a create request.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct CreateTaskBody<'a> {
    pub title: &'a str,
    pub date: &'a str,
}

/// Body of an update request.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct UpdateTaskBody<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub date: &'a str,
    pub status: &'a str,
}

/// Latest sensor values. Missing or malformed channels are zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorPayload {
    /// Degrees Celsius.
    #[serde(default, deserialize_with = "lenient_f64")]
    pub temperature: f64,
    /// Relative humidity in percent.
    #[serde(default, deserialize_with = "lenient_f64")]
    pub humidity: f64,
    /// Light level in lumen.
    #[serde(default, alias = "light", deserialize_with = "lenient_f64")]
    pub lumen: f64,
    /// Particulate matter (PM2.5).
    #[serde(default, alias = "pm2.5", deserialize_with = "lenient_f64")]
    pub pm25: f64,
}

/// Parse a task list body: a bare array or an object with a `data` array.
pub(crate) fn parse_task_list(body: &str) -> crate::Result<Vec<TaskRecord>> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| crate::BackendError::Parse(format!("task list is not JSON: {e}")))?;
    task_list_from_value(value)
}

fn task_list_from_value(value: Value) -> crate::Result<Vec<TaskRecord>> {
    let rows = match value {
        Value::Array(rows) => rows,
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(rows)) => rows,
            Some(Value::Null) | None => Vec::new(),
            Some(other) => {
                return Err(crate::BackendError::Parse(format!(
                    "expected `data` to be an array, got {}",
                    kind_of(&other)
                )));
            }
        },
        other => {
            return Err(crate::BackendError::Parse(format!(
                "expected a task array, got {}",
                kind_of(&other)
            )));
        }
    };

    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        match serde_json::from_value::<TaskRecord>(row) {
            Ok(record) => records.push(record),
            Err(e) => tracing::warn!("skipping malformed task row: {e}"),
        }
    }
    Ok(records)
}

/// Parse a body that carries at most one task: a bare record, a list, or a
/// wrapped list. Returns the first record found.
pub(crate) fn parse_single_task(body: &str) -> crate::Result<Option<TaskRecord>> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| crate::BackendError::Parse(format!("task body is not JSON: {e}")))?;

    let is_record = matches!(&value, Value::Object(map) if map.contains_key("id"));
    if is_record {
        return serde_json::from_value(value)
            .map(Some)
            .map_err(|e| crate::BackendError::Parse(format!("malformed task: {e}")));
    }

    Ok(task_list_from_value(value)?.into_iter().next())
}

/// Detect an in-body failure report (`{"success": false}` or `{"error": ...}`).
pub(crate) fn rejection_message(body: &str) -> Option<String> {
    let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) else {
        return None;
    };
    if let Some(Value::String(error)) = map.get("error") {
        return Some(error.clone());
    }
    if map.get("success") == Some(&Value::Bool(false)) {
        let message = map
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("request failed");
        return Some(message.to_owned());
    }
    None
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok(String::new()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a string or number, got {}",
            kind_of(&other)
        ))),
    }
}

fn lenient_status<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(parsed.filter(|v| v.is_finite()).unwrap_or(0.0))
}
