//! Backend connection settings.
//!
//! The task backend is addressed as `{base_url}/{api_key}/exec`; the sensor
//! endpoint is a separate absolute URL.

use crate::error::BackendError;
use serde::{Deserialize, Serialize};

/// Connection settings for [`crate::BackendClient`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the task backend, without a trailing `/exec`.
    pub base_url: String,
    /// Deployment key inserted as a path segment before `/exec`.
    /// Empty means the base URL already points at the deployment.
    pub api_key: String,
    /// Absolute URL returning the latest sensor readings as JSON.
    pub sensor_url: Option<String>,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_owned(),
            api_key: String::new(),
            sensor_url: None,
            timeout_secs: 15,
        }
    }
}

impl BackendConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Config`] when the base URL is blank or does not
    /// parse, or the timeout is zero.
    pub fn validate(&self) -> Result<(), BackendError> {
        let base = self.base_url.trim();
        if base.is_empty() {
            return Err(BackendError::Config("base_url must not be empty".into()));
        }
        url::Url::parse(base)
            .map_err(|e| BackendError::Config(format!("base_url is not a valid URL: {e}")))?;
        if self.timeout_secs == 0 {
            return Err(BackendError::Config("timeout_secs must be > 0".into()));
        }
        if let Some(sensor_url) = &self.sensor_url {
            url::Url::parse(sensor_url.trim())
                .map_err(|e| BackendError::Config(format!("sensor_url is not a valid URL: {e}")))?;
        }
        Ok(())
    }
}
