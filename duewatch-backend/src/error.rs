//! Error types for the duewatch-backend crate.
//!
//! Messages never include the API key; URLs are reported without their
//! path so the key segment does not leak into logs.

/// Errors that can occur while talking to the task backend or the sensor
/// endpoint.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The request could not be sent or the response body could not be read.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The backend answered with a non-success status code.
    #[error("backend returned status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, truncated.
        body: String,
    },

    /// The response body was not in any accepted shape.
    #[error("parse error: {0}")]
    Parse(String),

    /// Invalid client configuration.
    #[error("config error: {0}")]
    Config(String),

    /// The backend accepted the request but reported a failure in the body.
    #[error("backend rejected request: {0}")]
    Rejected(String),
}

impl From<reqwest::Error> for BackendError {
    fn from(e: reqwest::Error) -> Self {
        // `without_url` keeps the API key path segment out of the message.
        BackendError::Http(e.without_url().to_string())
    }
}

/// Convenience type alias for backend results.
pub type Result<T> = std::result::Result<T, BackendError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_status() {
        let err = BackendError::Status {
            status: 503,
            body: "unavailable".into(),
        };
        assert_eq!(err.to_string(), "backend returned status 503: unavailable");
    }

    #[test]
    fn display_rejected() {
        let err = BackendError::Rejected("row not found".into());
        assert_eq!(err.to_string(), "backend rejected request: row not found");
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<BackendError>();
    }
}
