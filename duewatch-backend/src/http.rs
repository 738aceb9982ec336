//! Shared HTTP client construction.

use crate::config::BackendConfig;
use crate::error::BackendError;
use std::time::Duration;

/// User-Agent sent with every backend request.
pub const USER_AGENT: &str = concat!("duewatch/", env!("CARGO_PKG_VERSION"));

/// Longest response body excerpt kept in error messages.
const BODY_EXCERPT_CHARS: usize = 200;

/// Build a [`reqwest::Client`] for backend requests.
///
/// The client follows redirects (spreadsheet script deployments answer
/// with a 302 to the real content host) and applies the configured timeout.
///
/// # Errors
///
/// Returns [`BackendError::Http`] if the client cannot be constructed.
pub fn build_client(config: &BackendConfig) -> Result<reqwest::Client, BackendError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .map_err(|e| BackendError::Http(format!("failed to build HTTP client: {e}")))
}

/// Read a response body, turning non-success statuses into
/// [`BackendError::Status`].
pub(crate) async fn read_body(response: reqwest::Response) -> Result<String, BackendError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(BackendError::Status {
            status: status.as_u16(),
            body: excerpt(&body),
        });
    }
    Ok(body)
}

fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= BODY_EXCERPT_CHARS {
        return trimmed.to_owned();
    }
    let mut out: String = trimmed.chars().take(BODY_EXCERPT_CHARS).collect();
    out.push('…');
    out
}
