//! Error types for the duewatch dashboard.

/// Top-level error type for the dashboard engine and its collaborators.
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    /// A task's schedule string matched none of the accepted shapes.
    #[error("due time unparseable: {0:?}")]
    DueTimeUnparseable(String),

    /// Task list or sensor refresh failed. Previous state is kept.
    #[error("fetch error: {0}")]
    Fetch(String),

    /// A task delete request failed.
    #[error("delete error: {0}")]
    Delete(String),

    /// A task failed validation before it was sent to the backend.
    #[error("invalid task: {0}")]
    InvalidTask(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The dashboard loop is gone or a reply channel closed.
    #[error("channel error: {0}")]
    Channel(String),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, DashboardError>;
