use std::time::Duration;
use thiserror::Error;

/// All possible errors in the task board
#[derive(Error, Debug)]
pub enum TaskError {
    #[error(
        "No MongoDB connection configuration found. Set MONGODB_USERNAME, MONGODB_PASSWORD and MONGODB_HOSTNAME, or MONGODB_URI, or MONGODB_HOSTNAME"
    )]
    NoConnectionMethod,

    #[error("Invalid MONGODB_PORT: {0}")]
    InvalidPort(String),

    #[error("Invalid TASKBOARD_PING_TIMEOUT_MS: {0}")]
    InvalidTimeout(String),

    #[error("Task title cannot be empty")]
    EmptyTitle,

    #[error("Task {0} not found")]
    TaskNotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("Database did not respond within {0:?}")]
    Timeout(Duration),

    #[error("Stored task is unreadable: {0}")]
    Corrupt(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Coarse classification the calling layer maps to user-facing responses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Fatal at boot
    Config,
    /// Caller re-prompts, state unchanged
    Validation,
    /// Missing or malformed identifier
    NotFound,
    /// Connectivity lost, timeout or driver failure
    Infrastructure,
}

impl TaskError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TaskError::NoConnectionMethod
            | TaskError::InvalidPort(_)
            | TaskError::InvalidTimeout(_) => ErrorKind::Config,
            TaskError::EmptyTitle => ErrorKind::Validation,
            TaskError::TaskNotFound(_) => ErrorKind::NotFound,
            TaskError::Database(_)
            | TaskError::Timeout(_)
            | TaskError::Corrupt(_)
            | TaskError::Json(_) => ErrorKind::Infrastructure,
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, TaskError>;
