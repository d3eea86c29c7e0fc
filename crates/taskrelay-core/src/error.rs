//! Error types for the TaskRelay core library.

use thiserror::Error;

/// Result type alias using the TaskRelay core Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for TaskRelay operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Agent event parsing error
    #[error("Failed to parse agent event: {0}")]
    AgentParse(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
