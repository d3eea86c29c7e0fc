//! Contract between the relay and the task agent it fronts.

mod stdio;

pub use stdio::StdioAgent;

use async_trait::async_trait;

/// Failures surfaced by agent operations.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("Agent unavailable: {0}")]
    Unavailable(String),

    #[error("Agent I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Agent serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Operations the relay can invoke on the agent it fronts.
///
/// Implementations must be safe to call concurrently; the relay invokes
/// them from WebSocket and HTTP handlers alike.
#[async_trait]
pub trait TaskAgent: Send + Sync {
    /// Begin a fresh task, discarding any in-flight turn.
    async fn start_task(&self, task: &str, images: Option<Vec<String>>) -> Result<(), AgentError>;

    /// Feed a follow-up message into the current task.
    async fn send_message(
        &self,
        message: &str,
        images: Option<Vec<String>>,
    ) -> Result<(), AgentError>;

    /// Answer an outstanding decision affirmatively.
    async fn press_primary_button(&self) -> Result<(), AgentError>;

    /// Answer an outstanding decision negatively.
    async fn press_secondary_button(&self) -> Result<(), AgentError>;

    /// Current custom instructions text, empty when unset.
    async fn custom_instructions(&self) -> Result<String, AgentError>;

    /// Replace the custom instructions text.
    async fn set_custom_instructions(&self, text: &str) -> Result<(), AgentError>;
}
