//! TaskRelay wire protocol.
//!
//! Both directions use newline-free JSON text frames, one event or command
//! per frame, tagged on a `"type"` field. Unknown inbound tags are surfaced
//! as a distinct error variant carrying the tag so the server can answer
//! with a targeted error event instead of dropping the connection.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Event pushed from the relay server to connected clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RelayEvent {
    /// Connection lifecycle notice (e.g. `"connected"`).
    #[serde(rename = "status")]
    Status { status: String },

    /// A chunk of sanitized agent response text. A turn may produce many.
    #[serde(rename = "response")]
    Response { response: String },

    /// Closes the current sequence of response chunks for a turn.
    #[serde(rename = "responseEnd")]
    ResponseEnd,

    /// The agent is blocked awaiting a binary yes/no decision.
    #[serde(rename = "promptForDecision")]
    PromptForDecision,

    /// Pass-through agent action notification (structured, not sanitized).
    #[serde(rename = "action")]
    Action { action: String },

    /// Pass-through invoke notification, informational only.
    #[serde(rename = "invoke")]
    Invoke {
        invoke: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text: Option<String>,
    },

    /// Failure report addressed to one client or broadcast.
    #[serde(rename = "error")]
    Error { error: String },

    /// Keepalive reply; `timestamp` is Unix milliseconds.
    #[serde(rename = "pong")]
    Pong { timestamp: u64 },
}

impl RelayEvent {
    /// Serialize to a single-line JSON text frame.
    pub fn to_frame(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Command sent by a client over the WebSocket control connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientCommand {
    #[serde(rename = "ping")]
    Ping,

    #[serde(rename = "startTask")]
    StartTask {
        task: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        images: Option<Vec<String>>,
    },

    #[serde(rename = "sendMessage")]
    SendMessage {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        images: Option<Vec<String>>,
    },

    #[serde(rename = "pressPrimaryButton")]
    PressPrimaryButton,

    #[serde(rename = "pressSecondaryButton")]
    PressSecondaryButton,
}

const COMMAND_TAGS: &[&str] = &[
    "ping",
    "startTask",
    "sendMessage",
    "pressPrimaryButton",
    "pressSecondaryButton",
];

impl ClientCommand {
    /// Serialize to a single-line JSON text frame.
    pub fn to_frame(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse a text frame into a command.
    ///
    /// Distinguishes malformed JSON / missing fields from a well-formed
    /// frame carrying an unknown `type` tag.
    pub fn parse(frame: &str) -> Result<Self, CommandParseError> {
        let raw: Value =
            serde_json::from_str(frame).map_err(|e| CommandParseError::Malformed(e.to_string()))?;

        let tag = raw
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| CommandParseError::Malformed("missing 'type' field".into()))?;

        if !COMMAND_TAGS.contains(&tag) {
            return Err(CommandParseError::UnknownType(tag.to_string()));
        }

        serde_json::from_value(raw).map_err(|e| CommandParseError::Malformed(e.to_string()))
    }
}

/// Reasons an inbound command frame is rejected.
#[derive(Debug, thiserror::Error)]
pub enum CommandParseError {
    #[error("Invalid message: {0}")]
    Malformed(String),

    #[error("Unknown message type: {0}")]
    UnknownType(String),
}
