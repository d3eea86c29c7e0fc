//! Event types emitted by the external task agent.
//!
//! The agent reports state changes over a line-delimited JSON protocol.
//! The relay only reads these events and re-emits derived relay events;
//! it never mutates or replays them back to the agent.

use serde_json::Value;

/// Canonical event kinds from the task agent.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentEvent {
    /// Full-state snapshot: the ordered message history as the agent sees it.
    State(StateSnapshot),
    /// Streaming fragment of an in-progress agent message.
    PartialMessage(PartialMessage),
    /// Notification that the agent performed an action.
    Action(ActionNotice),
    /// Notification that the agent invoked a host operation.
    Invoke(InvokeNotice),
    /// Anything this version does not understand; kept for diagnostics.
    Unknown { kind: String, payload: Value },
}

/// Ordered history carried by a state snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StateSnapshot {
    pub messages: Vec<HistoryEntry>,
}

/// One entry of the agent's message history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub kind: EntryKind,
    /// Agent-defined sub-kind, e.g. `"followup"` for an ask entry.
    pub subkind: Option<String>,
    pub text: Option<String>,
    /// Whether this entry is still streaming.
    pub partial: bool,
}

/// Whether a history entry is agent output or an agent question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Say,
    Ask,
}

/// Incremental text delta for the message currently streaming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialMessage {
    pub text: String,
}

/// Structured action payload; passed through unmodified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionNotice {
    pub action: String,
}

/// Host-operation invocation notice, informational only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvokeNotice {
    pub invoke: String,
    pub text: Option<String>,
}
