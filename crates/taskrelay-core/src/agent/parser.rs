//! Parser for agent events arriving on the host bridge stream.
//!
//! Implements tolerant reader pattern: unknown fields ignored, unknown
//! kinds preserved as `AgentEvent::Unknown` for diagnostics.

use serde_json::Value;

use super::types::*;
use crate::error::{Error, Result};

/// Parse a single JSON line from the agent's event stream.
pub fn parse_line(line: &str) -> Result<AgentEvent> {
    let raw: Value = serde_json::from_str(line)?;
    parse_value(&raw)
}

/// Parse a JSON value into a canonical agent event.
pub fn parse_value(raw: &Value) -> Result<AgentEvent> {
    let kind = raw
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::AgentParse("Missing 'type' field".into()))?;

    match kind {
        "state" => Ok(AgentEvent::State(parse_state(raw))),
        "partialMessage" => Ok(AgentEvent::PartialMessage(PartialMessage {
            text: str_field(raw, "text"),
        })),
        "action" => Ok(AgentEvent::Action(ActionNotice {
            action: str_field(raw, "action"),
        })),
        "invoke" => Ok(AgentEvent::Invoke(InvokeNotice {
            invoke: str_field(raw, "invoke"),
            text: opt_str_field(raw, "text"),
        })),
        _ => Ok(AgentEvent::Unknown {
            kind: kind.to_string(),
            payload: raw.clone(),
        }),
    }
}

fn parse_state(raw: &Value) -> StateSnapshot {
    let messages = raw
        .get("messages")
        .and_then(Value::as_array)
        .map(|arr| arr.iter().filter_map(parse_history_entry).collect())
        .unwrap_or_default();

    StateSnapshot { messages }
}

fn parse_history_entry(entry: &Value) -> Option<HistoryEntry> {
    let kind = match entry.get("kind").and_then(Value::as_str)? {
        "say" => EntryKind::Say,
        "ask" => EntryKind::Ask,
        // Entries this version cannot classify are skipped, not fatal.
        _ => return None,
    };

    Some(HistoryEntry {
        kind,
        subkind: opt_str_field(entry, "subkind"),
        text: opt_str_field(entry, "text"),
        partial: entry
            .get("partial")
            .and_then(Value::as_bool)
            .unwrap_or(false),
    })
}

fn str_field(raw: &Value, field: &str) -> String {
    raw.get(field)
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string()
}

fn opt_str_field(raw: &Value, field: &str) -> Option<String> {
    raw.get(field).and_then(Value::as_str).map(String::from)
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parse_state_snapshot() {
        let json = r#"{"type":"state","messages":[
            {"kind":"say","subkind":"text","text":"working on it","partial":true},
            {"kind":"ask","subkind":"followup","text":"which one?"}
        ]}"#;
        let event = parse_line(json).unwrap();
        let AgentEvent::State(state) = event else {
            panic!("expected state snapshot");
        };
        assert_eq!(state.messages.len(), 2);
        assert_eq!(state.messages[0].kind, EntryKind::Say);
        assert!(state.messages[0].partial);
        assert_eq!(state.messages[1].kind, EntryKind::Ask);
        assert_eq!(state.messages[1].subkind.as_deref(), Some("followup"));
        assert!(!state.messages[1].partial);
    }

    #[test]
    fn parse_partial_message() {
        let json = r#"{"type":"partialMessage","text":"chunk"}"#;
        assert_eq!(
            parse_line(json).unwrap(),
            AgentEvent::PartialMessage(PartialMessage {
                text: "chunk".into()
            })
        );
    }

    #[test]
    fn parse_action_and_invoke() {
        let action = parse_line(r#"{"type":"action","action":"openFile"}"#).unwrap();
        assert!(matches!(action, AgentEvent::Action(a) if a.action == "openFile"));

        let invoke =
            parse_line(r#"{"type":"invoke","invoke":"sendMessage","text":"fyi"}"#).unwrap();
        let AgentEvent::Invoke(notice) = invoke else {
            panic!("expected invoke");
        };
        assert_eq!(notice.invoke, "sendMessage");
        assert_eq!(notice.text.as_deref(), Some("fyi"));
    }

    #[test]
    fn tolerant_reader_ignores_unknown_fields() {
        let json = r#"{"type":"state","messages":[],"extra":"ignored"}"#;
        assert!(parse_line(json).is_ok());
    }

    #[test]
    fn unknown_entry_kinds_are_skipped() {
        let json = r#"{"type":"state","messages":[
            {"kind":"future","text":"?"},
            {"kind":"say","text":"kept"}
        ]}"#;
        let AgentEvent::State(state) = parse_line(json).unwrap() else {
            panic!("expected state snapshot");
        };
        assert_eq!(state.messages.len(), 1);
        assert_eq!(state.messages[0].text.as_deref(), Some("kept"));
    }

    #[test]
    fn unknown_type_returns_unknown_event() {
        let event = parse_line(r#"{"type":"futureEvent","data":"something"}"#).unwrap();
        assert!(matches!(event, AgentEvent::Unknown { kind, .. } if kind == "futureEvent"));
    }

    #[test]
    fn missing_type_is_an_error() {
        assert!(parse_line(r#"{"messages":[]}"#).is_err());
    }
}
