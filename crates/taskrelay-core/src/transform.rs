//! Agent event to relay event transformation.
//!
//! Classifies one inbound agent event and derives the relay events to
//! broadcast. Stateless: the decision-pending latch lives in the relay
//! server, which suppresses repeated `PromptForDecision` emissions while
//! a decision is already outstanding.

use tracing::debug;

use taskrelay_proto::RelayEvent;

use crate::agent::{AgentEvent, EntryKind, HistoryEntry, StateSnapshot};
use crate::sanitize::sanitize;

/// Ask sub-kinds that block the agent on a binary decision.
const DECISION_ASK_KINDS: &[&str] = &["plan_mode_respond", "followup"];

/// Derive zero or more relay events from an agent event.
pub fn transform(event: &AgentEvent) -> Vec<RelayEvent> {
    match event {
        AgentEvent::State(state) => transform_state(state),
        AgentEvent::PartialMessage(partial) => {
            if partial.text.is_empty() {
                return Vec::new();
            }
            let text = sanitize(&partial.text);
            if text.is_empty() {
                Vec::new()
            } else {
                // Partiality is explicit here, so no ResponseEnd.
                vec![RelayEvent::Response { response: text }]
            }
        }
        AgentEvent::Action(notice) => vec![RelayEvent::Action {
            action: notice.action.clone(),
        }],
        AgentEvent::Invoke(notice) => {
            let has_text = notice.text.as_deref().is_some_and(|t| !t.is_empty());
            if notice.invoke == "sendMessage" && has_text {
                vec![RelayEvent::Invoke {
                    invoke: notice.invoke.clone(),
                    text: notice.text.clone(),
                }]
            } else {
                Vec::new()
            }
        }
        AgentEvent::Unknown { kind, .. } => {
            debug!(kind, "Unknown agent event kind");
            Vec::new()
        }
    }
}

/// Snapshots are ground truth for the agent's history, but only the most
/// recent `say` entry is considered so repeated snapshots do not replay
/// the whole history at clients on every update.
fn transform_state(state: &StateSnapshot) -> Vec<RelayEvent> {
    let mut events = Vec::new();

    let latest_say = state
        .messages
        .iter()
        .rev()
        .find(|entry| entry.kind == EntryKind::Say && has_text(entry));

    if let Some(entry) = latest_say {
        let text = sanitize(entry.text.as_deref().unwrap_or_default());
        if !text.is_empty() {
            events.push(RelayEvent::Response { response: text });
            if !entry.partial {
                events.push(RelayEvent::ResponseEnd);
            }
        }
    }

    if state.messages.iter().any(signals_decision) {
        events.push(RelayEvent::PromptForDecision);
    }

    events
}

fn has_text(entry: &HistoryEntry) -> bool {
    entry.text.as_deref().is_some_and(|t| !t.is_empty())
}

/// One OR'd "decision pending" signal: a blocking ask entry, or a say
/// entry whose raw text still carries question/options directive markers.
fn signals_decision(entry: &HistoryEntry) -> bool {
    match entry.kind {
        EntryKind::Ask => entry
            .subkind
            .as_deref()
            .is_some_and(|k| DECISION_ASK_KINDS.contains(&k)),
        EntryKind::Say => entry
            .text
            .as_deref()
            .is_some_and(|t| has_directive_markers(t)),
    }
}

fn has_directive_markers(text: &str) -> bool {
    let has_question = text.contains("\"question\"") || text.contains("'question'");
    let has_options = text.contains("\"options\"") || text.contains("'options'");
    has_question && has_options
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::agent::{ActionNotice, InvokeNotice, PartialMessage};

    fn say(text: &str, partial: bool) -> HistoryEntry {
        HistoryEntry {
            kind: EntryKind::Say,
            subkind: None,
            text: Some(text.to_string()),
            partial,
        }
    }

    fn ask(subkind: &str) -> HistoryEntry {
        HistoryEntry {
            kind: EntryKind::Ask,
            subkind: Some(subkind.to_string()),
            text: None,
            partial: false,
        }
    }

    fn snapshot(messages: Vec<HistoryEntry>) -> AgentEvent {
        AgentEvent::State(StateSnapshot { messages })
    }

    #[test]
    fn terminal_say_with_directive_emits_chunk_end_and_prompt() {
        let raw = r#"Hello {"question":"proceed?","options":["yes"]} world"#;
        let events = transform(&snapshot(vec![say(raw, false)]));
        assert_eq!(
            events,
            vec![
                RelayEvent::Response {
                    response: "Hello  world".into()
                },
                RelayEvent::ResponseEnd,
                RelayEvent::PromptForDecision,
            ]
        );
    }

    #[test]
    fn partial_say_emits_chunk_without_end() {
        let events = transform(&snapshot(vec![say("streaming...", true)]));
        assert_eq!(
            events,
            vec![RelayEvent::Response {
                response: "streaming...".into()
            }]
        );
    }

    #[test]
    fn only_most_recent_say_considered() {
        let events = transform(&snapshot(vec![
            say("old answer", false),
            say("new answer", false),
        ]));
        assert_eq!(
            events,
            vec![
                RelayEvent::Response {
                    response: "new answer".into()
                },
                RelayEvent::ResponseEnd,
            ]
        );
    }

    #[test]
    fn blocking_ask_kinds_signal_decision() {
        for kind in ["plan_mode_respond", "followup"] {
            let events = transform(&snapshot(vec![ask(kind)]));
            assert_eq!(events, vec![RelayEvent::PromptForDecision]);
        }
        // Non-blocking ask kinds do not.
        assert!(transform(&snapshot(vec![ask("resume_task")])).is_empty());
    }

    #[test]
    fn directive_only_say_suppresses_chunk_but_signals_decision() {
        let raw = r#"{"question":"apply?","options":["yes","no"]}"#;
        let events = transform(&snapshot(vec![say(raw, false)]));
        assert_eq!(events, vec![RelayEvent::PromptForDecision]);
    }

    #[test]
    fn empty_snapshot_emits_nothing() {
        assert!(transform(&snapshot(Vec::new())).is_empty());
    }

    #[test]
    fn partial_message_delta_sanitized() {
        let event = AgentEvent::PartialMessage(PartialMessage {
            text: "a}{b".into(),
        });
        assert_eq!(
            transform(&event),
            vec![RelayEvent::Response {
                response: "a b".into()
            }]
        );

        let empty = AgentEvent::PartialMessage(PartialMessage { text: String::new() });
        assert!(transform(&empty).is_empty());
    }

    #[test]
    fn action_passes_through_unsanitized() {
        let event = AgentEvent::Action(ActionNotice {
            action: r#"{"tool":"browser"}"#.into(),
        });
        assert_eq!(
            transform(&event),
            vec![RelayEvent::Action {
                action: r#"{"tool":"browser"}"#.into()
            }]
        );
    }

    #[test]
    fn only_send_message_invokes_pass_through() {
        let keep = AgentEvent::Invoke(InvokeNotice {
            invoke: "sendMessage".into(),
            text: Some("note".into()),
        });
        assert_eq!(transform(&keep).len(), 1);

        let no_text = AgentEvent::Invoke(InvokeNotice {
            invoke: "sendMessage".into(),
            text: None,
        });
        assert!(transform(&no_text).is_empty());

        let other = AgentEvent::Invoke(InvokeNotice {
            invoke: "openSettings".into(),
            text: Some("note".into()),
        });
        assert!(transform(&other).is_empty());
    }

    #[test]
    fn unknown_events_emit_nothing() {
        let event = AgentEvent::Unknown {
            kind: "future".into(),
            payload: serde_json::Value::Null,
        };
        assert!(transform(&event).is_empty());
    }
}
