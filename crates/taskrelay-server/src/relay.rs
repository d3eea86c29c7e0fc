//! Relay orchestration: agent events in, client commands out.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, warn};

use taskrelay_core::agent::AgentEvent;
use taskrelay_core::transform;
use taskrelay_proto::{ClientCommand, RelayEvent};

use crate::agent::{AgentError, TaskAgent};
use crate::registry::{ClientConnection, ConnectionRegistry};

/// Bridges the agent event stream to the connection registry and routes
/// client commands to the agent.
///
/// Holds the single decision-pending latch: `PromptForDecision` is
/// broadcast once per outstanding decision, and any command that answers
/// or supersedes the decision clears it.
pub struct RelayServer {
    registry: Arc<ConnectionRegistry>,
    agent: Arc<dyn TaskAgent>,
    decision_pending: AtomicBool,
}

impl RelayServer {
    pub fn new(registry: Arc<ConnectionRegistry>, agent: Arc<dyn TaskAgent>) -> Self {
        Self {
            registry,
            agent,
            decision_pending: AtomicBool::new(false),
        }
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Transform an agent event and broadcast the results, deduplicating
    /// repeated decision prompts while one is already outstanding.
    pub async fn handle_agent_event(&self, event: AgentEvent) {
        for relay_event in transform(&event) {
            if matches!(relay_event, RelayEvent::PromptForDecision)
                && self.decision_pending.swap(true, Ordering::SeqCst)
            {
                debug!("Decision already pending, suppressing repeat prompt");
                continue;
            }
            self.registry.broadcast(relay_event).await;
        }
    }

    /// Parse and execute one inbound client frame. Failures are answered
    /// on the sender's own connection, never broadcast.
    pub async fn handle_command(&self, conn: &ClientConnection, frame: &str) {
        let command = match ClientCommand::parse(frame) {
            Ok(command) => command,
            Err(error) => {
                warn!(client_id = conn.id, %error, "Rejected inbound frame");
                conn.send(RelayEvent::Error {
                    error: error.to_string(),
                });
                return;
            }
        };

        let result = match command {
            ClientCommand::Ping => {
                conn.send(RelayEvent::Pong {
                    timestamp: unix_millis(),
                });
                return;
            }
            ClientCommand::StartTask { task, images } => self.start_task(&task, images).await,
            ClientCommand::SendMessage { message, images } => {
                self.send_message(&message, images).await
            }
            ClientCommand::PressPrimaryButton => self.press_primary_button().await,
            ClientCommand::PressSecondaryButton => self.press_secondary_button().await,
        };

        if let Err(error) = result {
            warn!(client_id = conn.id, %error, "Agent operation failed");
            conn.send(RelayEvent::Error {
                error: error.to_string(),
            });
        }
    }

    pub async fn start_task(
        &self,
        task: &str,
        images: Option<Vec<String>>,
    ) -> Result<(), AgentError> {
        self.clear_decision();
        self.agent.start_task(task, images).await
    }

    pub async fn send_message(
        &self,
        message: &str,
        images: Option<Vec<String>>,
    ) -> Result<(), AgentError> {
        self.clear_decision();
        self.agent.send_message(message, images).await
    }

    pub async fn press_primary_button(&self) -> Result<(), AgentError> {
        self.clear_decision();
        self.agent.press_primary_button().await
    }

    pub async fn press_secondary_button(&self) -> Result<(), AgentError> {
        self.clear_decision();
        self.agent.press_secondary_button().await
    }

    pub async fn custom_instructions(&self) -> Result<String, AgentError> {
        self.agent.custom_instructions().await
    }

    pub async fn set_custom_instructions(&self, text: &str) -> Result<(), AgentError> {
        self.agent.set_custom_instructions(text).await
    }

    fn clear_decision(&self) {
        self.decision_pending.store(false, Ordering::SeqCst);
    }
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use tokio::sync::Mutex;
    use tokio::sync::mpsc;

    use taskrelay_core::agent::{EntryKind, HistoryEntry, StateSnapshot};

    use crate::registry::CLIENT_QUEUE_CAPACITY;

    #[derive(Default)]
    struct RecordingAgent {
        calls: Mutex<Vec<String>>,
        fail: bool,
    }

    impl RecordingAgent {
        async fn record(&self, call: &str) -> Result<(), AgentError> {
            self.calls.lock().await.push(call.to_string());
            if self.fail {
                Err(AgentError::Unavailable("gone".into()))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl TaskAgent for RecordingAgent {
        async fn start_task(
            &self,
            task: &str,
            _images: Option<Vec<String>>,
        ) -> Result<(), AgentError> {
            self.record(&format!("start_task:{task}")).await
        }

        async fn send_message(
            &self,
            message: &str,
            _images: Option<Vec<String>>,
        ) -> Result<(), AgentError> {
            self.record(&format!("send_message:{message}")).await
        }

        async fn press_primary_button(&self) -> Result<(), AgentError> {
            self.record("press_primary").await
        }

        async fn press_secondary_button(&self) -> Result<(), AgentError> {
            self.record("press_secondary").await
        }

        async fn custom_instructions(&self) -> Result<String, AgentError> {
            Ok("instructions".into())
        }

        async fn set_custom_instructions(&self, _text: &str) -> Result<(), AgentError> {
            self.record("set_instructions").await
        }
    }

    fn relay_with(agent: RecordingAgent) -> (Arc<RelayServer>, Arc<RecordingAgent>) {
        let agent = Arc::new(agent);
        let registry = Arc::new(ConnectionRegistry::new(50));
        let relay = Arc::new(RelayServer::new(registry, Arc::clone(&agent) as _));
        (relay, agent)
    }

    async fn connect(relay: &RelayServer) -> (ClientConnection, mpsc::Receiver<RelayEvent>) {
        let (tx, mut rx) = mpsc::channel(CLIENT_QUEUE_CAPACITY);
        let conn = relay.registry().register(tx).await;
        // Discard the welcome status.
        let _ = rx.recv().await;
        (conn, rx)
    }

    fn blocking_ask() -> AgentEvent {
        AgentEvent::State(StateSnapshot {
            messages: vec![HistoryEntry {
                kind: EntryKind::Ask,
                subkind: Some("followup".into()),
                text: None,
                partial: false,
            }],
        })
    }

    async fn drain(rx: &mut mpsc::Receiver<RelayEvent>) -> Vec<RelayEvent> {
        let mut out = Vec::new();
        while let Ok(event) = rx.try_recv() {
            out.push(event);
        }
        out
    }

    #[tokio::test]
    async fn prompt_for_decision_emitted_once_while_pending() {
        let (relay, _) = relay_with(RecordingAgent::default());
        let (_conn, mut rx) = connect(&relay).await;

        relay.handle_agent_event(blocking_ask()).await;
        relay.handle_agent_event(blocking_ask()).await;

        assert_eq!(drain(&mut rx).await, vec![RelayEvent::PromptForDecision]);
    }

    #[tokio::test]
    async fn button_press_rearms_the_decision_latch() {
        let (relay, agent) = relay_with(RecordingAgent::default());
        let (conn, mut rx) = connect(&relay).await;

        relay.handle_agent_event(blocking_ask()).await;
        relay
            .handle_command(&conn, r#"{"type":"pressPrimaryButton"}"#)
            .await;
        relay.handle_agent_event(blocking_ask()).await;

        assert_eq!(
            drain(&mut rx).await,
            vec![RelayEvent::PromptForDecision, RelayEvent::PromptForDecision]
        );
        assert_eq!(*agent.calls.lock().await, vec!["press_primary"]);
    }

    #[tokio::test]
    async fn commands_dispatch_to_the_agent() {
        let (relay, agent) = relay_with(RecordingAgent::default());
        let (conn, mut rx) = connect(&relay).await;

        relay
            .handle_command(&conn, r#"{"type":"startTask","task":"build"}"#)
            .await;
        relay
            .handle_command(&conn, r#"{"type":"sendMessage","message":"go"}"#)
            .await;
        relay
            .handle_command(&conn, r#"{"type":"pressSecondaryButton"}"#)
            .await;

        assert_eq!(
            *agent.calls.lock().await,
            vec!["start_task:build", "send_message:go", "press_secondary"]
        );
        assert!(drain(&mut rx).await.is_empty());
    }

    #[tokio::test]
    async fn ping_answers_with_pong() {
        let (relay, _) = relay_with(RecordingAgent::default());
        let (conn, mut rx) = connect(&relay).await;

        relay.handle_command(&conn, r#"{"type":"ping"}"#).await;

        let events = drain(&mut rx).await;
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], RelayEvent::Pong { timestamp } if timestamp > 0));
    }

    #[tokio::test]
    async fn unknown_command_errors_only_the_sender() {
        let (relay, _) = relay_with(RecordingAgent::default());
        let (sender, mut sender_rx) = connect(&relay).await;
        let (_other, mut other_rx) = connect(&relay).await;

        relay.handle_command(&sender, r#"{"type":"bogus"}"#).await;

        assert_eq!(
            drain(&mut sender_rx).await,
            vec![RelayEvent::Error {
                error: "Unknown message type: bogus".into()
            }]
        );
        assert!(drain(&mut other_rx).await.is_empty());
    }

    #[tokio::test]
    async fn malformed_frame_errors_the_sender() {
        let (relay, _) = relay_with(RecordingAgent::default());
        let (conn, mut rx) = connect(&relay).await;

        relay.handle_command(&conn, "not json").await;

        let events = drain(&mut rx).await;
        assert_eq!(events.len(), 1);
        assert!(
            matches!(&events[0], RelayEvent::Error { error } if error.starts_with("Invalid message:"))
        );
    }

    #[tokio::test]
    async fn agent_failure_reported_to_the_caller() {
        let (relay, _) = relay_with(RecordingAgent {
            fail: true,
            ..RecordingAgent::default()
        });
        let (conn, mut rx) = connect(&relay).await;

        relay
            .handle_command(&conn, r#"{"type":"startTask","task":"build"}"#)
            .await;

        assert_eq!(
            drain(&mut rx).await,
            vec![RelayEvent::Error {
                error: "Agent unavailable: gone".into()
            }]
        );
    }
}
