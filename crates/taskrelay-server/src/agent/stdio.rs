//! Stdio bridge to a host agent process.
//!
//! Operations are written to the child's stdin as one JSON object per
//! line; events stream back on its stdout in the same shape and are fed
//! through the tolerant event parser. A child exit ends the event stream,
//! which the caller observes as the receiver closing.

use std::process::Stdio;

use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{ChildStdin, Command};
use tokio::sync::{Mutex, RwLock, mpsc};
use tracing::{debug, info, warn};

use async_trait::async_trait;
use taskrelay_core::agent::{AgentEvent, parse_line};

use super::{AgentError, TaskAgent};

/// Backpressure bound on the inbound agent event stream.
const EVENT_QUEUE_CAPACITY: usize = 128;

/// [`TaskAgent`] implementation backed by a spawned host process.
pub struct StdioAgent {
    stdin: Mutex<ChildStdin>,
    // The host process has no instructions query, so the last value written
    // is cached here and served for reads.
    custom_instructions: RwLock<String>,
}

impl StdioAgent {
    /// Spawn the host process and start pumping its stdout into the
    /// returned event channel.
    pub fn spawn(
        program: &str,
        args: &[String],
    ) -> Result<(Self, mpsc::Receiver<AgentEvent>), AgentError> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| AgentError::Unavailable("child stdin not captured".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| AgentError::Unavailable("child stdout not captured".into()))?;

        let (event_tx, event_rx) = mpsc::channel(EVENT_QUEUE_CAPACITY);
        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let line = line.trim();
                        if line.is_empty() {
                            continue;
                        }
                        match parse_line(line) {
                            Ok(event) => {
                                if event_tx.send(event).await.is_err() {
                                    debug!("Agent event receiver dropped, stopping pump");
                                    break;
                                }
                            }
                            Err(error) => {
                                warn!(%error, "Skipping unparseable agent event line");
                            }
                        }
                    }
                    Ok(None) => {
                        info!("Agent stdout closed");
                        break;
                    }
                    Err(error) => {
                        warn!(%error, "Agent stdout read failed");
                        break;
                    }
                }
            }
            // Reap the child so it does not linger as a zombie.
            match child.wait().await {
                Ok(status) => info!(%status, "Agent process exited"),
                Err(error) => warn!(%error, "Failed to await agent process"),
            }
        });

        info!(program, "Agent process spawned");
        Ok((
            Self {
                stdin: Mutex::new(stdin),
                custom_instructions: RwLock::new(String::new()),
            },
            event_rx,
        ))
    }

    async fn write_op(&self, op: Value) -> Result<(), AgentError> {
        let mut line = serde_json::to_string(&op)?;
        line.push('\n');
        let mut stdin = self.stdin.lock().await;
        stdin.write_all(line.as_bytes()).await?;
        stdin.flush().await?;
        Ok(())
    }
}

fn op_frame(op: &str, fields: &[(&str, Value)]) -> Value {
    let mut frame = json!({ "op": op });
    if let Some(map) = frame.as_object_mut() {
        for (key, value) in fields {
            if !value.is_null() {
                map.insert((*key).to_string(), value.clone());
            }
        }
    }
    frame
}

#[async_trait]
impl TaskAgent for StdioAgent {
    async fn start_task(&self, task: &str, images: Option<Vec<String>>) -> Result<(), AgentError> {
        self.write_op(op_frame(
            "startTask",
            &[("task", json!(task)), ("images", json!(images))],
        ))
        .await
    }

    async fn send_message(
        &self,
        message: &str,
        images: Option<Vec<String>>,
    ) -> Result<(), AgentError> {
        self.write_op(op_frame(
            "sendMessage",
            &[("message", json!(message)), ("images", json!(images))],
        ))
        .await
    }

    async fn press_primary_button(&self) -> Result<(), AgentError> {
        self.write_op(op_frame("pressPrimaryButton", &[])).await
    }

    async fn press_secondary_button(&self) -> Result<(), AgentError> {
        self.write_op(op_frame("pressSecondaryButton", &[])).await
    }

    async fn custom_instructions(&self) -> Result<String, AgentError> {
        Ok(self.custom_instructions.read().await.clone())
    }

    async fn set_custom_instructions(&self, text: &str) -> Result<(), AgentError> {
        self.write_op(op_frame(
            "setCustomInstructions",
            &[("text", json!(text))],
        ))
        .await?;
        *self.custom_instructions.write().await = text.to_string();
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn op_frames_match_bridge_shape() {
        let frame = op_frame("startTask", &[("task", json!("build it")), ("images", json!(null))]);
        assert_eq!(frame, json!({"op": "startTask", "task": "build it"}));

        let frame = op_frame(
            "sendMessage",
            &[
                ("message", json!("go on")),
                ("images", json!(["data:image/png;base64,AAAA"])),
            ],
        );
        assert_eq!(
            frame,
            json!({
                "op": "sendMessage",
                "message": "go on",
                "images": ["data:image/png;base64,AAAA"],
            })
        );

        assert_eq!(
            op_frame("pressPrimaryButton", &[]),
            json!({"op": "pressPrimaryButton"})
        );
    }

    #[tokio::test]
    async fn events_stream_from_child_stdout() {
        let line = r#"{"type":"action","action":"openFile"}"#;
        let (_agent, mut events) =
            StdioAgent::spawn("echo", &[line.to_string()]).expect("spawn echo");

        let event = events.recv().await.expect("one event");
        assert!(matches!(event, AgentEvent::Action(a) if a.action == "openFile"));
        // echo exits, so the stream ends.
        assert!(events.recv().await.is_none());
    }

    #[tokio::test]
    async fn custom_instructions_round_trip_through_cache() {
        let (agent, _events) = StdioAgent::spawn("cat", &[]).expect("spawn cat");
        assert_eq!(agent.custom_instructions().await.unwrap(), "");

        agent
            .set_custom_instructions("be terse")
            .await
            .expect("set instructions");
        assert_eq!(agent.custom_instructions().await.unwrap(), "be terse");
    }
}
