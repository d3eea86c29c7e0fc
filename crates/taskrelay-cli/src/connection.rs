//! WebSocket connection plumbing.
//!
//! Splits the socket into a writer task fed by a command channel and a
//! reader task that decodes relay events onto an event channel. Frames
//! the client cannot decode are logged and dropped, never fatal.

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, warn};

use taskrelay_proto::{ClientCommand, RelayEvent};

const COMMAND_QUEUE_CAPACITY: usize = 16;
const EVENT_QUEUE_CAPACITY: usize = 64;

#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("WebSocket connect failed: {0}")]
    Connect(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Connection closed")]
    Closed,
}

/// Command side of an established relay connection.
pub struct Connection {
    cmd_tx: mpsc::Sender<ClientCommand>,
}

impl Connection {
    /// Connect to the relay and return the command handle plus the inbound
    /// event stream. The event receiver closing means the server went away.
    pub async fn connect(
        url: &str,
    ) -> Result<(Self, mpsc::Receiver<RelayEvent>), ConnectionError> {
        let (socket, _response) = connect_async(url).await?;
        let (mut ws_tx, mut ws_rx) = socket.split();

        let (cmd_tx, mut cmd_rx) = mpsc::channel::<ClientCommand>(COMMAND_QUEUE_CAPACITY);
        tokio::spawn(async move {
            while let Some(command) = cmd_rx.recv().await {
                match command.to_frame() {
                    Ok(frame) => {
                        if ws_tx.send(Message::Text(frame.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(error) => warn!(%error, "Failed to serialize command"),
                }
            }
            let _ = ws_tx.send(Message::Close(None)).await;
        });

        let (event_tx, event_rx) = mpsc::channel::<RelayEvent>(EVENT_QUEUE_CAPACITY);
        tokio::spawn(async move {
            while let Some(result) = ws_rx.next().await {
                match result {
                    Ok(Message::Text(text)) => {
                        match serde_json::from_str::<RelayEvent>(text.as_str()) {
                            Ok(event) => {
                                if event_tx.send(event).await.is_err() {
                                    break;
                                }
                            }
                            Err(error) => {
                                warn!(%error, "Ignoring undecodable server frame");
                            }
                        }
                    }
                    Ok(Message::Close(_)) => {
                        debug!("Server closed the connection");
                        break;
                    }
                    Ok(_) => {}
                    Err(error) => {
                        warn!(%error, "WebSocket receive failed");
                        break;
                    }
                }
            }
        });

        Ok((Self { cmd_tx }, event_rx))
    }

    /// Queue a command for sending.
    pub async fn send(&self, command: ClientCommand) -> Result<(), ConnectionError> {
        self.cmd_tx
            .send(command)
            .await
            .map_err(|_| ConnectionError::Closed)
    }
}
