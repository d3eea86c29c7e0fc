//! WebSocket endpoint: one registry entry per socket.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use taskrelay_proto::RelayEvent;

use crate::relay::RelayServer;

use super::AppState;

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state.relay))
}

async fn handle_socket(socket: WebSocket, relay: Arc<RelayServer>) {
    let (mut ws_tx, mut ws_rx) = socket.split();

    let (event_tx, mut event_rx) =
        mpsc::channel::<RelayEvent>(relay.registry().client_queue_capacity());
    let (pong_tx, mut pong_rx) = mpsc::channel::<Bytes>(8);

    let send_task = tokio::spawn(async move {
        loop {
            tokio::select! {
                event = event_rx.recv() => {
                    let Some(event) = event else { break };
                    match event.to_frame() {
                        Ok(frame) => {
                            if ws_tx.send(Message::Text(frame.into())).await.is_err() {
                                break;
                            }
                        }
                        Err(error) => error!(%error, "Failed to serialize relay event"),
                    }
                }
                pong = pong_rx.recv() => {
                    let Some(data) = pong else { break };
                    if ws_tx.send(Message::Pong(data)).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    let conn = relay.registry().register(event_tx).await;

    while let Some(result) = ws_rx.next().await {
        match result {
            Ok(Message::Text(text)) => relay.handle_command(&conn, text.as_str()).await,
            Ok(Message::Ping(data)) => {
                let _ = pong_tx.send(data).await;
            }
            Ok(Message::Close(_)) => {
                debug!(client_id = conn.id, "Client sent close frame");
                break;
            }
            Ok(_) => {}
            Err(error) => {
                warn!(client_id = conn.id, %error, "WebSocket receive failed");
                break;
            }
        }
    }

    relay.registry().unregister(conn.id).await;
    send_task.abort();
    info!(client_id = conn.id, "WebSocket session ended");
}
