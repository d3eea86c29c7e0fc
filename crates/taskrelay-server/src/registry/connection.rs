//! Connection registry with atomic replay-then-welcome registration.
//!
//! The connection map and the replay buffer share one mutex so that a
//! registration (replay history, send the welcome status, join the map)
//! cannot interleave with a broadcast. A client therefore observes every
//! event exactly once, either from replay or from the live fan-out.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::Mutex;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, info, warn};

use taskrelay_proto::RelayEvent;

use super::buffer::ReplayBuffer;

/// Floor for the per-client outbound queue depth. The actual depth comes
/// from [`ConnectionRegistry::client_queue_capacity`], which also accounts
/// for the configured replay capacity.
pub const CLIENT_QUEUE_CAPACITY: usize = 256;

/// Slack on top of the replay capacity for live events and the welcome
/// status queued during registration.
const CLIENT_QUEUE_HEADROOM: usize = 16;

/// Handle to one connected client's outbound event queue.
#[derive(Debug, Clone)]
pub struct ClientConnection {
    pub id: u64,
    event_tx: mpsc::Sender<RelayEvent>,
}

impl ClientConnection {
    /// Queue an event without blocking. Returns `false` when the event was
    /// dropped because the client is slow or already gone; a failed send
    /// never affects other clients.
    pub fn send(&self, event: RelayEvent) -> bool {
        match self.event_tx.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!(client_id = self.id, "Outbound queue full, dropping event");
                false
            }
            Err(TrySendError::Closed(_)) => {
                debug!(client_id = self.id, "Outbound queue closed");
                false
            }
        }
    }
}

struct Inner {
    connections: HashMap<u64, ClientConnection>,
    replay: ReplayBuffer,
}

/// Tracks connected clients and replays recent history to newcomers.
pub struct ConnectionRegistry {
    inner: Mutex<Inner>,
    next_id: AtomicU64,
    replay_capacity: usize,
}

impl ConnectionRegistry {
    pub fn new(replay_capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                connections: HashMap::new(),
                replay: ReplayBuffer::new(replay_capacity),
            }),
            next_id: AtomicU64::new(1),
            replay_capacity,
        }
    }

    /// Depth callers must give a new client's outbound channel so a
    /// registration can never overflow its own queue with replayed events.
    pub const fn client_queue_capacity(&self) -> usize {
        let required = self.replay_capacity + CLIENT_QUEUE_HEADROOM;
        if required > CLIENT_QUEUE_CAPACITY {
            required
        } else {
            CLIENT_QUEUE_CAPACITY
        }
    }

    /// Register a client: replay buffered history in order, queue the
    /// welcome status, then add the client to the broadcast set.
    pub async fn register(&self, event_tx: mpsc::Sender<RelayEvent>) -> ClientConnection {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let conn = ClientConnection { id, event_tx };

        let mut inner = self.inner.lock().await;
        for event in inner.replay.iter() {
            conn.send(event.clone());
        }
        conn.send(RelayEvent::Status {
            status: "connected".into(),
        });
        inner.connections.insert(id, conn.clone());
        info!(
            client_id = id,
            clients = inner.connections.len(),
            replayed = inner.replay.len(),
            "Client registered"
        );
        conn
    }

    /// Remove a client from the broadcast set.
    pub async fn unregister(&self, id: u64) {
        let mut inner = self.inner.lock().await;
        if inner.connections.remove(&id).is_some() {
            info!(
                client_id = id,
                clients = inner.connections.len(),
                "Client unregistered"
            );
        }
    }

    /// Append the event to the replay buffer and fan it out to every
    /// connected client. Send failures are isolated per client.
    pub async fn broadcast(&self, event: RelayEvent) {
        let mut inner = self.inner.lock().await;
        inner.replay.push(event.clone());
        for conn in inner.connections.values() {
            conn.send(event.clone());
        }
    }

    pub async fn connection_count(&self) -> usize {
        self.inner.lock().await.connections.len()
    }
}
