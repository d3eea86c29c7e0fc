//! Client connection tracking and bounded event replay.

mod buffer;
mod connection;

pub use buffer::{DEFAULT_REPLAY_CAPACITY, ReplayBuffer};
pub use connection::{CLIENT_QUEUE_CAPACITY, ClientConnection, ConnectionRegistry};
