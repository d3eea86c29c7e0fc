//! TaskRelay Server Library
//!
//! Core functionality for the TaskRelay relay server:
//! - Connection registry with a bounded replay buffer
//! - Agent event ingestion and fan-out to clients
//! - The external agent collaborator contract and its stdio bridge
//! - WebSocket and HTTP control surfaces

pub mod agent;
pub mod registry;
pub mod relay;
pub mod server;
