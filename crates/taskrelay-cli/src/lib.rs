//! TaskRelay CLI Library
//!
//! A line-oriented client for the relay server: a pure session state
//! machine, the WebSocket connection plumbing, and the REPL that ties
//! them together.

pub mod connection;
pub mod repl;
pub mod session;
