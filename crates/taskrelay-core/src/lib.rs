//! TaskRelay Core Library
//!
//! Shared functionality for TaskRelay components:
//! - Agent event parsing for the host bridge protocol
//! - Sanitizing of embedded directives in agent prose
//! - Transformation of agent events into relay events
//! - Common error types

pub mod agent;
pub mod error;
pub mod sanitize;
pub mod tracing_init;
pub mod transform;

pub use error::{Error, Result};
pub use sanitize::sanitize;
pub use transform::transform;
