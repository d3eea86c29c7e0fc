//! Agent event model and parsing for the host bridge protocol.

mod parser;
mod types;

pub use parser::{parse_line, parse_value};
pub use types::*;
