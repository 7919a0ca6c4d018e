//! Caller-facing contract and the stdio bridge around the directive parser.

pub mod contract;
pub mod handler;
pub mod stdio;

pub use contract::{PromptOutcome, ReplyEnvelope, ResponseEnvelope};
pub use handler::ReplyHandler;
pub use stdio::{BridgeStats, run_bridge, run_stdio_bridge};
