//! The agent loop for the project-management assistant.
//!
//! One `Agent` per logical conversation. `chat` is the whole surface the
//! channels need: give it an utterance and (when known) a caller identity,
//! get a reply string back, always.

pub mod instructions;
pub mod loop_runner;

pub use loop_runner::{Agent, AgentOptions};
