//! Channel adapters between the outside world and the agent: interactive
//! terminal input and the Cliq webhook payloads.

pub mod cli;
pub mod cliq;

pub use cli::CliChannel;
pub use cliq::{format_response, help_response, validate_signature, CliqMessage, CliqResponse};
