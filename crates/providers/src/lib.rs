//! LLM provider implementations for taskpilot.
//!
//! The assistant's surfaces are strictly request/response, so a single
//! non-streaming OpenAI-compatible backend covers every deployment
//! (OpenAI, Azure-compatible proxies, vLLM, Ollama).

pub mod openai_compat;

pub use openai_compat::OpenAiCompatProvider;
