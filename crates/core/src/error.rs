//! Error types for the taskpilot domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all taskpilot operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Projects API errors ---
    #[error("Projects API error: {0}")]
    Projects(#[from] ProjectsError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Channel errors ---
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Errors from the downstream project-management API client.
///
/// `Auth` means the OAuth refresh exchange itself failed, which is fatal for the
/// triggering call and never retried automatically. `Api` covers everything
/// the API returns once a credential is in hand.
#[derive(Debug, Clone, Error)]
pub enum ProjectsError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("{method} {path} failed{}: {message}", status.map(|s| format!(" (status {s})")).unwrap_or_default())]
    Api {
        method: String,
        path: String,
        status: Option<u16>,
        message: String,
    },

    #[error("{method} {path} timed out")]
    Timeout { method: String, path: String },
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),

    #[error("Tool execution failed: {tool_name}: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },
}

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("Invalid webhook payload: {0}")]
    InvalidPayload(String),

    #[error("Unauthorized sender: {0}")]
    Unauthorized(String),

    #[error("Channel connection lost: {0}")]
    ConnectionLost(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_displays_method_path_status() {
        let err = Error::Projects(ProjectsError::Api {
            method: "GET".into(),
            path: "/projects/".into(),
            status: Some(503),
            message: "service unavailable".into(),
        });
        let s = err.to_string();
        assert!(s.contains("GET"));
        assert!(s.contains("/projects/"));
        assert!(s.contains("503"));
    }

    #[test]
    fn api_error_without_status() {
        let err = ProjectsError::Api {
            method: "POST".into(),
            path: "/projects/1/tasks/".into(),
            status: None,
            message: "connection refused".into(),
        };
        let s = err.to_string();
        assert!(!s.contains("status"));
        assert!(s.contains("connection refused"));
    }

    #[test]
    fn tool_error_displays_correctly() {
        let err = Error::Tool(ToolError::InvalidArguments(
            "percent_complete must be an integer between 0 and 100".into(),
        ));
        assert!(err.to_string().contains("percent_complete"));
    }
}
