//! Configuration loading, validation, and management for taskpilot.
//!
//! Loads configuration from `~/.taskpilot/config.toml` with environment
//! variable overrides. All OAuth credentials and the model API key must be
//! present at startup; initialization fails fast otherwise.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.taskpilot/config.toml`.
#[derive(Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Model / LLM settings
    #[serde(default)]
    pub model: ModelConfig,

    /// Agent loop settings
    #[serde(default)]
    pub agent: AgentConfig,

    /// Downstream project-management API settings
    #[serde(default)]
    pub projects: ProjectsConfig,

    /// Gateway settings
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Chat-platform webhook settings
    #[serde(default)]
    pub cliq: CliqConfig,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// API key for the chat-completions endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL of an OpenAI-compatible endpoint
    #[serde(default = "default_model_base_url")]
    pub base_url: String,

    /// Model identifier
    #[serde(default = "default_model_name")]
    pub name: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Max tokens per model response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_model_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_model_name() -> String {
    "gpt-4o-mini".into()
}
fn default_temperature() -> f32 {
    0.1
}
fn default_max_tokens() -> u32 {
    2700
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_model_base_url(),
            name: default_model_name(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Maximum tool-call rounds per exchange
    #[serde(default = "default_max_rounds")]
    pub max_rounds: u32,

    /// Conversation window size in exchanges (K)
    #[serde(default = "default_window_exchanges")]
    pub window_exchanges: usize,
}

fn default_max_rounds() -> u32 {
    10
}
fn default_window_exchanges() -> usize {
    10
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_rounds: default_max_rounds(),
            window_exchanges: default_window_exchanges(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProjectsConfig {
    /// OAuth client id
    #[serde(default)]
    pub client_id: String,

    /// OAuth client secret
    #[serde(default)]
    pub client_secret: String,

    /// Long-lived OAuth refresh token
    #[serde(default)]
    pub refresh_token: String,

    /// Portal identifier all resource paths are scoped under
    #[serde(default)]
    pub portal_id: String,

    /// Base URL for resource requests
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Base URL for the OAuth token exchange
    #[serde(default = "default_auth_base_url")]
    pub auth_base_url: String,
}

fn default_api_base_url() -> String {
    "https://projectsapi.zoho.com".into()
}
fn default_auth_base_url() -> String {
    "https://accounts.zoho.com".into()
}

impl Default for ProjectsConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            refresh_token: String::new(),
            portal_id: String::new(),
            api_base_url: default_api_base_url(),
            auth_base_url: default_auth_base_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 {
    8000
}
fn default_host() -> String {
    "127.0.0.1".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CliqConfig {
    /// HMAC shared secret for webhook signature validation. None = no validation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_secret: Option<String>,
}

/// Redact a secret string for Debug output.
fn redact(s: &str) -> &'static str {
    if s.is_empty() {
        "<unset>"
    } else {
        "[REDACTED]"
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("model", &self.model)
            .field("agent", &self.agent)
            .field("projects", &self.projects)
            .field("gateway", &self.gateway)
            .field("cliq", &self.cliq)
            .finish()
    }
}

impl std::fmt::Debug for ModelConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelConfig")
            .field("api_key", &redact(self.api_key.as_deref().unwrap_or("")))
            .field("base_url", &self.base_url)
            .field("name", &self.name)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl std::fmt::Debug for ProjectsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectsConfig")
            .field("client_id", &redact(&self.client_id))
            .field("client_secret", &redact(&self.client_secret))
            .field("refresh_token", &redact(&self.refresh_token))
            .field("portal_id", &self.portal_id)
            .field("api_base_url", &self.api_base_url)
            .field("auth_base_url", &self.auth_base_url)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.taskpilot/config.toml)
    /// with environment variable overrides, then validate.
    ///
    /// Recognized variables: `OPENAI_API_KEY`, `TASKPILOT_MODEL`,
    /// `ZOHO_CLIENT_ID`, `ZOHO_CLIENT_SECRET`, `ZOHO_REFRESH_TOKEN`,
    /// `ZOHO_PORTAL_ID`, `ZOHO_API_BASE_URL`, `ZOHO_AUTH_BASE_URL`.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::read_from(&config_path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load from a specific file path (no env overrides). Used in tests.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::read_from(path)?;
        config.validate()?;
        Ok(config)
    }

    fn read_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    fn apply_env_overrides(&mut self) {
        if self.model.api_key.is_none() {
            self.model.api_key = std::env::var("OPENAI_API_KEY").ok();
        }
        if let Ok(model) = std::env::var("TASKPILOT_MODEL") {
            self.model.name = model;
        }

        let overrides: [(&str, &mut String); 6] = [
            ("ZOHO_CLIENT_ID", &mut self.projects.client_id),
            ("ZOHO_CLIENT_SECRET", &mut self.projects.client_secret),
            ("ZOHO_REFRESH_TOKEN", &mut self.projects.refresh_token),
            ("ZOHO_PORTAL_ID", &mut self.projects.portal_id),
            ("ZOHO_API_BASE_URL", &mut self.projects.api_base_url),
            ("ZOHO_AUTH_BASE_URL", &mut self.projects.auth_base_url),
        ];
        for (var, slot) in overrides {
            if let Ok(value) = std::env::var(var) {
                *slot = value;
            }
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".taskpilot")
    }

    /// Validate the configuration. All credentials must be present.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.api_key.as_deref().unwrap_or("").is_empty() {
            return Err(ConfigError::MissingValue("model.api_key (OPENAI_API_KEY)"));
        }
        let required: [(&'static str, &str); 4] = [
            ("projects.client_id (ZOHO_CLIENT_ID)", &self.projects.client_id),
            (
                "projects.client_secret (ZOHO_CLIENT_SECRET)",
                &self.projects.client_secret,
            ),
            (
                "projects.refresh_token (ZOHO_REFRESH_TOKEN)",
                &self.projects.refresh_token,
            ),
            ("projects.portal_id (ZOHO_PORTAL_ID)", &self.projects.portal_id),
        ];
        for (name, value) in required {
            if value.is_empty() {
                return Err(ConfigError::MissingValue(name));
            }
        }

        if !(0.0..=2.0).contains(&self.model.temperature) {
            return Err(ConfigError::ValidationError(
                "model.temperature must be between 0.0 and 2.0".into(),
            ));
        }
        if self.agent.max_rounds == 0 {
            return Err(ConfigError::ValidationError(
                "agent.max_rounds must be at least 1".into(),
            ));
        }

        Ok(())
    }

    /// Generate a default config TOML string (for first-run setup).
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Missing required configuration value: {0}")]
    MissingValue(&'static str),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn populated() -> AppConfig {
        let mut config = AppConfig::default();
        config.model.api_key = Some("sk-test".into());
        config.projects.client_id = "1000.ABCDEF".into();
        config.projects.client_secret = "secret".into();
        config.projects.refresh_token = "1000.refresh".into();
        config.projects.portal_id = "700000123".into();
        config
    }

    #[test]
    fn populated_config_is_valid() {
        let config = populated();
        assert!(config.validate().is_ok());
        assert_eq!(config.agent.max_rounds, 10);
        assert_eq!(config.agent.window_exchanges, 10);
        assert_eq!(config.gateway.port, 8000);
    }

    #[test]
    fn missing_credentials_rejected() {
        let mut config = populated();
        config.projects.refresh_token.clear();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("refresh_token"));
    }

    #[test]
    fn missing_api_key_rejected() {
        let mut config = populated();
        config.model.api_key = None;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingValue(_))
        ));
    }

    #[test]
    fn invalid_temperature_rejected() {
        let mut config = populated();
        config.model.temperature = 5.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_rounds_rejected() {
        let mut config = populated();
        config.agent.max_rounds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = populated();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.model.name, config.model.name);
        assert_eq!(parsed.projects.portal_id, config.projects.portal_id);
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::read_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.model.name, "gpt-4o-mini");
    }

    #[test]
    fn debug_redacts_secrets() {
        let config = populated();
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-test"));
        assert!(!debug.contains("1000.refresh"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[model]
api_key = "sk-file"
name = "gpt-4o"

[projects]
client_id = "cid"
client_secret = "cs"
refresh_token = "rt"
portal_id = "pid"

[agent]
max_rounds = 5
window_exchanges = 4
"#,
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.model.name, "gpt-4o");
        assert_eq!(config.agent.max_rounds, 5);
        assert_eq!(config.agent.window_exchanges, 4);
    }
}
