//! Configuration loading, validation, and management for dialogwire.
//!
//! Loads configuration from `~/.dialogwire/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.dialogwire/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP boundary settings
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Dispatch behaviour
    #[serde(default)]
    pub agent: AgentConfig,

    /// Actions on Google integration settings
    #[serde(default)]
    pub actions_on_google: ActionsOnGoogleConfig,

    /// Response templates
    #[serde(default)]
    pub templates: TemplatesConfig,
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

fn default_true() -> bool {
    true
}

#[derive(Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Route the platform POSTs webhook requests to
    #[serde(default = "default_webhook_path")]
    pub webhook_path: String,

    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    #[serde(default)]
    pub allow_public_bind: bool,

    /// Require `Authorization: Bearer <token>` on webhook requests
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,

    /// Require an HMAC-SHA256 body signature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signing_secret: Option<String>,
}

fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    8080
}
fn default_webhook_path() -> String {
    "/".into()
}
fn default_max_body_bytes() -> usize {
    1024 * 1024
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            webhook_path: default_webhook_path(),
            max_body_bytes: default_max_body_bytes(),
            allow_public_bind: false,
            auth_token: None,
            signing_secret: None,
        }
    }
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("webhook_path", &self.webhook_path)
            .field("max_body_bytes", &self.max_body_bytes)
            .field("allow_public_bind", &self.allow_public_bind)
            .field("auth_token", &redact(&self.auth_token))
            .field("signing_secret", &redact(&self.signing_secret))
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Log full request and response documents at debug level
    #[serde(default)]
    pub log_payloads: bool,

    /// Keep a per-session fallback counter in a private context
    #[serde(default)]
    pub track_fallback_level: bool,

    /// Text sent back when no handler matches the intent
    #[serde(default = "default_unhandled_intent_text")]
    pub unhandled_intent_text: String,
}

fn default_unhandled_intent_text() -> String {
    "Sorry, I can't help with that right now.".into()
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            log_payloads: false,
            track_fallback_level: false,
            unhandled_intent_text: default_unhandled_intent_text(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionsOnGoogleConfig {
    /// Wrap spoken text in `<speak>` and send it as SSML
    #[serde(default = "default_true")]
    pub text_to_speech_as_ssml: bool,

    /// Protocol version the integration is registered for
    #[serde(default = "default_aog_version")]
    pub version: String,
}

fn default_aog_version() -> String {
    "2".into()
}

impl Default for ActionsOnGoogleConfig {
    fn default() -> Self {
        Self {
            text_to_speech_as_ssml: true,
            version: default_aog_version(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplatesConfig {
    /// YAML file with response templates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl AppConfig {
    /// Load configuration from the default path (~/.dialogwire/config.toml).
    ///
    /// Environment variables take precedence over the file:
    /// - `DIALOGWIRE_HOST`, `DIALOGWIRE_PORT`
    /// - `DIALOGWIRE_AUTH_TOKEN`, `DIALOGWIRE_SIGNING_SECRET`
    /// - `DIALOGWIRE_TEMPLATES`
    /// - `DIALOGWIRE_DEBUG`
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_overrides(&Self::config_path())
    }

    /// Load a specific file, then apply environment overrides.
    pub fn load_with_overrides(path: &Path) -> Result<Self, ConfigError> {
        Self::load_with_vars(path, |key| std::env::var(key).ok())
    }

    /// Load a specific file and apply overrides from `var`. Validation runs
    /// once the overrides are in place.
    pub fn load_with_vars<F>(path: &Path, var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::read_file(path)?;
        config.apply_overrides(var)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::read_file(path)?;
        config.validate()?;
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        Ok(config)
    }

    /// Apply overrides from a variable lookup (the process environment in
    /// production).
    pub fn apply_overrides<F>(&mut self, var: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = var("DIALOGWIRE_HOST") {
            self.gateway.host = host;
        }

        if let Some(port) = var("DIALOGWIRE_PORT") {
            self.gateway.port = port.parse().map_err(|_| {
                ConfigError::ValidationError(format!("DIALOGWIRE_PORT is not a port: {port}"))
            })?;
        }

        if let Some(token) = var("DIALOGWIRE_AUTH_TOKEN") {
            self.gateway.auth_token = Some(token);
        }

        if let Some(secret) = var("DIALOGWIRE_SIGNING_SECRET") {
            self.gateway.signing_secret = Some(secret);
        }

        if let Some(path) = var("DIALOGWIRE_TEMPLATES") {
            self.templates.path = Some(PathBuf::from(path));
        }

        if let Some(debug) = var("DIALOGWIRE_DEBUG") {
            self.agent.log_payloads = !matches!(debug.trim(), "" | "0" | "false");
        }

        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".dialogwire")
    }

    /// Get the default configuration file path.
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.gateway.port == 0 {
            return Err(ConfigError::ValidationError(
                "gateway.port must be non-zero".into(),
            ));
        }

        if !self.gateway.webhook_path.starts_with('/') {
            return Err(ConfigError::ValidationError(
                "gateway.webhook_path must start with '/'".into(),
            ));
        }

        if self.gateway.webhook_path == "/health" {
            return Err(ConfigError::ValidationError(
                "gateway.webhook_path must not shadow /health".into(),
            ));
        }

        if self.gateway.max_body_bytes == 0 {
            return Err(ConfigError::ValidationError(
                "gateway.max_body_bytes must be > 0".into(),
            ));
        }

        if self.gateway.host == "0.0.0.0" && !self.gateway.allow_public_bind {
            return Err(ConfigError::ValidationError(
                "binding 0.0.0.0 requires gateway.allow_public_bind = true".into(),
            ));
        }

        Ok(())
    }

    /// Generate a default config TOML string (for the `init` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
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

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.gateway.port, 8080);
        assert_eq!(config.gateway.webhook_path, "/");
        assert!(config.actions_on_google.text_to_speech_as_ssml);
        assert!(!config.agent.track_fallback_level);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.gateway.port, config.gateway.port);
        assert_eq!(
            parsed.agent.unhandled_intent_text,
            config.agent.unhandled_intent_text
        );
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/config.toml"));
        assert!(result.is_ok());
        assert_eq!(result.unwrap().gateway.port, 8080);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[gateway]\nport = 9000\nwebhook_path = \"/dialogflow\"\n\n[agent]\ntrack_fallback_level = true"
        )
        .unwrap();

        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.gateway.port, 9000);
        assert_eq!(config.gateway.webhook_path, "/dialogflow");
        assert_eq!(config.gateway.host, "127.0.0.1");
        assert!(config.agent.track_fallback_level);
        assert_eq!(config.actions_on_google.version, "2");
    }

    #[test]
    fn broken_toml_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[gateway\nport = ").unwrap();
        assert!(matches!(
            AppConfig::load_from(file.path()),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn invalid_values_rejected() {
        let mut config = AppConfig::default();
        config.gateway.port = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.gateway.webhook_path = "webhook".into();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.gateway.webhook_path = "/health".into();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.gateway.max_body_bytes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn public_bind_needs_opt_in() {
        let mut config = AppConfig::default();
        config.gateway.host = "0.0.0.0".into();
        assert!(config.validate().is_err());
        config.gateway.allow_public_bind = true;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = AppConfig::default();
        config
            .apply_overrides(env(&[
                ("DIALOGWIRE_PORT", "9090"),
                ("DIALOGWIRE_AUTH_TOKEN", "s3cret"),
                ("DIALOGWIRE_TEMPLATES", "/etc/dialogwire/templates.yaml"),
                ("DIALOGWIRE_DEBUG", "1"),
            ]))
            .unwrap();
        assert_eq!(config.gateway.port, 9090);
        assert_eq!(config.gateway.auth_token.as_deref(), Some("s3cret"));
        assert_eq!(
            config.templates.path,
            Some(PathBuf::from("/etc/dialogwire/templates.yaml"))
        );
        assert!(config.agent.log_payloads);
    }

    #[test]
    fn overrides_apply_before_validation() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[gateway]\nhost = \"0.0.0.0\"").unwrap();

        assert!(AppConfig::load_from(file.path()).is_err());
        let config =
            AppConfig::load_with_vars(file.path(), env(&[("DIALOGWIRE_HOST", "127.0.0.1")]))
                .unwrap();
        assert_eq!(config.gateway.host, "127.0.0.1");

        assert!(matches!(
            AppConfig::load_with_vars(file.path(), env(&[])),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn debug_false_disables_payload_logging() {
        let mut config = AppConfig::default();
        config.agent.log_payloads = true;
        config
            .apply_overrides(env(&[("DIALOGWIRE_DEBUG", "false")]))
            .unwrap();
        assert!(!config.agent.log_payloads);
    }

    #[test]
    fn bad_port_override_rejected() {
        let mut config = AppConfig::default();
        let result = config.apply_overrides(env(&[("DIALOGWIRE_PORT", "eighty")]));
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn secrets_redacted_in_debug() {
        let mut config = AppConfig::default();
        config.gateway.auth_token = Some("hunter2".into());
        config.gateway.signing_secret = Some("topsecret".into());
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("topsecret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("8080"));
        assert!(toml_str.contains("unhandled_intent_text"));
        assert!(!toml_str.contains("auth_token"));
    }
}
