use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;

use super::defaults;

/// Top-level configuration for the bot-detection service.
/// Deserializes from a TOML configuration file; every field falls back to
/// a default so a missing or partial file is never an error.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default = "defaults::default_server_config")]
    pub server: ServerConfig,

    #[serde(default = "defaults::default_tracker_config")]
    pub tracker: TrackerConfig,

    #[serde(default = "defaults::default_challenge_config")]
    pub challenge: ChallengeConfig,

    #[serde(default = "defaults::default_http_config")]
    pub http: HttpConfig,

    #[serde(default = "defaults::default_logging_config")]
    pub logging: LoggingConfig,
}

impl Settings {
    /// Load configuration from a TOML file at the given path. A missing
    /// file is not an error — callers should use [`Settings::load_default`]
    /// for the common case of an optional config file.
    pub fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;
        let settings: Settings = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path))?;
        Ok(settings)
    }

    /// Load from `path` (defaulting to `./sentrygate.toml`, overridable via
    /// the `CONFIG` environment variable) if it exists, otherwise fall back
    /// to built-in defaults.
    pub fn load_default() -> Result<Self> {
        let path = std::env::var("CONFIG").unwrap_or_else(|_| "./sentrygate.toml".to_string());
        if fs::metadata(&path).is_ok() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: defaults::default_server_config(),
            tracker: defaults::default_tracker_config(),
            challenge: defaults::default_challenge_config(),
            http: defaults::default_http_config(),
            logging: defaults::default_logging_config(),
        }
    }
}

/// HTTP server bind configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "defaults::default_port")]
    pub port: u16,

    #[serde(default = "defaults::default_static_dir")]
    pub static_dir: String,
}

/// Visit Tracker timing configuration (spec §3, §4.4).
#[derive(Debug, Clone, Deserialize)]
pub struct TrackerConfig {
    #[serde(default = "defaults::default_session_deadline_ms")]
    pub session_deadline_ms: u64,

    #[serde(default = "defaults::default_session_ttl_secs")]
    pub session_ttl_secs: u64,
}

/// Challenge Store timing configuration (spec §4.3).
#[derive(Debug, Clone, Deserialize)]
pub struct ChallengeConfig {
    #[serde(default = "defaults::default_challenge_ttl_secs")]
    pub ttl_secs: u64,

    #[serde(default = "defaults::default_timing_tolerance_ms")]
    pub timing_tolerance_ms: i64,

    #[serde(default = "defaults::default_max_execution_time_ms")]
    pub max_execution_time_ms: i64,
}

/// HTTP transport limits (spec §5).
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "defaults::default_max_body_bytes")]
    pub max_body_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "defaults::default_log_level")]
    pub level: String,
}
