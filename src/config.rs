//! Configuration for the robot command-line client.
//!
//! Read from a JSON file (`<config dir>/dingtalk-robot/config.json` unless a
//! path is given), falling back to environment variables if no file exists.

use crate::error::{ConfigError, TransportError};
use crate::robot::{Endpoint, HttpTransport, Robot, TransportConfig, DEFAULT_API_BASE};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Default configuration file path.
pub fn default_config_path() -> PathBuf {
    config_dir().join("config.json")
}

/// Get the application config directory.
fn config_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "dingtalk-robot")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".dingtalk-robot"))
}

/// JSON configuration file structure.
#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    webhook: Option<String>,
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    api_base: Option<String>,
    #[serde(default)]
    secret: Option<String>,
    #[serde(default = "default_timeout_ms")]
    timeout_ms: u64,
}

fn default_timeout_ms() -> u64 {
    2000
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Where messages are posted
    pub endpoint: Endpoint,
    /// Optional signing secret (`SEC...`)
    pub secret: Option<String>,
    /// Request deadline in milliseconds
    pub timeout_ms: u64,
}

impl Config {
    /// Load configuration from JSON file, falling back to environment variables.
    ///
    /// Search order:
    /// 1. Provided config_path (if any)
    /// 2. `<config dir>/dingtalk-robot/config.json`
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::from_json(&path);
        }

        let default_path = default_config_path();
        if default_path.exists() {
            return Self::from_json(&default_path);
        }

        Self::from_env()
    }

    /// Load configuration from a JSON file.
    pub fn from_json(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let file: ConfigFile = serde_json::from_str(&content)?;

        let endpoint = resolve_endpoint(file.webhook, file.access_token, file.api_base)
            .ok_or_else(|| {
                ConfigError::MissingField("webhook or access_token".to_string())
            })?;

        Ok(Self {
            endpoint,
            secret: file.secret.filter(|s| !s.is_empty()),
            timeout_ms: validate_timeout_ms(file.timeout_ms)?,
        })
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Try to load .env file (silently ignore if not found)
        let _ = dotenvy::from_path(config_dir().join(".env"));

        let endpoint = resolve_endpoint(
            non_empty_var("DINGTALK_WEBHOOK"),
            non_empty_var("DINGTALK_ACCESS_TOKEN"),
            non_empty_var("DINGTALK_API_BASE"),
        )
        .ok_or_else(|| ConfigError::MissingEnvVar("DINGTALK_WEBHOOK".to_string()))?;

        let timeout_ms = match non_empty_var("DINGTALK_TIMEOUT_MS") {
            Some(value) => parse_timeout_ms(&value)?,
            None => default_timeout_ms(),
        };

        Ok(Self {
            endpoint,
            secret: non_empty_var("DINGTALK_SECRET"),
            timeout_ms,
        })
    }

    /// Build a robot with an HTTP transport honouring `timeout_ms`.
    pub fn build_robot(&self) -> Result<Robot, TransportError> {
        let transport = HttpTransport::new(TransportConfig {
            timeout: Duration::from_millis(self.timeout_ms),
            ..TransportConfig::default()
        })?;

        let mut robot = Robot::new(self.endpoint.clone(), Arc::new(transport));
        if let Some(secret) = &self.secret {
            robot.set_secret(secret.clone());
        }
        Ok(robot)
    }
}

/// A webhook URL wins over an access token.
fn resolve_endpoint(
    webhook: Option<String>,
    access_token: Option<String>,
    api_base: Option<String>,
) -> Option<Endpoint> {
    if let Some(webhook) = webhook.filter(|w| !w.is_empty()) {
        return Some(Endpoint::Webhook(webhook));
    }

    access_token
        .filter(|t| !t.is_empty())
        .map(|token| Endpoint::AccessToken {
            api_base: api_base
                .filter(|b| !b.is_empty())
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            token,
        })
}

/// Request deadlines must be non-zero.
fn validate_timeout_ms(timeout_ms: u64) -> Result<u64, ConfigError> {
    if timeout_ms == 0 {
        return Err(ConfigError::InvalidValue(
            "timeout_ms must be greater than zero".to_string(),
        ));
    }
    Ok(timeout_ms)
}

fn parse_timeout_ms(value: &str) -> Result<u64, ConfigError> {
    let timeout_ms = value.trim().parse::<u64>().map_err(|_| {
        ConfigError::InvalidValue(format!(
            "DINGTALK_TIMEOUT_MS must be a positive integer, got {:?}",
            value
        ))
    })?;
    validate_timeout_ms(timeout_ms)
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}
