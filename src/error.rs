//! Error types for the application.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors related to configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
}

/// Errors raised by the HTTP transport.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("HTTP request failed: {0}")]
    Request(reqwest::Error),

    #[error("Failed to build HTTP client: {0}")]
    Build(reqwest::Error),
}

/// Errors related to sending robot messages.
#[derive(Error, Debug)]
pub enum RobotError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Invalid JSON: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Reply target expired at {expired_at} (ms since epoch)")]
    ReplyTargetExpired { expired_at: i64 },

    #[error("Robot message rejected ({code}): {message}")]
    Rejected { code: i64, message: String },

    #[error("Invalid webhook URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
