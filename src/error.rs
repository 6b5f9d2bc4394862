//! Error types for Chatwire
//!
//! This module defines all error types used throughout the crate,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for Chatwire operations
///
/// This enum encompasses all possible errors that can occur while a chat
/// session is submitted, streamed, or settled: configuration loading,
/// credential acquisition, transport exchanges, media uploads, and the
/// backend's own error signals.
#[derive(Error, Debug)]
pub enum ChatwireError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport-level errors (non-success status, broken stream, no body)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Terminal error payload received on the stream itself
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Media upload errors (guardrail rejections, presign or storage failures)
    #[error("Upload error: {0}")]
    Upload(String),

    /// Backend API errors for chat record and history calls
    #[error("API error: {0}")]
    Api(String),

    /// Session orchestration precondition failures
    #[error("Session error: {0}")]
    Session(String),

    /// Missing credentials for the backend
    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for Chatwire operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;
