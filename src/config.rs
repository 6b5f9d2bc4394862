//! Configuration management for Chatwire
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::cli::Cli;
use crate::error::{ChatwireError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure for Chatwire
///
/// This structure holds everything needed to run a session: backend
/// connection settings, upload guardrails, and credential sourcing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Backend connection configuration
    #[serde(default)]
    pub backend: BackendConfig,

    /// Upload guardrail configuration
    #[serde(default)]
    pub uploads: UploadConfig,

    /// Credential sourcing configuration
    #[serde(default)]
    pub auth: AuthConfig,
}

/// Backend connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the chat backend
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds; also the backstop for streams
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_request_timeout() -> u64 {
    120
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

/// Upload guardrail configuration
///
/// Checked locally before any network call is made.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Maximum number of attachments per submission
    #[serde(default = "default_max_attachments")]
    pub max_attachments: usize,

    /// Maximum size of a single attachment in bytes
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,
}

fn default_max_attachments() -> usize {
    20
}

fn default_max_file_bytes() -> u64 {
    20 * 1024 * 1024
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_attachments: default_max_attachments(),
            max_file_bytes: default_max_file_bytes(),
        }
    }
}

/// Credential sourcing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Environment variable read for the bearer token
    #[serde(default = "default_token_env")]
    pub token_env: String,
}

fn default_token_env() -> String {
    "CHATWIRE_TOKEN".to_string()
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_env: default_token_env(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file with env and CLI overrides
    ///
    /// A missing file is not an error: defaults apply. Environment
    /// variables (`CHATWIRE_BACKEND_URL`, `CHATWIRE_TOKEN_ENV`) override
    /// file values, and CLI flags override both.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the YAML configuration file
    /// * `cli` - Parsed CLI arguments for overrides
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use chatwire::cli::Cli;
    /// use chatwire::config::Config;
    ///
    /// # fn example(cli: &Cli) -> chatwire::error::Result<()> {
    /// let config = Config::load("config/config.yaml", cli)?;
    /// config.validate()?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn load(path: &str, cli: &Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            let contents = std::fs::read_to_string(path)?;
            serde_yaml::from_str(&contents)?
        } else {
            tracing::debug!("config file {} not found, using defaults", path);
            Self::default()
        };

        config.apply_env_overrides();
        config.apply_cli_overrides(cli);
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("CHATWIRE_BACKEND_URL") {
            if !url.is_empty() {
                tracing::debug!("backend URL override from environment: {}", url);
                self.backend.base_url = url;
            }
        }
        if let Ok(var) = std::env::var("CHATWIRE_TOKEN_ENV") {
            if !var.is_empty() {
                self.auth.token_env = var;
            }
        }
    }

    /// Apply CLI flag overrides
    fn apply_cli_overrides(&mut self, cli: &Cli) {
        if let Some(url) = &cli.backend_url {
            tracing::debug!("backend URL override from CLI: {}", url);
            self.backend.base_url = url.clone();
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns [`ChatwireError::Config`] when the base URL does not parse,
    /// or when a limit is zero.
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.backend.base_url).map_err(|e| {
            ChatwireError::Config(format!(
                "invalid backend base_url {}: {}",
                self.backend.base_url, e
            ))
        })?;

        if self.backend.request_timeout_seconds == 0 {
            return Err(
                ChatwireError::Config("request_timeout_seconds must be positive".to_string())
                    .into(),
            );
        }
        if self.uploads.max_attachments == 0 {
            return Err(
                ChatwireError::Config("max_attachments must be positive".to_string()).into(),
            );
        }
        if self.uploads.max_file_bytes == 0 {
            return Err(ChatwireError::Config("max_file_bytes must be positive".to_string()).into());
        }
        if self.auth.token_env.is_empty() {
            return Err(ChatwireError::Config("token_env must not be empty".to_string()).into());
        }
        Ok(())
    }
}
