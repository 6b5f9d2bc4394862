//! Credential acquisition for backend requests
//!
//! The backend authorizes every call with a bearer token minted by an
//! external identity collaborator. The session core only needs one thing
//! from it: an async function that returns a token. [`CredentialProvider`]
//! is that seam; it is called fresh per request, with no caching assumed
//! correct across long sessions.

use crate::error::{ChatwireError, Result};
use async_trait::async_trait;

/// Source of bearer credentials for backend requests
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Return a bearer token for one request
    ///
    /// # Errors
    ///
    /// Returns [`ChatwireError::MissingCredentials`] when no usable token
    /// is available. This is a terminal precondition failure: callers must
    /// not open any network exchange without a token.
    async fn bearer_token(&self) -> Result<String>;
}

/// Fixed-token credential provider
///
/// Useful for tests and for deployments where a long-lived token is
/// provisioned out of band.
///
/// # Examples
///
/// ```
/// use chatwire::auth::{CredentialProvider, StaticCredentials};
///
/// # async fn example() -> chatwire::error::Result<()> {
/// let credentials = StaticCredentials::new("token-123");
/// assert_eq!(credentials.bearer_token().await?, "token-123");
/// # Ok(())
/// # }
/// ```
pub struct StaticCredentials {
    token: String,
}

impl StaticCredentials {
    /// Creates a provider that always returns `token`
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl CredentialProvider for StaticCredentials {
    async fn bearer_token(&self) -> Result<String> {
        if self.token.is_empty() {
            return Err(ChatwireError::MissingCredentials("static token is empty".to_string()).into());
        }
        Ok(self.token.clone())
    }
}

/// Environment-variable credential provider
///
/// Reads the configured variable on every call, so a token rotated while
/// the process runs is picked up by the next request.
pub struct EnvCredentials {
    var: String,
}

impl EnvCredentials {
    /// Creates a provider reading the environment variable `var`
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

#[async_trait]
impl CredentialProvider for EnvCredentials {
    async fn bearer_token(&self) -> Result<String> {
        match std::env::var(&self.var) {
            Ok(token) if !token.is_empty() => Ok(token),
            _ => Err(ChatwireError::MissingCredentials(self.var.clone()).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_credentials_return_token() {
        let credentials = StaticCredentials::new("abc");
        assert_eq!(credentials.bearer_token().await.unwrap(), "abc");
    }

    #[tokio::test]
    async fn test_static_credentials_reject_empty_token() {
        let credentials = StaticCredentials::new("");
        let err = credentials.bearer_token().await.unwrap_err();
        assert!(err.to_string().contains("Missing credentials"));
    }

    #[tokio::test]
    async fn test_env_credentials_read_variable() {
        std::env::set_var("CHATWIRE_TEST_TOKEN_SET", "from-env");
        let credentials = EnvCredentials::new("CHATWIRE_TEST_TOKEN_SET");
        assert_eq!(credentials.bearer_token().await.unwrap(), "from-env");
        std::env::remove_var("CHATWIRE_TEST_TOKEN_SET");
    }

    #[tokio::test]
    async fn test_env_credentials_missing_variable() {
        let credentials = EnvCredentials::new("CHATWIRE_TEST_TOKEN_UNSET");
        let err = credentials.bearer_token().await.unwrap_err();
        assert!(err.to_string().contains("CHATWIRE_TEST_TOKEN_UNSET"));
    }
}
