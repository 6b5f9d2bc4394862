//! Bearer-authorized JSON request helper for the chat backend
//!
//! Every non-streaming backend call (chat record CRUD, history load,
//! presigned upload targets) goes through [`ApiClient`]: it acquires a
//! fresh credential per request, attaches the bearer header, and maps
//! non-success responses to [`ChatwireError::Api`] using the backend's
//! `{"detail": ...}` error body when present.

use crate::auth::CredentialProvider;
use crate::error::{ChatwireError, Result};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Error body shape used by the backend for non-success responses
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<String>,
}

/// JSON request helper bound to one backend base URL
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    credentials: Arc<dyn CredentialProvider>,
}

impl ApiClient {
    /// Creates a client for `base_url` with a per-request `timeout`
    ///
    /// # Errors
    ///
    /// Returns an error if HTTP client initialization fails.
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("chatwire/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ChatwireError::Api(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials,
        })
    }

    /// The backend base URL this client targets
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `path` and deserialize the JSON response body
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.execute(self.request(Method::GET, path).await?).await?;
        Ok(response.json().await?)
    }

    /// POST `body` to `path` and deserialize the JSON response body
    pub async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let response = self
            .execute(self.request(Method::POST, path).await?.json(body))
            .await?;
        Ok(response.json().await?)
    }

    /// PATCH `body` to `path`, discarding any response body
    pub async fn patch_json<B: Serialize>(&self, path: &str, body: &B) -> Result<()> {
        self.execute(self.request(Method::PATCH, path).await?.json(body))
            .await?;
        Ok(())
    }

    /// DELETE `path`, discarding any response body
    pub async fn delete(&self, path: &str) -> Result<()> {
        self.execute(self.request(Method::DELETE, path).await?)
            .await?;
        Ok(())
    }

    /// Build a request with a freshly acquired bearer credential
    async fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let token = self.credentials.bearer_token().await?;
        let url = format!("{}{}", self.base_url, path);
        Ok(self.client.request(method, url).bearer_auth(token))
    }

    /// Send the request and map non-success statuses to [`ChatwireError::Api`]
    async fn execute(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await.map_err(|e| {
            tracing::warn!("backend request failed: {}", e);
            ChatwireError::Api(format!("request failed: {}", e))
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.detail)
            .unwrap_or_else(|| status_reason(status));
        tracing::error!("backend returned {}: {}", status, detail);
        Err(ChatwireError::Api(detail).into())
    }
}

/// Canonical reason phrase for a status, falling back to the numeric code
fn status_reason(status: StatusCode) -> String {
    status
        .canonical_reason()
        .map(|r| r.to_string())
        .unwrap_or_else(|| status.to_string())
}
