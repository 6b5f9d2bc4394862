//! Media upload coordination
//!
//! Files attached to a submission become durable [`Part`]s before the user
//! message is finalized. Each file is uploaded through a two-step presign
//! flow: request a write target from the backend, then PUT the raw bytes to
//! that target. Uploads run concurrently with an all-or-nothing policy --
//! a single failure aborts the whole submission so no partial media set is
//! ever attached.

use crate::api::ApiClient;
use crate::error::{ChatwireError, Result};
use crate::session::message::{Part, PartKind};
use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Local guardrails checked before any network call
#[derive(Debug, Clone, Copy)]
pub struct UploadLimits {
    /// Maximum number of attachments per submission
    pub max_attachments: usize,
    /// Maximum size of a single file in bytes
    pub max_file_bytes: u64,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_attachments: 20,
            max_file_bytes: 20 * 1024 * 1024,
        }
    }
}

/// One local file attached to a submission
#[derive(Debug, Clone)]
pub struct MediaAttachment {
    /// File name presented to the storage collaborator
    pub filename: String,
    /// Concrete content type, used for classification and the upload header
    pub content_type: String,
    /// Raw file bytes
    pub bytes: Bytes,
}

impl MediaAttachment {
    /// Creates an attachment from in-memory bytes
    pub fn new(
        filename: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }

    /// Reads an attachment from disk, inferring the content type from the
    /// file extension
    ///
    /// # Errors
    ///
    /// Returns an IO error if the file cannot be read.
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "attachment".to_string());
        let content_type = path
            .extension()
            .and_then(|e| e.to_str())
            .map(content_type_for_extension)
            .unwrap_or("application/octet-stream");
        Ok(Self::new(filename, content_type, bytes))
    }

    /// Size of the attachment in bytes
    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// True when the attachment carries no bytes
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Content type heuristic for common extensions
fn content_type_for_extension(ext: &str) -> &'static str {
    match ext.to_lowercase().as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "ogg" => "audio/ogg",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "md" => "text/markdown",
        "csv" => "text/csv",
        "json" => "application/json",
        _ => "application/octet-stream",
    }
}

/// Presign request body: `{ filename, contentType }`
#[derive(Debug, Serialize)]
struct UploadTargetRequest<'a> {
    filename: &'a str,
    #[serde(rename = "contentType")]
    content_type: &'a str,
}

/// Presign response: the write target and the final durable URL
#[derive(Debug, Deserialize)]
struct UploadTarget {
    url: String,
    public_url: String,
}

/// Uploads attached files and converts them into typed message parts
pub struct MediaUploader {
    api: ApiClient,
    client: Client,
    limits: UploadLimits,
}

impl MediaUploader {
    /// Creates an uploader over the backend `api` client
    ///
    /// A separate plain HTTP client performs the presigned PUTs: the write
    /// target is an absolute URL on the storage host and must not carry the
    /// backend bearer header.
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails.
    pub fn new(api: ApiClient, limits: UploadLimits, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("chatwire/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ChatwireError::Upload(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api,
            client,
            limits,
        })
    }

    /// The configured guardrails
    pub fn limits(&self) -> UploadLimits {
        self.limits
    }

    /// Upload every attachment concurrently, all-or-nothing
    ///
    /// Returns one [`Part`] per file, in input order. Guardrails are
    /// enforced locally before any network call. A cancellation observed
    /// while uploads are in flight aborts the whole batch.
    ///
    /// # Errors
    ///
    /// Returns [`ChatwireError::Upload`] on guardrail violations, presign
    /// failures, storage failures, or cancellation. On any error no part of
    /// the batch is usable.
    pub async fn upload_all(
        &self,
        files: &[MediaAttachment],
        cancel: &CancellationToken,
    ) -> Result<Vec<Part>> {
        if files.len() > self.limits.max_attachments {
            return Err(ChatwireError::Upload(format!(
                "too many attachments: {} exceeds limit of {}",
                files.len(),
                self.limits.max_attachments
            ))
            .into());
        }
        for file in files {
            if file.len() > self.limits.max_file_bytes {
                return Err(ChatwireError::Upload(format!(
                    "{} is too large: {} bytes exceeds limit of {}",
                    file.filename,
                    file.len(),
                    self.limits.max_file_bytes
                ))
                .into());
            }
        }

        tracing::debug!("uploading {} attachment(s)", files.len());
        let uploads = futures::future::try_join_all(files.iter().map(|f| self.upload_one(f)));

        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!("media upload batch cancelled");
                Err(ChatwireError::Upload("upload cancelled".to_string()).into())
            }
            parts = uploads => parts,
        }
    }

    /// Upload one file: presign, PUT, return the durable part
    async fn upload_one(&self, file: &MediaAttachment) -> Result<Part> {
        let target: UploadTarget = self
            .api
            .post_json(
                "/api/upload-url",
                &UploadTargetRequest {
                    filename: &file.filename,
                    content_type: &file.content_type,
                },
            )
            .await
            .map_err(|e| ChatwireError::Upload(format!("presign failed for {}: {}", file.filename, e)))?;

        let response = self
            .client
            .put(&target.url)
            .header(CONTENT_TYPE, &file.content_type)
            .body(file.bytes.clone())
            .send()
            .await
            .map_err(|e| {
                ChatwireError::Upload(format!("storage upload failed for {}: {}", file.filename, e))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChatwireError::Upload(format!(
                "storage upload failed for {}: HTTP {}",
                file.filename, status
            ))
            .into());
        }

        tracing::debug!("uploaded {} -> {}", file.filename, target.public_url);
        Ok(Part::media(
            PartKind::from_mime(&file.content_type),
            target.public_url,
            file.content_type.clone(),
        ))
    }
}
