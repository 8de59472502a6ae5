// crates/newman-gate-core/src/fetch.rs
// ============================================================================
// Module: Newman Gate Artifact Fetcher
// Description: Streaming HTTP download of the build artifact.
// Purpose: Write the artifact to a fresh local file, never overwriting.
// Dependencies: reqwest, tokio
// ============================================================================

//! ## Overview
//! [`ArtifactFetcher`] downloads a [`RetrievalUrl`] into a destination path that
//! must not exist yet.
//! Invariants:
//! - The destination is created with create-new semantics before any request.
//! - Only HTTP 200 is accepted; redirects are not followed.
//! - On failure after the destination was created, the partial file is removed.
//! - On success the file content equals the response body byte for byte.
//! - Error messages never include the signed URL.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::ErrorKind;
use std::path::Path;

use reqwest::Client;
use reqwest::StatusCode;
use reqwest::redirect::Policy;
use thiserror::Error;
use tokio::fs::File;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::debug;
use tracing::warn;

use crate::interfaces::RetrievalUrl;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors returned by the artifact fetcher.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - Messages carry no local paths or URLs.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Destination already exists; nothing was written.
    #[error("download destination already exists")]
    AlreadyExists,
    /// URL scheme is not HTTP(S).
    #[error("unsupported url scheme: {0}")]
    UnsupportedScheme(String),
    /// Server answered with a status other than 200.
    #[error("server responded with {code}: {reason}")]
    Status {
        /// HTTP status code.
        code: u16,
        /// HTTP reason phrase.
        reason: String,
    },
    /// Network-level failure.
    #[error("transport failure: {0}")]
    Transport(String),
    /// Local file I/O failure.
    #[error("download io failure: {0}")]
    Io(String),
}

impl FetchError {
    /// Returns true when the failure was caused by a pre-existing destination.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::AlreadyExists)
    }
}

// ============================================================================
// SECTION: Fetcher
// ============================================================================

/// Streams artifacts from retrieval URLs to local files.
#[derive(Debug, Clone)]
pub struct ArtifactFetcher {
    /// HTTP client used for downloads.
    client: Client,
}

impl ArtifactFetcher {
    /// Builds a fetcher with a client that does not follow redirects.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Transport`] when the HTTP client cannot be built.
    pub fn new() -> Result<Self, FetchError> {
        let client = Client::builder()
            .redirect(Policy::none())
            .build()
            .map_err(|err| FetchError::Transport(err.without_url().to_string()))?;
        Ok(Self {
            client,
        })
    }

    /// Downloads `url` into `destination` and returns the number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::AlreadyExists`] when `destination` exists, and a
    /// transport, status, or I/O error when the download fails. Apart from the
    /// conflict case, a failed download leaves no file at `destination`.
    pub async fn fetch(&self, url: &RetrievalUrl, destination: &Path) -> Result<u64, FetchError> {
        match url.expose().scheme() {
            "http" | "https" => {}
            scheme => return Err(FetchError::UnsupportedScheme(scheme.to_string())),
        }
        let file = match OpenOptions::new().write(true).create_new(true).open(destination).await {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                return Err(FetchError::AlreadyExists);
            }
            Err(err) => return Err(FetchError::Io(err.to_string())),
        };
        debug!(url = %url, "downloading artifact");
        match self.stream_into(url, file).await {
            Ok(written) => Ok(written),
            Err(err) => {
                remove_partial(destination).await;
                Err(err)
            }
        }
    }

    /// Streams the response body into an open file.
    async fn stream_into(&self, url: &RetrievalUrl, mut file: File) -> Result<u64, FetchError> {
        let mut response = self
            .client
            .get(url.expose().clone())
            .send()
            .await
            .map_err(|err| FetchError::Transport(err.without_url().to_string()))?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Status {
                code: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }
        let mut written = 0u64;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|err| FetchError::Transport(err.without_url().to_string()))?
        {
            file.write_all(&chunk).await.map_err(|err| FetchError::Io(err.to_string()))?;
            let len = u64::try_from(chunk.len()).unwrap_or(u64::MAX);
            written = written.saturating_add(len);
        }
        file.flush().await.map_err(|err| FetchError::Io(err.to_string()))?;
        file.sync_all().await.map_err(|err| FetchError::Io(err.to_string()))?;
        Ok(written)
    }
}

/// Removes a partially written download.
async fn remove_partial(destination: &Path) {
    match tokio::fs::remove_file(destination).await {
        Ok(()) => {}
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => warn!(error = %err, "failed to remove partial download"),
    }
}
