// crates/newman-gate-aws/src/s3.rs
// ============================================================================
// Module: S3 URL Resolver
// Description: Presigned GetObject URLs for pipeline artifacts.
// Purpose: Implement the storage side of the pipeline handler on S3.
// Dependencies: aws-sdk-s3, newman-gate-core
// ============================================================================

//! ## Overview
//! [`S3UrlResolver`] signs a `GetObject` request locally and hands the
//! resulting URL to the artifact fetcher. Signing makes no network call;
//! access problems surface when the URL is fetched.
//! Invariants:
//! - The presigned URL expires after the configured lifetime.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_s3::Client;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::presigning::PresigningConfig;
use newman_gate_config::StorageConfig;
use newman_gate_core::ResolveError;
use newman_gate_core::RetrievalUrl;
use newman_gate_core::UrlResolver;
use tracing::debug;

// ============================================================================
// SECTION: Resolver
// ============================================================================

/// Presigns S3 `GetObject` requests.
#[derive(Debug, Clone)]
pub struct S3UrlResolver {
    /// S3 client used for signing.
    client: Client,
    /// Lifetime of each presigned URL.
    expires_in: Duration,
}

impl S3UrlResolver {
    /// Creates a resolver over an existing client.
    #[must_use]
    pub const fn new(client: Client, expires_in: Duration) -> Self {
        Self {
            client,
            expires_in,
        }
    }

    /// Builds a resolver from the shared SDK config and storage settings.
    #[must_use]
    pub fn from_config(shared: &SdkConfig, storage: &StorageConfig) -> Self {
        let mut builder = aws_sdk_s3::config::Builder::from(shared);
        if let Some(endpoint) = &storage.endpoint {
            builder = builder.endpoint_url(endpoint.trim());
        }
        if storage.force_path_style {
            builder = builder.force_path_style(true);
        }
        Self::new(
            Client::from_conf(builder.build()),
            Duration::from_secs(storage.presign_expiry_secs),
        )
    }

    /// Returns the URL lifetime.
    #[must_use]
    pub const fn expires_in(&self) -> Duration {
        self.expires_in
    }
}

#[async_trait]
impl UrlResolver for S3UrlResolver {
    async fn resolve(&self, bucket: &str, key: &str) -> Result<RetrievalUrl, ResolveError> {
        let presigning = PresigningConfig::expires_in(self.expires_in)
            .map_err(|err| ResolveError::Config(DisplayErrorContext(&err).to_string()))?;
        let request = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|err| ResolveError::Storage(DisplayErrorContext(&err).to_string()))?;
        let url = RetrievalUrl::parse(request.uri())?;
        debug!(bucket, key, url = %url, "presigned artifact url");
        Ok(url)
    }
}
