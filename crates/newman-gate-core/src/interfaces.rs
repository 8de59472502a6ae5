// crates/newman-gate-core/src/interfaces.rs
// ============================================================================
// Module: Newman Gate Interfaces
// Description: Collaborator traits for storage access and result reporting.
// Purpose: Keep cloud clients injectable so the pipeline can run against fakes.
// Dependencies: async-trait, thiserror, url
// ============================================================================

//! ## Overview
//! The pipeline talks to two external services: object storage (to mint a
//! short-lived retrieval URL) and the orchestrating pipeline (to report the
//! job result). Both are modelled as traits and passed into
//! [`crate::PipelineHandler`] explicitly.
//! Invariants:
//! - Implementations do not retry; failures propagate to the caller.
//! - [`RetrievalUrl`] never renders its query string.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;
use url::Url;

// ============================================================================
// SECTION: Retrieval URL
// ============================================================================

/// Time-limited credentialed URL for one storage object.
///
/// # Invariants
/// - `Debug` and `Display` omit the query string, which carries the signature.
#[derive(Clone, PartialEq, Eq)]
pub struct RetrievalUrl(Url);

impl RetrievalUrl {
    /// Parses a retrieval URL.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::InvalidUrl`] when the URL does not parse.
    pub fn parse(raw: &str) -> Result<Self, ResolveError> {
        Url::parse(raw)
            .map(Self)
            .map_err(|err| ResolveError::InvalidUrl(err.to_string()))
    }

    /// Returns the full URL, including credentials.
    #[must_use]
    pub fn expose(&self) -> &Url {
        &self.0
    }

    /// Returns the URL without its query string or fragment.
    #[must_use]
    pub fn redacted(&self) -> String {
        let mut url = self.0.clone();
        url.set_query(None);
        url.set_fragment(None);
        url.to_string()
    }
}

impl fmt::Debug for RetrievalUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RetrievalUrl").field(&self.redacted()).finish()
    }
}

impl fmt::Display for RetrievalUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted())
    }
}

// ============================================================================
// SECTION: URL Resolver
// ============================================================================

/// Errors returned while obtaining a retrieval URL.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Storage service rejected the signing request.
    #[error("storage service rejected the request: {0}")]
    Storage(String),
    /// Signing configuration is invalid.
    #[error("invalid signing configuration: {0}")]
    Config(String),
    /// Signed URL failed to parse.
    #[error("signed url is invalid: {0}")]
    InvalidUrl(String),
}

/// Mints short-lived retrieval URLs for storage objects.
#[async_trait]
pub trait UrlResolver: Send + Sync {
    /// Returns a time-limited URL for `bucket`/`key`.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError`] when the storage service refuses to sign.
    async fn resolve(&self, bucket: &str, key: &str) -> Result<RetrievalUrl, ResolveError>;
}

// ============================================================================
// SECTION: Result Reporter
// ============================================================================

/// Errors returned by the result reporter.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Report request could not be built.
    #[error("invalid job result report: {0}")]
    Invalid(String),
    /// Orchestrator rejected or never received the report.
    #[error("job result report failed: {0}")]
    Delivery(String),
}

/// Reports the terminal job result to the orchestrating pipeline.
#[async_trait]
pub trait ResultReporter: Send + Sync {
    /// Reports a successful job.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError`] when the report cannot be delivered.
    async fn report_success(
        &self,
        job_id: &str,
        execution_id: &str,
        summary: &str,
    ) -> Result<(), ReportError>;

    /// Reports a failed job.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError`] when the report cannot be delivered.
    async fn report_failure(
        &self,
        job_id: &str,
        execution_id: &str,
        reason: &str,
    ) -> Result<(), ReportError>;
}
