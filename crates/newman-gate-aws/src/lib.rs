// crates/newman-gate-aws/src/lib.rs
// ============================================================================
// Module: Newman Gate AWS Library
// Description: AWS implementations of the storage and reporting interfaces.
// Purpose: Connect the pipeline handler to S3 and CodePipeline.
// Dependencies: aws-config, aws-sdk-s3, aws-sdk-codepipeline, newman-gate-core
// ============================================================================

//! ## Overview
//! [`S3UrlResolver`] presigns `GetObject` requests for the build artifact and
//! [`CodePipelineReporter`] sends the job result back to CodePipeline. Both
//! are built from one shared SDK configuration loaded by
//! [`load_sdk_config`].
//! Invariants:
//! - Neither adapter retries beyond the SDK's default policy.
//! - Error text is rendered with its full source chain but never includes
//!   credentials or signed URLs.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod codepipeline;
pub mod s3;
pub mod sdk;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use codepipeline::CodePipelineReporter;
pub use codepipeline::MAX_FAILURE_MESSAGE_CHARS;
pub use codepipeline::MAX_SUMMARY_CHARS;
pub use codepipeline::truncate_chars;
pub use s3::S3UrlResolver;
pub use sdk::load_sdk_config;
