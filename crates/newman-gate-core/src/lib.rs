// crates/newman-gate-core/src/lib.rs
// ============================================================================
// Module: Newman Gate Core Library
// Description: Pipeline step that gates a build on a newman test run.
// Purpose: Fetch, unpack, validate, test, and report one pipeline job.
// Dependencies: reqwest, tokio, zip, serde_json, tracing
// ============================================================================

//! ## Overview
//! `newman-gate-core` implements the cloud-agnostic half of the test gate:
//! [`PipelineHandler`] resolves the build artifact through a [`UrlResolver`],
//! streams it to disk with [`ArtifactFetcher`], unpacks it with
//! [`ArchiveExtractor`], checks for the collection and environment files with
//! [`ArtifactValidator`], runs them through a [`TestEngine`], and reports the
//! single [`Outcome`] through a [`ResultReporter`].
//! Invariants:
//! - Every handled job produces exactly one report call.
//! - Failure reasons never carry signed URLs or local paths.
//!
//! Security posture: archive contents and retrieval URLs are untrusted.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod engine;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod handler;
pub mod interfaces;
pub mod job;
pub mod outcome;
pub mod runner;
pub mod validate;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use engine::EngineError;
pub use engine::EngineEvent;
pub use engine::EngineEvents;
pub use engine::EngineRequest;
pub use engine::EngineRun;
pub use engine::NewmanEngine;
pub use engine::NewmanEngineConfig;
pub use engine::RunSummary;
pub use engine::TestEngine;
pub use error::StepError;
pub use extract::ArchiveEntry;
pub use extract::ArchiveExtractor;
pub use extract::ExtractError;
pub use fetch::ArtifactFetcher;
pub use fetch::FetchError;
pub use handler::HandlerBuildError;
pub use handler::HandlerSettings;
pub use handler::PipelineHandler;
pub use handler::PipelineHandlerBuilder;
pub use handler::Stage;
pub use interfaces::ReportError;
pub use interfaces::ResolveError;
pub use interfaces::ResultReporter;
pub use interfaces::RetrievalUrl;
pub use interfaces::UrlResolver;
pub use job::InputArtifact;
pub use job::Job;
pub use job::PipelineEvent;
pub use outcome::Outcome;
pub use runner::TestRunner;
pub use validate::ArtifactValidator;
pub use validate::ExtractedFileSet;
pub use validate::RequiredFiles;
pub use validate::ValidatedFiles;
pub use validate::ValidationError;
