// crates/newman-gate-core/src/error.rs
// ============================================================================
// Module: Newman Gate Step Errors
// Description: Error taxonomy for every stage of the pipeline step.
// Purpose: Map stage failures onto short, reportable reasons.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! [`StepError`] aggregates the component errors. Its `Display` text is the
//! failure reason sent to the orchestrator, so messages never contain local
//! paths, signed URLs, or backtraces.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::extract::ExtractError;
use crate::fetch::FetchError;
use crate::handler::Stage;
use crate::interfaces::ResolveError;
use crate::runner::MalformedInputError;
use crate::validate::ValidationError;

// ============================================================================
// SECTION: Step Error
// ============================================================================

/// Failure of one pipeline stage.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - `Display` output is safe to report to the orchestrator.
#[derive(Debug, Error)]
pub enum StepError {
    /// Job carried no input artifacts.
    #[error("no input artifacts found")]
    NoInputArtifacts,
    /// Job carried no artifact with the designated name.
    #[error("unable to find the {0} input artifact")]
    MissingArtifact(String),
    /// Storage service refused to issue a retrieval URL.
    #[error("unable to obtain a retrieval url for the build artifact: {0}")]
    StorageAccess(ResolveError),
    /// Download destination already existed.
    #[error("build artifact download refused: {0}")]
    ResourceConflict(FetchError),
    /// Download failed.
    #[error("build artifact download failed: {0}")]
    Transport(FetchError),
    /// Archive could not be extracted.
    #[error("build artifact extraction failed: {0}")]
    Extraction(#[from] ExtractError),
    /// Required files were missing or unreadable.
    #[error("{0}")]
    Validation(#[from] ValidationError),
    /// Collection or environment did not parse.
    #[error("malformed test input: {0}")]
    MalformedInput(#[from] MalformedInputError),
    /// Engine failed or flagged a run-level error.
    #[error("there was an error running the test engine")]
    TestEngine(String),
    /// Engine ran cleanly but assertions failed.
    #[error("the test engine encountered failures")]
    TestAssertion {
        /// Number of recorded failures.
        failures: usize,
    },
}

impl From<FetchError> for StepError {
    fn from(err: FetchError) -> Self {
        if err.is_conflict() { Self::ResourceConflict(err) } else { Self::Transport(err) }
    }
}

impl StepError {
    /// Returns the stage in which the error occurred.
    #[must_use]
    pub const fn stage(&self) -> Stage {
        match self {
            Self::NoInputArtifacts | Self::MissingArtifact(_) => Stage::ReceivingJob,
            Self::StorageAccess(_) => Stage::ResolvingArtifact,
            Self::ResourceConflict(_) | Self::Transport(_) => Stage::Fetching,
            Self::Extraction(_) => Stage::Extracting,
            Self::Validation(_) => Stage::Validating,
            Self::MalformedInput(_) | Self::TestEngine(_) | Self::TestAssertion {
                ..
            } => Stage::Executing,
        }
    }
}
