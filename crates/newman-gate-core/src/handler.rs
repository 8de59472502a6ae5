// crates/newman-gate-core/src/handler.rs
// ============================================================================
// Module: Newman Gate Pipeline Handler
// Description: Orchestrates one pipeline job from trigger to result report.
// Purpose: Sequence every stage and report exactly one outcome.
// Dependencies: tracing
// ============================================================================

//! ## Overview
//! [`PipelineHandler`] owns the control flow of a job:
//! `ReceivingJob → ResolvingArtifact → Fetching → Extracting → Validating →
//! Executing → Reporting → Done`. Any stage failure jumps straight to
//! `Reporting` with a failure outcome.
//! Invariants:
//! - One outcome is reported per [`PipelineHandler::handle`] call. A rejected
//!   success report is followed by a single failure report.
//! - Only a failing failure report escapes as an error.
//! - Files created by a job are removed when the job ends; a job that lost
//!   the download race never touches the other job's files.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::engine::TestEngine;
use crate::error::StepError;
use crate::extract::ArchiveExtractor;
use crate::extract::DEFAULT_MAX_EXTRACTED_BYTES;
use crate::fetch::ArtifactFetcher;
use crate::fetch::FetchError;
use crate::interfaces::ReportError;
use crate::interfaces::ResultReporter;
use crate::interfaces::UrlResolver;
use crate::job::DEFAULT_BUILD_ARTIFACT_NAME;
use crate::job::Job;
use crate::outcome::Outcome;
use crate::runner::TestRunner;
use crate::validate::ArtifactValidator;
use crate::validate::RequiredFiles;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default download location of the build artifact.
pub const DEFAULT_DOWNLOAD_PATH: &str = "/tmp/BuildArtifact.zip";
/// Default extraction directory.
pub const DEFAULT_EXTRACT_DIR: &str = "/tmp/dist";
/// Failure reason sent when the success report is rejected.
pub const SUCCESS_REPORT_FAILED_REASON: &str = "unable to report job success";

// ============================================================================
// SECTION: Stages
// ============================================================================

/// Pipeline stage, used for logging and error attribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Inspecting the trigger event.
    ReceivingJob,
    /// Obtaining the retrieval URL.
    ResolvingArtifact,
    /// Downloading the archive.
    Fetching,
    /// Unpacking the archive.
    Extracting,
    /// Checking required files.
    Validating,
    /// Running the collection.
    Executing,
    /// Sending the outcome to the orchestrator.
    Reporting,
    /// Job finished.
    Done,
}

impl Stage {
    /// Returns a stable label for the stage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ReceivingJob => "receiving_job",
            Self::ResolvingArtifact => "resolving_artifact",
            Self::Fetching => "fetching",
            Self::Extracting => "extracting",
            Self::Validating => "validating",
            Self::Executing => "executing",
            Self::Reporting => "reporting",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Settings
// ============================================================================

/// Job-independent handler settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerSettings {
    /// Logical name of the input artifact to test.
    pub artifact_name: String,
    /// Fixed download location of the archive.
    pub download_path: PathBuf,
    /// Directory the archive is extracted into.
    pub extract_dir: PathBuf,
    /// Entry paths of the required files.
    pub required_files: RequiredFiles,
    /// Cap on total extracted bytes.
    pub max_extracted_bytes: u64,
}

impl Default for HandlerSettings {
    fn default() -> Self {
        Self {
            artifact_name: DEFAULT_BUILD_ARTIFACT_NAME.to_string(),
            download_path: PathBuf::from(DEFAULT_DOWNLOAD_PATH),
            extract_dir: PathBuf::from(DEFAULT_EXTRACT_DIR),
            required_files: RequiredFiles::default(),
            max_extracted_bytes: DEFAULT_MAX_EXTRACTED_BYTES,
        }
    }
}

// ============================================================================
// SECTION: Builder
// ============================================================================

/// Errors returned when assembling a handler.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum HandlerBuildError {
    /// No URL resolver was configured.
    #[error("pipeline handler requires a url resolver")]
    MissingResolver,
    /// No result reporter was configured.
    #[error("pipeline handler requires a result reporter")]
    MissingReporter,
    /// No test engine was configured.
    #[error("pipeline handler requires a test engine")]
    MissingEngine,
    /// Default fetcher could not be built.
    #[error("pipeline handler fetcher unavailable: {0}")]
    Fetcher(#[from] FetchError),
}

/// Builder for [`PipelineHandler`].
#[derive(Default)]
pub struct PipelineHandlerBuilder {
    /// Handler settings.
    settings: HandlerSettings,
    /// Storage collaborator.
    resolver: Option<Arc<dyn UrlResolver>>,
    /// Orchestrator collaborator.
    reporter: Option<Arc<dyn ResultReporter>>,
    /// Test engine collaborator.
    engine: Option<Arc<dyn TestEngine>>,
}

impl PipelineHandlerBuilder {
    /// Replaces the handler settings.
    #[must_use]
    pub fn settings(mut self, settings: HandlerSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Sets the URL resolver.
    #[must_use]
    pub fn resolver(mut self, resolver: Arc<dyn UrlResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Sets the result reporter.
    #[must_use]
    pub fn reporter(mut self, reporter: Arc<dyn ResultReporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    /// Sets the test engine.
    #[must_use]
    pub fn engine(mut self, engine: Arc<dyn TestEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Builds the handler.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerBuildError`] when a collaborator is missing or the
    /// default fetcher cannot be built.
    pub fn build(self) -> Result<PipelineHandler, HandlerBuildError> {
        let resolver = self.resolver.ok_or(HandlerBuildError::MissingResolver)?;
        let reporter = self.reporter.ok_or(HandlerBuildError::MissingReporter)?;
        let engine = self.engine.ok_or(HandlerBuildError::MissingEngine)?;
        let fetcher = ArtifactFetcher::new()?;
        Ok(PipelineHandler {
            extractor: ArchiveExtractor::with_limit(self.settings.max_extracted_bytes),
            validator: ArtifactValidator::new(self.settings.required_files.clone()),
            runner: TestRunner::new(engine),
            settings: self.settings,
            resolver,
            reporter,
            fetcher,
        })
    }
}

// ============================================================================
// SECTION: Handler
// ============================================================================

/// Runs one pipeline job end to end.
pub struct PipelineHandler {
    /// Handler settings.
    settings: HandlerSettings,
    /// Storage collaborator.
    resolver: Arc<dyn UrlResolver>,
    /// Orchestrator collaborator.
    reporter: Arc<dyn ResultReporter>,
    /// Artifact downloader.
    fetcher: ArtifactFetcher,
    /// Archive extractor.
    extractor: ArchiveExtractor,
    /// Required-file validator.
    validator: ArtifactValidator,
    /// Test execution adapter.
    runner: TestRunner,
}

impl PipelineHandler {
    /// Returns a handler builder.
    #[must_use]
    pub fn builder() -> PipelineHandlerBuilder {
        PipelineHandlerBuilder::default()
    }

    /// Runs `job` and reports its outcome.
    ///
    /// Returns the outcome the orchestrator accepted.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError`] only when a failure report cannot be delivered.
    pub async fn handle(&self, job: &Job) -> Result<Outcome, ReportError> {
        info!(
            job_id = %job.job_id,
            execution_id = %job.execution_id,
            artifacts = job.input_artifacts.len(),
            stage = %Stage::ReceivingJob,
            "received pipeline job"
        );
        let mut workspace = JobWorkspace::default();
        let outcome = match self.execute(job, &mut workspace).await {
            Ok(outcome) => outcome,
            Err(err) => {
                error!(
                    job_id = %job.job_id,
                    stage = %err.stage(),
                    error = %err,
                    "pipeline step failed"
                );
                Outcome::failure(err.to_string())
            }
        };
        workspace.clean();
        let outcome = self.report(job, outcome).await?;
        info!(job_id = %job.job_id, stage = %Stage::Done, outcome = %outcome, "job finished");
        Ok(outcome)
    }

    /// Runs the stages before reporting.
    async fn execute(&self, job: &Job, workspace: &mut JobWorkspace) -> Result<Outcome, StepError> {
        if job.input_artifacts.is_empty() {
            return Err(StepError::NoInputArtifacts);
        }
        let artifact = job
            .artifact_named(&self.settings.artifact_name)
            .ok_or_else(|| StepError::MissingArtifact(self.settings.artifact_name.clone()))?;

        info!(
            job_id = %job.job_id,
            stage = %Stage::ResolvingArtifact,
            artifact = %artifact.name,
            "resolving build artifact"
        );
        let url = self
            .resolver
            .resolve(&artifact.location.bucket, &artifact.location.key)
            .await
            .map_err(StepError::StorageAccess)?;

        info!(job_id = %job.job_id, stage = %Stage::Fetching, url = %url, "downloading artifact");
        let bytes = self.fetcher.fetch(&url, &self.settings.download_path).await?;
        workspace.download = Some(self.settings.download_path.clone());
        info!(job_id = %job.job_id, bytes, "downloaded build artifact");

        info!(job_id = %job.job_id, stage = %Stage::Extracting, "extracting build artifact");
        workspace.extract_dir = Some(self.settings.extract_dir.clone());
        let entries =
            self.extractor.extract(&self.settings.download_path, &self.settings.extract_dir).await?;

        info!(
            job_id = %job.job_id,
            stage = %Stage::Validating,
            entries = entries.len(),
            "checking required files"
        );
        let files = self.validator.validate(entries)?;

        info!(job_id = %job.job_id, stage = %Stage::Executing, "running test collection");
        Ok(self.runner.run(&files.collection, &files.environment).await)
    }

    /// Sends the outcome to the orchestrator and returns the reported outcome.
    async fn report(&self, job: &Job, outcome: Outcome) -> Result<Outcome, ReportError> {
        info!(
            job_id = %job.job_id,
            stage = %Stage::Reporting,
            success = outcome.is_success(),
            "reporting job result"
        );
        let outcome = match outcome {
            Outcome::Success(summary) => {
                let delivered =
                    self.reporter.report_success(&job.job_id, &job.execution_id, &summary).await;
                if let Err(err) = delivered {
                    error!(
                        job_id = %job.job_id,
                        error = %err,
                        "success report failed; reporting failure"
                    );
                    Outcome::failure(SUCCESS_REPORT_FAILED_REASON)
                } else {
                    return Ok(Outcome::Success(summary));
                }
            }
            failure @ Outcome::Failure(_) => failure,
        };
        let result =
            self.reporter.report_failure(&job.job_id, &job.execution_id, outcome.message()).await;
        if let Err(err) = &result {
            error!(job_id = %job.job_id, error = %err, "job result report failed");
        }
        result.map(|()| outcome)
    }
}

// ============================================================================
// SECTION: Workspace
// ============================================================================

/// Files created by the current job.
///
/// # Invariants
/// - Paths are recorded only after this job created them.
#[derive(Debug, Default)]
struct JobWorkspace {
    /// Downloaded archive owned by this job.
    download: Option<PathBuf>,
    /// Extraction directory owned by this job.
    extract_dir: Option<PathBuf>,
}

impl JobWorkspace {
    /// Removes every recorded path.
    fn clean(&mut self) {
        if let Some(path) = self.download.take() {
            log_removal(fs::remove_file(&path));
        }
        if let Some(path) = self.extract_dir.take() {
            log_removal(fs::remove_dir_all(&path));
        }
    }
}

impl Drop for JobWorkspace {
    fn drop(&mut self) {
        self.clean();
    }
}

/// Logs a failed removal; paths that are already gone are fine.
fn log_removal(result: std::io::Result<()>) {
    match result {
        Ok(()) => {}
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => warn!(error = %err, "failed to clean job workspace"),
    }
}
