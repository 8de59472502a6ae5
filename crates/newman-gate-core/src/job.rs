// crates/newman-gate-core/src/job.rs
// ============================================================================
// Module: Newman Gate Jobs
// Description: Pipeline job model and trigger event decoding.
// Purpose: Turn a CodePipeline invocation event into a typed job.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`Job`] identifies one invocation of the pipeline step. It is built from
//! the CodePipeline Lambda event ([`PipelineEvent`]) plus the execution
//! identifier supplied by the hosting runtime.
//! Invariants:
//! - Jobs are immutable once built.
//! - Unknown event fields are ignored.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Logical name of the input artifact that carries the test bundle.
pub const DEFAULT_BUILD_ARTIFACT_NAME: &str = "BuildArtifact";

// ============================================================================
// SECTION: Job Model
// ============================================================================

/// Storage location of an input artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageLocation {
    /// Bucket holding the artifact.
    pub bucket: String,
    /// Object key of the artifact.
    pub key: String,
}

/// Named reference to an artifact in object storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputArtifact {
    /// Logical artifact name assigned by the pipeline.
    pub name: String,
    /// Storage location of the artifact bytes.
    pub location: StorageLocation,
}

impl InputArtifact {
    /// Creates an input artifact descriptor.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        bucket: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            location: StorageLocation {
                bucket: bucket.into(),
                key: key.into(),
            },
        }
    }
}

/// One invocation of the pipeline step.
///
/// # Invariants
/// - `job_id` is echoed back unchanged in the result report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    /// Pipeline job identifier.
    pub job_id: String,
    /// Execution identifier used for correlation with the reporter.
    pub execution_id: String,
    /// Input artifacts supplied by the pipeline.
    pub input_artifacts: Vec<InputArtifact>,
}

impl Job {
    /// Builds a job from a decoded trigger event.
    #[must_use]
    pub fn from_event(event: PipelineEvent, execution_id: impl Into<String>) -> Self {
        let input_artifacts = event
            .job
            .data
            .input_artifacts
            .into_iter()
            .map(|artifact| InputArtifact {
                name: artifact.name,
                location: StorageLocation {
                    bucket: artifact.location.s3_location.bucket_name,
                    key: artifact.location.s3_location.object_key,
                },
            })
            .collect();
        Self {
            job_id: event.job.id,
            execution_id: execution_id.into(),
            input_artifacts,
        }
    }

    /// Returns the first input artifact with the provided logical name.
    #[must_use]
    pub fn artifact_named(&self, name: &str) -> Option<&InputArtifact> {
        self.input_artifacts.iter().find(|artifact| artifact.name == name)
    }
}

// ============================================================================
// SECTION: Trigger Event
// ============================================================================

/// CodePipeline Lambda invocation event.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineEvent {
    /// Job metadata.
    #[serde(rename = "CodePipeline.job")]
    pub job: PipelineJob,
}

/// Job metadata within a [`PipelineEvent`].
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineJob {
    /// Job identifier.
    pub id: String,
    /// Account that owns the pipeline.
    #[serde(rename = "accountId", default)]
    pub account_id: Option<String>,
    /// Job data.
    pub data: PipelineJobData,
}

/// Job data within a [`PipelineJob`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PipelineJobData {
    /// Input artifacts.
    #[serde(rename = "inputArtifacts", default)]
    pub input_artifacts: Vec<PipelineArtifact>,
}

/// Artifact descriptor within a [`PipelineJobData`].
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineArtifact {
    /// Logical artifact name.
    pub name: String,
    /// Artifact location.
    pub location: PipelineArtifactLocation,
}

/// Location wrapper within a [`PipelineArtifact`].
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineArtifactLocation {
    /// S3 location of the artifact.
    #[serde(rename = "s3Location")]
    pub s3_location: PipelineS3Location,
}

/// S3 location within a [`PipelineArtifactLocation`].
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineS3Location {
    /// Bucket name.
    #[serde(rename = "bucketName")]
    pub bucket_name: String,
    /// Object key.
    #[serde(rename = "objectKey")]
    pub object_key: String,
}
