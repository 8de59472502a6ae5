// crates/newman-gate-aws/src/codepipeline.rs
// ============================================================================
// Module: CodePipeline Reporter
// Description: Job result reporting through the CodePipeline API.
// Purpose: Implement the reporting side of the pipeline handler.
// Dependencies: aws-sdk-codepipeline, newman-gate-core
// ============================================================================

//! ## Overview
//! [`CodePipelineReporter`] maps a success onto `PutJobSuccessResult` with
//! `percentComplete = 100` and a failure onto `PutJobFailureResult` with type
//! `JobFailed`. Text fields are truncated to the API limits so an oversized
//! reason never turns a failure report into a validation error.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_codepipeline::Client;
use aws_sdk_codepipeline::error::DisplayErrorContext;
use aws_sdk_codepipeline::types::ExecutionDetails;
use aws_sdk_codepipeline::types::FailureDetails;
use aws_sdk_codepipeline::types::FailureType;
use newman_gate_core::ReportError;
use newman_gate_core::ResultReporter;
use tracing::info;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum characters of a success summary.
pub const MAX_SUMMARY_CHARS: usize = 2048;
/// Maximum characters of a failure message.
pub const MAX_FAILURE_MESSAGE_CHARS: usize = 5000;
/// Maximum characters of an external execution id.
const MAX_EXECUTION_ID_CHARS: usize = 1500;

// ============================================================================
// SECTION: Reporter
// ============================================================================

/// Reports job results to CodePipeline.
#[derive(Debug, Clone)]
pub struct CodePipelineReporter {
    /// CodePipeline client.
    client: Client,
}

impl CodePipelineReporter {
    /// Creates a reporter over an existing client.
    #[must_use]
    pub const fn new(client: Client) -> Self {
        Self {
            client,
        }
    }

    /// Builds a reporter from the shared SDK config.
    #[must_use]
    pub fn from_config(shared: &SdkConfig) -> Self {
        Self::new(Client::new(shared))
    }
}

#[async_trait]
impl ResultReporter for CodePipelineReporter {
    async fn report_success(
        &self,
        job_id: &str,
        execution_id: &str,
        summary: &str,
    ) -> Result<(), ReportError> {
        let details = ExecutionDetails::builder()
            .summary(truncate_chars(summary, MAX_SUMMARY_CHARS))
            .external_execution_id(truncate_chars(execution_id, MAX_EXECUTION_ID_CHARS))
            .percent_complete(100)
            .build();
        self.client
            .put_job_success_result()
            .job_id(job_id)
            .execution_details(details)
            .send()
            .await
            .map_err(|err| ReportError::Delivery(DisplayErrorContext(&err).to_string()))?;
        info!(job_id, "reported job success");
        Ok(())
    }

    async fn report_failure(
        &self,
        job_id: &str,
        execution_id: &str,
        reason: &str,
    ) -> Result<(), ReportError> {
        let details = FailureDetails::builder()
            .r#type(FailureType::JobFailed)
            .message(truncate_chars(reason, MAX_FAILURE_MESSAGE_CHARS))
            .external_execution_id(truncate_chars(execution_id, MAX_EXECUTION_ID_CHARS))
            .build()
            .map_err(|err| ReportError::Invalid(DisplayErrorContext(&err).to_string()))?;
        self.client
            .put_job_failure_result()
            .job_id(job_id)
            .failure_details(details)
            .send()
            .await
            .map_err(|err| ReportError::Delivery(DisplayErrorContext(&err).to_string()))?;
        info!(job_id, "reported job failure");
        Ok(())
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns the longest prefix of `text` with at most `max_chars` characters.
#[must_use]
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((index, _)) => &text[.. index],
        None => text,
    }
}
