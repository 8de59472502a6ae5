// crates/newman-gate-core/tests/job.rs
// ============================================================================
// Module: Job Event Tests
// Description: Decoding of pipeline trigger events and outcome payloads.
// Purpose: Validate event field mapping and the invocation response shape.
// Dependencies: newman-gate-core, serde_json
// ============================================================================

//! ## Overview
//! Exercises [`newman_gate_core::Job::from_event`] and the serialized form of
//! [`newman_gate_core::Outcome`].

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use newman_gate_core::Job;
use newman_gate_core::Outcome;
use newman_gate_core::PipelineEvent;
use serde_json::json;

// ============================================================================
// SECTION: Event Decoding
// ============================================================================

#[test]
fn job_from_pipeline_event_maps_artifacts() {
    let event = json!({
        "CodePipeline.job": {
            "id": "11111111-abcd-1111-abcd-111111abcdef",
            "accountId": "111111111111",
            "data": {
                "actionConfiguration": {"configuration": {"FunctionName": "newman-gate"}},
                "inputArtifacts": [{
                    "name": "BuildArtifact",
                    "revision": null,
                    "location": {
                        "type": "S3",
                        "s3Location": {
                            "bucketName": "codepipeline-us-east-1-artifacts",
                            "objectKey": "pipeline/BuildArtif/abc123"
                        }
                    }
                }],
                "outputArtifacts": [],
                "artifactCredentials": {
                    "accessKeyId": "AKIAEXAMPLE",
                    "secretAccessKey": "secret",
                    "sessionToken": "token"
                }
            }
        }
    });

    let event: PipelineEvent = serde_json::from_value(event).expect("event");
    assert_eq!(event.job.account_id.as_deref(), Some("111111111111"));
    let job = Job::from_event(event, "request-1");

    assert_eq!(job.job_id, "11111111-abcd-1111-abcd-111111abcdef");
    assert_eq!(job.execution_id, "request-1");
    let artifact = job.artifact_named("BuildArtifact").expect("artifact");
    assert_eq!(artifact.location.bucket, "codepipeline-us-east-1-artifacts");
    assert_eq!(artifact.location.key, "pipeline/BuildArtif/abc123");
}

#[test]
fn job_without_input_artifacts_decodes_to_empty_list() {
    let event = json!({"CodePipeline.job": {"id": "job-1", "data": {}}});

    let event: PipelineEvent = serde_json::from_value(event).expect("event");
    let job = Job::from_event(event, "request-2");

    assert!(job.input_artifacts.is_empty());
    assert!(job.artifact_named("BuildArtifact").is_none());
}

#[test]
fn event_without_job_is_rejected() {
    let result = serde_json::from_value::<PipelineEvent>(json!({"detail": {}}));

    assert!(result.is_err());
}

// ============================================================================
// SECTION: Outcome Payload
// ============================================================================

#[test]
fn outcome_serializes_as_status_and_message() {
    let success = serde_json::to_value(Outcome::success("all good")).expect("success");
    let failure = serde_json::to_value(Outcome::failure("broken")).expect("failure");

    assert_eq!(success, json!({"status": "success", "message": "all good"}));
    assert_eq!(failure, json!({"status": "failure", "message": "broken"}));
    assert_eq!(Outcome::failure("broken").message(), "broken");
}
