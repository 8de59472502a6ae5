// crates/newman-gate-aws/tests/common/mod.rs
// ============================================================================
// Module: Common Test Utilities
// Description: Shared helpers for newman-gate-aws tests.
// Purpose: Provide static-credential clients and a recording API server.
// Dependencies: aws-sdk-codepipeline, aws-sdk-s3, tiny_http
// ============================================================================

//! ## Overview
//! Builds SDK clients with static credentials pointed at a local endpoint and
//! records the JSON API calls they make.

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

use std::thread;
use std::thread::JoinHandle;

use aws_sdk_codepipeline::config::BehaviorVersion;
use aws_sdk_codepipeline::config::Credentials;
use aws_sdk_codepipeline::config::Region;
use aws_sdk_codepipeline::config::retry::RetryConfig;
use serde_json::Value;
use tiny_http::Header;
use tiny_http::Response;
use tiny_http::Server;

// ============================================================================
// SECTION: Clients
// ============================================================================

/// Returns static test credentials.
pub fn test_credentials() -> Credentials {
    Credentials::new("AKIDNEWMANGATETEST", "test-secret-key", None, None, "newman-gate-tests")
}

/// Builds a CodePipeline client pointed at `endpoint`.
pub fn codepipeline_client(endpoint: &str) -> aws_sdk_codepipeline::Client {
    let config = aws_sdk_codepipeline::Config::builder()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(test_credentials())
        .retry_config(RetryConfig::disabled())
        .endpoint_url(endpoint)
        .build();
    aws_sdk_codepipeline::Client::from_conf(config)
}

/// Builds an S3 client with static credentials.
pub fn s3_client(endpoint: Option<&str>, force_path_style: bool) -> aws_sdk_s3::Client {
    let mut builder = aws_sdk_s3::Config::builder()
        .behavior_version(aws_sdk_s3::config::BehaviorVersion::latest())
        .region(aws_sdk_s3::config::Region::new("eu-west-1"))
        .credentials_provider(aws_sdk_s3::config::Credentials::new(
            "AKIDNEWMANGATETEST",
            "test-secret-key",
            None,
            None,
            "newman-gate-tests",
        ))
        .force_path_style(force_path_style);
    if let Some(endpoint) = endpoint {
        builder = builder.endpoint_url(endpoint);
    }
    aws_sdk_s3::Client::from_conf(builder.build())
}

// ============================================================================
// SECTION: Recording Server
// ============================================================================

/// One recorded JSON API call.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    /// `X-Amz-Target` header value.
    pub target: String,
    /// Parsed request body.
    pub body: Value,
}

/// Answers one JSON API call with `status` and `body`, recording the request.
pub fn serve_json_once(status: u16, body: &str) -> (String, JoinHandle<RecordedCall>) {
    let server = Server::http("127.0.0.1:0").expect("http server");
    let addr = server.server_addr();
    let body = body.to_string();
    let handle = thread::spawn(move || {
        let mut request = server.recv().expect("request");
        let target = request
            .headers()
            .iter()
            .find(|header| header.field.equiv("X-Amz-Target"))
            .map(|header| header.value.as_str().to_string())
            .unwrap_or_default();
        let mut raw = String::new();
        request.as_reader().read_to_string(&mut raw).expect("read body");
        let response = Response::from_string(body).with_status_code(status).with_header(
            Header::from_bytes("Content-Type", "application/x-amz-json-1.1").unwrap(),
        );
        request.respond(response).expect("respond");
        RecordedCall {
            target,
            body: serde_json::from_str(&raw).expect("json body"),
        }
    });
    (format!("http://{addr}"), handle)
}
