// crates/newman-gate-core/tests/common/mod.rs
// ============================================================================
// Module: Common Test Utilities
// Description: Shared fakes and fixtures for newman-gate-core tests.
// Purpose: Provide recording collaborators, scripted engines, and servers.
// Dependencies: newman-gate-core, tiny_http, zip
// ============================================================================

//! ## Overview
//! Provides fake storage and reporting collaborators, scripted test engines,
//! in-memory zip builders, and one-shot HTTP servers.

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

use std::io::Cursor;
use std::io::Write;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::thread;
use std::thread::JoinHandle;

use async_trait::async_trait;
use newman_gate_core::EngineError;
use newman_gate_core::EngineRequest;
use newman_gate_core::EngineRun;
use newman_gate_core::HandlerSettings;
use newman_gate_core::InputArtifact;
use newman_gate_core::Job;
use newman_gate_core::ReportError;
use newman_gate_core::ResolveError;
use newman_gate_core::ResultReporter;
use newman_gate_core::RetrievalUrl;
use newman_gate_core::RunSummary;
use newman_gate_core::TestEngine;
use newman_gate_core::UrlResolver;
use newman_gate_core::engine::RunFailure;
use tempfile::TempDir;
use tiny_http::Response;
use tiny_http::Server;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Minimal collection document.
pub const COLLECTION_JSON: &str =
    r#"{"info":{"name":"smoke","schema":"https://schema.getpostman.com/json/collection/v2.1.0/collection.json"},"item":[]}"#;

/// Minimal environment document.
pub const ENVIRONMENT_JSON: &str = r#"{"name":"development","values":[]}"#;

/// Builds an in-memory zip archive from `(path, bytes)` pairs.
pub fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (path, bytes) in entries {
        writer.start_file(*path, SimpleFileOptions::default()).expect("start zip entry");
        writer.write_all(bytes).expect("write zip entry");
    }
    writer.finish().expect("finish zip").into_inner()
}

/// Builds an archive with both required files plus extra entries.
pub fn artifact_zip(extra: &[(&str, &[u8])]) -> Vec<u8> {
    let mut entries: Vec<(&str, &[u8])> = vec![
        ("newman.tests.json", COLLECTION_JSON.as_bytes()),
        ("newman.development.env.json", ENVIRONMENT_JSON.as_bytes()),
    ];
    entries.extend_from_slice(extra);
    zip_bytes(&entries)
}

/// Returns handler settings rooted in a temporary directory.
pub fn temp_settings(dir: &TempDir) -> HandlerSettings {
    HandlerSettings {
        download_path: dir.path().join("BuildArtifact.zip"),
        extract_dir: dir.path().join("dist"),
        ..HandlerSettings::default()
    }
}

/// Builds a job carrying one `BuildArtifact` input.
pub fn build_job(job_id: &str) -> Job {
    Job {
        job_id: job_id.to_string(),
        execution_id: format!("exec-{job_id}"),
        input_artifacts: vec![InputArtifact::new(
            "BuildArtifact",
            "artifact-bucket",
            "builds/app.zip",
        )],
    }
}

// ============================================================================
// SECTION: HTTP Servers
// ============================================================================

/// Serves `body` with `status` for `requests` requests and returns the base URL.
pub fn serve(body: Vec<u8>, status: u16, requests: usize) -> (String, JoinHandle<()>) {
    let server = Server::http("127.0.0.1:0").expect("http server");
    let addr = server.server_addr();
    let handle = thread::spawn(move || {
        for _ in 0 .. requests {
            if let Ok(request) = server.recv() {
                let response = Response::from_data(body.clone()).with_status_code(status);
                request.respond(response).expect("respond");
            }
        }
    });
    (format!("http://{addr}/artifact.zip?X-Amz-Signature=secret"), handle)
}

// ============================================================================
// SECTION: Collaborators
// ============================================================================

/// Resolver that returns a fixed URL or a fixed error.
pub struct FakeResolver {
    /// URL to return; `None` returns a storage error.
    url: Option<String>,
    /// Number of resolve calls.
    pub calls: AtomicUsize,
    /// Recorded `(bucket, key)` pairs.
    pub requests: Mutex<Vec<(String, String)>>,
}

impl FakeResolver {
    /// Creates a resolver that returns `url`.
    pub fn returning(url: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            url: Some(url.into()),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Creates a resolver that always fails.
    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            url: None,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Returns the number of resolve calls.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UrlResolver for FakeResolver {
    async fn resolve(&self, bucket: &str, key: &str) -> Result<RetrievalUrl, ResolveError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push((bucket.to_string(), key.to_string()));
        match &self.url {
            Some(url) => RetrievalUrl::parse(url),
            None => Err(ResolveError::Storage("AccessDenied".to_string())),
        }
    }
}

/// One recorded report call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportCall {
    /// `report_success` call.
    Success {
        /// Job identifier.
        job_id: String,
        /// Execution identifier.
        execution_id: String,
        /// Summary text.
        summary: String,
    },
    /// `report_failure` call.
    Failure {
        /// Job identifier.
        job_id: String,
        /// Execution identifier.
        execution_id: String,
        /// Failure reason.
        reason: String,
    },
}

/// Reporter that records every call.
#[derive(Default)]
pub struct RecordingReporter {
    /// Whether success reports should fail.
    fail_success: bool,
    /// Whether failure reports should fail.
    fail_failure: bool,
    /// Recorded calls.
    pub calls: Mutex<Vec<ReportCall>>,
}

impl RecordingReporter {
    /// Creates a reporter that accepts every report.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Creates a reporter whose calls fail after being recorded.
    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail_success: true,
            fail_failure: true,
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Creates a reporter that rejects only success reports.
    pub fn rejecting_success() -> Arc<Self> {
        Arc::new(Self {
            fail_success: true,
            fail_failure: false,
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Returns a snapshot of the recorded calls.
    pub fn calls(&self) -> Vec<ReportCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Records a call and returns the configured result.
    fn record(&self, call: ReportCall) -> Result<(), ReportError> {
        let fail = match call {
            ReportCall::Success { .. } => self.fail_success,
            ReportCall::Failure { .. } => self.fail_failure,
        };
        self.calls.lock().unwrap().push(call);
        if fail {
            return Err(ReportError::Delivery("ThrottlingException".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ResultReporter for RecordingReporter {
    async fn report_success(
        &self,
        job_id: &str,
        execution_id: &str,
        summary: &str,
    ) -> Result<(), ReportError> {
        self.record(ReportCall::Success {
            job_id: job_id.to_string(),
            execution_id: execution_id.to_string(),
            summary: summary.to_string(),
        })
    }

    async fn report_failure(
        &self,
        job_id: &str,
        execution_id: &str,
        reason: &str,
    ) -> Result<(), ReportError> {
        self.record(ReportCall::Failure {
            job_id: job_id.to_string(),
            execution_id: execution_id.to_string(),
            reason: reason.to_string(),
        })
    }
}

// ============================================================================
// SECTION: Engines
// ============================================================================

/// Scripted behavior of a [`ScriptedEngine`].
#[derive(Debug, Clone)]
pub enum Script {
    /// Emit `Started` then `Done` with the given result.
    Complete(Result<RunSummary, EngineError>),
    /// Emit `started` events then drop the emitter without `Done`.
    StartOnly(usize),
}

/// Engine that replays a fixed script and records requests.
pub struct ScriptedEngine {
    /// Script to replay.
    script: Script,
    /// Recorded requests.
    pub requests: Mutex<Vec<EngineRequest>>,
}

impl ScriptedEngine {
    /// Creates an engine that replays `script`.
    pub fn new(script: Script) -> Arc<Self> {
        Arc::new(Self {
            script,
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Engine whose run passes with no failures.
    pub fn passing() -> Arc<Self> {
        Self::new(Script::Complete(Ok(RunSummary::default())))
    }

    /// Engine whose run records one assertion failure.
    pub fn failing_assertion() -> Arc<Self> {
        Self::new(Script::Complete(Ok(RunSummary {
            failures: vec![RunFailure {
                source: Some("GET /health".to_string()),
                assertion: Some("status is 200".to_string()),
                message: "expected 500 to equal 200".to_string(),
            }],
            ..RunSummary::default()
        })))
    }

    /// Returns the number of started runs.
    pub fn start_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl TestEngine for ScriptedEngine {
    fn start(&self, request: EngineRequest) -> EngineRun {
        self.requests.lock().unwrap().push(request);
        let (events, run) = EngineRun::channel();
        let script = self.script.clone();
        tokio::spawn(async move {
            match script {
                Script::Complete(result) => {
                    events.started().await;
                    events.done(result).await;
                }
                Script::StartOnly(count) => {
                    for _ in 0 .. count {
                        events.started().await;
                    }
                }
            }
        });
        run
    }
}
