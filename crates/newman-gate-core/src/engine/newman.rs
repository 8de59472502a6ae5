// crates/newman-gate-core/src/engine/newman.rs
// ============================================================================
// Module: Newman CLI Engine
// Description: Test engine backed by the `newman` command-line runner.
// Purpose: Run a collection in a child process and parse its JSON report.
// Dependencies: serde, serde_json, tempfile, tokio
// ============================================================================

//! ## Overview
//! [`NewmanEngine`] writes the collection and environment into a private
//! temporary directory, runs `newman run` with the JSON reporter enabled, and
//! turns the exported report into a [`RunSummary`].
//! Invariants:
//! - `Started` is emitted only after the child process spawned.
//! - A non-zero exit status alone is not an engine error; newman exits 1 when
//!   assertions fail. A missing or unparseable report is.
//! - Dropping the [`EngineRun`] stops the run and kills the child.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tokio::process::Command;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::engine::EngineError;
use crate::engine::EngineEvents;
use crate::engine::EngineRequest;
use crate::engine::EngineRun;
use crate::engine::RunFailure;
use crate::engine::RunStats;
use crate::engine::RunSummary;
use crate::engine::TestEngine;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Reporter newman must always run so the summary can be parsed.
const JSON_REPORTER: &str = "json";

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Process settings for the newman CLI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewmanEngineConfig {
    /// Program to execute (`newman`, or a launcher such as `npx`).
    pub program: PathBuf,
    /// Arguments placed before `run` (for example `["newman"]` under `npx`).
    pub leading_args: Vec<String>,
    /// Reporters to enable in addition to `json`.
    pub reporters: Vec<String>,
}

impl Default for NewmanEngineConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("newman"),
            leading_args: Vec::new(),
            reporters: vec!["cli".to_string()],
        }
    }
}

impl NewmanEngineConfig {
    /// Returns the `--reporters` argument value.
    fn reporter_list(&self) -> String {
        let mut reporters: Vec<&str> = self
            .reporters
            .iter()
            .map(String::as_str)
            .filter(|reporter| *reporter != JSON_REPORTER)
            .collect();
        reporters.push(JSON_REPORTER);
        reporters.join(",")
    }
}

// ============================================================================
// SECTION: Engine
// ============================================================================

/// Test engine that shells out to newman.
#[derive(Debug, Clone, Default)]
pub struct NewmanEngine {
    /// Shared process settings.
    config: Arc<NewmanEngineConfig>,
}

impl NewmanEngine {
    /// Creates an engine with the provided settings.
    #[must_use]
    pub fn new(config: NewmanEngineConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

impl TestEngine for NewmanEngine {
    fn start(&self, request: EngineRequest) -> EngineRun {
        let (events, run) = EngineRun::channel();
        let config = Arc::clone(&self.config);
        tokio::spawn(async move {
            let finished = tokio::select! {
                result = run_newman(&config, &request, &events) => Some(result),
                () = events.closed() => None,
            };
            match finished {
                Some(result) => events.done(result).await,
                None => debug!("engine run dropped; newman stopped"),
            }
        });
        run
    }
}

/// Runs newman once and returns the parsed report.
async fn run_newman(
    config: &NewmanEngineConfig,
    request: &EngineRequest,
    events: &EngineEvents,
) -> Result<RunSummary, EngineError> {
    let workdir = tempfile::Builder::new()
        .prefix("newman-gate-")
        .tempdir()
        .map_err(|err| EngineError::Launch(err.to_string()))?;
    let collection_path = workdir.path().join("collection.json");
    let environment_path = workdir.path().join("environment.json");
    let report_path = workdir.path().join("report.json");
    write_json(&collection_path, &request.collection).await?;
    write_json(&environment_path, &request.environment).await?;

    let mut command = Command::new(&config.program);
    command
        .args(&config.leading_args)
        .arg("run")
        .arg(&collection_path)
        .arg("--environment")
        .arg(&environment_path)
        .arg("--reporters")
        .arg(config.reporter_list())
        .arg("--reporter-json-export")
        .arg(&report_path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    let child = command.spawn().map_err(|err| EngineError::Launch(err.to_string()))?;
    events.started().await;

    let output =
        child.wait_with_output().await.map_err(|err| EngineError::Report(err.to_string()))?;
    for line in String::from_utf8_lossy(&output.stdout).lines() {
        info!(target: "newman", "{line}");
    }
    for line in String::from_utf8_lossy(&output.stderr).lines() {
        warn!(target: "newman", "{line}");
    }
    let report = tokio::fs::read(&report_path).await.map_err(|err| {
        EngineError::Report(format!("no json report after {}: {err}", output.status))
    })?;
    parse_report(&report)
}

/// Serializes a JSON document to disk.
async fn write_json(path: &Path, value: &Value) -> Result<(), EngineError> {
    let bytes = serde_json::to_vec(value).map_err(|err| EngineError::Launch(err.to_string()))?;
    tokio::fs::write(path, bytes).await.map_err(|err| EngineError::Launch(err.to_string()))
}

// ============================================================================
// SECTION: Report Parsing
// ============================================================================

/// Top-level newman JSON report.
#[derive(Debug, Deserialize)]
struct NewmanReport {
    /// Run section.
    run: NewmanRun,
}

/// `run` section of the newman report.
#[derive(Debug, Deserialize)]
struct NewmanRun {
    /// Aggregate counters.
    #[serde(default)]
    stats: RunStats,
    /// Failure records.
    #[serde(default)]
    failures: Vec<NewmanFailure>,
    /// Run-level error; `null` when the run completed.
    #[serde(default)]
    error: Option<Value>,
}

/// One entry of `run.failures`.
#[derive(Debug, Deserialize)]
struct NewmanFailure {
    /// Error details.
    #[serde(default)]
    error: Option<NewmanFailureError>,
    /// Item that produced the failure.
    #[serde(default)]
    source: Option<NewmanSource>,
}

/// `error` object of a failure record.
#[derive(Debug, Deserialize)]
struct NewmanFailureError {
    /// Failure message.
    #[serde(default)]
    message: Option<String>,
    /// Assertion name.
    #[serde(default)]
    test: Option<String>,
}

/// `source` object of a failure record.
#[derive(Debug, Deserialize)]
struct NewmanSource {
    /// Item name.
    #[serde(default)]
    name: Option<String>,
}

/// Parses a newman JSON report into a [`RunSummary`].
///
/// # Errors
///
/// Returns [`EngineError::Report`] when the bytes are not a newman report.
pub fn parse_report(bytes: &[u8]) -> Result<RunSummary, EngineError> {
    let report: NewmanReport = serde_json::from_slice(bytes)
        .map_err(|err| EngineError::Report(format!("invalid json report: {err}")))?;
    let error = report.run.error.as_ref().map(describe_run_error);
    let failures = report
        .run
        .failures
        .into_iter()
        .map(|failure| {
            let (message, assertion) = match failure.error {
                Some(error) => (error.message, error.test),
                None => (None, None),
            };
            RunFailure {
                source: failure.source.and_then(|source| source.name),
                assertion,
                message: message.unwrap_or_else(|| "unspecified failure".to_string()),
            }
        })
        .collect();
    Ok(RunSummary {
        error,
        stats: report.run.stats,
        failures,
    })
}

/// Renders a run-level error value as text.
fn describe_run_error(value: &Value) -> String {
    match value {
        Value::String(message) => message.clone(),
        Value::Object(fields) => fields
            .get("message")
            .and_then(Value::as_str)
            .map_or_else(|| value.to_string(), str::to_string),
        other => other.to_string(),
    }
}
