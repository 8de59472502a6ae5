// crates/newman-gate-core/src/runner.rs
// ============================================================================
// Module: Newman Gate Test Runner
// Description: Adapter between extracted files and the test engine.
// Purpose: Parse inputs, await one completion event, and interpret it.
// Dependencies: serde_json, tracing
// ============================================================================

//! ## Overview
//! [`TestRunner`] parses the collection and environment texts, starts the
//! injected [`TestEngine`], and waits for its single `Done` event. The engine
//! may emit any number of `Started` events first; they are logged and never
//! complete the run.
//! Invariants:
//! - Parse failures short-circuit before the engine starts.
//! - Exactly one [`Outcome`] is produced per call.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::info;
use tracing::warn;

use crate::engine::EngineError;
use crate::engine::EngineEvent;
use crate::engine::EngineRequest;
use crate::engine::RunSummary;
use crate::engine::TestEngine;
use crate::error::StepError;
use crate::outcome::Outcome;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Summary reported when every test passed.
pub const SUCCESS_MESSAGE: &str = "all tests completed without failures";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Which input failed to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// Test collection.
    Collection,
    /// Environment definition.
    Environment,
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Collection => f.write_str("test collection"),
            Self::Environment => f.write_str("environment"),
        }
    }
}

/// Collection or environment text that is not usable structured data.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MalformedInputError {
    /// Text is not JSON.
    #[error("{input} is not valid json: {message}")]
    Json {
        /// Offending input.
        input: InputKind,
        /// Parser message.
        message: String,
    },
    /// JSON document is not an object.
    #[error("{input} must be a json object")]
    NotObject {
        /// Offending input.
        input: InputKind,
    },
}

// ============================================================================
// SECTION: Runner
// ============================================================================

/// Runs a collection through the injected engine.
#[derive(Clone)]
pub struct TestRunner {
    /// Engine that executes the collection.
    engine: Arc<dyn TestEngine>,
}

impl TestRunner {
    /// Creates a runner over the provided engine.
    #[must_use]
    pub fn new(engine: Arc<dyn TestEngine>) -> Self {
        Self {
            engine,
        }
    }

    /// Runs the collection and returns the single outcome.
    pub async fn run(&self, collection: &str, environment: &str) -> Outcome {
        match self.execute(collection, environment).await {
            Ok(message) => Outcome::success(message),
            Err(err) => {
                warn!(stage = %err.stage(), error = %err, "test run did not pass");
                Outcome::failure(err.to_string())
            }
        }
    }

    /// Runs the collection and returns the success message or the failure.
    ///
    /// # Errors
    ///
    /// Returns [`StepError::MalformedInput`] before starting the engine when an
    /// input does not parse, [`StepError::TestEngine`] when the engine fails,
    /// and [`StepError::TestAssertion`] when assertions fail.
    pub async fn execute(
        &self,
        collection: &str,
        environment: &str,
    ) -> Result<&'static str, StepError> {
        let request = EngineRequest {
            collection: parse_input(InputKind::Collection, collection)?,
            environment: parse_input(InputKind::Environment, environment)?,
        };
        let mut run = self.engine.start(request);
        while let Some(event) = run.next_event().await {
            match event {
                EngineEvent::Started => {
                    info!("started running the test engine on the collection");
                }
                EngineEvent::Done(result) => return interpret(result),
            }
        }
        warn!("test engine stopped without a completion event");
        Err(StepError::TestEngine(EngineError::Aborted.to_string()))
    }
}

/// Parses one input as a JSON object.
fn parse_input(input: InputKind, text: &str) -> Result<Value, MalformedInputError> {
    let value: Value = serde_json::from_str(text).map_err(|err| MalformedInputError::Json {
        input,
        message: err.to_string(),
    })?;
    if !value.is_object() {
        return Err(MalformedInputError::NotObject {
            input,
        });
    }
    Ok(value)
}

/// Maps the engine's completion event onto a result.
fn interpret(result: Result<RunSummary, EngineError>) -> Result<&'static str, StepError> {
    let summary = match result {
        Ok(summary) => summary,
        Err(err) => {
            warn!(error = %err, "test engine failed");
            return Err(StepError::TestEngine(err.to_string()));
        }
    };
    if let Some(error) = &summary.error {
        warn!(error = %error, "test engine flagged a run error");
        return Err(StepError::TestEngine(error.clone()));
    }
    if summary.has_failures() {
        for failure in &summary.failures {
            warn!(
                source = failure.source.as_deref().unwrap_or("unknown"),
                assertion = failure.assertion.as_deref().unwrap_or("none"),
                message = %failure.message,
                "test failure"
            );
        }
        return Err(StepError::TestAssertion {
            failures: summary.failures.len(),
        });
    }
    info!(
        requests = summary.stats.requests.total,
        assertions = summary.stats.assertions.total,
        "test run passed"
    );
    Ok(SUCCESS_MESSAGE)
}
