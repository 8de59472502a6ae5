// crates/newman-gate-lambda/src/main.rs
// ============================================================================
// Module: Newman Gate Lambda Entry Point
// Description: Runtime bootstrap for the CodePipeline test gate.
// Purpose: Wire configuration, logging, AWS adapters, and the job handler.
// Dependencies: lambda_runtime, newman-gate-*, tokio, tracing-subscriber
// ============================================================================

//! ## Overview
//! The `bootstrap` binary loads configuration, installs the log subscriber,
//! builds the AWS clients once per container, and serves CodePipeline events.
//! Each invocation answers with the serialized [`Outcome`]; only a failed
//! result report surfaces as an invocation error.
//!
//! ## Invariants
//! - Collaborators are built once and shared by every invocation.
//! - Invocations within a container run one at a time.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use lambda_runtime::LambdaEvent;
use lambda_runtime::service_fn;
use newman_gate_aws::CodePipelineReporter;
use newman_gate_aws::S3UrlResolver;
use newman_gate_aws::load_sdk_config;
use newman_gate_config::ConfigError;
use newman_gate_config::LogFormat;
use newman_gate_config::LoggingConfig;
use newman_gate_config::NewmanGateConfig;
use newman_gate_core::HandlerBuildError;
use newman_gate_core::Job;
use newman_gate_core::NewmanEngine;
use newman_gate_core::Outcome;
use newman_gate_core::PipelineEvent;
use newman_gate_core::PipelineHandler;
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised before the runtime starts serving events.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
enum BootstrapError {
    /// Configuration failed to load.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Log subscriber could not be installed.
    #[error("logging setup failed: {0}")]
    Logging(String),
    /// Handler wiring was incomplete.
    #[error(transparent)]
    Handler(#[from] HandlerBuildError),
}

// ============================================================================
// SECTION: Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<(), lambda_runtime::Error> {
    let config = NewmanGateConfig::load(None)?;
    init_logging(&config.logging)?;
    let handler = build_handler(&config).await?;
    info!(artifact = %config.artifact.name, "newman gate ready");

    let handler = &handler;
    lambda_runtime::run(service_fn(move |event| handle_event(handler, event))).await
}

/// Builds the handler and its AWS collaborators.
async fn build_handler(config: &NewmanGateConfig) -> Result<PipelineHandler, BootstrapError> {
    let shared = load_sdk_config(&config.storage).await;
    let handler = PipelineHandler::builder()
        .settings(config.artifact.handler_settings())
        .resolver(Arc::new(S3UrlResolver::from_config(&shared, &config.storage)))
        .reporter(Arc::new(CodePipelineReporter::from_config(&shared)))
        .engine(Arc::new(NewmanEngine::new(config.engine.newman_config())))
        .build()?;
    Ok(handler)
}

/// Runs one job for a decoded invocation.
///
/// # Errors
///
/// Returns an error only when the job result could not be reported.
async fn handle_event(
    handler: &PipelineHandler,
    event: LambdaEvent<PipelineEvent>,
) -> Result<Outcome, lambda_runtime::Error> {
    let (payload, context) = event.into_parts();
    let job = Job::from_event(payload, context.request_id);
    let outcome = handler.handle(&job).await?;
    Ok(outcome)
}

// ============================================================================
// SECTION: Logging
// ============================================================================

/// Installs the global log subscriber.
fn init_logging(config: &LoggingConfig) -> Result<(), BootstrapError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => level_filter(&config.level)?,
    };
    let installed = match config.format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_current_span(false)
            .with_env_filter(filter)
            .try_init(),
        LogFormat::Text => {
            tracing_subscriber::fmt().with_ansi(false).with_env_filter(filter).try_init()
        }
    };
    installed.map_err(|err| BootstrapError::Logging(err.to_string()))
}

/// Parses the configured filter directive.
fn level_filter(level: &str) -> Result<EnvFilter, BootstrapError> {
    EnvFilter::try_new(level.trim()).map_err(|err| BootstrapError::Logging(err.to_string()))
}
