// crates/newman-gate-core/src/engine/mod.rs
// ============================================================================
// Module: Newman Gate Test Engine
// Description: Event-driven test engine contract and run summaries.
// Purpose: Describe how collection runs are started and observed.
// Dependencies: serde, serde_json, tokio
// ============================================================================

//! ## Overview
//! A [`TestEngine`] starts a collection run and reports progress through an
//! [`EngineRun`] event stream: zero or more [`EngineEvent::Started`] events
//! followed by at most one [`EngineEvent::Done`]. The emitting side
//! ([`EngineEvents`]) is consumed by [`EngineEvents::done`], so a run cannot
//! complete twice.
//! Invariants:
//! - `Started` is informational and never completes a run.
//! - A stream that closes without `Done` means the engine died.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod newman;

pub use newman::NewmanEngine;
pub use newman::NewmanEngineConfig;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Buffered events per run.
const EVENT_BUFFER: usize = 8;

// ============================================================================
// SECTION: Requests and Summaries
// ============================================================================

/// Parsed inputs for one collection run.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineRequest {
    /// Collection definition.
    pub collection: Value,
    /// Environment definition.
    pub environment: Value,
}

/// Executed/failed counters for one item kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunCounter {
    /// Total items executed.
    #[serde(default)]
    pub total: u64,
    /// Items that failed.
    #[serde(default)]
    pub failed: u64,
}

/// Aggregate run statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    /// Request counters.
    #[serde(default)]
    pub requests: RunCounter,
    /// Assertion counters.
    #[serde(default)]
    pub assertions: RunCounter,
}

/// One failed assertion or request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunFailure {
    /// Name of the item that failed, when known.
    pub source: Option<String>,
    /// Name of the failed assertion, when known.
    pub assertion: Option<String>,
    /// Failure message.
    pub message: String,
}

/// Completed run summary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Run-level error reported by the engine.
    pub error: Option<String>,
    /// Aggregate statistics.
    pub stats: RunStats,
    /// Individual failures.
    pub failures: Vec<RunFailure>,
}

impl RunSummary {
    /// Returns true when at least one assertion or request failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

// ============================================================================
// SECTION: Events
// ============================================================================

/// Errors reported by a test engine.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    /// Engine could not be started.
    #[error("test engine failed to start: {0}")]
    Launch(String),
    /// Engine produced no usable report.
    #[error("test engine report unavailable: {0}")]
    Report(String),
    /// Engine stopped without completing.
    #[error("test engine stopped before completion")]
    Aborted,
}

/// Event emitted during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// The run started.
    Started,
    /// The run finished.
    Done(Result<RunSummary, EngineError>),
}

/// Receiving side of a run's event stream.
#[derive(Debug)]
pub struct EngineRun {
    /// Event receiver.
    events: mpsc::Receiver<EngineEvent>,
}

impl EngineRun {
    /// Creates a connected emitter/run pair.
    #[must_use]
    pub fn channel() -> (EngineEvents, Self) {
        let (sender, events) = mpsc::channel(EVENT_BUFFER);
        (
            EngineEvents {
                sender,
            },
            Self {
                events,
            },
        )
    }

    /// Waits for the next event; `None` once the engine side is gone.
    pub async fn next_event(&mut self) -> Option<EngineEvent> {
        self.events.recv().await
    }
}

/// Emitting side of a run's event stream.
#[derive(Debug)]
pub struct EngineEvents {
    /// Event sender.
    sender: mpsc::Sender<EngineEvent>,
}

impl EngineEvents {
    /// Emits [`EngineEvent::Started`].
    pub async fn started(&self) {
        // Receiver may already be gone.
        let _ = self.sender.send(EngineEvent::Started).await;
    }

    /// Resolves once the receiving [`EngineRun`] is dropped.
    pub async fn closed(&self) {
        self.sender.closed().await;
    }

    /// Emits [`EngineEvent::Done`] and closes the stream.
    pub async fn done(self, result: Result<RunSummary, EngineError>) {
        let _ = self.sender.send(EngineEvent::Done(result)).await;
    }
}

// ============================================================================
// SECTION: Engine Trait
// ============================================================================

/// Starts collection runs.
pub trait TestEngine: Send + Sync {
    /// Starts a run and returns its event stream.
    ///
    /// Must be called from within a Tokio runtime.
    fn start(&self, request: EngineRequest) -> EngineRun;
}
