// crates/newman-gate-core/src/outcome.rs
// ============================================================================
// Module: Newman Gate Outcome
// Description: Terminal result of a pipeline job.
// Purpose: Carry exactly one success or failure message to the reporter.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! [`Outcome`] is the single terminal result of a job. It serializes as
//! `{"status": "...", "message": "..."}` for the invocation response.

use std::fmt;

use serde::Serialize;

/// Terminal result of a pipeline job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum Outcome {
    /// The job passed.
    Success(String),
    /// The job failed with a human-readable reason.
    Failure(String),
}

impl Outcome {
    /// Creates a success outcome.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self::Success(message.into())
    }

    /// Creates a failure outcome.
    #[must_use]
    pub fn failure(reason: impl Into<String>) -> Self {
        Self::Failure(reason.into())
    }

    /// Returns true for [`Outcome::Success`].
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Returns the message or reason text.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Success(message) | Self::Failure(message) => message,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.is_success() { "success" } else { "failure" };
        write!(f, "{status}: {}", self.message())
    }
}
