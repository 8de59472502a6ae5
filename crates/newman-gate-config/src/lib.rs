// crates/newman-gate-config/src/lib.rs
// ============================================================================
// Module: Newman Gate Config Library
// Description: Canonical config model and validation for Newman Gate.
// Purpose: Single source of truth for newman-gate.toml semantics.
// Dependencies: newman-gate-core, serde, toml
// ============================================================================

//! ## Overview
//! `newman-gate-config` defines the configuration model for the test gate.
//! Every field has a default, so a deployment without a config file runs with
//! the stock artifact layout. Validation is strict and fail-closed.
//!
//! Security posture: config inputs are untrusted.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
