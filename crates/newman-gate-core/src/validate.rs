// crates/newman-gate-core/src/validate.rs
// ============================================================================
// Module: Newman Gate Artifact Validator
// Description: Required-file checks over extracted archive entries.
// Purpose: Produce the collection and environment texts or fail.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! [`ArtifactValidator`] scans archive entries once and fills the two slots of
//! an [`ExtractedFileSet`]. Entries with other paths are ignored. A filled set
//! becomes [`ValidatedFiles`].
//! Invariants:
//! - Matching is by exact entry path.
//! - Duplicate matches overwrite earlier ones (last write wins).
//! - Validation succeeds only when both slots are filled.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;
use tracing::debug;
use tracing::warn;

use crate::extract::ArchiveEntry;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default entry path of the test collection.
pub const DEFAULT_COLLECTION_FILE: &str = "newman.tests.json";
/// Default entry path of the environment definition.
pub const DEFAULT_ENVIRONMENT_FILE: &str = "newman.development.env.json";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors returned by the artifact validator.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// One or both required files were absent.
    #[error("missing required artifact file")]
    MissingFile {
        /// Whether the collection file was found.
        collection_found: bool,
        /// Whether the environment file was found.
        environment_found: bool,
    },
    /// A required file was not valid UTF-8.
    #[error("required artifact file is not valid utf-8: {path}")]
    NotUtf8 {
        /// Entry path of the offending file.
        path: String,
    },
}

// ============================================================================
// SECTION: File Set
// ============================================================================

/// The two files the test run needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedFileSet {
    /// Test collection text.
    pub collection: Option<String>,
    /// Environment definition text.
    pub environment: Option<String>,
}

impl ExtractedFileSet {
    /// Converts the set into both texts.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingFile`] when either slot is empty.
    pub fn into_validated(self) -> Result<ValidatedFiles, ValidationError> {
        match (self.collection, self.environment) {
            (Some(collection), Some(environment)) => Ok(ValidatedFiles {
                collection,
                environment,
            }),
            (collection, environment) => Err(ValidationError::MissingFile {
                collection_found: collection.is_some(),
                environment_found: environment.is_some(),
            }),
        }
    }
}

/// Collection and environment texts of a valid artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedFiles {
    /// Test collection text.
    pub collection: String,
    /// Environment definition text.
    pub environment: String,
}

// ============================================================================
// SECTION: Validator
// ============================================================================

/// Entry paths the validator looks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredFiles {
    /// Entry path of the test collection.
    pub collection: String,
    /// Entry path of the environment definition.
    pub environment: String,
}

impl Default for RequiredFiles {
    fn default() -> Self {
        Self {
            collection: DEFAULT_COLLECTION_FILE.to_string(),
            environment: DEFAULT_ENVIRONMENT_FILE.to_string(),
        }
    }
}

/// Checks extracted entries for the required files.
#[derive(Debug, Clone, Default)]
pub struct ArtifactValidator {
    /// Required entry paths.
    required: RequiredFiles,
}

impl ArtifactValidator {
    /// Creates a validator for the provided entry paths.
    #[must_use]
    pub const fn new(required: RequiredFiles) -> Self {
        Self {
            required,
        }
    }

    /// Scans `entries` and returns both required texts.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingFile`] when either file is absent and
    /// [`ValidationError::NotUtf8`] when a matching entry is not UTF-8.
    pub fn validate<I>(&self, entries: I) -> Result<ValidatedFiles, ValidationError>
    where
        I: IntoIterator<Item = ArchiveEntry>,
    {
        let mut files = ExtractedFileSet::default();
        for entry in entries {
            let slot = if entry.path == self.required.collection {
                &mut files.collection
            } else if entry.path == self.required.environment {
                &mut files.environment
            } else {
                continue;
            };
            if slot.is_some() {
                debug!(entry = %entry.path, "duplicate required entry replaces earlier copy");
            }
            let text = String::from_utf8(entry.bytes).map_err(|_| ValidationError::NotUtf8 {
                path: entry.path.clone(),
            })?;
            *slot = Some(text);
        }
        files.into_validated().inspect_err(|_| {
            warn!(
                collection = %self.required.collection,
                environment = %self.required.environment,
                "build artifact is missing required files"
            );
        })
    }
}
