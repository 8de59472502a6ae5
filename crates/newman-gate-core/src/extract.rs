// crates/newman-gate-core/src/extract.rs
// ============================================================================
// Module: Newman Gate Archive Extractor
// Description: Zip extraction of the downloaded build artifact.
// Purpose: Unpack the artifact and hand its entries to the validator.
// Dependencies: zip, tokio
// ============================================================================

//! ## Overview
//! [`ArchiveExtractor`] unpacks a zip archive into an output directory and
//! returns the file entries as [`ExtractedEntries`], a single-pass sequence.
//! Invariants:
//! - The archive is parsed before the output directory is touched.
//! - The output directory is reset before any entry is written.
//! - Entries whose names escape the output directory are rejected.
//! - Total extracted bytes are capped at the configured limit.
//! - Directory entries are created on disk but not yielded.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::io::ErrorKind;
use std::io::Read;
use std::path::Path;
use std::path::PathBuf;

use thiserror::Error;
use tracing::debug;
use zip::ZipArchive;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default cap on the total number of bytes extracted from one archive.
pub const DEFAULT_MAX_EXTRACTED_BYTES: u64 = 256 * 1024 * 1024;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors returned by the archive extractor.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - Messages carry no local paths.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Archive could not be parsed.
    #[error("archive is malformed or unsupported: {0}")]
    Malformed(String),
    /// Entry name resolves outside the output directory.
    #[error("archive entry escapes the output directory: {0}")]
    UnsafePath(String),
    /// Extracted content exceeds the configured cap.
    #[error("archive exceeds the extraction limit of {max_bytes} bytes")]
    TooLarge {
        /// Configured cap in bytes.
        max_bytes: u64,
    },
    /// Reading the archive or writing the output directory failed.
    #[error("extraction io failure: {0}")]
    Io(String),
}

// ============================================================================
// SECTION: Entries
// ============================================================================

/// One file extracted from an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Entry path as recorded in the archive.
    pub path: String,
    /// Entry content.
    pub bytes: Vec<u8>,
}

impl ArchiveEntry {
    /// Creates an archive entry.
    #[must_use]
    pub fn new(path: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            bytes: bytes.into(),
        }
    }
}

/// File entries produced by one extraction, in archive order.
///
/// Consumed by value; callers must not rely on ordering.
#[derive(Debug, Default)]
pub struct ExtractedEntries {
    /// Entries in archive directory order.
    entries: Vec<ArchiveEntry>,
}

impl ExtractedEntries {
    /// Returns the number of file entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when the archive held no files.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IntoIterator for ExtractedEntries {
    type IntoIter = std::vec::IntoIter<ArchiveEntry>;
    type Item = ArchiveEntry;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl FromIterator<ArchiveEntry> for ExtractedEntries {
    fn from_iter<I: IntoIterator<Item = ArchiveEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

// ============================================================================
// SECTION: Extractor
// ============================================================================

/// Zip extractor with a total size cap.
#[derive(Debug, Clone, Copy)]
pub struct ArchiveExtractor {
    /// Maximum total bytes extracted from one archive.
    max_total_bytes: u64,
}

impl Default for ArchiveExtractor {
    fn default() -> Self {
        Self {
            max_total_bytes: DEFAULT_MAX_EXTRACTED_BYTES,
        }
    }
}

impl ArchiveExtractor {
    /// Creates an extractor with the provided size cap.
    #[must_use]
    pub const fn with_limit(max_total_bytes: u64) -> Self {
        Self {
            max_total_bytes,
        }
    }

    /// Extracts `archive` into `output_dir` on the blocking pool.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError`] when the archive is malformed, an entry is
    /// unsafe or oversized, or the output directory cannot be written.
    pub async fn extract(
        &self,
        archive: &Path,
        output_dir: &Path,
    ) -> Result<ExtractedEntries, ExtractError> {
        let archive = archive.to_path_buf();
        let output_dir = output_dir.to_path_buf();
        let limit = self.max_total_bytes;
        tokio::task::spawn_blocking(move || extract_blocking(&archive, &output_dir, limit))
            .await
            .map_err(|err| ExtractError::Io(format!("extraction task failed: {err}")))?
    }
}

/// Synchronous extraction body.
fn extract_blocking(
    archive_path: &Path,
    output_dir: &Path,
    max_total_bytes: u64,
) -> Result<ExtractedEntries, ExtractError> {
    let file = fs::File::open(archive_path).map_err(|err| ExtractError::Io(err.to_string()))?;
    let mut archive =
        ZipArchive::new(file).map_err(|err| ExtractError::Malformed(err.to_string()))?;
    reset_dir(output_dir)?;

    let mut entries = Vec::with_capacity(archive.len());
    let mut total_bytes = 0u64;
    for index in 0 .. archive.len() {
        let mut entry =
            archive.by_index(index).map_err(|err| ExtractError::Malformed(err.to_string()))?;
        let name = entry.name().to_string();
        let relative: PathBuf =
            entry.enclosed_name().ok_or_else(|| ExtractError::UnsafePath(name.clone()))?;
        let dest_path = output_dir.join(relative);
        if entry.is_dir() {
            fs::create_dir_all(&dest_path).map_err(|err| ExtractError::Io(err.to_string()))?;
            continue;
        }
        if let Some(parent) = dest_path.parent() {
            fs::create_dir_all(parent).map_err(|err| ExtractError::Io(err.to_string()))?;
        }
        let remaining = max_total_bytes.saturating_sub(total_bytes);
        let mut bytes = Vec::new();
        entry
            .by_ref()
            .take(remaining.saturating_add(1))
            .read_to_end(&mut bytes)
            .map_err(|err| ExtractError::Malformed(err.to_string()))?;
        let len = u64::try_from(bytes.len()).unwrap_or(u64::MAX);
        total_bytes = total_bytes.saturating_add(len);
        if total_bytes > max_total_bytes {
            return Err(ExtractError::TooLarge {
                max_bytes: max_total_bytes,
            });
        }
        fs::write(&dest_path, &bytes).map_err(|err| ExtractError::Io(err.to_string()))?;
        debug!(entry = %name, bytes = len, "extracted archive entry");
        entries.push(ArchiveEntry {
            path: name,
            bytes,
        });
    }
    Ok(ExtractedEntries {
        entries,
    })
}

/// Removes and recreates the output directory.
fn reset_dir(dir: &Path) -> Result<(), ExtractError> {
    match fs::remove_dir_all(dir) {
        Ok(()) => {}
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => return Err(ExtractError::Io(err.to_string())),
    }
    fs::create_dir_all(dir).map_err(|err| ExtractError::Io(err.to_string()))
}
