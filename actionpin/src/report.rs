//! Scan report types.

use std::path::PathBuf;

use actionpin_core::ActionReference;
use serde::Serialize;

use crate::error::FileError;

/// References found in one workflow file.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[non_exhaustive]
pub struct FileScan {
    pub file: PathBuf,
    /// Literal references in document order, repeats included.
    pub references: Vec<ActionReference>,
    /// `uses` values built from `${{ }}` expressions, which cannot be pinned.
    pub templated: usize,
}

impl FileScan {
    /// References whose version is not a full commit digest.
    pub fn unpinned(&self) -> impl Iterator<Item = &ActionReference> {
        self.references.iter().filter(|r| !r.is_commit_pinned())
    }
}

/// Result of a filesystem scan.
///
/// A non-empty `errors` means some workflow files were never checked. CI
/// must treat that as a failure regardless of the references found.
#[derive(Debug, Clone, Default, Serialize)]
#[non_exhaustive]
pub struct ScanReport {
    /// Number of files successfully read and parsed.
    pub scanned_files: usize,
    /// Number of files that could not be scanned.
    pub failed_files: usize,
    /// Per-file results in sorted path order.
    pub files: Vec<FileScan>,
    /// Files that could not be read or parsed.
    pub errors: Vec<FileError>,
}

impl ScanReport {
    /// Total number of files attempted (scanned + failed).
    #[must_use]
    pub fn files_attempted(&self) -> usize {
        self.scanned_files + self.failed_files
    }

    /// Total references across all files.
    #[must_use]
    pub fn references_count(&self) -> usize {
        self.files.iter().map(|f| f.references.len()).sum()
    }

    /// Total references not pinned to a commit digest.
    #[must_use]
    pub fn unpinned_count(&self) -> usize {
        self.files.iter().map(|f| f.unpinned().count()).sum()
    }

    /// Total templated `uses` values.
    #[must_use]
    pub fn templated_count(&self) -> usize {
        self.files.iter().map(|f| f.templated).sum()
    }

    /// Every file was scanned.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }
}
