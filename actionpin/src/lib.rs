//! # actionpin
//!
//! Audits reusable action references in CI workflow files on disk.
//!
//! File discovery, bounded reads and reporting live here; the reference
//! extraction itself is [`actionpin_core::scan`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::PathBuf;
//! use actionpin::{FsSourceConfig, scan_fs};
//!
//! let mut config = FsSourceConfig::default();
//! config.paths = vec![PathBuf::from(".github/workflows")];
//!
//! let report = scan_fs(&config).unwrap();
//! println!("References: {}", report.references_count());
//! println!("Unpinned: {}", report.unpinned_count());
//! println!("Complete: {}", report.is_complete());
//! ```

mod config;
mod error;
pub mod output;
mod report;
mod strategy;

pub use config::{CONFIG_FILE_NAME, DEFAULT_WORKFLOW_DIR, FileConfig, FsSourceConfig};
pub use error::{FileError, FileErrorKind};
pub use report::{FileScan, ScanReport};

use std::path::PathBuf;

use actionpin_core::ScanError;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use strategy::fs::{find_files, read_file_bounded};

/// Scan workflow files on disk for action references.
///
/// Files are read one after another so the size limits hold, then scanned in
/// parallel. The report lists files in sorted path order either way.
///
/// # Errors
///
/// Returns an error if `config.paths` is empty or if any provided path does not exist.
/// Files that cannot be read or parsed are reported in `report.errors`, never
/// silently dropped.
pub fn scan_fs(config: &FsSourceConfig) -> anyhow::Result<ScanReport> {
    if config.paths.is_empty() {
        anyhow::bail!("No paths provided for scanning");
    }

    for path in &config.paths {
        if !path.exists() {
            anyhow::bail!("Path does not exist: {}", path.display());
        }
    }

    let (files, mut errors) = find_files(config);
    info!(files = files.len(), "discovered workflow files");

    let mut contents: Vec<(PathBuf, Vec<u8>)> = Vec::with_capacity(files.len());
    let mut total_bytes: u64 = 0;
    for file_path in files {
        if contents.len() + errors.len() >= config.max_files {
            errors.push(FileError::new(
                file_path,
                FileErrorKind::LimitExceeded,
                format!(
                    "Scan aborted: max_files limit ({}) reached; remaining files not scanned",
                    config.max_files
                ),
            ));
            break;
        }

        let bytes = match read_file_bounded(&file_path, config.max_file_size) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(file = %e.file.display(), "{}", e.message);
                errors.push(e);
                continue;
            }
        };

        total_bytes = total_bytes.saturating_add(bytes.len() as u64);
        if total_bytes > config.max_total_bytes {
            errors.push(FileError::new(
                file_path,
                FileErrorKind::LimitExceeded,
                format!(
                    "Scan aborted: max_total_bytes limit ({}) reached; remaining files not scanned",
                    config.max_total_bytes
                ),
            ));
            break;
        }
        contents.push((file_path, bytes));
    }

    let results: Vec<Result<FileScan, FileError>> = contents
        .into_par_iter()
        .map(|(file, bytes)| scan_file(file, &bytes, config.max_expanded_nodes))
        .collect();

    let mut report = ScanReport::default();
    for result in results {
        match result {
            Ok(scan) => report.files.push(scan),
            Err(e) => errors.push(e),
        }
    }
    report.scanned_files = report.files.len();
    report.failed_files = errors.len();
    report.errors = errors;
    Ok(report)
}

fn scan_file(file: PathBuf, bytes: &[u8], max_nodes: usize) -> Result<FileScan, FileError> {
    match actionpin_core::scan_within(bytes, max_nodes) {
        Ok(outcome) => {
            debug!(
                file = %file.display(),
                references = outcome.references.len(),
                "scanned workflow file"
            );
            Ok(FileScan {
                templated: outcome.templated_count(),
                references: outcome.references,
                file,
            })
        }
        Err(e) => {
            warn!(file = %file.display(), error = %e, "failed to scan workflow file");
            let kind = if matches!(e, ScanError::LimitExceeded { .. }) {
                FileErrorKind::LimitExceeded
            } else {
                FileErrorKind::MalformedDocument
            };
            Err(FileError::new(file, kind, e.to_string()))
        }
    }
}
