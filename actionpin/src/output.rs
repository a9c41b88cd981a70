//! Shared output formatting for scan reports.
//!
//! Provides JSON and plain-text formatters for `ScanReport`.
//! Color/terminal formatting is left to the CLI layer.

use std::io::Write;

use crate::report::ScanReport;

/// Format a `ScanReport` as JSON to a writer.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_json(report: &ScanReport, writer: &mut dyn Write) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    writeln!(writer, "{json}")?;
    Ok(())
}

/// Format a `ScanReport` as plain text to a writer.
///
/// One line per reference (`file:line:column: raw`), then scan errors and a
/// summary. With `unpinned_only`, references pinned to a commit digest are
/// left out of the listing but still counted in the summary.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_human(
    report: &ScanReport,
    writer: &mut dyn Write,
    unpinned_only: bool,
) -> anyhow::Result<()> {
    for file in &report.files {
        for reference in &file.references {
            let pinned = reference.is_commit_pinned();
            if unpinned_only && pinned {
                continue;
            }
            writeln!(
                writer,
                "{}:{}:{}: {}{}",
                file.file.display(),
                reference.location.line,
                reference.location.column,
                reference.raw,
                if pinned { "" } else { " [unpinned]" }
            )?;
        }
    }

    if !report.errors.is_empty() {
        writeln!(writer)?;
        for err in &report.errors {
            writeln!(writer, "{}", err.format_human_readable())?;
        }
    }

    writeln!(writer)?;
    writeln!(
        writer,
        "{} file(s) scanned, {} failed: {} reference(s), {} unpinned, {} templated",
        report.scanned_files,
        report.failed_files,
        report.references_count(),
        report.unpinned_count(),
        report.templated_count()
    )?;
    Ok(())
}
