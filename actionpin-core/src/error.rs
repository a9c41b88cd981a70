//! Error types for workflow scanning.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// A 1-based position in the scanned source text.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct Location {
    /// Line number (1-indexed).
    pub line: usize,
    /// Column number (1-indexed).
    pub column: usize,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Failures the scanner surfaces.
///
/// Everything that is not a parse failure (templated values, local actions,
/// unexpected nesting) is excluded from the result silently instead.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ScanError {
    /// The input is not a well-formed YAML stream.
    #[error("malformed document{}: {reason}", at_location(.location.as_ref()))]
    MalformedDocument {
        /// Human-readable description of the problem.
        reason: String,
        /// Where the problem was detected, when the parser knows.
        location: Option<Location>,
    },

    /// Alias expansion made the document larger than the caller allowed.
    /// Only [`scan_within`](crate::scan_within) returns this.
    #[error("document expands past {limit} nodes")]
    LimitExceeded {
        /// The node budget that ran out.
        limit: usize,
    },
}

impl ScanError {
    pub(crate) fn malformed(reason: impl Into<String>, location: Option<Location>) -> Self {
        Self::MalformedDocument {
            reason: reason.into(),
            location,
        }
    }

    /// Source position of the failure, if known.
    #[must_use]
    pub fn location(&self) -> Option<Location> {
        match self {
            Self::MalformedDocument { location, .. } => *location,
            Self::LimitExceeded { .. } => None,
        }
    }
}

fn at_location(location: Option<&Location>) -> String {
    location.map_or_else(String::new, |loc| format!(" at {loc}"))
}
