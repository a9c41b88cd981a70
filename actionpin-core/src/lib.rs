//! # actionpin-core
//!
//! Finds every reusable action referenced by a CI workflow file.
//!
//! The scanner parses the YAML into a generic tree, walks it without assuming
//! the workflow schema, and keeps each `uses` value that is a literal
//! `path@version` reference. It performs no I/O and holds no state, so files
//! can be scanned concurrently from any number of threads.
//!
//! ```rust
//! let workflow = b"jobs:\n  t:\n    steps:\n      - uses: actions/checkout@v4\n";
//! let refs = actionpin_core::scan(workflow).unwrap();
//! assert_eq!(refs[0].path, "actions/checkout");
//! assert_eq!(refs[0].version, "v4");
//! ```

mod classify;
mod document;
mod error;
mod reference;
mod walker;

pub use classify::{Rejection, classify};
pub use document::{DocumentTree, Node, NodeId, Scalar, ScalarStyle, parse};
pub use error::{Location, ScanError};
pub use reference::{ActionReference, VERSION_SEPARATOR, split_reference};
pub use walker::{CandidateSite, REFERENCE_KEY, Walk, walk};

use tracing::{debug, trace};

/// Everything one scan found, including the candidates it declined.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[non_exhaustive]
pub struct ScanOutcome {
    /// Literal references in traversal order.
    pub references: Vec<ActionReference>,
    /// Declined `uses` values with the reason, in traversal order.
    pub rejected: Vec<(String, Rejection)>,
}

impl ScanOutcome {
    /// Number of declined values that were templated expressions.
    #[must_use]
    pub fn templated_count(&self) -> usize {
        self.rejected
            .iter()
            .filter(|(_, why)| *why == Rejection::Templated)
            .count()
    }
}

/// Scan one workflow file's bytes for action references.
///
/// References are returned in depth-first document order. Nothing is
/// de-duplicated: a step reused through YAML aliases is reported once for
/// every place it is referenced.
///
/// # Errors
///
/// Returns [`ScanError::MalformedDocument`] if the input is not a well-formed
/// YAML stream. No partial result is produced.
pub fn scan(raw: &[u8]) -> Result<Vec<ActionReference>, ScanError> {
    scan_detailed(raw).map(|outcome| outcome.references)
}

/// Like [`scan`], but also reports the `uses` values that were declined.
///
/// # Errors
///
/// Returns [`ScanError::MalformedDocument`] if the input is not a well-formed
/// YAML stream.
pub fn scan_detailed(raw: &[u8]) -> Result<ScanOutcome, ScanError> {
    let tree = parse(raw)?;
    Ok(assemble(&tree, &mut walk(&tree)))
}

/// Like [`scan_detailed`], but gives up once the walk has visited
/// `max_nodes` nodes.
///
/// A few hundred bytes of nested aliases can expand to billions of nodes;
/// this is the entry point for untrusted input.
///
/// # Errors
///
/// Returns [`ScanError::MalformedDocument`] if the input is not a well-formed
/// YAML stream, or [`ScanError::LimitExceeded`] if the expanded document is
/// larger than `max_nodes`.
pub fn scan_within(raw: &[u8], max_nodes: usize) -> Result<ScanOutcome, ScanError> {
    let tree = parse(raw)?;
    let mut sites = walk(&tree).with_budget(max_nodes);
    let outcome = assemble(&tree, &mut sites);
    if sites.is_exhausted() {
        return Err(ScanError::LimitExceeded { limit: max_nodes });
    }
    Ok(outcome)
}

fn assemble(tree: &DocumentTree, sites: &mut Walk<'_>) -> ScanOutcome {
    let mut outcome = ScanOutcome::default();

    for site in sites.by_ref() {
        match classify(site.value) {
            Ok(reference) => outcome.references.push(reference),
            Err(why) => {
                trace!(value = %site.value.value, reason = %why, "declined uses value");
                outcome.rejected.push((site.value.value.clone(), why));
            }
        }
    }

    debug!(
        documents = tree.roots().len(),
        visited = sites.visited(),
        references = outcome.references.len(),
        rejected = outcome.rejected.len(),
        "scanned workflow"
    );
    outcome
}
