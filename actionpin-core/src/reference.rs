//! Action reference records.

use serde::Serialize;

use crate::error::Location;

/// Separator between an action's path and its version token.
pub const VERSION_SEPARATOR: char = '@';

/// One literal `path@version` use of a reusable action.
///
/// Splitting `raw` on its last unescaped `@` always yields `path` and `version`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[non_exhaustive]
pub struct ActionReference {
    /// The value exactly as written, e.g. `actions/checkout@v4`.
    pub raw: String,
    /// `owner/name`, optionally followed by `/subpath`.
    pub path: String,
    /// Commit digest, tag or branch, kept verbatim.
    pub version: String,
    /// Position of the value in the source. Every use reached through an
    /// alias reports the anchored definition's position.
    pub location: Location,
}

impl ActionReference {
    pub(crate) fn new(raw: &str, path: &str, version: &str, location: Location) -> Self {
        Self {
            raw: raw.to_owned(),
            path: path.to_owned(),
            version: version.to_owned(),
            location,
        }
    }

    /// First path segment (the repository owner).
    #[must_use]
    pub fn owner(&self) -> &str {
        self.path.split('/').next().unwrap_or_default()
    }

    /// Second path segment (the repository name).
    #[must_use]
    pub fn name(&self) -> &str {
        self.path.split('/').nth(1).unwrap_or_default()
    }

    /// `owner/name` without any subpath.
    #[must_use]
    pub fn repository(&self) -> &str {
        match self.subpath() {
            Some(sub) => &self.path[..self.path.len() - sub.len() - 1],
            None => &self.path,
        }
    }

    /// Directory or workflow file inside the repository, e.g. `init` in
    /// `github/codeql-action/init@v3`.
    #[must_use]
    pub fn subpath(&self) -> Option<&str> {
        self.path.splitn(3, '/').nth(2)
    }

    /// Whether the version is a full commit digest (SHA-1 or SHA-256 hex).
    #[must_use]
    pub fn is_commit_pinned(&self) -> bool {
        matches!(self.version.len(), 40 | 64)
            && self.version.bytes().all(|b| b.is_ascii_hexdigit())
    }
}

/// Split `raw` on its last `@` that is not preceded by a backslash.
#[must_use]
pub fn split_reference(raw: &str) -> Option<(&str, &str)> {
    raw.rmatch_indices(VERSION_SEPARATOR)
        .map(|(idx, _)| idx)
        .find(|&idx| !raw[..idx].ends_with('\\'))
        .map(|idx| (&raw[..idx], &raw[idx + 1..]))
}
