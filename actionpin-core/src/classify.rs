//! Reference classifier.
//!
//! Decides whether a candidate `uses` value is a literal `path@version`
//! reference. Declining a value is not an error: the [`Rejection`] only says
//! why the value was left out of the result.

use std::fmt;

use serde::Serialize;

use crate::document::Scalar;
use crate::reference::{ActionReference, split_reference};

const EXPRESSION_OPEN: &str = "{{";
const EXPRESSION_CLOSE: &str = "}}";
const DOCKER_PREFIX: &str = "docker://";
const LOCAL_PREFIXES: &[&str] = &["./", "../", "/"];

/// Why a candidate value is not a literal action reference.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Rejection {
    /// Contains a `${{ ... }}` expression; resolved at run time, cannot be pinned.
    Templated,
    /// An action or reusable workflow from the same repository.
    LocalPath,
    /// A `docker://` image reference.
    DockerImage,
    /// No unescaped `@` between path and version.
    MissingSeparator,
    /// The path is not `owner/name[/subpath]`, or the value contains whitespace.
    MalformedPath,
    /// Nothing follows the `@`.
    EmptyVersion,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Templated => "templated expression",
            Self::LocalPath => "local path",
            Self::DockerImage => "docker image",
            Self::MissingSeparator => "missing `@` separator",
            Self::MalformedPath => "malformed action path",
            Self::EmptyVersion => "empty version",
        };
        f.write_str(text)
    }
}

/// Classify a candidate scalar taken from a `uses` entry.
///
/// # Errors
///
/// Returns the [`Rejection`] describing why the value is not a literal
/// reference. Callers drop rejected values; they are never fatal.
pub fn classify(scalar: &Scalar) -> Result<ActionReference, Rejection> {
    let value = scalar.value.as_str();

    if is_templated(value) {
        return Err(Rejection::Templated);
    }
    if value.starts_with(DOCKER_PREFIX) {
        return Err(Rejection::DockerImage);
    }
    if LOCAL_PREFIXES.iter().any(|prefix| value.starts_with(prefix)) {
        return Err(Rejection::LocalPath);
    }

    let (path, version) = split_reference(value).ok_or(Rejection::MissingSeparator)?;
    if value.chars().any(char::is_whitespace) || !is_action_path(path) {
        return Err(Rejection::MalformedPath);
    }
    if version.is_empty() {
        return Err(Rejection::EmptyVersion);
    }

    Ok(ActionReference::new(value, path, version, scalar.location))
}

fn is_templated(value: &str) -> bool {
    value
        .find(EXPRESSION_OPEN)
        .is_some_and(|open| value[open + EXPRESSION_OPEN.len()..].contains(EXPRESSION_CLOSE))
}

/// `owner/name` followed by an optional subpath, with no empty segment.
fn is_action_path(path: &str) -> bool {
    let mut segments = path.split('/');
    let owner = segments.next().unwrap_or_default();
    let name = segments.next().unwrap_or_default();
    !owner.is_empty() && !name.is_empty() && segments.all(|s| !s.is_empty())
}
