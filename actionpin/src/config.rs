//! Configuration for filesystem scans.
//!
//! `FsSourceConfig` is what the library consumes. `FileConfig` is the optional
//! `.actionpin.yaml` a repository can commit; the CLI layers its own flags on
//! top of it.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

/// Default file name looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".actionpin.yaml";

/// Directory scanned when no path is given.
pub const DEFAULT_WORKFLOW_DIR: &str = ".github/workflows";

/// Filesystem-specific source options.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct FsSourceConfig {
    /// Paths to scan (files or directories). Required, must be non-empty.
    pub paths: Vec<PathBuf>,
    /// Exclude patterns (glob format).
    pub exclude: Vec<String>,
    /// Maximum file size in bytes (default: 10 MB).
    pub max_file_size: u64,
    /// Whether to follow symbolic links.
    ///
    /// **Defaults to `false`**: a followed symlink can leave the repository
    /// and pull unrelated files into the scan.
    pub follow_links: bool,
    /// Maximum directory traversal depth (default: 64).
    pub max_depth: usize,
    /// Maximum total number of files to scan (default: `100_000`).
    pub max_files: usize,
    /// Maximum total bytes to read across all files (default: 512 MB).
    pub max_total_bytes: u64,
    /// Maximum nodes walked per file, alias occurrences included
    /// (default: `1_000_000`). Larger files fail with `LimitExceeded`.
    pub max_expanded_nodes: usize,
}

impl Default for FsSourceConfig {
    fn default() -> Self {
        Self {
            paths: Vec::new(),
            exclude: Vec::new(),
            max_file_size: 10_485_760,
            follow_links: false,
            max_depth: 64,
            max_files: 100_000,
            max_total_bytes: 536_870_912,
            max_expanded_nodes: 1_000_000,
        }
    }
}

impl FsSourceConfig {
    /// Apply the values set in a repository config file.
    #[must_use]
    pub fn with_file_config(mut self, file: &FileConfig) -> Self {
        self.exclude.extend(file.exclude.iter().cloned());
        if let Some(max) = file.max_file_size {
            self.max_file_size = max;
        }
        if let Some(follow) = file.follow_links {
            self.follow_links = follow;
        }
        if let Some(max) = file.max_expanded_nodes {
            self.max_expanded_nodes = max;
        }
        self
    }
}

/// Contents of `.actionpin.yaml`. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileConfig {
    /// Glob patterns added to the exclude list.
    pub exclude: Vec<String>,
    /// Overrides [`FsSourceConfig::max_file_size`].
    pub max_file_size: Option<u64>,
    /// Overrides [`FsSourceConfig::follow_links`].
    pub follow_links: Option<bool>,
    /// Overrides [`FsSourceConfig::max_expanded_nodes`].
    pub max_expanded_nodes: Option<usize>,
}

impl FileConfig {
    /// Parse a config file's text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid YAML or has unknown keys.
    pub fn from_yaml(text: &str) -> anyhow::Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_saphyr::from_str(text).context("invalid actionpin config")
    }

    /// Load `path`, or `.actionpin.yaml` in the working directory when `path`
    /// is `None` and that file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly requested file is missing, or if any
    /// config file cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(CONFIG_FILE_NAME), false),
        };
        if !required && !path.is_file() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_yaml(&text).with_context(|| format!("in {}", path.display()))
    }
}
