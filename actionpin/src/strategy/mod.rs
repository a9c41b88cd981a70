//! Workflow sources.
//!
//! Only the filesystem source exists today. The core scanner takes bytes, so a
//! second source (e.g. a git tree or an API download) needs no trait until it
//! actually appears.

pub mod fs;
