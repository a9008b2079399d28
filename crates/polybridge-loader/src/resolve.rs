//! Execution-path resolution.
//!
//! Path-based backends keep an ordered list of search roots. A requested
//! path is first tried as given (absolute, or relative to the process
//! working directory); only if that fails are the roots tried, in
//! registration order, joined with the requested path. Iteration stops at
//! the first success — later roots are never consulted once one matches.

use crate::handle::ResourceDescriptor;
use std::path::{Path, PathBuf};
use tracing::{debug, error};

/// Ordered search roots plus the resolution algorithm over them.
#[derive(Debug, Default)]
pub struct PathResolver {
    roots: Vec<PathBuf>,
}

impl PathResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a search root. Duplicates are permitted; order matters more
    /// than uniqueness, since earlier roots win.
    pub fn register(&mut self, root: impl Into<PathBuf>) {
        self.roots.push(root.into());
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Resolve against the filesystem: a path resolves when it exists.
    pub fn resolve(&self, requested: &Path) -> Option<PathBuf> {
        self.resolve_with(requested, |candidate| std::fs::metadata(candidate).is_ok())
    }

    /// Resolve with a backend-supplied existence rule.
    pub fn resolve_with<F>(&self, requested: &Path, exists: F) -> Option<PathBuf>
    where
        F: Fn(&Path) -> bool,
    {
        if exists(requested) {
            debug!("Resolved {:?} as given", requested);
            return Some(requested.to_path_buf());
        }

        for root in &self.roots {
            let candidate = root.join(requested);
            if exists(&candidate) {
                debug!("Resolved {:?} under execution path {:?}", requested, root);
                return Some(candidate);
            }
        }

        error!("Path {:?} did not resolve under any execution path", requested);
        None
    }

    /// Resolve a list of requested paths against the filesystem, tolerating
    /// individual failures. The caller decides what an empty result means.
    pub fn resolve_all(&self, requested: &[PathBuf]) -> Vec<ResourceDescriptor> {
        requested
            .iter()
            .filter_map(|path| self.resolve(path))
            .map(ResourceDescriptor::new)
            .collect()
    }
}
