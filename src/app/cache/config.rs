//! Per-node cache flags
//!
//! Every node in a cache tree carries a fully resolved [`CacheFlags`] value.
//! Overrides are applied once, when the node is built from its parent, so
//! reading a flag never walks back up the tree.

use serde::{Deserialize, Serialize};

/// Resolved behaviour switches for one cache node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CacheFlags {
    /// Log cache activity at info level instead of debug
    pub verbose: bool,
    /// Keep the memory layer working but never mutate the disk
    pub dry_run: bool,
    /// Never serve entries from disk
    pub no_cache_read: bool,
    /// Never write entries to disk
    pub no_cache_write: bool,
}

impl CacheFlags {
    pub fn with_verbose(mut self, enabled: bool) -> Self {
        self.verbose = enabled;
        self
    }

    pub fn with_dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    pub fn with_no_cache_read(mut self, enabled: bool) -> Self {
        self.no_cache_read = enabled;
        self
    }

    pub fn with_no_cache_write(mut self, enabled: bool) -> Self {
        self.no_cache_write = enabled;
        self
    }

    /// Whether writes and deletes may touch the filesystem
    pub fn writes_disk(&self) -> bool {
        !self.dry_run && !self.no_cache_write
    }
}

/// Optional per-node overrides; `None` inherits the parent's value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlagOverrides {
    pub verbose: Option<bool>,
    pub dry_run: Option<bool>,
    pub no_cache_read: Option<bool>,
    pub no_cache_write: Option<bool>,
}

impl FlagOverrides {
    /// Resolve against the parent's flags (top-level nodes pass the defaults)
    pub fn resolve(&self, parent: &CacheFlags) -> CacheFlags {
        CacheFlags {
            verbose: self.verbose.unwrap_or(parent.verbose),
            dry_run: self.dry_run.unwrap_or(parent.dry_run),
            no_cache_read: self.no_cache_read.unwrap_or(parent.no_cache_read),
            no_cache_write: self.no_cache_write.unwrap_or(parent.no_cache_write),
        }
    }
}
