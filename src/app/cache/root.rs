//! Entry point of a cache tree
//!
//! The root knows the cache directory and the global flags, and owns the
//! memory layer every node built from it shares. It stores no entries itself.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::constants::layout::{APP_DIR, CACHE_DIR};
use crate::errors::CacheResult;

use super::config::CacheFlags;
use super::expiry::ExpiryPolicy;
use super::memory::MemoryCache;
use super::scoped::{ClassCache, ObjectCache};
use super::stats::{CacheStats, DirectoryScanner};
use super::store::CacheStore;

/// Factory for top-level class and object caches
#[derive(Debug, Clone)]
pub struct CacheRoot {
    root: PathBuf,
    flags: CacheFlags,
    memory: MemoryCache,
}

impl CacheRoot {
    pub fn new(root: impl Into<PathBuf>, flags: CacheFlags) -> Self {
        let root = root.into();
        debug!("Using cache root: {}", root.display());
        Self {
            root,
            flags,
            memory: MemoryCache::new(),
        }
    }

    /// `<cache_home>/ezaz/cache`
    pub fn default_root(cache_home: &Path) -> PathBuf {
        cache_home.join(APP_DIR).join(CACHE_DIR)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn flags(&self) -> &CacheFlags {
        &self.flags
    }

    pub fn memory(&self) -> &MemoryCache {
        &self.memory
    }

    fn store(&self, policy: ExpiryPolicy) -> CacheStore {
        CacheStore::new(
            self.root.clone(),
            self.root.clone(),
            self.memory.clone(),
            policy,
            self.flags,
        )
    }

    /// Top-level cache for one resource type
    pub fn class_cache(&self, policy: ExpiryPolicy, resource_type: impl Into<String>) -> ClassCache {
        ClassCache::new(self.store(policy), resource_type)
    }

    /// Top-level cache for one object
    pub fn object_cache(
        &self,
        policy: ExpiryPolicy,
        resource_type: impl Into<String>,
        object_id: impl Into<String>,
    ) -> ObjectCache {
        self.class_cache(policy, resource_type)
            .object_cache(object_id)
    }

    /// Bytes stored under the root
    pub fn size(&self) -> u64 {
        self.store(ExpiryPolicy::default()).size()
    }

    /// File count, size and per-entry listing of the whole tree
    pub fn stats(&self) -> CacheStats {
        DirectoryScanner::scan(&self.root)
    }

    /// Remove the whole tree from disk and memory
    pub fn clear(&self) -> CacheResult<()> {
        self.store(ExpiryPolicy::default()).clear()
    }
}
