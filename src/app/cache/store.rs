//! Disk and memory storage primitive for one cache node
//!
//! A [`CacheStore`] owns the coordinates of a node (cache root, its own
//! directory, expiry policy and resolved flags) plus a handle to the tree's
//! shared [`MemoryCache`]. Every read, write and invalidation of the typed
//! caches funnels through here.
//!
//! Memory entries are authoritative: a key found in memory is returned without
//! consulting the disk or the expiry policy. Disk hits are not promoted into
//! memory; only explicit writes populate it.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tempfile::NamedTempFile;
use tracing::warn;
use walkdir::WalkDir;

use crate::constants::layout::SEPARATOR;
use crate::errors::{CacheError, CacheResult};

use super::config::{CacheFlags, FlagOverrides};
use super::expiry::ExpiryPolicy;
use super::memory::MemoryCache;
use super::path::{CacheKey, PathGenerator};

/// Log a cache event at info level for verbose nodes, debug otherwise
macro_rules! cache_event {
    ($flags:expr, $($arg:tt)+) => {
        if $flags.verbose {
            tracing::info!($($arg)+);
        } else {
            tracing::debug!($($arg)+);
        }
    };
}

/// Storage primitive for one node of a cache tree
#[derive(Debug, Clone)]
pub struct CacheStore {
    /// Root of the whole cache tree
    root: PathBuf,
    /// Directory this node reads and writes
    dir: PathBuf,
    memory: MemoryCache,
    policy: ExpiryPolicy,
    flags: CacheFlags,
}

impl CacheStore {
    pub fn new(
        root: PathBuf,
        dir: PathBuf,
        memory: MemoryCache,
        policy: ExpiryPolicy,
        flags: CacheFlags,
    ) -> Self {
        Self {
            root,
            dir,
            memory,
            policy,
            flags,
        }
    }

    /// Build the store of a node nested in `dir`, sharing root and memory
    pub fn nested(&self, dir: PathBuf, policy: ExpiryPolicy, overrides: FlagOverrides) -> Self {
        Self {
            root: self.root.clone(),
            dir,
            memory: self.memory.clone(),
            policy,
            flags: overrides.resolve(&self.flags),
        }
    }

    /// Same node with a different policy and flags
    pub fn reconfigured(&self, policy: ExpiryPolicy, overrides: FlagOverrides) -> Self {
        self.nested(self.dir.clone(), policy, overrides)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn memory(&self) -> &MemoryCache {
        &self.memory
    }

    pub fn policy(&self) -> &ExpiryPolicy {
        &self.policy
    }

    pub fn flags(&self) -> &CacheFlags {
        &self.flags
    }

    /// File path of `key` in this node
    pub fn path_for(&self, key: &CacheKey) -> PathBuf {
        PathGenerator::entry_path(&self.dir, key)
    }

    /// Read an entry
    ///
    /// # Errors
    ///
    /// - `ReadSuppressed` if disk reads are disabled and memory has no entry
    /// - `Miss` if no file exists
    /// - `Expired` if the file is stale under the policy; the file is removed
    ///   unless this is a dry run
    /// - `InvalidCache` if the file is not valid UTF-8
    pub fn read(&self, key: &CacheKey) -> CacheResult<String> {
        let path = self.path_for(key);

        if let Some(content) = self.memory.get(&path) {
            cache_event!(self.flags, "Memory cache hit: {}", path.display());
            return Ok(content);
        }

        if self.flags.no_cache_read {
            cache_event!(self.flags, "Cache read suppressed: {}", path.display());
            return Err(CacheError::ReadSuppressed { path });
        }

        let metadata = match fs::metadata(&path) {
            Ok(metadata) if metadata.is_file() => metadata,
            Ok(_) => return Err(CacheError::Miss { path }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                cache_event!(self.flags, "Cache miss: {}", path.display());
                return Err(CacheError::Miss { path });
            }
            Err(e) => return Err(CacheError::io(path, e)),
        };

        let age = Self::entry_age(&path, &metadata)?;
        if self.policy.is_expired(key.kind, age) {
            cache_event!(
                self.flags,
                "Cache entry expired after {}s: {}",
                age.as_secs(),
                path.display()
            );
            if self.flags.dry_run {
                cache_event!(self.flags, "Dry run: not removing {}", path.display());
            } else {
                Self::remove_file_if_exists(&path)?;
            }
            return Err(CacheError::Expired { path, age });
        }

        match fs::read_to_string(&path) {
            Ok(content) => {
                cache_event!(self.flags, "Disk cache hit: {}", path.display());
                Ok(content)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(CacheError::Miss { path }),
            Err(e) if e.kind() == io::ErrorKind::InvalidData => Err(CacheError::InvalidCache {
                path,
                reason: "content is not valid UTF-8".to_string(),
            }),
            Err(e) => Err(CacheError::io(path, e)),
        }
    }

    /// Write an entry to memory and, unless suppressed, to disk
    ///
    /// The memory layer is updated unconditionally so later reads in this
    /// process see the content even under dry run or `no_cache_write`.
    pub fn write(&self, key: &CacheKey, content: impl Into<String>) -> CacheResult<()> {
        let path = self.path_for(key);
        let content = content.into();
        self.memory.insert(path.clone(), content.clone());

        if self.flags.writes_disk() {
            Self::write_atomic(&path, &content)?;
            cache_event!(self.flags, "Cached {} bytes: {}", content.len(), path.display());
        } else {
            cache_event!(self.flags, "Cache write kept in memory only: {}", path.display());
        }
        Ok(())
    }

    /// Drop an entry from memory and disk
    pub fn invalidate(&self, key: &CacheKey) -> CacheResult<()> {
        let path = self.path_for(key);
        self.memory.remove(&path);

        if self.flags.dry_run {
            cache_event!(self.flags, "Dry run: not removing {}", path.display());
            return Ok(());
        }

        if Self::remove_file_if_exists(&path)? {
            cache_event!(self.flags, "Invalidated cache entry: {}", path.display());
        }
        Ok(())
    }

    /// Drop every entry named `key`'s file name or `key`'s file name plus `_...`
    ///
    /// Stricter than a raw prefix glob: `show_vm` matches `show_vm` and
    /// `show_vm_a` but not `show_vmss_a`.
    ///
    /// Returns the number of files removed from disk.
    ///
    /// # Errors
    ///
    /// Returns `PathEscape` without removing anything if the resolved directory
    /// is not inside the cache root.
    pub fn invalidate_all(&self, key: &CacheKey) -> CacheResult<usize> {
        let prefix_path = self.path_for(key);
        let dir = prefix_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.dir.clone());

        if !PathGenerator::is_within(&dir, &self.root) {
            warn!(
                "Refusing bulk invalidation outside cache root: {}",
                dir.display()
            );
            return Err(CacheError::PathEscape {
                path: PathGenerator::normalize(&dir),
                root: self.root.clone(),
            });
        }

        let prefix = key.file_name();
        let prefix = Path::new(&prefix)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or(prefix);
        let matches = |name: &str| {
            name == prefix
                || name
                    .strip_prefix(prefix.as_str())
                    .is_some_and(|rest| rest.starts_with(SEPARATOR))
        };

        self.memory.remove_matching(|path| {
            path.parent() == Some(dir.as_path())
                && path
                    .file_name()
                    .is_some_and(|name| matches(&name.to_string_lossy()))
        });

        if self.flags.dry_run {
            cache_event!(
                self.flags,
                "Dry run: not removing {}* in {}",
                prefix,
                dir.display()
            );
            return Ok(0);
        }

        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(CacheError::io(dir, e)),
        };

        let mut removed = 0;
        for entry in entries {
            let entry = entry.map_err(|e| CacheError::io(&dir, e))?;
            let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
            if is_file && matches(&entry.file_name().to_string_lossy()) {
                if Self::remove_file_if_exists(&entry.path())? {
                    removed += 1;
                }
            }
        }

        cache_event!(
            self.flags,
            "Invalidated {} cache entries matching {} in {}",
            removed,
            prefix,
            dir.display()
        );
        Ok(removed)
    }

    /// Total bytes stored in this node's directory subtree
    pub fn size(&self) -> u64 {
        WalkDir::new(&self.dir)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| entry.metadata().ok())
            .map(|metadata| metadata.len())
            .sum()
    }

    /// Remove this node's directory subtree and its memory entries
    pub fn clear(&self) -> CacheResult<()> {
        let purged = self.memory.remove_under(&self.dir);
        cache_event!(
            self.flags,
            "Purged {} memory entries under {}",
            purged,
            self.dir.display()
        );

        if self.flags.dry_run {
            cache_event!(self.flags, "Dry run: not removing {}", self.dir.display());
            return Ok(());
        }

        match fs::remove_dir_all(&self.dir) {
            Ok(()) => {
                cache_event!(self.flags, "Cleared cache directory: {}", self.dir.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CacheError::io(&self.dir, e)),
        }
    }

    /// Age of a file from its modification time; future mtimes count as new
    fn entry_age(path: &Path, metadata: &fs::Metadata) -> CacheResult<Duration> {
        let modified = metadata
            .modified()
            .map_err(|e| CacheError::io(path, e))?;
        Ok(SystemTime::now()
            .duration_since(modified)
            .unwrap_or(Duration::ZERO))
    }

    /// Write through a temp file in the target directory and rename into place
    fn write_atomic(path: &Path, content: &str) -> CacheResult<()> {
        let parent = path
            .parent()
            .ok_or_else(|| CacheError::io(path, io::Error::from(io::ErrorKind::InvalidInput)))?;
        fs::create_dir_all(parent).map_err(|e| CacheError::io(parent, e))?;

        let mut temp = NamedTempFile::new_in(parent).map_err(|e| CacheError::io(parent, e))?;
        temp.write_all(content.as_bytes())
            .map_err(|e| CacheError::io(temp.path(), e))?;
        temp.persist(path)
            .map_err(|e| CacheError::io(path, e.error))?;
        Ok(())
    }

    /// Returns whether a file was actually removed
    fn remove_file_if_exists(path: &Path) -> CacheResult<bool> {
        match fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(CacheError::io(path, e)),
        }
    }
}
