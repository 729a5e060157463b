//! Cache statistics and disk usage monitoring
//!
//! Diagnostics only: nothing here influences what the cache returns.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Utc};
use tracing::warn;
use walkdir::WalkDir;

use super::path::{EntryKind, PathGenerator};

/// One cache entry file found on disk
#[derive(Debug, Clone)]
pub struct EntryInfo {
    /// Full path of the entry file
    pub path: PathBuf,
    pub kind: EntryKind,
    /// File name after the kind prefix, with quoting undone
    pub name: String,
    /// Decoded `{type}_{id}` of each enclosing child directory, outermost first
    pub parents: Vec<String>,
    /// Size in bytes
    pub size: u64,
    pub modified: DateTime<Utc>,
}

impl EntryInfo {
    /// Age of the entry at `now`; entries from the future count as new
    pub fn age_at(&self, now: DateTime<Utc>) -> Duration {
        (now - self.modified).to_std().unwrap_or(Duration::ZERO)
    }

    /// Human readable nesting, e.g. `group_rg1 > vm_a`
    pub fn nesting(&self) -> String {
        if self.parents.is_empty() {
            "-".to_string()
        } else {
            self.parents.join(" > ")
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone)]
pub struct CacheStats {
    /// Cache root directory
    pub cache_root: PathBuf,
    /// Number of entry files on disk
    pub cached_files_count: usize,
    /// Total size of entry files in bytes
    pub total_cache_size: u64,
    /// Entry files, in directory walk order
    pub entries: Vec<EntryInfo>,
}

impl CacheStats {
    /// Create new cache statistics
    pub fn new(cache_root: PathBuf) -> Self {
        Self {
            cache_root,
            cached_files_count: 0,
            total_cache_size: 0,
            entries: Vec::new(),
        }
    }

    fn push(&mut self, entry: EntryInfo) {
        self.cached_files_count += 1;
        self.total_cache_size += entry.size;
        self.entries.push(entry);
    }

    /// Number of entries of one kind
    pub fn count_of(&self, kind: EntryKind) -> usize {
        self.entries.iter().filter(|e| e.kind == kind).count()
    }

    /// Format cache size in human-readable format
    pub fn format_cache_size(&self) -> String {
        format_bytes(self.total_cache_size)
    }
}

/// Directory scanner for cache statistics
pub struct DirectoryScanner;

impl DirectoryScanner {
    /// Walk `cache_root` and collect every recognised entry file
    ///
    /// Unreadable files and directories are skipped with a warning; a missing
    /// root yields empty statistics.
    pub fn scan(cache_root: &Path) -> CacheStats {
        let mut stats = CacheStats::new(cache_root.to_path_buf());
        if !cache_root.exists() {
            return stats;
        }

        for entry in WalkDir::new(cache_root).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Failed to scan cache directory: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let file_name = entry.file_name().to_string_lossy();
            let Some(parsed) = PathGenerator::parse_entry_name(&file_name) else {
                continue;
            };
            let metadata = match entry.metadata() {
                Ok(metadata) => metadata,
                Err(e) => {
                    warn!("Failed to read metadata for {}: {}", entry.path().display(), e);
                    continue;
                }
            };
            let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);

            stats.push(EntryInfo {
                path: entry.path().to_path_buf(),
                kind: parsed.kind,
                name: parsed.remainder,
                parents: Self::parents(cache_root, entry.path()),
                size: metadata.len(),
                modified: DateTime::<Utc>::from(modified),
            });
        }

        stats
    }

    /// Decoded child directory names between the root and `path`
    fn parents(cache_root: &Path, path: &Path) -> Vec<String> {
        let Some(dir) = path.parent() else {
            return Vec::new();
        };
        let Ok(relative) = dir.strip_prefix(cache_root) else {
            return Vec::new();
        };
        relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .map(|name| PathGenerator::parse_child_dir_name(&name).unwrap_or_else(|| name.into_owned()))
            .collect()
    }
}

/// Format bytes in human-readable format
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    const THRESHOLD: u64 = 1024;

    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= THRESHOLD as f64 && unit_index < UNITS.len() - 1 {
        size /= THRESHOLD as f64;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.2} {}", size, UNITS[unit_index])
    }
}
