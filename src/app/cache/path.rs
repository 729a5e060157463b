//! Cache key to file path resolution
//!
//! Entry files are named `{kind}[_{tag}]_{type}[_{quoted id}]` and live in the
//! directory of the node that owns them. Children of an object live in
//! `cache_{type}_{quoted id}` below that object's own directory.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use crate::constants::layout::{
    CHILD_DIR_PREFIX, DETAIL_PREFIX, ID_LIST_PREFIX, LIST_PREFIX, SEPARATOR,
};

/// The three kinds of cache entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// A single object's detail ("show") payload
    Detail,
    /// A list of objects
    List,
    /// A list of bare identifiers, stored as a JSON array
    IdList,
}

impl EntryKind {
    /// File name prefix for this kind
    pub fn prefix(&self) -> &'static str {
        match self {
            EntryKind::Detail => DETAIL_PREFIX,
            EntryKind::List => LIST_PREFIX,
            EntryKind::IdList => ID_LIST_PREFIX,
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// Logical address of one cache entry within a node's directory
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub kind: EntryKind,
    pub resource_type: String,
    pub object_id: Option<String>,
    pub tag: Option<String>,
}

impl CacheKey {
    pub fn new(
        kind: EntryKind,
        resource_type: impl Into<String>,
        object_id: Option<&str>,
        tag: Option<&str>,
    ) -> Self {
        Self {
            kind,
            resource_type: resource_type.into(),
            object_id: object_id.map(str::to_string),
            tag: tag.map(str::to_string),
        }
    }

    pub fn detail(resource_type: impl Into<String>, object_id: &str) -> Self {
        Self::new(EntryKind::Detail, resource_type, Some(object_id), None)
    }

    pub fn list(resource_type: impl Into<String>, tag: Option<&str>) -> Self {
        Self::new(EntryKind::List, resource_type, None, tag)
    }

    pub fn id_list(resource_type: impl Into<String>, tag: Option<&str>) -> Self {
        Self::new(EntryKind::IdList, resource_type, None, tag)
    }

    /// File name of the entry; empty components are skipped
    pub fn file_name(&self) -> String {
        let quoted = self.object_id.as_deref().map(PathGenerator::quote_segment);
        [
            Some(self.kind.prefix()),
            self.tag.as_deref(),
            Some(self.resource_type.as_str()),
            quoted.as_deref(),
        ]
        .into_iter()
        .flatten()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(SEPARATOR)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.file_name())
    }
}

/// Decoded view of an entry file name, for diagnostics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedEntryName {
    pub kind: EntryKind,
    /// Everything after the kind prefix with quoting undone
    pub remainder: String,
}

/// Path generation utility for cache files
pub struct PathGenerator;

impl PathGenerator {
    /// Quote an arbitrary identifier into a single safe path segment
    pub fn quote_segment(value: &str) -> String {
        urlencoding::encode(value).into_owned()
    }

    /// Undo [`PathGenerator::quote_segment`]
    pub fn unquote_segment(segment: &str) -> Option<String> {
        urlencoding::decode(segment).ok().map(|s| s.into_owned())
    }

    /// Path of an entry inside `dir`
    pub fn entry_path(dir: &Path, key: &CacheKey) -> PathBuf {
        dir.join(key.file_name())
    }

    /// Name of the directory holding the children of one object
    pub fn child_dir_name(resource_type: &str, object_id: &str) -> String {
        [
            CHILD_DIR_PREFIX,
            resource_type,
            Self::quote_segment(object_id).as_str(),
        ]
        .join(SEPARATOR)
    }

    /// Directory holding the children of one object stored in `dir`
    pub fn child_dir(dir: &Path, resource_type: &str, object_id: &str) -> PathBuf {
        dir.join(Self::child_dir_name(resource_type, object_id))
    }

    /// Recognise an entry file name
    pub fn parse_entry_name(name: &str) -> Option<ParsedEntryName> {
        // `id_list` must be tried before `list`
        for kind in [EntryKind::IdList, EntryKind::Detail, EntryKind::List] {
            let Some(rest) = name.strip_prefix(kind.prefix()) else {
                continue;
            };
            let Some(rest) = rest.strip_prefix(SEPARATOR) else {
                continue;
            };
            return Some(ParsedEntryName {
                kind,
                remainder: Self::unquote_segment(rest).unwrap_or_else(|| rest.to_string()),
            });
        }
        None
    }

    /// Recognise a child directory name, returning `{type}_{id}` decoded
    pub fn parse_child_dir_name(name: &str) -> Option<String> {
        let rest = name
            .strip_prefix(CHILD_DIR_PREFIX)?
            .strip_prefix(SEPARATOR)?;
        Some(Self::unquote_segment(rest).unwrap_or_else(|| rest.to_string()))
    }

    /// Lexically normalise a path, resolving `.` and `..` without touching disk
    pub fn normalize(path: &Path) -> PathBuf {
        let mut normalized = PathBuf::new();
        for component in path.components() {
            match component {
                Component::CurDir => {}
                Component::ParentDir => {
                    if !normalized.pop() {
                        normalized.push(component);
                    }
                }
                other => normalized.push(other),
            }
        }
        normalized
    }

    /// Whether `path` lies inside (or is) `root` after normalisation
    pub fn is_within(path: &Path, root: &Path) -> bool {
        Self::normalize(path).starts_with(Self::normalize(root))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_file_name() {
        let key = CacheKey::detail("vm", "myvm");
        assert_eq!(key.file_name(), "show_vm_myvm");
    }

    #[test]
    fn test_list_file_names() {
        assert_eq!(CacheKey::list("vm", None).file_name(), "list_vm");
        assert_eq!(
            CacheKey::list("location", Some("available")).file_name(),
            "list_available_location"
        );
        assert_eq!(CacheKey::list("vm", Some("")).file_name(), "list_vm");
        assert_eq!(
            CacheKey::id_list("subscription", Some("unavailable")).file_name(),
            "id_list_unavailable_subscription"
        );
    }

    #[test]
    fn test_object_ids_are_quoted() {
        let key = CacheKey::detail("storage_account", "/subscriptions/a b/ü");
        let name = key.file_name();
        assert!(!name.contains('/'));
        assert!(!name.contains(' '));
        assert_eq!(
            name,
            "show_storage_account_%2Fsubscriptions%2Fa%20b%2F%C3%BC"
        );
    }

    #[test]
    fn test_quote_roundtrip_and_uniqueness() {
        let ids = ["a/b", "a%2Fb", "a b", "a+b", "ü", "..", "x_y"];
        let quoted: Vec<String> = ids.iter().map(|id| PathGenerator::quote_segment(id)).collect();

        for (id, q) in ids.iter().zip(&quoted) {
            assert_eq!(PathGenerator::unquote_segment(q).as_deref(), Some(*id));
        }
        let mut unique = quoted.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), quoted.len());
    }

    #[test]
    fn test_child_dir_name() {
        assert_eq!(
            PathGenerator::child_dir_name("group", "rg/1"),
            "cache_group_rg%2F1"
        );
        let dir = PathGenerator::child_dir(Path::new("/cache"), "subscription", "sub");
        assert_eq!(dir, PathBuf::from("/cache/cache_subscription_sub"));
    }

    #[test]
    fn test_parse_entry_name() {
        let parsed = PathGenerator::parse_entry_name("id_list_vm").unwrap();
        assert_eq!(parsed.kind, EntryKind::IdList);
        assert_eq!(parsed.remainder, "vm");

        let parsed = PathGenerator::parse_entry_name("list_available_vm").unwrap();
        assert_eq!(parsed.kind, EntryKind::List);
        assert_eq!(parsed.remainder, "available_vm");

        let parsed = PathGenerator::parse_entry_name("show_vm_a%2Fb").unwrap();
        assert_eq!(parsed.kind, EntryKind::Detail);
        assert_eq!(parsed.remainder, "vm_a/b");

        assert!(PathGenerator::parse_entry_name("showvm").is_none());
        assert!(PathGenerator::parse_entry_name("cache_vm_x").is_none());
        assert_eq!(
            PathGenerator::parse_child_dir_name("cache_vm_a%20b").as_deref(),
            Some("vm_a b")
        );
    }

    #[test]
    fn test_normalize_and_containment() {
        let root = Path::new("/cache");
        assert!(PathGenerator::is_within(Path::new("/cache/a/../b"), root));
        assert!(PathGenerator::is_within(Path::new("/cache"), root));
        assert!(!PathGenerator::is_within(Path::new("/cache/../etc"), root));
        assert!(!PathGenerator::is_within(Path::new("/cache-other"), root));
        assert_eq!(
            PathGenerator::normalize(Path::new("/cache/./x/../y")),
            PathBuf::from("/cache/y")
        );
    }
}
