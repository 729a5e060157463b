//! Process-lifetime memory layer shared by every node of one cache tree
//!
//! Entries are keyed by their full file path, so two subtrees never alias even
//! though they share the map. Nothing here is persisted and nothing here
//! expires; entries leave only through explicit removal.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Shared handle to the in-memory entry map
///
/// Cloning the handle shares the underlying map. The tree runs on a single
/// thread, so interior mutability via `RefCell` is sufficient.
#[derive(Debug, Clone, Default)]
pub struct MemoryCache {
    entries: Rc<RefCell<HashMap<PathBuf, String>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &Path) -> Option<String> {
        self.entries.borrow().get(path).cloned()
    }

    pub fn insert(&self, path: PathBuf, content: String) {
        self.entries.borrow_mut().insert(path, content);
    }

    pub fn remove(&self, path: &Path) -> Option<String> {
        self.entries.borrow_mut().remove(path)
    }

    /// Remove every entry whose path satisfies `predicate`, returning how many
    pub fn remove_matching(&self, predicate: impl Fn(&Path) -> bool) -> usize {
        let mut entries = self.entries.borrow_mut();
        let before = entries.len();
        entries.retain(|path, _| !predicate(path));
        before - entries.len()
    }

    /// Remove every entry stored at or below `dir`
    pub fn remove_under(&self, dir: &Path) -> usize {
        self.remove_matching(|path| path.starts_with(dir))
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Whether two handles refer to the same map
    pub fn shares_with(&self, other: &MemoryCache) -> bool {
        Rc::ptr_eq(&self.entries, &other.entries)
    }
}
