//! Class-scoped and object-scoped cache handles
//!
//! A [`ClassCache`] binds a store to one resource type; an [`ObjectCache`]
//! further binds it to one object of that type. Object caches hand out child
//! caches whose directory is derived from the *parent's* type and id, so every
//! child of one object shares one subtree while sharing the tree-wide memory
//! map by handle.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::errors::CacheResult;

use super::config::{CacheFlags, FlagOverrides};
use super::expiry::ExpiryPolicy;
use super::path::{CacheKey, PathGenerator};
use super::store::CacheStore;
use super::typed::{DetailCache, IdListCache, InfoCache, ListCache};

/// Cache handle bound to one resource type
#[derive(Debug, Clone)]
pub struct ClassCache {
    store: CacheStore,
    resource_type: String,
}

impl ClassCache {
    /// # Panics
    ///
    /// Panics if `resource_type` is empty.
    pub fn new(store: CacheStore, resource_type: impl Into<String>) -> Self {
        let resource_type = resource_type.into();
        assert!(
            !resource_type.is_empty(),
            "class cache requires a resource type"
        );
        Self {
            store,
            resource_type,
        }
    }

    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    /// Directory holding this node's entries
    pub fn cache_dir(&self) -> &Path {
        self.store.dir()
    }

    pub fn policy(&self) -> &ExpiryPolicy {
        self.store.policy()
    }

    pub fn flags(&self) -> &CacheFlags {
        self.store.flags()
    }

    /// Same node with a different expiry policy
    pub fn with_policy(self, policy: ExpiryPolicy) -> Self {
        let store = self.store.reconfigured(policy, FlagOverrides::default());
        Self { store, ..self }
    }

    /// Same node with some flags overridden
    pub fn with_flags(self, overrides: FlagOverrides) -> Self {
        let store = self.store.reconfigured(*self.store.policy(), overrides);
        Self { store, ..self }
    }

    pub fn details(&self) -> DetailCache<'_> {
        DetailCache::new(&self.store)
    }

    pub fn lists(&self) -> ListCache<'_> {
        ListCache::new(&self.store)
    }

    pub fn id_lists(&self) -> IdListCache<'_> {
        IdListCache::new(&self.store)
    }

    pub fn infos(&self) -> InfoCache<'_> {
        InfoCache::new(&self.store)
    }

    pub fn read_detail(&self, object_id: &str) -> CacheResult<String> {
        self.details().read_detail(&self.resource_type, object_id)
    }

    pub fn write_detail(&self, object_id: &str, content: impl Into<String>) -> CacheResult<()> {
        self.details()
            .write_detail(&self.resource_type, object_id, content)
    }

    pub fn invalidate_detail(&self, object_id: &str) -> CacheResult<()> {
        self.details()
            .invalidate_detail(&self.resource_type, object_id)
    }

    pub fn invalidate_all_details(&self) -> CacheResult<usize> {
        self.details().invalidate_all_details(&self.resource_type)
    }

    pub fn read_list(&self, tag: Option<&str>) -> CacheResult<String> {
        self.lists().read_list(&self.resource_type, tag)
    }

    pub fn write_list(&self, tag: Option<&str>, content: impl Into<String>) -> CacheResult<()> {
        self.lists().write_list(&self.resource_type, tag, content)
    }

    pub fn invalidate_list(&self, tag: Option<&str>) -> CacheResult<()> {
        self.lists().invalidate_list(&self.resource_type, tag)
    }

    pub fn read_id_list(&self, tag: Option<&str>) -> CacheResult<Vec<String>> {
        self.id_lists().read_id_list(&self.resource_type, tag)
    }

    pub fn write_id_list<S: AsRef<str>>(&self, tag: Option<&str>, ids: &[S]) -> CacheResult<()> {
        self.id_lists().write_id_list(&self.resource_type, tag, ids)
    }

    pub fn write_id_list_value(
        &self,
        tag: Option<&str>,
        value: &serde_json::Value,
    ) -> CacheResult<()> {
        self.id_lists()
            .write_id_list_value(&self.resource_type, tag, value)
    }

    pub fn invalidate_id_list(&self, tag: Option<&str>) -> CacheResult<()> {
        self.id_lists().invalidate_id_list(&self.resource_type, tag)
    }

    pub fn read_info<T: DeserializeOwned>(&self, object_id: &str) -> CacheResult<T> {
        self.infos().read_info(&self.resource_type, object_id)
    }

    pub fn write_info<T: Serialize>(&self, object_id: &str, info: &T) -> CacheResult<()> {
        self.infos().write_info(&self.resource_type, object_id, info)
    }

    pub fn read_info_list<T: DeserializeOwned>(&self, tag: Option<&str>) -> CacheResult<Vec<T>> {
        self.infos().read_info_list(&self.resource_type, tag)
    }

    pub fn write_info_list<T: Serialize>(&self, tag: Option<&str>, infos: &[T]) -> CacheResult<()> {
        self.infos()
            .write_info_list(&self.resource_type, tag, infos)
    }

    /// Cache handle for one object of this type, in the same directory
    pub fn object_cache(&self, object_id: impl Into<String>) -> ObjectCache {
        ObjectCache::new(self.clone(), object_id)
    }

    /// Bytes stored in this node's directory subtree
    pub fn size(&self) -> u64 {
        self.store.size()
    }

    /// Remove this node's directory subtree and its memory entries
    pub fn clear(&self) -> CacheResult<()> {
        self.store.clear()
    }
}

/// Cache handle bound to one object of one resource type
#[derive(Debug, Clone)]
pub struct ObjectCache {
    class: ClassCache,
    object_id: String,
}

impl ObjectCache {
    /// # Panics
    ///
    /// Panics if `object_id` is empty.
    pub fn new(class: ClassCache, object_id: impl Into<String>) -> Self {
        let object_id = object_id.into();
        assert!(!object_id.is_empty(), "object cache requires an object id");
        Self { class, object_id }
    }

    pub fn object_id(&self) -> &str {
        &self.object_id
    }

    pub fn resource_type(&self) -> &str {
        self.class.resource_type()
    }

    /// The class-scoped cache this object lives in, for list operations
    pub fn class_cache(&self) -> &ClassCache {
        &self.class
    }

    pub fn cache_dir(&self) -> &Path {
        self.class.cache_dir()
    }

    pub fn policy(&self) -> &ExpiryPolicy {
        self.class.policy()
    }

    pub fn flags(&self) -> &CacheFlags {
        self.class.flags()
    }

    pub fn with_policy(self, policy: ExpiryPolicy) -> Self {
        Self {
            class: self.class.with_policy(policy),
            ..self
        }
    }

    pub fn with_flags(self, overrides: FlagOverrides) -> Self {
        Self {
            class: self.class.with_flags(overrides),
            ..self
        }
    }

    pub fn read_detail(&self) -> CacheResult<String> {
        self.class.read_detail(&self.object_id)
    }

    pub fn write_detail(&self, content: impl Into<String>) -> CacheResult<()> {
        self.class.write_detail(&self.object_id, content)
    }

    pub fn invalidate_detail(&self) -> CacheResult<()> {
        self.class.invalidate_detail(&self.object_id)
    }

    pub fn read_info<T: DeserializeOwned>(&self) -> CacheResult<T> {
        self.class.read_info(&self.object_id)
    }

    pub fn write_info<T: Serialize>(&self, info: &T) -> CacheResult<()> {
        self.class.write_info(&self.object_id, info)
    }

    /// Directory shared by every child cache of this object
    pub fn child_cache_dir(&self) -> PathBuf {
        PathGenerator::child_dir(self.cache_dir(), self.resource_type(), &self.object_id)
    }

    /// Class-scoped cache for a child resource type of this object
    pub fn child_class_cache(
        &self,
        policy: ExpiryPolicy,
        child_type: impl Into<String>,
    ) -> ClassCache {
        let store =
            self.class
                .store()
                .nested(self.child_cache_dir(), policy, FlagOverrides::default());
        ClassCache::new(store, child_type)
    }

    /// Object-scoped cache for one child object of this object
    pub fn child_object_cache(
        &self,
        policy: ExpiryPolicy,
        child_type: impl Into<String>,
        child_id: impl Into<String>,
    ) -> ObjectCache {
        self.child_class_cache(policy, child_type)
            .object_cache(child_id)
    }

    fn children_store(&self) -> CacheStore {
        self.class.store().nested(
            self.child_cache_dir(),
            *self.policy(),
            FlagOverrides::default(),
        )
    }

    /// Remove every cached child of this object, leaving its own entries
    pub fn clear_children(&self) -> CacheResult<()> {
        self.children_store().clear()
    }

    /// Bytes held by this object's detail entry and its children on disk
    pub fn size(&self) -> u64 {
        let detail = self
            .class
            .store()
            .path_for(&CacheKey::detail(self.resource_type(), &self.object_id));
        let own = fs::metadata(detail).map(|m| m.len()).unwrap_or(0);
        own + self.children_store().size()
    }

    /// Remove this object's detail entry and its children
    ///
    /// Siblings of the same type share the class directory and are left alone.
    pub fn clear(&self) -> CacheResult<()> {
        self.invalidate_detail()?;
        self.clear_children()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::cache::memory::MemoryCache;
    use crate::errors::CacheError;
    use tempfile::TempDir;

    fn root_class(temp_dir: &TempDir, resource_type: &str) -> ClassCache {
        let store = CacheStore::new(
            temp_dir.path().to_path_buf(),
            temp_dir.path().to_path_buf(),
            MemoryCache::new(),
            ExpiryPolicy::forever(),
            CacheFlags::default(),
        );
        ClassCache::new(store, resource_type)
    }

    #[test]
    fn test_class_cache_binds_type() {
        let temp_dir = TempDir::new().unwrap();
        let vms = root_class(&temp_dir, "vm");

        vms.write_detail("a", "{}").unwrap();
        vms.write_list(None, "[]").unwrap();
        vms.write_id_list(Some("running"), &["a"]).unwrap();

        assert!(temp_dir.path().join("show_vm_a").exists());
        assert!(temp_dir.path().join("list_vm").exists());
        assert!(temp_dir.path().join("id_list_running_vm").exists());
        assert_eq!(vms.read_id_list(Some("running")).unwrap(), vec!["a"]);
    }

    #[test]
    fn test_object_cache_reads_class_detail() {
        let temp_dir = TempDir::new().unwrap();
        let vms = root_class(&temp_dir, "vm");
        let vm = vms.object_cache("a");

        vm.write_detail("detail").unwrap();
        assert_eq!(vms.read_detail("a").unwrap(), "detail");
        assert_eq!(vm.cache_dir(), vms.cache_dir());

        vm.invalidate_detail().unwrap();
        assert!(matches!(vms.read_detail("a"), Err(CacheError::Miss { .. })));
    }

    #[test]
    fn test_child_dir_uses_parent_coordinates() {
        let temp_dir = TempDir::new().unwrap();
        let group = root_class(&temp_dir, "group").object_cache("rg/1");

        let vms = group.child_class_cache(ExpiryPolicy::forever(), "vm");
        let disks = group.child_class_cache(ExpiryPolicy::forever(), "disk");
        let expected = temp_dir.path().join("cache_group_rg%2F1");

        assert_eq!(vms.cache_dir(), expected.as_path());
        assert_eq!(disks.cache_dir(), expected.as_path());
        assert!(vms.store().memory().shares_with(group.class_cache().store().memory()));

        let vm = group.child_object_cache(ExpiryPolicy::forever(), "vm", "v");
        assert_eq!(
            vm.child_cache_dir(),
            expected.join("cache_vm_v")
        );
    }

    #[test]
    fn test_child_inherits_flags_and_can_override() {
        let temp_dir = TempDir::new().unwrap();
        let group = root_class(&temp_dir, "group")
            .with_flags(FlagOverrides {
                no_cache_write: Some(true),
                ..Default::default()
            })
            .object_cache("g");

        let vms = group.child_class_cache(ExpiryPolicy::forever(), "vm");
        assert!(vms.flags().no_cache_write);

        let vms = vms.with_flags(FlagOverrides {
            no_cache_write: Some(false),
            ..Default::default()
        });
        assert!(!vms.flags().no_cache_write);
        assert!(group.flags().no_cache_write);
    }

    #[test]
    fn test_clear_children_keeps_own_entries() {
        let temp_dir = TempDir::new().unwrap();
        let groups = root_class(&temp_dir, "group");
        let group = groups.object_cache("g");
        group.write_detail("group detail").unwrap();

        let vms = group.child_class_cache(ExpiryPolicy::forever(), "vm");
        vms.write_detail("v", "vm detail").unwrap();

        group.clear_children().unwrap();
        assert!(!group.child_cache_dir().exists());
        assert!(matches!(vms.read_detail("v"), Err(CacheError::Miss { .. })));
        assert_eq!(group.read_detail().unwrap(), "group detail");
    }

    #[test]
    fn test_with_policy_changes_expiry() {
        let temp_dir = TempDir::new().unwrap();
        let vms = root_class(&temp_dir, "vm");
        vms.write_detail("a", "x").unwrap();

        // a fresh tree so the memory layer does not answer
        let cold = root_class(&temp_dir, "vm").with_policy(ExpiryPolicy::default());
        assert!(!cold.policy().is_configured());
        assert!(matches!(cold.read_detail("a"), Err(CacheError::Expired { .. })));
    }

    #[test]
    #[should_panic(expected = "resource type")]
    fn test_empty_type_panics() {
        let temp_dir = TempDir::new().unwrap();
        root_class(&temp_dir, "");
    }

    #[test]
    #[should_panic(expected = "object id")]
    fn test_empty_object_id_panics() {
        let temp_dir = TempDir::new().unwrap();
        root_class(&temp_dir, "vm").object_cache("");
    }
}
