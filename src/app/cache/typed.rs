//! Typed views over a [`CacheStore`]
//!
//! Each view fixes the entry kind. The id-list view adds JSON encoding of the
//! identifier array, and [`InfoCache`] stores serde records on top of the
//! detail and list views.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::errors::{CacheError, CacheResult};

use super::path::{CacheKey, EntryKind};
use super::store::CacheStore;

/// Single object ("show") entries
#[derive(Debug, Clone, Copy)]
pub struct DetailCache<'a> {
    store: &'a CacheStore,
}

impl<'a> DetailCache<'a> {
    pub fn new(store: &'a CacheStore) -> Self {
        Self { store }
    }

    pub fn read_detail(&self, resource_type: &str, object_id: &str) -> CacheResult<String> {
        self.store.read(&CacheKey::detail(resource_type, object_id))
    }

    pub fn write_detail(
        &self,
        resource_type: &str,
        object_id: &str,
        content: impl Into<String>,
    ) -> CacheResult<()> {
        self.store
            .write(&CacheKey::detail(resource_type, object_id), content)
    }

    pub fn invalidate_detail(&self, resource_type: &str, object_id: &str) -> CacheResult<()> {
        self.store
            .invalidate(&CacheKey::detail(resource_type, object_id))
    }

    /// Drop the detail entries of every object of `resource_type`
    pub fn invalidate_all_details(&self, resource_type: &str) -> CacheResult<usize> {
        self.store
            .invalidate_all(&CacheKey::new(EntryKind::Detail, resource_type, None, None))
    }
}

/// Object list entries, optionally partitioned by tag
#[derive(Debug, Clone, Copy)]
pub struct ListCache<'a> {
    store: &'a CacheStore,
}

impl<'a> ListCache<'a> {
    pub fn new(store: &'a CacheStore) -> Self {
        Self { store }
    }

    pub fn read_list(&self, resource_type: &str, tag: Option<&str>) -> CacheResult<String> {
        self.store.read(&CacheKey::list(resource_type, tag))
    }

    pub fn write_list(
        &self,
        resource_type: &str,
        tag: Option<&str>,
        content: impl Into<String>,
    ) -> CacheResult<()> {
        self.store.write(&CacheKey::list(resource_type, tag), content)
    }

    pub fn invalidate_list(&self, resource_type: &str, tag: Option<&str>) -> CacheResult<()> {
        self.store.invalidate(&CacheKey::list(resource_type, tag))
    }
}

/// Identifier list entries, stored as a compact JSON array of strings
#[derive(Debug, Clone, Copy)]
pub struct IdListCache<'a> {
    store: &'a CacheStore,
}

impl<'a> IdListCache<'a> {
    pub fn new(store: &'a CacheStore) -> Self {
        Self { store }
    }

    /// Read and decode an id list
    ///
    /// # Errors
    ///
    /// Returns `InvalidCache` if the stored content is not a JSON array of
    /// strings, in addition to the usual read errors.
    pub fn read_id_list(&self, resource_type: &str, tag: Option<&str>) -> CacheResult<Vec<String>> {
        let key = CacheKey::id_list(resource_type, tag);
        let content = self.store.read(&key)?;
        serde_json::from_str(&content).map_err(|e| CacheError::InvalidCache {
            path: self.store.path_for(&key),
            reason: e.to_string(),
        })
    }

    pub fn write_id_list<S: AsRef<str>>(
        &self,
        resource_type: &str,
        tag: Option<&str>,
        ids: &[S],
    ) -> CacheResult<()> {
        let key = CacheKey::id_list(resource_type, tag);
        let ids: Vec<&str> = ids.iter().map(AsRef::as_ref).collect();
        let content = serde_json::to_string(&ids).map_err(|e| CacheError::InvalidCache {
            path: self.store.path_for(&key),
            reason: e.to_string(),
        })?;
        self.store.write(&key, content)
    }

    /// Write an id list received as untyped JSON
    ///
    /// # Errors
    ///
    /// Returns `InvalidCache` unless `value` is an array of strings.
    pub fn write_id_list_value(
        &self,
        resource_type: &str,
        tag: Option<&str>,
        value: &serde_json::Value,
    ) -> CacheResult<()> {
        let key = CacheKey::id_list(resource_type, tag);
        let ids: Vec<String> =
            serde_json::from_value(value.clone()).map_err(|e| CacheError::InvalidCache {
                path: self.store.path_for(&key),
                reason: format!("id list must be an array of strings: {}", e),
            })?;
        self.write_id_list(resource_type, tag, ids.as_slice())
    }

    pub fn invalidate_id_list(&self, resource_type: &str, tag: Option<&str>) -> CacheResult<()> {
        self.store.invalidate(&CacheKey::id_list(resource_type, tag))
    }
}

/// Structured records persisted through the detail and list views
///
/// Serialization is delegated to the record type's serde implementation; a
/// single record is a detail entry, a list of records is a list entry.
#[derive(Debug, Clone, Copy)]
pub struct InfoCache<'a> {
    store: &'a CacheStore,
}

impl<'a> InfoCache<'a> {
    pub fn new(store: &'a CacheStore) -> Self {
        Self { store }
    }

    pub fn read_info<T: DeserializeOwned>(
        &self,
        resource_type: &str,
        object_id: &str,
    ) -> CacheResult<T> {
        let key = CacheKey::detail(resource_type, object_id);
        self.decode(&key)
    }

    pub fn write_info<T: Serialize>(
        &self,
        resource_type: &str,
        object_id: &str,
        info: &T,
    ) -> CacheResult<()> {
        let key = CacheKey::detail(resource_type, object_id);
        self.encode(&key, info)
    }

    pub fn read_info_list<T: DeserializeOwned>(
        &self,
        resource_type: &str,
        tag: Option<&str>,
    ) -> CacheResult<Vec<T>> {
        let key = CacheKey::list(resource_type, tag);
        self.decode(&key)
    }

    pub fn write_info_list<T: Serialize>(
        &self,
        resource_type: &str,
        tag: Option<&str>,
        infos: &[T],
    ) -> CacheResult<()> {
        let key = CacheKey::list(resource_type, tag);
        self.encode(&key, infos)
    }

    fn decode<T: DeserializeOwned>(&self, key: &CacheKey) -> CacheResult<T> {
        let content = self.store.read(key)?;
        serde_json::from_str(&content).map_err(|e| CacheError::InvalidCache {
            path: self.store.path_for(key),
            reason: e.to_string(),
        })
    }

    fn encode<T: Serialize + ?Sized>(&self, key: &CacheKey, value: &T) -> CacheResult<()> {
        let content = serde_json::to_string(value).map_err(|e| CacheError::InvalidCache {
            path: self.store.path_for(key),
            reason: e.to_string(),
        })?;
        self.store.write(key, content)
    }
}
