//! Integration tests for the cache tree
//!
//! These tests drive the public API the way a command layer would: read,
//! fall back to a live fetch on a cache signal, write the result back.

use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};

use filetime::{set_file_mtime, FileTime};
use serde::{Deserialize, Serialize};
use tempfile::TempDir;

use ezaz_cache::config::AppConfig;
use ezaz_cache::prelude::*;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct VmInfo {
    name: String,
    location: String,
}

fn backdate(path: &Path, seconds: u64) {
    let past = SystemTime::now() - Duration::from_secs(seconds);
    set_file_mtime(path, FileTime::from_system_time(past)).unwrap();
}

/// Cached read with a live fallback, counting how often the fallback runs
fn cached_vm(cache: &ClassCache, id: &str, fetches: &mut usize) -> CacheResult<VmInfo> {
    match cache.read_info(id) {
        Ok(info) => Ok(info),
        Err(e) if e.needs_fetch() => {
            *fetches += 1;
            let info = VmInfo {
                name: id.to_string(),
                location: "westus".to_string(),
            };
            cache.write_info(id, &info)?;
            Ok(info)
        }
        Err(e) => Err(e),
    }
}

#[test]
fn test_read_through_pattern_fetches_once_per_process() {
    let temp_dir = TempDir::new().unwrap();
    let policy = ExpiryPolicy::default().with_detail_expiry(Expiry::After(Duration::from_secs(60)));
    let mut fetches = 0;

    let root = CacheRoot::new(temp_dir.path(), CacheFlags::default());
    let vms = root.object_cache(policy, "group", "rg").child_class_cache(policy, "vm");
    let first = cached_vm(&vms, "a", &mut fetches).unwrap();
    let second = cached_vm(&vms, "a", &mut fetches).unwrap();
    assert_eq!(first, second);
    assert_eq!(fetches, 1);

    // a fresh process is served from disk while the entry is young
    let next = CacheRoot::new(temp_dir.path(), CacheFlags::default());
    let vms = next.object_cache(policy, "group", "rg").child_class_cache(policy, "vm");
    cached_vm(&vms, "a", &mut fetches).unwrap();
    assert_eq!(fetches, 1);

    // and refetches once it is stale
    backdate(&vms.cache_dir().join("show_vm_a"), 120);
    let later = CacheRoot::new(temp_dir.path(), CacheFlags::default());
    let vms = later.object_cache(policy, "group", "rg").child_class_cache(policy, "vm");
    cached_vm(&vms, "a", &mut fetches).unwrap();
    assert_eq!(fetches, 2);
}

#[test]
fn test_no_cache_read_still_refreshes_disk() {
    let temp_dir = TempDir::new().unwrap();
    let policy = ExpiryPolicy::forever();
    let seeded = CacheRoot::new(temp_dir.path(), CacheFlags::default());
    seeded
        .class_cache(policy, "location")
        .write_id_list(None, &["westus"])
        .unwrap();

    let refresh = CacheRoot::new(
        temp_dir.path(),
        CacheFlags::default().with_no_cache_read(true),
    );
    let locations = refresh.class_cache(policy, "location");
    assert!(matches!(
        locations.read_id_list(None),
        Err(CacheError::ReadSuppressed { .. })
    ));

    locations.write_id_list(None, &["eastus", "westus"]).unwrap();
    assert_eq!(
        locations.read_id_list(None).unwrap(),
        vec!["eastus".to_string(), "westus".to_string()]
    );

    let reader = CacheRoot::new(temp_dir.path(), CacheFlags::default());
    assert_eq!(
        reader.class_cache(policy, "location").read_id_list(None).unwrap().len(),
        2
    );
}

#[test]
fn test_corrupt_entry_reads_as_invalid_cache() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("show_vm_a"), "not json").unwrap();

    let root = CacheRoot::new(temp_dir.path(), CacheFlags::default());
    let vms = root.class_cache(ExpiryPolicy::forever(), "vm");

    let err = vms.read_info::<VmInfo>("a").unwrap_err();
    assert!(matches!(err, CacheError::InvalidCache { .. }));
    assert!(err.needs_fetch());

    // the raw string view is unaffected
    assert_eq!(vms.read_detail("a").unwrap(), "not json");
}

#[test]
fn test_policies_from_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("cache.toml");
    let cache_dir = temp_dir.path().join("tree");
    fs::write(
        &config_path,
        format!(
            r#"
[cache]
cache_root = "{}"

[cache.expiry.vm]
detail = 30
list = "nocache"

[cache.expiry.location]
list = "forever"
"#,
            cache_dir.display()
        ),
    )
    .unwrap();

    let config = AppConfig::load(Some(&config_path)).unwrap();
    let root = CacheRoot::new(
        config.cache.resolve_root(None, None).unwrap(),
        config.cache.flags(),
    );
    assert_eq!(root.root(), cache_dir);

    let writer = root.class_cache(config.cache.policy_for("vm"), "vm");
    writer.write_detail("a", "{}").unwrap();
    writer.write_list(None, "[]").unwrap();

    let next = CacheRoot::new(&cache_dir, config.cache.flags());
    let vms = next.class_cache(config.cache.policy_for("vm"), "vm");
    assert_eq!(vms.read_detail("a").unwrap(), "{}");
    assert!(matches!(vms.read_list(None), Err(CacheError::Expired { .. })));

    let locations = next.class_cache(config.cache.policy_for("location"), "location");
    assert!(matches!(
        locations.read_detail("westus"),
        Err(CacheError::Miss { .. })
    ));
}

#[test]
fn test_object_scoped_views_share_entries_with_class_view() {
    let temp_dir = TempDir::new().unwrap();
    let policy = ExpiryPolicy::forever();
    let root = CacheRoot::new(temp_dir.path(), CacheFlags::default());

    let vm = root.object_cache(policy, "vm", "a");
    vm.write_info(&VmInfo {
        name: "a".to_string(),
        location: "westus".to_string(),
    })
    .unwrap();

    let class_view: VmInfo = root.class_cache(policy, "vm").read_info("a").unwrap();
    assert_eq!(class_view.location, "westus");

    vm.invalidate_detail().unwrap();
    assert!(matches!(
        root.class_cache(policy, "vm").read_detail("a"),
        Err(CacheError::Miss { .. })
    ));
}

#[test]
fn test_stats_reflect_nested_tree() {
    let temp_dir = TempDir::new().unwrap();
    let policy = ExpiryPolicy::forever();
    let root = CacheRoot::new(temp_dir.path(), CacheFlags::default());

    let sub = root.object_cache(policy, "subscription", "s");
    sub.write_detail("{}").unwrap();
    sub.child_class_cache(policy, "group")
        .write_list(Some("all"), "[]")
        .unwrap();

    let stats = root.stats();
    assert_eq!(stats.cached_files_count, 2);
    assert_eq!(stats.total_cache_size, 4);
    assert_eq!(root.size(), 4);

    sub.clear_children().unwrap();
    assert_eq!(root.stats().cached_files_count, 1);
}
