//! Hierarchical object cache with per-type expiry
//!
//! Results of expensive remote lookups (single object details, object lists
//! and identifier lists) are memoized on disk and in process memory. Caches
//! form a tree that mirrors the parent/child hierarchy of the remote
//! resources: every node reads and writes its own directory, children of an
//! object live in a subdirectory named after that object, and one memory map
//! is shared by the whole tree.
//!
//! # Key Features
//!
//! - **Lazy expiry**: entries are checked against an [`ExpiryPolicy`] when
//!   read, and stale files are removed on detection. There is no sweeper.
//! - **Authoritative memory layer**: anything written in this process is
//!   served from memory without expiry checks.
//! - **Dry run**: the memory layer keeps working while disk mutations are
//!   suppressed.
//! - **Isolated subtrees**: sibling objects never share a directory, and
//!   bulk invalidation refuses to leave the cache root.
//!
//! # Module Organization
//!
//! - [`expiry`] - Expiry rules and policies
//! - [`path`] - Cache keys and on-disk naming
//! - [`config`] - Per-node flags and their inheritance
//! - [`memory`] - The shared memory layer
//! - [`store`] - Disk and memory storage primitive
//! - [`typed`] - Detail, list, id-list and record views
//! - [`scoped`] - Class and object scoped caches
//! - [`root`] - Tree entry point
//! - [`stats`] - Disk usage diagnostics
//!
//! # Examples
//!
//! ```rust,no_run
//! use ezaz_cache::app::cache::{CacheFlags, CacheRoot, Expiry, ExpiryPolicy};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let root = CacheRoot::new("/tmp/ezaz-cache", CacheFlags::default());
//! let policy = ExpiryPolicy::default().with_detail_expiry(Expiry::Forever);
//!
//! let group = root.object_cache(policy, "group", "my-group");
//! let vms = group.child_class_cache(policy, "vm");
//!
//! let detail = match vms.read_detail("myvm") {
//!     Ok(cached) => cached,
//!     Err(e) if e.needs_fetch() => {
//!         let fetched = r#"{"name":"myvm"}"#.to_string(); // live lookup goes here
//!         vms.write_detail("myvm", fetched.clone())?;
//!         fetched
//!     }
//!     Err(e) => return Err(e.into()),
//! };
//! println!("{}", detail);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod expiry;
pub mod memory;
pub mod path;
pub mod root;
pub mod scoped;
pub mod stats;
pub mod store;
pub mod typed;

#[cfg(test)]
mod tests;

// Re-export main public API
pub use config::{CacheFlags, FlagOverrides};
pub use expiry::{Expiry, ExpiryPolicy};
pub use memory::MemoryCache;
pub use path::{CacheKey, EntryKind, PathGenerator};
pub use root::CacheRoot;
pub use scoped::{ClassCache, ObjectCache};
pub use stats::{CacheStats, DirectoryScanner, EntryInfo};
pub use store::CacheStore;
pub use typed::{DetailCache, IdListCache, InfoCache, ListCache};
