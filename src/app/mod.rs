//! Core application logic for the ezaz cache
//!
//! The cache subsystem lives in [`cache`]; callers own the remote round trip
//! and use the cache to avoid repeating it.

pub mod cache;

// Re-export main public API
pub use cache::{
    CacheFlags, CacheRoot, ClassCache, Expiry, ExpiryPolicy, FlagOverrides, ObjectCache,
};
