//! Tree-level tests for the cache module
//!
//! These exercise whole cache trees built from a [`CacheRoot`]: nesting,
//! isolation between siblings, expiry over time and dry-run behaviour.
//!
//! [`CacheRoot`]: crate::app::cache::CacheRoot
