//! ezaz cache library
//!
//! A hierarchical object cache for the results of expensive remote lookups.
//! Entries are stored as files in a directory tree that mirrors the
//! parent/child hierarchy of the remote resources, with a shared in-process
//! memory layer in front and per-type expiry applied lazily on read.

pub mod app;
pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;
pub mod prelude;

// Re-export commonly used types for convenience
pub use errors::{AppError, CacheError, Result};
