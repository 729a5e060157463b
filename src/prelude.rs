//! Prelude module for the ezaz cache library
//!
//! Re-exports the items most integrations need, so a single
//! `use ezaz_cache::prelude::*;` is enough to build and use a cache tree.
//!
//! # Usage
//!
//! ```rust,no_run
//! use ezaz_cache::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let config = AppConfig::load(None)?;
//!     let root = CacheRoot::new(config.cache.resolve_root(None, None)?, config.cache.flags());
//!
//!     let locations = root.class_cache(config.cache.policy_for("location"), "location");
//!     match locations.read_id_list(None) {
//!         Ok(ids) => println!("{} cached locations", ids.len()),
//!         Err(e) if e.needs_fetch() => println!("fetch live: {}", e),
//!         Err(e) => return Err(e.into()),
//!     }
//!     Ok(())
//! }
//! ```

// Core result types
pub use crate::errors::{AppError, CacheError, CacheResult, Result};

// Cache tree
pub use crate::app::cache::{
    CacheFlags, CacheRoot, CacheStats, ClassCache, Expiry, ExpiryPolicy, FlagOverrides,
    ObjectCache,
};

// Configuration
pub use crate::config::AppConfig;

// Standard library re-exports that are commonly needed
pub use std::path::{Path, PathBuf};
pub use std::time::Duration;
