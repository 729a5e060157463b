//! Application constants for the ezaz cache
//!
//! Names in [`layout`] are part of the on-disk format and must not change
//! without migrating existing cache directories.

/// Environment variable names
pub mod env {
    /// Overrides the default cache root directory
    pub const CACHE_DIR: &str = "EZAZ_CACHE_DIR";
}

/// Directory and file naming used on disk
pub mod layout {
    /// Application directory under the user cache/config homes
    pub const APP_DIR: &str = "ezaz";

    /// Cache directory under the application directory
    pub const CACHE_DIR: &str = "cache";

    /// Config file name under `<config-dir>/ezaz`
    pub const CONFIG_FILE: &str = "cache.toml";

    /// Project-local config file name
    pub const LOCAL_CONFIG_FILE: &str = "ezaz-cache.toml";

    /// Separator between file name components
    pub const SEPARATOR: &str = "_";

    /// File prefix for single object entries
    pub const DETAIL_PREFIX: &str = "show";

    /// File prefix for object list entries
    pub const LIST_PREFIX: &str = "list";

    /// File prefix for identifier list entries
    pub const ID_LIST_PREFIX: &str = "id_list";

    /// Prefix of the directory holding an object's child caches
    pub const CHILD_DIR_PREFIX: &str = "cache";
}

/// Expiry keywords accepted in configuration
pub mod expiry {
    /// Never serve from disk
    pub const NOCACHE: &str = "nocache";

    /// Never expire
    pub const FOREVER: &str = "forever";

    /// Policy table applied to types without their own table
    pub const DEFAULT_TABLE: &str = "default";
}
