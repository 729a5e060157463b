//! Configuration management for the ezaz cache
//!
//! Settings come from a TOML file (optional), the environment and the command
//! line. The library never reads the environment itself: the binary resolves
//! the cache root once and hands it to [`CacheRoot`].

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::app::cache::{CacheFlags, CacheRoot, ExpiryPolicy};
use crate::constants::expiry::DEFAULT_TABLE;
use crate::constants::layout::{APP_DIR, CONFIG_FILE, LOCAL_CONFIG_FILE};
use crate::errors::{ConfigError, ConfigResult};

/// Unified application configuration for TOML serialization
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Cache settings
    pub cache: CacheConfigToml,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// TOML-friendly cache configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CacheConfigToml {
    /// Cache directory path
    pub cache_root: Option<PathBuf>,
    /// Log cache activity at info level
    pub verbose: bool,
    /// Never mutate the cache on disk
    pub dry_run: bool,
    /// Never serve entries from disk
    pub no_cache_read: bool,
    /// Never write entries to disk
    pub no_cache_write: bool,
    /// Expiry policies by resource type; `default` applies to the rest
    pub expiry: BTreeMap<String, ExpiryPolicy>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default log level when no verbosity flag is given
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl CacheConfigToml {
    /// Global flags for a cache tree
    pub fn flags(&self) -> CacheFlags {
        CacheFlags {
            verbose: self.verbose,
            dry_run: self.dry_run,
            no_cache_read: self.no_cache_read,
            no_cache_write: self.no_cache_write,
        }
    }

    /// Policy for `resource_type`, falling back to the `default` table
    pub fn policy_for(&self, resource_type: &str) -> ExpiryPolicy {
        self.expiry
            .get(resource_type)
            .or_else(|| self.expiry.get(DEFAULT_TABLE))
            .copied()
            .unwrap_or_default()
    }

    /// Resolve the cache root with precedence: command line, environment,
    /// config file, then `<cache-home>/ezaz/cache`
    pub fn resolve_root(
        &self,
        cli_override: Option<&Path>,
        env_override: Option<PathBuf>,
    ) -> ConfigResult<PathBuf> {
        if let Some(path) = cli_override {
            return Ok(path.to_path_buf());
        }
        if let Some(path) = env_override.filter(|p| !p.as_os_str().is_empty()) {
            return Ok(path);
        }
        if let Some(path) = &self.cache_root {
            return Ok(path.clone());
        }
        let cache_home = dirs::cache_dir().ok_or(ConfigError::NoDirectory {
            purpose: "user cache",
        })?;
        Ok(CacheRoot::default_root(&cache_home))
    }
}

impl AppConfig {
    /// Load configuration from an explicit file or the standard locations
    ///
    /// A missing file in the standard locations yields the defaults; a missing
    /// explicit file is an error.
    pub fn load(config_file_override: Option<&Path>) -> ConfigResult<Self> {
        if let Some(path) = config_file_override {
            if !path.exists() {
                return Err(ConfigError::NotFound {
                    path: path.to_path_buf(),
                });
            }
            return Self::load_from_file(path);
        }

        match Self::find_config_file() {
            Some(path) => Self::load_from_file(&path),
            None => {
                debug!("No config file found in standard locations");
                Ok(Self::default())
            }
        }
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let mut search_paths = vec![PathBuf::from(format!("./{}", LOCAL_CONFIG_FILE))];
        if let Ok(path) = Self::get_default_config_path() {
            search_paths.push(path);
        }

        search_paths.into_iter().find(|path| {
            let found = path.exists();
            if found {
                debug!("Found config file: {}", path.display());
            }
            found
        })
    }

    /// Get the default config file path for the current user
    pub fn get_default_config_path() -> ConfigResult<PathBuf> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoDirectory {
            purpose: "user config",
        })?;
        Ok(config_dir.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Load configuration from a TOML file
    ///
    /// Expiry values are validated here, so a bad duration fails at load time
    /// rather than when the cache is read.
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::InvalidValue {
            field: "config file".to_string(),
            value: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let config: AppConfig =
            toml::from_str(&content).map_err(|source| ConfigError::InvalidFormat {
                path: path.to_path_buf(),
                source,
            })?;

        info!("Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Generate default configuration content with helpful comments
    pub fn generate_default_config_content() -> String {
        let default_cache_path = dirs::cache_dir()
            .map(|dir| CacheRoot::default_root(&dir))
            .unwrap_or_else(|| PathBuf::from("./cache"));

        format!(
            r#"# ezaz cache configuration
# Place this file at ./{local} or in the user config directory.

[cache]
# Cache directory (leave unset to use {default})
# cache_root = "/path/to/custom/cache"

# Log every cache hit, miss and write
verbose = false

# Keep caching in memory but never change files on disk
dry_run = false

# Ignore cached entries on disk (always fetch live)
no_cache_read = false

# Never write entries to disk
no_cache_write = false

# Expiry per resource type. Each of `detail` and `list` accepts
# "nocache", "forever" or a number of seconds. Unset means "nocache".
[cache.expiry.{table}]
detail = 300
list = 300

# [cache.expiry.location]
# list = "forever"

[logging]
level = "warn"  # error, warn, info, debug, trace
"#,
            local = LOCAL_CONFIG_FILE,
            default = default_cache_path.display(),
            table = DEFAULT_TABLE,
        )
    }
}
