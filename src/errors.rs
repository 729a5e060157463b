//! Error types for the ezaz cache
//!
//! Cache failures are deliberately fine grained: the surrounding command layer
//! answers a miss, an expired entry, suppressed reads and a corrupt entry with a
//! live fetch, while invalid expiry configuration and path escapes are genuine
//! failures of the requested command.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Cache lookup and maintenance errors
#[derive(Error, Debug)]
pub enum CacheError {
    /// No memory or disk entry exists for the key
    #[error("Cache miss: {path}")]
    Miss { path: PathBuf },

    /// A disk entry exists but the expiry policy deems it stale
    #[error("Cache entry expired after {}s: {path}", .age.as_secs())]
    Expired { path: PathBuf, age: Duration },

    /// Cache reads are disabled for this node
    #[error("Cache reads are disabled: {path}")]
    ReadSuppressed { path: PathBuf },

    /// Entry content could not be (de)serialized in the expected format
    #[error("Invalid cache content at {path}: {reason}")]
    InvalidCache { path: PathBuf, reason: String },

    /// A user supplied expiry value could not be parsed
    #[error("Invalid cache expiry '{value}': {reason}")]
    InvalidExpiry { value: String, reason: String },

    /// A bulk operation resolved to a directory outside the cache root
    #[error("Refusing to operate on {path}: outside of cache root {root}")]
    PathEscape { path: PathBuf, root: PathBuf },

    /// Unexpected filesystem failure
    #[error("Cache I/O error at {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CacheError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the caller should perform a live fetch and write the result back
    pub fn needs_fetch(&self) -> bool {
        matches!(
            self,
            CacheError::Miss { .. }
                | CacheError::Expired { .. }
                | CacheError::ReadSuppressed { .. }
                | CacheError::InvalidCache { .. }
        )
    }

    /// Short name of the error kind for logging and diagnostics
    pub fn category(&self) -> &'static str {
        match self {
            CacheError::Miss { .. } => "miss",
            CacheError::Expired { .. } => "expired",
            CacheError::ReadSuppressed { .. } => "read-suppressed",
            CacheError::InvalidCache { .. } => "invalid-cache",
            CacheError::InvalidExpiry { .. } => "invalid-expiry",
            CacheError::PathEscape { .. } => "path-escape",
            CacheError::Io { .. } => "io",
        }
    }
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    /// Invalid configuration format
    #[error("Invalid configuration format in {path}: {source}")]
    InvalidFormat {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Invalid configuration value
    #[error("Invalid configuration value for {field}: {value}. {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    /// No usable directory could be derived for the given purpose
    #[error("Could not determine {purpose} directory")]
    NoDirectory { purpose: &'static str },
}

/// Top-level application error that can represent any error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Cache error
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Generic I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Generic application error with context
    #[error("Application error: {message}")]
    Generic { message: String },
}

impl AppError {
    /// Create a generic application error with a message
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    /// Check if the error is recoverable by fetching live data
    pub fn is_recoverable(&self) -> bool {
        match self {
            AppError::Cache(e) => e.needs_fetch(),
            _ => false,
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Cache(_) => "cache",
            AppError::Config(_) => "config",
            AppError::Io(_) => "io",
            AppError::Generic { .. } => "generic",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

/// Cache result type alias
pub type CacheResult<T> = std::result::Result<T, CacheError>;

/// Configuration result type alias
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
