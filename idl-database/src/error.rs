//! Database error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or caching the database
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("database source {path:?} does not exist or is not a directory")]
    MissingSource { path: PathBuf },

    #[error("I/O error for {path:?}: {error}")]
    Io { path: PathBuf, error: std::io::Error },

    #[error("malformed interface file {path:?}: {error}")]
    Malformed { path: PathBuf, error: serde_json::Error },

    #[error("interface {name} is defined more than once (again in {path:?})")]
    DuplicateInterface { name: String, path: PathBuf },

    #[error("no database cache at {path:?}")]
    CacheMissing { path: PathBuf },

    #[error("database cache {path:?} is stale: {reason}")]
    StaleCache { path: PathBuf, reason: String },

    #[error("failed to serialize database cache {path:?}: {error}")]
    Serialize { path: PathBuf, error: serde_json::Error },
}

impl LoadError {
    pub fn io(path: impl Into<PathBuf>, error: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            error,
        }
    }

    pub fn stale(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::StaleCache {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Errors raised by the rename pass or while building a rename map
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenameError {
    #[error("type {type_name} referenced by {interface} has no entry in the rename map")]
    Unmapped { type_name: String, interface: String },

    #[error("invalid rename entry {from} -> {to}: {reason}")]
    InvalidMap {
        from: String,
        to: String,
        reason: String,
    },
}

impl RenameError {
    pub fn invalid_map(from: &str, to: &str, reason: impl Into<String>) -> Self {
        Self::InvalidMap {
            from: from.to_string(),
            to: to.to_string(),
            reason: reason.into(),
        }
    }
}
