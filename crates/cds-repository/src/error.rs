//! Error types for the library repository

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Errors that can occur while loading or querying libraries and hooks
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// Root path is missing or is not a directory
    #[error("Invalid path: {path}")]
    InvalidPath { path: PathBuf },

    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A file could not be read
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Directory traversal failed
    #[error("Failed to walk {path}: {source}")]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },

    /// A file held malformed JSON, or JSON of the wrong shape
    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// No library stored under the requested id and version
    #[error("Library not found: {id}@{}", .version.as_deref().unwrap_or("latest"))]
    LibraryNotFound { id: String, version: Option<String> },

    /// No hook registered under the requested id
    #[error("Hook not found: {id}")]
    HookNotFound { id: String },

    /// Reload requested before any root path was registered
    #[error("No library root registered")]
    NotRegistered,

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error
    #[error("Repository error: {0}")]
    Other(String),
}

impl RepositoryError {
    /// Whether this error means "absent" rather than "broken"
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            RepositoryError::LibraryNotFound { .. } | RepositoryError::HookNotFound { .. }
        )
    }
}
