//! Repository configuration types

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

fn default_check_interval_ms() -> u64 {
    1000
}

/// Library repository configuration
///
/// # Examples
///
/// ```rust
/// use cds_repository::RepositoryConfig;
/// use std::time::Duration;
///
/// let config = RepositoryConfig::file_system("config/libraries")
///     .with_check_interval(Duration::from_millis(250));
///
/// assert!(config.validate().is_ok());
/// assert_eq!(config.check_interval(), Duration::from_millis(250));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryConfig {
    /// Root directory of the library tree
    pub root: PathBuf,

    /// Minimum time between two staleness scans, in milliseconds
    #[serde(default = "default_check_interval_ms")]
    pub check_interval_ms: u64,
}

impl RepositoryConfig {
    /// Configuration for a library tree rooted at `path`
    pub fn file_system(path: impl Into<PathBuf>) -> Self {
        Self {
            root: path.into(),
            check_interval_ms: default_check_interval_ms(),
        }
    }

    /// Set the staleness check interval
    pub fn with_check_interval(mut self, interval: Duration) -> Self {
        self.check_interval_ms = interval.as_millis().try_into().unwrap_or(u64::MAX);
        self
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_millis(self.check_interval_ms)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.root.as_os_str().is_empty() {
            return Err(ConfigError::MissingField {
                field: "root".to_string(),
            });
        }
        Ok(())
    }
}

/// Configuration error
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// A required field is missing or empty
    MissingField { field: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::MissingField { field } => {
                write!(f, "repository configuration requires {} to be set", field)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
