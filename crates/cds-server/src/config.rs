//! Server configuration

use cds_repository::RepositoryConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_libraries_path() -> PathBuf {
    PathBuf::from("config/libraries")
}

fn default_hooks_path() -> PathBuf {
    PathBuf::from("config/hooks")
}

fn default_reload_check_interval_ms() -> u64 {
    1000
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port (HTTP)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Root of the library tree (default: "config/libraries")
    #[serde(default = "default_libraries_path")]
    pub libraries_path: PathBuf,

    /// Directory of hook definitions (default: "config/hooks")
    #[serde(default = "default_hooks_path")]
    pub hooks_path: PathBuf,

    /// Minimum time between two library staleness scans
    #[serde(default = "default_reload_check_interval_ms")]
    pub reload_check_interval_ms: u64,

    /// Log level, used when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            libraries_path: default_libraries_path(),
            hooks_path: default_hooks_path(),
            reload_check_interval_ms: default_reload_check_interval_ms(),
            log_level: default_log_level(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables and config file
    pub fn load() -> anyhow::Result<Self> {
        // Load .env file if exists
        dotenvy::dotenv().ok();

        let config_result = config::Config::builder()
            .add_source(config::File::with_name("config/server").required(false))
            .add_source(config::Environment::with_prefix("CDS"))
            .build();

        match config_result {
            Ok(cfg) => cfg
                .try_deserialize()
                .map_err(|e| anyhow::anyhow!("Failed to deserialize config: {}", e)),
            Err(_) => {
                tracing::info!("No config file found, using default configuration");
                Ok(Self::default())
            }
        }
    }

    /// Library repository settings derived from this configuration
    pub fn repository_config(&self) -> RepositoryConfig {
        RepositoryConfig {
            root: self.libraries_path.clone(),
            check_interval_ms: self.reload_check_interval_ms,
        }
    }

    /// Socket address to bind
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
