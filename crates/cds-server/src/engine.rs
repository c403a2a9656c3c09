//! Repository initialization and the execution-engine seam
//!
//! The gateway does not interpret libraries itself. Hook requests are handed
//! to an [`ExecutionEngine`] together with the resolved library; the engine is
//! supplied by whoever embeds the server.

use crate::config::ServerConfig;
use anyhow::Result;
use async_trait::async_trait;
use cds_repository::{Hook, HookRepository, Library, LibraryRepository};
use std::sync::Arc;
use tracing::{info, warn};

/// Evaluates a library for a hook request
#[async_trait]
pub trait ExecutionEngine: Send + Sync {
    /// Execute `library` for `hook` against the request payload.
    ///
    /// Returns the response body (typically `{"cards": [...]}`).
    async fn execute(
        &self,
        hook: &Hook,
        library: &Library,
        request: serde_json::Value,
    ) -> Result<serde_json::Value>;
}

/// Load libraries and hooks as configured.
///
/// Load failures are logged and leave the corresponding repository empty; the
/// readiness probe reports them. The library root stays registered so the
/// lazy staleness check can recover once the tree is fixed.
pub fn init_repositories(
    config: &ServerConfig,
) -> Result<(Arc<LibraryRepository>, Arc<HookRepository>)> {
    let (libraries, initial) = LibraryRepository::open(&config.repository_config())
        .map_err(|e| anyhow::anyhow!("Invalid library repository configuration: {}", e))?;

    match initial {
        Ok(report) => info!(
            "✓ Library repository initialized: {} libraries ({} files)",
            report.loaded, report.files
        ),
        Err(e) => warn!(
            "Library repository {:?} not loaded, will retry on change: {}",
            config.libraries_path, e
        ),
    }

    let hooks = match HookRepository::load(&config.hooks_path) {
        Ok(hooks) => hooks,
        Err(e) => {
            warn!("Hooks not loaded from {:?}: {}", config.hooks_path, e);
            HookRepository::new()
        }
    };

    Ok((Arc::new(libraries), Arc::new(hooks)))
}
