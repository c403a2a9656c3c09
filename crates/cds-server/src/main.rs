//! Clinical decision-support gateway HTTP server
//!
//! Serves libraries and hook bindings over a REST API.

use anyhow::Result;
use cds_server::api::{create_router, AppState};
use cds_server::config::ServerConfig;
use cds_server::engine;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration before tracing so log_level can seed the filter
    let config = ServerConfig::load()?;

    init_tracing(&config)?;
    info!("Loaded configuration: {:?}", config);

    let (libraries, hooks) = engine::init_repositories(&config)?;
    info!(
        "Repositories initialized: {} libraries, {} hooks",
        libraries.snapshot().len(),
        hooks.len()
    );

    let app = create_router(AppState::new(libraries, hooks));

    let addr = config.bind_address();
    info!("Starting server on {}", addr);

    let listener = TcpListener::bind(&addr).await?;
    info!("✓ Server listening on http://{}", addr);
    info!("  Health check: http://{}/health", addr);
    info!("  Readiness: http://{}/ready", addr);
    info!("  Discovery: http://{}/cds-services", addr);
    info!("  Reload repository: POST http://{}/v1/repo/reload", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Initialize tracing subscriber
fn init_tracing(config: &ServerConfig) -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "cds_server={level},cds_repository={level},tower_http=debug",
                    level = config.log_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;

    Ok(())
}
