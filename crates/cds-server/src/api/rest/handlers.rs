//! API endpoint handlers
//!
//! HTTP request handlers for all REST API endpoints. Every handler that reads
//! libraries runs the lazy staleness check first.

use super::extractors::JsonExtractor;
use super::types::*;
use crate::error::ServerError;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use cds_repository::{Library, ReloadOutcome};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{error, info};

/// Health check endpoint (liveness only)
pub(super) async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Readiness probe: ready once at least one library and one hook are loaded
pub(super) async fn ready(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    let status = state.libraries.status();
    let hooks = state.hooks.len();
    let ready = status.libraries > 0 && hooks > 0;

    let code = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        code,
        Json(ReadyResponse {
            ready,
            libraries: status.libraries,
            hooks,
            loaded_at: status.last_load.map(DateTime::<Utc>::from),
        }),
    )
}

/// Service discovery endpoint
pub(super) async fn discovery(State(state): State<AppState>) -> Json<DiscoveryResponse> {
    let services = state.hooks.all().iter().map(|hook| hook.discovery()).collect();
    Json(DiscoveryResponse { services })
}

/// Hook execution endpoint
pub(super) async fn execute_hook(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonExtractor(payload): JsonExtractor<serde_json::Value>,
) -> Result<Json<serde_json::Value>, ServerError> {
    info!("Received request for hook {}", id);

    let hook = state.hooks.find(&id)?;
    let library_ref = hook
        .library()
        .ok_or_else(|| ServerError::InternalError(format!("Hook {} has no library binding", id)))?;

    refresh_libraries(&state).await;
    let library = state
        .libraries
        .resolve(&library_ref.id, library_ref.version.as_deref())?;

    let Some(engine) = state.engine.as_ref() else {
        return Err(ServerError::NotImplemented(format!(
            "No execution engine configured for hook {}",
            id
        )));
    };

    let response = engine.execute(&hook, &library, payload).await.map_err(|e| {
        error!("Hook {} failed on {}@{}: {}", id, library.id(), library.version(), e);
        ServerError::EngineError(e.to_string())
    })?;

    Ok(Json(response))
}

/// List every stored library
pub(super) async fn list_libraries(State(state): State<AppState>) -> Json<LibraryListResponse> {
    refresh_libraries(&state).await;

    let mut all = state.libraries.all();
    all.sort_by(|a, b| a.id().cmp(b.id()).then_with(|| a.version_key().cmp(b.version_key())));

    Json(LibraryListResponse {
        libraries: all.iter().map(|library| LibrarySummary::from(library.as_ref())).collect(),
    })
}

/// Latest version of a library
pub(super) async fn get_latest_library(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ServerError> {
    refresh_libraries(&state).await;
    let library = state.libraries.resolve_latest(&id)?;
    Ok(document(&library))
}

/// Exact version of a library
pub(super) async fn get_library(
    State(state): State<AppState>,
    Path((id, version)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, ServerError> {
    refresh_libraries(&state).await;
    let library = state.libraries.resolve(&id, Some(&version))?;
    Ok(document(&library))
}

/// Reload repository endpoint
pub(super) async fn reload_repository(
    State(state): State<AppState>,
) -> Result<Json<ReloadResponse>, ServerError> {
    info!("Received repository reload request");

    let libraries = Arc::clone(&state.libraries);
    let report = tokio::task::spawn_blocking(move || libraries.reload())
        .await
        .map_err(|e| ServerError::InternalError(format!("Reload task failed: {}", e)))?
        .map_err(|e| {
            error!("Failed to reload repository: {}", e);
            ServerError::InternalError(format!("Failed to reload repository: {}", e))
        })?;

    Ok(Json(ReloadResponse {
        success: true,
        message: "Repository reloaded successfully".to_string(),
        libraries: report.loaded,
    }))
}

fn document(library: &Library) -> Json<serde_json::Value> {
    Json(library.document().clone())
}

/// Run the lazy staleness check on a blocking thread
async fn refresh_libraries(state: &AppState) {
    let libraries = Arc::clone(&state.libraries);
    match tokio::task::spawn_blocking(move || libraries.check_and_reload_if_needed()).await {
        Ok(ReloadOutcome::Reloaded(report)) => {
            info!("Libraries refreshed before request: {} loaded", report.loaded)
        }
        Ok(_) => {}
        Err(e) => error!("Library staleness check did not complete: {}", e),
    }
}
