//! REST API type definitions
//!
//! Request and response types for the REST API endpoints.

use crate::engine::ExecutionEngine;
use cds_repository::{Hook, HookRepository, Library, LibraryRepository};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub libraries: Arc<LibraryRepository>,
    pub hooks: Arc<HookRepository>,
    pub engine: Option<Arc<dyn ExecutionEngine>>,
}

impl AppState {
    pub fn new(libraries: Arc<LibraryRepository>, hooks: Arc<HookRepository>) -> Self {
        Self {
            libraries,
            hooks,
            engine: None,
        }
    }

    /// Attach the engine that executes hook requests
    pub fn with_engine(mut self, engine: Arc<dyn ExecutionEngine>) -> Self {
        self.engine = Some(engine);
        self
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Readiness probe response
#[derive(Debug, Serialize)]
pub struct ReadyResponse {
    pub ready: bool,
    pub libraries: usize,
    pub hooks: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loaded_at: Option<DateTime<Utc>>,
}

/// Service discovery response
#[derive(Debug, Serialize)]
pub struct DiscoveryResponse {
    pub services: Vec<Hook>,
}

/// One entry of the library listing
#[derive(Debug, Serialize)]
pub struct LibrarySummary {
    pub id: String,
    pub version: String,
}

impl From<&Library> for LibrarySummary {
    fn from(library: &Library) -> Self {
        Self {
            id: library.id().to_string(),
            version: library.version().to_string(),
        }
    }
}

/// Library listing response
#[derive(Debug, Serialize)]
pub struct LibraryListResponse {
    pub libraries: Vec<LibrarySummary>,
}

/// Reload repository endpoint response
#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    pub success: bool,
    pub message: String,
    pub libraries: usize,
}
