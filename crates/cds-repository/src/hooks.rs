//! Hook bindings
//!
//! A hook binds a decision-support service id to the library it executes.
//! Hooks are loaded once from a directory of JSON files:
//!
//! ```json
//! {
//!   "id": "statin-use",
//!   "hook": "patient-view",
//!   "title": "Statin Use for the Primary Prevention of CVD",
//!   "prefetch": { "Patient": "Patient/{{context.patientId}}" },
//!   "_config": {
//!     "cql": {
//!       "library": { "id": "StatinUse", "version": "1.0.0" },
//!       "expressions": { "card": "Recommendation" }
//!     }
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{RepositoryError, RepositoryResult};
use crate::loader;

/// Reference from a hook to a library; no version means latest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryRef {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Execution binding of a hook
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionBinding {
    pub library: LibraryRef,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub expressions: Map<String, Value>,
}

/// Private hook configuration, never exposed through discovery
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HookConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cql: Option<ExecutionBinding>,
}

/// A decision-support service definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hook {
    pub id: String,
    pub hook: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefetch: Option<Map<String, Value>>,
    #[serde(rename = "_config", default, skip_serializing_if = "Option::is_none")]
    pub config: Option<HookConfig>,
}

impl Hook {
    /// Library this hook executes, if configured
    pub fn library(&self) -> Option<&LibraryRef> {
        self.binding().map(|binding| &binding.library)
    }

    pub fn binding(&self) -> Option<&ExecutionBinding> {
        self.config.as_ref()?.cql.as_ref()
    }

    /// Public view of the hook, without its private configuration
    pub fn discovery(&self) -> Hook {
        Hook {
            config: None,
            ..self.clone()
        }
    }
}

/// Hook bindings keyed by id
#[derive(Debug, Clone, Default)]
pub struct HookRepository {
    hooks: BTreeMap<String, Arc<Hook>>,
}

impl HookRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every hook under `path`.
    ///
    /// Fails on a missing root, an unreadable entry, or a file that is not a
    /// valid hook. A repeated id keeps the first definition.
    pub fn load(path: impl AsRef<Path>) -> RepositoryResult<Self> {
        let path = path.as_ref();
        let mut repo = Self::new();

        for parsed in loader::documents(path)? {
            let parsed = parsed?;
            let hook: Hook = serde_json::from_value(parsed.document).map_err(|source| {
                RepositoryError::Parse {
                    path: parsed.path.clone(),
                    source,
                }
            })?;

            let id = hook.id.clone();
            if !repo.add(hook) {
                warn!(
                    "Hook {} declared again in {}; keeping the first definition",
                    id,
                    parsed.path.display()
                );
            }
        }

        info!("✓ Loaded {} hooks from {}", repo.len(), path.display());
        Ok(repo)
    }

    /// Add a hook; returns `false` if its id was already taken
    pub fn add(&mut self, hook: Hook) -> bool {
        if self.hooks.contains_key(&hook.id) {
            return false;
        }
        self.hooks.insert(hook.id.clone(), Arc::new(hook));
        true
    }

    /// Every hook, ordered by id
    pub fn all(&self) -> Vec<Arc<Hook>> {
        self.hooks.values().cloned().collect()
    }

    pub fn find(&self, id: &str) -> RepositoryResult<Arc<Hook>> {
        self.hooks
            .get(id)
            .cloned()
            .ok_or_else(|| RepositoryError::HookNotFound { id: id.to_string() })
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}
