//! In-memory library store
//!
//! Two-level index `id -> version -> library`. A store is built once per load
//! and then published behind an `Arc`; it is never mutated after publication.

use std::collections::HashMap;
use std::sync::Arc;

use crate::models::{AddOutcome, Library};
use crate::version::VersionKey;

/// Versioned library index
#[derive(Debug, Clone, Default)]
pub struct LibraryStore {
    libraries: HashMap<String, HashMap<VersionKey, Arc<Library>>>,
}

impl LibraryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a library under its `(id, version)` key.
    ///
    /// The first library stored for a key always wins. A later library for the
    /// same key is discarded; the outcome says whether its content matched.
    pub fn add(&mut self, library: Library) -> AddOutcome {
        let versions = self.libraries.entry(library.id().to_string()).or_default();

        match versions.get(library.version_key()) {
            Some(existing) if existing.content_eq(&library) => AddOutcome::Duplicate,
            Some(_) => AddOutcome::Conflict,
            None => {
                versions.insert(library.version_key().clone(), Arc::new(library));
                AddOutcome::Inserted
            }
        }
    }

    /// Every stored library, one per `(id, version)`, in no particular order
    pub fn all(&self) -> Vec<Arc<Library>> {
        self.libraries
            .values()
            .flat_map(|versions| versions.values().cloned())
            .collect()
    }

    /// Number of stored `(id, version)` pairs
    pub fn len(&self) -> usize {
        self.libraries.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Distinct library ids, sorted
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.libraries.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Stored versions of `id`, lowest to highest precedence
    pub fn versions(&self, id: &str) -> Vec<&VersionKey> {
        let mut versions: Vec<&VersionKey> = self
            .libraries
            .get(id)
            .map(|versions| versions.keys().collect())
            .unwrap_or_default();
        versions.sort();
        versions
    }

    /// Look up an exact version, or the latest when `version` is `None`
    pub fn resolve(&self, id: &str, version: Option<&str>) -> Option<Arc<Library>> {
        match version {
            Some(version) => self
                .libraries
                .get(id)?
                .get(&VersionKey::parse(version))
                .cloned(),
            None => self.resolve_latest(id),
        }
    }

    /// The version of `id` with the highest semantic-version precedence
    pub fn resolve_latest(&self, id: &str) -> Option<Arc<Library>> {
        self.libraries
            .get(id)?
            .iter()
            .max_by(|(a, _), (b, _)| a.cmp(b))
            .map(|(_, library)| Arc::clone(library))
    }
}
