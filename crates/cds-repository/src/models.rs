//! Data models for the library repository

use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::version::VersionKey;

/// The `(id, version)` pair a library is indexed under.
///
/// `version` is the normalised form, see [`VersionKey`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct LibraryIdentifier {
    pub id: String,
    pub version: String,
}

/// One versioned rule-definition document
///
/// The JSON document is immutable once parsed. Its body is opaque to the
/// repository and is handed as-is to the execution engine.
#[derive(Debug, Clone)]
pub struct Library {
    identifier: LibraryIdentifier,
    version_key: VersionKey,
    document: Value,
    source: Option<PathBuf>,
}

impl Library {
    /// Build a library from a parsed JSON document
    ///
    /// The identifier is read from `identifier.{id,version}`, or from
    /// `library.identifier.{id,version}` for enveloped documents. Returns
    /// `None` when either field is missing or not a string.
    pub fn from_document(document: Value) -> Option<Self> {
        let (id, raw_version) = identifier_fields(&document)?;
        let version_key = VersionKey::parse(raw_version);
        let identifier = LibraryIdentifier {
            id: id.to_string(),
            version: version_key.to_string(),
        };

        Some(Self {
            identifier,
            version_key,
            document,
            source: None,
        })
    }

    /// Record the file this library was loaded from
    pub fn with_source(mut self, path: impl Into<PathBuf>) -> Self {
        self.source = Some(path.into());
        self
    }

    pub fn identifier(&self) -> &LibraryIdentifier {
        &self.identifier
    }

    pub fn id(&self) -> &str {
        &self.identifier.id
    }

    /// Normalised version string
    pub fn version(&self) -> &str {
        &self.identifier.version
    }

    pub fn version_key(&self) -> &VersionKey {
        &self.version_key
    }

    /// The full JSON document, exactly as parsed
    pub fn document(&self) -> &Value {
        &self.document
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Deep value equality of the parsed documents
    pub fn content_eq(&self, other: &Library) -> bool {
        self.document == other.document
    }
}

fn identifier_fields(document: &Value) -> Option<(&str, &str)> {
    let identifier = document
        .get("identifier")
        .or_else(|| document.get("library")?.get("identifier"))?;

    let id = identifier.get("id")?.as_str()?;
    let version = identifier.get("version")?.as_str()?;
    Some((id, version))
}

/// Result of adding one library to a store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// New `(id, version)` key
    Inserted,
    /// Key already present with identical content
    Duplicate,
    /// Key already present with different content; the stored library was kept
    Conflict,
}

/// An ingestion conflict: a second document for a key with different content
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LibraryConflict {
    pub identifier: LibraryIdentifier,
    /// File whose document was discarded
    pub discarded: Option<PathBuf>,
    /// File whose document was kept
    pub kept: Option<PathBuf>,
}

/// Summary of one load of a directory tree
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadReport {
    /// Recognised files parsed
    pub files: usize,
    /// Distinct libraries stored
    pub loaded: usize,
    /// Identical re-declarations of a stored library
    pub duplicates: usize,
    /// Files that parsed but carried no identifier
    pub unindexed: Vec<PathBuf>,
    pub conflicts: Vec<LibraryConflict>,
}
