//! Directory loader
//!
//! Walks a directory tree, parses every `.json` file it finds and builds a
//! fresh [`LibraryStore`] from the results. Nothing here touches a published
//! store: the caller decides what to do with the store it gets back.

use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{RepositoryError, RepositoryResult};
use crate::models::{AddOutcome, Library, LibraryConflict, LoadReport};
use crate::store::LibraryStore;

/// File extension of recognised documents
pub const DOCUMENT_EXTENSION: &str = "json";

/// A recognised file and its parsed JSON content
#[derive(Debug, Clone)]
pub struct ParsedFile {
    pub path: PathBuf,
    pub document: Value,
}

/// Whether a path names a document file
pub fn is_document_file(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()) == Some(DOCUMENT_EXTENSION)
}

/// Lazily walk `root`, yielding one parsed JSON document per recognised file.
///
/// Fails up front if `root` is missing or not a directory. Items fail on
/// unreadable entries and malformed JSON; everything else is skipped.
pub fn documents(
    root: &Path,
) -> RepositoryResult<impl Iterator<Item = RepositoryResult<ParsedFile>>> {
    if !root.is_dir() {
        return Err(RepositoryError::InvalidPath {
            path: root.to_path_buf(),
        });
    }

    let root = root.to_path_buf();
    let walker = WalkDir::new(&root).follow_links(true).into_iter();

    Ok(walker.filter_map(move |entry| match entry {
        Ok(entry) if entry.file_type().is_file() && is_document_file(entry.path()) => {
            Some(parse_file(entry.path()))
        }
        Ok(_) => None,
        Err(err) => Some(Err(walk_error(&root, err))),
    }))
}

/// Read and parse one JSON file
pub fn parse_file(path: &Path) -> RepositoryResult<ParsedFile> {
    let bytes = fs::read(path).map_err(|source| RepositoryError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let document = serde_json::from_slice(&bytes).map_err(|source| RepositoryError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(ParsedFile {
        path: path.to_path_buf(),
        document,
    })
}

/// Build a new store from every library under `root`.
///
/// Stops at the first unreadable or malformed file. Files without an
/// identifier are recorded in the report and left out of the store.
pub fn load_store(root: &Path) -> RepositoryResult<(LibraryStore, LoadReport)> {
    let mut store = LibraryStore::new();
    let mut report = LoadReport::default();

    for parsed in documents(root)? {
        let ParsedFile { path, document } = parsed?;
        report.files += 1;

        let Some(library) = Library::from_document(document) else {
            debug!("Skipping {}: no identifier.id / identifier.version", path.display());
            report.unindexed.push(path);
            continue;
        };

        let identifier = library.identifier().clone();
        match store.add(library.with_source(path.clone())) {
            AddOutcome::Inserted => report.loaded += 1,
            AddOutcome::Duplicate => report.duplicates += 1,
            AddOutcome::Conflict => {
                let kept = store
                    .resolve(&identifier.id, Some(&identifier.version))
                    .and_then(|kept| kept.source().map(Path::to_path_buf));
                report.conflicts.push(LibraryConflict {
                    identifier,
                    discarded: Some(path),
                    kept,
                });
            }
        }
    }

    Ok((store, report))
}

/// Most recent modification time in the tree.
///
/// Considers every recognised file and every directory (a directory's mtime
/// moves when entries are added, removed or renamed). Returns `None` for a
/// tree with nothing to consider.
pub fn latest_modification(root: &Path) -> RepositoryResult<Option<SystemTime>> {
    let mut latest = None;

    for entry in WalkDir::new(root).follow_links(true) {
        let entry = entry.map_err(|err| walk_error(root, err))?;
        if !entry.file_type().is_dir() && !is_document_file(entry.path()) {
            continue;
        }

        let modified = entry
            .metadata()
            .map_err(|err| walk_error(root, err))?
            .modified()?;
        latest = latest.max(Some(modified));
    }

    Ok(latest)
}

fn walk_error(root: &Path, err: walkdir::Error) -> RepositoryError {
    RepositoryError::Walk {
        path: err.path().unwrap_or(root).to_path_buf(),
        source: err,
    }
}
