//! Integration tests for loading and hot-reloading a library tree

use cds_repository::{LibraryRepository, ReloadOutcome, RepositoryError};
use std::fs;
use std::path::Path;
use std::thread::sleep;
use std::time::Duration;
use tempfile::TempDir;

/// Longer than the coarse filesystem timestamp granularity
const SETTLE: Duration = Duration::from_millis(50);

fn write_library(root: &Path, relative: &str, id: &str, version: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(
        path,
        format!(r#"{{"identifier":{{"id":"{}","version":"{}"}}}}"#, id, version),
    )
    .unwrap();
}

/// `/a/lib-X-1.0.0.json` and `/b/lib-X-2.0.0.json`
fn create_test_tree() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    write_library(temp_dir.path(), "a/lib-X-1.0.0.json", "X", "1.0.0");
    write_library(temp_dir.path(), "b/lib-X-2.0.0.json", "X", "2.0.0");
    temp_dir
}

fn immediate_repo() -> LibraryRepository {
    LibraryRepository::with_check_interval(Duration::ZERO)
}

#[test]
fn test_load_and_resolve() {
    let temp = create_test_tree();
    let repo = LibraryRepository::new();

    let report = repo.load(temp.path()).expect("Failed to load libraries");

    assert_eq!(report.files, 2);
    assert_eq!(report.loaded, 2);
    assert_eq!(repo.all().len(), 2);
    assert_eq!(repo.resolve_latest("X").unwrap().identifier().version, "2.0.0");
    assert_eq!(repo.resolve("X", Some("1.0.0")).unwrap().identifier().version, "1.0.0");
    assert!(repo.resolve("X", Some("9.9.9")).is_err());
}

#[test]
fn test_resolve_miss_is_distinct_from_empty_body() {
    let temp = TempDir::new().unwrap();
    write_library(temp.path(), "empty.json", "Empty", "1.0.0");
    let repo = LibraryRepository::new();
    repo.load(temp.path()).unwrap();

    let found = repo.resolve("Empty", None).unwrap();
    assert_eq!(found.document().as_object().unwrap().len(), 1);

    let missing = repo.resolve("Unknown", None).unwrap_err();
    assert!(matches!(missing, RepositoryError::LibraryNotFound { .. }));
}

#[test]
fn test_non_matching_extensions_are_skipped() {
    let temp = create_test_tree();
    fs::write(temp.path().join("a/README.md"), "# libraries").unwrap();
    fs::write(temp.path().join("a/lib-Y-1.0.0.json.bak"), "not json at all").unwrap();
    fs::write(temp.path().join("b/notes.txt"), "{").unwrap();

    let repo = LibraryRepository::new();
    let report = repo.load(temp.path()).unwrap();

    assert_eq!(report.loaded, 2);
    assert!(repo.all().iter().all(|lib| lib.id() == "X"));
}

#[test]
fn test_files_without_identifier_are_unindexed() {
    let temp = create_test_tree();
    fs::write(temp.path().join("a/other.json"), r#"{"name":"not a library"}"#).unwrap();

    let repo = LibraryRepository::new();
    let report = repo.load(temp.path()).unwrap();

    assert_eq!(report.files, 3);
    assert_eq!(report.loaded, 2);
    assert_eq!(report.unindexed.len(), 1);
    assert!(report.unindexed[0].ends_with("a/other.json"));
}

#[test]
fn test_conflicting_duplicate_is_reported_once() {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join("one.json"),
        r#"{"identifier":{"id":"X","version":"1.0.0"},"body":1}"#,
    )
    .unwrap();
    fs::write(
        temp.path().join("two.json"),
        r#"{"identifier":{"id":"X","version":"1.0.0"},"body":2}"#,
    )
    .unwrap();

    let repo = LibraryRepository::new();
    let report = repo.load(temp.path()).unwrap();

    assert_eq!(report.loaded, 1);
    assert_eq!(report.conflicts.len(), 1);
    assert_eq!(repo.all().len(), 1);

    // Whichever file the walk visited first is the one kept
    let conflict = &report.conflicts[0];
    let kept = repo.resolve("X", Some("1.0.0")).unwrap();
    assert_eq!(kept.source(), conflict.kept.as_deref());
    assert_ne!(conflict.kept, conflict.discarded);
}

#[test]
fn test_identical_duplicate_is_not_a_conflict() {
    let temp = TempDir::new().unwrap();
    write_library(temp.path(), "one.json", "X", "1.0.0");
    write_library(temp.path(), "copy/one.json", "X", "1.0.0");

    let repo = LibraryRepository::new();
    let report = repo.load(temp.path()).unwrap();

    assert_eq!(report.loaded, 1);
    assert_eq!(report.duplicates, 1);
    assert!(report.conflicts.is_empty());
}

#[test]
fn test_load_missing_root() {
    let temp = TempDir::new().unwrap();
    let repo = LibraryRepository::new();

    let result = repo.load(temp.path().join("missing"));

    assert!(matches!(result, Err(RepositoryError::InvalidPath { .. })));
    assert!(repo.all().is_empty());
    assert!(repo.status().root.is_some());
}

#[test]
fn test_load_file_as_root() {
    let temp = create_test_tree();
    let repo = LibraryRepository::new();

    let result = repo.load(temp.path().join("a/lib-X-1.0.0.json"));

    assert!(matches!(result, Err(RepositoryError::InvalidPath { .. })));
    assert!(repo.all().is_empty());
}

#[test]
fn test_malformed_file_fails_load() {
    let temp = create_test_tree();
    fs::write(temp.path().join("a/broken.json"), "{ not json").unwrap();

    let repo = LibraryRepository::new();
    let result = repo.load(temp.path());

    assert!(matches!(result, Err(RepositoryError::Parse { .. })));
    assert!(repo.all().is_empty());
}

#[test]
fn test_load_is_idempotent() {
    let temp = create_test_tree();
    let repo = LibraryRepository::new();

    repo.load(temp.path()).unwrap();
    repo.load(temp.path()).unwrap();

    assert_eq!(repo.all().len(), 2);
}

#[test]
fn test_reset_discards_libraries() {
    let temp = create_test_tree();
    let repo = LibraryRepository::new();
    repo.load(temp.path()).unwrap();

    let before = repo.snapshot();
    repo.reset();

    assert!(repo.all().is_empty());
    assert_eq!(before.len(), 2);
}

#[test]
fn test_fresh_tree_is_not_reloaded() {
    let temp = create_test_tree();
    let repo = immediate_repo();
    repo.load(temp.path()).unwrap();

    assert!(matches!(
        repo.check_and_reload_if_needed(),
        ReloadOutcome::Fresh
    ));
}

#[test]
fn test_check_is_throttled() {
    let temp = create_test_tree();
    let repo = LibraryRepository::with_check_interval(Duration::from_secs(60));
    repo.load(temp.path()).unwrap();

    assert!(matches!(
        repo.check_and_reload_if_needed(),
        ReloadOutcome::Fresh
    ));

    sleep(SETTLE);
    write_library(temp.path(), "c/lib-X-3.0.0.json", "X", "3.0.0");

    // Second call inside the interval does not scan, so misses the change
    assert!(matches!(
        repo.check_and_reload_if_needed(),
        ReloadOutcome::Throttled
    ));
    assert_eq!(repo.resolve_latest("X").unwrap().version(), "2.0.0");
}

#[test]
fn test_reload_picks_up_new_file() {
    let temp = create_test_tree();
    let repo = immediate_repo();
    repo.load(temp.path()).unwrap();

    sleep(SETTLE);
    write_library(temp.path(), "c/lib-X-3.0.0.json", "X", "3.0.0");

    match repo.check_and_reload_if_needed() {
        ReloadOutcome::Reloaded(report) => assert_eq!(report.loaded, 3),
        other => panic!("Expected reload, got {:?}", other),
    }
    assert_eq!(repo.resolve_latest("X").unwrap().version(), "3.0.0");
}

#[test]
fn test_edit_right_after_reload_is_picked_up() {
    let temp = create_test_tree();
    let repo = immediate_repo();
    sleep(SETTLE);
    repo.load(temp.path()).unwrap();

    // Rewritten within the same clock tick the load finished in
    repo.reload().unwrap();
    write_library(temp.path(), "a/lib-X-1.0.0.json", "W", "1.0.0");

    assert!(matches!(
        repo.check_and_reload_if_needed(),
        ReloadOutcome::Reloaded(_)
    ));
    assert!(repo.resolve("W", Some("1.0.0")).is_ok());
    assert!(repo.resolve("X", Some("1.0.0")).is_err());
}

#[test]
fn test_reload_reflects_only_new_tree() {
    let temp = create_test_tree();
    let repo = immediate_repo();
    repo.load(temp.path()).unwrap();

    sleep(SETTLE);
    fs::remove_dir_all(temp.path().join("b")).unwrap();
    write_library(temp.path(), "a/lib-Y-1.0.0.json", "Y", "1.0.0");

    assert!(matches!(
        repo.check_and_reload_if_needed(),
        ReloadOutcome::Reloaded(_)
    ));

    let mut ids: Vec<String> = repo
        .all()
        .iter()
        .map(|lib| format!("{}@{}", lib.id(), lib.version()))
        .collect();
    ids.sort();
    assert_eq!(ids, vec!["X@1.0.0", "Y@1.0.0"]);
}

#[test]
fn test_deletion_triggers_reload() {
    let temp = create_test_tree();
    let repo = immediate_repo();
    repo.load(temp.path()).unwrap();

    sleep(SETTLE);
    fs::remove_file(temp.path().join("b/lib-X-2.0.0.json")).unwrap();

    assert!(matches!(
        repo.check_and_reload_if_needed(),
        ReloadOutcome::Reloaded(_)
    ));
    assert_eq!(repo.resolve_latest("X").unwrap().version(), "1.0.0");
}

#[test]
fn test_failed_reload_keeps_previous_store() {
    let temp = create_test_tree();
    let repo = immediate_repo();
    repo.load(temp.path()).unwrap();
    let before = repo.snapshot();

    sleep(SETTLE);
    fs::write(temp.path().join("a/broken.json"), "{ not json").unwrap();

    assert!(matches!(
        repo.check_and_reload_if_needed(),
        ReloadOutcome::Failed(RepositoryError::Parse { .. })
    ));
    assert_eq!(repo.all().len(), 2);
    assert!(std::sync::Arc::ptr_eq(&before, &repo.snapshot()));

    // Not retried until the tree changes again
    assert!(matches!(
        repo.check_and_reload_if_needed(),
        ReloadOutcome::Fresh
    ));

    sleep(SETTLE);
    fs::remove_file(temp.path().join("a/broken.json")).unwrap();
    write_library(temp.path(), "c/lib-Z-1.0.0.json", "Z", "1.0.0");

    assert!(matches!(
        repo.check_and_reload_if_needed(),
        ReloadOutcome::Reloaded(_)
    ));
    assert!(repo.resolve_latest("Z").is_ok());
}

#[test]
fn test_scan_failure_keeps_previous_store() {
    let temp = create_test_tree();
    let repo = immediate_repo();
    repo.load(temp.path()).unwrap();

    fs::remove_dir_all(temp.path()).unwrap();

    assert!(matches!(
        repo.check_and_reload_if_needed(),
        ReloadOutcome::ScanFailed(_)
    ));
    assert_eq!(repo.all().len(), 2);
}

#[test]
fn test_root_created_after_failed_initial_load() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("libraries");
    let repo = immediate_repo();

    assert!(repo.load(&root).is_err());
    assert!(matches!(
        repo.check_and_reload_if_needed(),
        ReloadOutcome::ScanFailed(_)
    ));

    sleep(SETTLE);
    write_library(&root, "lib-X-1.0.0.json", "X", "1.0.0");

    assert!(matches!(
        repo.check_and_reload_if_needed(),
        ReloadOutcome::Reloaded(_)
    ));
    assert_eq!(repo.all().len(), 1);
}

#[test]
fn test_snapshot_survives_reload() {
    let temp = create_test_tree();
    let repo = immediate_repo();
    repo.load(temp.path()).unwrap();
    let old = repo.snapshot();

    sleep(SETTLE);
    write_library(temp.path(), "c/lib-X-3.0.0.json", "X", "3.0.0");
    repo.check_and_reload_if_needed();

    assert_eq!(old.len(), 2);
    assert_eq!(repo.snapshot().len(), 3);
}

#[test]
fn test_concurrent_readers_during_reload() {
    let temp = create_test_tree();
    let repo = std::sync::Arc::new(immediate_repo());
    repo.load(temp.path()).unwrap();

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let repo = std::sync::Arc::clone(&repo);
            std::thread::spawn(move || {
                for _ in 0..200 {
                    let count = repo.all().len();
                    assert!(count == 2 || count == 3, "partial store observed: {}", count);
                }
            })
        })
        .collect();

    sleep(SETTLE);
    write_library(temp.path(), "c/lib-X-3.0.0.json", "X", "3.0.0");
    for _ in 0..5 {
        repo.reload().unwrap();
    }

    for reader in readers {
        reader.join().unwrap();
    }
    assert_eq!(repo.all().len(), 3);
}

#[test]
fn test_status_reports_load() {
    let temp = create_test_tree();
    let repo = LibraryRepository::new();
    assert!(repo.status().last_load.is_none());

    repo.load(temp.path()).unwrap();
    let status = repo.status();

    assert_eq!(status.libraries, 2);
    assert!(status.last_load.is_some());
    assert!(status.root.unwrap().is_absolute());
}
