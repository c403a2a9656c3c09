//! Library repository handle with lazy hot-reload
//!
//! [`LibraryRepository`] owns the currently published [`LibraryStore`] and the
//! bookkeeping for staleness checks. Readers take an `Arc` snapshot of the
//! store and never observe a partially built one: every load builds a new
//! store off to the side and swaps it in under a write lock.
//!
//! Staleness is checked lazily. Request handlers call
//! [`check_and_reload_if_needed`](LibraryRepository::check_and_reload_if_needed)
//! as often as they like; the filesystem is scanned at most once per check
//! interval.

use path_absolutize::Absolutize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, TryLockError};
use std::time::{Duration, Instant, SystemTime};
use tracing::{debug, info, warn};

use crate::config::RepositoryConfig;
use crate::error::{RepositoryError, RepositoryResult};
use crate::loader;
use crate::models::{Library, LoadReport};
use crate::store::LibraryStore;

/// Default minimum time between two filesystem scans
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(1);

/// What a call to `check_and_reload_if_needed` did
#[derive(Debug)]
pub enum ReloadOutcome {
    /// No root path registered yet
    Unregistered,
    /// Last scan was less than one check interval ago
    Throttled,
    /// Another reload is running
    InProgress,
    /// Tree unchanged since the last load
    Fresh,
    /// Tree changed and a new store was published
    Reloaded(LoadReport),
    /// The tree could not be scanned; the previous store stays live
    ScanFailed(RepositoryError),
    /// The rebuild failed; the previous store stays live
    Failed(RepositoryError),
}

/// Point-in-time view of the repository bookkeeping
#[derive(Debug, Clone)]
pub struct RepositoryStatus {
    pub root: Option<PathBuf>,
    pub libraries: usize,
    /// Start of the last successful load
    pub last_load: Option<SystemTime>,
}

#[derive(Debug, Default)]
struct MonitorState {
    root: Option<PathBuf>,
    /// Start of the last successful load
    last_load: Option<SystemTime>,
    /// Tree modification time scanned before the last load attempt,
    /// successful or not. `None` when that scan failed.
    baseline: Option<SystemTime>,
    last_check: Option<Instant>,
}

/// Process-wide library repository
pub struct LibraryRepository {
    current: RwLock<Arc<LibraryStore>>,
    monitor: Mutex<MonitorState>,
    reloading: Mutex<()>,
    check_interval: Duration,
}

impl Default for LibraryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl LibraryRepository {
    /// Create an empty repository with the default check interval
    pub fn new() -> Self {
        Self::with_check_interval(DEFAULT_CHECK_INTERVAL)
    }

    /// Create an empty repository with a custom check interval
    pub fn with_check_interval(check_interval: Duration) -> Self {
        Self {
            current: RwLock::new(Arc::new(LibraryStore::new())),
            monitor: Mutex::new(MonitorState::default()),
            reloading: Mutex::new(()),
            check_interval,
        }
    }

    /// Create a repository from configuration and load its root.
    ///
    /// A failed initial load is returned alongside the repository: the root
    /// stays registered so a later check can pick the tree up once it is fixed.
    pub fn open(
        config: &RepositoryConfig,
    ) -> RepositoryResult<(Self, RepositoryResult<LoadReport>)> {
        config
            .validate()
            .map_err(|e| RepositoryError::Config(e.to_string()))?;

        let repo = Self::with_check_interval(config.check_interval());
        let initial = repo.load(&config.root);
        Ok((repo, initial))
    }

    pub fn check_interval(&self) -> Duration {
        self.check_interval
    }

    /// Register `path` as the library root and load it.
    ///
    /// On success the new store replaces the current one. On failure (missing
    /// root, unreadable entry, malformed file) the current store is left
    /// untouched. Either way the root stays registered for staleness checks.
    pub fn load(&self, path: impl AsRef<Path>) -> RepositoryResult<LoadReport> {
        let root = path
            .as_ref()
            .absolutize()
            .map_err(|e| RepositoryError::Other(format!("Failed to absolutize path: {}", e)))?
            .to_path_buf();

        self.lock_monitor().root = Some(root);
        self.reload()
    }

    /// Rebuild from the registered root unconditionally
    pub fn reload(&self) -> RepositoryResult<LoadReport> {
        let root = self
            .lock_monitor()
            .root
            .clone()
            .ok_or(RepositoryError::NotRegistered)?;

        let _guard = self.reloading.lock().unwrap_or_else(PoisonError::into_inner);
        let baseline = loader::latest_modification(&root).unwrap_or_else(|e| {
            debug!("Pre-load scan of {} failed: {}", root.display(), e);
            None
        });
        self.rebuild(&root, baseline)
    }

    /// Current store snapshot
    ///
    /// The snapshot stays valid (and unchanged) across later reloads.
    pub fn snapshot(&self) -> Arc<LibraryStore> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Publish an empty store. The registered root and timestamps are kept.
    pub fn reset(&self) {
        self.publish(LibraryStore::new());
    }

    /// Every library in the current store
    pub fn all(&self) -> Vec<Arc<Library>> {
        self.snapshot().all()
    }

    /// Resolve an exact version, or the latest when `version` is `None`
    pub fn resolve(&self, id: &str, version: Option<&str>) -> RepositoryResult<Arc<Library>> {
        self.snapshot().resolve(id, version).ok_or_else(|| {
            debug!("Library {}@{} not found", id, version.unwrap_or("latest"));
            RepositoryError::LibraryNotFound {
                id: id.to_string(),
                version: version.map(str::to_string),
            }
        })
    }

    /// Resolve the semantically latest version of `id`
    pub fn resolve_latest(&self, id: &str) -> RepositoryResult<Arc<Library>> {
        self.resolve(id, None)
    }

    pub fn status(&self) -> RepositoryStatus {
        let (root, last_load) = {
            let monitor = self.lock_monitor();
            (monitor.root.clone(), monitor.last_load)
        };

        RepositoryStatus {
            root,
            libraries: self.snapshot().len(),
            last_load,
        }
    }

    /// Reload the store if the tree changed since the last load.
    ///
    /// Cheap to call on every request: does nothing when no root is registered
    /// or when the previous check was less than one interval ago. Failures are
    /// logged and reported in the outcome; the previous store stays live.
    pub fn check_and_reload_if_needed(&self) -> ReloadOutcome {
        let (root, baseline) = {
            let mut monitor = self.lock_monitor();
            let Some(root) = monitor.root.clone() else {
                return ReloadOutcome::Unregistered;
            };

            let now = Instant::now();
            if let Some(last_check) = monitor.last_check {
                if now.duration_since(last_check) < self.check_interval {
                    return ReloadOutcome::Throttled;
                }
            }
            monitor.last_check = Some(now);
            (root, monitor.baseline)
        };

        let latest = match loader::latest_modification(&root) {
            Ok(latest) => latest,
            Err(e) => {
                warn!("Library staleness check failed for {}: {}", root.display(), e);
                return ReloadOutcome::ScanFailed(e);
            }
        };

        if !is_stale(latest, baseline) {
            return ReloadOutcome::Fresh;
        }

        let _guard = match self.reloading.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => return ReloadOutcome::InProgress,
        };

        info!("Library tree {} changed, reloading", root.display());
        match self.rebuild(&root, latest) {
            Ok(report) => ReloadOutcome::Reloaded(report),
            Err(e) => ReloadOutcome::Failed(e),
        }
    }

    /// Build a new store from `root` and publish it. Caller holds `reloading`.
    ///
    /// `baseline` is the tree modification time scanned before the walk. Later
    /// checks compare against it, so an edit racing the walk differs from it
    /// and triggers another reload.
    fn rebuild(&self, root: &Path, baseline: Option<SystemTime>) -> RepositoryResult<LoadReport> {
        let started = SystemTime::now();
        let result = loader::load_store(root);

        let mut monitor = self.lock_monitor();
        monitor.baseline = baseline;

        match result {
            Ok((store, report)) => {
                monitor.last_load = Some(started);
                drop(monitor);

                for conflict in &report.conflicts {
                    warn!(
                        "Library {}@{} declared twice with different content; keeping {}, discarding {}",
                        conflict.identifier.id,
                        conflict.identifier.version,
                        display_source(conflict.kept.as_deref()),
                        display_source(conflict.discarded.as_deref()),
                    );
                }

                let ids = store.ids().join(", ");
                self.publish(store);
                info!(
                    "✓ Loaded {} libraries from {} [{}]",
                    report.loaded,
                    root.display(),
                    ids
                );
                Ok(report)
            }
            Err(e) => {
                drop(monitor);
                warn!(
                    "Failed to load libraries from {}, keeping previous store: {}",
                    root.display(),
                    e
                );
                Err(e)
            }
        }
    }

    fn publish(&self, store: LibraryStore) {
        let store = Arc::new(store);
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = store;
    }

    fn lock_monitor(&self) -> MutexGuard<'_, MonitorState> {
        self.monitor.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Filesystem timestamps are coarse and may move backwards (restored files),
/// so any difference from the baseline counts.
fn is_stale(latest: Option<SystemTime>, baseline: Option<SystemTime>) -> bool {
    latest != baseline
}

fn display_source(path: Option<&Path>) -> String {
    path.map(|p| p.display().to_string())
        .unwrap_or_else(|| "<memory>".to_string())
}
