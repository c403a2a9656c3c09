//! Library repository for the clinical decision-support gateway
//!
//! This crate holds the pre-compiled rule definitions ("libraries") and hook
//! bindings the gateway serves. Libraries are loaded from a directory tree of
//! JSON files into an in-memory, versioned store and kept fresh by lazy
//! staleness checks.
//!
//! # Features
//!
//! - **Versioned store**: `id -> version -> document`, first write wins
//! - **Semantic-version resolution**: exact lookup or latest by precedence
//! - **Hot reload**: rate-limited mtime scan, rebuild off to the side, atomic swap
//! - **Hook bindings**: hook id -> library reference
//!
//! # Quick Start
//!
//! ```no_run
//! use cds_repository::LibraryRepository;
//!
//! fn main() -> anyhow::Result<()> {
//!     let repo = LibraryRepository::new();
//!     let report = repo.load("config/libraries")?;
//!     println!("Loaded {} libraries", report.loaded);
//!
//!     // Exact version, or latest when no version is given
//!     let exact = repo.resolve("StatinUse", Some("1.0.0"))?;
//!     let latest = repo.resolve_latest("StatinUse")?;
//!     println!("{} / {}", exact.version(), latest.version());
//!
//!     // Call freely: scans at most once per check interval
//!     repo.check_and_reload_if_needed();
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────┐
//! │        HTTP layer (cds-server)         │
//! └──────────────┬─────────────────────────┘
//!                │ snapshot / resolve / check_and_reload_if_needed
//!                ↓
//! ┌────────────────────────────────────────┐
//! │          LibraryRepository             │
//! │  - RwLock<Arc<LibraryStore>>           │
//! │  - staleness bookkeeping               │
//! └──────┬─────────────────────┬───────────┘
//!        │ load_store          │ latest_modification
//!        ↓                     ↓
//! ┌──────────────┐      ┌──────────────────┐
//! │ LibraryStore │ ←──  │  loader (walk +  │
//! │ VersionKey   │      │  parse *.json)   │
//! └──────────────┘      └──────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod hooks;
pub mod loader;
pub mod models;
pub mod repository;
pub mod store;
pub mod version;

// Re-exports - Configuration
pub use config::{ConfigError, RepositoryConfig};

// Re-exports - Error
pub use error::{RepositoryError, RepositoryResult};

// Re-exports - Repositories
pub use hooks::{ExecutionBinding, Hook, HookConfig, HookRepository, LibraryRef};
pub use models::*;
pub use repository::{LibraryRepository, ReloadOutcome, RepositoryStatus, DEFAULT_CHECK_INTERVAL};
pub use store::LibraryStore;
pub use version::VersionKey;
