//! Test fixtures and database helpers.
//!
//! Provides sessions over the in-memory engine, fake artifact directories
//! for resolution tests, and a loader that records what it was asked for.

use lmdbx_core::{
    Arch, Database, InMemoryEngine, LibcVariant, Loader, LoaderConfig, SessionConfig,
    DEFAULT_EXTENSION, DEFAULT_PREFIX,
};
use std::cell::RefCell;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Keys inserted by [`seed_range_keys`]: `key001`, then `key005` to `key030` in steps of 5.
pub const RANGE_KEYS: [&str; 7] = [
    "key001", "key005", "key010", "key015", "key020", "key025", "key030",
];

/// A session over a private in-memory engine.
pub struct TestDatabase {
    /// The session.
    pub db: Database,
    /// The engine, for diagnostics and fault injection.
    pub engine: Arc<InMemoryEngine>,
}

impl TestDatabase {
    /// Opens `test.db` on a fresh in-memory engine.
    pub fn memory() -> Self {
        Self::memory_with_config(SessionConfig::default())
    }

    /// Opens `test.db` on a fresh in-memory engine with custom settings.
    pub fn memory_with_config(config: SessionConfig) -> Self {
        let engine = Arc::new(InMemoryEngine::new());
        let db = Database::open_with_config(engine.clone(), "test.db", config)
            .expect("Failed to open in-memory database");
        Self { db, engine }
    }

    /// Opens another session on the same engine and path.
    pub fn reopen(&self) -> Database {
        Database::open(self.engine.clone(), "test.db").expect("Failed to reopen database")
    }
}

impl std::ops::Deref for TestDatabase {
    type Target = Database;

    fn deref(&self) -> &Self::Target {
        &self.db
    }
}

impl std::ops::DerefMut for TestDatabase {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.db
    }
}

/// Runs a test with a session over a fresh in-memory engine.
///
/// # Example
///
/// ```rust
/// use lmdbx_testkit::with_memory_db;
///
/// let value = with_memory_db(|db| {
///     db.put("a", "1").unwrap();
///     db.get("a").unwrap()
/// });
/// assert_eq!(value, Some(b"1".to_vec()));
/// ```
pub fn with_memory_db<F, R>(f: F) -> R
where
    F: FnOnce(&mut Database) -> R,
{
    let mut test_db = TestDatabase::memory();
    f(&mut test_db.db)
}

/// Inserts [`RANGE_KEYS`] inside one transaction, each mapped to `value<n>`.
pub fn seed_range_keys(db: &mut Database) -> lmdbx_core::Result<()> {
    db.transaction(|db| {
        for i in std::iter::once(1).chain((5..=30).step_by(5)) {
            db.put(format!("key{i:03}"), format!("value{i}"))?;
        }
        Ok(())
    })
}

/// Returns the keys of `entries` as strings.
pub fn entry_keys(entries: &[lmdbx_core::Entry]) -> Vec<String> {
    entries
        .iter()
        .map(|e| String::from_utf8_lossy(&e.key).into_owned())
        .collect()
}

/// A temporary directory standing in for `BIN_LIBS_PATH`.
pub struct ArtifactDir {
    dir: TempDir,
}

impl ArtifactDir {
    /// Creates an empty artifact directory.
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Returns the directory path.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Returns the file name for a per-variant artifact.
    pub fn artifact_name(arch: Arch, variant: LibcVariant) -> String {
        format!("{DEFAULT_PREFIX}-{arch}-{variant}{DEFAULT_EXTENSION}")
    }

    /// Returns the file name of the bare fallback artifact.
    pub fn fallback_name() -> String {
        format!("{DEFAULT_PREFIX}{DEFAULT_EXTENSION}")
    }

    /// Writes a file that looks like an artifact but is not loadable.
    pub fn write_bogus(&self, name: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, b"not a shared library").expect("Failed to write artifact");
        path
    }

    /// Returns a loader configuration pointing at this directory.
    pub fn config(&self) -> LoaderConfig {
        LoaderConfig::new().with_base_dir(self.dir.path())
    }
}

impl Default for ArtifactDir {
    fn default() -> Self {
        Self::new()
    }
}

/// A loader that records each path it is asked to load.
///
/// Paths in the accept set load successfully (the "library" is the path
/// itself); everything else fails with a fixed message.
#[derive(Debug, Default)]
pub struct RecordingLoader {
    accept: HashSet<PathBuf>,
    tried: RefCell<Vec<PathBuf>>,
}

impl RecordingLoader {
    /// Creates a loader that rejects every path.
    pub fn rejecting() -> Self {
        Self::default()
    }

    /// Creates a loader that accepts only `path`.
    pub fn accepting(path: impl Into<PathBuf>) -> Self {
        let mut loader = Self::default();
        loader.accept.insert(path.into());
        loader
    }

    /// Returns every path tried so far, in order.
    pub fn tried(&self) -> Vec<PathBuf> {
        self.tried.borrow().clone()
    }
}

impl Loader for &RecordingLoader {
    type Library = PathBuf;

    fn load(&self, path: &Path) -> Result<PathBuf, String> {
        self.tried.borrow_mut().push(path.to_path_buf());
        if self.accept.contains(path) {
            Ok(path.to_path_buf())
        } else {
            Err("rejected by recording loader".to_string())
        }
    }
}
