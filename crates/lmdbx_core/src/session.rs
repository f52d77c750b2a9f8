//! Database sessions and transaction bracketing.

use crate::binding::{RawApi, STATUS_NOT_FOUND, STATUS_OK};
use crate::buffer::OutBuffer;
use crate::config::SessionConfig;
use crate::error::{Error, Result};
use crate::types::DbHandle;
use std::ffi::CString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Transaction state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    /// No transaction has been started since the last one resolved.
    Idle,
    /// A transaction is in progress.
    Active,
    /// The last transaction committed.
    Committed,
    /// The last transaction was aborted.
    Aborted,
}

/// An open database in the native engine.
///
/// `Database` owns exactly one engine handle and talks to the engine
/// through the [`RawApi`] it was opened with. Every operation takes
/// `&mut self`: lookups reuse a single out-parameter register, so a session
/// must not be used from two places at once, and the borrow checker
/// enforces that. Open separate sessions for separate threads.
///
/// # Example
///
/// ```rust
/// use lmdbx_core::{Database, InMemoryEngine};
/// use std::sync::Arc;
///
/// let engine = Arc::new(InMemoryEngine::new());
/// let mut db = Database::open(engine, "example.db")?;
///
/// db.put("hello", "world")?;
/// assert_eq!(db.get("hello")?, Some(b"world".to_vec()));
///
/// db.delete("hello")?;
/// assert_eq!(db.get("hello")?, None);
///
/// db.close();
/// # Ok::<(), lmdbx_core::Error>(())
/// ```
pub struct Database {
    api: Arc<dyn RawApi>,
    /// `None` once closed.
    handle: Option<DbHandle>,
    path: PathBuf,
    config: SessionConfig,
    txn: TransactionState,
    scratch: OutBuffer,
}

// SAFETY: the only non-Send field is `scratch`, whose pointer is meaningful
// solely within a single `get` call on `&mut self`.
unsafe impl Send for Database {}

impl Database {
    /// Opens the database at `path`.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` if the path is not UTF-8 or contains a NUL byte
    /// - `Engine` if the native open fails
    pub fn open(api: Arc<dyn RawApi>, path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_config(api, path, SessionConfig::default())
    }

    /// Opens the database at `path` with custom session settings.
    pub fn open_with_config(
        api: Arc<dyn RawApi>,
        path: impl AsRef<Path>,
        config: SessionConfig,
    ) -> Result<Self> {
        let path = path.as_ref();
        let text = path
            .to_str()
            .ok_or_else(|| Error::invalid_argument(format!("path {path:?} is not valid UTF-8")))?;
        let c_path = CString::new(text)
            .map_err(|_| Error::invalid_argument(format!("path {path:?} contains a NUL byte")))?;

        let mut raw = 0u64;
        // SAFETY: `c_path` is NUL-terminated and `raw` is a valid out-pointer.
        let rc = unsafe { api.open(c_path.as_ptr(), &mut raw) };
        check("open", rc)?;

        let handle = DbHandle::new(raw);
        debug!(path = %path.display(), %handle, "opened database");

        Ok(Self {
            api,
            handle: Some(handle),
            path: path.to_path_buf(),
            config,
            txn: TransactionState::Idle,
            scratch: OutBuffer::new(),
        })
    }

    /// Stores `value` under `key`.
    ///
    /// No transaction is implied; bracket with [`Database::transaction`] if needed.
    pub fn put(&mut self, key: impl AsRef<[u8]>, value: impl AsRef<[u8]>) -> Result<()> {
        let db = self.require_open()?;
        let (key, value) = (key.as_ref(), value.as_ref());
        // SAFETY: both slices are valid for their lengths for the whole call.
        let rc = unsafe {
            self.api.put(
                db.as_u64(),
                key.as_ptr(),
                key.len() as u64,
                value.as_ptr(),
                value.len() as u64,
            )
        };
        check("put", rc)
    }

    /// Looks up `key`.
    ///
    /// Returns `Ok(None)` if the key does not exist.
    pub fn get(&mut self, key: impl AsRef<[u8]>) -> Result<Option<Vec<u8>>> {
        let db = self.require_open()?;
        let key = key.as_ref();

        self.scratch.reset();
        // SAFETY: `key` is valid for its length and the scratch fields are
        // writable out-pointers.
        let rc = unsafe {
            self.api.get(
                db.as_u64(),
                key.as_ptr(),
                key.len() as u64,
                &mut self.scratch.ptr,
                &mut self.scratch.len,
            )
        };
        if rc == STATUS_NOT_FOUND {
            return Ok(None);
        }
        check("get", rc)?;

        // SAFETY: on success the engine handed us a buffer of `len` bytes,
        // which we copy once and release exactly once.
        let value = unsafe {
            let value = self.scratch.to_vec();
            self.api.free(self.scratch.ptr, self.scratch.len);
            value
        };
        self.scratch.reset();
        Ok(Some(value))
    }

    /// Removes `key`.
    pub fn delete(&mut self, key: impl AsRef<[u8]>) -> Result<()> {
        let db = self.require_open()?;
        let key = key.as_ref();
        // SAFETY: `key` is valid for its length.
        let rc = unsafe { self.api.del(db.as_u64(), key.as_ptr(), key.len() as u64) };
        check("delete", rc)
    }

    /// Forces durability of prior writes.
    pub fn flush(&mut self) -> Result<()> {
        let db = self.require_open()?;
        // SAFETY: `db` is a live handle.
        let rc = unsafe { self.api.flush(db.as_u64()) };
        check("flush", rc)
    }

    /// Begins a transaction.
    ///
    /// # Errors
    ///
    /// - `InvalidState` if one is already active (nesting is unsupported)
    /// - `Engine` if the native begin fails; the state stays unchanged
    pub fn begin_transaction(&mut self) -> Result<()> {
        let db = self.require_open()?;
        if self.txn == TransactionState::Active {
            return Err(Error::invalid_state("a transaction is already active"));
        }
        // SAFETY: `db` is a live handle.
        let rc = unsafe { self.api.txn_begin(db.as_u64()) };
        check("txn_begin", rc)?;
        self.txn = TransactionState::Active;
        Ok(())
    }

    /// Commits the active transaction.
    ///
    /// A failed commit is reported as-is. The engine has already resolved
    /// the transaction at that point, so no abort follows.
    pub fn commit_transaction(&mut self) -> Result<()> {
        let db = self.require_active()?;
        // SAFETY: `db` is a live handle with an active transaction.
        let rc = unsafe { self.api.txn_commit(db.as_u64()) };
        if rc == STATUS_OK {
            self.txn = TransactionState::Committed;
            Ok(())
        } else {
            self.txn = TransactionState::Aborted;
            Err(Error::engine("txn_commit", rc))
        }
    }

    /// Aborts the active transaction.
    pub fn abort_transaction(&mut self) -> Result<()> {
        let db = self.require_active()?;
        // SAFETY: `db` is a live handle with an active transaction.
        unsafe { self.api.txn_abort(db.as_u64()) };
        self.txn = TransactionState::Aborted;
        Ok(())
    }

    /// Runs `f` inside a transaction.
    ///
    /// If `f` returns `Ok`, the transaction is committed. If it returns
    /// `Err`, the transaction is aborted and that error is returned
    /// unchanged. Begin and commit failures are converted into `E`.
    ///
    /// ```rust
    /// # use lmdbx_core::{Database, InMemoryEngine, Error};
    /// # use std::sync::Arc;
    /// let mut db = Database::open(Arc::new(InMemoryEngine::new()), "txn.db")?;
    /// db.transaction(|db| {
    ///     db.put("a", "1")?;
    ///     db.put("b", "2")
    /// })?;
    /// assert_eq!(db.get("b")?, Some(b"2".to_vec()));
    /// # Ok::<(), Error>(())
    /// ```
    pub fn transaction<F, T, E>(&mut self, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&mut Self) -> std::result::Result<T, E>,
        E: From<Error>,
    {
        self.begin_transaction()?;
        match f(self) {
            Ok(value) => {
                self.commit_transaction()?;
                Ok(value)
            }
            Err(e) => {
                // Try to abort, but don't mask the original error
                self.abort_quietly();
                Err(e)
            }
        }
    }

    /// Closes the session, releasing the native handle.
    ///
    /// An active transaction is aborted first. Closing twice is a no-op on
    /// the client side and never reaches the engine.
    pub fn close(&mut self) {
        let Some(db) = self.handle else {
            return;
        };
        if self.txn == TransactionState::Active {
            warn!(path = %self.path.display(), "closing database with an active transaction; aborting");
            self.abort_quietly();
        }
        // SAFETY: `db` is live and is dropped from the session right after.
        unsafe { self.api.close(db.as_u64()) };
        self.handle = None;
        debug!(path = %self.path.display(), handle = %db, "closed database");
    }

    /// Returns true until [`Database::close`] is called.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.handle.is_some()
    }

    /// Returns the engine handle, if open.
    #[must_use]
    pub fn handle(&self) -> Option<DbHandle> {
        self.handle
    }

    /// Returns the path the database was opened with.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the transaction state.
    #[must_use]
    pub fn transaction_state(&self) -> TransactionState {
        self.txn
    }

    /// Returns true while a transaction is active.
    #[must_use]
    pub fn in_transaction(&self) -> bool {
        self.txn == TransactionState::Active
    }

    /// Returns the session settings.
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub(crate) fn api(&self) -> &dyn RawApi {
        self.api.as_ref()
    }

    /// Ensures the session is open and returns its handle.
    pub(crate) fn require_open(&self) -> Result<DbHandle> {
        self.handle
            .ok_or_else(|| Error::invalid_state("database is closed"))
    }

    fn require_active(&self) -> Result<DbHandle> {
        let db = self.require_open()?;
        if self.txn != TransactionState::Active {
            return Err(Error::invalid_state("no active transaction"));
        }
        Ok(db)
    }

    fn abort_quietly(&mut self) {
        if let Err(e) = self.abort_transaction() {
            warn!(error = %e, "best-effort abort skipped");
        }
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("path", &self.path)
            .field("handle", &self.handle)
            .field("txn", &self.txn)
            .finish_non_exhaustive()
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        self.close();
    }
}

/// Maps a native status to a result.
pub(crate) fn check(operation: &'static str, rc: i32) -> Result<()> {
    if rc == STATUS_OK {
        Ok(())
    } else {
        Err(Error::engine(operation, rc))
    }
}
