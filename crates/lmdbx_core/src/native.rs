//! Dynamically loaded native engine.

use crate::binding::{symbols, RawApi};
use crate::resolver::Loader;
use libloading::Library;
use std::ffi::c_char;
use std::fmt;
use std::path::{Path, PathBuf};

type OpenFn = unsafe extern "C" fn(*const c_char, *mut u64) -> i32;
type CloseFn = unsafe extern "C" fn(u64);
type PutFn = unsafe extern "C" fn(u64, *const u8, u64, *const u8, u64) -> i32;
type GetFn = unsafe extern "C" fn(u64, *const u8, u64, *mut *mut u8, *mut u64) -> i32;
type FreeFn = unsafe extern "C" fn(*mut u8, u64);
type DelFn = unsafe extern "C" fn(u64, *const u8, u64) -> i32;
type StatusFn = unsafe extern "C" fn(u64) -> i32;
type VoidFn = unsafe extern "C" fn(u64);
type CursorOpenFn = unsafe extern "C" fn(u64, *mut u64) -> i32;
type CursorGetFn =
    unsafe extern "C" fn(u64, *mut *const u8, *mut u64, *mut *const u8, *mut u64, i32) -> i32;

/// A loaded native artifact with all entry points bound.
///
/// The library stays mapped for as long as this value lives. There is no
/// unload path: in practice one instance is created at startup and shared
/// through an `Arc`.
pub struct NativeLibrary {
    path: PathBuf,
    open: OpenFn,
    close: CloseFn,
    put: PutFn,
    get: GetFn,
    free: FreeFn,
    del: DelFn,
    flush: StatusFn,
    txn_begin: StatusFn,
    txn_commit: StatusFn,
    txn_abort: VoidFn,
    cursor_open: CursorOpenFn,
    cursor_close: VoidFn,
    cursor_get: CursorGetFn,
    // Must outlive the function pointers above.
    _library: Library,
}

impl NativeLibrary {
    /// Loads the artifact at `path` and binds every required symbol.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be loaded or any symbol is missing.
    ///
    /// # Safety
    ///
    /// Loading runs the artifact's initialisers, and the bound symbols are
    /// trusted to have the signatures declared in [`crate::binding`].
    pub unsafe fn load(path: &Path) -> Result<Self, libloading::Error> {
        let library = Library::new(path)?;

        let open = *library.get::<OpenFn>(symbols::OPEN)?;
        let close = *library.get::<CloseFn>(symbols::CLOSE)?;
        let put = *library.get::<PutFn>(symbols::PUT)?;
        let get = *library.get::<GetFn>(symbols::GET)?;
        let free = *library.get::<FreeFn>(symbols::FREE)?;
        let del = *library.get::<DelFn>(symbols::DEL)?;
        let flush = *library.get::<StatusFn>(symbols::FLUSH)?;
        let txn_begin = *library.get::<StatusFn>(symbols::TXN_BEGIN)?;
        let txn_commit = *library.get::<StatusFn>(symbols::TXN_COMMIT)?;
        let txn_abort = *library.get::<VoidFn>(symbols::TXN_ABORT)?;
        let cursor_open = *library.get::<CursorOpenFn>(symbols::CURSOR_OPEN)?;
        let cursor_close = *library.get::<VoidFn>(symbols::CURSOR_CLOSE)?;
        let cursor_get = *library.get::<CursorGetFn>(symbols::CURSOR_GET)?;

        Ok(Self {
            path: path.to_path_buf(),
            open,
            close,
            put,
            get,
            free,
            del,
            flush,
            txn_begin,
            txn_commit,
            txn_abort,
            cursor_open,
            cursor_close,
            cursor_get,
            _library: library,
        })
    }

    /// Returns the path this library was loaded from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Debug for NativeLibrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeLibrary")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl RawApi for NativeLibrary {
    unsafe fn open(&self, path: *const c_char, out_db: *mut u64) -> i32 {
        (self.open)(path, out_db)
    }

    unsafe fn close(&self, db: u64) {
        (self.close)(db);
    }

    unsafe fn put(
        &self,
        db: u64,
        key: *const u8,
        key_len: u64,
        val: *const u8,
        val_len: u64,
    ) -> i32 {
        (self.put)(db, key, key_len, val, val_len)
    }

    unsafe fn get(
        &self,
        db: u64,
        key: *const u8,
        key_len: u64,
        out_val: *mut *mut u8,
        out_len: *mut u64,
    ) -> i32 {
        (self.get)(db, key, key_len, out_val, out_len)
    }

    unsafe fn free(&self, ptr: *mut u8, len: u64) {
        (self.free)(ptr, len);
    }

    unsafe fn del(&self, db: u64, key: *const u8, key_len: u64) -> i32 {
        (self.del)(db, key, key_len)
    }

    unsafe fn flush(&self, db: u64) -> i32 {
        (self.flush)(db)
    }

    unsafe fn txn_begin(&self, db: u64) -> i32 {
        (self.txn_begin)(db)
    }

    unsafe fn txn_commit(&self, db: u64) -> i32 {
        (self.txn_commit)(db)
    }

    unsafe fn txn_abort(&self, db: u64) {
        (self.txn_abort)(db);
    }

    unsafe fn cursor_open(&self, db: u64, out_cursor: *mut u64) -> i32 {
        (self.cursor_open)(db, out_cursor)
    }

    unsafe fn cursor_close(&self, cursor: u64) {
        (self.cursor_close)(cursor);
    }

    unsafe fn cursor_get(
        &self,
        cursor: u64,
        key: *mut *const u8,
        key_len: *mut u64,
        val: *mut *const u8,
        val_len: *mut u64,
        op: i32,
    ) -> i32 {
        (self.cursor_get)(cursor, key, key_len, val, val_len, op)
    }
}

/// Production [`Loader`] backed by the platform's dynamic linker.
#[derive(Debug, Clone, Copy, Default)]
pub struct DylibLoader;

impl Loader for DylibLoader {
    type Library = NativeLibrary;

    fn load(&self, path: &Path) -> Result<NativeLibrary, String> {
        // SAFETY: artifacts under the configured directory are trusted to
        // implement the lmdbx ABI.
        unsafe { NativeLibrary::load(path) }.map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("liblmdbx.so");
        let err = DylibLoader.load(&path).unwrap_err();
        assert!(!err.is_empty());
    }

    #[test]
    fn garbage_file_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("liblmdbx-x86_64-gnu.so");
        std::fs::write(&path, b"definitely not a shared object").unwrap();
        assert!(DylibLoader.load(&path).is_err());
    }
}
