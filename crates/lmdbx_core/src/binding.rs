//! The foreign entry points exported by the native engine.
//!
//! Every method mirrors one C symbol exactly. Handles are `u64`, byte spans
//! are pointer + `u64` length, and status codes are `i32` with `0` meaning
//! success. Nothing here interprets results; that is the session's job.

use std::ffi::c_char;

/// Status returned by every successful call.
pub const STATUS_OK: i32 = 0;

/// Status returned by `lmdbx_get` (and the cursor) when the key is absent.
pub const STATUS_NOT_FOUND: i32 = -2;

/// libmdbx's own not-found code, reported by cursors at end of data.
pub const MDBX_NOTFOUND: i32 = -30798;

/// Cursor positioning operations, numbered as libmdbx's `MDBX_cursor_op`.
pub mod cursor_op {
    /// Position at the first entry.
    pub const FIRST: i32 = 0;
    /// Position at the last entry.
    pub const LAST: i32 = 6;
    /// Advance to the next entry.
    pub const NEXT: i32 = 8;
    /// Step back to the previous entry.
    pub const PREV: i32 = 12;
    /// Position at the first entry whose key is greater than or equal to the input key.
    pub const SET_RANGE: i32 = 17;
}

/// Symbol names the loaded artifact must export.
pub mod symbols {
    /// `int lmdbx_open(const char *path, uint64_t *out_db)`
    pub const OPEN: &[u8] = b"lmdbx_open\0";
    /// `void lmdbx_close(uint64_t db)`
    pub const CLOSE: &[u8] = b"lmdbx_close\0";
    /// `int lmdbx_put(uint64_t db, const void *key, uint64_t key_len, const void *val, uint64_t val_len)`
    pub const PUT: &[u8] = b"lmdbx_put\0";
    /// `int lmdbx_get(uint64_t db, const void *key, uint64_t key_len, void **out_val, uint64_t *out_len)`
    pub const GET: &[u8] = b"lmdbx_get\0";
    /// `void lmdbx_free(void *ptr, uint64_t len)`
    pub const FREE: &[u8] = b"lmdbx_free\0";
    /// `int lmdbx_del(uint64_t db, const void *key, uint64_t key_len)`
    pub const DEL: &[u8] = b"lmdbx_del\0";
    /// `int lmdbx_flush(uint64_t db)`
    pub const FLUSH: &[u8] = b"lmdbx_flush\0";
    /// `int lmdbx_txn_begin(uint64_t db)`
    pub const TXN_BEGIN: &[u8] = b"lmdbx_txn_begin\0";
    /// `int lmdbx_txn_commit(uint64_t db)`
    pub const TXN_COMMIT: &[u8] = b"lmdbx_txn_commit\0";
    /// `void lmdbx_txn_abort(uint64_t db)`
    pub const TXN_ABORT: &[u8] = b"lmdbx_txn_abort\0";
    /// `int lmdbx_cursor_open(uint64_t db, uint64_t *out_cursor)`
    pub const CURSOR_OPEN: &[u8] = b"lmdbx_cursor_open\0";
    /// `void lmdbx_cursor_close(uint64_t cursor)`
    pub const CURSOR_CLOSE: &[u8] = b"lmdbx_cursor_close\0";
    /// `int lmdbx_cursor_get(uint64_t cursor, const void **key, uint64_t *key_len, const void **val, uint64_t *val_len, int op)`
    pub const CURSOR_GET: &[u8] = b"lmdbx_cursor_get\0";

    /// All required symbols.
    pub const ALL: [&[u8]; 13] = [
        OPEN,
        CLOSE,
        PUT,
        GET,
        FREE,
        DEL,
        FLUSH,
        TXN_BEGIN,
        TXN_COMMIT,
        TXN_ABORT,
        CURSOR_OPEN,
        CURSOR_CLOSE,
        CURSOR_GET,
    ];
}

/// The binding surface of the native engine.
///
/// Implemented by [`crate::NativeLibrary`] for a dynamically loaded artifact
/// and by [`crate::InMemoryEngine`] for tests. A session receives one of
/// these explicitly rather than reaching for a process-wide global.
///
/// # Safety
///
/// All methods share the C contract: pointers must be valid for the stated
/// lengths, out-pointers must be writable, and handles must be live values
/// previously produced by the same implementation.
pub trait RawApi: Send + Sync {
    /// Opens the database at the NUL-terminated `path`, writing its handle to `out_db`.
    unsafe fn open(&self, path: *const c_char, out_db: *mut u64) -> i32;

    /// Releases a database handle.
    unsafe fn close(&self, db: u64);

    /// Stores `val` under `key`.
    unsafe fn put(&self, db: u64, key: *const u8, key_len: u64, val: *const u8, val_len: u64)
        -> i32;

    /// Looks up `key`. On success writes an engine-allocated buffer to
    /// `out_val`/`out_len` that must be released with [`RawApi::free`].
    unsafe fn get(
        &self,
        db: u64,
        key: *const u8,
        key_len: u64,
        out_val: *mut *mut u8,
        out_len: *mut u64,
    ) -> i32;

    /// Releases a buffer obtained from [`RawApi::get`].
    unsafe fn free(&self, ptr: *mut u8, len: u64);

    /// Removes `key`.
    unsafe fn del(&self, db: u64, key: *const u8, key_len: u64) -> i32;

    /// Forces durability of prior writes.
    unsafe fn flush(&self, db: u64) -> i32;

    /// Begins a write transaction on `db`.
    unsafe fn txn_begin(&self, db: u64) -> i32;

    /// Commits the active transaction on `db`.
    unsafe fn txn_commit(&self, db: u64) -> i32;

    /// Aborts the active transaction on `db`.
    unsafe fn txn_abort(&self, db: u64);

    /// Opens a cursor over `db`, writing its handle to `out_cursor`.
    unsafe fn cursor_open(&self, db: u64, out_cursor: *mut u64) -> i32;

    /// Releases a cursor handle.
    unsafe fn cursor_close(&self, cursor: u64);

    /// Positions the cursor with `op` and reports the current entry.
    ///
    /// `key`/`key_len` are read as input for [`cursor_op::SET_RANGE`].
    /// Returned pointers belong to the engine and stay valid only until the
    /// next call on the same cursor.
    unsafe fn cursor_get(
        &self,
        cursor: u64,
        key: *mut *const u8,
        key_len: *mut u64,
        val: *mut *const u8,
        val_len: *mut u64,
        op: i32,
    ) -> i32;
}

/// Returns true if a cursor `status` means the scan ran out of entries.
#[must_use]
pub const fn is_end_of_data(status: i32) -> bool {
    status == STATUS_NOT_FOUND || status == MDBX_NOTFOUND
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_names_are_nul_terminated() {
        for name in symbols::ALL {
            assert_eq!(name.last(), Some(&0));
            assert!(name.starts_with(b"lmdbx_"));
        }
    }

    #[test]
    fn end_of_data_codes() {
        assert!(is_end_of_data(STATUS_NOT_FOUND));
        assert!(is_end_of_data(MDBX_NOTFOUND));
        assert!(!is_end_of_data(STATUS_OK));
        assert!(!is_end_of_data(-1));
    }
}
