//! In-memory engine for testing.

use crate::binding::{cursor_op, RawApi, MDBX_NOTFOUND, STATUS_NOT_FOUND, STATUS_OK};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::ffi::{c_char, CStr};

/// Status for an unknown handle or malformed argument (`-EINVAL`).
pub const STATUS_INVALID: i32 = -22;

/// Status for a transaction call made in the wrong state (libmdbx `MDBX_BAD_TXN`).
pub const STATUS_BAD_TXN: i32 = -30782;

/// Native operations that can be made to fail on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineOp {
    /// `lmdbx_open`
    Open,
    /// `lmdbx_put`
    Put,
    /// `lmdbx_get`
    Get,
    /// `lmdbx_del`
    Del,
    /// `lmdbx_flush`
    Flush,
    /// `lmdbx_txn_begin`
    TxnBegin,
    /// `lmdbx_txn_commit`
    TxnCommit,
    /// `lmdbx_cursor_open`
    CursorOpen,
    /// `lmdbx_cursor_get`
    CursorGet,
}

type Table = BTreeMap<Vec<u8>, Vec<u8>>;

#[derive(Debug, Clone, Copy)]
struct Fault {
    skip: usize,
    code: i32,
}

#[derive(Debug)]
struct DbState {
    path: String,
    /// Table contents at `txn_begin`, restored on abort.
    snapshot: Option<Table>,
}

#[derive(Debug)]
struct CursorState {
    entries: Vec<(Vec<u8>, Vec<u8>)>,
    pos: Option<usize>,
}

#[derive(Debug, Default)]
struct Inner {
    tables: HashMap<String, Table>,
    dbs: HashMap<u64, DbState>,
    cursors: HashMap<u64, CursorState>,
    /// Outstanding `get` buffers: address -> (len, capacity).
    buffers: HashMap<usize, (usize, usize)>,
    faults: HashMap<EngineOp, Fault>,
    next_handle: u64,
    frees: usize,
    invalid_frees: usize,
    flushes: usize,
}

impl Inner {
    fn handle(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }

    /// Consumes a pending fault for `op`, if one is due.
    fn fault(&mut self, op: EngineOp) -> Option<i32> {
        let fault = self.faults.get_mut(&op)?;
        if fault.skip > 0 {
            fault.skip -= 1;
            return None;
        }
        let code = fault.code;
        self.faults.remove(&op);
        Some(code)
    }

    fn table(&mut self, db: u64) -> Option<&mut Table> {
        let path = &self.dbs.get(&db)?.path;
        self.tables.get_mut(path)
    }

    fn allocate(&mut self, bytes: &[u8]) -> (*mut u8, u64) {
        // Never zero capacity, so every buffer has a distinct address.
        let mut buf = Vec::with_capacity(bytes.len().max(1));
        buf.extend_from_slice(bytes);
        let mut buf = std::mem::ManuallyDrop::new(buf);
        let ptr = buf.as_mut_ptr();
        self.buffers.insert(ptr as usize, (buf.len(), buf.capacity()));
        (ptr, bytes.len() as u64)
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        for (addr, (len, cap)) in self.buffers.drain() {
            // SAFETY: every entry was produced by `allocate` and not yet freed.
            drop(unsafe { Vec::from_raw_parts(addr as *mut u8, len, cap) });
        }
    }
}

/// An in-memory engine that honours the native ownership rules.
///
/// Suitable for unit tests, integration tests and benchmarks. It behaves
/// like the native engine where the client can observe it:
///
/// - tables are keyed by path, so reopening a path sees earlier writes
/// - `get` hands out buffers that must be released with `free`
/// - cursors return engine-retained pointers that are never freed
/// - `txn_begin` snapshots, `txn_abort` restores, `txn_commit` keeps
///
/// Diagnostics such as [`InMemoryEngine::outstanding_buffers`] let tests
/// check that the client releases everything it is handed, and
/// [`InMemoryEngine::fail_next`] injects engine errors.
///
/// Transactions are per handle and assume a single writer per path.
#[derive(Debug, Default)]
pub struct InMemoryEngine {
    inner: Mutex<Inner>,
}

impl InMemoryEngine {
    /// Creates a new empty engine.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next call to `op` return `code`.
    pub fn fail_next(&self, op: EngineOp, code: i32) {
        self.fail_after(op, 0, code);
    }

    /// Lets `skip` calls to `op` succeed, then makes the following one return `code`.
    pub fn fail_after(&self, op: EngineOp, skip: usize, code: i32) {
        self.inner.lock().faults.insert(op, Fault { skip, code });
    }

    /// Number of `get` buffers handed out and not yet freed.
    #[must_use]
    pub fn outstanding_buffers(&self) -> usize {
        self.inner.lock().buffers.len()
    }

    /// Number of buffers released through `free`.
    #[must_use]
    pub fn frees(&self) -> usize {
        self.inner.lock().frees
    }

    /// Number of `free` calls with a pointer the engine did not hand out.
    #[must_use]
    pub fn invalid_frees(&self) -> usize {
        self.inner.lock().invalid_frees
    }

    /// Number of cursors currently open.
    #[must_use]
    pub fn open_cursors(&self) -> usize {
        self.inner.lock().cursors.len()
    }

    /// Number of database handles currently open.
    #[must_use]
    pub fn open_handles(&self) -> usize {
        self.inner.lock().dbs.len()
    }

    /// Number of successful flushes.
    #[must_use]
    pub fn flushes(&self) -> usize {
        self.inner.lock().flushes
    }

    /// Returns true if `db` has a transaction in progress.
    #[must_use]
    pub fn in_transaction(&self, db: u64) -> bool {
        self.inner
            .lock()
            .dbs
            .get(&db)
            .is_some_and(|d| d.snapshot.is_some())
    }

    /// Returns a copy of the table stored at `path`.
    #[must_use]
    pub fn table(&self, path: &str) -> Option<BTreeMap<Vec<u8>, Vec<u8>>> {
        self.inner.lock().tables.get(path).cloned()
    }
}

unsafe fn slice<'a>(ptr: *const u8, len: u64) -> &'a [u8] {
    if len == 0 {
        &[]
    } else {
        std::slice::from_raw_parts(ptr, len as usize)
    }
}

impl RawApi for InMemoryEngine {
    unsafe fn open(&self, path: *const c_char, out_db: *mut u64) -> i32 {
        let mut inner = self.inner.lock();
        if let Some(code) = inner.fault(EngineOp::Open) {
            return code;
        }
        if path.is_null() || out_db.is_null() {
            return STATUS_INVALID;
        }
        let path = CStr::from_ptr(path).to_string_lossy().into_owned();
        if path.is_empty() {
            return STATUS_INVALID;
        }

        inner.tables.entry(path.clone()).or_default();
        let handle = inner.handle();
        inner.dbs.insert(
            handle,
            DbState {
                path,
                snapshot: None,
            },
        );
        *out_db = handle;
        STATUS_OK
    }

    unsafe fn close(&self, db: u64) {
        let mut inner = self.inner.lock();
        if let Some(state) = inner.dbs.remove(&db) {
            if let Some(snapshot) = state.snapshot {
                inner.tables.insert(state.path, snapshot);
            }
        }
    }

    unsafe fn put(
        &self,
        db: u64,
        key: *const u8,
        key_len: u64,
        val: *const u8,
        val_len: u64,
    ) -> i32 {
        let mut inner = self.inner.lock();
        if let Some(code) = inner.fault(EngineOp::Put) {
            return code;
        }
        let key = slice(key, key_len).to_vec();
        let val = slice(val, val_len).to_vec();
        match inner.table(db) {
            Some(table) => {
                table.insert(key, val);
                STATUS_OK
            }
            None => STATUS_INVALID,
        }
    }

    unsafe fn get(
        &self,
        db: u64,
        key: *const u8,
        key_len: u64,
        out_val: *mut *mut u8,
        out_len: *mut u64,
    ) -> i32 {
        let mut inner = self.inner.lock();
        if let Some(code) = inner.fault(EngineOp::Get) {
            return code;
        }
        let key = slice(key, key_len);
        let found = match inner.table(db) {
            Some(table) => table.get(key).cloned(),
            None => return STATUS_INVALID,
        };
        match found {
            Some(value) => {
                let (ptr, len) = inner.allocate(&value);
                *out_val = ptr;
                *out_len = len;
                STATUS_OK
            }
            None => STATUS_NOT_FOUND,
        }
    }

    unsafe fn free(&self, ptr: *mut u8, len: u64) {
        let mut inner = self.inner.lock();
        match inner.buffers.get(&(ptr as usize)).copied() {
            Some((stored_len, cap)) if stored_len as u64 == len => {
                inner.buffers.remove(&(ptr as usize));
                inner.frees += 1;
                drop(Vec::from_raw_parts(ptr, stored_len, cap));
            }
            _ => inner.invalid_frees += 1,
        }
    }

    unsafe fn del(&self, db: u64, key: *const u8, key_len: u64) -> i32 {
        let mut inner = self.inner.lock();
        if let Some(code) = inner.fault(EngineOp::Del) {
            return code;
        }
        let key = slice(key, key_len);
        match inner.table(db) {
            // Deleting an absent key is not an error.
            Some(table) => {
                table.remove(key);
                STATUS_OK
            }
            None => STATUS_INVALID,
        }
    }

    unsafe fn flush(&self, db: u64) -> i32 {
        let mut inner = self.inner.lock();
        if let Some(code) = inner.fault(EngineOp::Flush) {
            return code;
        }
        if !inner.dbs.contains_key(&db) {
            return STATUS_INVALID;
        }
        inner.flushes += 1;
        STATUS_OK
    }

    unsafe fn txn_begin(&self, db: u64) -> i32 {
        let mut inner = self.inner.lock();
        if let Some(code) = inner.fault(EngineOp::TxnBegin) {
            return code;
        }
        let Some(path) = inner.dbs.get(&db).map(|d| d.path.clone()) else {
            return STATUS_INVALID;
        };
        let current = inner.tables.get(&path).cloned().unwrap_or_default();
        let Some(state) = inner.dbs.get_mut(&db) else {
            return STATUS_INVALID;
        };
        if state.snapshot.is_some() {
            return STATUS_BAD_TXN;
        }
        state.snapshot = Some(current);
        STATUS_OK
    }

    unsafe fn txn_commit(&self, db: u64) -> i32 {
        let mut inner = self.inner.lock();
        let fault = inner.fault(EngineOp::TxnCommit);
        let Some(state) = inner.dbs.get_mut(&db) else {
            return STATUS_INVALID;
        };
        let Some(snapshot) = state.snapshot.take() else {
            return STATUS_BAD_TXN;
        };
        match fault {
            // A failed commit leaves the transaction resolved as aborted.
            Some(code) => {
                let path = state.path.clone();
                inner.tables.insert(path, snapshot);
                code
            }
            None => STATUS_OK,
        }
    }

    unsafe fn txn_abort(&self, db: u64) {
        let mut inner = self.inner.lock();
        let Some(state) = inner.dbs.get_mut(&db) else {
            return;
        };
        if let Some(snapshot) = state.snapshot.take() {
            let path = state.path.clone();
            inner.tables.insert(path, snapshot);
        }
    }

    unsafe fn cursor_open(&self, db: u64, out_cursor: *mut u64) -> i32 {
        let mut inner = self.inner.lock();
        if let Some(code) = inner.fault(EngineOp::CursorOpen) {
            return code;
        }
        if out_cursor.is_null() {
            return STATUS_INVALID;
        }
        let entries: Vec<(Vec<u8>, Vec<u8>)> = match inner.table(db) {
            Some(table) => table.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            None => return STATUS_INVALID,
        };
        let handle = inner.handle();
        inner
            .cursors
            .insert(handle, CursorState { entries, pos: None });
        *out_cursor = handle;
        STATUS_OK
    }

    unsafe fn cursor_close(&self, cursor: u64) {
        self.inner.lock().cursors.remove(&cursor);
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
        let mut inner = self.inner.lock();
        if let Some(code) = inner.fault(EngineOp::CursorGet) {
            return code;
        }
        if key.is_null() || key_len.is_null() || val.is_null() || val_len.is_null() {
            return STATUS_INVALID;
        }
        let Some(state) = inner.cursors.get_mut(&cursor) else {
            return STATUS_INVALID;
        };
        let len = state.entries.len();

        let next = match op {
            cursor_op::FIRST => (len > 0).then_some(0),
            cursor_op::LAST => len.checked_sub(1),
            cursor_op::NEXT => match state.pos {
                None => (len > 0).then_some(0),
                Some(p) => (p + 1 < len).then_some(p + 1),
            },
            cursor_op::PREV => match state.pos {
                None => len.checked_sub(1),
                Some(p) => p.checked_sub(1),
            },
            cursor_op::SET_RANGE => {
                let target = slice(*key, *key_len);
                let idx = state
                    .entries
                    .partition_point(|(k, _)| k.as_slice() < target);
                (idx < len).then_some(idx)
            }
            _ => return STATUS_INVALID,
        };

        let Some(pos) = next else {
            return MDBX_NOTFOUND;
        };
        state.pos = Some(pos);
        let (k, v) = &state.entries[pos];
        *key = k.as_ptr();
        *key_len = k.len() as u64;
        *val = v.as_ptr();
        *val_len = v.len() as u64;
        STATUS_OK
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    fn open(engine: &InMemoryEngine, path: &str) -> u64 {
        let path = CString::new(path).unwrap();
        let mut db = 0u64;
        let rc = unsafe { engine.open(path.as_ptr(), &mut db) };
        assert_eq!(rc, STATUS_OK);
        db
    }

    fn put(engine: &InMemoryEngine, db: u64, key: &[u8], val: &[u8]) -> i32 {
        unsafe { engine.put(db, key.as_ptr(), key.len() as u64, val.as_ptr(), val.len() as u64) }
    }

    #[test]
    fn get_hands_out_freeable_buffer() {
        let engine = InMemoryEngine::new();
        let db = open(&engine, "t.db");
        assert_eq!(put(&engine, db, b"k", b"value"), STATUS_OK);

        let mut ptr = std::ptr::null_mut();
        let mut len = 0u64;
        let rc = unsafe { engine.get(db, b"k".as_ptr(), 1, &mut ptr, &mut len) };
        assert_eq!(rc, STATUS_OK);
        assert_eq!(len, 5);
        assert_eq!(engine.outstanding_buffers(), 1);

        unsafe { engine.free(ptr, len) };
        assert_eq!(engine.outstanding_buffers(), 0);
        assert_eq!(engine.frees(), 1);

        // Second free is detected, not performed.
        unsafe { engine.free(ptr, len) };
        assert_eq!(engine.invalid_frees(), 1);
    }

    #[test]
    fn missing_key_is_not_found() {
        let engine = InMemoryEngine::new();
        let db = open(&engine, "t.db");
        let mut ptr = std::ptr::null_mut();
        let mut len = 0u64;
        let rc = unsafe { engine.get(db, b"nope".as_ptr(), 4, &mut ptr, &mut len) };
        assert_eq!(rc, STATUS_NOT_FOUND);
        assert_eq!(engine.outstanding_buffers(), 0);
    }

    #[test]
    fn reopen_sees_prior_writes() {
        let engine = InMemoryEngine::new();
        let db = open(&engine, "shared.db");
        put(&engine, db, b"a", b"1");
        unsafe { engine.close(db) };

        let again = open(&engine, "shared.db");
        assert_ne!(db, again);
        assert_eq!(
            engine.table("shared.db").unwrap().get(b"a".as_slice()),
            Some(&b"1".to_vec())
        );
    }

    #[test]
    fn abort_restores_snapshot() {
        let engine = InMemoryEngine::new();
        let db = open(&engine, "t.db");
        put(&engine, db, b"keep", b"1");

        unsafe {
            assert_eq!(engine.txn_begin(db), STATUS_OK);
            assert_eq!(engine.txn_begin(db), STATUS_BAD_TXN);
            put(&engine, db, b"drop", b"2");
            engine.txn_abort(db);
        }

        let table = engine.table("t.db").unwrap();
        assert!(table.contains_key(b"keep".as_slice()));
        assert!(!table.contains_key(b"drop".as_slice()));
        assert!(!engine.in_transaction(db));
    }

    #[test]
    fn injected_commit_failure_resolves_as_abort() {
        let engine = InMemoryEngine::new();
        let db = open(&engine, "t.db");
        engine.fail_next(EngineOp::TxnCommit, -5);

        unsafe {
            engine.txn_begin(db);
            put(&engine, db, b"k", b"v");
            assert_eq!(engine.txn_commit(db), -5);
        }
        assert!(!engine.in_transaction(db));
        assert!(engine.table("t.db").unwrap().is_empty());
    }

    #[test]
    fn fail_after_skips_calls() {
        let engine = InMemoryEngine::new();
        let db = open(&engine, "t.db");
        engine.fail_after(EngineOp::Put, 2, -7);

        assert_eq!(put(&engine, db, b"a", b""), STATUS_OK);
        assert_eq!(put(&engine, db, b"b", b""), STATUS_OK);
        assert_eq!(put(&engine, db, b"c", b""), -7);
        assert_eq!(put(&engine, db, b"d", b""), STATUS_OK);
    }

    #[test]
    fn cursor_walks_in_key_order() {
        let engine = InMemoryEngine::new();
        let db = open(&engine, "t.db");
        for k in [b"b", b"c", b"a"] {
            put(&engine, db, k, k);
        }

        let mut cursor = 0u64;
        assert_eq!(unsafe { engine.cursor_open(db, &mut cursor) }, STATUS_OK);
        assert_eq!(engine.open_cursors(), 1);

        let mut seen = Vec::new();
        let mut op = cursor_op::FIRST;
        loop {
            let (mut k, mut kl, mut v, mut vl) = (std::ptr::null(), 0u64, std::ptr::null(), 0u64);
            let rc = unsafe { engine.cursor_get(cursor, &mut k, &mut kl, &mut v, &mut vl, op) };
            if rc == MDBX_NOTFOUND {
                break;
            }
            assert_eq!(rc, STATUS_OK);
            seen.push(unsafe { slice(k, kl) }.to_vec());
            op = cursor_op::NEXT;
        }
        assert_eq!(seen, vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]);

        unsafe { engine.cursor_close(cursor) };
        assert_eq!(engine.open_cursors(), 0);
    }

    #[test]
    fn cursor_set_range_seeks() {
        let engine = InMemoryEngine::new();
        let db = open(&engine, "t.db");
        for k in [b"k10", b"k20", b"k30"] {
            put(&engine, db, k, b"v");
        }

        let mut cursor = 0u64;
        unsafe { engine.cursor_open(db, &mut cursor) };

        let target = b"k15";
        let (mut k, mut kl, mut v, mut vl) = (target.as_ptr(), 3u64, std::ptr::null(), 0u64);
        let rc =
            unsafe { engine.cursor_get(cursor, &mut k, &mut kl, &mut v, &mut vl, cursor_op::SET_RANGE) };
        assert_eq!(rc, STATUS_OK);
        assert_eq!(unsafe { slice(k, kl) }, b"k20");

        let (mut k, mut kl) = (b"k99".as_ptr(), 3u64);
        let rc =
            unsafe { engine.cursor_get(cursor, &mut k, &mut kl, &mut v, &mut vl, cursor_op::SET_RANGE) };
        assert_eq!(rc, MDBX_NOTFOUND);
        unsafe { engine.cursor_close(cursor) };
    }

    #[test]
    fn unknown_handle_is_invalid() {
        let engine = InMemoryEngine::new();
        assert_eq!(put(&engine, 999, b"k", b"v"), STATUS_INVALID);
        assert_eq!(unsafe { engine.flush(999) }, STATUS_INVALID);
    }
}
