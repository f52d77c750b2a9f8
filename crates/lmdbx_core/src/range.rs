//! Cursor-driven range scans.

use crate::binding::{cursor_op, is_end_of_data, RawApi, STATUS_OK};
use crate::buffer::copy_out;
use crate::error::{Error, Result};
use crate::session::{check, Database};
use crate::types::{CursorHandle, DbHandle, Entry};
use tracing::{debug, warn};

/// Options for [`Database::get_range`].
///
/// With every field unset, a scan walks the whole database in ascending key
/// order up to the session's default bound.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RangeOptions {
    /// Inclusive lower bound.
    pub start: Option<Vec<u8>>,
    /// Inclusive upper bound.
    pub end: Option<Vec<u8>>,
    /// Maximum number of entries returned.
    pub limit: Option<usize>,
    /// Walk from the greatest key downwards.
    pub reverse: bool,
}

impl RangeOptions {
    /// Creates options for an unbounded ascending scan.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the inclusive lower bound.
    #[must_use]
    pub fn start(mut self, key: impl Into<Vec<u8>>) -> Self {
        self.start = Some(key.into());
        self
    }

    /// Sets the inclusive upper bound.
    #[must_use]
    pub fn end(mut self, key: impl Into<Vec<u8>>) -> Self {
        self.end = Some(key.into());
        self
    }

    /// Caps the number of entries returned.
    #[must_use]
    pub const fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Scans in descending key order.
    #[must_use]
    pub const fn reverse(mut self, reverse: bool) -> Self {
        self.reverse = reverse;
        self
    }

    fn below_start(&self, key: &[u8]) -> bool {
        self.start.as_deref().is_some_and(|start| key < start)
    }

    fn above_end(&self, key: &[u8]) -> bool {
        self.end.as_deref().is_some_and(|end| key > end)
    }
}

/// An open native cursor, closed when dropped.
struct Cursor<'a> {
    api: &'a dyn RawApi,
    handle: CursorHandle,
}

impl<'a> Cursor<'a> {
    fn open(api: &'a dyn RawApi, db: DbHandle) -> Result<Self> {
        let mut raw = 0u64;
        // SAFETY: `db` is live and `raw` is a writable out-pointer.
        let rc = unsafe { api.cursor_open(db.as_u64(), &mut raw) };
        check("cursor_open", rc)?;
        Ok(Self {
            api,
            handle: CursorHandle::new(raw),
        })
    }

    /// Positions the cursor and copies out the entry under it.
    ///
    /// `seek` is the input key for [`cursor_op::SET_RANGE`]. Returns
    /// `Ok(None)` once the cursor runs off the data.
    fn step(&mut self, op: i32, seek: Option<&[u8]>) -> Result<Option<Entry>> {
        let (mut key, mut key_len) = match seek {
            Some(k) => (k.as_ptr(), k.len() as u64),
            None => (std::ptr::null(), 0),
        };
        let (mut val, mut val_len) = (std::ptr::null(), 0u64);

        // SAFETY: all four out-pointers are writable locals, and `seek`
        // outlives the call.
        let rc = unsafe {
            self.api.cursor_get(
                self.handle.as_u64(),
                &mut key,
                &mut key_len,
                &mut val,
                &mut val_len,
                op,
            )
        };
        if is_end_of_data(rc) {
            return Ok(None);
        }
        if rc != STATUS_OK {
            return Err(Error::engine("cursor_get", rc));
        }

        // SAFETY: the engine guarantees both spans until the next call on
        // this cursor; they are copied before returning.
        let entry = unsafe { Entry::new(copy_out(key, key_len), copy_out(val, val_len)) };
        Ok(Some(entry))
    }
}

impl Drop for Cursor<'_> {
    fn drop(&mut self) {
        // SAFETY: the handle came from `cursor_open` and is closed only here.
        unsafe { self.api.cursor_close(self.handle.as_u64()) };
    }
}

impl Database {
    /// Returns entries in key order, honouring `options`.
    ///
    /// Forward scans begin at the first key `>= start` (or the first key)
    /// and stop after the last key `<= end`. Reverse scans begin at the
    /// greatest key `<= end` (or the last key) and stop below `start`.
    /// At most `limit` entries are returned. An unset or zero limit falls
    /// back to the session's scan bound.
    ///
    /// The native cursor is closed on every path, including errors.
    ///
    /// # Errors
    ///
    /// - `InvalidState` if the session is closed
    /// - `Engine` if opening or stepping the cursor fails
    ///
    /// ```rust
    /// # use lmdbx_core::{Database, InMemoryEngine, RangeOptions};
    /// # use std::sync::Arc;
    /// let mut db = Database::open(Arc::new(InMemoryEngine::new()), "range.db")?;
    /// for key in ["a", "b", "c", "d"] {
    ///     db.put(key, "v")?;
    /// }
    ///
    /// let keys: Vec<_> = db
    ///     .get_range(&RangeOptions::new().start("b").limit(2))?
    ///     .into_iter()
    ///     .map(|e| e.key)
    ///     .collect();
    /// assert_eq!(keys, vec![b"b".to_vec(), b"c".to_vec()]);
    /// # Ok::<(), lmdbx_core::Error>(())
    /// ```
    pub fn get_range(&mut self, options: &RangeOptions) -> Result<Vec<Entry>> {
        let db = self.require_open()?;
        let limit = options
            .limit
            .filter(|&l| l != 0)
            .unwrap_or(self.config().scan_limit);
        // Only reachable through a zero session bound.
        if limit == 0 {
            return Ok(Vec::new());
        }

        let mut cursor = Cursor::open(self.api(), db)?;
        let result = if options.reverse {
            scan_reverse(&mut cursor, options, limit)
        } else {
            scan_forward(&mut cursor, options, limit)
        };

        match &result {
            Ok(entries) => debug!(
                cursor = %cursor.handle,
                count = entries.len(),
                reverse = options.reverse,
                "range scan finished"
            ),
            Err(e) => warn!(cursor = %cursor.handle, error = %e, "range scan failed"),
        }
        result
    }
}

fn scan_forward(cursor: &mut Cursor<'_>, options: &RangeOptions, limit: usize) -> Result<Vec<Entry>> {
    let mut entries = Vec::new();
    let mut next = match options.start.as_deref() {
        Some(start) => cursor.step(cursor_op::SET_RANGE, Some(start))?,
        None => cursor.step(cursor_op::FIRST, None)?,
    };

    while let Some(entry) = next {
        if options.above_end(&entry.key) {
            break;
        }
        entries.push(entry);
        if entries.len() >= limit {
            break;
        }
        next = cursor.step(cursor_op::NEXT, None)?;
    }
    Ok(entries)
}

fn scan_reverse(cursor: &mut Cursor<'_>, options: &RangeOptions, limit: usize) -> Result<Vec<Entry>> {
    let mut entries = Vec::new();
    let mut next = match options.end.as_deref() {
        Some(end) => match cursor.step(cursor_op::SET_RANGE, Some(end))? {
            // Landed past the bound; the predecessor is the greatest key <= end.
            Some(entry) if entry.key.as_slice() > end => cursor.step(cursor_op::PREV, None)?,
            Some(entry) => Some(entry),
            // Every key is below the bound.
            None => cursor.step(cursor_op::LAST, None)?,
        },
        None => cursor.step(cursor_op::LAST, None)?,
    };

    while let Some(entry) = next {
        if options.below_start(&entry.key) {
            break;
        }
        entries.push(entry);
        if entries.len() >= limit {
            break;
        }
        next = cursor.step(cursor_op::PREV, None)?;
    }
    Ok(entries)
}
