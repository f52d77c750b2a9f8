//! Out-parameter buffers across the foreign boundary.

/// A (pointer, length) register the engine writes a result into.
///
/// A session keeps one of these and reuses it for every lookup instead of
/// allocating per call. It only holds a meaningful value between the
/// native call that fills it and the matching `free`.
#[derive(Debug)]
pub(crate) struct OutBuffer {
    pub(crate) ptr: *mut u8,
    pub(crate) len: u64,
}

impl OutBuffer {
    pub(crate) const fn new() -> Self {
        Self {
            ptr: std::ptr::null_mut(),
            len: 0,
        }
    }

    pub(crate) fn reset(&mut self) {
        self.ptr = std::ptr::null_mut();
        self.len = 0;
    }

    /// Copies the referenced bytes into an owned vector.
    ///
    /// # Safety
    ///
    /// `ptr` must be valid for `len` bytes, or `len` must be zero.
    pub(crate) unsafe fn to_vec(&self) -> Vec<u8> {
        copy_out(self.ptr, self.len)
    }
}

/// Copies `len` bytes at `ptr` into caller-owned storage.
///
/// A zero length never touches `ptr`, which may then be null.
///
/// # Safety
///
/// `ptr` must be valid for reads of `len` bytes when `len` is non-zero.
pub(crate) unsafe fn copy_out(ptr: *const u8, len: u64) -> Vec<u8> {
    if len == 0 || ptr.is_null() {
        return Vec::new();
    }
    std::slice::from_raw_parts(ptr, len as usize).to_vec()
}
