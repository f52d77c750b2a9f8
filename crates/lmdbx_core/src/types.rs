//! Handle types.

use std::fmt;

/// An engine-assigned database handle.
///
/// The client never interprets the bits; the value is only passed back to
/// the engine on every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DbHandle(u64);

impl DbHandle {
    /// Wraps a raw handle.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw handle value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for DbHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "db:{:#x}", self.0)
    }
}

/// An engine-assigned cursor handle, scoped to one range scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CursorHandle(u64);

impl CursorHandle {
    /// Wraps a raw handle.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw handle value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for CursorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cursor:{:#x}", self.0)
    }
}

/// A key/value pair copied out of the engine.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Entry {
    /// Key bytes.
    pub key: Vec<u8>,
    /// Value bytes.
    pub value: Vec<u8>,
}

impl Entry {
    /// Creates an entry.
    pub fn new(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_display() {
        assert_eq!(DbHandle::new(255).to_string(), "db:0xff");
        assert_eq!(CursorHandle::new(1).to_string(), "cursor:0x1");
        assert_eq!(DbHandle::new(7).as_u64(), 7);
    }

    #[test]
    fn entry_from_slices() {
        let entry = Entry::new(b"k".as_slice(), "v");
        assert_eq!(entry.key, b"k");
        assert_eq!(entry.value, b"v");
    }
}
