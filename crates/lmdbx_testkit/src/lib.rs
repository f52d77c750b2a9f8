//! # lmdbx Testkit
//!
//! Test utilities for the lmdbx client.
//!
//! This crate provides:
//! - Session fixtures backed by the in-memory engine
//! - Fake artifact directories for exercising library resolution
//! - A recording loader that logs every candidate it is asked for
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust
//! use lmdbx_testkit::prelude::*;
//!
//! with_memory_db(|db| {
//!     db.put("k", "v").unwrap();
//!     assert_eq!(db.get("k").unwrap(), Some(b"v".to_vec()));
//! });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use fixtures::*;
pub use generators::*;
