//! # lmdbx Core
//!
//! Client library for the native lmdbx key-value engine.
//!
//! The engine ships as a set of prebuilt shared libraries, one per CPU
//! architecture and C runtime. This crate picks the right one, binds its
//! C entry points, and wraps the raw calling convention in a safe session.
//!
//! ## Layers
//!
//! - [`Platform`] identifies the architecture and C-runtime preference
//! - [`Resolver`] turns that into an ordered candidate list and loads the
//!   first artifact that works, reporting every attempt on failure
//! - [`RawApi`] is the binding surface; [`NativeLibrary`] implements it over
//!   a loaded artifact and [`InMemoryEngine`] implements it for tests
//! - [`Database`] owns one engine handle and offers point operations,
//!   transactions and range scans
//!
//! ## Example
//!
//! ```rust
//! use lmdbx_core::{Database, InMemoryEngine, RangeOptions};
//! use std::sync::Arc;
//!
//! // `lmdbx_core::load_native(&LoaderConfig::from_env())` in production.
//! let engine = Arc::new(InMemoryEngine::new());
//! let mut db = Database::open(engine, "example.db")?;
//!
//! db.transaction(|db| {
//!     db.put("key001", "one")?;
//!     db.put("key002", "two")
//! })?;
//!
//! let entries = db.get_range(&RangeOptions::new().limit(10))?;
//! assert_eq!(entries.len(), 2);
//! # Ok::<(), lmdbx_core::Error>(())
//! ```

#![warn(missing_docs)]

pub mod binding;
mod buffer;
mod config;
mod error;
mod memory;
mod native;
mod platform;
mod range;
mod resolver;
mod session;
mod types;

pub use binding::RawApi;
pub use config::{
    LoaderConfig, SessionConfig, DEFAULT_EXTENSION, DEFAULT_PREFIX, DEFAULT_SCAN_LIMIT,
    ENV_BIN_LIBS_PATH, ENV_LIBC, ENV_LIBC_VARIANT, ENV_LIB_OVERRIDE,
};
pub use error::{Error, LibraryLoadError, LoadAttempt, Result};
pub use memory::{EngineOp, InMemoryEngine, STATUS_BAD_TXN, STATUS_INVALID};
pub use native::{DylibLoader, NativeLibrary};
pub use platform::{libc_preference, Arch, LibcEvidence, LibcVariant, Platform};
pub use range::RangeOptions;
pub use resolver::{load_native, Loader, ResolvedLibrary, Resolver};
pub use session::{Database, TransactionState};
pub use types::{CursorHandle, DbHandle, Entry};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
