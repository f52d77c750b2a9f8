//! Benchmarks for the lmdbx client.
//!
//! The benches run against the in-memory engine, so they measure the
//! session layer (argument marshalling, buffer copies and frees, cursor
//! stepping) rather than the storage engine.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod utils;
