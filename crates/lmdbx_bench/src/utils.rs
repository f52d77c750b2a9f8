//! Benchmark utilities.

use lmdbx_core::{Database, InMemoryEngine};
use rand::Rng;
use std::sync::Arc;

/// Generate random data of the specified size.
pub fn random_data(size: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..size).map(|_| rng.gen()).collect()
}

/// Generate `count` distinct, ordered keys.
pub fn sequential_keys(count: usize) -> Vec<Vec<u8>> {
    (0..count)
        .map(|i| format!("key{i:08}").into_bytes())
        .collect()
}

/// Opens a session on a fresh in-memory engine.
pub fn memory_db(name: &str) -> Database {
    Database::open(Arc::new(InMemoryEngine::new()), name).expect("Failed to open database")
}

/// Opens a session holding `count` entries with `value_size`-byte values.
pub fn populated_db(count: usize, value_size: usize) -> (Database, Vec<Vec<u8>>) {
    let mut db = memory_db("bench.db");
    let keys = sequential_keys(count);
    db.transaction(|db| {
        for key in &keys {
            db.put(key, random_data(value_size))?;
        }
        Ok::<(), lmdbx_core::Error>(())
    })
    .expect("Failed to populate database");
    (db, keys)
}
