//! Integration tests for sessions and the transaction bracket.

use lmdbx_core::{Database, EngineOp, Error, InMemoryEngine, TransactionState};
use lmdbx_testkit::prelude::*;
use proptest::prelude::*;
use std::sync::Arc;

#[test]
fn put_get_delete_close() {
    let mut t = TestDatabase::memory();

    t.put("hello", "world").unwrap();
    assert_eq!(t.get("hello").unwrap(), Some(b"world".to_vec()));

    t.delete("hello").unwrap();
    assert_eq!(t.get("hello").unwrap(), None);

    t.db.close();
    assert!(!t.is_open());
    assert_eq!(t.engine.open_handles(), 0);
}

#[test]
fn every_lookup_buffer_is_freed_once() {
    let mut t = TestDatabase::memory();
    for i in 0..100 {
        t.put(format!("k{i}"), vec![0u8; i]).unwrap();
    }
    for i in 0..100 {
        assert_eq!(t.get(format!("k{i}")).unwrap(), Some(vec![0u8; i]));
    }
    assert_eq!(t.get("missing").unwrap(), None);

    assert_eq!(t.engine.frees(), 100);
    assert_eq!(t.engine.outstanding_buffers(), 0);
    assert_eq!(t.engine.invalid_frees(), 0);
}

#[test]
fn writes_survive_reopen() {
    let t = TestDatabase::memory();
    {
        let mut db = t.reopen();
        db.put("persist", "yes").unwrap();
        db.flush().unwrap();
    }
    let mut db = t.reopen();
    assert_eq!(db.get("persist").unwrap(), Some(b"yes".to_vec()));
}

#[test]
fn aborted_transaction_is_invisible() {
    let mut t = TestDatabase::memory();
    let result: lmdbx_core::Result<()> = t.transaction(|db| {
        db.put("a", "1")?;
        db.put("b", "2")?;
        Err(Error::invalid_state("unit of work failed"))
    });

    assert!(matches!(result, Err(Error::InvalidState { .. })));
    assert_eq!(t.get("a").unwrap(), None);
    assert_eq!(t.get("b").unwrap(), None);
    assert_eq!(t.transaction_state(), TransactionState::Aborted);
}

#[test]
fn committed_transaction_is_visible_to_other_sessions() {
    let mut t = TestDatabase::memory();
    t.transaction(|db| {
        db.put("a", "1")?;
        db.put("b", "2")
    })
    .unwrap();

    let mut other = t.reopen();
    assert_eq!(other.get("a").unwrap(), Some(b"1".to_vec()));
    assert_eq!(other.get("b").unwrap(), Some(b"2".to_vec()));
}

#[test]
fn sequential_transactions_on_one_session() {
    let mut t = TestDatabase::memory();
    for i in 0..3 {
        t.transaction(|db| db.put(format!("k{i}"), "v")).unwrap();
        assert_eq!(t.transaction_state(), TransactionState::Committed);
    }
    let _: lmdbx_core::Result<()> =
        t.transaction(|_| Err(Error::invalid_argument("rejected")));
    t.transaction(|db| db.put("after", "v")).unwrap();
    assert_eq!(t.get("after").unwrap(), Some(b"v".to_vec()));
}

#[test]
fn dropping_session_mid_transaction_rolls_back() {
    let engine = Arc::new(InMemoryEngine::new());
    {
        let mut db = Database::open(engine.clone(), "drop.db").unwrap();
        db.begin_transaction().unwrap();
        db.put("uncommitted", "1").unwrap();
    }
    assert_eq!(engine.open_handles(), 0);
    assert!(engine.table("drop.db").unwrap().is_empty());
}

#[test]
fn engine_errors_carry_operation_and_code() {
    let mut t = TestDatabase::memory();
    t.engine.fail_next(EngineOp::Del, -30783);
    let err = t.delete("k").unwrap_err();
    assert_eq!(err.to_string(), "delete failed with engine status -30783");
}

#[test]
fn sessions_move_across_threads() {
    let engine = Arc::new(InMemoryEngine::new());
    let handles: Vec<_> = (0..4)
        .map(|n| {
            let mut db = Database::open(engine.clone(), format!("thread{n}.db")).unwrap();
            std::thread::spawn(move || {
                for i in 0..50 {
                    db.put(format!("k{i}"), format!("{n}")).unwrap();
                }
                db.get("k49").unwrap()
            })
        })
        .collect();

    for (n, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.join().unwrap(), Some(n.to_string().into_bytes()));
    }
    assert_eq!(engine.open_handles(), 0);
    assert_eq!(engine.outstanding_buffers(), 0);
}

proptest! {
    #[test]
    fn put_get_round_trip(key in key_strategy(), value in value_strategy()) {
        with_memory_db(|db| {
            db.put(&key, &value).unwrap();
            prop_assert_eq!(db.get(&key).unwrap(), Some(value.clone()));
            Ok(())
        })?;
    }

    #[test]
    fn last_write_wins(data in dataset_strategy(40), overwrite in value_strategy()) {
        let mut t = TestDatabase::memory();
        for (k, v) in &data {
            t.put(k, v).unwrap();
        }
        if let Some(first) = data.keys().next() {
            t.put(first, &overwrite).unwrap();
            prop_assert_eq!(t.get(first).unwrap(), Some(overwrite.clone()));
        }
        prop_assert_eq!(t.engine.outstanding_buffers(), 0);
    }
}
